//! Graph-wired neural networks.
//!
//! Network topology is an explicit directed graph of neurons: every neuron
//! carries its incoming weighted edges (dendrites), and arbitrary wiring is
//! allowed, including cycles. Evaluation and training run through a
//! cycle-safe memoising engine, so recurrent graphs terminate (each feedback
//! edge contributes a default, which for the provided result types is the
//! additive identity — one-step unrolling of the cycle).
//!
//! Conventions:
//! - Scalars are `f64`.
//! - Neurons are identified by stable indices; removal vacates a slot
//!   without renumbering, [`topology::Network::reindex`] compacts.
//! - Fallible operations return [`Result`]; nothing panics on user input.
//!
//! The main pieces:
//! - [`topology::Network`] — the neuron graph.
//! - [`computation::NetworkFunction`] — forward evaluation.
//! - [`backprop::Trainer`] — on-line and batch backpropagation, with
//!   pluggable learning-rate [`rate::Criterion`]s.
//! - [`feed_forward::FeedForward`] — layered network factory with optional
//!   bias source and intra-layer lateral synapses.
//! - [`io`] — the plain-text topology format.

pub mod activation;
pub mod backprop;
pub mod computation;
pub mod data;
pub mod error;
pub mod feed_forward;
pub mod fixable;
pub mod init;
pub mod io;
pub mod rate;
pub mod serde_model;
pub mod topology;

pub use activation::{Activation, Identity, Logistic, Tanh};
pub use backprop::Trainer;
pub use computation::{Computation, Grid, NetworkFunction};
pub use data::Dataset;
pub use error::{Error, Result};
pub use feed_forward::{FeedForward, Features, Perceptron, RAND_WEIGHT_MAX, RAND_WEIGHT_MIN};
pub use fixable::{Fixable, Fixation};
pub use init::UniformWeights;
pub use io::ActivationLiteral;
pub use rate::{AdaptiveRate, ConstantRate, Criterion};
pub use topology::{Dendrite, Network, Neuron, Role};
