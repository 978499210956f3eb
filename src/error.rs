//! Error and `Result` types.
//!
//! Every fallible operation in this crate returns `Result`; nothing is
//! recovered internally. Training calls are atomic at the call level: on
//! failure the evaluation caches may be partially populated, but weights are
//! unchanged unless the update step was reached. Callers wanting
//! transactional semantics should clone the network before a risky call.

use std::fmt;

#[derive(Debug, Clone)]
/// Errors returned by the topology, the evaluators, the trainer and the
/// serialisation layer.
pub enum Error {
    /// Out-of-range neuron index, or a lookup of a vacant slot.
    Index(String),
    /// Input/target/error vector length disagrees with the network's input
    /// or output dimension.
    Shape(String),
    /// A stated invariant was violated: overwriting a hard-fixed cell,
    /// reading an unfixed cell through a const handle, backward evaluation
    /// of an output neuron, reconfiguring a non-empty feed-forward network.
    Invariant(String),
    /// Invalid configuration (fewer than two layers, RNG bounds reversed).
    Config(String),
    /// Serialised input does not match the documented grammar, or a numeric
    /// conversion failed.
    Parse(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Index(msg) => write!(f, "index error: {msg}"),
            Error::Shape(msg) => write!(f, "shape error: {msg}"),
            Error::Invariant(msg) => write!(f, "invariant violation: {msg}"),
            Error::Config(msg) => write!(f, "invalid config: {msg}"),
            Error::Parse(msg) => write!(f, "parse error: {msg}"),
        }
    }
}

impl std::error::Error for Error {}
