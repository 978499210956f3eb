//! Feed-forward network factory.
//!
//! Builds layered topologies (input, hidden layers, output) on top of the
//! general graph, with optional extras selected by [`Features`] bits:
//!
//! - `BIAS`: a single "bias source" neuron created first (index 0), pinned
//!   to constant activation 1; every non-input neuron receives a synapse
//!   from it.
//! - `LATERAL_PREV`: within each non-input layer, every neuron also reads
//!   every previously created sibling. The intra-layer wiring is strictly
//!   lower-triangular, so the topology stays acyclic.
//!
//! The factory hands out pre-wired evaluation and training objects:
//! [`FeedForward::function`] and [`FeedForward::training`].

use std::ops::BitOr;

use crate::activation::{Activation, Logistic};
use crate::backprop::Trainer;
use crate::computation::NetworkFunction;
use crate::init::UniformWeights;
use crate::topology::{Network, Role};
use crate::{Error, Result};

/// Default random weight minimum for the shortcut constructors.
pub const RAND_WEIGHT_MIN: f64 = 1.0 / 100_000.0;

/// Default random weight maximum for the shortcut constructors.
pub const RAND_WEIGHT_MAX: f64 = 1.0 / 1_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Feature bits of a feed-forward network.
pub struct Features(u32);

impl Features {
    /// No extra features.
    pub const NONE: Features = Features(0x0);
    /// Use a bias source neuron.
    pub const BIAS: Features = Features(0x1);
    /// Synapses to previous neurons within a layer.
    pub const LATERAL_PREV: Features = Features(0x2);
    /// All supported lateral synapses.
    pub const LATERAL: Features = Features::LATERAL_PREV;
    /// Default features.
    pub const DEFAULT: Features = Features::NONE;

    /// Returns the raw bits.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Reconstructs features from raw bits (serialisation).
    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        Features(bits)
    }

    /// Returns true if every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: Features) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Features {
    type Output = Features;

    fn bitor(self, rhs: Features) -> Features {
        Features(self.0 | rhs.0)
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::DEFAULT
    }
}

#[derive(Debug, Clone)]
/// N-layer feed-forward neural network.
pub struct FeedForward<A> {
    features: Features,
    topo: Network<A>,
}

impl<A: Activation + Clone> FeedForward<A> {
    /// Creates an empty network with default features.
    pub fn new() -> Self {
        Self {
            features: Features::DEFAULT,
            topo: Network::new(),
        }
    }

    /// Builds a layered topology.
    ///
    /// `layers_spec` gives the neuron count per layer and must name at
    /// least the input and output layers. Every synapse weight is drawn
    /// from `w_init`; every neuron carries a clone of `activation`.
    pub fn with_layers(
        layers_spec: &[usize],
        w_init: impl FnMut() -> f64,
        features: Features,
        activation: A,
    ) -> Result<Self> {
        let mut ff = Self {
            features,
            topo: Network::new(),
        };
        ff.create_topo(layers_spec, w_init, activation)?;
        Ok(ff)
    }

    /// Builds a 2-layer network (no hidden layer) with the default random
    /// weight initialiser.
    pub fn with_dims(
        input_d: usize,
        output_d: usize,
        features: Features,
        activation: A,
    ) -> Result<Self> {
        let mut rng = default_rng()?;
        Self::with_layers(&[input_d, output_d], || rng.sample(), features, activation)
    }

    /// Builds a 3-layer network (one hidden layer) with the default random
    /// weight initialiser.
    pub fn with_hidden(
        input_d: usize,
        hidden_d: usize,
        output_d: usize,
        features: Features,
        activation: A,
    ) -> Result<Self> {
        let mut rng = default_rng()?;
        Self::with_layers(
            &[input_d, hidden_d, output_d],
            || rng.sample(),
            features,
            activation,
        )
    }

    /// Reassembles a network from its parts (deserialisation).
    pub fn from_parts(features: Features, topology: Network<A>) -> Self {
        Self {
            features,
            topo: topology,
        }
    }

    fn create_topo(
        &mut self,
        layers_spec: &[usize],
        mut w_init: impl FnMut() -> f64,
        activation: A,
    ) -> Result<()> {
        if layers_spec.len() < 2 {
            return Err(Error::Config(format!(
                "feed-forward topology needs at least 2 layers, got {}",
                layers_spec.len()
            )));
        }

        // The bias source goes first so that it sits at index 0.
        let bias = self
            .features
            .contains(Features::BIAS)
            .then(|| self.topo.add_neuron(Role::Inner, activation.clone()));

        let mut prev_layer: Vec<usize> = Vec::with_capacity(layers_spec[0]);
        for _ in 0..layers_spec[0] {
            prev_layer.push(self.topo.add_neuron(Role::Input, activation.clone()));
        }

        for (i, &cnt) in layers_spec.iter().enumerate().skip(1) {
            let role = if i < layers_spec.len() - 1 {
                Role::Inner
            } else {
                Role::Output
            };

            let mut layer = Vec::with_capacity(cnt);
            for _ in 0..cnt {
                let index = self.topo.add_neuron(role, activation.clone());
                let neuron = self.topo.neuron_mut(index)?;

                if let Some(bias) = bias {
                    neuron.set_dendrite(bias, w_init());
                }

                // Lateral synapses to previously created siblings keep the
                // layer acyclic.
                if self.features.contains(Features::LATERAL_PREV) {
                    for &sibling in &layer {
                        neuron.set_dendrite(sibling, w_init());
                    }
                }

                for &prev in &prev_layer {
                    neuron.set_dendrite(prev, w_init());
                }

                layer.push(index);
            }

            prev_layer = layer;
        }

        Ok(())
    }

    /// Returns the feature bits.
    #[inline]
    pub fn features(&self) -> Features {
        self.features
    }

    /// Sets the feature bits.
    ///
    /// Only possible while the topology is empty.
    pub fn set_features(&mut self, features: Features) -> Result<()> {
        if !self.topo.is_empty() {
            return Err(Error::Invariant(
                "cannot set features for an existing topology".to_owned(),
            ));
        }

        self.features = features;
        Ok(())
    }

    /// Returns the underlying topology.
    #[inline]
    pub fn topology(&self) -> &Network<A> {
        &self.topo
    }

    /// Returns the underlying topology, mutably.
    #[inline]
    pub fn topology_mut(&mut self) -> &mut Network<A> {
        &mut self.topo
    }

    /// Creates the network function evaluator, with the bias source (if
    /// any) pinned at activation 1.
    pub fn function(&self) -> Result<NetworkFunction<'_, A>> {
        let mut f = NetworkFunction::new(&self.topo);
        if self.features.contains(Features::BIAS) {
            f.pin(0, 1.0)?;
        }
        Ok(f)
    }

    /// Creates a backpropagation trainer for the network, with the bias
    /// source (if any) hard-pinned in every computation slot.
    pub fn training(&self) -> Trainer {
        let pins = if self.features.contains(Features::BIAS) {
            vec![(0, 1.0)]
        } else {
            Vec::new()
        };

        Trainer::with_pins(&self.topo, pins)
    }
}

impl<A: Activation + Clone> Default for FeedForward<A> {
    fn default() -> Self {
        Self::new()
    }
}

fn default_rng() -> Result<UniformWeights> {
    UniformWeights::new(RAND_WEIGHT_MIN, RAND_WEIGHT_MAX)
}

/// Classic perceptron: a feed-forward network with the logistic sigmoid
/// activation.
pub type Perceptron = FeedForward<Logistic>;
