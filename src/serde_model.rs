//! Model persistence mirror structs (JSON behind the `serde` feature).
//!
//! Internal `Network`/`Neuron` structs are not serialised directly; the
//! on-disk format stays stable even if the internal representation changes.
//! Activations are stored as their text literals (see
//! [`crate::io::ActivationLiteral`]), so the mirror is independent of the
//! activation type's internals. All deserialisation validates indices,
//! synapse endpoints and weight finiteness.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use std::path::Path;

use crate::feed_forward::{FeedForward, Features};
use crate::io::ActivationLiteral;
use crate::topology::{Network, Role};
use crate::{Activation, Error, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedRole {
    Inner,
    Input,
    Output,
}

impl From<Role> for SavedRole {
    fn from(value: Role) -> Self {
        match value {
            Role::Inner => SavedRole::Inner,
            Role::Input => SavedRole::Input,
            Role::Output => SavedRole::Output,
        }
    }
}

impl From<SavedRole> for Role {
    fn from(value: SavedRole) -> Self {
        match value {
            SavedRole::Inner => Role::Inner,
            SavedRole::Input => Role::Input,
            SavedRole::Output => Role::Output,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SavedNeuron {
    pub index: usize,
    pub role: SavedRole,
    /// Activation literal, e.g. `logistic(0,1,1)`.
    pub activation: String,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SavedSynapse {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SavedNetwork {
    pub format_version: u32,
    pub neurons: Vec<SavedNeuron>,
    pub synapses: Vec<SavedSynapse>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SavedFeedForward {
    pub format_version: u32,
    pub features: u32,
    pub network: SavedNetwork,
}

impl SavedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::Parse(format!(
                "unsupported model format_version {}; expected {MODEL_FORMAT_VERSION}",
                self.format_version
            )));
        }

        for (pos, n) in self.neurons.iter().enumerate() {
            if self.neurons[..pos].iter().any(|m| m.index == n.index) {
                return Err(Error::Parse(format!(
                    "duplicate neuron index {}",
                    n.index
                )));
            }
        }

        for s in &self.synapses {
            if !s.weight.is_finite() {
                return Err(Error::Parse(format!(
                    "synapse {} -> {} has non-finite weight",
                    s.source, s.target
                )));
            }
            for endpoint in [s.source, s.target] {
                if !self.neurons.iter().any(|n| n.index == endpoint) {
                    return Err(Error::Parse(format!(
                        "synapse {} -> {} references unknown neuron {endpoint}",
                        s.source, s.target
                    )));
                }
            }
        }

        Ok(())
    }
}

impl<A: ActivationLiteral> From<&Network<A>> for SavedNetwork {
    fn from(network: &Network<A>) -> Self {
        let mut neurons = Vec::with_capacity(network.len());
        let mut synapses = Vec::new();

        for n in network.neurons() {
            neurons.push(SavedNeuron {
                index: n.index(),
                role: n.role().into(),
                activation: n.activation().literal(),
            });

            for d in n.dendrites() {
                synapses.push(SavedSynapse {
                    source: d.source,
                    target: n.index(),
                    weight: d.weight,
                });
            }
        }

        Self {
            format_version: MODEL_FORMAT_VERSION,
            neurons,
            synapses,
        }
    }
}

impl<A: ActivationLiteral> TryFrom<SavedNetwork> for Network<A> {
    type Error = Error;

    fn try_from(value: SavedNetwork) -> Result<Self> {
        value.validate()?;

        let mut network = Network::new();

        for n in &value.neurons {
            let activation = A::parse_literal(&n.activation)?;
            network.set_neuron(n.index, n.role.into(), activation);
        }

        for s in &value.synapses {
            network
                .neuron_mut(s.target)
                .map_err(|e| Error::Parse(format!("invalid synapse target: {e}")))?
                .set_dendrite(s.source, s.weight);
        }

        Ok(network)
    }
}

impl<A: Activation + Clone + ActivationLiteral> From<&FeedForward<A>> for SavedFeedForward {
    fn from(ff: &FeedForward<A>) -> Self {
        Self {
            format_version: MODEL_FORMAT_VERSION,
            features: ff.features().bits(),
            network: SavedNetwork::from(ff.topology()),
        }
    }
}

impl<A: Activation + Clone + ActivationLiteral> TryFrom<SavedFeedForward> for FeedForward<A> {
    type Error = Error;

    fn try_from(value: SavedFeedForward) -> Result<Self> {
        if value.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::Parse(format!(
                "unsupported model format_version {}; expected {MODEL_FORMAT_VERSION}",
                value.format_version
            )));
        }

        let network = Network::try_from(value.network)?;
        Ok(FeedForward::from_parts(
            Features::from_bits(value.features),
            network,
        ))
    }
}

#[cfg(feature = "serde")]
impl<A: ActivationLiteral> Network<A> {
    /// Serialises the topology to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SavedNetwork::from(self))
            .map_err(|e| Error::Parse(format!("failed to serialise topology: {e}")))
    }

    /// Parses a topology from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let saved: SavedNetwork = serde_json::from_str(s)
            .map_err(|e| Error::Parse(format!("failed to parse topology json: {e}")))?;
        saved.try_into()
    }

    /// Saves the topology to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        std::fs::write(p, self.to_json_string_pretty()?)
            .map_err(|e| Error::Parse(format!("failed to write {}: {e}", p.display())))
    }

    /// Loads a topology from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::Parse(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(feature = "serde")]
impl<A: Activation + Clone + ActivationLiteral> FeedForward<A> {
    /// Serialises the network to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&SavedFeedForward::from(self))
            .map_err(|e| Error::Parse(format!("failed to serialise model: {e}")))
    }

    /// Parses a network from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let saved: SavedFeedForward = serde_json::from_str(s)
            .map_err(|e| Error::Parse(format!("failed to parse model json: {e}")))?;
        saved.try_into()
    }

    /// Saves the network to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        std::fs::write(p, self.to_json_string_pretty()?)
            .map_err(|e| Error::Parse(format!("failed to write {}: {e}", p.display())))
    }

    /// Loads a network from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::Parse(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Identity;

    fn sample() -> Network<Identity> {
        let mut net = Network::new();
        let inp = net.add_neuron(Role::Input, Identity);
        let out = net.add_neuron(Role::Output, Identity);
        net.neuron_mut(out).unwrap().set_dendrite(inp, 0.75);
        net
    }

    #[test]
    fn mirror_round_trip_preserves_structure() {
        let net = sample();
        let saved = SavedNetwork::from(&net);
        let restored: Network<Identity> = saved.try_into().unwrap();

        assert_eq!(restored.len(), net.len());
        assert_eq!(restored.input_indices(), net.input_indices());
        assert_eq!(restored.output_indices(), net.output_indices());
        assert_eq!(
            restored.neuron(1).unwrap().dendrite(0).unwrap().weight,
            0.75
        );
    }

    #[test]
    fn validation_rejects_bad_mirrors() {
        let mut saved = SavedNetwork::from(&sample());
        saved.format_version = 999;
        assert!(matches!(saved.validate(), Err(Error::Parse(_))));

        let mut saved = SavedNetwork::from(&sample());
        saved.synapses[0].weight = f64::NAN;
        assert!(matches!(saved.validate(), Err(Error::Parse(_))));

        let mut saved = SavedNetwork::from(&sample());
        saved.synapses[0].source = 17;
        assert!(matches!(saved.validate(), Err(Error::Parse(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trip_is_stable() {
        let net = sample();
        let json = net.to_json_string_pretty().unwrap();
        let restored = Network::<Identity>::from_json_str(&json).unwrap();
        assert_eq!(restored.to_json_string_pretty().unwrap(), json);
    }
}
