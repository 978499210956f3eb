//! Neural network topology.
//!
//! A [`Network`] is an indexed collection of [`Neuron`]s. Wiring is
//! expressed per neuron as a list of [`Dendrite`]s (incoming weighted
//! edges); arbitrary graphs are allowed, including self-edges and cycles.
//! Cross-references use the neuron's stable index rather than references,
//! which keeps removal well-defined and avoids aliasing hazards when the
//! slot vector grows.
//!
//! Removing a neuron vacates its slot without renumbering the rest;
//! [`Network::reindex`] compacts the slots and rewrites every stored index.
//! Reindexing invalidates anything built on the old indexation (computation
//! grids, a trainer's reverse-adjacency map).

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Role of a neuron within the network.
pub enum Role {
    /// Hidden neuron.
    Inner,
    /// Input layer neuron (externally fed).
    Input,
    /// Output layer neuron (externally read).
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// A neuron's incoming weighted edge (synapse).
pub struct Dendrite {
    /// Index of the source neuron.
    pub source: usize,
    /// Synapse weight.
    pub weight: f64,
}

#[derive(Debug, Clone)]
/// A single neural cell: role, activation functor and incoming edges.
pub struct Neuron<A> {
    index: usize,
    role: Role,
    activation: A,
    dendrites: Vec<Dendrite>,
}

impl<A> Neuron<A> {
    fn new(index: usize, role: Role, activation: A) -> Self {
        Self {
            index,
            role,
            activation,
            dendrites: Vec::new(),
        }
    }

    /// Returns the neuron's index within its network.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the neuron's role.
    #[inline]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the activation functor.
    #[inline]
    pub fn activation(&self) -> &A {
        &self.activation
    }

    /// Mutable access to the activation functor.
    #[inline]
    pub fn activation_mut(&mut self) -> &mut A {
        &mut self.activation
    }

    /// Returns the number of dendrites.
    #[inline]
    pub fn dendrite_cnt(&self) -> usize {
        self.dendrites.len()
    }

    /// Returns the dendrite from `source`, if one exists.
    ///
    /// Linear in the dendrite count.
    pub fn dendrite(&self, source: usize) -> Option<&Dendrite> {
        self.dendrites.iter().find(|d| d.source == source)
    }

    /// Adds or updates the dendrite from `source`.
    ///
    /// `source` must name a live neuron of the same network; the topology
    /// maintains this for its own operations but cannot check it here.
    /// Dendrite order is stable: an update keeps the dendrite's position,
    /// a new dendrite is appended.
    pub fn set_dendrite(&mut self, source: usize, weight: f64) {
        match self.dendrites.iter_mut().find(|d| d.source == source) {
            Some(d) => d.weight = weight,
            None => self.dendrites.push(Dendrite { source, weight }),
        }
    }

    /// Removes the dendrite from `source`, if one exists.
    ///
    /// The relative order of the remaining dendrites is preserved.
    pub fn unset_dendrite(&mut self, source: usize) {
        if let Some(pos) = self.dendrites.iter().position(|d| d.source == source) {
            self.dendrites.remove(pos);
        }
    }

    /// Removes all dendrites whose weight equals 0.
    ///
    /// Equality is exact; a weight that is merely close to 0 is kept.
    pub fn minimise_dendrites(&mut self) {
        self.dendrites.retain(|d| d.weight != 0.0);
    }

    /// Returns the dendrites in order.
    #[inline]
    pub fn dendrites(&self) -> &[Dendrite] {
        &self.dendrites
    }

    /// Mutable access to the dendrites (weight updates).
    #[inline]
    pub fn dendrites_mut(&mut self) -> &mut [Dendrite] {
        &mut self.dendrites
    }
}

#[derive(Debug, Clone)]
/// A neural network: neuron slots plus input/output layer index lists.
///
/// Invariants maintained by every operation:
///
/// - every live slot's stored index equals its position;
/// - `input_indices`/`output_indices` hold exactly the indices of
///   `Input`/`Output` neurons, in insertion order;
/// - every dendrite's source names a live neuron of this network.
pub struct Network<A> {
    slots: Vec<Option<Neuron<A>>>,
    len: usize,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
}

impl<A> Network<A> {
    /// Creates an empty network.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            len: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Returns the number of (live) neurons.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if there are no neurons.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of slots, including vacant ones.
    ///
    /// This bounds the valid index range and sizes indexed side tables
    /// (computation grids, adjacency maps).
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Returns the input dimension (number of input layer neurons).
    #[inline]
    pub fn input_dim(&self) -> usize {
        self.inputs.len()
    }

    /// Returns the output dimension (number of output layer neurons).
    #[inline]
    pub fn output_dim(&self) -> usize {
        self.outputs.len()
    }

    /// Input layer indices, in insertion order.
    #[inline]
    pub fn input_indices(&self) -> &[usize] {
        &self.inputs
    }

    /// Output layer indices, in insertion order.
    #[inline]
    pub fn output_indices(&self) -> &[usize] {
        &self.outputs
    }

    /// Removes all neurons.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.inputs.clear();
        self.outputs.clear();
        self.len = 0;
    }

    /// Returns the neuron at `index` in O(1).
    ///
    /// Fails if `index` is out of range or the slot is vacant.
    pub fn neuron(&self, index: usize) -> Result<&Neuron<A>> {
        self.slots
            .get(index)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::Index(format!("no neuron at index {index}")))
    }

    /// Returns the neuron at `index` mutably, in O(1).
    pub fn neuron_mut(&mut self, index: usize) -> Result<&mut Neuron<A>> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::Index(format!("no neuron at index {index}")))
    }

    fn layer_add(&mut self, role: Role, index: usize) {
        match role {
            Role::Input => self.inputs.push(index),
            Role::Output => self.outputs.push(index),
            Role::Inner => {}
        }
    }

    fn layer_remove(&mut self, role: Role, index: usize) {
        match role {
            Role::Input => self.inputs.retain(|&i| i != index),
            Role::Output => self.outputs.retain(|&i| i != index),
            Role::Inner => {}
        }
    }

    fn synapses_remove(&mut self, index: usize) {
        for n in self.slots.iter_mut().flatten() {
            n.unset_dendrite(index);
        }
    }

    /// Appends a new neuron and returns its index.
    pub fn add_neuron(&mut self, role: Role, activation: A) -> usize {
        let index = self.slots.len();
        self.slots.push(Some(Neuron::new(index, role, activation)));
        self.len += 1;
        self.layer_add(role, index);
        index
    }

    /// Installs a neuron at `index`, growing the slot vector with vacancies
    /// as needed.
    ///
    /// If the slot already holds a neuron, the old neuron leaves its layer
    /// list and every synapse pointing to it is erased before the new
    /// neuron is installed.
    pub fn set_neuron(&mut self, index: usize, role: Role, activation: A) -> &mut Neuron<A> {
        while self.slots.len() <= index {
            self.slots.push(None);
        }

        if let Some(old) = self.slots[index].take() {
            self.layer_remove(old.role(), index);
            self.synapses_remove(index);
        } else {
            self.len += 1;
        }

        self.slots[index] = Some(Neuron::new(index, role, activation));
        self.layer_add(role, index);

        self.slots[index].as_mut().expect("slot was just filled")
    }

    /// Removes the neuron at `index`.
    ///
    /// The neuron leaves its layer list, every synapse pointing to it is
    /// erased, and its slot becomes vacant. Slots are not compacted; see
    /// [`Network::reindex`].
    pub fn remove_neuron(&mut self, index: usize) -> Result<()> {
        let role = self.neuron(index)?.role();

        self.layer_remove(role, index);
        self.synapses_remove(index);

        self.slots[index] = None;
        self.len -= 1;

        Ok(())
    }

    /// Compacts the slot vector, reassigning indices so that there are no
    /// gaps.
    ///
    /// Stored neuron indices, dendrite sources and the layer lists are all
    /// rewritten. Any indexation-based object built for the former state
    /// (computation grids, reverse-adjacency maps) is invalidated.
    pub fn reindex(&mut self) {
        let mut remap = vec![usize::MAX; self.slots.len()];
        let mut next = 0;
        for (old, slot) in self.slots.iter().enumerate() {
            if slot.is_some() {
                remap[old] = next;
                next += 1;
            }
        }

        self.inputs.clear();
        self.outputs.clear();

        let mut slots = Vec::with_capacity(self.len);
        for slot in self.slots.drain(..) {
            let Some(mut n) = slot else { continue };

            let index = slots.len();
            n.index = index;
            for d in &mut n.dendrites {
                d.source = remap[d.source];
            }

            match n.role {
                Role::Input => self.inputs.push(index),
                Role::Output => self.outputs.push(index),
                Role::Inner => {}
            }

            slots.push(Some(n));
        }

        self.slots = slots;
    }

    /// Drops every dendrite whose weight is exactly 0 from every neuron.
    ///
    /// Harmless for the network function: such synapses contribute nothing
    /// to any weighted sum.
    pub fn prune(&mut self) {
        for n in self.slots.iter_mut().flatten() {
            n.minimise_dendrites();
        }
    }

    /// Prunes the network, removes inner neurons left without dendrites
    /// (repeatedly, since each removal may orphan further neurons), then
    /// reindexes.
    ///
    /// Removing a dendrite-less inner neuron alters the network function
    /// when the activation satisfies φ(0) ≠ 0; with such activations this
    /// is probably not what you want. Input and output neurons are always
    /// kept so the network interface stays intact.
    pub fn minimise(&mut self) {
        self.prune();

        loop {
            let doomed: Vec<usize> = self
                .neurons()
                .filter(|n| n.role() == Role::Inner && n.dendrite_cnt() == 0)
                .map(Neuron::index)
                .collect();

            if doomed.is_empty() {
                break;
            }

            for index in doomed {
                self.remove_neuron(index)
                    .expect("index collected from live neuron iteration");
            }
        }

        self.reindex();
    }

    /// Iterates over live neurons in slot order.
    pub fn neurons(&self) -> impl Iterator<Item = &Neuron<A>> {
        self.slots.iter().flatten()
    }

    /// Iterates over live neurons in slot order, mutably.
    pub fn neurons_mut(&mut self) -> impl Iterator<Item = &mut Neuron<A>> {
        self.slots.iter_mut().flatten()
    }

    /// Iterates over input layer neurons in insertion order.
    pub fn inputs(&self) -> impl Iterator<Item = &Neuron<A>> {
        self.inputs.iter().map(|&i| {
            self.slots[i]
                .as_ref()
                .expect("input layer list only holds live indices")
        })
    }

    /// Iterates over output layer neurons in insertion order.
    pub fn outputs(&self) -> impl Iterator<Item = &Neuron<A>> {
        self.outputs.iter().map(|&i| {
            self.slots[i]
                .as_ref()
                .expect("output layer list only holds live indices")
        })
    }

    /// Visits input layer neurons in insertion order, mutably.
    pub fn for_each_input_mut(&mut self, mut f: impl FnMut(&mut Neuron<A>)) {
        for &i in &self.inputs {
            f(self.slots[i]
                .as_mut()
                .expect("input layer list only holds live indices"));
        }
    }

    /// Visits output layer neurons in insertion order, mutably.
    pub fn for_each_output_mut(&mut self, mut f: impl FnMut(&mut Neuron<A>)) {
        for &i in &self.outputs {
            f(self.slots[i]
                .as_mut()
                .expect("output layer list only holds live indices"));
        }
    }
}

impl<A> Default for Network<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::Identity;

    fn three_layer() -> Network<Identity> {
        // 2 inputs -> 1 inner -> 1 output, fully connected.
        let mut net = Network::new();
        let in1 = net.add_neuron(Role::Input, Identity);
        let in2 = net.add_neuron(Role::Input, Identity);
        let x = net.add_neuron(Role::Inner, Identity);
        let out = net.add_neuron(Role::Output, Identity);

        net.neuron_mut(x).unwrap().set_dendrite(in1, 0.5);
        net.neuron_mut(x).unwrap().set_dendrite(in2, 0.25);
        net.neuron_mut(out).unwrap().set_dendrite(x, 2.0);

        net
    }

    #[test]
    fn indices_match_slot_positions() {
        let net = three_layer();
        for n in net.neurons() {
            assert_eq!(net.neuron(n.index()).unwrap().index(), n.index());
        }
        assert_eq!(net.len(), 4);
        assert_eq!(net.slot_count(), 4);
    }

    #[test]
    fn layer_lists_track_roles_in_insertion_order() {
        let net = three_layer();
        assert_eq!(net.input_indices(), &[0, 1]);
        assert_eq!(net.output_indices(), &[3]);
        assert_eq!(net.input_dim(), 2);
        assert_eq!(net.output_dim(), 1);
    }

    #[test]
    fn set_dendrite_updates_in_place() {
        let mut net = three_layer();
        let x = net.neuron_mut(2).unwrap();
        x.set_dendrite(0, 0.75);
        assert_eq!(x.dendrite_cnt(), 2);
        assert_eq!(x.dendrite(0).unwrap().weight, 0.75);
        // Order preserved: updated dendrite keeps its position.
        assert_eq!(x.dendrites()[0].source, 0);
        assert_eq!(x.dendrites()[1].source, 1);
    }

    #[test]
    fn remove_neuron_vacates_and_strips_synapses() {
        let mut net = three_layer();
        net.remove_neuron(2).unwrap();

        assert_eq!(net.len(), 3);
        assert_eq!(net.slot_count(), 4);
        assert!(net.neuron(2).is_err());
        // The output neuron lost its synapse to the removed inner neuron.
        assert_eq!(net.neuron(3).unwrap().dendrite_cnt(), 0);
    }

    #[test]
    fn set_neuron_replaces_and_fills_vacancies() {
        let mut net = three_layer();

        // Replace the inner neuron: incoming synapses to it are erased.
        net.set_neuron(2, Role::Inner, Identity);
        assert_eq!(net.len(), 4);
        assert_eq!(net.neuron(3).unwrap().dendrite_cnt(), 0);
        assert_eq!(net.neuron(2).unwrap().dendrite_cnt(), 0);

        // Fill beyond the end: vacancies appear in between.
        net.set_neuron(6, Role::Output, Identity);
        assert_eq!(net.slot_count(), 7);
        assert_eq!(net.len(), 5);
        assert!(net.neuron(5).is_err());
        assert_eq!(net.output_indices(), &[3, 6]);
    }

    #[test]
    fn reindex_compacts_and_remaps_sources() {
        let mut net = three_layer();
        net.remove_neuron(1).unwrap();
        net.reindex();

        assert_eq!(net.len(), 3);
        assert_eq!(net.slot_count(), 3);
        assert_eq!(net.input_indices(), &[0]);
        assert_eq!(net.output_indices(), &[2]);

        // The inner neuron is now index 1; its surviving dendrite points at
        // input 0, and the output's dendrite followed the move.
        let x = net.neuron(1).unwrap();
        assert_eq!(x.dendrite_cnt(), 1);
        assert_eq!(x.dendrites()[0].source, 0);
        assert_eq!(net.neuron(2).unwrap().dendrites()[0].source, 1);
    }

    #[test]
    fn prune_drops_zero_weight_synapses() {
        let mut net = three_layer();
        net.neuron_mut(2).unwrap().set_dendrite(0, 0.0);
        net.prune();

        let x = net.neuron(2).unwrap();
        assert_eq!(x.dendrite_cnt(), 1);
        assert_eq!(x.dendrites()[0].source, 1);
    }

    #[test]
    fn minimise_removes_orphaned_inner_chain() {
        // in -> a -> b -> out, where a's only synapse has weight 0:
        // pruning orphans a, removing a orphans b.
        let mut net = Network::new();
        let inp = net.add_neuron(Role::Input, Identity);
        let a = net.add_neuron(Role::Inner, Identity);
        let b = net.add_neuron(Role::Inner, Identity);
        let out = net.add_neuron(Role::Output, Identity);

        net.neuron_mut(a).unwrap().set_dendrite(inp, 0.0);
        net.neuron_mut(b).unwrap().set_dendrite(a, 1.0);
        net.neuron_mut(out).unwrap().set_dendrite(b, 1.0);

        net.minimise();

        assert_eq!(net.len(), 2);
        assert_eq!(net.slot_count(), 2);
        assert_eq!(net.input_indices(), &[0]);
        assert_eq!(net.output_indices(), &[1]);
        assert_eq!(net.neuron(1).unwrap().dendrite_cnt(), 0);
    }

    #[test]
    fn self_edges_and_cycles_are_allowed() {
        let mut net: Network<Identity> = Network::new();
        let a = net.add_neuron(Role::Inner, Identity);
        let b = net.add_neuron(Role::Inner, Identity);

        net.neuron_mut(a).unwrap().set_dendrite(a, 1.0);
        net.neuron_mut(a).unwrap().set_dendrite(b, 1.0);
        net.neuron_mut(b).unwrap().set_dendrite(a, 1.0);

        assert_eq!(net.neuron(a).unwrap().dendrite_cnt(), 2);
        assert_eq!(net.neuron(b).unwrap().dendrite_cnt(), 1);
    }
}
