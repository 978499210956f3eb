//! Backward propagation of errors.
//!
//! See <https://en.wikipedia.org/wiki/Backpropagation>.
//!
//! A [`Trainer`] owns a reverse-adjacency map of the network (built once at
//! construction) and a pool of computation slots, one per concurrently held
//! training sample. Each slot pairs a forward grid (per-neuron `net` and
//! φ(`net`)) with a backward grid (per-neuron δ); both run through the
//! memoising engine in [`crate::computation`], so arbitrary — even cyclic —
//! wiring terminates.
//!
//! The trainer borrows the network mutably only for the duration of each
//! `train_*` call. The map indexes dendrites by `(consumer, position)`;
//! structurally mutating the topology (adding/removing neurons or synapses,
//! reindexing) between calls invalidates the trainer, which is why every
//! call re-checks the slot count and rejects a changed network.

use crate::activation::Activation;
use crate::computation::{Computation, Grid};
use crate::data::Dataset;
use crate::rate::Criterion;
use crate::topology::{Network, Neuron, Role};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
/// Forward phase result for one neuron.
struct ForwardValue {
    /// Sum of weighed inputs.
    net: f64,
    /// Activation value φ(net).
    phi_net: f64,
}

#[derive(Debug, Clone, Copy, Default)]
/// Backward phase result for one neuron.
struct BackwardValue {
    /// Backpropagated error signal.
    delta: f64,
}

#[derive(Debug, Clone)]
/// Reverse adjacency: for each neuron, the synapses leaving it.
///
/// Each entry is `(consumer index, dendrite position within the consumer)`.
/// Positions stay valid exactly as long as the topology is structurally
/// unchanged.
struct ForwardMap {
    edges: Vec<Vec<(usize, usize)>>,
}

impl ForwardMap {
    fn build<A>(network: &Network<A>) -> Self {
        let mut edges = vec![Vec::new(); network.slot_count()];

        for n in network.neurons() {
            for (pos, d) in n.dendrites().iter().enumerate() {
                edges[d.source].push((n.index(), pos));
            }
        }

        Self { edges }
    }

    #[inline]
    fn outgoing(&self, index: usize) -> &[(usize, usize)] {
        &self.edges[index]
    }
}

/// Forward phase: computes each neuron's `net` and φ(`net`).
struct ForwardEval<'g> {
    grid: &'g mut Grid<ForwardValue>,
}

impl<A: Activation> Computation<A> for ForwardEval<'_> {
    type Value = ForwardValue;

    fn grid(&self) -> &Grid<ForwardValue> {
        &*self.grid
    }

    fn grid_mut(&mut self) -> &mut Grid<ForwardValue> {
        self.grid
    }

    fn node_value(&mut self, network: &Network<A>, neuron: &Neuron<A>) -> Result<ForwardValue> {
        let mut net = 0.0;
        for d in neuron.dendrites() {
            net += d.weight * self.fx(network, d.source)?.phi_net;
        }

        Ok(ForwardValue {
            net,
            phi_net: neuron.activation().apply(net),
        })
    }
}

/// Backward phase: computes each neuron's δ from its consumers' δ, reading
/// the forward grid for `net` values.
struct BackwardEval<'g> {
    fmap: &'g ForwardMap,
    forward: &'g Grid<ForwardValue>,
    grid: &'g mut Grid<BackwardValue>,
}

impl<A: Activation> Computation<A> for BackwardEval<'_> {
    type Value = BackwardValue;

    fn grid(&self) -> &Grid<BackwardValue> {
        &*self.grid
    }

    fn grid_mut(&mut self) -> &mut Grid<BackwardValue> {
        self.grid
    }

    fn node_value(&mut self, network: &Network<A>, neuron: &Neuron<A>) -> Result<BackwardValue> {
        // Output layer deltas are seeded by the driver from the error
        // vector; reaching one here means the seeding was skipped.
        if neuron.role() == Role::Output {
            return Err(Error::Invariant(format!(
                "delta of output neuron {} was not seeded before the backward sweep",
                neuron.index()
            )));
        }

        let fmap = self.fmap;
        let forward = self.forward;

        let mut delta = 0.0;
        for &(consumer, pos) in fmap.outgoing(neuron.index()) {
            let weight = network
                .neuron(consumer)?
                .dendrites()
                .get(pos)
                .ok_or_else(|| {
                    Error::Invariant(format!(
                        "dendrite {pos} of neuron {consumer} no longer exists; \
                         the topology changed under the trainer"
                    ))
                })?
                .weight;

            delta += self.fx(network, consumer)?.delta * weight;
        }

        let net = forward.value(neuron.index())?.net;

        Ok(BackwardValue {
            delta: delta * neuron.activation().derivative(net),
        })
    }
}

#[derive(Debug, Clone)]
/// One computation slot: forward and backward grids for a single sample.
struct Slot {
    activations: Grid<ForwardValue>,
    deltas: Grid<BackwardValue>,
}

impl Slot {
    fn new(cells: usize) -> Self {
        Self {
            activations: Grid::new(cells),
            deltas: Grid::new(cells),
        }
    }

    /// Runs the forward phase and returns the network output vector.
    fn run_forward<A: Activation>(
        &mut self,
        network: &Network<A>,
        input: &[f64],
    ) -> Result<Vec<f64>> {
        self.activations.reset();

        if input.len() != network.input_dim() {
            return Err(Error::Shape(format!(
                "input len {} does not match network input_dim {}",
                input.len(),
                network.input_dim()
            )));
        }

        for (&index, &x) in network.input_indices().iter().zip(input) {
            self.activations.seed(
                index,
                ForwardValue {
                    net: 0.0,
                    phi_net: x,
                },
            )?;
        }

        let mut output = Vec::with_capacity(network.output_dim());
        let mut eval = ForwardEval {
            grid: &mut self.activations,
        };
        for &index in network.output_indices() {
            output.push(eval.fx(network, index)?.phi_net);
        }

        Ok(output)
    }

    /// Runs the backward phase for the given error vector.
    ///
    /// The forward grid must hold this sample's results.
    fn run_backward<A: Activation>(
        &mut self,
        network: &Network<A>,
        fmap: &ForwardMap,
        error: &[f64],
    ) -> Result<()> {
        self.deltas.reset();

        if error.len() != network.output_dim() {
            return Err(Error::Shape(format!(
                "error len {} does not match network output_dim {}",
                error.len(),
                network.output_dim()
            )));
        }

        for (&index, &err) in network.output_indices().iter().zip(error) {
            let n = network.neuron(index)?;
            let dact = n
                .activation()
                .derivative(self.activations.value(index)?.net);

            self.deltas.seed(index, BackwardValue { delta: err * dact })?;
        }

        // Forcing every input neuron computes every delta on the paths from
        // the outputs back to the inputs. Deltas of unused inner neurons
        // stay unfixed.
        let mut eval = BackwardEval {
            fmap,
            forward: &self.activations,
            grid: &mut self.deltas,
        };
        for &index in network.input_indices() {
            eval.fx(network, index)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
/// Backpropagation trainer with on-line and batch modes.
///
/// Build it once per (structurally fixed) network, then call
/// [`Trainer::train_one`] or [`Trainer::train_batch`] as many times as
/// needed. The learning factor per step comes from a [`Criterion`], which
/// also encodes the stop condition (a factor of 0 skips the update).
pub struct Trainer {
    fmap: ForwardMap,
    pins: Vec<(usize, f64)>,
    slots: Vec<Slot>,
    cells: usize,
}

impl Trainer {
    /// Creates a trainer for `network`.
    pub fn new<A>(network: &Network<A>) -> Self {
        Self::with_pins(network, Vec::new())
    }

    /// Creates a trainer with hard activation pins.
    ///
    /// Each `(index, phi)` pair fixes that neuron's activation value as a
    /// constant for every slot; its delta is pinned to 0, so its potential
    /// synapses absorb no gradient. Pinned neurons have `net` = 0, so it is
    /// not meaningful for them to have synapses of their own.
    pub fn with_pins<A>(network: &Network<A>, pins: Vec<(usize, f64)>) -> Self {
        Self {
            fmap: ForwardMap::build(network),
            pins,
            slots: Vec::new(),
            cells: network.slot_count(),
        }
    }

    fn check_network<A>(&self, network: &Network<A>) -> Result<()> {
        if network.slot_count() != self.cells {
            return Err(Error::Invariant(format!(
                "network has {} slots but the trainer was built for {}; \
                 rebuild the trainer after structural changes",
                network.slot_count(),
                self.cells
            )));
        }
        Ok(())
    }

    /// Makes at least `n` computation slots available, applying the hard
    /// pins to each newly created slot.
    fn assert_slots(&mut self, n: usize) -> Result<()> {
        while self.slots.len() < n {
            let mut slot = Slot::new(self.cells);

            for &(index, phi) in &self.pins {
                slot.activations.pin(
                    index,
                    ForwardValue {
                        net: 0.0,
                        phi_net: phi,
                    },
                )?;
                slot.deltas.pin(index, BackwardValue { delta: 0.0 })?;
            }

            self.slots.push(slot);
        }

        Ok(())
    }

    /// Computes the forward and backward phase for one sample.
    ///
    /// Returns the squared error norm Σ (actualᵢ − targetᵢ)².
    fn compute<A: Activation>(
        network: &Network<A>,
        fmap: &ForwardMap,
        slot: &mut Slot,
        input: &[f64],
        target: &[f64],
    ) -> Result<f64> {
        let mut error = slot.run_forward(network, input)?;

        if target.len() != error.len() {
            return Err(Error::Shape(format!(
                "target len {} does not match network output_dim {}",
                target.len(),
                error.len()
            )));
        }

        let mut err_norm2 = 0.0;
        for (err, &want) in error.iter_mut().zip(target) {
            *err -= want;
            err_norm2 += *err * *err;
        }

        slot.run_backward(network, fmap, &error)?;

        Ok(err_norm2)
    }

    /// Applies the previously computed propagation to the weights:
    /// `w ← w − α · δ(consumer) · φ(source)` for every synapse.
    fn update<A>(network: &mut Network<A>, slot: &Slot, alpha: f64) -> Result<()> {
        for n in network.neurons_mut() {
            let delta = slot.deltas.value(n.index())?.delta;

            for d in n.dendrites_mut() {
                let phi = slot.activations.value(d.source)?.phi_net;
                d.weight -= alpha * delta * phi;
            }
        }

        Ok(())
    }

    /// Runs backpropagation on a single (input, target) pair: on-line and
    /// stochastic training modes.
    ///
    /// The update is applied immediately after the computation if the
    /// criterion returns a non-zero learning factor. Returns the squared
    /// error norm.
    pub fn train_one<A: Activation, C: Criterion>(
        &mut self,
        network: &mut Network<A>,
        input: &[f64],
        target: &[f64],
        criterion: &mut C,
    ) -> Result<f64> {
        self.check_network(network)?;
        self.assert_slots(1)?;

        let err_norm2 = Self::compute(network, &self.fmap, &mut self.slots[0], input, target)?;

        let alpha = criterion.rate(err_norm2);
        if alpha != 0.0 {
            Self::update(network, &self.slots[0], alpha)?;
        }

        Ok(err_norm2)
    }

    /// Runs backpropagation on a training set: batch mode.
    ///
    /// Every sample is computed (into its own slot) before any update; the
    /// criterion sees the average squared error norm, and its learning
    /// factor is divided by the set size before being applied per slot —
    /// equivalent to one application of the averaged gradient. Returns the
    /// average squared error norm.
    pub fn train_batch<A: Activation, C: Criterion>(
        &mut self,
        network: &mut Network<A>,
        set: &Dataset,
        criterion: &mut C,
    ) -> Result<f64> {
        self.check_network(network)?;

        if set.is_empty() {
            return Err(Error::Shape("training set must not be empty".to_owned()));
        }

        self.assert_slots(set.len())?;

        let mut err_norm2_avg = 0.0;
        for (idx, slot) in self.slots.iter_mut().take(set.len()).enumerate() {
            err_norm2_avg += Self::compute(network, &self.fmap, slot, set.input(idx), set.target(idx))?;
        }
        err_norm2_avg /= set.len() as f64;

        let alpha = criterion.rate(err_norm2_avg);
        if alpha != 0.0 {
            let alpha_per_sample = alpha / set.len() as f64;
            for slot in self.slots.iter().take(set.len()) {
                Self::update(network, slot, alpha_per_sample)?;
            }
        }

        Ok(err_norm2_avg)
    }
}
