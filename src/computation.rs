//! Cycle-safe memoised computation over a network.
//!
//! A [`Grid`] stores one [`Fixable`] result cell per neuron slot. The
//! [`Computation`] trait supplies the memoising evaluator [`Computation::fx`]
//! on top of it: the per-neuron work lives in the implementor's
//! [`Computation::node_value`] hook, which may recurse into `fx` for its
//! sources.
//!
//! Before the hook runs, the cell is soft-fixed at its default value. A
//! back-edge reached during recursion therefore finds a fixed cell and takes
//! the default instead of recursing forever. On acyclic graphs the pre-fix is
//! inert (the hook's result overwrites it before anyone else reads it); on
//! cyclic graphs every feedback edge contributes the default — one-step
//! unrolling of the cycle.
//!
//! [`NetworkFunction`] is the plain forward evaluator built on this engine:
//! its value per neuron is the activation value φ(net).

use crate::activation::Activation;
use crate::fixable::{Fixable, Fixation};
use crate::topology::{Network, Neuron};
use crate::{Error, Result};

#[derive(Debug, Clone)]
/// Per-neuron result cells for one evaluation pass.
pub struct Grid<R> {
    cells: Vec<Fixable<R>>,
    reset: bool,
}

impl<R: Copy + Default> Grid<R> {
    /// Creates a grid of `len` unfixed default cells.
    pub fn new(len: usize) -> Self {
        Self {
            cells: (0..len).map(|_| Fixable::default()).collect(),
            reset: true,
        }
    }

    /// Returns the number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns true if the grid has no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Resets every cell to the default value, unfixed.
    ///
    /// Hard-fixed cells keep their value and fixation. Skipped in O(1) when
    /// the grid is already reset.
    pub fn reset(&mut self) {
        if self.reset {
            return;
        }

        for cell in &mut self.cells {
            cell.reset(R::default());
        }

        self.reset = true;
    }

    /// Returns the cell at `index`.
    pub fn cell(&self, index: usize) -> Result<&Fixable<R>> {
        self.cells
            .get(index)
            .ok_or_else(|| Error::Index(format!("neuron index {index} out of grid range")))
    }

    fn cell_mut(&mut self, index: usize) -> Result<&mut Fixable<R>> {
        self.cells
            .get_mut(index)
            .ok_or_else(|| Error::Index(format!("neuron index {index} out of grid range")))
    }

    /// Reads the value at `index` without evaluating.
    ///
    /// Fails if the cell is not fixed: a value that was never computed nor
    /// pinned must not be read.
    pub fn value(&self, index: usize) -> Result<R> {
        let cell = self.cell(index)?;

        if cell.fixed() {
            return Ok(*cell.get());
        }

        Err(Error::Invariant(format!(
            "value for neuron {index} was read before being fixed"
        )))
    }

    /// Sets and soft-fixes the value at `index` (driver seeding: network
    /// inputs, output layer deltas).
    ///
    /// Fails on a cell that is already fixed; hard-pinned neurons cannot be
    /// seeded.
    pub fn seed(&mut self, index: usize, value: R) -> Result<()> {
        self.cell_mut(index)?.fix_value(value, false, Fixation::Soft)?;
        self.reset = false;
        Ok(())
    }

    /// Hard-fixes the value at `index`.
    ///
    /// The pin survives [`Grid::reset`]; use it for constants such as a bias
    /// source or a frozen activation.
    pub fn pin(&mut self, index: usize, value: R) -> Result<()> {
        self.cell_mut(index)?.fix_value(value, true, Fixation::Hard)?;
        self.reset = false;
        Ok(())
    }

    /// Soft-fixes the current (default) value ahead of evaluation, breaking
    /// recursion on cycles.
    fn soft_fix(&mut self, index: usize) -> Result<()> {
        self.cell_mut(index)?.fix(Fixation::Soft);
        self.reset = false;
        Ok(())
    }

    /// Overwrites an advance soft-fix with the computed value.
    fn overwrite(&mut self, index: usize, value: R) -> Result<()> {
        self.cell_mut(index)?.set(value, true)
    }
}

/// A memoised per-neuron computation over a network.
///
/// The implementor supplies [`Computation::node_value`]; the engine supplies
/// [`Computation::fx`]. `Value::default()` must be the additive identity of
/// whatever aggregation `node_value` performs over its sources — that is
/// what makes the cycle break semantically equivalent to severing the
/// feedback edge.
pub trait Computation<A: Activation> {
    /// Per-neuron result type.
    type Value: Copy + Default;

    /// The result grid.
    fn grid(&self) -> &Grid<Self::Value>;

    /// The result grid, mutably.
    fn grid_mut(&mut self) -> &mut Grid<Self::Value>;

    /// Computes the result for one neuron.
    ///
    /// May call [`Computation::fx`] recursively for the neuron's sources (or
    /// consumers, for backward-running computations).
    fn node_value(&mut self, network: &Network<A>, neuron: &Neuron<A>) -> Result<Self::Value>;

    /// Evaluates the result for the neuron at `index`, memoised.
    ///
    /// A fixed cell is returned as-is (a hard pin is never re-evaluated).
    /// Otherwise the cell is soft-fixed in advance, `node_value` runs, and
    /// its result overwrites the cell. Repeated calls are cheap.
    fn fx(&mut self, network: &Network<A>, index: usize) -> Result<Self::Value> {
        {
            let cell = self.grid().cell(index)?;
            if cell.fixed() {
                return Ok(*cell.get());
            }
        }

        self.grid_mut().soft_fix(index)?;

        let neuron = network.neuron(index)?;
        let value = self.node_value(network, neuron)?;

        self.grid_mut().overwrite(index, value)?;
        Ok(value)
    }
}

#[derive(Debug, Clone)]
/// The network function: evaluates output activations for given inputs.
///
/// Created from a shared borrow of the topology; the network cannot change
/// while the evaluator exists, so its grid stays validly sized.
pub struct NetworkFunction<'net, A> {
    network: &'net Network<A>,
    grid: Grid<f64>,
}

impl<'net, A: Activation> NetworkFunction<'net, A> {
    /// Creates an evaluator for `network`.
    pub fn new(network: &'net Network<A>) -> Self {
        Self {
            network,
            grid: Grid::new(network.slot_count()),
        }
    }

    /// Returns the evaluated network.
    #[inline]
    pub fn network(&self) -> &Network<A> {
        self.network
    }

    /// Hard-fixes the activation value of the neuron at `index` (bias
    /// sources, frozen neurons). The pin survives resets.
    pub fn pin(&mut self, index: usize, phi: f64) -> Result<()> {
        self.grid.pin(index, phi)
    }

    /// Reads a cached activation value without evaluating.
    pub fn value(&self, index: usize) -> Result<f64> {
        self.grid.value(index)
    }

    /// Computes the network function for `input`.
    ///
    /// Resets the grid (hard pins persist), seeds the input layer in order,
    /// then evaluates every output neuron in order.
    pub fn call(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        let network = self.network;

        self.grid.reset();

        if input.len() != network.input_dim() {
            return Err(Error::Shape(format!(
                "input len {} does not match network input_dim {}",
                input.len(),
                network.input_dim()
            )));
        }

        for (&index, &x) in network.input_indices().iter().zip(input) {
            self.grid.seed(index, x)?;
        }

        let mut output = Vec::with_capacity(network.output_dim());
        for &index in network.output_indices() {
            output.push(self.fx(network, index)?);
        }

        Ok(output)
    }
}

impl<A: Activation> Computation<A> for NetworkFunction<'_, A> {
    type Value = f64;

    fn grid(&self) -> &Grid<f64> {
        &self.grid
    }

    fn grid_mut(&mut self) -> &mut Grid<f64> {
        &mut self.grid
    }

    fn node_value(&mut self, network: &Network<A>, neuron: &Neuron<A>) -> Result<f64> {
        let mut net = 0.0;
        for d in neuron.dendrites() {
            net += d.weight * self.fx(network, d.source)?;
        }
        Ok(neuron.activation().apply(net))
    }
}
