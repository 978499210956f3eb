//! Single-slot memoisation cell with a three-state fixation lattice.
//!
//! A [`Fixable`] holds one value and a [`Fixation`] mark. The mark forms an
//! ordered lattice `Unfixed < Soft < Hard`:
//!
//! - `Soft` is the memoisation pin: "this value is being (or has been)
//!   computed; a recursive visitor should take it as-is". It is cleared by
//!   [`Fixable::reset`].
//! - `Hard` is the constant pin (bias sources, frozen activations). It
//!   survives `reset`, so pinned values persist across evaluation passes.

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
/// Fixation state of a [`Fixable`] cell.
pub enum Fixation {
    /// The value has not been fixed; it may be set freely.
    Unfixed,
    /// Fixed until the next `reset` (memoisation, cycle breaking).
    Soft,
    /// Fixed permanently; `reset` is a no-op.
    Hard,
}

#[derive(Debug, Clone)]
/// A value that may be fixed.
///
/// Fixation is only ever applied explicitly; constructors do not fix.
pub struct Fixable<T> {
    value: T,
    fixation: Fixation,
}

impl<T> Fixable<T> {
    /// Creates an unfixed cell holding `value`.
    #[inline]
    pub fn new(value: T) -> Self {
        Self {
            value,
            fixation: Fixation::Unfixed,
        }
    }

    /// Returns true iff the value is fixed (softly or hard).
    #[inline]
    pub fn fixed(&self) -> bool {
        self.fixation != Fixation::Unfixed
    }

    /// Returns the current fixation state.
    #[inline]
    pub fn fixation(&self) -> Fixation {
        self.fixation
    }

    /// Returns the current value, fixed or not.
    #[inline]
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Assigns `value`.
    ///
    /// Fails if the cell is hard-fixed, or soft-fixed without
    /// `override_soft`.
    pub fn set(&mut self, value: T, override_soft: bool) -> Result<()> {
        match self.fixation {
            Fixation::Hard => {
                return Err(Error::Invariant(
                    "attempt to set a hard-fixed value".to_owned(),
                ));
            }
            Fixation::Soft if !override_soft => {
                return Err(Error::Invariant(
                    "attempt to set a soft-fixed value without override".to_owned(),
                ));
            }
            _ => {}
        }

        self.value = value;
        Ok(())
    }

    /// Raises the fixation state to at least `mode` (never lowers it).
    #[inline]
    pub fn fix(&mut self, mode: Fixation) {
        self.fixation = self.fixation.max(mode);
    }

    /// Sets `value` (see [`Fixable::set`]) and then fixes it at `mode`.
    pub fn fix_value(&mut self, value: T, override_soft: bool, mode: Fixation) -> Result<()> {
        self.set(value, override_soft)?;
        self.fix(mode);
        Ok(())
    }

    /// Restores `value` and clears the fixation mark.
    ///
    /// Hard-fixed cells are left untouched.
    pub fn reset(&mut self, value: T) {
        if self.fixation == Fixation::Hard {
            return;
        }

        self.value = value;
        self.fixation = Fixation::Unfixed;
    }
}

impl<T: Default> Default for Fixable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
