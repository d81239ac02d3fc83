//! Low-discrepancy sequences.
//!
//! Multi-start optimisers draw their starting points from these sequences
//! rather than from pseudo-random numbers, which covers the parameter box
//! more evenly for the same number of trials.

mod halton;

pub use halton::HaltonSequence;

/// Trait for low-discrepancy sequences.
pub trait LowDiscrepancySequence {
    /// Returns the dimensionality of the sequence.
    fn dimension(&self) -> usize;

    /// Advances the sequence and returns the next point, each coordinate in
    /// `[0, 1)`.
    fn next_point(&mut self) -> &[f64];

    /// Resets the sequence to its initial state.
    fn reset(&mut self);

    /// Skips ahead by `n` points.
    fn skip(&mut self, n: usize);
}
