//! Halton sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::LowDiscrepancySequence;

/// Halton sequence in arbitrary dimension.
///
/// Coordinate `j` of point `k` is the radical inverse of `k + start_j` in
/// the `j`-th prime base. The plain sequence starts every coordinate at
/// index 1; the randomised one draws the start offsets from a seeded
/// generator, so equal seeds give equal sequences.
///
/// # Example
///
/// ```rust
/// use pillar_math::sequences::{HaltonSequence, LowDiscrepancySequence};
///
/// let mut halton = HaltonSequence::new(2);
/// assert_eq!(halton.next_point(), &[0.5, 1.0 / 3.0]);
/// assert_eq!(halton.next_point(), &[0.25, 2.0 / 3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct HaltonSequence {
    bases: Vec<u64>,
    starts: Vec<u64>,
    counter: u64,
    point: Vec<f64>,
}

impl HaltonSequence {
    /// Creates the plain Halton sequence.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self::with_starts(dimension, vec![0; dimension])
    }

    /// Creates a Halton sequence with seeded random start offsets.
    #[must_use]
    pub fn randomized(dimension: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let starts = (0..dimension).map(|_| u64::from(rng.gen::<u32>())).collect();
        Self::with_starts(dimension, starts)
    }

    fn with_starts(dimension: usize, starts: Vec<u64>) -> Self {
        Self {
            bases: first_primes(dimension),
            starts,
            counter: 0,
            point: vec![0.0; dimension],
        }
    }

    /// Returns the next point as an owned vector.
    pub fn next_vec(&mut self) -> Vec<f64> {
        self.next_point().to_vec()
    }
}

impl LowDiscrepancySequence for HaltonSequence {
    fn dimension(&self) -> usize {
        self.bases.len()
    }

    fn next_point(&mut self) -> &[f64] {
        self.counter += 1;
        for (j, (&base, &start)) in self.bases.iter().zip(&self.starts).enumerate() {
            self.point[j] = radical_inverse(self.counter + start, base);
        }
        &self.point
    }

    fn reset(&mut self) {
        self.counter = 0;
    }

    fn skip(&mut self, n: usize) {
        self.counter += n as u64;
    }
}

fn radical_inverse(mut index: u64, base: u64) -> f64 {
    let inv_base = 1.0 / base as f64;
    let mut factor = inv_base;
    let mut value = 0.0;
    while index > 0 {
        value += (index % base) as f64 * factor;
        index /= base;
        factor *= inv_base;
    }
    value
}

fn first_primes(count: usize) -> Vec<u64> {
    let mut primes = Vec::with_capacity(count);
    let mut candidate = 2u64;
    while primes.len() < count {
        if primes
            .iter()
            .take_while(|&&p| p * p <= candidate)
            .all(|&p| candidate % p != 0)
        {
            primes.push(candidate);
        }
        candidate += 1;
    }
    primes
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_primes() {
        assert_eq!(first_primes(6), vec![2, 3, 5, 7, 11, 13]);
    }

    #[test]
    fn test_van_der_corput() {
        let mut seq = HaltonSequence::new(1);
        let first: Vec<f64> = (0..4).map(|_| seq.next_point()[0]).collect();
        assert_eq!(first, vec![0.5, 0.25, 0.75, 0.125]);
    }

    #[test]
    fn test_third_dimension_base_five() {
        let mut seq = HaltonSequence::new(3);
        seq.skip(5);
        // 6 = 11 in base 5
        assert_relative_eq!(seq.next_point()[2], 0.24, epsilon = 1e-15);
    }

    #[test]
    fn test_reset_and_seed_determinism() {
        let mut a = HaltonSequence::randomized(4, 42);
        let mut b = HaltonSequence::randomized(4, 42);
        let pa: Vec<Vec<f64>> = (0..10).map(|_| a.next_vec()).collect();
        let pb: Vec<Vec<f64>> = (0..10).map(|_| b.next_vec()).collect();
        assert_eq!(pa, pb);

        a.reset();
        assert_eq!(a.next_vec(), pa[0]);

        let mut c = HaltonSequence::randomized(4, 7);
        assert_ne!(c.next_vec(), pa[0]);
    }

    #[test]
    fn test_points_in_unit_cube() {
        let mut seq = HaltonSequence::randomized(5, 42);
        for _ in 0..500 {
            assert!(seq.next_point().iter().all(|&u| (0.0..1.0).contains(&u)));
        }
    }
}
