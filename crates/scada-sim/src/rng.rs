//! Deterministic random number generation.
//!
//! Every source of noise in a run draws from one seeded [`SimRng`]. Since the
//! scheduler resumes processes in a fixed order, the draw order is fixed too,
//! and the same seed reproduces the same run.

use rand::rngs::SmallRng;
use rand::{Rng as _, SeedableRng};

/// Seeded random number generator.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: SmallRng,
}

impl SimRng {
    /// Creates a generator from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Uniform `f64` in `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        self.inner.r#gen::<f64>()
    }

    /// Uniform noise in `[-amplitude, amplitude]`.
    ///
    /// Returns exactly `0.0` for a zero amplitude, so noise-free runs are
    /// bit-exact. A draw is still consumed to keep the stream aligned.
    pub fn symmetric(&mut self, amplitude: f64) -> f64 {
        let unit = self.next_f64();
        if amplitude == 0.0 {
            return 0.0;
        }
        (unit * 2.0 - 1.0) * amplitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = SimRng::new(42);
        let mut b = SimRng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_f64(), b.next_f64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = SimRng::new(1);
        let mut b = SimRng::new(2);
        let same = (0..16).filter(|_| a.next_f64() == b.next_f64()).count();
        assert!(same < 16);
    }

    #[test]
    fn symmetric_stays_in_bounds() {
        let mut rng = SimRng::new(7);
        for _ in 0..10_000 {
            let v = rng.symmetric(10.0);
            assert!((-10.0..=10.0).contains(&v), "out of range: {v}");
        }
    }

    #[test]
    fn zero_amplitude_is_exact_zero() {
        let mut rng = SimRng::new(7);
        for _ in 0..100 {
            assert_eq!(rng.symmetric(0.0), 0.0);
        }
    }
}
