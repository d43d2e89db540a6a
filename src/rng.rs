//! Uniform random draws for phases and noise.

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Uniform};

// Largest f64 below 1.
const BELOW_ONE: f64 = 1. - f64::EPSILON / 2.;

/// A stream of values in `[0, 1)`.
///
/// The engine owns its source and moves it to the worker thread with itself.
pub trait RandomSource: Send {
    fn uniform(&mut self) -> f64;
}

/// Pseudo-random source, reproducible when built from a seed.
pub struct SeededSource {
    rng: StdRng,
    distr: Uniform<f64>,
}

impl SeededSource {
    pub fn new(seed: u64) -> SeededSource {
        SeededSource {
            rng: StdRng::seed_from_u64(seed),
            distr: Uniform::new(0., 1.),
        }
    }

    pub fn from_entropy() -> SeededSource {
        SeededSource {
            rng: StdRng::from_entropy(),
            distr: Uniform::new(0., 1.),
        }
    }
}

impl Default for SeededSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for SeededSource {
    fn uniform(&mut self) -> f64 {
        self.distr.sample(&mut self.rng).clamp(0., BELOW_ONE)
    }
}

/// Always returns the same value. For deterministic runs.
#[derive(Clone, Copy, Debug)]
pub struct FixedSource(pub f64);

impl RandomSource for FixedSource {
    fn uniform(&mut self) -> f64 {
        self.0.clamp(0., BELOW_ONE)
    }
}

#[cfg(test)]
mod test {
    use super::{FixedSource, RandomSource, SeededSource};

    #[test]
    fn seeded_is_reproducible() {
        let mut a = SeededSource::new(7);
        let mut b = SeededSource::new(7);
        for _ in 0..100 {
            let x = a.uniform();
            assert_eq!(x, b.uniform());
            assert!((0. ..1.).contains(&x));
        }
    }

    #[test]
    fn fixed_is_clamped() {
        assert_eq!(FixedSource(0.5).uniform(), 0.5);
        assert!(FixedSource(1.).uniform() < 1.);
        assert_eq!(FixedSource(-3.).uniform(), 0.);
    }
}
