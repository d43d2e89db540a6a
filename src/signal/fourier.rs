use std::f64::consts::PI;

use num::complex::Complex64;

use super::{approx::ApproxFunction, SampledDomain};
use crate::error::RadarResult;

const I: Complex64 = Complex64::new(0., 1.);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    // Kernel exp(-2πitf)
    Forward,
    // Kernel exp(+2πitf)
    Inverse,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Forward => -1.,
            Direction::Inverse => 1.,
        }
    }
}

/// Riemann sum of the continuous Fourier integral at a single point `f`.
///
/// Sums `g(t) * exp(∓2πitf) * step` for `t = start, start + step, ...` while `t < end`.
pub fn transform_at(
    g: impl Fn(f64) -> Complex64,
    f: f64,
    step: f64,
    start: f64,
    end: f64,
    direction: Direction,
) -> Complex64 {
    let sign = direction.sign();
    let mut acc = Complex64::new(0., 0.);
    let mut t = start;
    while t < end {
        acc += g(t) * (sign * 2. * PI * I * t * f).exp();
        t += step;
    }
    acc * step
}

/// Transforms `g` at every point of `points` and tables the result over those points.
pub fn transform(
    g: impl Fn(f64) -> Complex64,
    points: &SampledDomain,
    step: f64,
    start: f64,
    end: f64,
    direction: Direction,
) -> RadarResult<ApproxFunction<Complex64>> {
    let values = points
        .iter()
        .map(|f| transform_at(&g, f, step, start, end, direction))
        .collect::<Vec<_>>();

    ApproxFunction::new(points.to_array(), values)
}
