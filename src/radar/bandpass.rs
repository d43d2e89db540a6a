use std::f64::consts::PI;

use num::complex::Complex64;

use crate::{
    error::RadarResult,
    signal::{approx::ApproxFunction, SampledDomain},
};

const STANDARD_ENTRIES: usize = 10_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BandpassShape {
    // Flat top to a quarter of the bandwidth, raised cosine edges down to zero at
    // three quarters of the bandwidth.
    Standard,
    // Unit response on ±bandwidth/2.
    Rectangular,
}

/// Complex receiver response as a function of baseband frequency, Hz.
pub fn bandpass_filter(shape: BandpassShape, bandwidth: f64) -> RadarResult<ApproxFunction<Complex64>> {
    let one = Complex64::new(1., 0.);
    let zero = Complex64::new(0., 0.);

    match shape {
        BandpassShape::Standard => {
            let freqs = SampledDomain::from_sample_interval(
                -bandwidth,
                2. * bandwidth / (STANDARD_ENTRIES - 1) as f64,
                STANDARD_ENTRIES,
            );
            let flat = 0.25 * bandwidth;
            let edge = 0.75 * bandwidth;

            let values = freqs
                .iter()
                .map(|f| {
                    let f = f.abs();
                    if f < flat {
                        one
                    } else if f < edge {
                        Complex64::new(0.5 * (1. - (PI * (f - edge) / (0.5 * bandwidth)).cos()), 0.)
                    } else {
                        zero
                    }
                })
                .collect::<Vec<_>>();

            ApproxFunction::new(freqs.to_array(), values)
        }
        BandpassShape::Rectangular => ApproxFunction::with_bounds(
            vec![-0.5 * bandwidth, 0.5 * bandwidth],
            vec![one, one],
            zero,
            zero,
        ),
    }
}
