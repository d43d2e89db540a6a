use ndarray::Array1;
use num::complex::Complex64;

use self::{
    approx::ApproxFunction,
    fourier::{transform, Direction},
};
use crate::error::RadarResult;

pub mod approx;
pub mod fourier;
pub mod scalar;

// Sample counts for the pulse shaping transforms.
const NUM_FREQUENCIES: usize = 1000;
const NUM_TIMES: usize = 1000;

// Represents a time or frequency interval, sampled at a given interval.
#[derive(Clone, Debug)]
pub struct SampledDomain {
    start: f64,
    interval: f64,
    samples: usize,
}

impl SampledDomain {
    pub fn from_sample_interval(start: f64, interval: f64, num: usize) -> SampledDomain {
        SampledDomain {
            start,
            interval,
            samples: num,
        }
    }

    // The end is exclusive: `start + n * interval` for n < samples.
    pub fn from_range(start: f64, end: f64, num: usize) -> SampledDomain {
        Self::from_sample_interval(start, (end - start) / num as f64, num)
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.start + self.samples as f64 * self.interval
    }

    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn sample_interval(&self) -> f64 {
        self.interval
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> {
        let (start, interval) = (self.start, self.interval);
        (0..self.samples).map(move |n| start + interval * n as f64)
    }

    pub fn to_array(&self) -> Array1<f64> {
        self.iter().collect()
    }
}

/// The emitted pulse: 1 on `[0, width)`, 0 everywhere else.
pub fn rectangular_pulse(width: f64) -> RadarResult<ApproxFunction<f64>> {
    ApproxFunction::with_bounds(vec![0., width], vec![1., 1.], 0., 0.)
}

/// Envelope of `emitted` after it passes the receiver's bandpass filter.
///
/// The pulse is taken to the frequency domain over ±3/width, multiplied by the filter
/// response and brought back over `[-2 width, 3 width)`. The result is the magnitude
/// of the complex envelope.
pub fn filtered_pulse(
    emitted: &ApproxFunction<f64>,
    bandpass: &ApproxFunction<Complex64>,
    width: f64,
) -> RadarResult<ApproxFunction<f64>> {
    let dt = width * 1e-3;
    let freqs = SampledDomain::from_range(-3. / width, 3. / width, NUM_FREQUENCIES);
    let df = freqs.sample_interval();

    let spectrum = transform(
        |t| Complex64::new(emitted.evaluate(t), 0.),
        &freqs,
        dt,
        0.,
        width,
        Direction::Forward,
    )?;

    let shaped = spectrum
        .values()
        .iter()
        .zip(freqs.iter())
        .map(|(s, f)| s * bandpass.evaluate(f))
        .collect::<Vec<_>>();
    let shaped = ApproxFunction::new(freqs.to_array(), shaped)?;

    let times = SampledDomain::from_range(-2. * width, 3. * width, NUM_TIMES);
    let envelope = transform(
        |f| shaped.evaluate(f),
        &times,
        df,
        freqs.start(),
        freqs.end(),
        Direction::Inverse,
    )?;

    ApproxFunction::new(times.to_array(), envelope.values().mapv(|x| x.norm()))
}
