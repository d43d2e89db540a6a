use std::f64::consts::FRAC_PI_2;

use tracing::debug;

use super::{
    adc::AdcMode, bandpass::BandpassShape, BOLTZMANN_CONSTANT, MAX_SIM_DISTANCE, NOISE_TEMPERATURE,
    SPEED_OF_LIGHT,
};
use crate::{
    antenna::BeamShape,
    error::{RadarError, RadarResult},
    helper::{deg_to_rad, from_decibels, wavelength, wrap_angle},
};

// Guards the bin count against samples that land a rounding error short of a whole bin.
const BIN_COUNT_SLACK: f64 = 1e-9;

/// User facing radar settings.
///
/// Setters take configuration units (GHz, µs, ms, MHz, dB, degrees) and store SI.
/// Getters return SI.
#[derive(Clone, Debug)]
pub struct RadarConfig {
    peak_power: Option<f64>,
    frequency: Option<f64>,
    pulse_width: Option<f64>,
    sampling_time: Option<f64>,
    prt: Option<f64>,
    max_receive_time: Option<f64>,
    bandwidth: Option<f64>,
    noise_figure: Option<f64>,
    switch_time: Option<f64>,
    antenna_gain: Option<f64>,
    hor_beamwidth: Option<f64>,
    el_beamwidth: Option<f64>,
    // rad/s, positive counterclockwise
    rotation_speed: f64,
    // rad, counterclockwise from east
    theta: Option<f64>,
    hor_beam_shape: BeamShape,
    el_beam_shape: BeamShape,
    bandpass: BandpassShape,
    adc_mode: Option<AdcMode>,
    adc_resolution: Option<u32>,
    adc_min2noise: Option<f64>,
    adc_max2noise: Option<f64>,
}

impl Default for RadarConfig {
    fn default() -> Self {
        RadarConfig {
            peak_power: None,
            frequency: None,
            pulse_width: None,
            sampling_time: None,
            prt: None,
            max_receive_time: None,
            bandwidth: None,
            noise_figure: None,
            switch_time: None,
            antenna_gain: None,
            hor_beamwidth: None,
            el_beamwidth: None,
            rotation_speed: 0.,
            theta: None,
            hor_beam_shape: BeamShape::Gaussian,
            el_beam_shape: BeamShape::Gaussian,
            bandpass: BandpassShape::Standard,
            adc_mode: None,
            adc_resolution: None,
            adc_min2noise: None,
            adc_max2noise: None,
        }
    }
}

fn required(value: Option<f64>, name: &'static str) -> RadarResult<f64> {
    value.ok_or(RadarError::MissingParameter(name))
}

// Timing and width values divide or scale table spacings, so they must be finite and > 0.
fn check_positive(value: f64, name: &'static str) -> RadarResult<()> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(RadarError::InconsistentParameters(format!(
            "{} must be positive and finite, got {}",
            name, value
        )))
    }
}

impl RadarConfig {
    pub fn new() -> RadarConfig {
        Self::default()
    }

    // W
    pub fn set_peak_power(&mut self, power: f64) {
        self.peak_power = Some(power);
    }

    // GHz
    pub fn set_frequency(&mut self, f: f64) {
        self.frequency = Some(f * 1e9);
    }

    // µs
    pub fn set_pulse_width(&mut self, width: f64) {
        self.pulse_width = Some(width * 1e-6);
    }

    // µs
    pub fn set_sampling_time(&mut self, t: f64) {
        self.sampling_time = Some(t * 1e-6);
    }

    // ms
    pub fn set_prt(&mut self, t: f64) {
        self.prt = Some(t * 1e-3);
    }

    // ms
    pub fn set_max_receive_time(&mut self, t: f64) {
        self.max_receive_time = Some(t * 1e-3);
    }

    // MHz
    pub fn set_bandwidth(&mut self, bandwidth: f64) {
        self.bandwidth = Some(bandwidth * 1e6);
    }

    // dB
    pub fn set_noise_figure(&mut self, nf: f64) {
        self.noise_figure = Some(from_decibels(nf));
    }

    // µs
    pub fn set_switch_time(&mut self, t: f64) {
        self.switch_time = Some(t * 1e-6);
    }

    // dB
    pub fn set_antenna_gain(&mut self, gain: f64) {
        self.antenna_gain = Some(from_decibels(gain));
    }

    // deg
    pub fn set_az_beamwidth(&mut self, width: f64) {
        self.hor_beamwidth = Some(deg_to_rad(width));
    }

    // deg
    pub fn set_el_beamwidth(&mut self, width: f64) {
        self.el_beamwidth = Some(deg_to_rad(width));
    }

    // deg/s, clockwise seen from above
    pub fn set_rotation_speed(&mut self, speed: f64) {
        self.rotation_speed = -deg_to_rad(speed);
    }

    // deg, compass azimuth: 0 is north, 90 is east
    pub fn set_azimuth(&mut self, azimuth: f64) {
        self.theta = Some(wrap_angle(deg_to_rad(90. - azimuth)));
    }

    pub fn set_hor_beam_shape(&mut self, shape: BeamShape) {
        self.hor_beam_shape = shape;
    }

    pub fn set_el_beam_shape(&mut self, shape: BeamShape) {
        self.el_beam_shape = shape;
    }

    pub fn set_bandpass(&mut self, shape: BandpassShape) {
        self.bandpass = shape;
    }

    pub fn set_adc_mode(&mut self, mode: AdcMode) {
        self.adc_mode = Some(mode);
    }

    // bits
    pub fn set_adc_resolution(&mut self, resolution: u32) {
        self.adc_resolution = Some(resolution);
    }

    // Multiples of the average noise power
    pub fn set_adc_min2noise(&mut self, ratio: f64) {
        self.adc_min2noise = Some(ratio);
    }

    pub fn set_adc_max2noise(&mut self, ratio: f64) {
        self.adc_max2noise = Some(ratio);
    }

    pub fn peak_power(&self) -> Option<f64> {
        self.peak_power
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn pulse_width(&self) -> Option<f64> {
        self.pulse_width
    }

    // Defaults to half the pulse width
    pub fn sampling_time(&self) -> Option<f64> {
        self.sampling_time.or_else(|| self.pulse_width.map(|pw| 0.5 * pw))
    }

    pub fn prt(&self) -> Option<f64> {
        self.prt
    }

    // Defaults to the PRT less the duplexer switch time
    pub fn max_receive_time(&self) -> Option<f64> {
        self.max_receive_time
            .or_else(|| Some(self.prt? - self.switch_time?))
    }

    pub fn bandwidth(&self) -> Option<f64> {
        self.bandwidth
    }

    pub fn noise_figure(&self) -> Option<f64> {
        self.noise_figure
    }

    pub fn switch_time(&self) -> Option<f64> {
        self.switch_time
    }

    pub fn antenna_gain(&self) -> Option<f64> {
        self.antenna_gain
    }

    pub fn hor_beamwidth(&self) -> Option<f64> {
        self.hor_beamwidth
    }

    pub fn el_beamwidth(&self) -> Option<f64> {
        self.el_beamwidth
    }

    pub fn rotation_speed(&self) -> f64 {
        self.rotation_speed
    }

    // Defaults to north
    pub fn theta(&self) -> f64 {
        self.theta.unwrap_or(FRAC_PI_2)
    }

    pub fn hor_beam_shape(&self) -> BeamShape {
        self.hor_beam_shape
    }

    pub fn el_beam_shape(&self) -> BeamShape {
        self.el_beam_shape
    }

    pub fn bandpass(&self) -> BandpassShape {
        self.bandpass
    }

    pub fn adc_mode(&self) -> Option<AdcMode> {
        self.adc_mode
    }

    pub fn adc_resolution(&self) -> Option<u32> {
        self.adc_resolution
    }

    pub fn adc_min2noise(&self) -> Option<f64> {
        self.adc_min2noise
    }

    pub fn adc_max2noise(&self) -> Option<f64> {
        self.adc_max2noise
    }

    /// Checks that every required value is set and that the timing is consistent, then
    /// derives the range and noise parameters.
    pub fn validate(&self) -> RadarResult<RadarParameters> {
        let peak_power = required(self.peak_power, "PeakPower")?;
        let frequency = required(self.frequency, "Frequency")?;
        let pulse_width = required(self.pulse_width, "PulseWidth")?;
        let prt = required(self.prt, "PRT")?;
        let bandwidth = required(self.bandwidth, "BandWidth")?;
        let noise_figure = required(self.noise_figure, "NoiseFigure")?;
        let switch_time = required(self.switch_time, "DuplexSwitchTime")?;
        let hor_beamwidth = required(self.hor_beamwidth, "AzBeamWidth")?;
        let el_beamwidth = required(self.el_beamwidth, "ElBeamWidth")?;
        let antenna_gain = required(self.antenna_gain, "AntennaeGain")?;
        let sampling_time = required(self.sampling_time(), "SamplingTime")?;
        let max_receive_time = required(self.max_receive_time(), "MaxReceiveTime")?;

        for (value, name) in [
            (frequency, "Frequency"),
            (pulse_width, "PulseWidth"),
            (prt, "PRT"),
            (bandwidth, "BandWidth"),
            (hor_beamwidth, "AzBeamWidth"),
            (el_beamwidth, "ElBeamWidth"),
            (sampling_time, "SamplingTime"),
            (max_receive_time, "MaxReceiveTime"),
        ] {
            check_positive(value, name)?;
        }
        if !(switch_time.is_finite() && switch_time >= 0.) {
            return Err(RadarError::InconsistentParameters(format!(
                "DuplexSwitchTime must be non-negative and finite, got {}",
                switch_time
            )));
        }

        let min_receive_time = switch_time + pulse_width;
        if prt < min_receive_time {
            return Err(RadarError::InconsistentParameters(format!(
                "PRT {} s is shorter than the minimum receive time {} s",
                prt, min_receive_time
            )));
        }
        if max_receive_time < min_receive_time {
            return Err(RadarError::InconsistentParameters(format!(
                "maximum receive time {} s is shorter than the minimum receive time {} s",
                max_receive_time, min_receive_time
            )));
        }
        if max_receive_time > prt - switch_time {
            return Err(RadarError::InconsistentParameters(format!(
                "PRT {} s is shorter than the maximum receive time plus switch time {} s",
                prt,
                max_receive_time + switch_time
            )));
        }
        if sampling_time > pulse_width {
            return Err(RadarError::InconsistentParameters(format!(
                "sampling time {} s exceeds the pulse width {} s",
                sampling_time, pulse_width
            )));
        }

        let adc_mode = self.adc_mode.ok_or(RadarError::MissingParameter("ADCMode"))?;
        let adc_resolution = self
            .adc_resolution
            .ok_or(RadarError::MissingParameter("ADCResolution"))?;
        let adc_min2noise = required(self.adc_min2noise, "ADCMin2Noise")?;

        let params = RadarParameters {
            peak_power,
            frequency,
            pulse_width,
            sampling_time,
            prt,
            max_receive_time,
            bandwidth,
            noise_figure,
            switch_time,
            antenna_gain,
            hor_beamwidth,
            el_beamwidth,
            rotation_speed: self.rotation_speed,
            theta: self.theta(),
            hor_beam_shape: self.hor_beam_shape,
            el_beam_shape: self.el_beam_shape,
            bandpass: self.bandpass,
            adc_mode,
            adc_resolution,
            adc_min2noise,
            adc_max2noise: self.adc_max2noise.unwrap_or(0.),
            wavelength: wavelength(frequency),
            unambiguous_range: SPEED_OF_LIGHT * prt / 2.,
            instrumented_range: SPEED_OF_LIGHT * max_receive_time / 2.,
            min_receive_time,
            min_range: SPEED_OF_LIGHT * min_receive_time / 2.,
            range_bin: SPEED_OF_LIGHT * sampling_time / 2.,
            num_bins: ((max_receive_time - min_receive_time) / sampling_time + BIN_COUNT_SLACK)
                .floor() as usize,
            avg_noise: noise_figure * BOLTZMANN_CONSTANT * NOISE_TEMPERATURE * bandwidth,
            max_sim_receive_time: 2. * MAX_SIM_DISTANCE / SPEED_OF_LIGHT,
        };

        debug!(
            unambiguous_range = params.unambiguous_range,
            min_range = params.min_range,
            range_bin = params.range_bin,
            num_bins = params.num_bins,
            avg_noise = params.avg_noise,
            "Derived radar parameters"
        );

        Ok(params)
    }
}

/// Validated radar parameters in SI units, with the quantities derived from them.
#[derive(Clone, Debug)]
pub struct RadarParameters {
    // W
    pub peak_power: f64,
    // Hz
    pub frequency: f64,
    // s
    pub pulse_width: f64,
    pub sampling_time: f64,
    pub prt: f64,
    pub max_receive_time: f64,
    // Hz
    pub bandwidth: f64,
    // Linear
    pub noise_figure: f64,
    // s
    pub switch_time: f64,
    // Linear
    pub antenna_gain: f64,
    // rad
    pub hor_beamwidth: f64,
    pub el_beamwidth: f64,
    // rad/s
    pub rotation_speed: f64,
    // rad
    pub theta: f64,
    pub hor_beam_shape: BeamShape,
    pub el_beam_shape: BeamShape,
    pub bandpass: BandpassShape,
    pub adc_mode: AdcMode,
    pub adc_resolution: u32,
    pub adc_min2noise: f64,
    pub adc_max2noise: f64,

    // m
    pub wavelength: f64,
    pub unambiguous_range: f64,
    pub instrumented_range: f64,
    // s
    pub min_receive_time: f64,
    // m
    pub min_range: f64,
    pub range_bin: f64,
    pub num_bins: usize,
    // W
    pub avg_noise: f64,
    // s
    pub max_sim_receive_time: f64,
}

impl RadarParameters {
    // Distance to the near edge of range bin n, m
    pub fn range_of_bin(&self, n: usize) -> f64 {
        self.min_range + n as f64 * self.range_bin
    }
}
