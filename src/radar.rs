use std::f64::consts::PI;

use nalgebra::Vector3;
use ndarray::Array1;
use num::complex::Complex64;
use tracing::{debug, trace};

use crate::{
    antenna::AntennaPattern,
    error::RadarResult,
    helper::exponential_power,
    pulse::PulseData,
    rng::{RandomSource, SeededSource},
    scene::Target,
    signal::{approx::ApproxFunction, filtered_pulse, rectangular_pulse},
};

use self::{
    adc::Adc,
    bandpass::bandpass_filter,
    config::{RadarConfig, RadarParameters},
    state::{CarryEntry, RadarState},
};

pub mod adc;
pub mod bandpass;
pub mod config;
pub mod parser;
pub mod state;

const c: f64 = 3e8;

pub const SPEED_OF_LIGHT: f64 = c;
pub const BOLTZMANN_CONSTANT: f64 = 1.38e-23; // J/K
pub const NOISE_TEMPERATURE: f64 = 300.0; // K
// Returns from further away are never simulated, m
pub const MAX_SIM_DISTANCE: f64 = 150_000.0;

// Range bins a return is spread over, relative to the bin it lands in.
const BINS_BEFORE: isize = 3;
const BINS_AFTER: isize = 4;

pub fn range_equation(power_xmtd: f64, range: f64, gain: f64, signature: f64, wavelength: f64) -> f64 {
    let effective_aperture = gain * wavelength.powi(2) / (4. * PI);
    let density_at_tgt = power_xmtd * gain / (4. * PI * range * range);
    let reflected_power = signature * density_at_tgt;
    let density_at_rcvr = reflected_power / (4. * PI * range * range);

    effective_aperture * density_at_rcvr
}

/// Switches for the parts of the received signal that get simulated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationFlags {
    pub add_noise: bool,
    // Stored and reported. No clutter model exists.
    pub add_clutter: bool,
    pub add_target: bool,
    // Draw noise power from its distribution rather than using the mean
    pub use_pdf: bool,
    pub use_filtered_pulse: bool,
}

impl Default for SimulationFlags {
    fn default() -> Self {
        SimulationFlags {
            add_noise: true,
            add_clutter: true,
            add_target: true,
            use_pdf: true,
            use_filtered_pulse: true,
        }
    }
}

/// Pulsed radar signal engine. Every call to [`Radar::generate`] produces the digitized
/// return of one pulse and advances the antenna by one PRT.
pub struct Radar {
    params: RadarParameters,
    adc: Adc,
    antenna: AntennaPattern,
    // Complex response vs baseband frequency, Hz
    bandpass: ApproxFunction<Complex64>,
    emitted_pulse: ApproxFunction<f64>,
    filtered_pulse: ApproxFunction<f64>,
    flags: SimulationFlags,
    state: RadarState,
    rng: Box<dyn RandomSource>,
}

// Adds a return of the given power arriving rt seconds after the pulse started.
fn inject(
    signal: &mut Array1<Complex64>,
    params: &RadarParameters,
    pulse: &ApproxFunction<f64>,
    rng: &mut dyn RandomSource,
    rt: f64,
    power: f64,
) {
    let amplitude = power.sqrt();
    let center = ((rt - params.min_receive_time) / params.sampling_time).floor() as isize;

    for n in (center - BINS_BEFORE)..=(center + BINS_AFTER) {
        if n < 0 || n as usize >= signal.len() {
            continue;
        }
        let phase = 2. * PI * rng.uniform();
        let offset = params.min_receive_time + n as f64 * params.sampling_time - rt;
        signal[n as usize] += Complex64::from_polar(amplitude * pulse.evaluate(offset), phase);
    }
}

impl Radar {
    pub fn new(config: &RadarConfig) -> RadarResult<Radar> {
        Radar::from_parameters(config.validate()?)
    }

    pub fn from_parameters(params: RadarParameters) -> RadarResult<Radar> {
        let adc = Adc::new(
            params.adc_resolution,
            params.adc_mode,
            params.adc_min2noise * params.avg_noise,
            params.adc_max2noise * params.avg_noise,
        )?;
        let antenna = AntennaPattern::new(
            params.hor_beam_shape,
            params.hor_beamwidth,
            params.el_beam_shape,
            params.el_beamwidth,
        )?;
        let bandpass = bandpass_filter(params.bandpass, params.bandwidth)?;
        let emitted_pulse = rectangular_pulse(params.pulse_width)?;
        let filtered_pulse = filtered_pulse(&emitted_pulse, &bandpass, params.pulse_width)?;
        let state = RadarState::new(0., params.theta);

        debug!(
            num_bins = params.num_bins,
            adc_levels = adc.levels(),
            peak_filtered = filtered_pulse.values().fold(0., |a: f64, b| a.max(*b)),
            "Radar ready"
        );

        Ok(Radar {
            params,
            adc,
            antenna,
            bandpass,
            emitted_pulse,
            filtered_pulse,
            flags: SimulationFlags::default(),
            state,
            rng: Box::new(SeededSource::default()),
        })
    }

    /// Synthesizes the next pulse. With `override_power` every target returns that
    /// boresight power instead of the radar equation result.
    pub fn generate(&mut self, targets: &[Target], override_power: Option<f64>) -> PulseData {
        let params = &self.params;
        let prt = params.prt;
        let pulse = if self.flags.use_filtered_pulse {
            &self.filtered_pulse
        } else {
            &self.emitted_pulse
        };
        let mut signal = Array1::from_elem(params.num_bins, Complex64::new(0., 0.));

        if self.flags.add_target {
            for entry in self.state.take_due(prt) {
                let gain = self.antenna.offset_gain(self.state.frame(), &entry.pos);
                inject(&mut signal, params, pulse, self.rng.as_mut(), entry.time, entry.power * gain);
            }

            for target in targets {
                let pos = target.position(self.state.time());
                let range = pos.magnitude();
                let boresight_power = override_power.unwrap_or_else(|| {
                    range_equation(
                        params.peak_power,
                        range,
                        params.antenna_gain,
                        target.rcs,
                        params.wavelength,
                    )
                });
                let gain = self.antenna.offset_gain(self.state.frame(), &pos);
                let power = gain * boresight_power;
                let rt = 2. * range / SPEED_OF_LIGHT;

                if rt >= prt {
                    // Only later pulses are limited to the simulated horizon
                    if rt <= params.max_sim_receive_time {
                        self.state.push_carry(CarryEntry { time: rt - prt, power, pos });
                    } else {
                        trace!(range, "Dropping return beyond the simulated range");
                    }
                } else {
                    // Gain applies again on receive
                    inject(&mut signal, params, pulse, self.rng.as_mut(), rt, power * gain);
                }
            }
        }

        let mut registry = Array1::<u16>::zeros(params.num_bins);
        for (level, value) in registry.iter_mut().zip(signal.iter_mut()) {
            if self.flags.add_noise {
                let noise = if self.flags.use_pdf {
                    exponential_power(params.avg_noise, self.rng.uniform())
                } else {
                    params.avg_noise
                };
                value.re += noise.sqrt();
            }
            *level = self.adc.convert(value.norm());
        }

        let data = PulseData::new(self.state.time(), self.state.boresight(), registry);
        self.state.advance(prt, prt * params.rotation_speed);
        data
    }

    // Back to time t, pointing at the initial angle, with nothing in flight.
    pub fn reset(&mut self, t: f64) {
        self.state.reset(t, self.params.theta);
    }

    pub fn set_random_source(&mut self, rng: impl RandomSource + 'static) {
        self.rng = Box::new(rng);
    }

    pub fn flags(&self) -> SimulationFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: SimulationFlags) {
        self.flags = flags;
    }

    pub fn add_noise(&self) -> bool {
        self.flags.add_noise
    }

    pub fn set_add_noise(&mut self, on: bool) {
        self.flags.add_noise = on;
    }

    pub fn add_clutter(&self) -> bool {
        self.flags.add_clutter
    }

    pub fn set_add_clutter(&mut self, on: bool) {
        self.flags.add_clutter = on;
    }

    pub fn add_target(&self) -> bool {
        self.flags.add_target
    }

    pub fn set_add_target(&mut self, on: bool) {
        self.flags.add_target = on;
    }

    pub fn use_pdf(&self) -> bool {
        self.flags.use_pdf
    }

    pub fn set_use_pdf(&mut self, on: bool) {
        self.flags.use_pdf = on;
    }

    pub fn use_filtered_pulse(&self) -> bool {
        self.flags.use_filtered_pulse
    }

    pub fn set_use_filtered_pulse(&mut self, on: bool) {
        self.flags.use_filtered_pulse = on;
    }

    // rad/s, positive counterclockwise
    pub fn rotation_speed(&self) -> f64 {
        self.params.rotation_speed
    }

    pub fn set_rotation_speed(&mut self, speed: f64) {
        self.params.rotation_speed = speed;
    }

    // Angle the antenna returns to on reset, rad
    pub fn initial_theta(&self) -> f64 {
        self.params.theta
    }

    pub fn set_initial_theta(&mut self, theta: f64) {
        self.params.theta = theta;
    }

    pub fn time(&self) -> f64 {
        self.state.time()
    }

    pub fn theta(&self) -> f64 {
        self.state.theta()
    }

    pub fn boresight(&self) -> Vector3<f64> {
        self.state.boresight()
    }

    pub fn carry_len(&self) -> usize {
        self.state.carry_len()
    }

    pub(crate) fn state(&self) -> &RadarState {
        &self.state
    }

    pub(crate) fn restore_state(&mut self, state: RadarState) {
        self.state = state;
    }

    pub fn range_of_bin(&self, n: usize) -> f64 {
        self.params.range_of_bin(n)
    }

    pub fn parameters(&self) -> &RadarParameters {
        &self.params
    }

    pub fn adc(&self) -> &Adc {
        &self.adc
    }

    pub fn antenna(&self) -> &AntennaPattern {
        &self.antenna
    }

    pub fn bandpass(&self) -> &ApproxFunction<Complex64> {
        &self.bandpass
    }

    pub fn emitted_pulse(&self) -> &ApproxFunction<f64> {
        &self.emitted_pulse
    }

    pub fn filtered_pulse(&self) -> &ApproxFunction<f64> {
        &self.filtered_pulse
    }

    pub fn horizontal_beam(&self) -> &ApproxFunction<f64> {
        &self.antenna.horizontal
    }

    pub fn elevation_beam(&self) -> &ApproxFunction<f64> {
        &self.antenna.elevation
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::{config::test_configs, range_equation, Radar};
    use crate::{
        antenna::BeamShape,
        helper::deg_to_rad,
        radar::config::RadarConfig,
        rng::FixedSource,
        scene::Target,
    };

    const BIN: usize = 253;

    fn quiet_radar(config: &RadarConfig) -> Radar {
        let mut radar = Radar::new(config).unwrap();
        radar.set_add_noise(false);
        radar.set_add_clutter(false);
        radar
    }

    fn triangular(mut config: RadarConfig) -> RadarConfig {
        config.set_hor_beam_shape(BeamShape::Triangular);
        config.set_el_beam_shape(BeamShape::Triangular);
        config
    }

    // Distance putting a return on the leading edge of bin 253. The unfiltered pulse,
    // two samples long, then fills bins 253 and 254.
    fn bin_distance(radar: &Radar) -> f64 {
        radar.range_of_bin(BIN) - 0.5 * radar.parameters().range_bin
    }

    fn assert_level(actual: u16, expected: u16, tolerance: u16) {
        assert!(
            (actual as i32 - expected as i32).abs() <= tolerance as i32,
            "level {} not within {} of {}",
            actual,
            tolerance,
            expected
        );
    }

    #[test]
    fn radar_equation_level() {
        let mut config = test_configs::short_range();
        config.set_adc_min2noise(1.);
        let mut radar = quiet_radar(&config);
        radar.set_use_filtered_pulse(false);

        let distance = bin_distance(&radar);
        let rcs = 50.;
        let params = radar.parameters().clone();
        let received = range_equation(params.peak_power, distance, params.antenna_gain, rcs, params.wavelength);
        let expected =
            params.peak_power * params.antenna_gain.powi(2) * rcs * params.wavelength.powi(2)
                / ((4. * std::f64::consts::PI).powi(3) * distance.powi(4));
        assert_relative_eq!(received, expected, max_relative = 1e-12);

        let target = Target::stationary(Vector3::new(distance, 0., 0.), rcs);
        let pulse = radar.generate(&[target], None);
        let measurement = radar.adc().convert(received.sqrt());
        assert!(measurement > 900);
        assert_level(pulse.registry[BIN], measurement, 1);
        assert_level(pulse.registry[BIN + 1], measurement, 1);
        assert_eq!(pulse.registry[BIN - 1], 0);
        assert_eq!(pulse.registry[BIN + 2], 0);
    }

    #[test]
    fn beam_falloff() {
        let config = triangular(test_configs::short_range());
        let mut radar = quiet_radar(&config);
        radar.set_use_filtered_pulse(false);
        let distance = bin_distance(&radar);
        let power = 40. * radar.parameters().avg_noise;

        let mut level_at = |deg: f64| {
            let angle = deg_to_rad(deg);
            let pos = Vector3::new(angle.cos(), angle.sin(), 0.) * distance;
            radar.generate(&[Target::stationary(pos, 1.)], Some(power)).registry[BIN]
        };

        // Two-way gain: 1/4 at half the beamwidth, nothing at the full beamwidth
        assert_level(level_at(0.), 8000, 1);
        assert_level(level_at(1.), 2000, 1);
        assert_level(level_at(-1.), 2000, 1);
        assert_eq!(level_at(2.), 0);
        assert_eq!(level_at(180.), 0);
    }

    #[test]
    fn rotating_antenna() {
        let mut config = triangular(test_configs::short_range());
        // 1° clockwise every ten pulses
        config.set_rotation_speed(1. / (10. * 0.2e-3));
        let mut radar = quiet_radar(&config);
        radar.set_use_filtered_pulse(false);
        let distance = bin_distance(&radar);
        let power = 40. * radar.parameters().avg_noise;

        let angle = deg_to_rad(-1.);
        let target = Target::stationary(Vector3::new(angle.cos(), angle.sin(), 0.) * distance, 1.);

        let levels = (0..=10)
            .map(|_| radar.generate(&[target.clone()], Some(power)).registry[BIN])
            .collect::<Vec<_>>();
        assert_level(levels[0], 2000, 1);
        assert_level(levels[5], 4500, 2);
        assert_level(levels[10], 8000, 2);

        assert_relative_eq!(radar.time(), 11. * 0.2e-3, max_relative = 1e-9);
        assert_relative_eq!(radar.theta(), deg_to_rad(-1.1), max_relative = 1e-9);
        let theta = radar.theta();
        assert_relative_eq!(radar.boresight(), Vector3::new(theta.cos(), theta.sin(), 0.));
    }

    #[test]
    fn unambiguous_range_carry_over() {
        let config = test_configs::short_range();
        let mut radar = quiet_radar(&config);
        let params = radar.parameters().clone();
        let distance = 2. * params.unambiguous_range + bin_distance(&radar);
        let target = Target::stationary(Vector3::new(distance, 0., 0.), 1.);
        let power = Some(40. * params.avg_noise);

        let first = radar.generate(&[target.clone()], power);
        assert!(first.registry.iter().all(|x| *x == 0));
        assert_eq!(radar.carry_len(), 1);

        let second = radar.generate(&[target.clone()], power);
        assert!(second.registry.iter().all(|x| *x == 0));
        assert_eq!(radar.carry_len(), 2);

        let third = radar.generate(&[target], power);
        assert!(third.registry[BIN] > 0);
        assert!(third.registry[BIN + 1] > 0);
        assert_eq!(radar.carry_len(), 2);

        // Returns still in flight arrive after the target is gone
        let fourth = radar.generate(&[], power);
        assert!(fourth.registry[BIN] > 0);
        assert_eq!(radar.carry_len(), 1);
        radar.generate(&[], power);
        assert_eq!(radar.carry_len(), 0);
        assert!(radar.generate(&[], power).registry.iter().all(|x| *x == 0));
    }

    #[test]
    fn beyond_horizon_dropped() {
        let mut radar = quiet_radar(&test_configs::short_range());
        let target = Target::stationary(Vector3::new(150_100., 0., 0.), 1.);
        let pulse = radar.generate(&[target], Some(1.));
        assert_eq!(radar.carry_len(), 0);
        assert!(pulse.registry.iter().all(|x| *x == 0));
    }

    #[test]
    fn long_prt_returns_past_horizon() {
        const FAR_BIN: usize = 10660;
        let mut radar = quiet_radar(&test_configs::long_prt());
        radar.set_use_filtered_pulse(false);
        let params = radar.parameters().clone();
        assert_eq!(params.num_bins, 15990);
        let power = Some(40. * params.avg_noise);

        // 200 km arrives within the PRT, so it shows up although it is past 150 km
        let distance = radar.range_of_bin(FAR_BIN) - 0.5 * params.range_bin;
        assert!(2. * distance / super::SPEED_OF_LIGHT > params.max_sim_receive_time);
        let pulse = radar.generate(&[Target::stationary(Vector3::new(distance, 0., 0.), 1.)], power);
        assert_level(pulse.registry[FAR_BIN], 8000, 1);
        assert_level(pulse.registry[FAR_BIN + 1], 8000, 1);
        assert_eq!(radar.carry_len(), 0);

        // Past the unambiguous range it would have to be carried, which the horizon forbids
        let beyond = params.unambiguous_range + 10_000.;
        let pulse = radar.generate(&[Target::stationary(Vector3::new(beyond, 0., 0.), 1.)], power);
        assert!(pulse.registry.iter().all(|x| *x == 0));
        assert_eq!(radar.carry_len(), 0);
        assert!(radar.generate(&[], power).registry.iter().all(|x| *x == 0));
    }

    #[test]
    fn targets_disabled() {
        let mut radar = quiet_radar(&test_configs::short_range());
        radar.set_add_target(false);
        let distance = bin_distance(&radar);
        let target = Target::stationary(Vector3::new(distance, 0., 0.), 1.);
        let pulse = radar.generate(&[target], Some(1.));
        assert!(pulse.registry.iter().all(|x| *x == 0));
    }

    #[test]
    fn noise_cancelled_by_antiphase_return() {
        let config = triangular(test_configs::short_range());
        let mut radar = Radar::new(&config).unwrap();
        radar.set_use_filtered_pulse(false);
        radar.set_use_pdf(false);
        // Every phase is π, so the return is -√P on I while the noise is +√N
        radar.set_random_source(FixedSource(0.5));

        let avg = radar.parameters().avg_noise;
        let target = Target::stationary(Vector3::new(bin_distance(&radar), 0., 0.), 1.);
        let pulse = radar.generate(&[target], Some(avg));

        let noise_level = radar.adc().convert(avg.sqrt());
        assert_level(noise_level, 200, 1);
        assert_eq!(pulse.registry[BIN], 0);
        assert_eq!(pulse.registry[BIN + 1], 0);
        for (n, level) in pulse.registry.iter().enumerate() {
            if n != BIN && n != BIN + 1 {
                assert_eq!(*level, noise_level);
            }
        }
    }

    #[test]
    fn coherent_sum_of_ambiguous_targets() {
        let config = triangular(test_configs::short_range());
        let mut radar = quiet_radar(&config);
        radar.set_use_filtered_pulse(false);
        radar.set_random_source(FixedSource(0.));

        let params = radar.parameters().clone();
        let near = bin_distance(&radar);
        let targets = [
            Target::stationary(Vector3::new(near, 0., 0.), 1.),
            Target::stationary(Vector3::new(near + params.unambiguous_range, 0., 0.), 1.),
        ];
        let power = Some(2. * params.avg_noise);

        let first = radar.generate(&targets, power);
        assert_level(first.registry[BIN], 400, 1);

        // The far return from pulse 0 lands on top of the near return of pulse 1
        let second = radar.generate(&targets, power);
        assert_level(second.registry[BIN], 1600, 2);
    }

    #[test]
    fn state_advance_and_reset() {
        let mut radar = quiet_radar(&test_configs::short_range());
        let prt = radar.parameters().prt;
        assert_eq!(radar.time(), 0.);
        assert_relative_eq!(radar.boresight(), Vector3::new(1., 0., 0.));

        let first = radar.generate(&[], None);
        let second = radar.generate(&[], None);
        assert_eq!(first.start_time, 0.);
        assert_relative_eq!(second.start_time, prt);
        assert_eq!(first.num_bins(), 994);
        assert_relative_eq!(radar.time(), 2. * prt);

        radar.set_initial_theta(0.5);
        radar.reset(3.);
        assert_eq!(radar.time(), 3.);
        assert_eq!(radar.theta(), 0.5);
        assert_eq!(radar.carry_len(), 0);
    }

    #[test]
    fn noise_floor() {
        let mut radar = Radar::new(&test_configs::short_range()).unwrap();
        radar.set_add_target(false);

        // Mean noise power sits at 1 / 0.005 = 200 levels
        let mut total = 0.;
        let mut count = 0.;
        for _ in 0..20 {
            for level in radar.generate(&[], None).registry.iter() {
                total += *level as f64;
                count += 1.;
            }
        }
        assert_relative_eq!(total / count, 200., max_relative = 0.05);
    }

    #[test]
    fn filtered_pulse_shape() {
        let radar = Radar::new(&test_configs::short_range()).unwrap();
        let pw = radar.parameters().pulse_width;
        let filtered = radar.filtered_pulse();
        assert_relative_eq!(filtered.evaluate(0.), 0.56, epsilon = 5e-2);
        assert_relative_eq!(filtered.evaluate(pw), 0.56, epsilon = 5e-2);
        assert_eq!(radar.emitted_pulse().evaluate(0.5 * pw), 1.);
        assert_relative_eq!(radar.horizontal_beam().evaluate(deg_to_rad(1.)), 0.5, epsilon = 1e-3);
        assert_relative_eq!(radar.elevation_beam().evaluate(deg_to_rad(10.)), 0.5, epsilon = 1e-3);
        assert_relative_eq!(radar.bandpass().evaluate(0.).re, 1.);
    }
}
