use nalgebra::Vector3;

use crate::antenna::AntennaFrame;

// A target return that arrives after the next pulse has already been emitted.
#[derive(Clone, Debug, PartialEq)]
pub struct CarryEntry {
    // Receive time relative to the start of the upcoming pulse, s
    pub time: f64,
    // Boresight received power, already scaled by the transmit gain, W
    pub power: f64,
    // Target position when the pulse hit it, m
    pub pos: Vector3<f64>,
}

/// Variable part of the radar during simulation.
#[derive(Clone, Debug)]
pub struct RadarState {
    // Start of the upcoming pulse, s
    time: f64,
    // Horizontal pointing angle, rad, counterclockwise from east
    theta: f64,
    frame: AntennaFrame,
    carry: Vec<CarryEntry>,
}

impl RadarState {
    pub fn new(time: f64, theta: f64) -> RadarState {
        RadarState {
            time,
            theta,
            frame: AntennaFrame::from_theta(theta),
            carry: Vec::new(),
        }
    }

    pub fn reset(&mut self, time: f64, theta: f64) {
        *self = RadarState::new(time, theta);
    }

    pub fn advance(&mut self, dt: f64, dtheta: f64) {
        self.time += dt;
        self.theta += dtheta;
        self.frame = AntennaFrame::from_theta(self.theta);
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn theta(&self) -> f64 {
        self.theta
    }

    pub fn frame(&self) -> &AntennaFrame {
        &self.frame
    }

    pub fn boresight(&self) -> Vector3<f64> {
        self.frame.boresight
    }

    pub fn push_carry(&mut self, entry: CarryEntry) {
        self.carry.push(entry);
    }

    pub fn carry_len(&self) -> usize {
        self.carry.len()
    }

    /// Moves the carry list one pulse forward. Entries arriving within `prt` are removed
    /// and returned in insertion order, the rest have `prt` subtracted.
    pub fn take_due(&mut self, prt: f64) -> Vec<CarryEntry> {
        let mut due = Vec::new();
        self.carry.retain_mut(|entry| {
            if entry.time < prt {
                due.push(entry.clone());
                false
            } else {
                entry.time -= prt;
                true
            }
        });
        due
    }
}

#[cfg(test)]
mod test {
    use std::f64::consts::FRAC_PI_2;

    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::{CarryEntry, RadarState};

    fn entry(time: f64) -> CarryEntry {
        CarryEntry {
            time,
            power: 1.,
            pos: Vector3::zeros(),
        }
    }

    #[test]
    fn advance_and_reset() {
        let mut state = RadarState::new(0., FRAC_PI_2);
        assert_relative_eq!(state.boresight(), Vector3::new(0., 1., 0.), epsilon = 1e-12);

        state.advance(1e-3, -FRAC_PI_2);
        assert_relative_eq!(state.time(), 1e-3);
        assert_relative_eq!(state.theta(), 0.);
        assert_relative_eq!(state.boresight(), Vector3::new(1., 0., 0.));
        assert_relative_eq!(state.frame().x, Vector3::new(0., 1., 0.));

        state.push_carry(entry(0.));
        state.reset(5., FRAC_PI_2);
        assert_eq!(state.time(), 5.);
        assert_eq!(state.carry_len(), 0);
    }

    #[test]
    fn carry_walk() {
        let prt = 1e-3;
        let mut state = RadarState::new(0., 0.);
        state.push_carry(entry(0.5e-3));
        state.push_carry(entry(1.5e-3));
        state.push_carry(entry(1e-3));

        let due = state.take_due(prt);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].time, 0.5e-3);
        assert_eq!(state.carry_len(), 2);

        let due = state.take_due(prt);
        assert_eq!(due.len(), 2);
        assert_relative_eq!(due[0].time, 0.5e-3, epsilon = 1e-15);
        assert_relative_eq!(due[1].time, 0., epsilon = 1e-15);
        assert_eq!(state.carry_len(), 0);
    }
}
