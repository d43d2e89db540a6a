use nalgebra::Vector3;

use crate::{error::RadarResult, signal::approx::ApproxFunction};

// Point target with a constant radar cross section, relative to the antenna.
#[derive(Clone, Debug)]
pub struct Target {
    // Position over time, m
    pub path: ApproxFunction<Vector3<f64>>,
    // m²
    pub rcs: f64,
}

impl Target {
    pub fn new(path: ApproxFunction<Vector3<f64>>, rcs: f64) -> Target {
        Target { path, rcs }
    }

    pub fn stationary(pos: Vector3<f64>, rcs: f64) -> Target {
        Target::new(ApproxFunction::constant(pos), rcs)
    }

    // Constant velocity from `start` over `[0, duration]`, resting at the end point afterwards.
    pub fn linear(start: Vector3<f64>, vel: Vector3<f64>, duration: f64, rcs: f64) -> RadarResult<Target> {
        let path = ApproxFunction::new(vec![0., duration], vec![start, dead_reckon(start, vel, duration)])?;
        Ok(Target::new(path, rcs))
    }

    pub fn position(&self, t: f64) -> Vector3<f64> {
        self.path.evaluate(t)
    }

    pub fn set_position(&mut self, pos: Vector3<f64>) {
        self.path = ApproxFunction::constant(pos);
    }
}

// Integrate the equations of motion to get the target position after a timestep dt.
pub fn dead_reckon(mut pos: Vector3<f64>, vel: Vector3<f64>, dt: f64) -> Vector3<f64> {
    pos += dt * vel;
    pos
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::Target;

    #[test]
    fn stationary_target() {
        let mut target = Target::stationary(Vector3::new(1000., 0., 0.), 50.);
        assert_eq!(target.position(0.), Vector3::new(1000., 0., 0.));
        assert_eq!(target.position(1e6), Vector3::new(1000., 0., 0.));

        target.set_position(Vector3::new(0., 5., 0.));
        assert_eq!(target.position(3.), Vector3::new(0., 5., 0.));
        assert_eq!(target.rcs, 50.);
    }

    #[test]
    fn linear_target() {
        let target = Target::linear(
            Vector3::new(1000., 0., 0.),
            Vector3::new(-10., 20., 0.),
            10.,
            1.,
        )
        .unwrap();
        assert_relative_eq!(target.position(-1.), Vector3::new(1000., 0., 0.));
        assert_relative_eq!(target.position(5.), Vector3::new(950., 100., 0.), epsilon = 1e-9);
        assert_relative_eq!(target.position(20.), Vector3::new(900., 200., 0.), epsilon = 1e-9);

        assert!(Target::linear(Vector3::zeros(), Vector3::zeros(), 0., 1.).is_err());
    }
}
