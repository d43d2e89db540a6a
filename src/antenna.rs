use nalgebra::Vector3;

use crate::{
    error::RadarResult,
    helper_traits::SphericalFunction,
    signal::{approx::ApproxFunction, SampledDomain},
};

const GAUSSIAN_ENTRIES: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeamShape {
    // Linear falloff from 1 at boresight to 0 at one beamwidth.
    Triangular,
    // Half power at half a beamwidth.
    Gaussian,
}

/// One-way power gain versus deviation from boresight, radians. 1 at boresight.
pub fn beam_pattern(shape: BeamShape, beamwidth: f64) -> RadarResult<ApproxFunction<f64>> {
    match shape {
        BeamShape::Triangular => {
            ApproxFunction::new(vec![-beamwidth, 0., beamwidth], vec![0., 1., 0.])
        }
        BeamShape::Gaussian => {
            let angles = SampledDomain::from_sample_interval(
                -2. * beamwidth,
                4. * beamwidth / (GAUSSIAN_ENTRIES - 1) as f64,
                GAUSSIAN_ENTRIES,
            );
            let k = 4. * 2f64.ln() / (beamwidth * beamwidth);
            let values = angles.iter().map(|t| (-k * t * t).exp()).collect::<Vec<_>>();
            ApproxFunction::new(angles.to_array(), values)
        }
    }
}

// Orientation of a horizontally rotating antenna. Boresight points out of the face,
// x runs along the face to the right and y is up.
#[derive(Clone, Debug, PartialEq)]
pub struct AntennaFrame {
    pub boresight: Vector3<f64>,
    pub x: Vector3<f64>,
    pub y: Vector3<f64>,
}

impl AntennaFrame {
    // theta is measured counterclockwise from east in the horizontal plane.
    pub fn from_theta(theta: f64) -> AntennaFrame {
        let (sin, cos) = theta.sin_cos();
        AntennaFrame {
            boresight: Vector3::new(cos, sin, 0.),
            x: Vector3::new(-sin, cos, 0.),
            y: Vector3::new(0., 0., 1.),
        }
    }

    // World coordinates to antenna frame coordinates, boresight last.
    pub fn to_local(&self, pos: &Vector3<f64>) -> Vector3<f64> {
        Vector3::new(pos.dot(&self.x), pos.dot(&self.y), pos.dot(&self.boresight))
    }
}

/// Separable antenna pattern: horizontal and elevation gains multiply.
#[derive(Clone, Debug)]
pub struct AntennaPattern {
    pub horizontal: ApproxFunction<f64>,
    pub elevation: ApproxFunction<f64>,
}

impl AntennaPattern {
    pub fn new(
        hor_shape: BeamShape,
        hor_beamwidth: f64,
        el_shape: BeamShape,
        el_beamwidth: f64,
    ) -> RadarResult<AntennaPattern> {
        Ok(AntennaPattern {
            horizontal: beam_pattern(hor_shape, hor_beamwidth)?,
            elevation: beam_pattern(el_shape, el_beamwidth)?,
        })
    }

    // One-way gain towards a world position for the given antenna orientation.
    pub fn offset_gain(&self, frame: &AntennaFrame, pos: &Vector3<f64>) -> f64 {
        self.lookup_vec(frame.to_local(pos))
    }
}

impl SphericalFunction for AntennaPattern {
    fn lookup(&self, hor: f64, el: f64) -> f64 {
        self.horizontal.evaluate(hor) * self.elevation.evaluate(el)
    }
}

#[cfg(test)]
mod test {
    use std::f64::consts::{FRAC_PI_2, PI};

    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    use super::{beam_pattern, AntennaFrame, AntennaPattern, BeamShape};
    use crate::{helper::deg_to_rad, helper_traits::SphericalFunctionHelper};

    #[test]
    fn gaussian_half_power() {
        let f = beam_pattern(BeamShape::Gaussian, 2.).unwrap();
        assert_relative_eq!(f.evaluate(0.), 1., epsilon = 1e-3);
        assert_relative_eq!(f.evaluate(1.), 0.5, epsilon = 1e-3);
        assert_relative_eq!(f.evaluate(-1.), 0.5, epsilon = 1e-3);
        assert_relative_eq!(f.evaluate(2.), 0.0625, epsilon = 1e-3);
    }

    #[test]
    fn triangular_falloff() {
        let f = beam_pattern(BeamShape::Triangular, 2.).unwrap();
        assert_relative_eq!(f.evaluate(0.), 1.);
        assert_relative_eq!(f.evaluate(1.), 0.5);
        assert_relative_eq!(f.evaluate(-1.5), 0.25);
        assert_eq!(f.evaluate(2.), 0.);
        assert_eq!(f.evaluate(-3.), 0.);
    }

    #[test]
    fn frame_axes() {
        let north = AntennaFrame::from_theta(FRAC_PI_2);
        assert_relative_eq!(north.boresight, Vector3::new(0., 1., 0.), epsilon = 1e-12);
        assert_relative_eq!(north.x, Vector3::new(-1., 0., 0.), epsilon = 1e-12);

        let local = north.to_local(&Vector3::new(3., 100., 7.));
        assert_relative_eq!(local, Vector3::new(-3., 7., 100.), epsilon = 1e-12);
    }

    #[test]
    fn offset_gain() {
        let pattern = AntennaPattern::new(
            BeamShape::Triangular,
            deg_to_rad(2.),
            BeamShape::Triangular,
            deg_to_rad(20.),
        )
        .unwrap();
        let east = AntennaFrame::from_theta(0.);

        assert_relative_eq!(pattern.offset_gain(&east, &Vector3::new(1000., 0., 0.)), 1.);

        let off = deg_to_rad(1.);
        let pos = Vector3::new(off.cos(), off.sin(), 0.) * 1000.;
        assert_relative_eq!(pattern.offset_gain(&east, &pos), 0.5, epsilon = 1e-9);

        let up = Vector3::new(off.cos(), 0., off.sin()) * 1000.;
        assert_relative_eq!(pattern.offset_gain(&east, &up), 0.95, epsilon = 1e-9);

        let behind = AntennaFrame::from_theta(PI);
        assert_eq!(pattern.offset_gain(&behind, &Vector3::new(1000., 0., 0.)), 0.);

        let gains = pattern.lookup_many(
            [Vector3::new(0., 0., 1.), Vector3::new(0., 0., -1.)].into_iter(),
        );
        assert_eq!(gains, vec![1., 0.]);
    }
}
