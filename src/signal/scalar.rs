use std::ops::{Add, Mul};

/// Values that can be stored in an [`ApproxFunction`](super::approx::ApproxFunction) table.
///
/// Linear interpolation only needs a weighted sum, so anything that can be added to
/// itself and scaled by a real weight qualifies: `f64`, `Complex64` and `Vector3<f64>`
/// are the ones the simulator uses.
pub trait Interpolant: Copy + Add<Self, Output = Self> + Mul<f64, Output = Self> {}

impl<T> Interpolant for T where T: Copy + Add<T, Output = T> + Mul<f64, Output = T> {}

#[cfg(test)]
mod test {
    use nalgebra::Vector3;
    use num::complex::Complex64;

    use super::Interpolant;

    fn midpoint<T: Interpolant>(a: T, b: T) -> T {
        a * 0.5 + b * 0.5
    }

    #[test]
    fn supported_value_types() {
        assert_eq!(midpoint(1.0, 3.0), 2.0);
        assert_eq!(
            midpoint(Complex64::new(0., 2.), Complex64::new(2., 0.)),
            Complex64::new(1., 1.)
        );
        assert_eq!(
            midpoint(Vector3::new(0., 0., 4.), Vector3::new(2., 2., 0.)),
            Vector3::new(1., 1., 2.)
        );
    }
}
