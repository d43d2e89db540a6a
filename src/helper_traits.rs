use nalgebra::Vector3;

use crate::helper::vec_to_deviation;

// A one-way gain defined over directions in the antenna frame.
// Directions behind the antenna have no gain.
pub trait SphericalFunction {
    fn lookup(&self, hor: f64, el: f64) -> f64;
    fn lookup_vec(&self, vec: Vector3<f64>) -> f64 {
        match vec_to_deviation(vec) {
            Some((hor, el)) => self.lookup(hor, el),
            None => 0.,
        }
    }
}

pub trait SphericalFunctionHelper {
    fn lookup_many(&self, items: impl Iterator<Item = Vector3<f64>>) -> Vec<f64>;
}

impl<T: SphericalFunction> SphericalFunctionHelper for T {
    fn lookup_many(&self, items: impl Iterator<Item = Vector3<f64>>) -> Vec<f64> {
        items.map(|x| self.lookup_vec(x)).collect()
    }
}
