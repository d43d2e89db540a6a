use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

use crate::radar::SPEED_OF_LIGHT;

// Given a vector in the antenna frame (x right, y up, z along boresight), compute the
// horizontal and elevation deviation from boresight. None if the vector is not in front.
pub fn vec_to_deviation(vec: Vector3<f64>) -> Option<(f64, f64)> {
    let (x, y, z) = (vec[0], vec[1], vec[2]);
    if z <= 0. {
        return None;
    }

    let hor = (z / x.hypot(z)).clamp(-1., 1.).acos();
    let el = (z / y.hypot(z)).clamp(-1., 1.).acos();
    Some((hor, el))
}

pub fn wavelength(f: f64) -> f64 {
    SPEED_OF_LIGHT / f
}

pub fn decibels(x: f64) -> f64 {
    10. * x.log10()
}

pub fn from_decibels(x: f64) -> f64 {
    10f64.powf(0.1 * x)
}

pub fn deg_to_rad(x: f64) -> f64 {
    x * PI / 180.
}

// Wraps an angle into [0, 2π)
pub fn wrap_angle(theta: f64) -> f64 {
    let wrapped = theta.rem_euclid(TAU);
    if wrapped >= TAU {
        0.
    } else {
        wrapped
    }
}

// Inverse CDF of the exponential distribution: the power of a Rayleigh distributed
// amplitude with the given mean power, for a uniform draw u in [0, 1).
pub fn exponential_power(mean: f64, u: f64) -> f64 {
    -mean * (1. - u).ln()
}
