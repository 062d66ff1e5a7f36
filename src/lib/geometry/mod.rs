//! Points, vectors and affine transforms.

mod matrix;
mod tuple;

pub use matrix::M4;
pub use tuple::{path, reverse, Tuple};

/// Tolerance used for all geometric equality tests.
pub const EPSILON: f64 = 1e-8;

pub fn to_rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

pub fn to_deg(radians: f64) -> f64 {
    radians.to_degrees()
}

/// 2D cross product of the XY parts of two vectors, divided by their XY lengths.
/// This is the sine of the turn from `v1` to `v2`, positive for a left (counter-clockwise) turn.
pub fn turn_sine(v1: &Tuple, v2: &Tuple) -> f64 {
    let l = length_xy(v1) * length_xy(v2);
    if l == 0.0 {
        return 0.0;
    }
    (v1.x() * v2.y() - v1.y() * v2.x()) / l
}

pub fn length_xy(v: &Tuple) -> f64 {
    v.x().hypot(v.y())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_turn_sine_sign() {
        let east = Tuple::xy(1.0, 0.0);
        let north = Tuple::xy(0.0, 2.0);
        assert_relative_eq!(turn_sine(&east, &north), 1.0);
        assert_relative_eq!(turn_sine(&north, &east), -1.0);
        assert_relative_eq!(turn_sine(&east, &Tuple::xy(-3.0, 0.0)), 0.0);
        assert_eq!(turn_sine(&east, &Tuple::zero()), 0.0);
    }

    #[test]
    fn test_length_xy_ignores_z() {
        assert_relative_eq!(length_xy(&Tuple::new(3.0, 4.0, 100.0)), 5.0);
    }
}
