use nalgebra::{Matrix3, Matrix4, Vector4};

use super::{Tuple, EPSILON};
use crate::{Error, Result};

/// A 4x4 affine transform.
///
/// Chained builders compose as `new.mult(existing)`, so transforms apply in the order they are
/// written: `M4::identity().rotate_z(a).translate(x, y, z)` rotates first, then translates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct M4(Matrix4<f64>);

impl M4 {
    pub fn identity() -> Self {
        M4(Matrix4::identity())
    }

    /// Build from rows.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        M4(Matrix4::from_fn(|r, c| rows[r][c]))
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }

    pub fn approx_eq(&self, other: &M4) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() < EPSILON)
    }

    /// Matrix product `self * other`. Applied to a point, `other` acts first.
    pub fn mult(&self, other: &M4) -> M4 {
        M4(self.0 * other.0)
    }

    /// Apply to a single point. The homogeneous coordinate is reset to 1 afterwards.
    pub fn mult_point(&self, p: &Tuple) -> Tuple {
        let v = self.0 * Vector4::new(p.x(), p.y(), p.z(), 1.0);
        Tuple::new(v.x, v.y, v.z)
    }

    /// Apply to every point of a list.
    pub fn transform(&self, points: &[Tuple]) -> Vec<Tuple> {
        points.iter().map(|p| self.mult_point(p)).collect()
    }

    pub fn transpose(&self) -> M4 {
        M4(self.0.transpose())
    }

    /// The 3x3 matrix left after removing `row` and `col`.
    pub fn submatrix(&self, row: usize, col: usize) -> Matrix3<f64> {
        let m = self.0.remove_row(row).remove_column(col);
        Matrix3::from_fn(|r, c| m[(r, c)])
    }

    pub fn minor(&self, row: usize, col: usize) -> f64 {
        self.submatrix(row, col).determinant()
    }

    pub fn cofactor(&self, row: usize, col: usize) -> f64 {
        let minor = self.minor(row, col);
        if (row + col) % 2 == 1 {
            -minor
        } else {
            minor
        }
    }

    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    pub fn invertible(&self) -> bool {
        self.determinant() != 0.0
    }

    pub fn inverse(&self) -> Result<M4> {
        self.0.try_inverse().map(M4).ok_or(Error::NonInvertible)
    }

    pub fn translation(x: f64, y: f64, z: f64) -> M4 {
        M4::from_rows([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scaling(x: f64, y: f64, z: f64) -> M4 {
        M4::from_rows([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    // The rotations below are the usual right-handed constructions. Existing designs were laid
    // out against these exact numbers, so the sign stays as it is.

    /// Rotation about the X axis, in radians.
    pub fn rotation_x(radians: f64) -> M4 {
        let (s, c) = radians.sin_cos();
        M4::from_rows([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Y axis, in radians.
    pub fn rotation_y(radians: f64) -> M4 {
        let (s, c) = radians.sin_cos();
        M4::from_rows([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation about the Z axis, in radians. Positive angles turn +X towards +Y.
    pub fn rotation_z(radians: f64) -> M4 {
        let (s, c) = radians.sin_cos();
        M4::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn shearing(xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64) -> M4 {
        M4::from_rows([
            [1.0, xy, xz, 0.0],
            [yx, 1.0, yz, 0.0],
            [zx, zy, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translate(self, x: f64, y: f64, z: f64) -> M4 {
        M4::translation(x, y, z).mult(&self)
    }

    pub fn scale(self, x: f64, y: f64, z: f64) -> M4 {
        M4::scaling(x, y, z).mult(&self)
    }

    pub fn rotate_x(self, radians: f64) -> M4 {
        M4::rotation_x(radians).mult(&self)
    }

    pub fn rotate_y(self, radians: f64) -> M4 {
        M4::rotation_y(radians).mult(&self)
    }

    pub fn rotate_z(self, radians: f64) -> M4 {
        M4::rotation_z(radians).mult(&self)
    }

    pub fn shear(self, xy: f64, xz: f64, yx: f64, yz: f64, zx: f64, zy: f64) -> M4 {
        M4::shearing(xy, xz, yx, yz, zx, zy).mult(&self)
    }
}

impl Default for M4 {
    fn default() -> Self {
        M4::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_translation_transform() {
        let lst = [Tuple::new(0.0, 0.0, 0.0), Tuple::new(1.0, 2.0, 3.0)];
        let got = M4::translation(10.0, 20.0, 30.0).transform(&lst);
        assert!(got[0].approx_eq(&Tuple::new(10.0, 20.0, 30.0)));
        assert!(got[1].approx_eq(&Tuple::new(11.0, 22.0, 33.0)));
    }

    #[test]
    fn test_scaling_and_shearing() {
        let p = Tuple::new(-4.0, 6.0, 8.0);
        assert!(M4::scaling(2.0, 3.0, 4.0)
            .mult_point(&p)
            .approx_eq(&Tuple::new(-8.0, 18.0, 32.0)));
        let p = Tuple::new(2.0, 3.0, 4.0);
        assert!(M4::shearing(1.0, 0.0, 0.0, 0.0, 0.0, 0.0)
            .mult_point(&p)
            .approx_eq(&Tuple::new(5.0, 3.0, 4.0)));
        assert!(M4::shearing(0.0, 0.0, 0.0, 0.0, 0.0, 1.0)
            .mult_point(&p)
            .approx_eq(&Tuple::new(2.0, 3.0, 7.0)));
    }

    #[test]
    fn test_rotations_follow_the_standard_matrices() {
        let q = PI / 2.0;
        assert!(M4::rotation_x(q)
            .mult_point(&Tuple::new(0.0, 1.0, 0.0))
            .approx_eq(&Tuple::new(0.0, 0.0, 1.0)));
        assert!(M4::rotation_y(q)
            .mult_point(&Tuple::new(0.0, 0.0, 1.0))
            .approx_eq(&Tuple::new(1.0, 0.0, 0.0)));
        assert!(M4::rotation_z(q)
            .mult_point(&Tuple::new(1.0, 0.0, 0.0))
            .approx_eq(&Tuple::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_chained_transforms_apply_in_call_order() {
        let p = Tuple::new(1.0, 0.0, 1.0);
        let t = M4::identity()
            .rotate_x(PI / 2.0)
            .scale(5.0, 5.0, 5.0)
            .translate(10.0, 5.0, 7.0);
        assert!(t.mult_point(&p).approx_eq(&Tuple::new(15.0, 0.0, 7.0)));
    }

    #[test]
    fn test_determinant_cofactor_inverse() {
        let m = M4::from_rows([
            [-2.0, -8.0, 3.0, 5.0],
            [-3.0, 1.0, 7.0, 3.0],
            [1.0, 2.0, -9.0, 6.0],
            [-6.0, 7.0, 7.0, -9.0],
        ]);
        assert_relative_eq!(m.cofactor(0, 0), 690.0, epsilon = 1e-9);
        assert_relative_eq!(m.cofactor(0, 1), 447.0, epsilon = 1e-9);
        assert_relative_eq!(m.cofactor(0, 2), 210.0, epsilon = 1e-9);
        assert_relative_eq!(m.cofactor(0, 3), 51.0, epsilon = 1e-9);
        assert_relative_eq!(m.determinant(), -4071.0, epsilon = 1e-9);
        assert!(m.invertible());

        let inv = m.inverse().unwrap();
        assert!(m.mult(&inv).approx_eq(&M4::identity()));
        assert!(inv.transpose().transpose().approx_eq(&inv));
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        let m = M4::scaling(1.0, 0.0, 1.0);
        assert!(!m.invertible());
        assert!(matches!(m.inverse(), Err(Error::NonInvertible)));
    }

    #[test]
    fn test_submatrix_removes_row_and_column() {
        let m = M4::from_rows([
            [-6.0, 1.0, 1.0, 6.0],
            [-8.0, 5.0, 8.0, 6.0],
            [-1.0, 0.0, 8.0, 2.0],
            [-7.0, 1.0, -1.0, 1.0],
        ]);
        let s = m.submatrix(2, 1);
        assert_eq!(
            s,
            Matrix3::new(-6.0, 1.0, 6.0, -8.0, 8.0, 6.0, -7.0, -1.0, 1.0)
        );
        assert_relative_eq!(m.minor(2, 1), s.determinant());
    }
}
