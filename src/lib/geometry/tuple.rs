use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use nalgebra::Vector3;

use super::EPSILON;
use crate::{Error, Result};

/// A 3D value used both as an absolute position and as a displacement.
///
/// Equality for geometric purposes is [`Tuple::approx_eq`]; `PartialEq` is exact.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tuple(Vector3<f64>);

impl Tuple {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Tuple(Vector3::new(x, y, z))
    }

    /// A point in the XY plane at Z=0.
    pub fn xy(x: f64, y: f64) -> Self {
        Tuple::new(x, y, 0.0)
    }

    pub fn zero() -> Self {
        Tuple(Vector3::zeros())
    }

    pub fn x(&self) -> f64 {
        self.0.x
    }

    pub fn y(&self) -> f64 {
        self.0.y
    }

    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Component by axis index: 0 = X, 1 = Y, anything else = Z.
    pub fn get(&self, axis: usize) -> f64 {
        match axis {
            0 => self.0.x,
            1 => self.0.y,
            _ => self.0.z,
        }
    }

    pub fn with_z(self, z: f64) -> Self {
        Tuple::new(self.x(), self.y(), z)
    }

    /// The same value projected onto the XY plane.
    pub fn flat(self) -> Self {
        self.with_z(0.0)
    }

    pub fn magnitude(&self) -> f64 {
        self.0.norm()
    }

    /// Unit vector in the same direction. Zero (or nearly zero) vectors have no direction.
    pub fn normalize(&self) -> Result<Tuple> {
        self.0
            .try_normalize(EPSILON)
            .map(Tuple)
            .ok_or(Error::DegenerateVector)
    }

    pub fn dot(&self, other: &Tuple) -> f64 {
        self.0.dot(&other.0)
    }

    pub fn cross(&self, other: &Tuple) -> Tuple {
        Tuple(self.0.cross(&other.0))
    }

    /// Reflect around a (unit) normal vector.
    pub fn reflect(&self, normal: &Tuple) -> Tuple {
        *self - *normal * (2.0 * self.dot(normal))
    }

    /// Component-wise comparison of X, Y and Z within [`EPSILON`].
    pub fn approx_eq(&self, other: &Tuple) -> bool {
        (self.x() - other.x()).abs() < EPSILON
            && (self.y() - other.y()).abs() < EPSILON
            && (self.z() - other.z()).abs() < EPSILON
    }

    /// Like [`Tuple::approx_eq`], ignoring Z.
    pub fn approx_eq_xy(&self, other: &Tuple) -> bool {
        (self.x() - other.x()).abs() < EPSILON && (self.y() - other.y()).abs() < EPSILON
    }

    /// Translate every point by this vector.
    pub fn offset_all(&self, points: &[Tuple]) -> Vec<Tuple> {
        points.iter().map(|p| *p + *self).collect()
    }
}

impl Default for Tuple {
    fn default() -> Self {
        Tuple::zero()
    }
}

/// A reversed copy of a list of points.
pub fn reverse(points: &[Tuple]) -> Vec<Tuple> {
    points.iter().rev().copied().collect()
}

impl Add for Tuple {
    type Output = Tuple;

    fn add(self, rhs: Tuple) -> Tuple {
        Tuple(self.0 + rhs.0)
    }
}

impl Sub for Tuple {
    type Output = Tuple;

    fn sub(self, rhs: Tuple) -> Tuple {
        Tuple(self.0 - rhs.0)
    }
}

impl Neg for Tuple {
    type Output = Tuple;

    fn neg(self) -> Tuple {
        Tuple(-self.0)
    }
}

impl Mul<f64> for Tuple {
    type Output = Tuple;

    fn mul(self, rhs: f64) -> Tuple {
        Tuple(self.0 * rhs)
    }
}

impl Div<f64> for Tuple {
    type Output = Tuple;

    fn div(self, rhs: f64) -> Tuple {
        Tuple(self.0 / rhs)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.x(), self.y(), self.z())
    }
}

/// Parse a path written in shorthand.
///
/// Each entry is `"x, y, z"`. Empty or `-` fields keep the value of the previous entry, so only
/// the coordinates that change need to be written. The first entry starts from the origin.
///
/// ```
/// let p = gcode::geometry::path(&["10, 0, -1", "15", "-, 5"]).unwrap();
/// assert_eq!(p[2], gcode::geometry::Tuple::new(15.0, 5.0, -1.0));
/// ```
pub fn path(entries: &[&str]) -> Result<Vec<Tuple>> {
    let mut last = [0.0; 3];
    let mut result = Vec::with_capacity(entries.len());
    for entry in entries {
        let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
        if fields.len() > 3 {
            return Err(Error::PathSyntax {
                entry: entry.to_string(),
                reason: "too many fields".to_string(),
            });
        }
        for (i, field) in fields.iter().enumerate() {
            if field.is_empty() || *field == "-" {
                continue;
            }
            last[i] = field.parse::<f64>().map_err(|e| Error::PathSyntax {
                entry: entry.to_string(),
                reason: e.to_string(),
            })?;
        }
        result.push(Tuple::new(last[0], last[1], last[2]));
    }
    Ok(result)
}
