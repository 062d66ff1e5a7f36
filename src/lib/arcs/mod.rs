//! Arcs and circles approximated by straight line segments.
//!
//! All functions work relative to the current position: the returned list starts with the origin
//! and ends exactly on the requested end point (or back at the start, for circles, at the helical
//! depth). Non-XY planes are handled by rotating the axes into XY and back.

use std::f64::consts::PI;

use crate::geometry::{Tuple, EPSILON};
use crate::motion::Plane;
use crate::{Error, Result};

/// Resolution and shape options for the vectorizers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArcOptions {
    /// Extra full revolutions.
    pub turns: u32,
    /// Longest allowed chord.
    pub max_l: f64,
    /// Largest allowed angular step, in degrees.
    pub max_a: f64,
    pub plane: Plane,
}

impl Default for ArcOptions {
    fn default() -> Self {
        ArcOptions {
            turns: 0,
            max_l: 0.1,
            max_a: 1.0,
            plane: Plane::XY,
        }
    }
}

pub fn varc_cw(end: Tuple, radius: f64, opts: &ArcOptions) -> Result<Vec<Tuple>> {
    vectorize(Sweep::Arc { end, radius }, false, opts)
}

pub fn varc_ccw(end: Tuple, radius: f64, opts: &ArcOptions) -> Result<Vec<Tuple>> {
    vectorize(Sweep::Arc { end, radius }, true, opts)
}

pub fn vcircle_cw(center: Tuple, opts: &ArcOptions) -> Result<Vec<Tuple>> {
    vectorize(Sweep::Circle { center }, false, opts)
}

pub fn vcircle_ccw(center: Tuple, opts: &ArcOptions) -> Result<Vec<Tuple>> {
    vectorize(Sweep::Circle { center }, true, opts)
}

enum Sweep {
    Arc { end: Tuple, radius: f64 },
    Circle { center: Tuple },
}

fn into_xy(p: &Tuple, plane: Plane) -> Tuple {
    match plane {
        Plane::XY => *p,
        Plane::XZ => Tuple::new(p.x(), p.z(), p.y()),
        Plane::YZ => Tuple::new(p.y(), p.z(), p.x()),
    }
}

fn from_xy(p: &Tuple, plane: Plane) -> Tuple {
    match plane {
        Plane::XY => *p,
        Plane::XZ => Tuple::new(p.x(), p.z(), p.y()),
        Plane::YZ => Tuple::new(p.z(), p.x(), p.y()),
    }
}

/// Centre of the arc from the origin to `end`, for a signed radius already flipped for direction.
fn arc_center(end: &Tuple, radius: f64) -> Result<Tuple> {
    let chord = end.flat();
    let mut normal = Tuple::xy(chord.y(), -chord.x())
        .normalize()
        .map_err(|_| Error::InvalidParameter {
            name: "arc end point",
            value: 0.0,
            reason: "start and end of an arc must differ",
        })?;
    if radius < 0.0 {
        normal = -normal;
    }
    let r = radius.abs();
    let mut d = 4.0 * r * r - chord.dot(&chord);
    if d < 0.0 {
        // Rounding of a half circle can land just below zero
        if d > -EPSILON {
            d = 0.0;
        } else {
            return Err(Error::InvalidRadius {
                radius,
                discriminant: d,
            });
        }
    }
    Ok(chord * 0.5 + normal * (0.5 * d.sqrt()))
}

fn vectorize(sweep: Sweep, ccw: bool, opts: &ArcOptions) -> Result<Vec<Tuple>> {
    if opts.max_l <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "max_l",
            value: opts.max_l,
            reason: "must be positive",
        });
    }
    if opts.max_a <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "max_a",
            value: opts.max_a,
            reason: "must be positive",
        });
    }

    let (center, target) = match &sweep {
        Sweep::Arc { end, radius } => {
            if radius.abs() < EPSILON {
                return Err(Error::ZeroRadius);
            }
            let end = into_xy(end, opts.plane);
            let radius = if ccw { -radius } else { *radius };
            let center = arc_center(&end, radius).map_err(|e| match e {
                // Report the radius the caller asked for
                Error::InvalidRadius { discriminant, .. } => Error::InvalidRadius {
                    radius: if ccw { -radius } else { radius },
                    discriminant,
                },
                e => e,
            })?;
            (center, end)
        }
        Sweep::Circle { center } => {
            let c = into_xy(center, opts.plane);
            if c.flat().magnitude() < EPSILON {
                return Err(Error::ZeroRadius);
            }
            (c.flat(), Tuple::new(0.0, 0.0, c.z()))
        }
    };

    let r = center.magnitude();
    let a_start = (-center.y()).atan2(-center.x());
    let mut a_end = match sweep {
        Sweep::Arc { .. } => (target.y() - center.y()).atan2(target.x() - center.x()),
        Sweep::Circle { .. } if ccw => a_start + 2.0 * PI,
        Sweep::Circle { .. } => a_start - 2.0 * PI,
    };
    if ccw && a_end < a_start {
        a_end += 2.0 * PI;
    } else if !ccw && a_end > a_start {
        a_end -= 2.0 * PI;
    }
    let extra = f64::from(opts.turns) * 2.0 * PI;
    if ccw {
        a_end += extra;
    } else {
        a_end -= extra;
    }

    let total = (a_end - a_start).abs();
    let n = step_count(total, r, opts.max_l, opts.max_a);
    let step = (a_end - a_start) / n as f64;

    let mut points = Vec::with_capacity(n + 1);
    points.push(Tuple::zero());
    for i in 1..n {
        let a = a_start + step * i as f64;
        points.push(Tuple::new(
            center.x() + r * a.cos(),
            center.y() + r * a.sin(),
            target.z() * i as f64 / n as f64,
        ));
    }
    points.push(target);

    Ok(points
        .iter()
        .map(|p| from_xy(p, opts.plane))
        .collect())
}

/// Number of segments for a sweep of `total` radians at radius `r`. Whichever limit asks for
/// more segments wins, and there are never fewer than two.
fn step_count(total: f64, r: f64, max_l: f64, max_a: f64) -> usize {
    let by_length = (total / (2.0 * (0.5 * max_l / r).min(1.0).asin())).ceil() as usize;
    let by_angle = (total / max_a.to_radians()).ceil() as usize;
    by_length.max(2).max(by_angle.max(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn coarse() -> ArcOptions {
        ArcOptions {
            max_l: 10.0,
            max_a: 50.0,
            ..ArcOptions::default()
        }
    }

    #[test]
    fn test_half_circle_cw_passes_over_the_top() {
        let pts = varc_cw(Tuple::xy(2.0, 0.0), 1.0, &coarse()).unwrap();
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], Tuple::zero());
        assert!(pts[2].approx_eq(&Tuple::xy(1.0, 1.0)));
        assert_eq!(*pts.last().unwrap(), Tuple::xy(2.0, 0.0));
    }

    #[test]
    fn test_half_circle_ccw_passes_below() {
        let pts = varc_ccw(Tuple::xy(2.0, 0.0), 1.0, &coarse()).unwrap();
        assert!(pts[2].approx_eq(&Tuple::xy(1.0, -1.0)));
    }

    #[test]
    fn test_negative_radius_takes_the_long_way() {
        let end = Tuple::xy(1.0, 1.0);
        let short = varc_ccw(end, 1.0, &ArcOptions::default()).unwrap();
        let long = varc_ccw(end, -1.0, &ArcOptions::default()).unwrap();
        // A quarter and three quarters of a circle, about one degree per step
        assert!((91..=92).contains(&short.len()));
        assert!((271..=272).contains(&long.len()));
        for p in &short {
            assert_relative_eq!((*p - Tuple::xy(0.0, 1.0)).magnitude(), 1.0, epsilon = 1e-9);
        }
        for p in &long {
            assert_relative_eq!((*p - Tuple::xy(1.0, 0.0)).magnitude(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_endpoint_is_exact() {
        let end = Tuple::new(3.3, 1.7, -0.7);
        let pts = varc_cw(end, 5.0, &ArcOptions::default()).unwrap();
        assert_eq!(*pts.last().unwrap(), end);
        // Helical depth is spread evenly
        let n = pts.len() - 1;
        assert_relative_eq!(pts[1].z(), -0.7 / n as f64, epsilon = 1e-12);
    }

    #[test]
    fn test_circle_returns_to_start_at_depth() {
        let opts = ArcOptions {
            turns: 1,
            ..coarse()
        };
        let pts = vcircle_ccw(Tuple::new(1.0, 0.0, -2.0), &opts).unwrap();
        assert_eq!(*pts.last().unwrap(), Tuple::new(0.0, 0.0, -2.0));
        // Two full turns in 48 degree steps
        assert_eq!(pts.len(), 16);
        for (i, p) in pts.iter().enumerate() {
            assert_relative_eq!((p.flat() - Tuple::xy(1.0, 0.0)).magnitude(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(p.z(), -2.0 * i as f64 / 15.0, epsilon = 1e-12);
        }
        // Counter-clockwise around (1, 0) starts downwards
        assert!(pts[1].y() < 0.0);

        let cw = vcircle_cw(Tuple::xy(1.0, 0.0), &coarse()).unwrap();
        assert_eq!(cw.len(), 9);
        assert!(cw[2].approx_eq(&Tuple::xy(1.0, 1.0)));
    }

    #[test]
    fn test_smaller_limits_never_give_fewer_points() {
        let end = Tuple::xy(4.0, 1.0);
        let mut last = 0;
        for (l, a) in [(5.0, 30.0), (1.0, 30.0), (1.0, 5.0), (0.1, 5.0), (0.1, 1.0)] {
            let opts = ArcOptions {
                max_l: l,
                max_a: a,
                ..ArcOptions::default()
            };
            let n = varc_cw(end, 3.0, &opts).unwrap().len();
            assert!(n >= last);
            last = n;
        }
    }

    #[test]
    fn test_other_planes() {
        let opts = ArcOptions {
            plane: Plane::XZ,
            ..coarse()
        };
        let pts = varc_cw(Tuple::new(2.0, 0.5, 0.0), 1.0, &opts).unwrap();
        assert!(pts.iter().all(|p| p.y() >= 0.0 && p.y() <= 0.5));
        assert_eq!(*pts.last().unwrap(), Tuple::new(2.0, 0.5, 0.0));
        assert!(pts[2].approx_eq(&Tuple::new(1.0, 0.25, 1.0)));

        let opts = ArcOptions {
            plane: Plane::YZ,
            ..coarse()
        };
        let pts = varc_cw(Tuple::new(0.0, 2.0, 0.0), 1.0, &opts).unwrap();
        assert_eq!(*pts.last().unwrap(), Tuple::new(0.0, 2.0, 0.0));
        assert!(pts[2].approx_eq(&Tuple::new(0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_invalid_requests() {
        let opts = ArcOptions::default();
        assert!(matches!(
            varc_cw(Tuple::xy(1.0, 0.0), 0.0, &opts),
            Err(Error::ZeroRadius)
        ));
        assert!(matches!(
            varc_cw(Tuple::xy(4.0, 0.0), 1.0, &opts),
            Err(Error::InvalidRadius { radius, .. }) if radius == 1.0
        ));
        assert!(matches!(
            varc_cw(Tuple::zero(), 1.0, &opts),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            vcircle_cw(Tuple::new(0.0, 0.0, -1.0), &opts),
            Err(Error::ZeroRadius)
        ));
        let bad = ArcOptions {
            max_l: 0.0,
            ..opts
        };
        assert!(matches!(
            varc_cw(Tuple::xy(1.0, 0.0), 1.0, &bad),
            Err(Error::InvalidParameter { name: "max_l", .. })
        ));
    }
}
