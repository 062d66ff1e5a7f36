//! Involute spur gear outlines.
//!
//! Gear terms, for a gear with `N` teeth, pressure angle `Pa` and diametral pitch `P`:
//!
//! | term               | formula            |
//! |--------------------|--------------------|
//! | pitch diameter     | `D = N / P`        |
//! | base diameter      | `Db = D * cos(Pa)` |
//! | addendum           | `a = 1 / P`        |
//! | whole depth        | `ht = 2.157 / P`   |
//! | dedendum           | `b = ht - a`       |
//! | outside diameter   | `Do = D + 2a`      |
//! | root diameter      | `Dr = Db - 2b`     |
//! | working diameter   | `Dw = Do - 4a`     |

use crate::geometry::{to_deg, to_rad, M4};
use crate::{Diagnostics, Error, Result, Tuple};

/// Trace interval for the involute, in degrees. The fillet uses 2.5 times this.
const ANGLE_STEP_DEG: f64 = 2.0;

#[derive(Debug)]
pub struct GearOutline {
    /// Outline centred on the origin, starting half way across the tip of the first tooth.
    pub points: Vec<Tuple>,
    pub pitch_diameter: f64,
    pub base_diameter: f64,
    pub outside_diameter: f64,
    pub root_diameter: f64,
    pub diagnostics: Diagnostics,
}

/// Point on the involute of a circle with `radius`, at `angle` degrees.
fn involute_point(angle: f64, radius: f64) -> Tuple {
    let t = to_rad(angle);
    let (sin, cos) = t.sin_cos();
    Tuple::xy(radius * (cos + t * sin), radius * (sin - t * cos))
}

/// Involute angle, in degrees, at which the involute of `radius` reaches `out_radius`.
fn involute_angle(radius: f64, out_radius: f64) -> f64 {
    to_deg(((out_radius / radius).powi(2) - 1.0).sqrt())
}

/// One flank of a tooth: a fillet from the root up to the working depth, then the involute out
/// to the outside diameter.
fn half_tooth(base: f64, outside: f64, root: f64, work: f64) -> Vec<Tuple> {
    let mut tooth = Vec::new();

    // Approximate, the fillet does not meet the root circle exactly
    let fillet = (base - root) / 8.0;
    // The involute makes about 240 degrees with the fillet arc
    let center = M4::rotation_z(to_rad(60.0)).mult_point(&Tuple::xy(-fillet, 0.0))
        + Tuple::xy(work / 2.0, 0.0);
    let fillet_point = |a: f64| {
        let (sin, cos) = to_rad(a).sin_cos();
        Tuple::xy(fillet * cos + center.x(), fillet * sin + center.y())
    };

    let mut a = 180.0;
    while a > 60.0 {
        tooth.push(fillet_point(a));
        a -= ANGLE_STEP_DEG * 2.5;
    }
    if a != 60.0 {
        tooth.push(fillet_point(60.0));
    }

    let max_a = involute_angle(base / 2.0, outside / 2.0);
    let mut a = 0.0;
    while a < max_a {
        tooth.push(involute_point(a, base / 2.0));
        a += ANGLE_STEP_DEG;
    }
    if a != max_a {
        tooth.push(involute_point(max_a, base / 2.0));
    }
    tooth
}

/// Build a gear outline from its number of teeth, pressure angle (degrees) and diametral pitch
/// (teeth per unit of pitch diameter).
///
/// Pressure angles outside 12 to 24.6 degrees give unusable teeth and are warned about.
pub fn gear_p(teeth: u32, pressure_angle_deg: f64, diametral_pitch: f64) -> Result<GearOutline> {
    if teeth == 0 {
        return Err(Error::InvalidParameter {
            name: "number of teeth",
            value: 0.0,
            reason: "must be at least one",
        });
    }
    if diametral_pitch <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "diametral pitch",
            value: diametral_pitch,
            reason: "must be positive",
        });
    }
    let mut diagnostics = Diagnostics::new();
    if pressure_angle_deg > 24.6 {
        diagnostics.warn(
            "gear_p",
            format!("pressure angle ({pressure_angle_deg:.8}) too large, cannot fit teeth inside the outside diameter"),
        );
    }
    if pressure_angle_deg < 12.0 {
        diagnostics.warn(
            "gear_p",
            format!("pressure angle ({pressure_angle_deg:.8}) too small, teeth may get stuck at the pitch radius"),
        );
    }

    let n = f64::from(teeth);
    let pitch_diameter = n / diametral_pitch;
    let base_diameter = pitch_diameter * to_rad(pressure_angle_deg).cos();
    let addendum = 1.0 / diametral_pitch;
    let dedendum = 2.157 / diametral_pitch - addendum;
    let outside_diameter = pitch_diameter + 2.0 * addendum;
    let root_diameter = base_diameter - 2.0 * dedendum;
    let work_diameter = outside_diameter - 4.0 * addendum;

    // One flank, turned so that the tooth is symmetric about the X axis
    let flank = M4::rotation_z(to_rad(-90.0 / n)).transform(&half_tooth(
        base_diameter,
        outside_diameter,
        root_diameter,
        work_diameter,
    ));
    let n_flank = flank.len();

    // The other flank is the mirror image, traced backwards. The point in the middle of the tip
    // is where a compensated path can enter.
    let mut tooth = flank.clone();
    tooth.push(Tuple::xy(flank[n_flank - 1].x(), 0.0));
    tooth.extend(flank.iter().rev().map(|p| Tuple::xy(p.x(), -p.y())));

    let mut gear = Vec::with_capacity(tooth.len() * teeth as usize);
    for i in 0..teeth {
        let a = to_rad(f64::from(i) * 360.0 / n);
        gear.extend(M4::rotation_z(a).transform(&tooth));
    }
    gear.rotate_left(n_flank);

    Ok(GearOutline {
        points: gear,
        pitch_diameter,
        base_diameter,
        outside_diameter,
        root_diameter,
        diagnostics,
    })
}
