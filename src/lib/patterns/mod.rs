use std::f64::consts::{PI, TAU};

use tracing::debug;

use crate::geometry::{to_rad, M4};
use crate::{xy, xy_of, xyz, z, Diagnostics, Error, Motion, Result, Tuple};

mod bezier;
mod gear;

pub use bezier::{vbezier3, BezierOptions};
pub use gear::{gear_p, GearOutline};

/// Trace a path without any compensation, then return to the starting Z.
///
/// The path is cut at depth `z_cut` and closed back onto its first point. With `dwell` set, the
/// tool waits that many seconds at every point.
pub fn trace_path(
    m: &mut dyn Motion,
    z_cut: f64,
    dwell: Option<f64>,
    path: &[Tuple],
) -> Result<()> {
    let Some(first) = path.first() else {
        return Ok(());
    };
    m.comment(&format!("-- tracepath at Z={z_cut} --"))?;
    let old_z = m.position().z();

    m.rapid_to(xy_of(first))?;
    m.feed_to(z(z_cut))?;
    if let Some(d) = dwell {
        m.dwell(d)?;
    }
    for p in path.iter().chain([first]) {
        m.feed_to(xy_of(p))?;
        if let Some(d) = dwell {
            m.dwell(d)?;
        }
    }
    m.feed_to(z(old_z))?;
    m.comment("-- tracepath end --")?;
    Ok(())
}

/// A trochoid with loop radius `b`, advancing `a * TAU` per loop. Shifted so that the angle 0
/// point sits half a step behind and one radius below the origin.
fn trochoid_point(angle: f64, a: f64, b: f64) -> Tuple {
    Tuple::xy(
        a * angle - b * angle.sin() - a * PI,
        b - b * angle.cos() - 2.0 * b,
    )
}

/// Clear a slot from `start` to `end` with trochoidal loops, for high speed milling.
///
/// The loops have the given `radius` and advance `increment` per turn; the move always makes a
/// whole number of turns. Cutting happens at `cut_z` and the tool returns to its old Z.
pub fn trochoid_move(
    m: &mut dyn Motion,
    start: Tuple,
    end: Tuple,
    cut_z: f64,
    radius: f64,
    increment: f64,
) -> Result<Diagnostics> {
    let mut diags = Diagnostics::new();
    if increment <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "trochoid increment",
            value: increment,
            reason: "must be positive",
        });
    }
    // Angular steps grow with the radius, to keep the segment length reasonable
    let step = radius.log10() * to_rad(5.0);
    if step <= 0.0 || !step.is_finite() {
        return Err(Error::InvalidParameter {
            name: "trochoid radius",
            value: radius,
            reason: "must be larger than 1",
        });
    }

    let vec = (end - start).flat();
    let distance = vec.magnitude();
    if distance <= 0.0 {
        diags.warn("trochoid_move", "trochoid move is not going anywhere");
        return Ok(diags);
    }

    let old_z = m.position().z();
    m.comment(&format!(
        "-- trochoid_move at {cut_z} from {start} to {end} radius={radius} increment={increment} --"
    ))?;

    let a = increment / TAU;
    let total = TAU * (distance / increment).ceil();
    let rot = M4::rotation_z(vec.y().atan2(vec.x())).translate(start.x(), start.y(), 0.0);
    debug!(operation = "trochoid_move", turns = total / TAU, "trochoid");

    m.rapid_to(xy_of(&rot.mult_point(&trochoid_point(0.0, a, radius))))?;
    m.feed_to(z(cut_z))?;
    let mut angle = step;
    while angle < total {
        m.feed_to(xy_of(&rot.mult_point(&trochoid_point(angle, a, radius))))?;
        angle += step;
    }
    m.feed_to(xy_of(&rot.mult_point(&trochoid_point(total, a, radius))))?;

    m.rapid_to(z(old_z))?;
    m.comment("-- trochoid_move end --")?;
    Ok(diags)
}

/// Mill a hole without a single straight cutting move.
///
/// Starting from the centre, the tool spirals out with half circles of growing size, each followed
/// by a full circle, `cut_step` wider every time, until the hole has `target_radius`. It then
/// leaves with a helical arc back to the centre and the starting Z.
pub fn cc_hole(
    m: &mut dyn Motion,
    center: Tuple,
    target_radius: f64,
    tool_radius: f64,
    cut_step: f64,
    cut_z: f64,
) -> Result<Diagnostics> {
    let mut diags = Diagnostics::new();
    if target_radius <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "hole radius",
            value: target_radius,
            reason: "must be positive",
        });
    }
    if tool_radius <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "tool radius",
            value: tool_radius,
            reason: "must be positive",
        });
    }
    if target_radius <= tool_radius {
        return Err(Error::InvalidParameter {
            name: "hole radius",
            value: target_radius,
            reason: "must be larger than the tool radius",
        });
    }
    if cut_step <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "cut step",
            value: cut_step,
            reason: "must be positive",
        });
    }
    if cut_step > 2.0 * tool_radius {
        diags.warn(
            "cc_hole",
            "cut step is larger than twice the tool radius, not all material will be removed",
        );
    } else if cut_step == 2.0 * tool_radius {
        diags.warn(
            "cc_hole",
            "cut step is exactly twice the tool radius, material may be left at the inner edge",
        );
    }

    let old_z = m.position().z();
    m.comment(&format!(
        "-- cc_hole center={center} target_radius={target_radius} tool_radius={tool_radius} cut_step={cut_step} cut_z={cut_z} --"
    ))?;

    m.rapid_to(xyz(center.x(), center.y(), old_z))?;
    m.feed_to(z(cut_z))?;

    let mut r = tool_radius;
    let mut n = 1.0;
    let mut dir = -1.0;
    while r < target_radius {
        let p = if target_radius - r >= cut_step {
            r += cut_step;
            (2.0 * n - 1.0) * cut_step
        } else {
            let rest = target_radius - r;
            r = target_radius;
            (2.0 * n - 2.0) * cut_step + rest
        };
        // Half circle across the centre, then round at the new radius
        m.arc_relative_to(Tuple::xy(0.0, dir * p), 0.5 * p, 0, true)?;
        let offset = (center - m.position()).flat();
        m.circle_relative(offset, 0, true)?;
        n += 1.0;
        dir = -dir;
    }

    let span = target_radius - tool_radius;
    m.arc_relative_to(Tuple::new(0.0, dir * span, old_z - cut_z), 0.5 * span, 0, true)?;

    m.comment("-- end cc_hole --")?;
    Ok(diags)
}

/// Rapid to `to` at `safe_z` and plunge to the Z of `to`.
pub fn plunge_at(m: &mut dyn Motion, to: &Tuple, safe_z: f64) -> Result<()> {
    m.rapid_to(z(safe_z))?;
    m.rapid_to(xy(to.x(), to.y()))?;
    m.feed_to(z(to.z()))
}
