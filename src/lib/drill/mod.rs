//! Canned drilling cycles written out as plain moves.
//!
//! Every hole is reached with a rapid XY move at the current height. The cutting happens between
//! the retract plane (R-plane) and the hole depth, the Z of each hole. Holes whose depth is not
//! below the R-plane are skipped with a warning.

use tracing::debug;

use crate::{xy, z, Diagnostics, Error, Motion, Result, Tuple};

/// Smallest gap left above the previous peck when rapiding back down. Never more than twice this.
const PECK_CLEARANCE: f64 = 0.1;

/// Outcome of a drilling cycle.
#[derive(Debug, Default)]
pub struct DrillReport {
    /// Holes actually drilled (skipped holes are not counted).
    pub drilled: usize,
    pub diagnostics: Diagnostics,
}

/// Drill each hole in a single feed move, optionally dwelling `dwell` seconds at the bottom.
///
/// With `old_z` the tool returns to the height it had before the cycle after every hole,
/// otherwise it stays at the R-plane.
pub fn canned_drill(
    m: &mut dyn Motion,
    retract_z: f64,
    dwell: Option<f64>,
    old_z: bool,
    holes: &[Tuple],
) -> Result<DrillReport> {
    let mut report = DrillReport::default();
    let dwell_text = dwell.map_or("none".to_string(), |d| d.to_string());
    m.comment(&format!(
        "-- canned_drill R-plane={retract_z} dwelling={dwell_text} return-to-old-Z={old_z} --"
    ))?;
    m.path_mode(true)?;

    let prev_z = enter_r_plane(m, retract_z, old_z, "canned_drill", &mut report)?;

    for hole in holes {
        if !start_hole(m, retract_z, hole, "canned_drill", &mut report)? {
            continue;
        }
        m.rapid_to(z(retract_z))?;
        m.feed_to(z(hole.z()))?;
        if let Some(d) = dwell {
            m.dwell(d)?;
        }
        m.rapid_to(z(if old_z { prev_z } else { retract_z }))?;
        report.drilled += 1;
    }

    if old_z {
        m.rapid_to(z(prev_z))?;
    }
    m.comment("-- end canned_drill --")?;
    Ok(report)
}

/// Drill each hole in pecks of at most `delta`, going back to the R-plane after every peck to
/// clear chips.
pub fn canned_drill_peck(
    m: &mut dyn Motion,
    retract_z: f64,
    delta: f64,
    old_z: bool,
    holes: &[Tuple],
) -> Result<DrillReport> {
    if delta <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "peck increment",
            value: delta,
            reason: "must be positive",
        });
    }
    let mut report = DrillReport::default();
    m.comment(&format!(
        "-- canned_drill_peck R-plane={retract_z} peck-increment={delta} return-to-old-Z={old_z} --"
    ))?;
    m.path_mode(true)?;

    let clearance = (0.1 * delta).clamp(PECK_CLEARANCE, 2.0 * PECK_CLEARANCE);
    let prev_z = enter_r_plane(m, retract_z, old_z, "canned_drill_peck", &mut report)?;

    for hole in holes {
        if !start_hole(m, retract_z, hole, "canned_drill_peck", &mut report)? {
            continue;
        }
        let depth = hole.z();
        report.drilled += 1;
        m.rapid_to(z(retract_z))?;

        // A single peck does it
        if retract_z - delta < depth {
            m.feed_to(z(depth))?;
            m.rapid_to(z(if old_z { prev_z } else { retract_z }))?;
            continue;
        }

        m.feed_to(z(retract_z - delta))?;
        m.rapid_to(z(retract_z))?;

        let mut peck = retract_z - 2.0 * delta;
        while peck > depth {
            m.rapid_to(z(peck + delta + clearance))?;
            m.feed_to(z(peck))?;
            m.rapid_to(z(retract_z))?;
            peck -= delta;
        }

        // Whatever is left after the last full peck
        let last = peck + delta;
        if last > depth {
            m.rapid_to(z(last + clearance))?;
            m.feed_to(z(depth))?;
            m.rapid_to(z(retract_z))?;
        }

        if old_z {
            m.rapid_to(z(prev_z))?;
        }
    }

    if old_z {
        m.rapid_to(z(prev_z))?;
    }
    m.comment("-- end canned_drill_peck --")?;
    Ok(report)
}

/// Bring the tool up to the R-plane if it is below it. Returns the height to go back to.
fn enter_r_plane(
    m: &mut dyn Motion,
    retract_z: f64,
    old_z: bool,
    operation: &'static str,
    report: &mut DrillReport,
) -> Result<f64> {
    let prev_z = m.position().z();
    if prev_z >= retract_z {
        return Ok(prev_z);
    }
    if old_z {
        report.diagnostics.warn(
            operation,
            format!(
                "return to old Z requested, but old Z ({prev_z}) is below the R-plane ({retract_z}), staying at the R-plane"
            ),
        );
    }
    m.rapid_to(z(retract_z))?;
    Ok(retract_z)
}

/// Go over the hole. Returns false when the hole is skipped.
fn start_hole(
    m: &mut dyn Motion,
    retract_z: f64,
    hole: &Tuple,
    operation: &'static str,
    report: &mut DrillReport,
) -> Result<bool> {
    m.rapid_to(xy(hole.x(), hole.y()))?;
    if hole.z() >= retract_z {
        report.diagnostics.warn(
            operation,
            format!(
                "drilling at [{}, {}] to depth {} is not below the R-plane ({retract_z}), skipping",
                hole.x(),
                hole.y(),
                hole.z()
            ),
        );
        return Ok(false);
    }
    debug!(operation, x = hole.x(), y = hole.y(), depth = hole.z(), "drilling");
    Ok(true)
}
