//! Tool radius compensation: trace a path at a fixed distance to one side of it.

use std::fmt;

use tracing::debug;

use crate::{xy_of, z, Diagnostics, Error, Motion, Result, Tuple};

mod outline;

use outline::{Corner, Outline};

const OPERATION: &str = "tracepath_comp";

/// Which side of the path, looking along it, the tool runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    Left,
    #[default]
    Right,
}

impl Side {
    fn sign(self) -> f64 {
        match self {
            Side::Left => -1.0,
            Side::Right => 1.0,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompOptions {
    pub side: Side,
    /// Arc into the first offset point instead of plunging onto it.
    pub arc_in: bool,
    /// Arc away from the last offset point instead of moving straight out.
    pub arc_out: bool,
    /// The last point connects back to the first.
    pub closed: bool,
    /// Trace the whole path at the Z of its first point.
    pub keep_z: bool,
    /// Go back to the Z the tool had before the trace.
    pub old_z: bool,
    /// Don't warn about removed corners.
    pub quiet: bool,
}

#[derive(Debug, Default)]
pub struct CompReport {
    /// Corners the tool could not reach, removed from the path before tracing.
    pub removed_corners: usize,
    pub diagnostics: Diagnostics,
}

/// Trace `path` with the tool centre `width` away from it.
///
/// The first point of the path carries the cutting depth; later points may change Z as long as
/// every XY position is unique. Outside corners are rounded with an arc of radius `width`, inside
/// corners are cut at the intersection of the offset lines. Corners the tool cannot get into are
/// removed first and reported.
pub fn trace_path_comp(
    m: &mut dyn Motion,
    width: f64,
    opts: &CompOptions,
    path: &[Tuple],
) -> Result<CompReport> {
    if width <= 0.0 {
        return Err(Error::InvalidWidth(width));
    }
    let mut report = CompReport::default();
    if path.is_empty() {
        return Ok(report);
    }

    let prev_z = m.position().z();
    let mut outline = Outline::prepare(path, opts, &mut report.diagnostics)?;
    let removed = outline.resolve(width, &mut report.diagnostics)?;
    if removed > 0 && !opts.quiet {
        report
            .diagnostics
            .warn(OPERATION, format!("removed {removed} unreachable corner(s)"));
    }
    report.removed_corners = removed;
    debug!(
        operation = OPERATION,
        points = outline.len(),
        closed = outline.closed,
        removed,
        "tracing"
    );

    m.comment(&format!(
        "-- tracepath_comp at {} side at width={width} --",
        opts.side
    ))?;

    if outline.closed && outline.classify(0) == Some(Corner::Inside) {
        report.diagnostics.warn(
            OPERATION,
            "path entry and exit collide, use a >=180 degree entry angle point to prevent",
        );
    }

    emit(m, width, opts, &outline)?;

    if opts.old_z {
        m.rapid_to(z(prev_z))?;
    }
    m.comment("-- tracepath_comp end --")?;
    Ok(report)
}

fn emit(m: &mut dyn Motion, w: f64, opts: &CompOptions, outline: &Outline) -> Result<()> {
    let pts = &outline.pts;
    let n = pts.len();
    // Lead arcs turn against the fillets
    let lead_cw = opts.side == Side::Right;

    let p0 = pts[0];
    let (d0, n0) = (outline.dir(0), outline.normal(0));
    let entry = p0 + n0 * w;
    if opts.arc_in {
        let start = p0 + (n0 * 2.0 - d0) * w;
        m.rapid_to(xy_of(&start))?;
        m.feed_to(start.into())?;
        m.arc_to(entry, w, 0, lead_cw)?;
    } else {
        m.rapid_to(xy_of(&entry))?;
        m.feed_to(entry.into())?;
    }

    let order: Vec<usize> = if outline.closed {
        (1..n).chain([0]).collect()
    } else {
        (1..n - 1).collect()
    };
    for v in order {
        let (Some(corner), Some((a, b)), Some((_, dot))) =
            (outline.classify(v), outline.around(v), outline.turn(v))
        else {
            continue;
        };
        let p = pts[v];
        let (na, nb) = (outline.normal(a), outline.normal(b));
        match corner {
            Corner::Collinear => {}
            Corner::Outside | Corner::Reversal => {
                m.feed_to((p + na * w).into())?;
                m.arc_to(p + nb * w, w, 0, !lead_cw)?;
            }
            Corner::Inside => {
                m.feed_to((p + (na + nb) * (w / (1.0 + dot))).into())?;
            }
        }
    }

    let (n_out, d_out) = if outline.closed {
        if outline.classify(0) == Some(Corner::Collinear) {
            m.feed_to(entry.into())?;
        }
        (n0, d0)
    } else {
        let last = n - 2;
        let (n_last, d_last) = (outline.normal(last), outline.dir(last));
        m.feed_to((pts[n - 1] + n_last * w).into())?;
        (n_last, d_last)
    };

    if opts.arc_out {
        m.arc_relative_to((n_out + d_out) * w, w, 0, lead_cw)?;
    } else {
        let to = m.position() + n_out * w;
        m.feed_to(to.into())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{path, turn_sine};
    use crate::{Op, Recorder};
    use approx::assert_relative_eq;

    fn arc(start: Tuple, end: Tuple, clockwise: bool) -> Op {
        Op::Arc {
            start,
            end,
            radius: 1.0,
            turns: 0,
            clockwise,
        }
    }

    fn feeds(r: &Recorder) -> Vec<Tuple> {
        r.ops
            .iter()
            .filter_map(|op| match op {
                Op::Feed(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_closed_square_outside() {
        let square = path(&["0, 0", "10", "-, 10", "0"]).unwrap();
        let mut r = Recorder::new();
        let opts = CompOptions {
            closed: true,
            ..CompOptions::default()
        };
        let report = trace_path_comp(&mut r, 1.0, &opts, &square).unwrap();
        assert_eq!(report.removed_corners, 0);
        assert!(report.diagnostics.is_empty());
        assert_eq!(
            r.ops,
            vec![
                Op::Comment("-- tracepath_comp at right side at width=1 --".to_string()),
                Op::Rapid(Tuple::xy(0.0, -1.0)),
                Op::Feed(Tuple::xy(10.0, -1.0)),
                arc(Tuple::xy(10.0, -1.0), Tuple::xy(11.0, 0.0), false),
                Op::Feed(Tuple::xy(11.0, 10.0)),
                arc(Tuple::xy(11.0, 10.0), Tuple::xy(10.0, 11.0), false),
                Op::Feed(Tuple::xy(0.0, 11.0)),
                arc(Tuple::xy(0.0, 11.0), Tuple::xy(-1.0, 10.0), false),
                Op::Feed(Tuple::xy(-1.0, 0.0)),
                arc(Tuple::xy(-1.0, 0.0), Tuple::xy(0.0, -1.0), false),
                Op::Feed(Tuple::xy(0.0, -2.0)),
                Op::Comment("-- tracepath_comp end --".to_string()),
            ]
        );
    }

    #[test]
    fn test_closed_square_inside_with_collinear_seam() {
        let square = path(&["5, 0, -1", "10", "-, 10", "0", "-, 0"]).unwrap();
        let mut r = Recorder::new();
        let opts = CompOptions {
            side: Side::Left,
            closed: true,
            ..CompOptions::default()
        };
        trace_path_comp(&mut r, 1.0, &opts, &square).unwrap();
        assert_eq!(r.arcs().count(), 0);
        let got = feeds(&r);
        let want = path(&["5, 1, -1", "9", "-, 9", "1", "-, 1", "5", "-, 2"]).unwrap();
        assert_eq!(got.len(), want.len());
        for (g, w) in got.iter().zip(want.iter()) {
            assert!(g.approx_eq(w), "{g} != {w}");
        }
    }

    #[test]
    fn test_offset_distance_at_reachable_inside_corner() {
        let pts = path(&["0, 0", "10", "0, 5"]).unwrap();
        let mut r = Recorder::new();
        let opts = CompOptions {
            side: Side::Left,
            ..CompOptions::default()
        };
        let report = trace_path_comp(&mut r, 1.0, &opts, &pts).unwrap();
        assert_eq!(report.removed_corners, 0);
        let f = feeds(&r);
        let corner = f[0];
        assert_relative_eq!(corner.y(), 1.0, epsilon = 1e-9);
        let exit_dir = Tuple::xy(-10.0, 5.0).normalize().unwrap();
        let off = corner - Tuple::xy(10.0, 0.0);
        assert_relative_eq!(
            turn_sine(&exit_dir, &off) * off.magnitude(),
            1.0,
            epsilon = 1e-9
        );
        // Then along the exit segment at the same distance
        let off = f[1] - Tuple::xy(0.0, 5.0);
        assert_relative_eq!(turn_sine(&exit_dir, &off) * off.magnitude(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reversal_on_the_right_side_gets_a_half_circle() {
        let pts = path(&["0, 0", "10", "-, -5", "-, 0", "20"]).unwrap();
        let mut r = Recorder::new();
        let report = trace_path_comp(&mut r, 1.0, &CompOptions::default(), &pts).unwrap();
        assert_eq!(report.removed_corners, 0);
        assert_eq!(
            r.arcs().collect::<Vec<_>>(),
            vec![&arc(Tuple::xy(9.0, -5.0), Tuple::xy(11.0, -5.0), false)]
        );
        assert_eq!(
            feeds(&r),
            path(&["9, -1", "-, -5", "11, -1", "20", "-, -2"]).unwrap()
        );
    }

    #[test]
    fn test_reversal_on_the_wrong_side_is_removed() {
        let pts = path(&["0, 0", "10", "-, 5", "-, 0", "20"]).unwrap();
        let mut r = Recorder::new();
        let report = trace_path_comp(&mut r, 1.0, &CompOptions::default(), &pts).unwrap();
        assert_eq!(report.removed_corners, 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(r.arcs().count(), 0);
        assert_eq!(feeds(&r), path(&["20, -1", "-, -2"]).unwrap());

        let mut r = Recorder::new();
        let quiet = CompOptions {
            quiet: true,
            ..CompOptions::default()
        };
        let report = trace_path_comp(&mut r, 1.0, &quiet, &pts).unwrap();
        assert_eq!(report.removed_corners, 1);
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_arc_in_arc_out_and_old_z() {
        let pts = path(&["0, 0, -1", "10"]).unwrap();
        let mut r = Recorder::at(Tuple::new(0.0, 0.0, 3.0));
        let opts = CompOptions {
            arc_in: true,
            arc_out: true,
            old_z: true,
            ..CompOptions::default()
        };
        trace_path_comp(&mut r, 1.0, &opts, &pts).unwrap();
        assert_eq!(
            r.ops[1..r.ops.len() - 1],
            [
                Op::Rapid(Tuple::new(-1.0, -2.0, 3.0)),
                Op::Feed(Tuple::new(-1.0, -2.0, -1.0)),
                arc(
                    Tuple::new(-1.0, -2.0, -1.0),
                    Tuple::new(0.0, -1.0, -1.0),
                    true
                ),
                Op::Feed(Tuple::new(10.0, -1.0, -1.0)),
                arc(
                    Tuple::new(10.0, -1.0, -1.0),
                    Tuple::new(11.0, -2.0, -1.0),
                    true
                ),
                Op::Rapid(Tuple::new(11.0, -2.0, 3.0)),
            ]
        );
    }

    #[test]
    fn test_left_side_leads_counter_clockwise() {
        let pts = path(&["0, 0", "10"]).unwrap();
        let mut r = Recorder::new();
        let opts = CompOptions {
            side: Side::Left,
            arc_in: true,
            ..CompOptions::default()
        };
        trace_path_comp(&mut r, 2.0, &opts, &pts).unwrap();
        assert_eq!(
            r.arcs().next(),
            Some(&Op::Arc {
                start: Tuple::xy(-2.0, 4.0),
                end: Tuple::xy(0.0, 2.0),
                radius: 2.0,
                turns: 0,
                clockwise: false,
            })
        );
        assert_eq!(r.comments().next(), Some("-- tracepath_comp at left side at width=2 --"));
    }

    #[test]
    fn test_seam_collision_is_reported() {
        let triangle = path(&["0, 0", "10", "0, 10"]).unwrap();
        let mut r = Recorder::new();
        let opts = CompOptions {
            side: Side::Left,
            closed: true,
            ..CompOptions::default()
        };
        let report = trace_path_comp(&mut r, 0.5, &opts, &triangle).unwrap();
        assert_eq!(report.removed_corners, 0);
        assert_eq!(report.diagnostics.len(), 1);
    }

    /// Distance in XY from `p` to the nearest segment of an open path.
    fn distance_to_path(p: &Tuple, pts: &[Tuple]) -> f64 {
        pts.windows(2)
            .map(|s| {
                let (ab, ap) = ((s[1] - s[0]).flat(), (*p - s[0]).flat());
                let t = (ap.dot(&ab) / ab.dot(&ab)).clamp(0.0, 1.0);
                (ap - ab * t).magnitude()
            })
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_notched_outline_is_never_gouged() {
        #[rustfmt::skip]
        let xy = [
            (4.0, 3.0), (3.5, 3.5), (3.0, 4.0), (2.7, 4.0), (2.5, 3.0), (2.3, 4.0), (2.0, 4.0),
            (1.0, 5.0), (0.2, 5.0), (0.1, 6.0), (0.0, 3.0), (-0.1, 4.0), (-1.0, 4.0), (-1.1, 6.0),
            (-1.2, 5.0), (-2.0, 5.0), (-2.1, 6.0), (-2.0, 4.0), (-3.0, 4.0), (-4.0, 3.0),
            (-4.0, 2.5), (-5.0, 3.0), (-4.0, 2.5), (-4.0, 2.0), (-3.0, 2.0), (-4.0, 2.0),
            (-4.0, 1.5), (-5.0, 1.0), (-4.0, 1.5), (-4.0, 1.0), (-3.0, 0.0), (-4.0, 0.0),
            (-4.0, -1.0), (-5.0, -1.05), (-4.0, -1.1), (-4.0, -2.0), (-5.0, -3.0), (-4.0, -2.1),
            (-4.0, -3.0), (-3.0, -4.0), (-2.0, -4.0), (-1.9, -2.0), (-1.8, -3.0), (-1.0, -3.0),
            (-0.9, -2.0), (-1.0, -4.0), (0.0, -4.0), (0.0, -5.0), (0.1, -2.0), (0.2, -3.0),
            (1.0, -3.0), (2.0, -4.0), (2.3, -4.0), (2.5, -5.0), (2.7, -4.0), (3.0, -4.0),
            (4.0, -3.0), (4.0, -2.1), (3.0, -2.5), (4.0, -2.0), (4.0, -1.1), (3.0, -1.05),
            (4.0, -1.0), (4.0, 0.0), (5.0, 0.0), (4.0, 1.0), (4.0, 1.5), (3.0, 1.0), (4.0, 1.5),
            (4.0, 2.0), (5.0, 2.0), (4.0, 2.0), (4.0, 2.5),
        ];
        let mut pts: Vec<Tuple> = xy.iter().map(|&(x, y)| Tuple::xy(10.0 * x, 10.0 * y)).collect();
        pts[0] = pts[0].with_z(-1.0);

        let width = 2.0;
        for (side, leads) in [(Side::Right, false), (Side::Right, true), (Side::Left, false)] {
            let mut r = Recorder::new();
            let opts = CompOptions {
                side,
                arc_in: leads,
                arc_out: leads,
                ..CompOptions::default()
            };
            let report = trace_path_comp(&mut r, width, &opts, &pts).unwrap();
            assert!(report.removed_corners > 0);
            for op in &r.ops {
                let end = match op {
                    Op::Feed(p) => p,
                    Op::Arc { end, .. } => end,
                    _ => continue,
                };
                let d = distance_to_path(end, &pts);
                assert!(d > width - 1e-6, "{side} side cuts to {d} of the outline at {end}");
            }
        }
    }

    #[test]
    fn test_bad_width_and_empty_path() {
        let mut r = Recorder::new();
        let pts = path(&["0, 0", "10"]).unwrap();
        assert!(matches!(
            trace_path_comp(&mut r, 0.0, &CompOptions::default(), &pts),
            Err(Error::InvalidWidth(_))
        ));
        let report = trace_path_comp(&mut r, 1.0, &CompOptions::default(), &[]).unwrap();
        assert_eq!(report.removed_corners, 0);
        assert!(r.ops.is_empty());
    }
}
