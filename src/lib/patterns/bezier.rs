use crate::{Error, Result, Tuple};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BezierOptions {
    /// Allowed residual of `2 - |cos(a) - cos(b)|` before a piece counts as straight.
    pub flatness: f64,
    /// Pieces shorter than this are not split any further.
    pub min_l: f64,
}

impl Default for BezierOptions {
    fn default() -> Self {
        BezierOptions {
            flatness: 1e-4,
            min_l: 0.1,
        }
    }
}

/// Vectorize the cubic Bezier curve with nodes `b0`, `b3` and control points `b1`, `b2` by
/// recursive De Casteljau subdivision.
///
/// The result excludes `b0` and ends exactly on `b3`, so consecutive curves can be chained.
pub fn vbezier3(
    b0: Tuple,
    b1: Tuple,
    b2: Tuple,
    b3: Tuple,
    opts: &BezierOptions,
) -> Result<Vec<Tuple>> {
    if opts.min_l <= 0.0 {
        return Err(Error::InvalidParameter {
            name: "bezier min_l",
            value: opts.min_l,
            reason: "must be positive",
        });
    }
    let mut out = Vec::new();
    subdivide(b0, b1, b2, b3, opts, &mut out);
    Ok(out)
}

/// Direction of `v`, or nothing for a zero vector.
fn unit(v: Tuple) -> Tuple {
    v.normalize().unwrap_or_default()
}

fn subdivide(
    b0: Tuple,
    b1: Tuple,
    b2: Tuple,
    b3: Tuple,
    opts: &BezierOptions,
    out: &mut Vec<Tuple>,
) {
    let l = (b0 + b1) * 0.5;
    let m = (b1 + b2) * 0.5;
    let r = (b2 + b3) * 0.5;
    let lm = (l + m) * 0.5;
    let rm = (r + m) * 0.5;
    let t = (lm + rm) * 0.5;

    // Small enough. Control points pulling the curve out sideways have to be close as well.
    if (t - b0).magnitude() + (b3 - t).magnitude() < opts.min_l && (r - l).magnitude() < opts.min_l
    {
        out.push(t);
        out.push(b3);
        return;
    }

    // Seen from both ends, the cosines sum to 2 when the piece is straight. The test is scaled
    // by the length of the piece relative to min_l.
    let cos_l = unit(b0 - m).dot(&unit(lm - t));
    let cos_r = unit(b3 - m).dot(&unit(t - rm));
    if (b3 - b0).magnitude() / opts.min_l * (2.0 - (cos_r - cos_l).abs()) < opts.flatness {
        out.push(b3);
        return;
    }

    subdivide(b0, l, lm, t, opts, out);
    subdivide(t, rm, r, b3, opts, out);
}
