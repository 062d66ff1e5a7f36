//! Corner analysis and path surgery for tool compensation.

use crate::geometry::{length_xy, turn_sine, Tuple, EPSILON};
use crate::{Diagnostics, Error, Result};

use super::{CompOptions, OPERATION};

/// What the offset path has to do at a vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Corner {
    /// Straight on, nothing to do.
    Collinear,
    /// The path doubles back on itself.
    Reversal,
    /// Turn away from the offset side, needs a fillet.
    Outside,
    /// Turn towards the offset side, the offset lines intersect.
    Inside,
}

/// A cleaned up path with the offset side baked in.
///
/// Segment `i` runs from point `i` to point `i + 1`; a closed outline has one more segment from
/// the last point back to the first.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Outline {
    pub pts: Vec<Tuple>,
    pub closed: bool,
    /// +1 for the right side, -1 for the left.
    side: f64,
}

impl Outline {
    /// Apply the Z and closing options and drop duplicate points.
    pub fn prepare(path: &[Tuple], opts: &CompOptions, diags: &mut Diagnostics) -> Result<Outline> {
        let mut pts = path.to_vec();
        if opts.keep_z {
            let z = pts.first().map_or(0.0, Tuple::z);
            for p in pts.iter_mut() {
                *p = p.with_z(z);
            }
        }

        let mut closed = opts.closed;
        if pts.len() > 1 {
            let (first, last) = (pts[0], pts[pts.len() - 1]);
            if first.approx_eq_xy(&last) {
                if (first.z() - last.z()).abs() >= EPSILON {
                    diags.warn(
                        OPERATION,
                        "first and last point only differ by Z, deleting the last point and closing the path",
                    );
                }
                pts.pop();
                closed = true;
            }
        }

        let mut outline = Outline {
            pts,
            closed,
            side: opts.side.sign(),
        };
        outline.dedupe(diags);
        if outline.pts.len() < 2 {
            return Err(Error::DegeneratePath {
                points: outline.pts.len(),
            });
        }
        Ok(outline)
    }

    pub fn len(&self) -> usize {
        self.pts.len()
    }

    pub fn segments(&self) -> usize {
        if self.closed {
            self.pts.len()
        } else {
            self.pts.len() - 1
        }
    }

    /// Unit direction of a segment, in XY.
    pub fn dir(&self, seg: usize) -> Tuple {
        let a = self.pts[seg];
        let b = self.pts[(seg + 1) % self.pts.len()];
        let v = (b - a).flat();
        v / length_xy(&v)
    }

    /// Unit normal of a segment pointing to the offset side.
    pub fn normal(&self, seg: usize) -> Tuple {
        let d = self.dir(seg);
        Tuple::xy(self.side * d.y(), -self.side * d.x())
    }

    fn seg_len(&self, seg: usize) -> f64 {
        let a = self.pts[seg];
        let b = self.pts[(seg + 1) % self.pts.len()];
        length_xy(&(b - a))
    }

    /// The segments meeting at a vertex. Ends of an open path have none.
    pub fn around(&self, v: usize) -> Option<(usize, usize)> {
        let incoming = if v > 0 {
            v - 1
        } else if self.closed {
            self.pts.len() - 1
        } else {
            return None;
        };
        if v >= self.segments() {
            return None;
        }
        Some((incoming, v))
    }

    /// Sine of the turn at a vertex, signed so that positive turns away from the offset side,
    /// and the cosine of the turn.
    pub fn turn(&self, v: usize) -> Option<(f64, f64)> {
        let (a, b) = self.around(v)?;
        let (da, db) = (self.dir(a), self.dir(b));
        Some((self.side * turn_sine(&da, &db), da.dot(&db)))
    }

    pub fn classify(&self, v: usize) -> Option<Corner> {
        let (cross, dot) = self.turn(v)?;
        Some(if cross.abs() < EPSILON {
            if dot > 0.0 {
                Corner::Collinear
            } else {
                Corner::Reversal
            }
        } else if cross > 0.0 {
            Corner::Outside
        } else {
            Corner::Inside
        })
    }

    /// Drop points that sit on top of their predecessor. A point that only differs in Z is
    /// dropped too, with a warning.
    pub fn dedupe(&mut self, diags: &mut Diagnostics) {
        let mut i = 0;
        while i + 1 < self.pts.len() {
            if self.pts[i].approx_eq_xy(&self.pts[i + 1]) {
                self.warn_z_step(i, i + 1, diags);
                self.pts.remove(i + 1);
            } else {
                i += 1;
            }
        }
        if self.closed {
            while self.pts.len() > 1 && self.pts[self.pts.len() - 1].approx_eq_xy(&self.pts[0]) {
                self.warn_z_step(0, self.pts.len() - 1, diags);
                self.pts.pop();
            }
        }
    }

    fn warn_z_step(&self, keep: usize, drop: usize, diags: &mut Diagnostics) {
        let (a, b) = (self.pts[keep], self.pts[drop]);
        if (a.z() - b.z()).abs() >= EPSILON {
            diags.warn(
                OPERATION,
                format!("points {keep} ({a}) and {drop} ({b}) have the same XY but different Z, deleting point {drop}"),
            );
        }
    }

    /// Remove every corner the tool cannot follow. Returns the number of corners removed.
    ///
    /// A deletion changes the corners next to it, so the scan backs up after every edit and
    /// passes repeat until nothing changes.
    pub fn resolve(&mut self, width: f64, diags: &mut Diagnostics) -> Result<usize> {
        let mut removed = 0;
        loop {
            let mut edited = false;
            let mut v = 0;
            while v < self.pts.len() {
                let edit = match self.classify(v) {
                    Some(Corner::Reversal) if self.reversal_on_wrong_side(v) => {
                        self.remove(v)?;
                        true
                    }
                    Some(Corner::Inside) => self.cut_unreachable(v, width)?,
                    _ => false,
                };
                if !edit {
                    v += 1;
                    continue;
                }
                removed += 1;
                edited = true;
                self.dedupe(diags);
                if self.pts.len() < 2 {
                    return Err(Error::DegeneratePath {
                        points: self.pts.len(),
                    });
                }
                v = v.saturating_sub(2);
            }
            if !edited {
                return Ok(removed);
            }
        }
    }

    /// A reversal whose neighbouring turns bend away from the offset side points into the
    /// material: the tool would have to cut through it to walk around the tip.
    fn reversal_on_wrong_side(&self, v: usize) -> bool {
        let n = self.pts.len();
        let neighbours = if self.closed {
            [Some((v + n - 1) % n), Some((v + 1) % n)]
        } else {
            [v.checked_sub(1), Some(v + 1)]
        };
        let sum: f64 = neighbours
            .iter()
            .flatten()
            .filter_map(|&u| self.turn(u))
            .map(|(cross, _)| cross)
            .sum();
        sum > EPSILON
    }

    /// How far an inside corner pushes the tool back along both of its segments.
    fn reach(&self, v: usize, width: f64) -> f64 {
        match (self.classify(v), self.turn(v)) {
            (Some(Corner::Inside), Some((cross, dot))) => width * cross.abs() / (1.0 + dot),
            _ => 0.0,
        }
    }

    /// An inside corner is unreachable when the tool pushed back from it and from the corner at
    /// the other end of a segment overruns that segment. The vertex is removed so the path takes
    /// the chord, which stays on the offset side of the material.
    fn cut_unreachable(&mut self, v: usize, width: f64) -> Result<bool> {
        let Some((a, b)) = self.around(v) else {
            return Ok(false);
        };
        let n = self.pts.len();
        let reach = self.reach(v, width);
        let (prev, next) = ((v + n - 1) % n, (v + 1) % n);
        if reach + self.reach(prev, width) <= self.seg_len(a) + EPSILON
            && reach + self.reach(next, width) <= self.seg_len(b) + EPSILON
        {
            return Ok(false);
        }
        self.remove(v)?;
        Ok(true)
    }

    fn remove(&mut self, v: usize) -> Result<()> {
        if self.pts.len() <= 2 {
            return Err(Error::DegeneratePath {
                points: self.pts.len(),
            });
        }
        self.pts.remove(v);
        Ok(())
    }
}
