//! The motion verbs every toolpath generator drives.
//!
//! Generators only talk to [`Motion`]; [`crate::GCode`] turns the verbs into program text and
//! [`Recorder`] keeps them as values so a path can be inspected or previewed.

use crate::geometry::{Tuple, EPSILON};
use crate::{Axes, Error, Result};

/// Construction plane for arcs and circles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Plane {
    #[default]
    XY,
    XZ,
    YZ,
}

impl Plane {
    pub fn gcode(&self) -> &'static str {
        match self {
            Plane::XY => "G17",
            Plane::XZ => "G18",
            Plane::YZ => "G19",
        }
    }

    /// The two in-plane axis indices followed by the out-of-plane one.
    pub fn axes(&self) -> (usize, usize, usize) {
        match self {
            Plane::XY => (0, 1, 2),
            Plane::XZ => (0, 2, 1),
            Plane::YZ => (1, 2, 0),
        }
    }

    /// The part of `v` perpendicular to the plane.
    pub fn normal_part(&self, v: &Tuple) -> Tuple {
        let (_, _, c) = self.axes();
        let mut out = [0.0; 3];
        out[c] = v.get(c);
        Tuple::new(out[0], out[1], out[2])
    }

    /// The part of `v` inside the plane.
    pub fn in_plane_part(&self, v: &Tuple) -> Tuple {
        *v - self.normal_part(v)
    }
}

/// Abstract machine motion. The current position is threaded through every call, so each move
/// is relative to whatever the previous one left behind.
pub trait Motion {
    fn position(&self) -> Tuple;

    /// Rapid (non-cutting) move of the named axes.
    fn rapid_to(&mut self, to: Axes) -> Result<()>;

    /// Cutting move of the named axes at the current feed rate.
    fn feed_to(&mut self, to: Axes) -> Result<()>;

    /// Arc from the current position to `end`. A positive radius takes the short way round, a
    /// negative one the long way. `turns` adds full revolutions.
    fn arc_to(&mut self, end: Tuple, radius: f64, turns: u32, clockwise: bool) -> Result<()>;

    fn arc_relative_to(
        &mut self,
        offset: Tuple,
        radius: f64,
        turns: u32,
        clockwise: bool,
    ) -> Result<()> {
        let end = self.position() + offset;
        self.arc_to(end, radius, turns, clockwise)
    }

    /// Full circle around `position() + center_offset`. The out-of-plane part of the offset is
    /// travelled during the circle, giving a helix.
    fn circle_relative(&mut self, center_offset: Tuple, turns: u32, clockwise: bool) -> Result<()>;

    fn dwell(&mut self, seconds: f64) -> Result<()>;

    fn comment(&mut self, text: &str) -> Result<()>;

    /// Exact stop (`true`) or path blending (`false`).
    fn path_mode(&mut self, exact: bool) -> Result<()>;
}

/// One recorded motion verb.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    Rapid(Tuple),
    Feed(Tuple),
    Arc {
        start: Tuple,
        end: Tuple,
        radius: f64,
        turns: u32,
        clockwise: bool,
    },
    Circle {
        center: Tuple,
        end: Tuple,
        turns: u32,
        clockwise: bool,
    },
    Dwell(f64),
    Comment(String),
    PathMode(bool),
}

impl Op {
    /// Where the tool is after this operation, if it moves.
    pub fn end(&self) -> Option<Tuple> {
        match self {
            Op::Rapid(p) | Op::Feed(p) => Some(*p),
            Op::Arc { end, .. } | Op::Circle { end, .. } => Some(*end),
            _ => None,
        }
    }
}

/// A [`Motion`] that keeps every operation instead of writing text.
///
/// Moves that would not change the position are dropped, matching what [`crate::GCode`] emits.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    pub ops: Vec<Op>,
    pos: Tuple,
    plane: Plane,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(start: Tuple) -> Self {
        Recorder {
            pos: start,
            ..Self::default()
        }
    }

    pub fn with_plane(mut self, plane: Plane) -> Self {
        self.plane = plane;
        self
    }

    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            Op::Comment(s) => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn arcs(&self) -> impl Iterator<Item = &Op> {
        self.ops.iter().filter(|op| matches!(op, Op::Arc { .. }))
    }

    fn linear(&mut self, to: Axes, rapid: bool) {
        let target = to.apply(self.pos);
        if target.approx_eq(&self.pos) {
            return;
        }
        self.pos = target;
        self.ops.push(if rapid {
            Op::Rapid(target)
        } else {
            Op::Feed(target)
        });
    }
}

impl Motion for Recorder {
    fn position(&self) -> Tuple {
        self.pos
    }

    fn rapid_to(&mut self, to: Axes) -> Result<()> {
        self.linear(to, true);
        Ok(())
    }

    fn feed_to(&mut self, to: Axes) -> Result<()> {
        self.linear(to, false);
        Ok(())
    }

    fn arc_to(&mut self, end: Tuple, radius: f64, turns: u32, clockwise: bool) -> Result<()> {
        if radius.abs() < EPSILON {
            return Err(Error::ZeroRadius);
        }
        self.ops.push(Op::Arc {
            start: self.pos,
            end,
            radius,
            turns,
            clockwise,
        });
        self.pos = end;
        Ok(())
    }

    fn circle_relative(&mut self, center_offset: Tuple, turns: u32, clockwise: bool) -> Result<()> {
        let center = self.pos + self.plane.in_plane_part(&center_offset);
        let end = self.pos + self.plane.normal_part(&center_offset);
        self.ops.push(Op::Circle {
            center,
            end,
            turns,
            clockwise,
        });
        self.pos = end;
        Ok(())
    }

    fn dwell(&mut self, seconds: f64) -> Result<()> {
        self.ops.push(Op::Dwell(seconds));
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.ops.push(Op::Comment(text.to_string()));
        Ok(())
    }

    fn path_mode(&mut self, exact: bool) -> Result<()> {
        self.ops.push(Op::PathMode(exact));
        Ok(())
    }
}
