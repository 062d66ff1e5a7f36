use std::io::{self, Write};

pub mod arcs;
pub mod compensate;
pub mod drill;
mod error;
pub mod fonts;
pub mod geometry;
pub mod motion;
pub mod patterns;

pub use error::{Diagnostics, Error, Result};
pub use geometry::{Tuple, M4};
pub use motion::{Motion, Op, Plane, Recorder};

use geometry::EPSILON;
use tracing_subscriber::EnvFilter;

/// Log to stderr for the generators. Warnings only, unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

/// A partial position: only the axes that are `Some` take part in a move.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Axes {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
}

impl Axes {
    pub fn get(&self, axis: usize) -> Option<f64> {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none()
    }

    /// `base` with the named axes replaced.
    pub fn apply(&self, base: Tuple) -> Tuple {
        Tuple::new(
            self.x.unwrap_or(base.x()),
            self.y.unwrap_or(base.y()),
            self.z.unwrap_or(base.z()),
        )
    }
}

impl From<Tuple> for Axes {
    fn from(p: Tuple) -> Self {
        xyz(p.x(), p.y(), p.z())
    }
}

pub fn x(x: f64) -> Axes {
    Axes {
        x: Some(x),
        ..Axes::default()
    }
}

pub fn y(y: f64) -> Axes {
    Axes {
        y: Some(y),
        ..Axes::default()
    }
}

pub fn z(z: f64) -> Axes {
    Axes {
        z: Some(z),
        ..Axes::default()
    }
}

pub fn xy(x: f64, y: f64) -> Axes {
    Axes {
        x: Some(x),
        y: Some(y),
        z: None,
    }
}

pub fn xz(x: f64, z: f64) -> Axes {
    Axes {
        x: Some(x),
        y: None,
        z: Some(z),
    }
}

pub fn yz(y: f64, z: f64) -> Axes {
    Axes {
        x: None,
        y: Some(y),
        z: Some(z),
    }
}

pub fn xyz(x: f64, y: f64, z: f64) -> Axes {
    Axes {
        x: Some(x),
        y: Some(y),
        z: Some(z),
    }
}

/// The XY part of a point, for moves that must leave Z alone.
pub fn xy_of(p: &Tuple) -> Axes {
    xy(p.x(), p.y())
}

const AXIS_NAMES: [&str; 3] = ["X", "Y", "Z"];
const OFFSET_NAMES: [&str; 3] = ["I", "J", "K"];

/// Writes G-code text for a sequence of motion verbs.
///
/// The writer keeps track of where the machine is. Only axes that change are written, apart
/// from axes whose position is not known yet (at the start, and after going home) which are
/// always written when a move names them.
pub struct GCode<W: Write> {
    out: W,
    pos: Tuple,
    known: [bool; 3],
    plane: Plane,
    feed: Option<f64>,
}

impl<W: Write> GCode<W> {
    pub fn new(out: W) -> Self {
        GCode {
            out,
            pos: Tuple::zero(),
            known: [false; 3],
            plane: Plane::XY,
            feed: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn active_plane(&self) -> Plane {
        self.plane
    }

    pub fn set_plane(&mut self, plane: Plane) -> Result<()> {
        writeln!(self.out, "{}", plane.gcode())?;
        self.plane = plane;
        Ok(())
    }

    /// Set the (modal) feed rate used by every following cutting move.
    pub fn feedrate(&mut self, feed: f64) -> Result<()> {
        if feed <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "feed rate",
                value: feed,
                reason: "must be positive",
            });
        }
        write!(self.out, "G1")?;
        g_val(&mut self.out, "F", Some(feed))?;
        writeln!(self.out)?;
        self.feed = Some(feed);
        Ok(())
    }

    /// Setup boilerplate: job name and tool as comments, modal setup, tool change and spindle on.
    pub fn prologue(
        &mut self,
        name: Option<&str>,
        tool: u32,
        tool_comment: &str,
        rpm: f64,
        coolant: bool,
    ) -> Result<()> {
        // Print out the name as a comment on the first line, if set
        if let Some(name) = name {
            self.comment(name)?;
        }
        // Comment with tool information
        self.comment(tool_comment)?;

        // Preamble to set the machine into a reasonable mode
        let preamble_str = "
G90 (Absolute)
G54 (G54 Datum)
G17 (X-Y Plane)
G40 (No cutter compensation)
G80 (No cycles)
G94 (Feed per minute)
G91.1 (Arc centers relative)
G49 (No tool length compensation)
M9 (Coolant off)

G21 (Metric)

G30 (Go Home Before Starting)
    ";
        write!(self.out, "{preamble_str}\n\n")?;
        self.plane = Plane::XY;
        self.known = [false; 3];
        self.tool_change(tool, rpm)?;

        // If chosen, start coolant flowing
        if coolant {
            writeln!(self.out, "M8")?;
        }

        Ok(())
    }

    pub fn tool_change(&mut self, tool: u32, rpm: f64) -> Result<()> {
        // First, turn off the spindle
        writeln!(self.out, "M5 (Spindle off)")?;
        // Go home
        writeln!(self.out, "G30 (Go Home)")?;
        self.known = [false; 3];
        // Then do a stop for the user to change the tool
        writeln!(self.out, "M0 (stop for tool change)")?;
        // Print the tool mode preamble, choosing the tool,
        // enabling length compensation,
        // and executing the tool change cycle
        writeln!(self.out, "T{tool} G43 H{tool} M6")?;

        // Print the Speed preamble, and turn on the spindle
        writeln!(self.out, "S{rpm} M3")?;

        Ok(())
    }

    /// Teardown boilerplate: home, coolant and spindle off, end of program.
    pub fn epilogue(&mut self) -> Result<()> {
        writeln!(self.out, "G30 (Go Home)")?;
        writeln!(self.out, "M9 (Coolant off)")?;
        writeln!(self.out, "M5 (Spindle off)")?;
        writeln!(self.out, "M30")?;
        self.known = [false; 3];
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn changed(&self, axis: usize, v: f64) -> bool {
        !self.known[axis] || (v - self.pos.get(axis)).abs() >= EPSILON
    }

    fn g_move_linear(&mut self, g: &str, to: Axes) -> Result<()> {
        let mut words = [None; 3];
        for (axis, word) in words.iter_mut().enumerate() {
            if let Some(v) = to.get(axis) {
                if self.changed(axis, v) {
                    *word = Some(v);
                }
            }
        }
        if words.iter().all(Option::is_none) {
            return Ok(());
        }
        write!(self.out, "{g}")?;
        for (axis, word) in words.iter().enumerate() {
            g_val(&mut self.out, AXIS_NAMES[axis], *word)?;
        }
        writeln!(self.out)?;
        self.moved_to(to.apply(self.pos), &words);
        Ok(())
    }

    /// Endpoint words of an arc: both in-plane axes, plus the helix axis when it changes.
    fn g_arc_end(&mut self, end: &Tuple) -> Result<[Option<f64>; 3]> {
        let (a, b, c) = self.plane.axes();
        let mut words = [None; 3];
        words[a] = Some(end.get(a));
        words[b] = Some(end.get(b));
        if self.changed(c, end.get(c)) {
            words[c] = Some(end.get(c));
        }
        for (axis, word) in words.iter().enumerate() {
            g_val(&mut self.out, AXIS_NAMES[axis], *word)?;
        }
        Ok(words)
    }

    fn moved_to(&mut self, p: Tuple, words: &[Option<f64>; 3]) {
        self.pos = p;
        for (axis, word) in words.iter().enumerate() {
            if word.is_some() {
                self.known[axis] = true;
            }
        }
    }

    fn require_feed(&self) -> Result<()> {
        if self.feed.is_none() {
            return Err(Error::MissingFeedrate);
        }
        Ok(())
    }
}

impl<W: Write> Motion for GCode<W> {
    fn position(&self) -> Tuple {
        self.pos
    }

    fn rapid_to(&mut self, to: Axes) -> Result<()> {
        self.g_move_linear("G0", to)
    }

    fn feed_to(&mut self, to: Axes) -> Result<()> {
        self.require_feed()?;
        self.g_move_linear("G1", to)
    }

    /// G2/G3 arc in radius format. Extra turns are written as the `P` word (P1 is a plain arc).
    fn arc_to(&mut self, end: Tuple, radius: f64, turns: u32, clockwise: bool) -> Result<()> {
        if radius.abs() < EPSILON {
            return Err(Error::ZeroRadius);
        }
        self.require_feed()?;
        write!(self.out, "{}", if clockwise { "G2" } else { "G3" })?;
        let words = self.g_arc_end(&end)?;
        g_val(&mut self.out, "R", Some(radius))?;
        if turns > 0 {
            write!(self.out, " P{}", turns + 1)?;
        }
        writeln!(self.out)?;
        self.moved_to(end, &words);
        Ok(())
    }

    /// Full circle in center format (offsets from the current position).
    fn circle_relative(&mut self, center_offset: Tuple, turns: u32, clockwise: bool) -> Result<()> {
        self.require_feed()?;
        let (a, b, _) = self.plane.axes();
        let end = self.pos + self.plane.normal_part(&center_offset);
        write!(self.out, "{}", if clockwise { "G2" } else { "G3" })?;
        let words = self.g_arc_end(&end)?;
        g_val(&mut self.out, OFFSET_NAMES[a], Some(center_offset.get(a)))?;
        g_val(&mut self.out, OFFSET_NAMES[b], Some(center_offset.get(b)))?;
        if turns > 0 {
            write!(self.out, " P{}", turns + 1)?;
        }
        writeln!(self.out)?;
        self.moved_to(end, &words);
        Ok(())
    }

    fn dwell(&mut self, seconds: f64) -> Result<()> {
        write!(self.out, "G4")?;
        g_val(&mut self.out, "P", Some(seconds))?;
        writeln!(self.out)?;
        Ok(())
    }

    fn comment(&mut self, s: &str) -> Result<()> {
        // Comments cannot nest
        let s: String = s
            .chars()
            .map(|c| match c {
                '(' => '[',
                ')' => ']',
                c => c,
            })
            .collect();
        writeln!(self.out, "({s})")?;
        Ok(())
    }

    fn path_mode(&mut self, exact: bool) -> Result<()> {
        if exact {
            writeln!(self.out, "G61 (Exact path mode)")?;
        } else {
            writeln!(self.out, "G64 (Path blending)")?;
        }
        Ok(())
    }
}

/// Emit a gcode parameter value, if `ov` is `Some`.
/// To make the gcode human-friendly, numbers that round nicely are printed in their minimal form.
fn g_val(file: &mut dyn Write, name: &str, ov: Option<f64>) -> io::Result<()> {
    if let Some(v) = ov {
        // Adding zero turns -0 into 0
        let v = (v * 1e4).round() / 1e4 + 0.0;
        if v.fract() == 0.0 {
            write!(file, " {name}{v}.")
        } else {
            write!(file, " {name}{v:.4}")
        }
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(g: GCode<Vec<u8>>) -> String {
        String::from_utf8(g.into_inner()).unwrap()
    }

    #[test]
    fn test_g_val_formatting() {
        let mut out = Vec::new();
        g_val(&mut out, "X", Some(10.0)).unwrap();
        g_val(&mut out, "Y", Some(-0.00001)).unwrap();
        g_val(&mut out, "Z", Some(2.8)).unwrap();
        g_val(&mut out, "R", Some(0.6 + 2.2 + 0.2)).unwrap();
        g_val(&mut out, "F", None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " X10. Y0. Z2.8000 R3.");
    }

    #[test]
    fn test_only_changed_axes_are_written() {
        let mut g = GCode::new(Vec::new());
        g.rapid_to(xyz(-145.0, -30.0, -1.0)).unwrap();
        g.feedrate(400.0).unwrap();
        g.feed_to(z(0.0)).unwrap();
        g.feed_to(xyz(-139.5, 30.0, 0.0)).unwrap();
        g.feed_to(z(-1.0)).unwrap();
        g.feed_to(z(-1.0)).unwrap();
        assert_eq!(
            text(g),
            "G0 X-145. Y-30. Z-1.\nG1 F400.\nG1 Z0.\nG1 X-139.5000 Y30.\nG1 Z-1.\n"
        );
    }

    #[test]
    fn test_first_move_writes_only_named_axes() {
        let mut g = GCode::new(Vec::new());
        g.rapid_to(z(5.0)).unwrap();
        g.rapid_to(xy(0.0, 0.0)).unwrap();
        g.rapid_to(xyz(0.0, 0.0, 5.0)).unwrap();
        assert_eq!(text(g), "G0 Z5.\nG0 X0. Y0.\n");
    }

    #[test]
    fn test_feed_without_feedrate_is_an_error() {
        let mut g = GCode::new(Vec::new());
        assert!(matches!(g.feed_to(x(1.0)), Err(Error::MissingFeedrate)));
        assert!(matches!(
            g.feedrate(0.0),
            Err(Error::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_arcs_and_circles() {
        let mut g = GCode::new(Vec::new());
        g.rapid_to(xyz(0.0, 0.0, 0.0)).unwrap();
        g.feedrate(100.0).unwrap();
        g.arc_to(Tuple::xy(2.0, 0.0), 1.0, 0, true).unwrap();
        g.arc_relative_to(Tuple::xy(-2.0, 0.0), -1.5, 2, false).unwrap();
        g.circle_relative(Tuple::new(1.0, 0.0, -1.0), 0, true).unwrap();
        assert!(matches!(g.arc_to(Tuple::zero(), 0.0, 0, true), Err(Error::ZeroRadius)));
        assert_eq!(
            text(g),
            "G0 X0. Y0. Z0.\nG1 F100.\nG2 X2. Y0. R1.\nG3 X0. Y0. R-1.5000 P3\nG2 X0. Y0. Z-1. I1. J0.\n"
        );
    }

    #[test]
    fn test_arcs_in_the_xz_plane_use_i_and_k() {
        let mut g = GCode::new(Vec::new());
        g.rapid_to(xyz(0.0, 0.0, 0.0)).unwrap();
        g.set_plane(Plane::XZ).unwrap();
        g.feedrate(100.0).unwrap();
        g.circle_relative(Tuple::new(0.0, 1.0, 2.0), 0, false).unwrap();
        assert_eq!(text(g), "G0 X0. Y0. Z0.\nG18\nG1 F100.\nG3 X0. Y1. Z0. I0. K2.\n");
    }

    #[test]
    fn test_comments_dwell_and_path_mode() {
        let mut g = GCode::new(Vec::new());
        g.comment("drill (peck)").unwrap();
        g.dwell(0.5).unwrap();
        g.path_mode(true).unwrap();
        g.path_mode(false).unwrap();
        assert_eq!(
            text(g),
            "(drill [peck])\nG4 P0.5000\nG61 (Exact path mode)\nG64 (Path blending)\n"
        );
    }

    #[test]
    fn test_going_home_forgets_the_position() {
        let mut g = GCode::new(Vec::new());
        g.rapid_to(xyz(1.0, 2.0, 3.0)).unwrap();
        g.epilogue().unwrap();
        g.rapid_to(xyz(1.0, 2.0, 3.0)).unwrap();
        let s = text(g);
        assert_eq!(s.matches("G0 X1. Y2. Z3.").count(), 2);
    }

    #[test]
    fn test_prologue_contains_tool_change() {
        let mut g = GCode::new(Vec::new());
        g.prologue(Some("job"), 3, "T3 D=6 end mill", 8000.0, true).unwrap();
        let s = text(g);
        assert!(s.starts_with("(job)\n(T3 D=6 end mill)\n"));
        assert!(s.contains("T3 G43 H3 M6\nS8000 M3\nM8\n"));
    }
}
