//! Trace a polyline with the tool centre offset from it, so the cutter edge follows the line.
//!
//! Points are given as "x, y, z" entries. Empty or `-` fields keep the previous value, so
//! `tool_comp -o out.nc -- "0,0,-1" "20,-,-" "-,10,-" "0,-,-"` traces three sides of a box at a
//! depth of 1mm.
use anyhow::{Context, Result};
use gcode::compensate::{trace_path_comp, CompOptions, Side};
use gcode::geometry::path;
use gcode::{z, GCode, Motion};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "tool_comp", about = "Cutter compensated path tracing")]
struct Opt {
    /// Path points, as "x, y, z"
    #[structopt(required = true, min_values = 2)]
    points: Vec<String>,

    /// Diameter of the cutter, in mm. The path is offset by half of this
    #[structopt(long, default_value = "6")]
    tool_dia: f64,

    /// Cut on the left of the path, instead of the right
    #[structopt(long)]
    left: bool,

    /// Connect the last point back to the first
    #[structopt(long)]
    closed: bool,

    /// Arc into the path
    #[structopt(long)]
    arc_in: bool,

    /// Arc out of the path
    #[structopt(long)]
    arc_out: bool,

    /// Cut the whole path at the depth of its first point
    #[structopt(long)]
    keep_z: bool,

    /// Don't warn about corners the tool cannot reach
    #[structopt(long)]
    quiet: bool,

    /// Safe height for moving around, in mm
    #[structopt(long, default_value = "5")]
    safe_z: f64,

    /// Tool RPM
    #[structopt(long, default_value = "8000")]
    rpm: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "300")]
    feed: f64,

    /// Name for the job
    #[structopt(short, long)]
    name: Option<String>,

    /// Tool number for the cut
    #[structopt(long, default_value = "1")]
    tool: u32,

    /// Output file for the resulting G code
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    #[structopt(long)]
    coolant: bool,
}

fn help_text(opt: &Opt) {
    println!(
        "Before cut:
        - Set home to the path origin, at the top of the stock
        - Cutter is {}mm, cutting on the {} side of the path",
        opt.tool_dia,
        if opt.left { "left" } else { "right" }
    )
}

fn main() -> Result<()> {
    gcode::init_logging();
    let opt = Opt::from_args();
    let entries: Vec<&str> = opt.points.iter().map(String::as_str).collect();
    let points = path(&entries).context("bad path")?;
    help_text(&opt);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&opt.output)
        .with_context(|| format!("opening {}", opt.output.display()))?;
    let mut g = GCode::new(BufWriter::new(file));

    g.prologue(
        opt.name.as_deref(),
        opt.tool,
        &format!("T{} D={} end mill", opt.tool, opt.tool_dia),
        opt.rpm,
        opt.coolant,
    )?;
    g.feedrate(opt.feed)?;
    g.rapid_to(z(opt.safe_z))?;

    let comp = CompOptions {
        side: if opt.left { Side::Left } else { Side::Right },
        arc_in: opt.arc_in,
        arc_out: opt.arc_out,
        closed: opt.closed,
        keep_z: opt.keep_z,
        old_z: true,
        quiet: opt.quiet,
    };
    let report = trace_path_comp(&mut g, opt.tool_dia / 2.0, &comp, &points)?;
    if report.removed_corners > 0 {
        println!("{} corner(s) were too tight for the cutter", report.removed_corners);
    }

    g.epilogue()?;
    g.flush()?;
    Ok(())
}
