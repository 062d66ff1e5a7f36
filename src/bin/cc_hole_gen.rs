//! G-Code generator for milling round holes with continuous curvature moves only
use anyhow::{Context, Result};
use gcode::patterns::{cc_hole, plunge_at};
use gcode::{GCode, Tuple};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "cc_hole_gen",
    about = "Mills a hole by spiralling out in arcs, without straight cuts"
)]
struct Opt {
    /// Hole diameter, in mm
    #[structopt(long)]
    hole_dia: f64,

    /// Hole depth, in mm
    #[structopt(short, long)]
    depth: f64,

    /// Radial step per pass, in mm
    #[structopt(long, default_value = "1")]
    step: f64,

    /// X of the hole center
    #[structopt(long, default_value = "0")]
    x: f64,

    /// Y of the hole center
    #[structopt(long, default_value = "0")]
    y: f64,

    /// Safe height for moving around, in mm
    #[structopt(long, default_value = "5")]
    safe_z: f64,

    /// Diameter of the end mill, in mm
    #[structopt(long, default_value = "3")]
    tool_dia: f64,

    /// Tool RPM
    #[structopt(long, default_value = "8000")]
    rpm: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "200")]
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
        - Set home to the top of the stock
        - Hole of {}mm at X={} Y={}, {}mm deep",
        opt.hole_dia, opt.x, opt.y, opt.depth
    )
}

fn main() -> Result<()> {
    gcode::init_logging();
    let opt = Opt::from_args();
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

    // Down to just above the stock, the hole returns here when done
    let center = Tuple::new(opt.x, opt.y, 0.5);
    plunge_at(&mut g, &center, opt.safe_z)?;
    cc_hole(
        &mut g,
        center,
        opt.hole_dia / 2.0,
        opt.tool_dia / 2.0,
        opt.step,
        -opt.depth,
    )?;

    g.epilogue()?;
    g.flush()?;
    Ok(())
}
