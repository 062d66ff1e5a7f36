//! G-Code generator for drilling a row of holes with (optionally pecked) drill cycles
use anyhow::{Context, Result};
use gcode::drill::{canned_drill, canned_drill_peck};
use gcode::{z, GCode, Motion, Tuple};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "canned_gen", about = "Drills a row of holes along X")]
struct Opt {
    /// Number of holes
    #[structopt(short, long, default_value = "5")]
    count: u32,

    /// Distance between holes, in mm
    #[structopt(long, default_value = "10")]
    spacing: f64,

    /// Hole depth, in mm
    #[structopt(short, long)]
    depth: f64,

    /// Height of the R-plane, where the drill starts cutting, in mm
    #[structopt(long, default_value = "1")]
    retract_z: f64,

    /// Peck increment, in mm. Holes are drilled in one go without it
    #[structopt(long)]
    peck: Option<f64>,

    /// Dwell at the bottom of each hole, in seconds. Ignored when pecking
    #[structopt(long)]
    dwell: Option<f64>,

    /// Go back up to the safe height between holes
    #[structopt(long)]
    old_z: bool,

    /// Safe height for moving around, in mm
    #[structopt(long, default_value = "5")]
    safe_z: f64,

    /// Diameter of the drill, in mm
    #[structopt(long, default_value = "3")]
    drill_dia: f64,

    /// Drill RPM
    #[structopt(long, default_value = "2000")]
    rpm: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "100")]
    feed: f64,

    /// Name for the job
    #[structopt(short, long)]
    name: Option<String>,

    /// Tool number for the drill
    #[structopt(long, default_value = "2")]
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
        - Stock at least {}mm long
        - Set home to the center of the first hole, at the top of the stock",
        f64::from(opt.count.saturating_sub(1)) * opt.spacing + opt.drill_dia
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
        &format!("T{} D={} drill", opt.tool, opt.drill_dia),
        opt.rpm,
        opt.coolant,
    )?;
    g.feedrate(opt.feed)?;
    g.rapid_to(z(opt.safe_z))?;

    let holes: Vec<Tuple> = (0..opt.count)
        .map(|i| Tuple::new(f64::from(i) * opt.spacing, 0.0, -opt.depth))
        .collect();
    let report = match opt.peck {
        Some(delta) => canned_drill_peck(&mut g, opt.retract_z, delta, opt.old_z, &holes)?,
        None => canned_drill(&mut g, opt.retract_z, opt.dwell, opt.old_z, &holes)?,
    };
    println!("Drilled {} of {} holes", report.drilled, holes.len());

    g.epilogue()?;
    g.flush()?;
    Ok(())
}
