//! G-Code generator for clearing a slot around a regular polygon with trochoidal milling
use anyhow::{bail, Context, Result};
use gcode::geometry::to_rad;
use gcode::patterns::{trace_path, trochoid_move};
use gcode::{z, GCode, Motion, Tuple};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "trochoid_gen",
    about = "Cuts a polygon outline with trochoidal moves, then a finishing pass"
)]
struct Opt {
    /// Number of polygon sides
    #[structopt(long, default_value = "6")]
    sides: u32,

    /// Distance from the center to the corners, in mm
    #[structopt(long, default_value = "30")]
    radius: f64,

    /// Cut depth, in mm
    #[structopt(short, long)]
    depth: f64,

    /// Radius of the trochoid loops, in mm. Must be larger than 1
    #[structopt(long, default_value = "2")]
    loop_radius: f64,

    /// Advance per loop, in mm
    #[structopt(long, default_value = "0.5")]
    increment: f64,

    /// Safe height for moving around, in mm
    #[structopt(long, default_value = "5")]
    safe_z: f64,

    /// Diameter of the end mill, in mm
    #[structopt(long, default_value = "6")]
    tool_dia: f64,

    /// Tool RPM
    #[structopt(long, default_value = "10000")]
    rpm: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "1200")]
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

fn polygon(sides: u32, radius: f64) -> Vec<Tuple> {
    (0..sides)
        .map(|i| {
            let a = to_rad(f64::from(i) * 360.0 / f64::from(sides));
            Tuple::xy(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

fn help_text(opt: &Opt) {
    println!(
        "Before cut:
        - Create stock at least {}mm across
        - Set home to center of stock, at the top",
        2.0 * (opt.radius + opt.loop_radius + opt.tool_dia)
    )
}

fn main() -> Result<()> {
    gcode::init_logging();
    let opt = Opt::from_args();
    if opt.sides < 3 {
        bail!("a polygon needs at least 3 sides, got {}", opt.sides);
    }
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
    g.path_mode(false)?;

    let corners = polygon(opt.sides, opt.radius);
    for (i, start) in corners.iter().enumerate() {
        let end = corners[(i + 1) % corners.len()];
        trochoid_move(&mut g, *start, end, -opt.depth, opt.loop_radius, opt.increment)?;
    }

    g.path_mode(true)?;
    trace_path(&mut g, -opt.depth, None, &corners)?;

    g.epilogue()?;
    g.flush()?;
    Ok(())
}
