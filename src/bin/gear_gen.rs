//! G-Code generator for cutting involute spur gears out of plate with an end mill
use anyhow::{bail, Context, Result};
use gcode::compensate::{trace_path_comp, CompOptions};
use gcode::patterns::gear_p;
use gcode::{z, GCode, Motion};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "gear_gen", about = "A simple spur gear generator")]
struct Opt {
    /// Gear module, in mm of pitch diameter per tooth
    #[structopt(short, long, default_value = "1")]
    module: f64,

    /// Number of gear teeth
    #[structopt(short, long)]
    teeth: u32,

    /// Pressure angle, in degrees
    #[structopt(long, default_value = "20")]
    pressure_angle: f64,

    /// Thickness of the plate, in mm
    #[structopt(short, long)]
    width: f64,

    /// Max depth per pass, in mm
    #[structopt(long, default_value = "0.5")]
    max_depth: f64,

    /// Safe height for moving around, in mm
    #[structopt(long, default_value = "5")]
    safe_z: f64,

    /// Diameter of the end mill, in mm
    #[structopt(long, default_value = "1")]
    tool_dia: f64,

    /// Tool RPM
    #[structopt(long, default_value = "12000")]
    rpm: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "150")]
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

fn help_text(opt: &Opt, outside_diameter: f64) {
    println!(
        "Before cut:
        - Create plate stock of at least {}mm square, {}mm thick
        - Set home to center of stock, at the top",
        (outside_diameter + 2.0 * opt.tool_dia).ceil(),
        opt.width
    )
}

fn main() -> Result<()> {
    gcode::init_logging();
    let opt = Opt::from_args();
    if opt.module <= 0.0 {
        bail!("module must be positive, got {}", opt.module);
    }
    if opt.max_depth <= 0.0 {
        bail!("max depth must be positive, got {}", opt.max_depth);
    }
    let gear = gear_p(opt.teeth, opt.pressure_angle, 1.0 / opt.module)?;
    help_text(&opt, gear.outside_diameter);

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

    // The outline runs counter-clockwise, so the right side is the outside
    let comp = CompOptions {
        arc_in: true,
        arc_out: true,
        closed: true,
        keep_z: true,
        old_z: true,
        ..CompOptions::default()
    };
    // Take passes until we've consumed the whole depth.
    let mut depth = 0.0;
    while depth < opt.width {
        depth = (depth + opt.max_depth).min(opt.width);
        g.comment(&format!("Pass at depth {depth}"))?;
        let mut outline = gear.points.clone();
        outline[0] = outline[0].with_z(-depth);
        trace_path_comp(&mut g, opt.tool_dia / 2.0, &comp, &outline)?;
    }

    g.epilogue()?;
    g.flush()?;
    Ok(())
}
