//! G-Code generator for engraving a line of text with a single-line SVG font
use anyhow::{bail, Context, Result};
use gcode::fonts::{engrave, Font};
use gcode::{z, GCode, Motion, M4};
use std::fs::OpenOptions;
use std::io::BufWriter;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "engrave_gen", about = "Engraves text using an SVG font")]
struct Opt {
    /// The text to engrave
    text: String,

    /// SVG font file
    #[structopt(short, long, parse(from_os_str))]
    font: PathBuf,

    /// Height of lower case letters, in mm
    #[structopt(long, default_value = "5")]
    height: f64,

    /// Slant of the letters, as a shear of X by Y
    #[structopt(long, default_value = "0")]
    slant: f64,

    /// X of the start of the baseline
    #[structopt(long, default_value = "0")]
    x: f64,

    /// Y of the start of the baseline
    #[structopt(long, default_value = "0")]
    y: f64,

    /// Engraving depth, in mm
    #[structopt(short, long, default_value = "0.1")]
    depth: f64,

    /// Height for moving between strokes, in mm
    #[structopt(long, default_value = "1")]
    safe_z: f64,

    /// Engraving tool description
    #[structopt(long, default_value = "30 degree V bit")]
    tool_desc: String,

    /// Tool RPM
    #[structopt(long, default_value = "12000")]
    rpm: f64,

    /// Feed rate, in mm/min
    #[structopt(long, default_value = "400")]
    feed: f64,

    /// Name for the job
    #[structopt(short, long)]
    name: Option<String>,

    /// Tool number for the cut
    #[structopt(long, default_value = "3")]
    tool: u32,

    /// Output file for the resulting G code
    #[structopt(short, long, parse(from_os_str))]
    output: PathBuf,

    #[structopt(long)]
    coolant: bool,
}

fn help_text(opt: &Opt, length: f64) {
    println!(
        "Before cut:
        - Text is {:.1}mm long, starting at X={} Y={}
        - Set home to the top of the stock",
        length, opt.x, opt.y
    )
}

fn main() -> Result<()> {
    gcode::init_logging();
    let opt = Opt::from_args();
    let font = Font::from_svg(&opt.font)?;
    if font.x_height() <= 0.0 {
        bail!("font {} has no x-height to scale by", opt.font.display());
    }

    // Scale X and Y only, Z carries the pen state
    let sf = opt.height / font.x_height();
    let xfm = M4::scaling(sf, sf, 1.0)
        .shear(opt.slant, 0.0, 0.0, 0.0, 0.0, 0.0)
        .translate(opt.x, opt.y, 0.0);
    let points = xfm.transform(&font.typeset(&opt.text)?);
    let length = points.last().map_or(0.0, |p| p.x() - opt.x);
    help_text(&opt, length);

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
        &format!("T{} {}", opt.tool, opt.tool_desc),
        opt.rpm,
        opt.coolant,
    )?;
    g.feedrate(opt.feed)?;
    g.rapid_to(z(opt.safe_z))?;
    g.comment(&format!("Engraving '{}'", opt.text))?;
    engrave(&mut g, &points, opt.safe_z, -opt.depth)?;

    g.epilogue()?;
    g.flush()?;
    Ok(())
}
