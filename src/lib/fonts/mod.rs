//! Single-line SVG fonts for engraving text.
//!
//! Glyph outlines are read from `<glyph d="M x y L x y ...">` elements, so only move-to and
//! line-to commands are understood. Coordinates are scaled to em units on load.

use crate::geometry::Tuple;
use crate::{xyz, Motion};
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::HashMap;
use std::fs::read_to_string;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

pub struct Font {
    glyphs: HashMap<char, Glyph>,
    x_height: f64,
}

struct Glyph {
    /// Connected strokes, each at least one point long.
    strokes: Vec<Vec<(f64, f64)>>,
    advance: f64,
}

impl Font {
    pub fn from_svg(path: &Path) -> Result<Self> {
        let data = read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("parsing font {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        let doc = Document::parse_with_options(
            data,
            ParsingOptions {
                allow_dtd: true,
                ..Default::default()
            },
        )?;

        let face = doc
            .descendants()
            .find(|n| n.is_element() && n.tag_name().name() == "font-face")
            .ok_or_else(|| anyhow!("no <font-face> element"))?;
        let units_per_em = number_attribute(&face, "units-per-em")?;
        if units_per_em <= 0.0 {
            bail!("units-per-em must be positive, got {units_per_em}");
        }
        let x_height = number_attribute(&face, "x-height")? / units_per_em;
        // Glyphs without their own advance use the one of the enclosing <font>
        let default_advance = face
            .parent_element()
            .filter(|f| f.has_attribute("horiz-adv-x"))
            .map(|f| number_attribute(&f, "horiz-adv-x"))
            .transpose()?;

        let mut glyphs = HashMap::new();
        for n in doc
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "glyph")
        {
            // Ligatures and unnamed glyphs cannot be typeset one char at a time
            let Some(name) = n.attribute("unicode").filter(|u| u.chars().count() == 1) else {
                continue;
            };
            let Some(c) = name.chars().next() else {
                continue;
            };
            let strokes = match n.attribute("d") {
                Some(d) => parse_strokes(d, units_per_em).with_context(|| format!("glyph {c:?}"))?,
                None => Vec::new(),
            };
            let advance = match (n.has_attribute("horiz-adv-x"), default_advance) {
                (false, Some(adv)) => adv,
                _ => number_attribute(&n, "horiz-adv-x")?,
            } / units_per_em;
            glyphs.insert(c, Glyph { strokes, advance });
        }
        tracing::debug!(glyphs = glyphs.len(), "font loaded");

        Ok(Font { glyphs, x_height })
    }

    /// Height of lower case letters, in em.
    pub fn x_height(&self) -> f64 {
        self.x_height
    }

    /// Lay out `text` on one line starting at the origin, one em high.
    ///
    /// The result is a pen plot: a point with Z > 0 is reached with the pen up, a point with
    /// Z = 0 with the pen down. Every stroke is entered and left with the pen up, and the list
    /// ends with a pen-up move to the end of the last letter.
    pub fn typeset(&self, text: &str) -> Result<Vec<Tuple>> {
        let mut out = Vec::new();
        let mut x_off = 0.0;
        for c in text.chars() {
            let glyph = self
                .glyphs
                .get(&c)
                .ok_or_else(|| anyhow!("font has no glyph for {c:?}"))?;
            for stroke in &glyph.strokes {
                let (Some(first), Some(last)) = (stroke.first(), stroke.last()) else {
                    continue;
                };
                out.push(Tuple::new(x_off + first.0, first.1, 1.0));
                out.extend(stroke.iter().map(|(x, y)| Tuple::new(x_off + x, *y, 0.0)));
                out.push(Tuple::new(x_off + last.0, last.1, 1.0));
            }
            x_off += glyph.advance;
        }
        if !text.is_empty() {
            out.push(Tuple::new(x_off, 0.0, 1.0));
        }
        Ok(out)
    }
}

fn number_attribute(node: &Node, name: &str) -> Result<f64> {
    let value = node
        .attribute(name)
        .ok_or_else(|| anyhow!("<{}> is missing {name}", node.tag_name().name()))?;
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("{name}={value:?} is not a number"))
}

/// Split an `M`/`L` path into strokes. Each `M` starts a new stroke.
fn parse_strokes(d: &str, units_per_em: f64) -> Result<Vec<Vec<(f64, f64)>>> {
    let mut strokes: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut pending: Option<f64> = None;
    let mut new_stroke = true;
    let d = d.replace(',', " ");
    for token in d.split_whitespace() {
        let number = match token.chars().next() {
            Some(cmd @ ('M' | 'm' | 'L' | 'l')) => {
                if cmd.is_ascii_lowercase() {
                    bail!("relative command {cmd} is not supported");
                }
                if pending.is_some() {
                    bail!("odd number of coordinates before {cmd}");
                }
                new_stroke = cmd == 'M';
                &token[1..]
            }
            Some(c) if c.is_ascii_alphabetic() => bail!("path command {c} is not supported"),
            _ => token,
        };
        if number.is_empty() {
            continue;
        }
        let v = number
            .parse::<f64>()
            .with_context(|| format!("bad coordinate {number:?}"))?
            / units_per_em;
        match pending.take() {
            None => pending = Some(v),
            Some(x) => {
                // Coordinates after the first pair of an M are implicit line-tos
                match strokes.last_mut() {
                    Some(stroke) if !new_stroke => stroke.push((x, v)),
                    _ => strokes.push(vec![(x, v)]),
                }
                new_stroke = false;
            }
        }
    }
    if pending.is_some() {
        bail!("dangling coordinate at end of path");
    }
    Ok(strokes)
}

/// Plot a pen-flagged point list (see [`Font::typeset`]). Pen-up points are reached with a
/// rapid at `z_up`, pen-down points with a feed at `z_down`.
///
/// The points can be scaled and moved freely before engraving, as long as Z is left alone.
pub fn engrave(m: &mut dyn Motion, points: &[Tuple], z_up: f64, z_down: f64) -> crate::Result<()> {
    for p in points {
        if p.z() > 0.0 {
            m.rapid_to(xyz(p.x(), p.y(), z_up))?;
        } else {
            m.feed_to(xyz(p.x(), p.y(), z_down))?;
        }
    }
    Ok(())
}
