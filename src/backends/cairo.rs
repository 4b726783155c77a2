//! Cairo backend behind the optional `cairo` crate feature. Shapes are built as
//! Cairo paths and painted with the colour and opacity carried by each call.

use std::io::Write;

use cairo::{Context, Format, ImageSurface, LineCap as CairoLineCap};
use png::{ColorType, Encoder as PngEncoder};
use tracing::debug;

use crate::api::*;
use crate::error::{Result, StippleError};

/// Adapter that translates canvas calls into Cairo operations.
pub struct CairoCanvas {
    ctx: Context,
    surface: Option<ImageSurface>,
}

impl CairoCanvas {
    /// Wraps an existing context; [`CairoCanvas::write_png`] is unavailable.
    pub fn new(ctx: Context) -> Self {
        Self { ctx, surface: None }
    }

    /// Creates a transparent ARGB32 image surface of the given size in pixels.
    pub fn image(width: u32, height: u32) -> Result<Self> {
        let surface = ImageSurface::create(Format::ARgb32, to_i32(width)?, to_i32(height)?)?;
        let ctx = Context::new(&surface)?;
        Ok(Self {
            ctx,
            surface: Some(surface),
        })
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Encodes the image surface as an RGBA PNG.
    pub fn write_png<W: Write>(&self, out: W) -> Result<()> {
        let surface = self.surface.as_ref().ok_or_else(|| {
            StippleError::Backend(Box::new(std::io::Error::new(
                std::io::ErrorKind::Unsupported,
                "canvas was not created over an image surface",
            )))
        })?;
        surface.flush();

        let width = surface.width() as u32;
        let height = surface.height() as u32;
        let stride = surface.stride() as usize;
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        surface
            .with_data(|data| {
                for row in data.chunks(stride).take(height as usize) {
                    for px in row[..width as usize * 4].chunks_exact(4) {
                        rgba.extend_from_slice(&unpremultiply(px));
                    }
                }
            })
            .map_err(|err| StippleError::Backend(Box::new(err)))?;

        let mut encoder = PngEncoder::new(out, width, height);
        encoder.set_color(ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&rgba)?;
        writer.finish()?;
        Ok(())
    }

    fn apply_fill(&self, fill: &Fill) {
        let (r, g, b, a) = parse_color(&fill.color);
        self.ctx
            .set_source_rgba(r, g, b, a * fill.opacity.unwrap_or(1.0));
    }

    fn apply_stroke(&self, stroke: &Stroke) {
        let (r, g, b, a) = parse_color(&stroke.color);
        self.ctx
            .set_source_rgba(r, g, b, a * stroke.opacity.unwrap_or(1.0));
        self.ctx.set_line_width(stroke.width);
        self.ctx.set_line_cap(map_line_cap(stroke.cap));
    }

    fn polygon_path(&self, points: &[Point]) {
        self.ctx.new_path();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            self.ctx.move_to(first.x, first.y);
            for p in iter {
                self.ctx.line_to(p.x, p.y);
            }
            self.ctx.close_path();
        }
    }

    fn ellipse_path(&self, cx: f64, cy: f64, rx: f64, ry: f64) -> Result<()> {
        self.ctx.new_path();
        if rx <= 0.0 || ry <= 0.0 {
            return Ok(());
        }
        self.ctx.save()?;
        self.ctx.translate(cx, cy);
        self.ctx.scale(rx, ry);
        self.ctx.arc(0.0, 0.0, 1.0, 0.0, 2.0 * std::f64::consts::PI);
        self.ctx.restore()?;
        Ok(())
    }
}

impl CanvasPolygons for CairoCanvas {
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) -> Result<()> {
        self.polygon_path(points);
        self.apply_fill(fill);
        self.ctx.fill()?;
        Ok(())
    }

    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke) -> Result<()> {
        self.polygon_path(points);
        self.apply_stroke(stroke);
        self.ctx.stroke()?;
        Ok(())
    }
}

impl CanvasEllipses for CairoCanvas {
    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, fill: &Fill) -> Result<()> {
        self.ellipse_path(cx, cy, rx, ry)?;
        self.apply_fill(fill);
        self.ctx.fill()?;
        Ok(())
    }

    fn stroke_ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        stroke: &Stroke,
    ) -> Result<()> {
        // The path is built under a scaled matrix but stroked after it is
        // restored, so the pen stays circular.
        self.ellipse_path(cx, cy, rx, ry)?;
        self.apply_stroke(stroke);
        self.ctx.stroke()?;
        Ok(())
    }
}

impl CanvasRectangles for CairoCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &Fill) -> Result<()> {
        self.ctx.new_path();
        self.ctx.rectangle(x, y, w, h);
        self.apply_fill(fill);
        self.ctx.fill()?;
        Ok(())
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stroke: &Stroke) -> Result<()> {
        self.ctx.new_path();
        self.ctx.rectangle(x, y, w, h);
        self.apply_stroke(stroke);
        self.ctx.stroke()?;
        Ok(())
    }
}

impl CanvasLines for CairoCanvas {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &Stroke) -> Result<()> {
        self.ctx.new_path();
        self.ctx.move_to(x1, y1);
        self.ctx.line_to(x2, y2);
        self.apply_stroke(stroke);
        self.ctx.stroke()?;
        Ok(())
    }
}

fn to_i32(v: u32) -> Result<i32> {
    i32::try_from(v).map_err(|err| StippleError::Backend(Box::new(err)))
}

fn map_line_cap(cap: LineCap) -> CairoLineCap {
    match cap {
        LineCap::Butt => CairoLineCap::Butt,
        LineCap::Round => CairoLineCap::Round,
        LineCap::Square => CairoLineCap::Square,
    }
}

/// Cairo ARgb32 is premultiplied, native-endian (BGRA on little-endian).
fn unpremultiply(px: &[u8]) -> [u8; 4] {
    let argb = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
    let a = (argb >> 24) as u8;
    let channel = |shift: u32| {
        let c = ((argb >> shift) & 0xff) as u16;
        if a == 0 {
            0
        } else {
            ((c * 255 + a as u16 / 2) / a as u16).min(255) as u8
        }
    };
    [channel(16), channel(8), channel(0), a]
}

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("lime", (0, 255, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("gray", (128, 128, 128)),
    ("grey", (128, 128, 128)),
    ("silver", (192, 192, 192)),
    ("maroon", (128, 0, 0)),
    ("olive", (128, 128, 0)),
    ("purple", (128, 0, 128)),
    ("teal", (0, 128, 128)),
    ("navy", (0, 0, 128)),
    ("orange", (255, 165, 0)),
];

fn rgb(r: u8, g: u8, b: u8, a: f64) -> (f64, f64, f64, f64) {
    (r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0, a)
}

fn parse_color(color: &str) -> (f64, f64, f64, f64) {
    let c = color.trim().to_ascii_lowercase();
    if let Some(hex) = c.strip_prefix('#') {
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        let nibble = |i: usize| {
            u8::from_str_radix(hex.get(i..i + 1)?, 16)
                .ok()
                .map(|n| n * 17)
        };
        let parsed = match hex.len() {
            3 => Some((nibble(0), nibble(1), nibble(2), Some(255))),
            6 => Some((byte(0), byte(2), byte(4), Some(255))),
            8 => Some((byte(0), byte(2), byte(4), byte(6))),
            _ => None,
        };
        if let Some((Some(r), Some(g), Some(b), Some(a))) = parsed {
            return rgb(r, g, b, a as f64 / 255.0);
        }
    } else if let Some(args) = c
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels = args
            .split(',')
            .map(|v| v.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0) as u8))
            .collect::<Option<Vec<_>>>();
        if let Some([r, g, b]) = channels.as_deref() {
            return rgb(*r, *g, *b, 1.0);
        }
    } else if let Some((_, (r, g, b))) = NAMED_COLORS.iter().find(|(name, _)| *name == c) {
        return rgb(*r, *g, *b, 1.0);
    }

    debug!(color, "unrecognised colour, painting black");
    (0.0, 0.0, 0.0, 1.0)
}
