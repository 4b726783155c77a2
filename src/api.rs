//! The drawing surface the shape renderer paints onto. These traits describe
//! only the primitives; rasterization, colour allocation and blending belong
//! to whatever backend implements them.

use crate::error::Result;

/// A position in device pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Linear interpolation towards `other`; `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            (1.0 - t) * self.x + t * other.x,
            (1.0 - t) * self.y + t * other.y,
        )
    }

    /// Squared Euclidean distance.
    pub fn distance2(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Point::new(x, y)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

impl LineCap {
    /// Parses a `stroke-linecap` keyword. Unknown keywords fall back to `Butt`.
    pub fn from_keyword(keyword: &str) -> Self {
        match keyword.trim().to_ascii_lowercase().as_str() {
            "round" => LineCap::Round,
            "square" => LineCap::Square,
            _ => LineCap::Butt,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }
}

/// Paint for the interior of a shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Fill {
    /// Colour name or hex string, passed through to the backend untouched.
    pub color: String,
    /// `None` means no opacity was specified (fully opaque).
    pub opacity: Option<f64>,
}

impl Fill {
    pub fn new(color: impl Into<String>) -> Self {
        Self {
            color: color.into(),
            opacity: None,
        }
    }

    pub fn with_opacity(mut self, opacity: Option<f64>) -> Self {
        self.opacity = opacity;
        self
    }
}

/// Paint for the outline of a shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Stroke {
    pub color: String,
    pub width: f64,
    pub opacity: Option<f64>,
    pub cap: LineCap,
}

impl Stroke {
    pub fn new(color: impl Into<String>, width: f64) -> Self {
        Self {
            color: color.into(),
            width,
            opacity: None,
            cap: LineCap::Butt,
        }
    }

    pub fn with_opacity(mut self, opacity: Option<f64>) -> Self {
        self.opacity = opacity;
        self
    }

    pub fn with_cap(mut self, cap: LineCap) -> Self {
        self.cap = cap;
        self
    }
}

pub trait CanvasPolygons {
    /// Fills the closed polygon through `points`.
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) -> Result<()>;
    /// Outlines the closed polygon through `points`, including the closing edge.
    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke) -> Result<()>;
}

pub trait CanvasEllipses {
    /// Fills an axis-aligned ellipse centred on (cx, cy).
    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, fill: &Fill) -> Result<()>;
    /// Outlines an axis-aligned ellipse centred on (cx, cy).
    fn stroke_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, stroke: &Stroke)
    -> Result<()>;
}

pub trait CanvasRectangles {
    /// Fills the rectangle with its top-left corner at (x, y).
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &Fill) -> Result<()>;
    /// Outlines the rectangle with its top-left corner at (x, y).
    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stroke: &Stroke) -> Result<()>;
}

pub trait CanvasLines {
    /// Draws one segment; the end caps follow `stroke.cap`.
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &Stroke) -> Result<()>;
}

/// Everything the shape renderer needs from a drawing surface.
pub trait ShapeCanvas: CanvasPolygons + CanvasEllipses + CanvasRectangles + CanvasLines {}

impl<T> ShapeCanvas for T where T: CanvasPolygons + CanvasEllipses + CanvasRectangles + CanvasLines {}
