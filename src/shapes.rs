//! Maps elements to drawing calls.
//!
//! [`render`] walks a [`ShapeElement`] tree, resolves every element's style
//! (including attributes inherited from enclosing groups) and issues the
//! matching canvas primitives.

use tracing::{debug, trace, warn};

use crate::api::{Fill, LineCap, Point, ShapeCanvas, Stroke};
use crate::config::RenderOptions;
use crate::element::ShapeElement;
use crate::error::{Result, StippleError};
use crate::path::{self, PathPaint};
use crate::style::{self, Channel, RawAttributes, StyleAttributes, StyleValue};

const DEFAULT_STROKE_WIDTH: f64 = 1.0;
const DEFAULT_PATH_FILL: &str = "black";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    /// `<svg>`: children are drawn, its own attributes are not passed down.
    Document,
    Group,
    Rect,
    Circle,
    Ellipse,
    Line,
    Polygon,
    Polyline,
    Path,
}

impl ShapeKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag.to_ascii_lowercase().as_str() {
            "svg" => ShapeKind::Document,
            "g" => ShapeKind::Group,
            "rect" => ShapeKind::Rect,
            "circle" => ShapeKind::Circle,
            "ellipse" => ShapeKind::Ellipse,
            "line" => ShapeKind::Line,
            "polygon" => ShapeKind::Polygon,
            "polyline" => ShapeKind::Polyline,
            "path" => ShapeKind::Path,
            _ => return None,
        };
        Some(kind)
    }
}

/// Renders `root` and everything below it with default options.
pub fn render<C: ShapeCanvas + ?Sized>(root: &ShapeElement, canvas: &mut C) -> Result<()> {
    render_with(root, canvas, &RenderOptions::default())
}

pub fn render_with<C: ShapeCanvas + ?Sized>(
    root: &ShapeElement,
    canvas: &mut C,
    options: &RenderOptions,
) -> Result<()> {
    let tolerance = options.curve_tolerance;
    let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        warn!(tolerance, "ignoring non-positive curve tolerance");
        RenderOptions::DEFAULT_CURVE_TOLERANCE
    };
    let mut ctx = RenderContext { canvas, tolerance };
    ctx.dispatch(root, &RawAttributes::new())
}

/// An element's own attributes (with inline style expanded) layered over
/// what its ancestors pass down.
pub fn effective_attributes(element: &ShapeElement, inherited: &RawAttributes) -> RawAttributes {
    let own = style::expand_style(&element.raw_attributes());
    style::inherit(&own, inherited)
}

struct RenderContext<'c, C: ShapeCanvas + ?Sized> {
    canvas: &'c mut C,
    tolerance: f64,
}

impl<C: ShapeCanvas + ?Sized> RenderContext<'_, C> {
    fn dispatch(&mut self, element: &ShapeElement, inherited: &RawAttributes) -> Result<()> {
        let Some(kind) = ShapeKind::from_tag(&element.tag) else {
            debug!(tag = %element.tag, "ignoring unknown element");
            return Ok(());
        };
        trace!(tag = %element.tag, ?kind, "dispatching element");

        match kind {
            ShapeKind::Document => {
                for child in &element.children {
                    self.dispatch(child, inherited)?;
                }
                Ok(())
            }
            ShapeKind::Group => {
                let merged = effective_attributes(element, inherited);
                for child in &element.children {
                    self.dispatch(child, &merged)?;
                }
                Ok(())
            }
            leaf => {
                let attrs = style::resolve(&effective_attributes(element, inherited));
                let shape = Shape {
                    tag: &element.tag,
                    attrs,
                };
                match leaf {
                    ShapeKind::Rect => self.rect(&shape),
                    ShapeKind::Circle | ShapeKind::Ellipse => self.ellipse(&shape, leaf),
                    ShapeKind::Line => self.line(&shape),
                    ShapeKind::Polygon => self.polygon(&shape),
                    ShapeKind::Polyline => self.polyline(&shape),
                    ShapeKind::Path => self.path(&shape),
                    ShapeKind::Document | ShapeKind::Group => unreachable!("handled above"),
                }
            }
        }
    }

    fn rect(&mut self, shape: &Shape<'_>) -> Result<()> {
        let x = shape.optional("x", 0.0)?;
        let y = shape.optional("y", 0.0)?;
        let w = shape.required("width")?;
        let h = shape.required("height")?;

        if let Some(fill) = shape.fill() {
            self.canvas.fill_rect(x, y, w, h, &fill)?;
        }
        if let Some(stroke) = shape.stroke()? {
            self.canvas.stroke_rect(x, y, w, h, &stroke)?;
        }
        Ok(())
    }

    fn ellipse(&mut self, shape: &Shape<'_>, kind: ShapeKind) -> Result<()> {
        let cx = shape.required("cx")?;
        let cy = shape.required("cy")?;
        let (rx, ry) = if kind == ShapeKind::Circle || shape.attrs.is_set("r") {
            let r = shape.required("r")?;
            (r, r)
        } else {
            (shape.required("rx")?, shape.required("ry")?)
        };

        if let Some(fill) = shape.fill() {
            self.canvas.fill_ellipse(cx, cy, rx, ry, &fill)?;
        }
        if let Some(stroke) = shape.stroke()? {
            // Thickness is built from concentric one-pixel outlines.
            let outline = Stroke {
                width: 1.0,
                ..stroke.clone()
            };
            // Rings past the point where both radii reach zero are identical.
            let collapsed = (2.0 * rx.max(ry)).max(0.0).ceil();
            let rings = stroke.width.max(0.0).ceil().min(collapsed) as u64;
            for i in 0..=rings {
                let inset = i as f64 / 2.0;
                self.canvas.stroke_ellipse(
                    cx,
                    cy,
                    (rx - inset).max(0.0),
                    (ry - inset).max(0.0),
                    &outline,
                )?;
            }
        }
        Ok(())
    }

    fn line(&mut self, shape: &Shape<'_>) -> Result<()> {
        let x1 = shape.required("x1")?;
        let y1 = shape.required("y1")?;
        let x2 = shape.required("x2")?;
        let y2 = shape.required("y2")?;

        match shape.stroke()? {
            Some(stroke) => self.canvas.draw_line(x1, y1, x2, y2, &stroke),
            None => Ok(()),
        }
    }

    fn polygon(&mut self, shape: &Shape<'_>) -> Result<()> {
        let points = shape.points()?;
        if let Some(fill) = shape.fill() {
            self.canvas.fill_polygon(&points, &fill)?;
        }
        if let Some(stroke) = shape.stroke()? {
            self.canvas.stroke_polygon(&points, &stroke)?;
        }
        Ok(())
    }

    fn polyline(&mut self, shape: &Shape<'_>) -> Result<()> {
        let points = shape.points()?;
        if let Some(fill) = shape.fill() {
            if points.len() >= 3 {
                self.canvas.fill_polygon(&points, &fill)?;
            }
        }
        if let Some(stroke) = shape.stroke()? {
            for pair in points.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                self.canvas.draw_line(a.x, a.y, b.x, b.y, &stroke)?;
            }
        }
        Ok(())
    }

    fn path(&mut self, shape: &Shape<'_>) -> Result<()> {
        let data = shape
            .attrs
            .get("d")
            .filter(|v| !v.is_empty())
            .map(StyleValue::to_raw)
            .ok_or_else(|| StippleError::missing(shape.tag, "d"))?;

        let fill = if shape.attrs.is_set("fill") {
            shape.fill()
        } else {
            Some(
                Fill::new(DEFAULT_PATH_FILL).with_opacity(shape.attrs.opacity(Channel::Fill)),
            )
        };
        let paint = PathPaint {
            fill,
            stroke: shape.stroke()?,
            line_width: shape.stroke_width()?,
            line_cap: shape.line_cap(),
        };
        path::interpret(&data, &mut *self.canvas, paint, self.tolerance)
    }
}

/// A leaf element with its resolved attributes.
struct Shape<'a> {
    tag: &'a str,
    attrs: StyleAttributes,
}

impl Shape<'_> {
    /// A number that must be present.
    fn required(&self, key: &str) -> Result<f64> {
        match self.attrs.get(key) {
            Some(StyleValue::Number(n)) => Ok(*n),
            Some(value) if !value.is_empty() => {
                Err(StippleError::invalid(self.tag, key, value.to_raw()))
            }
            _ => Err(StippleError::missing(self.tag, key)),
        }
    }

    /// A number that falls back to `default` when absent or empty.
    fn optional(&self, key: &str, default: f64) -> Result<f64> {
        match self.attrs.get(key) {
            Some(StyleValue::Number(n)) => Ok(*n),
            Some(value) if !value.is_empty() => {
                Err(StippleError::invalid(self.tag, key, value.to_raw()))
            }
            _ => Ok(default),
        }
    }

    fn stroke_width(&self) -> Result<f64> {
        self.optional("stroke-width", DEFAULT_STROKE_WIDTH)
    }

    fn line_cap(&self) -> LineCap {
        self.attrs
            .text("stroke-linecap")
            .map(LineCap::from_keyword)
            .unwrap_or_default()
    }

    fn fill(&self) -> Option<Fill> {
        self.attrs
            .paint("fill")
            .map(|color| Fill::new(color).with_opacity(self.attrs.opacity(Channel::Fill)))
    }

    fn stroke(&self) -> Result<Option<Stroke>> {
        let Some(color) = self.attrs.paint("stroke") else {
            return Ok(None);
        };
        Ok(Some(
            Stroke::new(color, self.stroke_width()?)
                .with_opacity(self.attrs.opacity(Channel::Stroke))
                .with_cap(self.line_cap()),
        ))
    }

    /// `points="x1,y1 x2,y2 ..."`; commas and whitespace both separate numbers.
    /// At least two points are required.
    fn points(&self) -> Result<Vec<Point>> {
        let raw = self
            .attrs
            .get("points")
            .filter(|v| !v.is_empty())
            .map(StyleValue::to_raw)
            .ok_or_else(|| StippleError::missing(self.tag, "points"))?;

        let numbers = raw
            .split(|c: char| c == ',' || c.is_ascii_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| StippleError::invalid(self.tag, "points", raw.as_str()))?;
        if numbers.len() % 2 != 0 || numbers.len() < 4 {
            return Err(StippleError::invalid(self.tag, "points", raw.as_str()));
        }

        Ok(numbers
            .chunks_exact(2)
            .map(|xy| Point::new(xy[0], xy[1]))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::recording::{DrawOp, RecordingCanvas};

    fn assert_almost_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    fn draw(root: &ShapeElement) -> Vec<DrawOp> {
        let mut canvas = RecordingCanvas::new();
        render(root, &mut canvas).unwrap();
        canvas.into_ops()
    }

    fn svg(children: Vec<ShapeElement>) -> ShapeElement {
        let mut root = ShapeElement::new("svg")
            .attr("width", "200")
            .attr("height", "200");
        root.children = children;
        root
    }

    #[test]
    fn path_with_only_a_stroke_still_gets_the_default_fill() {
        let root = svg(vec![
            ShapeElement::new("path")
                .attr("d", "M150 0 L75 200 H225 Z")
                .attr("style", "stroke: red; stroke-width: 3px;"),
        ]);
        let ops = draw(&root);
        let expected = vec![
            Point::new(150.0, 0.0),
            Point::new(75.0, 200.0),
            Point::new(225.0, 200.0),
        ];
        assert_eq!(
            ops,
            vec![
                DrawOp::FillPolygon {
                    points: expected.clone(),
                    fill: Fill::new("black"),
                },
                DrawOp::StrokePolygon {
                    points: expected,
                    stroke: Stroke::new("red", 3.0),
                },
            ]
        );
    }

    #[test]
    fn path_fill_none_suppresses_the_default() {
        let root = svg(vec![
            ShapeElement::new("path")
                .attr("d", "M150 0 L75 200 H225 Z")
                .attr("fill", "none")
                .attr("stroke", "red"),
        ]);
        let ops = draw(&root);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], DrawOp::StrokePolygon { .. }));
    }

    #[test]
    fn group_stroke_reaches_children_without_overriding() {
        let group = ShapeElement::new("g")
            .attr("stroke", "blue")
            .child(ShapeElement::new("rect").attr("width", "10").attr("height", "5"))
            .child(
                ShapeElement::new("rect")
                    .attr("width", "10")
                    .attr("height", "5")
                    .attr("stroke", "red"),
            );

        let merged = effective_attributes(&group.children[0], &group.raw_attributes());
        assert_eq!(merged.get("stroke").map(String::as_str), Some("blue"));

        let ops = draw(&svg(vec![group]));
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[0],
            DrawOp::StrokeRect {
                x: 0.0,
                y: 0.0,
                w: 10.0,
                h: 5.0,
                stroke: Stroke::new("blue", 1.0),
            }
        );
        assert_eq!(ops[1].color(), "red");
    }

    #[test]
    fn nested_groups_prefer_the_nearest_ancestor() {
        let root = svg(vec![
            ShapeElement::new("g")
                .attr("style", "fill: red; opacity: 0.5")
                .child(ShapeElement::new("g").attr("fill", "green").child(
                    ShapeElement::new("circle")
                        .attr("cx", "5")
                        .attr("cy", "5")
                        .attr("r", "2"),
                )),
        ]);
        let ops = draw(&root);
        assert_eq!(
            ops,
            vec![DrawOp::FillEllipse {
                cx: 5.0,
                cy: 5.0,
                rx: 2.0,
                ry: 2.0,
                fill: Fill::new("green").with_opacity(Some(0.5)),
            }]
        );
    }

    #[test]
    fn document_attributes_are_not_inherited() {
        let root = svg(vec![ShapeElement::new("rect").attr("fill", "red")]);
        let mut canvas = RecordingCanvas::new();
        let err = render(&root, &mut canvas).unwrap_err();
        assert!(matches!(
            err,
            StippleError::MissingAttribute { ref tag, ref attribute }
                if tag == "rect" && attribute == "width"
        ));
    }

    #[test]
    fn rect_defaults_and_opacity() {
        let root = svg(vec![
            ShapeElement::new("RECT")
                .attr("y", "4")
                .attr("width", "1cm")
                .attr("height", "10")
                .attr("fill", "#336699")
                .attr("fill-opacity", "0.25")
                .attr("opacity", "0.75")
                .attr("stroke", "black"),
        ]);
        let ops = draw(&root);
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            DrawOp::FillRect { x, y, w, h, fill } => {
                assert_eq!((*x, *y, *h), (0.0, 4.0, 10.0));
                assert_almost_eq(*w, 37.795276);
                assert_eq!(fill.opacity, Some(0.25));
            }
            op => panic!("unexpected op {:?}", op),
        }
        match &ops[1] {
            DrawOp::StrokeRect { stroke, .. } => {
                assert_eq!(stroke.width, 1.0);
                assert_eq!(stroke.opacity, Some(0.75));
            }
            op => panic!("unexpected op {:?}", op),
        }
    }

    #[test]
    fn invalid_geometry_is_reported() {
        let root = svg(vec![
            ShapeElement::new("rect")
                .attr("width", "wide")
                .attr("height", "10"),
        ]);
        let mut canvas = RecordingCanvas::new();
        assert!(matches!(
            render(&root, &mut canvas),
            Err(StippleError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn ellipse_stroke_is_built_from_rings() {
        let root = svg(vec![
            ShapeElement::new("ellipse")
                .attr("cx", "50")
                .attr("cy", "40")
                .attr("rx", "20")
                .attr("ry", "10")
                .attr("stroke", "navy")
                .attr("stroke-width", "2.5"),
        ]);
        let ops = draw(&root);
        assert_eq!(ops.len(), 4);
        for (i, op) in ops.iter().enumerate() {
            match op {
                DrawOp::StrokeEllipse { cx, cy, rx, ry, stroke } => {
                    let inset = i as f64 / 2.0;
                    assert_eq!((*cx, *cy), (50.0, 40.0));
                    assert_almost_eq(*rx, 20.0 - inset);
                    assert_almost_eq(*ry, 10.0 - inset);
                    assert_eq!(stroke.width, 1.0);
                    assert_eq!(stroke.color, "navy");
                }
                op => panic!("unexpected op {:?}", op),
            }
        }
    }

    #[test]
    fn rings_stop_once_the_radii_collapse() {
        let root = svg(vec![
            ShapeElement::new("circle")
                .attr("cx", "0")
                .attr("cy", "0")
                .attr("r", "2")
                .attr("stroke", "black")
                .attr("stroke-width", "2e6"),
        ]);
        let radii = draw(&root)
            .iter()
            .map(|op| match op {
                DrawOp::StrokeEllipse { rx, ry, .. } => (*rx, *ry),
                op => panic!("unexpected op {:?}", op),
            })
            .collect::<Vec<_>>();
        assert_eq!(
            radii,
            [(2.0, 2.0), (1.5, 1.5), (1.0, 1.0), (0.5, 0.5), (0.0, 0.0)]
        );
    }

    #[test]
    fn circle_requires_a_radius() {
        let root = svg(vec![
            ShapeElement::new("circle")
                .attr("cx", "5")
                .attr("cy", "5")
                .attr("fill", "red"),
        ]);
        let mut canvas = RecordingCanvas::new();
        assert!(matches!(
            render(&root, &mut canvas),
            Err(StippleError::MissingAttribute { ref attribute, .. }) if attribute == "r"
        ));
    }

    #[test]
    fn line_needs_a_stroke_and_honors_linecap() {
        let root = svg(vec![
            ShapeElement::new("line")
                .attr("x1", "0")
                .attr("y1", "0")
                .attr("x2", "10")
                .attr("y2", "0"),
            ShapeElement::new("line")
                .attr("x1", "0")
                .attr("y1", "0")
                .attr("x2", "10")
                .attr("y2", "0")
                .attr("style", "stroke: red; stroke-linecap: square; stroke-width: 4"),
        ]);
        let ops = draw(&root);
        assert_eq!(
            ops,
            vec![DrawOp::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 10.0,
                y2: 0.0,
                stroke: Stroke::new("red", 4.0).with_cap(LineCap::Square),
            }]
        );
    }

    #[test]
    fn polygon_and_polyline_points() {
        let root = svg(vec![
            ShapeElement::new("polygon")
                .attr("points", "200,10 250,190 160,210")
                .attr("fill", "lime"),
            ShapeElement::new("polyline")
                .attr("points", "0,0 10,0, 10,10")
                .attr("stroke", "black"),
        ]);
        let ops = draw(&root);
        assert_eq!(ops.len(), 3);
        match &ops[0] {
            DrawOp::FillPolygon { points, .. } => assert_eq!(
                points,
                &vec![
                    Point::new(200.0, 10.0),
                    Point::new(250.0, 190.0),
                    Point::new(160.0, 210.0)
                ]
            ),
            op => panic!("unexpected op {:?}", op),
        }
        let ends = ops[1..]
            .iter()
            .map(|op| match op {
                DrawOp::Line { x1, y1, x2, y2, .. } => (*x1, *y1, *x2, *y2),
                op => panic!("unexpected op {:?}", op),
            })
            .collect::<Vec<_>>();
        assert_eq!(ends, [(0.0, 0.0, 10.0, 0.0), (10.0, 0.0, 10.0, 10.0)]);
    }

    #[test]
    fn odd_point_lists_are_invalid() {
        let root = svg(vec![
            ShapeElement::new("polygon")
                .attr("points", "1,2 3")
                .attr("fill", "red"),
        ]);
        let mut canvas = RecordingCanvas::new();
        assert!(matches!(
            render(&root, &mut canvas),
            Err(StippleError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn empty_or_short_point_lists_are_rejected() {
        let render_points = |points: &str| {
            let root = svg(vec![
                ShapeElement::new("polygon")
                    .attr("points", points)
                    .attr("fill", "red"),
            ]);
            let mut canvas = RecordingCanvas::new();
            let result = render(&root, &mut canvas);
            assert!(canvas.ops().is_empty());
            result
        };

        assert!(matches!(
            render_points(""),
            Err(StippleError::MissingAttribute { ref attribute, .. }) if attribute == "points"
        ));
        assert!(matches!(
            render_points("   "),
            Err(StippleError::MissingAttribute { .. })
        ));
        assert!(matches!(
            render_points("4,5"),
            Err(StippleError::InvalidAttribute { .. })
        ));
        assert!(matches!(
            render_points(" , "),
            Err(StippleError::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn unknown_tags_are_ignored() {
        let root = svg(vec![
            ShapeElement::new("text").attr("x", "1"),
            ShapeElement::new("linearGradient"),
            ShapeElement::new("rect")
                .attr("width", "1")
                .attr("height", "1")
                .attr("fill", "red"),
        ]);
        let ops = draw(&root);
        assert_eq!(ops.len(), 1);
    }

    #[test]
    fn malformed_path_aborts_the_render() {
        let root = svg(vec![
            ShapeElement::new("path").attr("d", "M 0 0 L 10"),
            ShapeElement::new("rect")
                .attr("width", "1")
                .attr("height", "1")
                .attr("fill", "red"),
        ]);
        let mut canvas = RecordingCanvas::new();
        assert!(matches!(
            render(&root, &mut canvas),
            Err(StippleError::MalformedPath { .. })
        ));
        assert!(canvas.ops().is_empty());
    }

    #[test]
    fn curve_tolerance_comes_from_options() {
        let root = svg(vec![
            ShapeElement::new("path").attr("d", "M0 0 C 0 100 100 100 100 0 Z"),
        ]);
        let count = |options: &RenderOptions| {
            let mut canvas = RecordingCanvas::new();
            render_with(&root, &mut canvas, options).unwrap();
            match canvas.ops() {
                [DrawOp::FillPolygon { points, .. }] => points.len(),
                other => panic!("unexpected ops {:?}", other),
            }
        };
        let fine = count(&RenderOptions::default());
        let coarse = count(&RenderOptions::default().with_curve_tolerance(20.0));
        let bogus = count(&RenderOptions::default().with_curve_tolerance(-1.0));
        assert!(fine > coarse);
        assert_eq!(fine, bogus);
    }
}
