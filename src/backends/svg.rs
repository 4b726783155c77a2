//! SVG backend using a streaming XML writer. Every canvas call becomes one
//! flat element; nothing is grouped or deduplicated.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};

use crate::api::{
    CanvasEllipses, CanvasLines, CanvasPolygons, CanvasRectangles, Fill, Point, Stroke,
};
use crate::error::Result;

pub struct SvgCanvas<W: Write> {
    writer: Writer<W>,
    open_root: bool,
}

impl<W: Write> SvgCanvas<W> {
    /// Create a new SVG canvas that writes into the provided sink, emitting the root `<svg>`.
    /// Width/height are expressed in CSS pixels; a matching `viewBox` is set.
    pub fn new(inner: W, width: f64, height: f64) -> Result<Self> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

        let width_attr = width.to_string();
        let height_attr = height.to_string();
        let view_box_attr = format!("0 0 {} {}", width, height);

        let mut start = BytesStart::new("svg");
        start.push_attribute(("xmlns", "http://www.w3.org/2000/svg"));
        start.push_attribute(("version", "1.1"));
        start.push_attribute(("width", width_attr.as_str()));
        start.push_attribute(("height", height_attr.as_str()));
        start.push_attribute(("viewBox", view_box_attr.as_str()));
        writer.write_event(Event::Start(start))?;

        Ok(Self {
            writer,
            open_root: true,
        })
    }

    /// Finish the document, closing the root element and returning the inner writer.
    pub fn finish(mut self) -> Result<W> {
        if self.open_root {
            self.writer.write_event(Event::End(BytesEnd::new("svg")))?;
            self.open_root = false;
        }
        Ok(self.writer.into_inner())
    }

    fn write_empty(&mut self, elem: BytesStart<'_>) -> Result<()> {
        self.writer.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn write_filled(&mut self, mut elem: BytesStart<'_>, fill: &Fill) -> Result<()> {
        elem.push_attribute(("fill", fill.color.as_str()));
        if let Some(opacity) = fill.opacity {
            let opacity_attr = opacity.to_string();
            elem.push_attribute(("fill-opacity", opacity_attr.as_str()));
        }
        self.write_empty(elem)
    }

    fn write_stroked(&mut self, mut elem: BytesStart<'_>, stroke: &Stroke) -> Result<()> {
        let stroke_width_attr = stroke.width.to_string();
        elem.push_attribute(("fill", "none"));
        elem.push_attribute(("stroke", stroke.color.as_str()));
        elem.push_attribute(("stroke-width", stroke_width_attr.as_str()));
        elem.push_attribute(("stroke-linecap", stroke.cap.keyword()));
        if let Some(opacity) = stroke.opacity {
            let opacity_attr = opacity.to_string();
            elem.push_attribute(("stroke-opacity", opacity_attr.as_str()));
        }
        self.write_empty(elem)
    }
}

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn polygon_elem(points: &[Point]) -> BytesStart<'static> {
    let mut elem = BytesStart::new("polygon");
    elem.push_attribute(("points", points_attr(points).as_str()));
    elem
}

fn ellipse_elem(cx: f64, cy: f64, rx: f64, ry: f64) -> BytesStart<'static> {
    let mut elem = BytesStart::new("ellipse");
    for (name, value) in [("cx", cx), ("cy", cy), ("rx", rx), ("ry", ry)] {
        elem.push_attribute((name, value.to_string().as_str()));
    }
    elem
}

fn rect_elem(x: f64, y: f64, w: f64, h: f64) -> BytesStart<'static> {
    let mut elem = BytesStart::new("rect");
    for (name, value) in [("x", x), ("y", y), ("width", w), ("height", h)] {
        elem.push_attribute((name, value.to_string().as_str()));
    }
    elem
}

impl<W: Write> CanvasPolygons for SvgCanvas<W> {
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) -> Result<()> {
        self.write_filled(polygon_elem(points), fill)
    }

    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke) -> Result<()> {
        self.write_stroked(polygon_elem(points), stroke)
    }
}

impl<W: Write> CanvasEllipses for SvgCanvas<W> {
    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, fill: &Fill) -> Result<()> {
        self.write_filled(ellipse_elem(cx, cy, rx, ry), fill)
    }

    fn stroke_ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        stroke: &Stroke,
    ) -> Result<()> {
        self.write_stroked(ellipse_elem(cx, cy, rx, ry), stroke)
    }
}

impl<W: Write> CanvasRectangles for SvgCanvas<W> {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &Fill) -> Result<()> {
        self.write_filled(rect_elem(x, y, w, h), fill)
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stroke: &Stroke) -> Result<()> {
        self.write_stroked(rect_elem(x, y, w, h), stroke)
    }
}

impl<W: Write> CanvasLines for SvgCanvas<W> {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &Stroke) -> Result<()> {
        let mut elem = BytesStart::new("line");
        for (name, value) in [("x1", x1), ("y1", y1), ("x2", x2), ("y2", y2)] {
            elem.push_attribute((name, value.to_string().as_str()));
        }
        self.write_stroked(elem, stroke)
    }
}
