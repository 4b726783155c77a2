use crate::api::*;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    FillPolygon {
        points: Vec<Point>,
        fill: Fill,
    },
    StrokePolygon {
        points: Vec<Point>,
        stroke: Stroke,
    },
    FillEllipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        fill: Fill,
    },
    StrokeEllipse {
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        stroke: Stroke,
    },
    FillRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Fill,
    },
    StrokeRect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        stroke: Stroke,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        stroke: Stroke,
    },
}

impl DrawOp {
    /// Colour the operation paints with.
    pub fn color(&self) -> &str {
        match self {
            DrawOp::FillPolygon { fill, .. }
            | DrawOp::FillEllipse { fill, .. }
            | DrawOp::FillRect { fill, .. } => &fill.color,
            DrawOp::StrokePolygon { stroke, .. }
            | DrawOp::StrokeEllipse { stroke, .. }
            | DrawOp::StrokeRect { stroke, .. }
            | DrawOp::Line { stroke, .. } => &stroke.color,
        }
    }
}

/// Canvas that keeps every call it receives, in order.
pub struct RecordingCanvas {
    ops: Vec<DrawOp>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<DrawOp> {
        self.ops
    }

    fn record_op(&mut self, op: DrawOp) -> Result<()> {
        self.ops.push(op);
        Ok(())
    }
}

impl Default for RecordingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasPolygons for RecordingCanvas {
    fn fill_polygon(&mut self, points: &[Point], fill: &Fill) -> Result<()> {
        self.record_op(DrawOp::FillPolygon {
            points: points.to_vec(),
            fill: fill.clone(),
        })
    }

    fn stroke_polygon(&mut self, points: &[Point], stroke: &Stroke) -> Result<()> {
        self.record_op(DrawOp::StrokePolygon {
            points: points.to_vec(),
            stroke: stroke.clone(),
        })
    }
}

impl CanvasEllipses for RecordingCanvas {
    fn fill_ellipse(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, fill: &Fill) -> Result<()> {
        self.record_op(DrawOp::FillEllipse {
            cx,
            cy,
            rx,
            ry,
            fill: fill.clone(),
        })
    }

    fn stroke_ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: f64,
        ry: f64,
        stroke: &Stroke,
    ) -> Result<()> {
        self.record_op(DrawOp::StrokeEllipse {
            cx,
            cy,
            rx,
            ry,
            stroke: stroke.clone(),
        })
    }
}

impl CanvasRectangles for RecordingCanvas {
    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: &Fill) -> Result<()> {
        self.record_op(DrawOp::FillRect {
            x,
            y,
            w,
            h,
            fill: fill.clone(),
        })
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64, stroke: &Stroke) -> Result<()> {
        self.record_op(DrawOp::StrokeRect {
            x,
            y,
            w,
            h,
            stroke: stroke.clone(),
        })
    }
}

impl CanvasLines for RecordingCanvas {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, stroke: &Stroke) -> Result<()> {
        self.record_op(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            stroke: stroke.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_almost_eq(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn records_fill_rect() {
        let mut c = RecordingCanvas::new();
        c.fill_rect(1.0, 2.0, 3.0, 4.0, &Fill::new("#f00").with_opacity(Some(0.5)))
            .unwrap();
        let ops = c.ops();
        assert_eq!(ops.len(), 1);
        match &ops[0] {
            DrawOp::FillRect { x, y, w, h, fill } => {
                assert_almost_eq(*x, 1.0);
                assert_almost_eq(*y, 2.0);
                assert_almost_eq(*w, 3.0);
                assert_almost_eq(*h, 4.0);
                assert_eq!(fill.color, "#f00");
                assert_eq!(fill.opacity, Some(0.5));
            }
            _ => panic!("unexpected op"),
        }
    }

    #[test]
    fn records_calls_in_order() {
        let mut c = RecordingCanvas::new();
        let square = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        c.fill_polygon(&square, &Fill::new("red")).unwrap();
        c.stroke_ellipse(5.0, 5.0, 2.0, 3.0, &Stroke::new("blue", 1.0))
            .unwrap();
        c.draw_line(0.0, 0.0, 1.0, 1.0, &Stroke::new("green", 2.0).with_cap(LineCap::Round))
            .unwrap();

        let ops = c.into_ops();
        assert_eq!(ops.len(), 3);
        assert_eq!(
            ops.iter().map(DrawOp::color).collect::<Vec<_>>(),
            ["red", "blue", "green"]
        );
        match &ops[0] {
            DrawOp::FillPolygon { points, .. } => assert_eq!(points.as_slice(), &square),
            _ => panic!("unexpected op"),
        }
        match &ops[2] {
            DrawOp::Line { stroke, .. } => {
                assert_eq!(stroke.cap, LineCap::Round);
                assert_almost_eq(stroke.width, 2.0);
            }
            _ => panic!("unexpected op"),
        }
    }
}
