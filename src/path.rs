//! Path data (`d` attribute) interpretation.
//!
//! [`tokenize`] splits the mini-language into [`Command`]s, and
//! [`PathInterpreter`] walks them with a cursor, flattening curves and
//! painting every finished sub-path onto the canvas.

use tracing::{debug, trace};

use crate::api::{Fill, LineCap, Point, ShapeCanvas, Stroke};
use crate::bezier;
use crate::error::{Result, StippleError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    MoveTo,
    LineTo,
    HorizontalLineTo,
    VerticalLineTo,
    CurveTo,
    SmoothCurveTo,
    QuadraticCurveTo,
    SmoothQuadraticCurveTo,
    Arc,
    ClosePath,
}

impl Action {
    /// Maps a command letter to its action and whether it is relative (lower case).
    pub fn from_letter(letter: char) -> Option<(Action, bool)> {
        let action = match letter.to_ascii_uppercase() {
            'M' => Action::MoveTo,
            'L' => Action::LineTo,
            'H' => Action::HorizontalLineTo,
            'V' => Action::VerticalLineTo,
            'C' => Action::CurveTo,
            'S' => Action::SmoothCurveTo,
            'Q' => Action::QuadraticCurveTo,
            'T' => Action::SmoothQuadraticCurveTo,
            'A' => Action::Arc,
            'Z' => Action::ClosePath,
            _ => return None,
        };
        Some((action, letter.is_ascii_lowercase()))
    }

    /// Operands consumed per repetition; `None` for commands that are recognised
    /// but not drawn.
    pub fn arity(self) -> Option<usize> {
        match self {
            Action::MoveTo | Action::LineTo => Some(2),
            Action::HorizontalLineTo | Action::VerticalLineTo => Some(1),
            Action::CurveTo => Some(6),
            Action::ClosePath => Some(0),
            Action::SmoothCurveTo
            | Action::QuadraticCurveTo
            | Action::SmoothQuadraticCurveTo
            | Action::Arc => None,
        }
    }
}

/// One command letter and the numbers that follow it.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub action: Action,
    pub relative: bool,
    pub operands: Vec<f64>,
    /// Byte offset of the command letter in the path data.
    pub offset: usize,
}

/// Splits path data into commands. Numbers may be signed, fractional or carry
/// an exponent, and are separated by whitespace, commas, or simply by the
/// sign of the next number.
pub fn tokenize(data: &str) -> Result<Vec<Command>> {
    let bytes = data.as_bytes();
    let mut commands: Vec<Command> = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() || c == b',' {
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() {
            let (action, relative) = Action::from_letter(c as char).ok_or_else(|| {
                StippleError::malformed_path(i, format!("unknown command `{}`", c as char))
            })?;
            commands.push(Command {
                action,
                relative,
                operands: Vec::new(),
                offset: i,
            });
            i += 1;
            continue;
        }

        let end = scan_number(bytes, i)
            .ok_or_else(|| StippleError::malformed_path(i, "expected a number"))?;
        let value: f64 = data[i..end]
            .parse()
            .map_err(|_| StippleError::malformed_path(i, "invalid number"))?;
        match commands.last_mut() {
            Some(command) => command.operands.push(value),
            None => {
                return Err(StippleError::malformed_path(
                    i,
                    "path data must start with a command",
                ));
            }
        }
        i = end;
    }

    Ok(commands)
}

/// End of the number starting at `start`, if one starts there.
fn scan_number(bytes: &[u8], start: usize) -> Option<usize> {
    let digits = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = start;
    if matches!(bytes.get(i), Some(b'+' | b'-')) {
        i += 1;
    }
    let int_end = digits(i);
    let mut mantissa = int_end > i;
    i = int_end;
    if bytes.get(i) == Some(&b'.') {
        let frac_end = digits(i + 1);
        mantissa |= frac_end > i + 1;
        i = frac_end;
    }
    if !mantissa {
        return None;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_end = digits(j);
        if exp_end > j {
            i = exp_end;
        }
    }
    Some(i)
}

/// Paint applied to each finished sub-path.
#[derive(Clone, Debug, PartialEq)]
pub struct PathPaint {
    pub fill: Option<Fill>,
    pub stroke: Option<Stroke>,
    /// Width and cap used when a two-point sub-path has to be drawn with the fill colour.
    pub line_width: f64,
    pub line_cap: LineCap,
}

impl PathPaint {
    fn line(&self) -> Option<Stroke> {
        self.stroke.clone().or_else(|| {
            self.fill.as_ref().map(|fill| {
                Stroke::new(fill.color.clone(), self.line_width)
                    .with_opacity(fill.opacity)
                    .with_cap(self.line_cap)
            })
        })
    }
}

/// Position and in-progress sub-path of one path traversal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathCursor {
    pub position: Point,
    /// Where the current sub-path began; `Z` returns here.
    pub start: Point,
    pub points: Vec<Point>,
}

impl PathCursor {
    fn resolve(&self, relative: bool, x: f64, y: f64) -> Point {
        if relative {
            Point::new(self.position.x + x, self.position.y + y)
        } else {
            Point::new(x, y)
        }
    }

    /// Starts the sub-path at the cursor if nothing has been recorded yet.
    fn ensure_started(&mut self) {
        if self.points.is_empty() {
            self.start = self.position;
            self.points.push(self.position);
        }
    }

    fn line_to(&mut self, to: Point) {
        self.ensure_started();
        self.points.push(to);
        self.position = to;
    }
}

pub struct PathInterpreter<'c, C: ShapeCanvas + ?Sized> {
    canvas: &'c mut C,
    paint: PathPaint,
    tolerance: f64,
    cursor: PathCursor,
}

impl<'c, C: ShapeCanvas + ?Sized> PathInterpreter<'c, C> {
    pub fn new(canvas: &'c mut C, paint: PathPaint, tolerance: f64) -> Self {
        Self {
            canvas,
            paint,
            tolerance,
            cursor: PathCursor::default(),
        }
    }

    pub fn cursor(&self) -> &PathCursor {
        &self.cursor
    }

    /// Interprets the whole of `data`. A sub-path left open at the end is
    /// painted exactly as if it had been closed.
    pub fn run(mut self, data: &str) -> Result<()> {
        for command in tokenize(data)? {
            self.apply(&command)?;
        }
        self.flush()
    }

    pub fn apply(&mut self, command: &Command) -> Result<()> {
        let Some(arity) = command.action.arity() else {
            debug!(
                action = ?command.action,
                offset = command.offset,
                "skipping unsupported path command"
            );
            return Ok(());
        };

        let operands = &command.operands;
        let well_formed = if arity == 0 {
            operands.is_empty()
        } else {
            !operands.is_empty() && operands.len() % arity == 0
        };
        if !well_formed {
            return Err(StippleError::malformed_path(
                command.offset,
                format!(
                    "{:?} takes {} operand(s) per segment, found {}",
                    command.action,
                    arity,
                    operands.len()
                ),
            ));
        }

        let rel = command.relative;
        match command.action {
            Action::MoveTo => {
                for (n, pair) in operands.chunks_exact(2).enumerate() {
                    let to = self.cursor.resolve(rel, pair[0], pair[1]);
                    if n == 0 {
                        self.move_to(to)?;
                    } else {
                        self.cursor.line_to(to);
                    }
                }
            }
            Action::LineTo => {
                for pair in operands.chunks_exact(2) {
                    let to = self.cursor.resolve(rel, pair[0], pair[1]);
                    self.cursor.line_to(to);
                }
            }
            Action::HorizontalLineTo => {
                for &x in operands {
                    let x = if rel { self.cursor.position.x + x } else { x };
                    let to = Point::new(x, self.cursor.position.y);
                    self.cursor.line_to(to);
                }
            }
            Action::VerticalLineTo => {
                for &y in operands {
                    let y = if rel { self.cursor.position.y + y } else { y };
                    let to = Point::new(self.cursor.position.x, y);
                    self.cursor.line_to(to);
                }
            }
            Action::CurveTo => {
                for seg in operands.chunks_exact(6) {
                    let c1 = self.cursor.resolve(rel, seg[0], seg[1]);
                    let c2 = self.cursor.resolve(rel, seg[2], seg[3]);
                    let to = self.cursor.resolve(rel, seg[4], seg[5]);
                    self.curve_to(c1, c2, to);
                }
            }
            Action::ClosePath => {
                self.flush()?;
                self.cursor.position = self.cursor.start;
            }
            Action::SmoothCurveTo
            | Action::QuadraticCurveTo
            | Action::SmoothQuadraticCurveTo
            | Action::Arc => unreachable!("unsupported commands return early"),
        }
        Ok(())
    }

    fn move_to(&mut self, to: Point) -> Result<()> {
        if !self.cursor.points.is_empty() {
            self.flush()?;
        }
        self.cursor.position = to;
        self.cursor.start = to;
        self.cursor.points.push(to);
        Ok(())
    }

    fn curve_to(&mut self, c1: Point, c2: Point, to: Point) {
        self.cursor.ensure_started();
        let from = self.cursor.position;
        // The first flattened point is the cursor, which is already recorded.
        // A collapsed curve adds nothing.
        for p in bezier::flatten(from, c1, c2, to, self.tolerance).into_iter().skip(1) {
            if self.cursor.points.last() != Some(&p) {
                self.cursor.points.push(p);
            }
        }
        self.cursor.position = to;
    }

    /// Paints the accumulated sub-path and empties the accumulator.
    fn flush(&mut self) -> Result<()> {
        let points = std::mem::take(&mut self.cursor.points);
        trace!(points = points.len(), "flushing sub-path");

        match points.as_slice() {
            [] => Ok(()),
            [only] => {
                debug!(x = only.x, y = only.y, "dropping single-point sub-path");
                Ok(())
            }
            [a, b] => {
                debug!("rendering two-point sub-path as a line");
                match self.paint.line() {
                    Some(stroke) => self.canvas.draw_line(a.x, a.y, b.x, b.y, &stroke),
                    None => Ok(()),
                }
            }
            _ => {
                if let Some(fill) = &self.paint.fill {
                    self.canvas.fill_polygon(&points, fill)?;
                }
                if let Some(stroke) = &self.paint.stroke {
                    self.canvas.stroke_polygon(&points, stroke)?;
                }
                Ok(())
            }
        }
    }
}

/// Interprets `data` onto `canvas` with the given paint and curve tolerance.
pub fn interpret<C: ShapeCanvas + ?Sized>(
    data: &str,
    canvas: &mut C,
    paint: PathPaint,
    tolerance: f64,
) -> Result<()> {
    PathInterpreter::new(canvas, paint, tolerance).run(data)
}
