//! Cubic Bézier flattening.

use tracing::debug;

use crate::api::Point;
use crate::config::RenderOptions;

/// Parameter step tried before any refinement.
const NOMINAL_STEP: f64 = 0.1;

/// Smallest parameter step the halving may reach. Bounds the output to about
/// a million points whatever the tolerance.
const MIN_STEP: f64 = 1e-6;

/// Distance, in device pixels, under which a control point counts as lying on the chord.
const STRAIGHT_EPSILON: f64 = 1e-9;

/// The four points of one cubic segment: start, two controls, end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlQuad {
    pub p0: Point,
    pub p1: Point,
    pub p2: Point,
    pub p3: Point,
}

impl ControlQuad {
    pub const fn new(p0: Point, p1: Point, p2: Point, p3: Point) -> Self {
        Self { p0, p1, p2, p3 }
    }

    /// Point on the curve at `t` in `[0, 1]` by de Casteljau reduction.
    pub fn eval(&self, t: f64) -> Point {
        let q1 = self.p0.lerp(self.p1, t);
        let q2 = self.p1.lerp(self.p2, t);
        let q3 = self.p2.lerp(self.p3, t);

        let r1 = q1.lerp(q2, t);
        let r2 = q2.lerp(q3, t);

        r1.lerp(r2, t)
    }

    /// Both control points sit on the segment `p0..p3`, so the curve is that segment.
    pub fn is_straight(&self) -> bool {
        let (dx, dy) = (self.p3.x - self.p0.x, self.p3.y - self.p0.y);
        let chord2 = dx * dx + dy * dy;
        let eps2 = STRAIGHT_EPSILON * STRAIGHT_EPSILON;
        if chord2 == 0.0 {
            return self.p1.distance2(self.p0) <= eps2 && self.p2.distance2(self.p0) <= eps2;
        }
        [self.p1, self.p2].iter().all(|c| {
            let (cx, cy) = (c.x - self.p0.x, c.y - self.p0.y);
            let cross = dx * cy - dy * cx;
            let dot = dx * cx + dy * cy;
            cross * cross <= eps2 * chord2 && (0.0..=chord2).contains(&dot)
        })
    }

    pub fn flatten(&self, tolerance: f64) -> Vec<Point> {
        flatten(self.p0, self.p1, self.p2, self.p3, tolerance)
    }
}

/// Approximates the curve by a polyline starting at `p0` and ending at `p3`.
///
/// The parameter advances in steps of 0.1; a step is halved for as long as
/// the chord it produces is longer than `tolerance`. Only chord length is
/// bounded, not deviation from the curve, so a long flat-looking chord over
/// a tight bend is accepted. A straight curve comes back as just its endpoints.
///
/// A tolerance that is not a positive finite number is replaced by
/// [`RenderOptions::DEFAULT_CURVE_TOLERANCE`].
pub fn flatten(p0: Point, p1: Point, p2: Point, p3: Point, tolerance: f64) -> Vec<Point> {
    let quad = ControlQuad::new(p0, p1, p2, p3);
    if quad.is_straight() {
        return vec![p0, p3];
    }

    let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        debug!(tolerance, "flattening with the default curve tolerance");
        RenderOptions::DEFAULT_CURVE_TOLERANCE
    };

    let tol2 = tolerance * tolerance;

    let mut points = vec![p0];
    let mut prev = p0;
    let mut t1 = 0.0;
    let mut t2 = NOMINAL_STEP;

    while t1 < 1.0 {
        // Ten additions of 0.1 land just short of 1.0.
        if t2 > 1.0 - 1e-9 {
            t2 = 1.0;
        }
        let mut next = quad.eval(t2);
        while prev.distance2(next) > tol2 {
            let halved = t1 + (t2 - t1) * 0.5;
            if halved - t1 < MIN_STEP {
                break;
            }
            t2 = halved;
            next = quad.eval(t2);
        }
        points.push(next);
        t1 = t2;
        prev = next;
        t2 = t1 + NOMINAL_STEP;
    }

    if let Some(last) = points.last_mut() {
        *last = p3;
    }
    points
}
