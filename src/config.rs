/// Knobs for a render pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderOptions {
    /// Longest chord, in device pixels, accepted when flattening a curve.
    pub curve_tolerance: f64,
}

impl RenderOptions {
    pub const DEFAULT_CURVE_TOLERANCE: f64 = 1.0;

    pub fn with_curve_tolerance(mut self, tolerance: f64) -> Self {
        self.curve_tolerance = tolerance;
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            curve_tolerance: Self::DEFAULT_CURVE_TOLERANCE,
        }
    }
}
