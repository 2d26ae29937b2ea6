//! Per-axis calibration for unique joystick devices
//!
//! A calibration curve is stored as a half-curve: user data points in the
//! positive quadrant, excluding the endpoints 0 and 1. Before use the
//! half-curve is precached into a full curve over [-1, 1] by mirroring it
//! into the negative domain and adding the canonical endpoints. Only the
//! half-curve is ever persisted.

use serde::{Deserialize, Serialize};

/// Input range folding applied before the curve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputRange {
    /// -1 to 1, untouched
    #[default]
    Default,
    /// -1 to 1 compressed into 0 to 1
    Halved,
    /// -1 to 1 compressed into -1 to 0
    HalvedNegative,
}

impl InputRange {
    /// Fold a normalized axis value into this range
    pub fn fold(self, value: f32) -> f32 {
        match self {
            InputRange::Default => value,
            InputRange::Halved => ((value + 1.0) / 2.0).clamp(0.0, 1.0),
            InputRange::HalvedNegative => ((value - 1.0) / 2.0).clamp(-1.0, 0.0),
        }
    }
}

/// One calibration data point (input, output)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    fn mirrored(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// Calibration of one physical axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAxis {
    /// Axis identifier
    pub axis: String,
    /// Half-curve data points, scaled to [-1, 1], positive only, no 0 and 1
    #[serde(default)]
    pub points: Vec<CurvePoint>,
    #[serde(default)]
    pub input_range: InputRange,
    /// Full mirrored curve; derived, never persisted
    #[serde(skip)]
    precached: Option<Vec<CurvePoint>>,
}

impl PhysicalAxis {
    pub fn new(axis: impl Into<String>) -> Self {
        Self {
            axis: axis.into(),
            points: Vec::new(),
            input_range: InputRange::Default,
            precached: None,
        }
    }

    pub fn with_points(mut self, points: Vec<CurvePoint>) -> Self {
        self.points = points;
        self.precached = None;
        self
    }

    pub fn with_input_range(mut self, input_range: InputRange) -> Self {
        self.input_range = input_range;
        self
    }

    pub fn is_precached(&self) -> bool {
        self.precached.is_some()
    }

    /// Expand the half-curve into the full curve.
    ///
    /// Returns `false` without touching anything when already precached.
    pub fn precache(&mut self) -> bool {
        if self.precached.is_some() {
            return false;
        }

        let mut full = Vec::with_capacity(self.points.len() * 2 + 3);
        full.push(CurvePoint::new(-1.0, -1.0));
        full.extend(self.points.iter().rev().map(|p| p.mirrored()));
        full.push(CurvePoint::new(0.0, 0.0));
        full.extend(self.points.iter().copied());
        full.push(CurvePoint::new(1.0, 1.0));

        self.precached = Some(full);
        true
    }

    /// Copy carrying only the persisted source data
    pub fn without_cache(&self) -> Self {
        Self {
            axis: self.axis.clone(),
            points: self.points.clone(),
            input_range: self.input_range,
            precached: None,
        }
    }

    /// The full curve, if precached
    pub fn precached_points(&self) -> Option<&[CurvePoint]> {
        self.precached.as_deref()
    }

    /// Whether the user supplied any calibration points
    pub fn has_curve(&self) -> bool {
        !self.points.is_empty()
    }

    /// Fold `value` into the input range, then remap it through the curve
    /// when one exists. Uses the precached curve when available.
    pub fn apply(&self, value: f32) -> f32 {
        let folded = self.input_range.fold(value);
        if !self.has_curve() {
            return folded;
        }
        match &self.precached {
            Some(full) => interpolate(full, folded),
            None if folded >= 0.0 => interpolate(&self.closed_half_curve(), folded),
            None => -interpolate(&self.closed_half_curve(), -folded),
        }
    }

    fn closed_half_curve(&self) -> Vec<CurvePoint> {
        let mut points = self.points.clone();
        points.push(CurvePoint::new(1.0, 1.0));
        points
    }
}

/// Piecewise-linear interpolation with an implicit origin.
///
/// Scans the points after an implicit (0, 0) for the first one whose input
/// is at or beyond `val` and interpolates against its predecessor. Returns
/// `val` unchanged when no point qualifies, or when the segment is vertical.
pub fn interpolate(points: &[CurvePoint], val: f32) -> f32 {
    let mut prev = CurvePoint::new(0.0, 0.0);

    for &point in points {
        if point.x < val {
            prev = point;
            continue;
        }

        let dx = point.x - prev.x;
        if dx.abs() <= f32::EPSILON {
            return val;
        }
        return prev.y + (val - prev.x) * ((point.y - prev.y) / dx);
    }

    val
}
