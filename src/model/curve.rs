//! Curve type produced by the forward model.

use serde::{Deserialize, Serialize};

/// A computed pressure-transient curve: time, pressure drop, and Bourdet
/// derivative, index-aligned. Curves are immutable once produced; a new
/// evaluation yields a new curve.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Time points in hours, strictly positive.
    pub time: Vec<f64>,
    /// Pressure drop in MPa at each time point.
    pub pressure: Vec<f64>,
    /// Logarithmic (Bourdet) pressure derivative in MPa.
    pub derivative: Vec<f64>,
}

impl Curve {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}
