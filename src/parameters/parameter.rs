//! Fit parameter definition.
//!
//! A `FitParameter` is one row of the host's parameter table: a named value
//! with bounds and a flag saying whether the optimizer may vary it. Bounds
//! are enforced by clamping at the point of use (trial-step construction),
//! not globally, so a host is free to type in an out-of-range value and see
//! the forward model evaluated there.

use serde::{Deserialize, Serialize};

/// Scale in which a parameter is perturbed and stepped during fitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepScale {
    /// Step in log10 of the value; used for strictly positive parameters
    /// that span decades (permeabilities, storativity ratios, ...).
    Log10,
    /// Step in the value itself; used for parameters that can be zero or
    /// negative (skin) or are effectively discrete (fracture count).
    Linear,
}

/// Pick the stepping scale for a parameter.
///
/// Skin (`S`) may be negative and the fracture count (`nf`) is discrete, so
/// both always step linearly; everything else steps in log space as long as
/// its current value is strictly positive.
pub fn step_scale(name: &str, value: f64) -> StepScale {
    if value > 1e-12 && name != "S" && name != "nf" {
        StepScale::Log10
    } else {
        StepScale::Linear
    }
}

/// A named model parameter with bounds and a vary flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitParameter {
    /// Name of the parameter (fixed string identifier, e.g. "kf").
    pub name: String,

    /// Current value.
    pub value: f64,

    /// Whether the optimizer may adjust this parameter.
    pub vary: bool,

    /// Lower bound, applied by clamping trial steps.
    pub min: f64,

    /// Upper bound, applied by clamping trial steps.
    pub max: f64,
}

impl FitParameter {
    /// Create a fixed (non-varying) parameter with unbounded range.
    pub fn new(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            vary: false,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    /// Create a parameter with explicit bounds.
    pub fn with_bounds(name: &str, value: f64, min: f64, max: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            vary: false,
            min,
            max,
        }
    }

    /// Mark the parameter as free for the optimizer (builder style).
    pub fn varying(mut self) -> Self {
        self.vary = true;
        self
    }

    /// Clamp a candidate value into this parameter's bounds.
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_lands_exactly_on_bounds() {
        let p = FitParameter::with_bounds("kf", 10.0, 1e-6, 100.0);
        assert_eq!(p.clamp(250.0), 100.0);
        assert_eq!(p.clamp(-3.0), 1e-6);
        assert_eq!(p.clamp(42.0), 42.0);
    }

    #[test]
    fn test_step_scale_selection() {
        assert_eq!(step_scale("kf", 10.0), StepScale::Log10);
        assert_eq!(step_scale("omega1", 0.1), StepScale::Log10);
        // Skin and fracture count are always linear.
        assert_eq!(step_scale("S", 2.0), StepScale::Linear);
        assert_eq!(step_scale("nf", 4.0), StepScale::Linear);
        // Zero or negative values force a linear step.
        assert_eq!(step_scale("cD", 0.0), StepScale::Linear);
        assert_eq!(step_scale("anything", -1.0), StepScale::Linear);
    }

    #[test]
    fn test_serde_round_trip() {
        let p = FitParameter::with_bounds("S", 0.1, -5.0, 50.0).varying();
        let json = serde_json::to_string(&p).unwrap();
        let back: FitParameter = serde_json::from_str(&json).unwrap();
        assert_eq!(p, back);
    }
}
