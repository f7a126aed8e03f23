//! Observed pressure-transient data.
//!
//! Field records arrive either as raw gauge pressure (converted to a
//! drawdown magnitude against the initial reading) or as an already
//! reduced pressure drop. The pressure and derivative series are kept as
//! separate, independently sized channels since hosts routinely load them
//! from different files or resample them differently.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WellTestError};

/// Smoothing window, in natural-log time units, of the Bourdet derivative.
pub const BOURDET_WINDOW: f64 = 0.15;

/// Interpretation of a raw pressure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PressureKind {
    /// Absolute gauge readings; drawdown is `|p - p_initial|` with the
    /// first sample as the initial pressure.
    Gauge,
    /// The record is already a pressure drop.
    Drawdown,
}

/// Observed data the fit is driven by: a pressure-drop channel and a
/// log-derivative channel, each on its own time grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservedData {
    /// Times of the pressure-drop samples, hours.
    pub pressure_time: Vec<f64>,
    /// Pressure drop, MPa.
    pub pressure_drop: Vec<f64>,
    /// Times of the derivative samples, hours.
    pub derivative_time: Vec<f64>,
    /// Bourdet derivative, MPa.
    pub derivative: Vec<f64>,
}

impl ObservedData {
    /// Build from pre-reduced channels, validating their shape.
    pub fn new(
        pressure_time: Vec<f64>,
        pressure_drop: Vec<f64>,
        derivative_time: Vec<f64>,
        derivative: Vec<f64>,
    ) -> Result<Self> {
        if pressure_time.len() != pressure_drop.len() {
            return Err(WellTestError::MalformedObservedData(format!(
                "pressure channel length mismatch: {} times vs {} values",
                pressure_time.len(),
                pressure_drop.len()
            )));
        }
        if derivative_time.len() != derivative.len() {
            return Err(WellTestError::MalformedObservedData(format!(
                "derivative channel length mismatch: {} times vs {} values",
                derivative_time.len(),
                derivative.len()
            )));
        }
        if pressure_time.is_empty() {
            return Err(WellTestError::MalformedObservedData(
                "pressure channel is empty".to_string(),
            ));
        }
        for &t in pressure_time.iter().chain(derivative_time.iter()) {
            if !(t > 0.0) || !t.is_finite() {
                return Err(WellTestError::MalformedObservedData(format!(
                    "time points must be strictly positive and finite, got {}",
                    t
                )));
            }
        }
        Ok(Self {
            pressure_time,
            pressure_drop,
            derivative_time,
            derivative,
        })
    }

    /// Reduce a raw gauge record into observed data.
    ///
    /// Non-positive times are dropped (shut-in markers, zero-time rows).
    /// For [`PressureKind::Gauge`] the first surviving sample defines the
    /// initial pressure and the channel becomes `|p - p_initial|`. The
    /// derivative channel is computed from the reduced drop on the same
    /// grid with the stock [`BOURDET_WINDOW`].
    pub fn from_raw(time: &[f64], pressure: &[f64], kind: PressureKind) -> Result<Self> {
        if time.len() != pressure.len() {
            return Err(WellTestError::MalformedObservedData(format!(
                "raw record length mismatch: {} times vs {} values",
                time.len(),
                pressure.len()
            )));
        }
        let mut t_kept = Vec::with_capacity(time.len());
        let mut p_kept = Vec::with_capacity(time.len());
        for (&t, &p) in time.iter().zip(pressure) {
            if t > 0.0 && t.is_finite() && p.is_finite() {
                t_kept.push(t);
                p_kept.push(p);
            }
        }
        if t_kept.is_empty() {
            return Err(WellTestError::MalformedObservedData(
                "no usable samples after filtering non-positive times".to_string(),
            ));
        }
        let drop: Vec<f64> = match kind {
            PressureKind::Gauge => {
                let p0 = p_kept[0];
                p_kept.iter().map(|&p| (p - p0).abs()).collect()
            }
            PressureKind::Drawdown => p_kept,
        };
        let derivative = bourdet_derivative(&t_kept, &drop, BOURDET_WINDOW)?;
        Self::new(t_kept.clone(), drop, t_kept, derivative)
    }

    /// Points in the pressure channel.
    pub fn pressure_len(&self) -> usize {
        self.pressure_time.len()
    }

    /// Points in the derivative channel.
    pub fn derivative_len(&self) -> usize {
        self.derivative_time.len()
    }
}

/// Bourdet logarithmic derivative of a sampled curve.
///
/// For each point the nearest neighbors at least `window` away in ln t on
/// each side anchor two secant slopes, combined with weights swapped
/// relative to their distances; endpoints fall back to the one-sided
/// slope. Requires strictly increasing, positive times.
pub fn bourdet_derivative(time: &[f64], pressure: &[f64], window: f64) -> Result<Vec<f64>> {
    if time.len() != pressure.len() {
        return Err(WellTestError::DimensionMismatch(format!(
            "derivative input: {} times vs {} pressures",
            time.len(),
            pressure.len()
        )));
    }
    let n = time.len();
    if n < 2 {
        return Ok(vec![0.0; n]);
    }
    for w in time.windows(2) {
        if !(w[0] > 0.0) || w[1] <= w[0] {
            return Err(WellTestError::MalformedObservedData(
                "derivative input times must be positive and strictly increasing".to_string(),
            ));
        }
    }
    let lnt: Vec<f64> = time.iter().map(|&t| t.ln()).collect();

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        // Nearest sample at least `window` back in ln t; the first sample
        // if none is far enough.
        let mut l = i;
        while l > 0 && lnt[i] - lnt[l] < window {
            l -= 1;
        }
        let mut r = i;
        while r < n - 1 && lnt[r] - lnt[i] < window {
            r += 1;
        }
        let d = if l == i && r == i {
            0.0
        } else if l == i {
            (pressure[r] - pressure[i]) / (lnt[r] - lnt[i])
        } else if r == i {
            (pressure[i] - pressure[l]) / (lnt[i] - lnt[l])
        } else {
            let dxl = lnt[i] - lnt[l];
            let dxr = lnt[r] - lnt[i];
            let sl = (pressure[i] - pressure[l]) / dxl;
            let sr = (pressure[r] - pressure[i]) / dxr;
            (sl * dxr + sr * dxl) / (dxl + dxr)
        };
        out.push(d);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_gauge_record_reduced_to_drop_magnitude() {
        let time = vec![0.0, 0.1, 1.0, 10.0];
        let pressure = vec![30.0, 29.5, 28.0, 26.0];
        let data = ObservedData::from_raw(&time, &pressure, PressureKind::Gauge).unwrap();
        // The zero-time row is dropped; the first kept sample is the datum.
        assert_eq!(data.pressure_time, vec![0.1, 1.0, 10.0]);
        assert_eq!(data.pressure_drop, vec![0.0, 1.5, 3.5]);
    }

    #[test]
    fn test_drawdown_record_kept_as_is() {
        let time = vec![0.1, 1.0];
        let drop = vec![0.4, 1.2];
        let data = ObservedData::from_raw(&time, &drop, PressureKind::Drawdown).unwrap();
        assert_eq!(data.pressure_drop, drop);
    }

    #[test]
    fn test_bourdet_derivative_of_log_line() {
        // p = a ln t + b has constant derivative a everywhere.
        let time: Vec<f64> = (0..40).map(|i| 10f64.powf(-2.0 + 0.1 * i as f64)).collect();
        let pressure: Vec<f64> = time.iter().map(|t| 2.5 * t.ln() + 1.0).collect();
        let d = bourdet_derivative(&time, &pressure, BOURDET_WINDOW).unwrap();
        for &v in &d {
            assert_relative_eq!(v, 2.5, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_derivative_rejects_unsorted_times() {
        let err = bourdet_derivative(&[1.0, 0.5, 2.0], &[0.0, 1.0, 2.0], BOURDET_WINDOW);
        assert!(matches!(err, Err(WellTestError::MalformedObservedData(_))));
    }

    #[test]
    fn test_channel_length_mismatch_rejected() {
        let err = ObservedData::new(vec![1.0, 2.0], vec![0.5], vec![], vec![]);
        assert!(matches!(err, Err(WellTestError::MalformedObservedData(_))));
    }

    #[test]
    fn test_all_nonpositive_times_rejected() {
        let err = ObservedData::from_raw(&[0.0, -1.0], &[30.0, 29.0], PressureKind::Gauge);
        assert!(matches!(err, Err(WellTestError::MalformedObservedData(_))));
    }
}
