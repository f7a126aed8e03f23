//! Weighted log-space residuals between observed and modeled curves.
//!
//! Both channels are matched in log space, which is where well-test curves
//! are diagnosed: a residual is the difference of natural logs, scaled by
//! the channel weight. Samples where either side is at or below the
//! positivity floor contribute a zero residual instead of poisoning the
//! objective with infinities.

/// Positivity floor below which a sample is treated as unusable.
const LOG_FLOOR: f64 = 1e-10;

fn log_residual(observed: f64, modeled: f64, scale: f64) -> f64 {
    if observed > LOG_FLOOR && modeled > LOG_FLOOR {
        (observed.ln() - modeled.ln()) * scale
    } else {
        0.0
    }
}

/// Stacked residual vector: pressure entries first, derivative entries
/// after, scaled by `weight` and `1 - weight` respectively.
///
/// Counts are defensive: the pressure block uses the shorter of the
/// observed and modeled series, and the derivative block is additionally
/// capped by the pressure count so a sparse pressure record cannot be
/// outvoted by a dense derivative channel.
pub fn residuals(
    observed_pressure: &[f64],
    model_pressure: &[f64],
    observed_derivative: &[f64],
    model_derivative: &[f64],
    weight: f64,
) -> Vec<f64> {
    let np = observed_pressure.len().min(model_pressure.len());
    let nd = observed_derivative
        .len()
        .min(model_derivative.len())
        .min(np);

    let mut r = Vec::with_capacity(np + nd);
    for i in 0..np {
        r.push(log_residual(observed_pressure[i], model_pressure[i], weight));
    }
    for i in 0..nd {
        r.push(log_residual(
            observed_derivative[i],
            model_derivative[i],
            1.0 - weight,
        ));
    }
    r
}

/// Mean of squared residuals; zero for an empty vector.
pub fn mean_squared(residuals: &[f64]) -> f64 {
    if residuals.is_empty() {
        return 0.0;
    }
    residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_perfect_match_gives_zero() {
        let p = [1.0, 2.0, 3.0];
        let d = [0.5, 0.6];
        let r = residuals(&p, &p, &d, &d, 0.5);
        assert_eq!(r.len(), 5);
        assert!(r.iter().all(|&v| v == 0.0));
        assert_eq!(mean_squared(&r), 0.0);
    }

    #[test]
    fn test_weight_splits_channels() {
        let r = residuals(&[std::f64::consts::E], &[1.0], &[std::f64::consts::E], &[1.0], 0.3);
        // ln e - ln 1 = 1 on both channels.
        assert_relative_eq!(r[0], 0.3, max_relative = 1e-12);
        assert_relative_eq!(r[1], 0.7, max_relative = 1e-12);
    }

    #[test]
    fn test_nonpositive_samples_contribute_zero() {
        let r = residuals(&[1.0, -2.0, 0.0], &[2.0, 1.0, 1.0], &[1e-12], &[1.0], 0.5);
        assert!(r[0] != 0.0);
        assert_eq!(r[1], 0.0);
        assert_eq!(r[2], 0.0);
        assert_eq!(r[3], 0.0);
    }

    #[test]
    fn test_derivative_block_capped_by_pressure_count() {
        let r = residuals(&[1.0, 1.0], &[1.0, 1.0], &[1.0; 10], &[1.0; 10], 0.5);
        assert_eq!(r.len(), 4);
    }

    #[test]
    fn test_mean_squared_empty_is_zero() {
        assert_eq!(mean_squared(&[]), 0.0);
    }
}
