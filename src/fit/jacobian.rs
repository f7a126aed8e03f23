//! Central-difference Jacobian of the residual vector.
//!
//! Columns are independent model evaluations, so they are computed in
//! parallel with rayon; the collect preserves column order, keeping the
//! result deterministic. Parameters spanning decades are perturbed
//! multiplicatively in log10 space, sign-carrying or near-zero ones
//! additively.

use ndarray::Array2;
use rayon::prelude::*;

use crate::parameters::{step_scale, ParameterSet, StepScale};

/// Half step, in log10 units, for multiplicatively perturbed parameters.
const LOG_STEP: f64 = 0.01;

/// Half step for additively perturbed parameters.
const LINEAR_STEP: f64 = 1e-4;

/// Jacobian of the residual vector with respect to the free parameters,
/// taken in each parameter's search coordinate: log10 of the value for
/// multiplicatively stepped parameters, the value itself otherwise. The
/// optimizer applies its steps in the same coordinate, which keeps the
/// normal equations well scaled for parameters spanning decades.
///
/// `eval` maps a parameter set to a residual vector, or `None` when the
/// evaluation is infeasible. A column whose perturbed evaluations fail or
/// come back the wrong length is left at zero; the damped normal
/// equations simply ignore that direction for the step.
pub fn central_difference<F>(
    base: &ParameterSet,
    free_names: &[String],
    residual_len: usize,
    eval: F,
) -> Array2<f64>
where
    F: Fn(&ParameterSet) -> Option<Vec<f64>> + Sync,
{
    let columns: Vec<Vec<f64>> = free_names
        .par_iter()
        .map(|name| {
            let value = match base.get(name) {
                Some(v) => v,
                None => return vec![0.0; residual_len],
            };
            let (v_plus, v_minus, span) = match step_scale(name, value) {
                StepScale::Log10 => {
                    let exponent = value.log10();
                    (
                        10f64.powf(exponent + LOG_STEP),
                        10f64.powf(exponent - LOG_STEP),
                        2.0 * LOG_STEP,
                    )
                }
                StepScale::Linear => (
                    value + LINEAR_STEP,
                    value - LINEAR_STEP,
                    2.0 * LINEAR_STEP,
                ),
            };

            let perturbed = |v: f64| {
                let mut set = base.clone();
                set.set(name, v);
                set.update_derived();
                eval(&set)
            };

            match (perturbed(v_plus), perturbed(v_minus)) {
                (Some(r_plus), Some(r_minus))
                    if r_plus.len() == residual_len && r_minus.len() == residual_len =>
                {
                    r_plus
                        .iter()
                        .zip(&r_minus)
                        .map(|(p, m)| (p - m) / span)
                        .collect()
                }
                _ => vec![0.0; residual_len],
            }
        })
        .collect();

    let mut jac = Array2::zeros((residual_len, free_names.len()));
    for (j, column) in columns.iter().enumerate() {
        for (i, &v) in column.iter().enumerate() {
            jac[[i, j]] = v;
        }
    }
    jac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::FitParameter;
    use approx::assert_relative_eq;

    fn set_with(name: &str, value: f64) -> ParameterSet {
        ParameterSet::from_parameters(&[FitParameter::new(name, value)])
    }

    #[test]
    fn test_quadratic_residual_derivative_in_log_space() {
        // r(k) = k^2 in the log10 coordinate x = log10 k:
        // dr/dx = 2 k^2 ln 10.
        let base = set_with("kf", 3.0);
        let jac = central_difference(&base, &["kf".to_string()], 1, |set| {
            Some(vec![set.get("kf").unwrap().powi(2)])
        });
        assert_eq!(jac.dim(), (1, 1));
        let expected = 2.0 * 9.0 * std::f64::consts::LN_10;
        assert_relative_eq!(jac[[0, 0]], expected, max_relative = 1e-3);
    }

    #[test]
    fn test_skin_uses_linear_step() {
        // S = 0 is untouchable by a multiplicative step; the linear rule
        // must still produce the slope.
        let base = set_with("S", 0.0);
        let jac = central_difference(&base, &["S".to_string()], 1, |set| {
            Some(vec![4.0 * set.get("S").unwrap()])
        });
        assert_relative_eq!(jac[[0, 0]], 4.0, max_relative = 1e-9);
    }

    #[test]
    fn test_failed_evaluation_zeroes_column() {
        let base = set_with("kf", 1.0);
        let jac = central_difference(&base, &["kf".to_string()], 3, |_| None);
        assert!(jac.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_length_mismatch_zeroes_column() {
        let base = set_with("kf", 1.0);
        let jac = central_difference(&base, &["kf".to_string()], 2, |_| Some(vec![1.0]));
        assert!(jac.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_derived_length_ratio_follows_perturbation() {
        // Perturbing L must refresh LfD before evaluation.
        let base = ParameterSet::from_parameters(&[
            FitParameter::new("L", 1000.0),
            FitParameter::new("Lf", 100.0),
        ]);
        let jac = central_difference(&base, &["L".to_string()], 1, |set| {
            Some(vec![set.get("LfD").unwrap()])
        });
        // d(Lf/L)/d(log10 L) = -(Lf/L) ln 10.
        let expected = -0.1 * std::f64::consts::LN_10;
        assert_relative_eq!(jac[[0, 0]], expected, max_relative = 1e-3);
    }
}
