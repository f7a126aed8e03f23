//! Damped least-squares (Levenberg-Marquardt) parameter search.
//!
//! The loop matches observed log-space curves against the forward model:
//! each outer iteration builds a central-difference Jacobian, then tries up
//! to a handful of damped normal-equation steps, growing the damping after
//! every rejection and shrinking it after an acceptance. Accepted steps are
//! reported through a snapshot callback so a host can animate the fit; a
//! shared atomic flag stops the search cooperatively between iterations.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::data::ObservedData;
use crate::error::Result;
use crate::fit::config::FitConfig;
use crate::fit::jacobian::central_difference;
use crate::fit::residual::{mean_squared, residuals};
use crate::model::{Curve, ForwardModel, Precision};
use crate::parameters::{step_scale, FitParameter, ParameterSet, StepScale};

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Mean squared residual fell below the configured threshold.
    Converged,
    /// The cancellation flag was raised.
    StoppedByUser,
    /// No acceptable step was found before the damping hit its ceiling.
    StoppedByDampingLimit,
    /// The iteration budget ran out.
    IterationLimitReached,
}

/// Progress report emitted for the starting point, after every accepted
/// step, and once more for the final high-accuracy evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSnapshot {
    /// Outer iterations completed so far (0 for the starting report).
    pub iteration: usize,
    /// Mean squared log-residual at the current point.
    pub mean_squared_error: f64,
    /// Monotonic fraction of the iteration budget spent, in [0, 1]; 1.0
    /// for the final report.
    pub progress: f64,
    /// Full parameter map at the current point, derived entries included.
    pub parameters: BTreeMap<String, f64>,
    /// Model curve on the display grid at the current point.
    pub curve: Curve,
}

impl FitSnapshot {
    /// Serialize for hosts consuming progress over a pipe or socket.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::error::WellTestError::Other(e.to_string()))
    }
}

/// Final state of a finished search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitOutcome {
    /// Parameter table with fitted values written back into the varying
    /// rows; fixed rows are untouched.
    pub parameters: Vec<FitParameter>,
    /// Mean squared log-residual at the final point, evaluated at the
    /// reporting accuracy.
    pub mean_squared_error: f64,
    /// Outer iterations performed.
    pub iterations: usize,
    pub stop_reason: StopReason,
    /// High-accuracy model curve on the display grid at the final point.
    pub curve: Curve,
}

/// The search driver. Holds only configuration; all inputs are passed to
/// [`LevenbergMarquardt::fit`], which is safe to run on a worker thread.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    config: FitConfig,
}

impl LevenbergMarquardt {
    pub fn new(config: FitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Run the search from the given parameter table.
    ///
    /// `on_iteration` receives a snapshot for the starting point, one
    /// after every accepted step, and a final one at reporting accuracy.
    /// `stop` is polled once per outer
    /// iteration; raising it finishes the search with
    /// [`StopReason::StoppedByUser`] and the best point found so far.
    ///
    /// An error from the very first model evaluation is propagated, since
    /// the search cannot start from an infeasible point; later infeasible
    /// trial steps are treated as rejections instead.
    pub fn fit(
        &self,
        model: &ForwardModel,
        table: &[FitParameter],
        observed: &ObservedData,
        stop: &AtomicBool,
        mut on_iteration: impl FnMut(FitSnapshot),
    ) -> Result<FitOutcome> {
        let cfg = &self.config;
        let free_names: Vec<String> = table
            .iter()
            .filter(|p| p.vary)
            .map(|p| p.name.clone())
            .collect();

        let mut table = table.to_vec();
        let mut current = ParameterSet::from_parameters(&table);
        let mut r = self.eval_residuals(model, &current, observed, cfg.search_precision)?;
        let mut mse = mean_squared(&r);

        // Report the starting misfit before any step, so a host can draw
        // the initial curve against the data.
        on_iteration(FitSnapshot {
            iteration: 0,
            progress: 0.0,
            mean_squared_error: mse,
            parameters: current.to_map(),
            curve: model
                .evaluate_log_grid(&current, cfg.search_precision)
                .unwrap_or_default(),
        });

        let mut lambda = cfg.initial_lambda;
        let mut iterations = 0usize;

        let stop_reason = loop {
            if free_names.is_empty() {
                break StopReason::Converged;
            }
            if stop.load(Ordering::Relaxed) {
                break StopReason::StoppedByUser;
            }
            if mse < cfg.mse_threshold {
                break StopReason::Converged;
            }
            if iterations >= cfg.max_iterations {
                break StopReason::IterationLimitReached;
            }
            iterations += 1;

            let jac = central_difference(&current, &free_names, r.len(), |set| {
                self.eval_residuals(model, set, observed, cfg.search_precision)
                    .ok()
            });
            let gradient = jac.t().dot(&Array1::from(r.clone()));
            let hessian = jac.t().dot(&jac);

            let mut accepted = false;
            for _ in 0..cfg.max_trial_steps {
                if lambda > cfg.max_lambda {
                    break;
                }
                // Marquardt scaling: damp each diagonal entry relative to
                // its own magnitude, with an absolute floor so zero
                // columns stay invertible.
                let mut damped = hessian.clone();
                for i in 0..free_names.len() {
                    damped[[i, i]] += lambda * (1.0 + damped[[i, i]].abs());
                }
                let step = match solve_symmetric(&damped, &gradient) {
                    Some(step) => step,
                    None => {
                        lambda *= cfg.lambda_up;
                        continue;
                    }
                };

                let mut trial = table.clone();
                for (k, p) in trial.iter_mut().filter(|p| p.vary).enumerate() {
                    // The step lives in the same search coordinate the
                    // Jacobian was taken in; bounds clamp afterwards.
                    let candidate = match step_scale(&p.name, p.value) {
                        StepScale::Log10 => 10f64.powf(p.value.log10() - step[k]),
                        StepScale::Linear => p.value - step[k],
                    };
                    p.value = p.clamp(candidate);
                }
                let trial_set = ParameterSet::from_parameters(&trial);
                let trial_r =
                    match self.eval_residuals(model, &trial_set, observed, cfg.search_precision) {
                        Ok(r) => r,
                        Err(_) => {
                            lambda *= cfg.lambda_up;
                            continue;
                        }
                    };
                let trial_mse = mean_squared(&trial_r);
                if trial_mse < mse {
                    table = trial;
                    current = trial_set;
                    r = trial_r;
                    mse = trial_mse;
                    lambda /= cfg.lambda_down;
                    accepted = true;
                    on_iteration(FitSnapshot {
                        iteration: iterations,
                        progress: iterations as f64 / cfg.max_iterations.max(1) as f64,
                        mean_squared_error: mse,
                        parameters: current.to_map(),
                        curve: model
                            .evaluate_log_grid(&current, cfg.search_precision)
                            .unwrap_or_default(),
                    });
                    break;
                }
                lambda *= cfg.lambda_up;
            }

            // Exhausted trials keep raising the damping; the next outer
            // iteration retries from the same point until the damping
            // runs away.
            if !accepted && lambda > cfg.max_lambda {
                break StopReason::StoppedByDampingLimit;
            }
        };

        // Final pass at reporting accuracy; if the high-accuracy
        // evaluation is infeasible at the converged point, the
        // search-accuracy figures stand.
        let final_mse = self
            .eval_residuals(model, &current, observed, cfg.report_precision)
            .map(|r| mean_squared(&r))
            .unwrap_or(mse);
        let final_curve = model
            .evaluate_log_grid(&current, cfg.report_precision)
            .unwrap_or_default();
        on_iteration(FitSnapshot {
            iteration: iterations,
            progress: 1.0,
            mean_squared_error: final_mse,
            parameters: current.to_map(),
            curve: final_curve.clone(),
        });

        Ok(FitOutcome {
            parameters: table,
            mean_squared_error: final_mse,
            iterations,
            stop_reason,
            curve: final_curve,
        })
    }

    fn eval_residuals(
        &self,
        model: &ForwardModel,
        params: &ParameterSet,
        observed: &ObservedData,
        precision: Precision,
    ) -> Result<Vec<f64>> {
        let pressure = model.evaluate(params, &observed.pressure_time, precision)?;
        let derivative = if observed.derivative_time.is_empty() {
            Curve::default()
        } else {
            model.evaluate(params, &observed.derivative_time, precision)?
        };
        Ok(residuals(
            &observed.pressure_drop,
            &pressure.pressure,
            &observed.derivative,
            &derivative.derivative,
            self.config.weight,
        ))
    }
}

/// Solve `a x = b` for symmetric positive-definite `a` by Cholesky
/// factorization. Returns `None` when a pivot is not strictly positive,
/// which the caller treats as a cue to raise the damping.
fn solve_symmetric(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return None;
                }
                l[[i, j]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in i + 1..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    Some(x)
}
