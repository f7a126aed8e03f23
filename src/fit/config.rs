//! Configuration for the Levenberg-Marquardt fit.

use serde::{Deserialize, Serialize};

use crate::model::Precision;

/// Tunables of the damped least-squares search.
///
/// The defaults reproduce the stock interactive behavior: up to 50 outer
/// iterations, convergence once the mean squared log-residual drops below
/// 3e-3, damping started at 0.01 and moved by factors of ten, and a fast
/// model evaluation during the search with a high-accuracy final pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Maximum outer iterations.
    pub max_iterations: usize,
    /// Accept-and-stop threshold on the mean squared residual.
    pub mse_threshold: f64,
    /// Initial damping factor.
    pub initial_lambda: f64,
    /// Multiplier applied to the damping after a rejected trial step.
    pub lambda_up: f64,
    /// Divisor applied to the damping after an accepted step.
    pub lambda_down: f64,
    /// Damping value beyond which the search is declared stuck.
    pub max_lambda: f64,
    /// Trial steps per outer iteration before giving the step up.
    pub max_trial_steps: usize,
    /// Blend between pressure and derivative channels, in [0, 1]:
    /// pressure residuals scale by `weight`, derivative residuals by
    /// `1 - weight`.
    pub weight: f64,
    /// Model accuracy used inside the search loop.
    pub search_precision: Precision,
    /// Model accuracy used for the final reported curve.
    pub report_precision: Precision,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            mse_threshold: 3e-3,
            initial_lambda: 0.01,
            lambda_up: 10.0,
            lambda_down: 10.0,
            max_lambda: 1e10,
            max_trial_steps: 5,
            weight: 0.5,
            search_precision: Precision::Fast,
            report_precision: Precision::High,
        }
    }
}

impl FitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_mse_threshold(mut self, threshold: f64) -> Self {
        self.mse_threshold = threshold;
        self
    }

    pub fn with_initial_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.clamp(0.0, 1.0);
        self
    }

    pub fn with_search_precision(mut self, precision: Precision) -> Self {
        self.search_precision = precision;
        self
    }

    pub fn with_report_precision(mut self, precision: Precision) -> Self {
        self.report_precision = precision;
        self
    }
}
