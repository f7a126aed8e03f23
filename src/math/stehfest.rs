//! Stehfest numerical inversion of Laplace transforms.
//!
//! Recovers a time-domain function from its Laplace-domain image through a
//! weighted sum of real-axis transform evaluations:
//!
//! `f(t) ~ (ln 2 / t) * sum_{i=1..N} c_i * F(i * ln 2 / t)`
//!
//! The signed coefficients `c_i` depend only on the (even) inversion order
//! `N`, so they are computed once and reused for every time point of a
//! curve. The order trades accuracy against floating-point cancellation:
//! too low loses resolution of sharp features, too high amplifies rounding
//! in the alternating sum. Orders 10-16 are the practical window for f64.

use std::f64::consts::LN_2;

/// Precomputed Stehfest inversion operator for a fixed even order.
#[derive(Debug, Clone)]
pub struct StehfestInverter {
    coefficients: Vec<f64>,
}

impl StehfestInverter {
    /// Build the inverter for even order `n` (odd `n` is rounded up).
    pub fn new(n: usize) -> Self {
        let n = if n % 2 == 0 { n } else { n + 1 };
        let coefficients = (1..=n).map(|i| coefficient(i, n)).collect();
        Self { coefficients }
    }

    /// Inversion order.
    pub fn order(&self) -> usize {
        self.coefficients.len()
    }

    /// Evaluate the time-domain value at `t > 0` from the Laplace-domain
    /// function `f`. Non-positive `t` yields NaN, which the forward model
    /// traps as an infeasible evaluation.
    pub fn invert<F: Fn(f64) -> f64>(&self, f: &F, t: f64) -> f64 {
        let a = LN_2 / t;
        let mut sum = 0.0;
        for (i, c) in self.coefficients.iter().enumerate() {
            sum += c * f((i + 1) as f64 * a);
        }
        sum * a
    }
}

/// Stehfest coefficient `c_i` for order `n`:
///
/// `c_i = (-1)^(n/2 + i) * sum_k k^(n/2) (2k)! / ((n/2-k)! k! (k-1)! (i-k)! (2k-i)!)`
///
/// with `k` from `floor((i+1)/2)` to `min(i, n/2)`.
fn coefficient(i: usize, n: usize) -> f64 {
    let half = n / 2;
    let mut sum = 0.0;
    for k in (i + 1) / 2..=i.min(half) {
        sum += (k as f64).powi(half as i32) * factorial(2 * k)
            / (factorial(half - k)
                * factorial(k)
                * factorial(k - 1)
                * factorial(i - k)
                * factorial(2 * k - i));
    }
    if (half + i) % 2 == 0 {
        sum
    } else {
        -sum
    }
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, v| acc * v as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_coefficients_sum_to_zero() {
        // The signed Stehfest coefficients cancel exactly: sum c_i = 0.
        for n in [8, 10, 12, 14, 16] {
            let inv = StehfestInverter::new(n);
            let sum: f64 = inv.coefficients.iter().sum();
            let scale: f64 = inv.coefficients.iter().map(|c| c.abs()).sum();
            assert!(sum.abs() < scale * 1e-12, "order {}: sum = {}", n, sum);
        }
    }

    #[test]
    fn test_odd_order_rounds_up() {
        assert_eq!(StehfestInverter::new(11).order(), 12);
        assert_eq!(StehfestInverter::new(10).order(), 10);
    }

    #[test]
    fn test_invert_constant_pair() {
        // L{1}(s) = 1/s must recover f(t) = 1 over several decades.
        for n in [10, 12, 14] {
            let inv = StehfestInverter::new(n);
            for exp in -3..=3 {
                let t = 10f64.powi(exp);
                assert_relative_eq!(inv.invert(&|s: f64| 1.0 / s, t), 1.0, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn test_invert_exponential_pair() {
        // L{exp(-t)}(s) = 1/(s+1).
        let inv = StehfestInverter::new(14);
        for &t in &[0.1, 0.5, 1.0, 2.0] {
            assert_relative_eq!(
                inv.invert(&|s: f64| 1.0 / (s + 1.0), t),
                (-t).exp(),
                max_relative = 1e-4
            );
        }
    }

    #[test]
    fn test_invert_power_pair() {
        // L{t}(s) = 1/s^2.
        let inv = StehfestInverter::new(12);
        for &t in &[0.01, 1.0, 100.0] {
            assert_relative_eq!(inv.invert(&|s: f64| 1.0 / (s * s), t), t, max_relative = 1e-6);
        }
    }
}
