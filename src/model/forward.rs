//! Forward model: composite-reservoir multi-fracture horizontal well.
//!
//! The Laplace-domain solution is assembled from a composite-radial
//! line-source kernel (inner stimulated region with dual-porosity
//! cross-flow, outer matrix region, continuity of pressure and flux at the
//! composite radius `rmD`), superposed over the discretized fracture flow
//! points of the horizontal well, then corrected for wellbore storage and
//! skin and for the outer-boundary condition. Inversion to the time domain
//! uses the Stehfest algorithm; stress sensitivity is applied afterwards
//! through the Pedrosa transform.
//!
//! All Bessel factors are evaluated in exponentially scaled form and the
//! exponents are recombined analytically, so the solution stays finite for
//! Laplace arguments far beyond the unscaled overflow point.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WellTestError};
use crate::math::{
    adaptive_gauss, scaled_bessel_i, scaled_bessel_k0, scaled_bessel_k1, StehfestInverter,
};
use crate::model::curve::Curve;
use crate::model::variant::{ModelVariant, OuterBoundary, StorageModel};
use crate::parameters::ParameterSet;

/// Half step, in ln t, of the centered difference that produces the
/// Bourdet derivative of the model curve.
const DERIVATIVE_STEP: f64 = 0.02;

/// Shortest kernel distance; caps the integrable logarithmic singularity
/// of the self-interaction term.
const MIN_KERNEL_DISTANCE: f64 = 1e-9;

/// Evaluation accuracy mode, passed explicitly with every call.
///
/// `Fast` is meant for the inner loop of the optimizer where thousands of
/// evaluations race against interactivity; `High` is for final results and
/// display curves. Keeping the mode an argument (not model state) keeps
/// evaluation pure and shareable across threads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Fast,
    High,
}

impl Precision {
    fn stehfest_order(self) -> usize {
        match self {
            Precision::Fast => 10,
            Precision::High => 14,
        }
    }

    fn quadrature_tol(self) -> f64 {
        match self {
            Precision::Fast => 1e-4,
            Precision::High => 1e-7,
        }
    }

    fn quadrature_depth(self) -> usize {
        match self {
            Precision::Fast => 8,
            Precision::High => 12,
        }
    }
}

/// Dimensionless groups derived from a physical parameter set.
struct Dimensionless {
    /// Mobility ratio kf/km between inner and outer region.
    m12: f64,
    /// Fracture half-length normalized by the horizontal well length.
    lfd: f64,
    /// Composite (inner-region) dimensionless radius.
    rmd: f64,
    /// Outer-boundary dimensionless radius (bounded variants only).
    red: f64,
    /// Dimensionless wellbore storage (variable-storage variants only).
    cd: f64,
    /// Skin factor (variable-storage variants only).
    skin: f64,
    /// Stress-sensitivity coefficient.
    gamad: f64,
    /// Inner-region storativity ratio.
    omega1: f64,
    /// Outer-region storativity ratio.
    omega2: f64,
    /// Interporosity flow coefficient of the inner region.
    lambda1: f64,
    /// Fracture count.
    nf: usize,
    /// tD = t_scale * t, t in hours.
    t_scale: f64,
    /// delta-p = p_scale * pD, in MPa.
    p_scale: f64,
}

impl Dimensionless {
    fn from_set(params: &ParameterSet, variant: ModelVariant) -> Result<Self> {
        let positive = |name: &str| -> Result<f64> {
            let v = params.require(name)?;
            if v > 0.0 && v.is_finite() {
                Ok(v)
            } else {
                Err(WellTestError::InvalidParameter(format!(
                    "'{}' must be positive and finite, got {}",
                    name, v
                )))
            }
        };

        let phi = positive("phi")?;
        let h = positive("h")?;
        let mu = positive("mu")?;
        let b = positive("B")?;
        let ct = positive("Ct")?;
        let q = positive("q")?;
        let kf = positive("kf")?;
        let km = positive("km")?;
        let l = positive("L")?;
        let lf = positive("Lf")?;
        let rmd = positive("rmD")?;
        let omega1 = positive("omega1")?;
        let omega2 = positive("omega2")?;
        let lambda1 = positive("lambda1")?;
        let gamad = params.require("gamaD")?;

        let nf = positive("nf")?.round();
        if nf < 1.0 {
            return Err(WellTestError::InvalidParameter(
                "'nf' must be at least 1".to_string(),
            ));
        }
        if gamad < 0.0 {
            return Err(WellTestError::InvalidParameter(
                "'gamaD' must be non-negative".to_string(),
            ));
        }

        let lfd = match params.get("LfD") {
            Some(v) => v,
            None => lf / l,
        };
        if !(lfd > 0.0) {
            return Err(WellTestError::InvalidParameter(
                "degenerate geometry: LfD must be positive".to_string(),
            ));
        }

        let red = if variant.has_outer_radius() {
            let red = positive("reD")?;
            if red <= rmd {
                return Err(WellTestError::InvalidParameter(format!(
                    "'reD' ({}) must exceed the composite radius 'rmD' ({})",
                    red, rmd
                )));
            }
            red
        } else {
            f64::INFINITY
        };

        let (cd, skin) = if variant.has_storage_skin() {
            let cd = params.require("cD")?;
            if cd < 0.0 {
                return Err(WellTestError::InvalidParameter(
                    "'cD' must be non-negative".to_string(),
                ));
            }
            (cd, params.require("S")?)
        } else {
            (0.0, 0.0)
        };

        Ok(Self {
            m12: kf / km,
            lfd,
            rmd,
            red,
            cd,
            skin,
            gamad,
            omega1,
            omega2,
            lambda1,
            nf: nf as usize,
            // tD = 3.6e-3 kf t / (phi mu Ct L^2): kf in mD, t in h, mu in
            // mPa*s, Ct in 1/MPa, L in m.
            t_scale: 3.6e-3 * kf / (phi * mu * ct * l * l),
            // delta-p = 1.842 q mu B / (kf h) * pD, in MPa.
            p_scale: 1.842 * q * mu * b / (kf * h),
        })
    }
}

/// The forward model for one structural variant.
///
/// Evaluation is a pure function of `(parameters, time grid, precision)`;
/// the model object itself holds only the variant tag and is freely
/// shareable across threads.
#[derive(Debug, Clone, Copy)]
pub struct ForwardModel {
    variant: ModelVariant,
}

impl ForwardModel {
    pub fn new(variant: ModelVariant) -> Self {
        Self { variant }
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Evaluate the pressure and Bourdet-derivative curve at the given
    /// dimensional time points (hours, strictly positive).
    ///
    /// Degenerate parameter combinations that drive the solution non-finite
    /// are reported as [`WellTestError::InfeasibleEvaluation`]; they are
    /// recoverable from the optimizer's point of view.
    pub fn evaluate(
        &self,
        params: &ParameterSet,
        time: &[f64],
        precision: Precision,
    ) -> Result<Curve> {
        if time.is_empty() {
            return Err(WellTestError::InvalidInput(
                "empty time grid".to_string(),
            ));
        }
        let groups = Dimensionless::from_set(params, self.variant)?;
        let inverter = StehfestInverter::new(precision.stehfest_order());
        let tol = precision.quadrature_tol();
        let depth = precision.quadrature_depth();

        let mut curve = Curve {
            time: Vec::with_capacity(time.len()),
            pressure: Vec::with_capacity(time.len()),
            derivative: Vec::with_capacity(time.len()),
        };

        let laplace = |z: f64| self.wellbore_laplace(&groups, z, tol, depth);
        let step = DERIVATIVE_STEP.exp();

        for &t in time {
            if !(t > 0.0) || !t.is_finite() {
                return Err(WellTestError::InvalidInput(format!(
                    "time points must be strictly positive, got {}",
                    t
                )));
            }
            let td = groups.t_scale * t;
            let p0 = pedrosa(inverter.invert(&laplace, td), groups.gamad);
            let pp = pedrosa(inverter.invert(&laplace, td * step), groups.gamad);
            let pm = pedrosa(inverter.invert(&laplace, td / step), groups.gamad);
            let dp = (pp - pm) / (2.0 * DERIVATIVE_STEP);
            if !p0.is_finite() || !dp.is_finite() {
                return Err(WellTestError::InfeasibleEvaluation(format!(
                    "non-finite model response at t = {} h",
                    t
                )));
            }
            curve.time.push(t);
            curve.pressure.push(groups.p_scale * p0);
            curve.derivative.push(groups.p_scale * dp);
        }
        Ok(curve)
    }

    /// Evaluate on the stock log-spaced display grid (1e-4 to 1e4 hours).
    pub fn evaluate_log_grid(&self, params: &ParameterSet, precision: Precision) -> Result<Curve> {
        let time: Vec<f64> = (0..=80).map(|i| 10f64.powf(-4.0 + 0.1 * i as f64)).collect();
        self.evaluate(params, &time, precision)
    }

    /// Laplace-domain dimensionless wellbore pressure at argument `z`.
    fn wellbore_laplace(&self, g: &Dimensionless, z: f64, tol: f64, depth: usize) -> f64 {
        // Dual-porosity transfer of the inner (stimulated) region; the
        // outer matrix contributes its storativity ratio only.
        let fs1 = (g.omega1 * (1.0 - g.omega1) * z + g.lambda1)
            / ((1.0 - g.omega1) * z + g.lambda1);
        let sig1 = (z * fs1).sqrt();
        let sig2 = (z * g.m12 * g.omega2).sqrt();

        let beta = boundary_beta(self.variant.boundary, sig2, g.rmd, g.red);

        // Inner-region reflection coefficient from pressure/flux continuity
        // at rmD, in scaled form: A = exp(-2 sig1 rmD) * a_t.
        let x1 = sig1 * g.rmd;
        let a_t = (g.m12 * sig1 * scaled_bessel_k1(x1) - beta * scaled_bessel_k0(x1))
            / (g.m12 * sig1 * scaled_bessel_i(1, x1) + beta * scaled_bessel_i(0, x1));

        // Line-source kernel of the composite system, exponents recombined:
        // S(r) = K0(sig1 r) + A I0(sig1 r).
        let kernel = |r: f64| {
            let x = sig1 * r;
            (-x).exp() * scaled_bessel_k0(x)
                + a_t * (x - 2.0 * x1).exp() * scaled_bessel_i(0, x)
        };

        // Superpose the nf fracture planes (midpoints evenly spaced along
        // the unit-length well, equal rate split). Interactions depend only
        // on the midpoint separation k/nf, so each distance is integrated
        // once and weighted by its multiplicity.
        let nf = g.nf as f64;
        let mut sum = 0.0;
        for k in 0..g.nf {
            let mult = if k == 0 { nf } else { 2.0 * (nf - k as f64) };
            let d2 = (k as f64 / nf).powi(2);
            let convolved = adaptive_gauss(
                &|y: f64| kernel((d2 + y * y).sqrt().max(MIN_KERNEL_DISTANCE)),
                0.0,
                g.lfd,
                tol,
                depth,
            );
            sum += mult * convolved / g.lfd;
        }
        let pwd = sum / (z * nf * nf);

        match self.variant.storage {
            StorageModel::Variable => {
                // Wellbore storage and skin deconvolution in Laplace space.
                let zp = z * pwd + g.skin;
                zp / (z * (1.0 + g.cd * z * zp))
            }
            StorageModel::Constant => pwd,
        }
    }
}

/// Outer-boundary coefficient of the composite solution: the logarithmic
/// derivative of the outer-region solution at the composite radius, with
/// the sign convention that `Infinite` reduces to `sig2 K1/K0`.
///
/// `Closed` imposes no flow at `reD`, `ConstantPressure` pins the pressure
/// there; both couple the growing outer solution back in with a factor
/// that decays like `exp(-2 sig2 (reD - rmD))`, so the scaled form stays
/// well conditioned for any argument size.
fn boundary_beta(boundary: OuterBoundary, sig2: f64, rmd: f64, red: f64) -> f64 {
    let xm = sig2 * rmd;
    match boundary {
        OuterBoundary::Infinite => sig2 * scaled_bessel_k1(xm) / scaled_bessel_k0(xm),
        OuterBoundary::Closed => {
            let xe = sig2 * red;
            let damp = (-2.0 * (xe - xm)).exp();
            let ratio = scaled_bessel_k1(xe) / scaled_bessel_i(1, xe);
            sig2 * (scaled_bessel_k1(xm) - damp * ratio * scaled_bessel_i(1, xm))
                / (scaled_bessel_k0(xm) + damp * ratio * scaled_bessel_i(0, xm))
        }
        OuterBoundary::ConstantPressure => {
            let xe = sig2 * red;
            let damp = (-2.0 * (xe - xm)).exp();
            let ratio = scaled_bessel_k0(xe) / scaled_bessel_i(0, xe);
            sig2 * (scaled_bessel_k1(xm) + damp * ratio * scaled_bessel_i(1, xm))
                / (scaled_bessel_k0(xm) - damp * ratio * scaled_bessel_i(0, xm))
        }
    }
}

/// Pedrosa transform for stress-sensitive permeability: maps the
/// zeroth-order perturbation solution into the deformed-medium pressure.
/// A response outside the transform's domain yields NaN, which the caller
/// traps as infeasible.
fn pedrosa(p0: f64, gamad: f64) -> f64 {
    if gamad <= 1e-12 {
        return p0;
    }
    let u = 1.0 - gamad * p0;
    if u <= 0.0 {
        f64::NAN
    } else {
        -u.ln() / gamad
    }
}
