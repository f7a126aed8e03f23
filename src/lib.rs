//! Pressure-transient analysis for multi-fractured horizontal wells in
//! composite reservoirs.
//!
//! The crate has two halves:
//!
//! - a semi-analytic **forward model** ([`model`]): the Laplace-domain
//!   solution of a fractured horizontal well in a radially composite,
//!   dual-porosity reservoir, six structural variants (three outer
//!   boundaries, with or without wellbore storage and skin), inverted to
//!   the time domain by the Stehfest algorithm;
//! - a **fitting engine** ([`fit`]): a Levenberg-Marquardt search over the
//!   free parameters against observed pressure and Bourdet-derivative
//!   curves, with per-iteration progress snapshots and cooperative
//!   cancellation, runnable on a background thread via
//!   [`fit::FitSession`].
//!
//! # Example
//!
//! ```no_run
//! use welltest::data::{ObservedData, PressureKind};
//! use welltest::fit::{FitConfig, FitSession};
//! use welltest::model::{ForwardModel, ModelVariant, OuterBoundary, StorageModel};
//!
//! # fn main() -> welltest::Result<()> {
//! let time = vec![0.1, 0.5, 1.0, 5.0, 10.0];
//! let gauge = vec![30.0, 29.2, 28.8, 28.1, 27.7];
//! let observed = ObservedData::from_raw(&time, &gauge, PressureKind::Gauge)?;
//!
//! let variant = ModelVariant::new(OuterBoundary::Infinite, StorageModel::Variable);
//! let mut table = variant.default_parameters();
//! for p in table.iter_mut() {
//!     if matches!(p.name.as_str(), "kf" | "omega1" | "lambda1") {
//!         p.vary = true;
//!     }
//! }
//!
//! let session = FitSession::spawn(
//!     ForwardModel::new(variant),
//!     table,
//!     observed,
//!     FitConfig::default(),
//! );
//! let outcome = session.wait()?;
//! println!("MSE {:.4e} after {} iterations", outcome.mean_squared_error, outcome.iterations);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod error;
pub mod fit;
pub mod math;
pub mod model;
pub mod parameters;

pub use error::{Result, WellTestError};
