//! Curve-fitting engine: residuals, Jacobian, the damped least-squares
//! search, and the background session wrapper.

pub mod config;
pub mod jacobian;
pub mod optimizer;
pub mod residual;
pub mod session;

pub use config::FitConfig;
pub use optimizer::{FitOutcome, FitSnapshot, LevenbergMarquardt, StopReason};
pub use session::{FitEvent, FitSession};
