//! Pressure-transient forward model and its supporting types.

pub mod curve;
pub mod forward;
pub mod variant;

pub use curve::Curve;
pub use forward::{ForwardModel, Precision};
pub use variant::{default_bounds, default_value, ModelVariant, OuterBoundary, StorageModel};
