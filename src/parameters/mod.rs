//! Parameter system: named values with bounds and vary flags, and the
//! flattened name -> value sets consumed by evaluation functions.

pub mod parameter;
pub mod set;

pub use parameter::{step_scale, FitParameter, StepScale};
pub use set::{adopt_values, ParameterSet};
