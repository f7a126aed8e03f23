//! Name-to-value parameter sets.
//!
//! A `ParameterSet` is the flattened view the evaluation functions consume:
//! a plain name -> value map, passed by value into pure code. Derived
//! entries (currently the dimensionless fracture half-length `LfD = Lf/L`)
//! are recomputed deterministically from their sources and never stored
//! independently by callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WellTestError};
use crate::parameters::parameter::FitParameter;

/// Ordered mapping from parameter name to numeric value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a parameter table, then recompute derived entries.
    pub fn from_parameters(params: &[FitParameter]) -> Self {
        let mut set = Self {
            values: params
                .iter()
                .map(|p| (p.name.clone(), p.value))
                .collect(),
        };
        set.update_derived();
        set
    }

    /// Look up a value.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Look up a required value, erroring with the parameter name.
    pub fn require(&self, name: &str) -> Result<f64> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| WellTestError::InvalidParameter(format!("'{}' is missing", name)))
    }

    /// Insert or overwrite a value. Callers mutating `L` or `Lf` must call
    /// [`ParameterSet::update_derived`] afterwards.
    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    /// Recompute dependent derived entries from their source parameters.
    ///
    /// `LfD = Lf / L` whenever both lengths are present and `L` is usable;
    /// degenerate geometry pins it to 0.
    pub fn update_derived(&mut self) {
        let lfd = match (self.get("L"), self.get("Lf")) {
            (Some(l), Some(lf)) if l > 1e-9 => lf / l,
            _ => 0.0,
        };
        if self.values.contains_key("L") || self.values.contains_key("Lf") {
            self.values.insert("LfD".to_string(), lfd);
        }
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Snapshot as a plain map (for emission to the host).
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.values.clone()
    }

    /// Number of entries, derived ones included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Carry same-named values from an old parameter table into a new one.
///
/// Used when the host switches model variants: parameters shared between
/// the two variants keep their current values, new ones keep defaults.
pub fn adopt_values(new_table: &mut [FitParameter], old_table: &[FitParameter]) {
    for p in new_table.iter_mut() {
        if let Some(old) = old_table.iter().find(|o| o.name == p.name) {
            p.value = old.value;
        }
    }
}
