//! Model variants and their canonical parameter tables.
//!
//! The six structural variants are the product of the wellbore-storage
//! treatment (variable storage with `cD`/`S`, or constant storage without
//! them) and the outer-boundary condition (infinite-acting, closed, or
//! constant-pressure at `reD`). All six share one forward-model
//! implementation; the variant tag only selects the storage correction,
//! the boundary coefficient, and the canonical parameter ordering the host
//! binds its table rows to.

use serde::{Deserialize, Serialize};

use crate::parameters::FitParameter;

/// Outer-boundary condition of the composite reservoir.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OuterBoundary {
    /// Infinite-acting: no boundary correction.
    Infinite,
    /// No-flow boundary at dimensionless radius `reD`.
    Closed,
    /// Constant-pressure boundary at dimensionless radius `reD`.
    ConstantPressure,
}

/// Wellbore-storage treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageModel {
    /// Storage-and-skin deconvolution in Laplace space; requires `cD`, `S`.
    Variable,
    /// No storage/skin pole; `cD` and `S` are absent from the table.
    Constant,
}

/// One of the six structural model variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelVariant {
    pub boundary: OuterBoundary,
    pub storage: StorageModel,
}

/// Base physical parameters common to all variants, in canonical order.
const BASE_ORDER: [&str; 7] = ["phi", "h", "mu", "B", "Ct", "q", "nf"];

/// Reservoir/geometry parameters common to all variants, in canonical order.
const RESERVOIR_ORDER: [&str; 9] = [
    "kf", "km", "L", "Lf", "rmD", "omega1", "omega2", "lambda1", "gamaD",
];

impl ModelVariant {
    /// All six variants, storage-major to match the host's model list.
    pub const ALL: [ModelVariant; 6] = [
        ModelVariant { boundary: OuterBoundary::Infinite, storage: StorageModel::Variable },
        ModelVariant { boundary: OuterBoundary::Infinite, storage: StorageModel::Constant },
        ModelVariant { boundary: OuterBoundary::Closed, storage: StorageModel::Variable },
        ModelVariant { boundary: OuterBoundary::Closed, storage: StorageModel::Constant },
        ModelVariant { boundary: OuterBoundary::ConstantPressure, storage: StorageModel::Variable },
        ModelVariant { boundary: OuterBoundary::ConstantPressure, storage: StorageModel::Constant },
    ];

    pub fn new(boundary: OuterBoundary, storage: StorageModel) -> Self {
        Self { boundary, storage }
    }

    /// Whether this variant carries the storage/skin parameters `cD`, `S`.
    pub fn has_storage_skin(&self) -> bool {
        self.storage == StorageModel::Variable
    }

    /// Whether this variant carries the outer-boundary radius `reD`.
    pub fn has_outer_radius(&self) -> bool {
        self.boundary != OuterBoundary::Infinite
    }

    /// Canonical parameter name ordering for this variant.
    ///
    /// Base physical parameters first, then reservoir/geometry parameters,
    /// then `reD` for bounded variants, then `cD`/`S` for variable-storage
    /// variants. Hosts rely on this order for table-driven binding.
    pub fn parameter_order(&self) -> Vec<&'static str> {
        let mut order: Vec<&'static str> = Vec::with_capacity(19);
        order.extend(BASE_ORDER);
        order.extend(RESERVOIR_ORDER);
        if self.has_outer_radius() {
            order.push("reD");
        }
        if self.has_storage_skin() {
            order.push("cD");
            order.push("S");
        }
        order
    }

    /// Default parameter table for this variant, in canonical order, with
    /// the stock bounds attached. All parameters start fixed; the host
    /// flips `vary` per row.
    pub fn default_parameters(&self) -> Vec<FitParameter> {
        self.parameter_order()
            .into_iter()
            .map(|name| {
                let (min, max) = default_bounds(name);
                FitParameter::with_bounds(name, default_value(name), min, max)
            })
            .collect()
    }
}

/// Stock default value for a parameter name.
pub fn default_value(name: &str) -> f64 {
    match name {
        "phi" => 0.05,
        "h" => 20.0,
        "mu" => 0.5,
        "B" => 1.05,
        "Ct" => 5e-4,
        "q" => 5.0,
        "nf" => 4.0,
        "kf" => 10.0,
        "km" => 1.0,
        "L" => 1000.0,
        "Lf" => 100.0,
        "rmD" => 5.0,
        "omega1" => 0.1,
        "omega2" => 0.8,
        "lambda1" => 1e-3,
        "gamaD" => 0.02,
        "reD" => 10.0,
        "cD" => 100.0,
        "S" => 0.1,
        _ => 0.0,
    }
}

/// Stock bounds for a parameter name.
pub fn default_bounds(name: &str) -> (f64, f64) {
    match name {
        "kf" | "km" => (1e-6, 100.0),
        "L" => (10.0, 5000.0),
        "Lf" => (1.0, 1000.0),
        "rmD" => (1.0, 50.0),
        "omega1" | "omega2" => (0.001, 1.0),
        "lambda1" => (1e-9, 1.0),
        "cD" => (0.0, 5000.0),
        "S" => (-5.0, 50.0),
        "gamaD" => (0.0, 1.0),
        // reD must sit strictly outside the composite radius.
        "reD" => (1.1, 1000.0),
        "phi" => (0.001, 1.0),
        "h" => (1.0, 500.0),
        "mu" => (0.01, 1000.0),
        "B" => (0.5, 2.0),
        "Ct" => (1e-6, 1e-2),
        "q" => (0.1, 10000.0),
        "nf" => (1.0, 100.0),
        _ => (f64::NEG_INFINITY, f64::INFINITY),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_order_infinite_variable() {
        let v = ModelVariant::new(OuterBoundary::Infinite, StorageModel::Variable);
        assert_eq!(
            v.parameter_order(),
            vec![
                "phi", "h", "mu", "B", "Ct", "q", "nf", "kf", "km", "L", "Lf", "rmD", "omega1",
                "omega2", "lambda1", "gamaD", "cD", "S",
            ]
        );
    }

    #[test]
    fn test_parameter_order_infinite_constant() {
        let v = ModelVariant::new(OuterBoundary::Infinite, StorageModel::Constant);
        let order = v.parameter_order();
        assert_eq!(order.len(), 16);
        assert!(!order.contains(&"cD"));
        assert!(!order.contains(&"S"));
        assert!(!order.contains(&"reD"));
    }

    #[test]
    fn test_parameter_order_bounded_variants() {
        for boundary in [OuterBoundary::Closed, OuterBoundary::ConstantPressure] {
            let v = ModelVariant::new(boundary, StorageModel::Variable);
            let order = v.parameter_order();
            // reD precedes cD and S at the tail.
            assert_eq!(&order[order.len() - 3..], &["reD", "cD", "S"]);

            let v = ModelVariant::new(boundary, StorageModel::Constant);
            let order = v.parameter_order();
            assert_eq!(order.last(), Some(&"reD"));
        }
    }

    #[test]
    fn test_default_parameters_have_table_bounds() {
        let v = ModelVariant::new(OuterBoundary::Closed, StorageModel::Variable);
        let params = v.default_parameters();
        let skin = params.iter().find(|p| p.name == "S").unwrap();
        assert_eq!((skin.min, skin.max), (-5.0, 50.0));
        assert!(params.iter().all(|p| !p.vary));
        assert!(params.iter().all(|p| p.value >= p.min && p.value <= p.max));
    }

    #[test]
    fn test_all_lists_six_distinct_variants() {
        for (i, a) in ModelVariant::ALL.iter().enumerate() {
            for b in &ModelVariant::ALL[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
