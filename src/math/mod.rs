//! Numerical building blocks shared by the forward model.

pub mod bessel;
pub mod quadrature;
pub mod stehfest;

pub use bessel::{scaled_bessel_i, scaled_bessel_k0, scaled_bessel_k1};
pub use quadrature::{adaptive_gauss, gauss15};
pub use stehfest::StehfestInverter;
