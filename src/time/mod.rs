//! Time integration: multistep coefficients, stage tableaux, and the CFL
//! estimator that drives adaptive stepping.

pub mod cfl;
pub mod scheme;

pub use cfl::{inverse_nodal_spacing, CflEstimator};
pub use scheme::{erk4, RkTable, TimeScheme, MAX_ORDER};
