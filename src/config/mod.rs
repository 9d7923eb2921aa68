//! Run configuration: string-keyed options and their resolved forms.
//!
//! The solver is driven by an external key-value store ([`Options`]) in which
//! both keys and enumerated values are uppercase strings, e.g.
//! `POLYNOMIAL DEGREE = 7` or `SCALAR00 SOLVER = NONE`. Mode strings are
//! parsed exactly once during setup into closed enums ([`SolverKind`],
//! [`RegularizationKind`], [`AdvectionKind`]); after setup no component
//! re-parses strings on a hot path.

use crate::error::SolverError;
use std::collections::BTreeMap;

// =============================================================================
// Well-known option keys
// =============================================================================

pub const POLYNOMIAL_DEGREE: &str = "POLYNOMIAL DEGREE";
pub const CUBATURE_POLYNOMIAL_DEGREE: &str = "CUBATURE POLYNOMIAL DEGREE";
pub const BDF_ORDER: &str = "BDF ORDER";
pub const EXT_ORDER: &str = "EXT ORDER";
pub const SUBCYCLING_STEPS: &str = "SUBCYCLING STEPS";
pub const ADVECTION_TYPE: &str = "ADVECTION TYPE";
pub const MOVING_MESH: &str = "MOVING MESH";
pub const KERNEL_AUTOTUNING: &str = "KERNEL AUTOTUNING";
pub const VERBOSE: &str = "VERBOSE";
pub const MESH_FILE: &str = "MESH FILE";
pub const NUMBER_OF_SCALARS: &str = "NUMBER OF SCALARS";
pub const VISCOSITY: &str = "VISCOSITY";
pub const DENSITY: &str = "DENSITY";

/// Build a per-scalar option key, e.g. `scalar_key(0, "SOLVER")` gives
/// `"SCALAR00 SOLVER"`. Field indices are zero-padded to two digits.
pub fn scalar_key(field: usize, suffix: &str) -> String {
    format!("SCALAR{:02} {}", field, suffix)
}

// =============================================================================
// Options store
// =============================================================================

/// String-keyed configuration store.
///
/// Keys are stored uppercase; lookups are therefore case-insensitive on the
/// key. Value comparison via [`Options::compare`] is case-insensitive as
/// well, matching the convention that enumerated values are spelled
/// uppercase in input decks.
#[derive(Clone, Debug, Default)]
pub struct Options {
    map: BTreeMap<String, String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a key to a value. The key is uppercased on insertion.
    pub fn set(&mut self, key: impl AsRef<str>, value: impl ToString) {
        self.map
            .insert(key.as_ref().to_uppercase(), value.to_string());
    }

    /// Raw string lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(&key.to_uppercase()).map(String::as_str)
    }

    /// True when the key is present and its value equals `value`
    /// (case-insensitive).
    pub fn compare(&self, key: &str, value: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case(value))
            .unwrap_or(false)
    }

    /// True when the key is present and its value contains `needle`
    /// (case-insensitive). Used for compound values such as
    /// `"CUBATURE+SUBCYCLING"`.
    pub fn contains(&self, key: &str, needle: &str) -> bool {
        self.get(key)
            .map(|v| v.to_uppercase().contains(&needle.to_uppercase()))
            .unwrap_or(false)
    }

    /// Floating-point value, or `default` when the key is unset.
    /// An unparsable value is a fatal configuration error.
    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, SolverError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<f64>().map_err(|e| {
                SolverError::invalid_option(key, raw, format!("not a real number ({e})"))
            }),
        }
    }

    /// Integer value, or `default` when the key is unset.
    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize, SolverError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                SolverError::invalid_option(key, raw, format!("not a non-negative integer ({e})"))
            }),
        }
    }

    /// Boolean flag: `TRUE`/`FALSE`, defaulting to `false` when unset.
    pub fn flag(&self, key: &str) -> bool {
        self.compare(key, "TRUE")
    }
}

// =============================================================================
// Resolved enumerations
// =============================================================================

/// How a scalar field is advanced in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverKind {
    /// Field is disabled; all per-field work is skipped.
    None,
    /// Field is integrated by the external CVODE collaborator.
    Cvode,
    /// Field is solved implicitly through the elliptic (Helmholtz) path.
    Elliptic,
}

impl SolverKind {
    /// Resolve a `SCALARnn SOLVER` value. Unset defaults to the elliptic
    /// path; `NONE` disables the field; any value containing `CVODE`
    /// routes to the ODE integrator.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            None => Self::Elliptic,
            Some(v) if v.eq_ignore_ascii_case("NONE") => Self::None,
            Some(v) if v.to_uppercase().contains("CVODE") => Self::Cvode,
            Some(_) => Self::Elliptic,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Self::None
    }
}

/// Scalar regularization method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RegularizationKind {
    #[default]
    None,
    /// High-pass filtered relaxation-term stabilization.
    Hpfrt,
    /// Artificial viscosity driven by the local residual.
    AvmResidual,
    /// Artificial viscosity driven by decay of the highest mode.
    AvmHighestModalDecay,
}

impl RegularizationKind {
    /// Resolve a `SCALARnn REGULARIZATION METHOD` value. Unknown methods are
    /// a fatal configuration error.
    pub fn parse(key: &str, raw: Option<&str>) -> Result<Self, SolverError> {
        let Some(raw) = raw else {
            return Ok(Self::None);
        };
        let v = raw.to_uppercase();
        if v == "NONE" || v.is_empty() {
            Ok(Self::None)
        } else if v.contains("HPFRT") {
            Ok(Self::Hpfrt)
        } else if v.contains("AVM_RESIDUAL") {
            Ok(Self::AvmResidual)
        } else if v.contains("AVM_HIGHEST_MODAL_DECAY") {
            Ok(Self::AvmHighestModalDecay)
        } else {
            Err(SolverError::invalid_option(
                key,
                raw,
                "expected NONE, HPFRT, AVM_RESIDUAL or AVM_HIGHEST_MODAL_DECAY",
            ))
        }
    }

    pub fn is_avm(self) -> bool {
        matches!(self, Self::AvmResidual | Self::AvmHighestModalDecay)
    }
}

/// Advection discretization selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AdvectionKind {
    /// Advection disabled (Stokes-type runs).
    None,
    /// Collocation on the Gauss-Lobatto grid.
    #[default]
    Standard,
    /// Dealiased evaluation on an over-integrated Gauss grid.
    Cubature,
}

impl AdvectionKind {
    /// Resolve the `ADVECTION TYPE` value.
    pub fn parse(options: &Options) -> Self {
        match options.get(ADVECTION_TYPE) {
            Some(v) if v.eq_ignore_ascii_case("NONE") => Self::None,
            Some(v) if v.to_uppercase().contains("CUBATURE") => Self::Cubature,
            _ => Self::Standard,
        }
    }

    pub fn is_cubature(self) -> bool {
        self == Self::Cubature
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut opts = Options::new();
        opts.set("Polynomial Degree", 7);
        assert_eq!(opts.get("POLYNOMIAL DEGREE"), Some("7"));
        assert_eq!(opts.usize_or(POLYNOMIAL_DEGREE, 0).unwrap(), 7);
    }

    #[test]
    fn test_compare_and_contains() {
        let mut opts = Options::new();
        opts.set(ADVECTION_TYPE, "CUBATURE+SUBCYCLING");
        assert!(opts.contains(ADVECTION_TYPE, "cubature"));
        assert!(!opts.compare(ADVECTION_TYPE, "CUBATURE"));
        opts.set(MOVING_MESH, "TRUE");
        assert!(opts.flag(MOVING_MESH));
        assert!(!opts.flag(VERBOSE));
    }

    #[test]
    fn test_numeric_defaults_and_errors() {
        let mut opts = Options::new();
        assert_eq!(opts.f64_or("SCALAR00 DIFFUSIVITY", 1.0).unwrap(), 1.0);
        opts.set("SCALAR00 DIFFUSIVITY", "0.5");
        assert_eq!(opts.f64_or("SCALAR00 DIFFUSIVITY", 1.0).unwrap(), 0.5);
        opts.set("SCALAR00 DIFFUSIVITY", "half");
        assert!(opts.f64_or("SCALAR00 DIFFUSIVITY", 1.0).is_err());
    }

    #[test]
    fn test_scalar_key_zero_padding() {
        assert_eq!(scalar_key(0, "SOLVER"), "SCALAR00 SOLVER");
        assert_eq!(scalar_key(7, "DIFFUSIVITY"), "SCALAR07 DIFFUSIVITY");
        assert_eq!(scalar_key(12, "DENSITY"), "SCALAR12 DENSITY");
    }

    #[test]
    fn test_solver_kind_resolution() {
        assert_eq!(SolverKind::parse(None), SolverKind::Elliptic);
        assert_eq!(SolverKind::parse(Some("NONE")), SolverKind::None);
        assert_eq!(SolverKind::parse(Some("cvode")), SolverKind::Cvode);
        assert_eq!(SolverKind::parse(Some("PCG")), SolverKind::Elliptic);
        assert!(!SolverKind::None.is_enabled());
    }

    #[test]
    fn test_regularization_kind_resolution() {
        let parse = |v: Option<&str>| RegularizationKind::parse("SCALAR00 REGULARIZATION METHOD", v);
        assert_eq!(parse(None).unwrap(), RegularizationKind::None);
        assert_eq!(parse(Some("HPFRT")).unwrap(), RegularizationKind::Hpfrt);
        assert_eq!(
            parse(Some("AVM_HIGHEST_MODAL_DECAY")).unwrap(),
            RegularizationKind::AvmHighestModalDecay
        );
        assert!(parse(Some("UPWIND")).is_err());
    }
}
