//! Error types for solver setup and kernel dispatch.

use thiserror::Error;

/// Errors raised during setup and kernel resolution.
///
/// Every variant is a fatal configuration error: the run cannot proceed and
/// the caller is expected to abort after reporting. Numerical degradation
/// (a stale projection basis, a disabled scalar field) is by contract not an
/// error and never surfaces here.
#[derive(Error, Debug)]
pub enum SolverError {
    /// A kernel needs a larger work-group than the platform provides.
    #[error("kernel {kernel}: work-group size {available} is below the required {required}")]
    WorkGroupSize {
        kernel: String,
        required: usize,
        available: usize,
    },

    /// Lookup of a kernel name that was never registered.
    #[error("kernel {section}-{name} was never registered")]
    KernelNotFound { section: String, name: String },

    /// Registry operation attempted in the wrong phase.
    #[error("kernel registry: cannot {action} while {phase}")]
    RegistryPhase {
        action: &'static str,
        phase: &'static str,
    },

    /// The compiler has no implementation for a registered kernel source.
    #[error("no kernel implementation for source stem {stem:?}")]
    UnsupportedKernel { stem: String },

    /// A kernel specialization is missing or mistypes a required define.
    #[error("kernel {kernel}: bad or missing define {define:?}")]
    BadDefine { kernel: String, define: String },

    /// A registered kernel resolved to an unexpected concrete type.
    #[error("kernel {name} has unexpected type")]
    KernelType { name: String },

    /// A configuration value could not be parsed or is out of range.
    #[error("invalid value {value:?} for option {key:?}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    /// Buffer or operator dimensions disagree.
    #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl SolverError {
    /// Create an invalid-option error.
    pub fn invalid_option(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidOption {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}
