//! Kernel specialization, registration and dispatch.
//!
//! Numerical operators are compiled from source descriptors specialized by
//! `p_*` defines and cached in a [`KernelRegistry`] under `(section, name)`
//! keys, so the flow solver and the scalar-transport solver can hold
//! differently-specialized compilations of the same logical operator.
//! Registration and lookup are two strict phases: every subsystem registers
//! during setup, the registry is built once against a [`KernelCompiler`],
//! and only then do lookups begin.
//!
//! The [`host`] backend provides a reference implementation of every
//! operator as plain element loops; a device runtime drops in through the
//! same [`KernelCompiler`] seam.

pub mod autotune;
pub mod host;
pub mod properties;
pub mod registry;

pub use properties::{KernelProps, PropValue};
pub use registry::KernelRegistry;

use crate::error::SolverError;
use std::any::Any;
use std::sync::Arc;

/// Device work-group size assumed by reduction-style kernels.
pub const BLOCKSIZE: usize = 256;

/// Section prefix for flow-solver kernels.
pub const SECTION_FLOW: &str = "nrs";
/// Section prefix for scalar-transport kernels.
pub const SECTION_SCALAR: &str = "cds";

// =============================================================================
// Specialization descriptor
// =============================================================================

/// Immutable kernel specialization descriptor: section, name, source
/// location and the full define bag. Built once via [`KernelSpec::builder`]
/// and consumed whole by [`KernelCompiler::compile`].
#[derive(Clone, Debug, PartialEq)]
pub struct KernelSpec {
    section: String,
    name: String,
    source: String,
    stem: String,
    props: KernelProps,
}

impl KernelSpec {
    pub fn builder(section: impl Into<String>, name: impl Into<String>) -> KernelSpecBuilder {
        KernelSpecBuilder {
            section: section.into(),
            name: name.into(),
            subpath: String::new(),
            stem: None,
            serial: false,
            props: KernelProps::new(),
        }
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry key.
    pub fn key(&self) -> (String, String) {
        (self.section.clone(), self.name.clone())
    }

    /// Qualified `section-name` form used in logs.
    pub fn qualified_name(&self) -> String {
        format!("{}-{}", self.section, self.name)
    }

    /// Source path relative to the kernel root, extension included.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Source file stem; what the host compiler dispatches on.
    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn props(&self) -> &KernelProps {
        &self.props
    }
}

/// Builder for [`KernelSpec`].
#[derive(Clone, Debug)]
pub struct KernelSpecBuilder {
    section: String,
    name: String,
    subpath: String,
    stem: Option<String>,
    serial: bool,
    props: KernelProps,
}

impl KernelSpecBuilder {
    /// Source subdirectory under the kernel root, e.g. `"core/"`.
    pub fn subpath(mut self, subpath: impl Into<String>) -> Self {
        self.subpath = subpath.into();
        self
    }

    /// Override the source file stem; defaults to the kernel name.
    pub fn stem(mut self, stem: impl Into<String>) -> Self {
        self.stem = Some(stem.into());
        self
    }

    /// Single-process execution compiles native `.c` sources instead of
    /// `.okl` device sources.
    pub fn serial(mut self, serial: bool) -> Self {
        self.serial = serial;
        self
    }

    /// Replace the whole define bag.
    pub fn props(mut self, props: KernelProps) -> Self {
        self.props = props;
        self
    }

    /// Add one define on top of the current bag.
    pub fn define(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    pub fn build(self) -> KernelSpec {
        let stem = self.stem.unwrap_or_else(|| self.name.clone());
        let ext = if self.serial { "c" } else { "okl" };
        let source = format!("{}{}.{}", self.subpath, stem, ext);
        KernelSpec {
            section: self.section,
            name: self.name,
            source,
            stem,
            props: self.props,
        }
    }
}

// =============================================================================
// Handles and the compiler seam
// =============================================================================

/// Opaque shared reference to a compiled kernel.
///
/// Cheap to clone; read-only after compilation. Call sites recover the
/// typed kernel object with [`KernelHandle::downcast`].
#[derive(Clone)]
pub struct KernelHandle {
    name: String,
    inner: Arc<dyn Any + Send + Sync>,
}

impl KernelHandle {
    pub fn new(name: impl Into<String>, kernel: impl Any + Send + Sync) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(kernel),
        }
    }

    /// Qualified name the kernel was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Recover the concrete kernel type.
    pub fn downcast<T: 'static>(&self) -> Result<&T, SolverError> {
        self.inner
            .downcast_ref::<T>()
            .ok_or_else(|| SolverError::KernelType {
                name: self.name.clone(),
            })
    }
}

impl std::fmt::Debug for KernelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelHandle").field("name", &self.name).finish()
    }
}

/// Compiles one specialization descriptor into an executable kernel.
pub trait KernelCompiler {
    fn compile(&self, spec: &KernelSpec) -> Result<KernelHandle, SolverError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_source_path() {
        let spec = KernelSpec::builder(SECTION_FLOW, "cfl")
            .subpath("navierStokes/")
            .define("p_Nq", 8usize)
            .build();
        assert_eq!(spec.source(), "navierStokes/cfl.okl");
        assert_eq!(spec.stem(), "cfl");
        assert_eq!(spec.qualified_name(), "nrs-cfl");

        let serial = KernelSpec::builder(SECTION_FLOW, "cfl")
            .subpath("navierStokes/")
            .serial(true)
            .build();
        assert_eq!(serial.source(), "navierStokes/cfl.c");
    }

    #[test]
    fn test_builder_stem_override() {
        let spec = KernelSpec::builder(SECTION_SCALAR, "strongAdvectionVolume")
            .stem("strongAdvectionVolumeHex3D")
            .build();
        assert_eq!(spec.source(), "strongAdvectionVolumeHex3D.okl");
        assert_eq!(spec.name(), "strongAdvectionVolume");
    }

    #[test]
    fn test_handle_downcast() {
        struct Dummy {
            nq: usize,
        }
        let handle = KernelHandle::new("nrs-dummy", Dummy { nq: 5 });
        assert_eq!(handle.downcast::<Dummy>().unwrap().nq, 5);
        assert!(handle.downcast::<String>().is_err());
    }
}
