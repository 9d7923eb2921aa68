//! Two-phase kernel registry.
//!
//! Subsystems register specialization descriptors during setup; the
//! registry is then built exactly once against a compiler, after which only
//! lookups are allowed. The phase split makes cross-subsystem ordering bugs
//! (scalar transport looking up a kernel the flow solver never registered)
//! fail loudly at setup rather than at first dispatch.

use super::{KernelCompiler, KernelHandle, KernelSpec};
use crate::error::SolverError;
use log::{debug, info};
use std::collections::BTreeMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Open,
    Built,
}

/// Name-keyed cache of compiled kernels with register/build/lookup phases.
///
/// Re-registering a `(section, name)` pair before the build replaces the
/// pending descriptor: the last registration wins. After
/// [`build`](KernelRegistry::build), handles are immutable and lookups may
/// come from any subsystem.
pub struct KernelRegistry {
    phase: Phase,
    pending: BTreeMap<(String, String), KernelSpec>,
    compiled: BTreeMap<(String, String), KernelHandle>,
}

impl KernelRegistry {
    pub fn new() -> Self {
        Self {
            phase: Phase::Open,
            pending: BTreeMap::new(),
            compiled: BTreeMap::new(),
        }
    }

    /// Register a specialization descriptor. Fails once the registry is
    /// built.
    pub fn add(&mut self, spec: KernelSpec) -> Result<(), SolverError> {
        if self.phase != Phase::Open {
            return Err(SolverError::RegistryPhase {
                action: "register",
                phase: "built",
            });
        }
        if self.pending.insert(spec.key(), spec).is_some() {
            debug!("kernel registry: replaced pending registration");
        }
        Ok(())
    }

    /// Compile every pending descriptor and seal the registry.
    pub fn build(&mut self, compiler: &dyn KernelCompiler) -> Result<(), SolverError> {
        if self.phase != Phase::Open {
            return Err(SolverError::RegistryPhase {
                action: "build",
                phase: "built",
            });
        }
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for (key, spec) in pending {
            let handle = compiler.compile(&spec)?;
            self.compiled.insert(key, handle);
        }
        self.phase = Phase::Built;
        info!("kernel registry: compiled {} kernels", count);
        Ok(())
    }

    /// Look up a compiled kernel. Fails before the build, and fails with
    /// [`SolverError::KernelNotFound`] for names never registered.
    pub fn get(&self, section: &str, name: &str) -> Result<KernelHandle, SolverError> {
        if self.phase != Phase::Built {
            return Err(SolverError::RegistryPhase {
                action: "look up",
                phase: "still registering",
            });
        }
        self.compiled
            .get(&(section.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| SolverError::KernelNotFound {
                section: section.to_string(),
                name: name.to_string(),
            })
    }

    /// True once `build` has run.
    pub fn is_built(&self) -> bool {
        self.phase == Phase::Built
    }

    /// Number of registered (pending or compiled) kernels.
    pub fn len(&self) -> usize {
        match self.phase {
            Phase::Open => self.pending.len(),
            Phase::Built => self.compiled.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for KernelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
