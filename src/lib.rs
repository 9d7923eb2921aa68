//! # sem-rs
//!
//! Time-integration and elliptic-solve orchestration for a spectral-element
//! incompressible Navier-Stokes solver with passive-scalar transport.
//!
//! The crate covers the setup and per-step machinery around the solves
//! rather than the solves themselves:
//! - Kernel specialization and registration (two-phase registry, typed
//!   host reference backend behind a compiler seam)
//! - Flow and scalar-transport ("CDS") state setup: field layouts,
//!   property buffers, boundary-code tables, regularization
//! - Variable-step BDF/EXT time-integration coefficients, subcycling
//!   tableaux and the advective CFL estimator
//! - Solution-space projection accelerating successive elliptic solves
//!
//! Device execution, MPI transport, CVODE integration and the elliptic
//! solvers are external collaborators reached through traits
//! ([`kernels::KernelCompiler`], [`platform::Comm`],
//! [`elliptic::EllipticOperator`]).

pub mod basis;
pub mod bc;
pub mod config;
pub mod elliptic;
pub mod error;
pub mod flow;
pub mod kernels;
pub mod mesh;
pub mod operators;
pub mod platform;
pub mod polynomial;
pub mod scalars;
pub mod time;

pub use basis::{low_pass_amplitudes, Vandermonde};
pub use bc::{bc_code, scalar_field_label, BcMap};
pub use config::{AdvectionKind, Options, RegularizationKind, SolverKind};
pub use elliptic::{EllipticOperator, ProjectionType, SolutionProjection};
pub use error::SolverError;
pub use flow::{register_flow_kernels, FlowState};
pub use kernels::{
    KernelCompiler, KernelHandle, KernelProps, KernelRegistry, KernelSpec, BLOCKSIZE,
    SECTION_FLOW, SECTION_SCALAR,
};
pub use mesh::Mesh;
pub use operators::ElementOperators;
pub use platform::{Comm, DeviceArray, SingleRank};
pub use scalars::{register_scalar_kernels, Regularization, ScalarTransport};
pub use time::{erk4, inverse_nodal_spacing, CflEstimator, RkTable, TimeScheme};
