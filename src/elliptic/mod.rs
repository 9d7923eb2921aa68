//! Elliptic-solve collaborator seam.
//!
//! The Helmholtz/Poisson solvers themselves live outside this crate; the
//! projection accelerator only needs to apply the governing operator,
//! apply the essential-condition mask, and know the vector layout. That
//! surface is the [`EllipticOperator`] trait.

pub mod projection;

pub use projection::{ProjectionType, SolutionProjection};

/// The assembled elliptic operator of one solve context.
pub trait EllipticOperator: Send {
    /// Nodes owned by this rank.
    fn nlocal(&self) -> usize;

    /// Per-field slab stride.
    fn field_offset(&self) -> usize;

    /// Number of solution fields (1 for pressure/scalars, 3 for velocity).
    fn nfields(&self) -> usize;

    /// Multiplicity weights making node-shared inner products count each
    /// global degree of freedom once.
    fn inv_degree(&self) -> &[f64];

    /// `ax = A x` over the full multi-field vector.
    fn apply(&self, x: &[f64], ax: &mut [f64]);

    /// Zero essential-condition degrees of freedom. Default: no mask.
    fn mask(&self, _x: &mut [f64]) {}
}
