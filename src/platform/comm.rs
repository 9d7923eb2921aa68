//! Distributed reduction seam.
//!
//! Rank topology and transport live outside this crate. The solver core only
//! needs blocking all-reduce collectives, expressed as the [`Comm`] trait so
//! a real communicator can be dropped in by the embedding application.
//! [`SingleRank`] is the identity implementation used for serial runs and
//! throughout the tests.

/// Blocking collective operations over the set of ranks in a run.
///
/// All methods synchronize: they return only once every rank has
/// contributed, mirroring the barrier-like semantics of an MPI all-reduce.
pub trait Comm: Send + Sync {
    /// This rank's index in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of ranks.
    fn size(&self) -> usize;

    /// Global maximum of one value per rank.
    fn allreduce_max(&self, local: f64) -> f64;

    /// Global sum of one value per rank.
    fn allreduce_sum(&self, local: f64) -> f64;

    /// In-place elementwise global sum over a slice.
    fn allreduce_sum_slice(&self, local: &mut [f64]);
}

/// Serial communicator: one rank, every reduction is the identity.
#[derive(Clone, Copy, Debug, Default)]
pub struct SingleRank;

impl Comm for SingleRank {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn allreduce_max(&self, local: f64) -> f64 {
        local
    }

    fn allreduce_sum(&self, local: f64) -> f64 {
        local
    }

    fn allreduce_sum_slice(&self, _local: &mut [f64]) {}
}
