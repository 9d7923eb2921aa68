//! Platform seams: device memory, distributed reduction, vector primitives.
//!
//! The execution runtime proper (kernel compilation, asynchronous launch
//! queues) is an external collaborator. This module carries the minimal
//! surface the solver core needs from it: device-resident buffers with
//! explicit host transfers, a communicator for blocking collectives, and the
//! handful of vector operations used by setup and projection.

pub mod comm;
pub mod linalg;
pub mod memory;

pub use comm::{Comm, SingleRank};
pub use memory::DeviceArray;
