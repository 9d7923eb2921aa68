//! Orthogonal polynomials and quadrature nodes.
//!
//! One-dimensional building blocks for the tensor-product hexahedral basis:
//! Legendre evaluation, Gauss-Lobatto-Legendre (GLL) collocation nodes and
//! weights, and Gauss-Legendre nodes for the dealiased (cubature) advection
//! grid.

mod legendre;
mod nodes;

pub use legendre::{legendre, legendre_and_derivative, legendre_derivative};
pub use nodes::{gauss_lobatto_nodes, gauss_lobatto_weights, gauss_nodes, gauss_weights};
