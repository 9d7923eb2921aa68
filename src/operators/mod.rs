//! Reference-element operator matrices.
//!
//! Flat row-major matrices consumed by the device kernels: the collocation
//! differentiation matrix on the GLL grid, and interpolation/differentiation
//! onto the Gauss (cubature) grid for the dealiased advection term. All are
//! assembled from the 1D [`Vandermonde`] and applied dimension-by-dimension
//! through tensor products.

use crate::basis::Vandermonde;
use crate::polynomial::{
    gauss_lobatto_nodes, gauss_lobatto_weights, gauss_nodes, gauss_weights, legendre,
    legendre_derivative,
};

/// Collocation differentiation matrix `D = Vr V⁻¹`, row-major `nq × nq`:
/// `(du/dr)_i = Σ_j D[i*nq + j] u_j`.
pub fn differentiation_matrix(vd: &Vandermonde) -> Vec<f64> {
    let n = vd.n_nodes();
    let mut d = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += vd.vr[(i, k)] * vd.v_inv[(k, j)];
            }
            d[i * n + j] = sum;
        }
    }
    d
}

/// Interpolation from the node set underlying `vd` to `to_nodes`,
/// row-major `to_nodes.len() × nq`: `u(c) = Σ_j I[c*nq + j] u_j`.
pub fn interpolation_matrix(vd: &Vandermonde, to_nodes: &[f64]) -> Vec<f64> {
    rectangular_operator(vd, to_nodes, legendre)
}

/// Derivative evaluation at `to_nodes` from nodal values on the `vd` grid,
/// row-major `to_nodes.len() × nq`: `(du/dr)(c) = Σ_j Dc[c*nq + j] u_j`.
pub fn cubature_derivative_matrix(vd: &Vandermonde, to_nodes: &[f64]) -> Vec<f64> {
    rectangular_operator(vd, to_nodes, legendre_derivative)
}

fn rectangular_operator(
    vd: &Vandermonde,
    to_nodes: &[f64],
    eval: fn(usize, f64) -> f64,
) -> Vec<f64> {
    let n = vd.n_nodes();
    let m = to_nodes.len();

    // Φ(to) V⁻¹ with Φ the (possibly differentiated) normalized basis.
    let mut phi = vec![0.0; m * n];
    for (c, &r) in to_nodes.iter().enumerate() {
        for j in 0..n {
            let norm = ((2 * j + 1) as f64 / 2.0).sqrt();
            phi[c * n + j] = norm * eval(j, r);
        }
    }

    let mut out = vec![0.0; m * n];
    for c in 0..m {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += phi[c * n + k] * vd.v_inv[(k, j)];
            }
            out[c * n + j] = sum;
        }
    }
    out
}

/// The full 1D operator set for one polynomial order: GLL grid, cubature
/// grid, and the matrices connecting them. Built once per mesh.
#[derive(Clone)]
pub struct ElementOperators {
    /// Polynomial order N.
    pub order: usize,
    /// Cubature order; equals `order` when over-integration is off.
    pub cub_order: usize,
    /// GLL nodes (length N+1).
    pub r: Vec<f64>,
    /// GLL weights.
    pub w: Vec<f64>,
    /// Gauss cubature nodes (length cubN+1).
    pub cub_r: Vec<f64>,
    /// Gauss cubature weights.
    pub cub_w: Vec<f64>,
    /// Collocation differentiation matrix, `(N+1)²` row-major.
    pub d: Vec<f64>,
    /// GLL-to-cubature interpolation, `(cubN+1)x(N+1)` row-major.
    pub cub_interp: Vec<f64>,
    /// GLL-to-cubature differentiation, `(cubN+1)x(N+1)` row-major.
    pub cub_d: Vec<f64>,
}

impl ElementOperators {
    pub fn new(order: usize, cub_order: usize) -> Self {
        let r = gauss_lobatto_nodes(order);
        let w = gauss_lobatto_weights(order, &r);
        let vd = Vandermonde::new(order, &r);
        let d = differentiation_matrix(&vd);

        let cub_r = gauss_nodes(cub_order);
        let cub_w = gauss_weights(cub_order, &cub_r);
        let cub_interp = interpolation_matrix(&vd, &cub_r);
        let cub_d = cubature_derivative_matrix(&vd, &cub_r);

        Self {
            order,
            cub_order,
            r,
            w,
            cub_r,
            cub_w,
            d,
            cub_interp,
            cub_d,
        }
    }

    pub fn nq(&self) -> usize {
        self.order + 1
    }

    pub fn cub_nq(&self) -> usize {
        self.cub_order + 1
    }
}
