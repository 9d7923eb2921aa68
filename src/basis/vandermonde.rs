//! Vandermonde matrix for nodal-modal transformations.
//!
//! V[i,j] = φ_j(r_i) with φ_j the normalized Legendre polynomial
//! `sqrt((2j+1)/2) P_j`, evaluated at the 1D collocation nodes r_i, so
//! modal coefficients and nodal values convert by `nodal = V modal` and
//! `modal = V⁻¹ nodal`. The derivative Vandermonde Vr feeds the collocation
//! differentiation matrix, and V diag(a) V⁻¹ assembles the spectral filter.

use crate::polynomial::{legendre, legendre_derivative};
use faer::{Mat, linalg::solvers::Solve};

/// Vandermonde matrix, its inverse, and the derivative Vandermonde for one
/// 1D node set.
#[derive(Clone)]
pub struct Vandermonde {
    /// V[i,j] = φ_j(r_i)
    pub v: Mat<f64>,
    /// V⁻¹
    pub v_inv: Mat<f64>,
    /// Vr[i,j] = φ'_j(r_i)
    pub vr: Mat<f64>,
    /// Polynomial order N; matrices are (N+1)×(N+1)
    pub order: usize,
}

impl Vandermonde {
    /// Assemble for the given order and nodes (`nodes.len() == order + 1`).
    pub fn new(order: usize, nodes: &[f64]) -> Self {
        let n = order + 1;
        assert_eq!(nodes.len(), n, "need order+1 nodes");

        let mut v = Mat::zeros(n, n);
        let mut vr = Mat::zeros(n, n);

        for (i, &r) in nodes.iter().enumerate() {
            for j in 0..n {
                let norm = ((2 * j + 1) as f64 / 2.0).sqrt();
                v[(i, j)] = norm * legendre(j, r);
                vr[(i, j)] = norm * legendre_derivative(j, r);
            }
        }

        // Invert by LU, solving V x = e_j column by column.
        let lu = v.as_ref().full_piv_lu();
        let mut v_inv = Mat::zeros(n, n);
        for j in 0..n {
            let mut rhs = Mat::zeros(n, 1);
            rhs[(j, 0)] = 1.0;
            let col = lu.solve(&rhs);
            for i in 0..n {
                v_inv[(i, j)] = col[(i, 0)];
            }
        }

        Self {
            v,
            v_inv,
            vr,
            order,
        }
    }

    /// Number of 1D nodes (order + 1).
    pub fn n_nodes(&self) -> usize {
        self.order + 1
    }

    /// Assemble `V diag(a) V⁻¹` as a row-major flat matrix.
    ///
    /// With `a` the per-mode removed fraction from
    /// [`low_pass_amplitudes`](crate::basis::low_pass_amplitudes), the
    /// result extracts the high-pass component of a nodal field; it is the
    /// 1D factor of the tensor-product HPFRT filter.
    pub fn modal_damping_matrix(&self, amplitudes: &[f64]) -> Vec<f64> {
        let n = self.n_nodes();
        assert_eq!(amplitudes.len(), n, "need one amplitude per mode");

        let mut out = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                let mut sum = 0.0;
                for k in 0..n {
                    sum += self.v[(i, k)] * amplitudes[k] * self.v_inv[(k, j)];
                }
                out[i * n + j] = sum;
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::low_pass_amplitudes;
    use crate::polynomial::gauss_lobatto_nodes;

    #[test]
    fn test_inverse() {
        for order in 1..=6 {
            let nodes = gauss_lobatto_nodes(order);
            let vd = Vandermonde::new(order, &nodes);
            let n = order + 1;
            for i in 0..n {
                for j in 0..n {
                    let mut sum = 0.0;
                    for k in 0..n {
                        sum += vd.v[(i, k)] * vd.v_inv[(k, j)];
                    }
                    let expected = if i == j { 1.0 } else { 0.0 };
                    assert!(
                        (sum - expected).abs() < 1e-12,
                        "V V⁻¹ entry ({}, {}) of order {}",
                        i,
                        j,
                        order
                    );
                }
            }
        }
    }

    #[test]
    fn test_nodal_modal_round_trip() {
        let order = 5;
        let nodes = gauss_lobatto_nodes(order);
        let vd = Vandermonde::new(order, &nodes);
        let n = order + 1;

        let nodal: Vec<f64> = nodes.iter().map(|&x| x.powi(3) - 0.5 * x).collect();
        let mut modal = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                modal[i] += vd.v_inv[(i, j)] * nodal[j];
            }
        }
        let mut back = vec![0.0; n];
        for i in 0..n {
            for j in 0..n {
                back[i] += vd.v[(i, j)] * modal[j];
            }
        }
        for i in 0..n {
            assert!((nodal[i] - back[i]).abs() < 1e-12, "node {}", i);
        }
    }

    #[test]
    fn test_damping_matrix_annihilates_low_modes() {
        // With all amplitudes zero the damping matrix is the zero map; a
        // cutoff at the top keeps every retained polynomial untouched.
        let order = 4;
        let nodes = gauss_lobatto_nodes(order);
        let vd = Vandermonde::new(order, &nodes);
        let n = order + 1;

        let f = vd.modal_damping_matrix(&vec![0.0; n]);
        assert!(f.iter().all(|&x| x.abs() < 1e-13));

        // One fully-damped top mode: applying the matrix to a low-degree
        // polynomial returns zero, applying it to P_N returns P_N.
        let mut amp = vec![0.0; n];
        amp[n - 1] = 1.0;
        let f = vd.modal_damping_matrix(&amp);

        let low: Vec<f64> = nodes.iter().map(|&x| 1.0 + 2.0 * x).collect();
        for i in 0..n {
            let y: f64 = (0..n).map(|j| f[i * n + j] * low[j]).sum();
            assert!(y.abs() < 1e-12, "linear field passes the filter");
        }

        let top: Vec<f64> = nodes.iter().map(|&x| legendre(order, x)).collect();
        for i in 0..n {
            let y: f64 = (0..n).map(|j| f[i * n + j] * top[j]).sum();
            assert!((y - top[i]).abs() < 1e-12, "top mode is removed whole");
        }
    }

    #[test]
    fn test_low_pass_profile_feeds_damping_matrix() {
        let order = 6;
        let nodes = gauss_lobatto_nodes(order);
        let vd = Vandermonde::new(order, &nodes);
        let amp = low_pass_amplitudes(order + 1, 3);
        let f = vd.modal_damping_matrix(&amp);
        assert_eq!(f.len(), (order + 1) * (order + 1));
        // Constant fields lie below any cutoff and must pass untouched.
        let n = order + 1;
        for i in 0..n {
            let y: f64 = (0..n).map(|j| f[i * n + j]).sum();
            assert!(y.abs() < 1e-12);
        }
    }
}
