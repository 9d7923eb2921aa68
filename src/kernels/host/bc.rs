//! Boundary application and masking kernels.
//!
//! Boundary faces are identified through the per-field condition-code table
//! (`EToB` after bc-map translation); Dirichlet faces overwrite nodal
//! values, Neumann faces accumulate a surface flux into the right-hand
//! side, and the mask kernels zero constrained degrees of freedom.

use super::operators::face_node;
use crate::bc::bc_code;
use crate::mesh::NFACES;

/// Sets `value` on every node of every face whose condition code is
/// Dirichlet.
pub struct DirichletBcKernel {
    pub nq: usize,
    pub np: usize,
}

impl DirichletBcKernel {
    pub fn launch(&self, nelements: usize, etob: &[i32], value: f64, field: &mut [f64]) {
        let nq = self.nq;
        for e in 0..nelements {
            for face in 0..NFACES {
                if etob[e * NFACES + face] != bc_code::DIRICHLET {
                    continue;
                }
                for a in 0..nq {
                    for b in 0..nq {
                        field[e * self.np + face_node(nq, face, a, b)] = value;
                    }
                }
            }
        }
    }
}

/// Accumulates a constant flux through Neumann faces into the right-hand
/// side, weighted by the surface Jacobian and the face quadrature weights.
pub struct NeumannBcKernel {
    pub nq: usize,
    pub np: usize,
}

impl NeumannBcKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        etob: &[i32],
        sj: &[f64],
        w: &[f64],
        flux: f64,
        rhs: &mut [f64],
    ) {
        let nq = self.nq;
        for e in 0..nelements {
            for face in 0..NFACES {
                if etob[e * NFACES + face] != bc_code::NEUMANN {
                    continue;
                }
                let sjac = sj[e * NFACES + face];
                for a in 0..nq {
                    for b in 0..nq {
                        let id = e * self.np + face_node(nq, face, a, b);
                        rhs[id] += flux * sjac * w[a] * w[b];
                    }
                }
            }
        }
    }
}

/// Zeroes the listed degrees of freedom in place.
pub struct MaskKernel;

impl MaskKernel {
    pub fn launch(&self, mask_ids: &[usize], field: &mut [f64]) {
        for &id in mask_ids {
            field[id] = 0.0;
        }
    }
}

/// Copies `src` into `dst` and zeroes the masked entries of the copy; the
/// two-buffer form additionally zeroes them in `src`.
pub struct MaskCopyKernel;

impl MaskCopyKernel {
    pub fn launch(&self, mask_ids: &[usize], src: &[f64], dst: &mut [f64]) {
        dst[..src.len()].copy_from_slice(src);
        for &id in mask_ids {
            dst[id] = 0.0;
        }
    }

    pub fn launch_pair(&self, mask_ids: &[usize], src: &mut [f64], dst: &mut [f64]) {
        dst[..src.len()].copy_from_slice(src);
        for &id in mask_ids {
            src[id] = 0.0;
            dst[id] = 0.0;
        }
    }
}
