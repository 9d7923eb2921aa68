//! Hexahedral spectral-element mesh.
//!
//! Elements are tensor-product hexes with `(N+1)³` GLL nodes. The mesh
//! carries what the kernels consume: node coordinates, the per-node
//! geometric-factor array `vgeo`, per-face surface Jacobians, and per-face
//! boundary tags. Mesh generation proper is an external concern; the
//! [`Mesh::uniform_box`] constructor covers affine box meshes, which is the
//! geometry the solver is exercised and tested on.
//!
//! Face ordering convention:
//! - Face 0/1: r = -1 / +1 (x-min / x-max for a box)
//! - Face 2/3: s = -1 / +1
//! - Face 4/5: t = -1 / +1

use crate::operators::ElementOperators;

// =============================================================================
// Geometric-factor layout
// =============================================================================

/// Entries per node in `vgeo`.
pub const NVGEO: usize = 12;

/// `vgeo` slot indices: metric terms of the reference-to-physical map,
/// Jacobian, quadrature-weighted Jacobian, and its inverse.
pub const G_RX: usize = 0;
pub const G_RY: usize = 1;
pub const G_RZ: usize = 2;
pub const G_SX: usize = 3;
pub const G_SY: usize = 4;
pub const G_SZ: usize = 5;
pub const G_TX: usize = 6;
pub const G_TY: usize = 7;
pub const G_TZ: usize = 8;
pub const G_J: usize = 9;
pub const G_JW: usize = 10;
pub const G_IJW: usize = 11;

/// Faces per hexahedral element.
pub const NFACES: usize = 6;

// =============================================================================
// Mesh
// =============================================================================

/// Hexahedral mesh with per-node geometric factors.
#[derive(Clone)]
pub struct Mesh {
    /// Polynomial order N.
    pub order: usize,
    /// 1D nodes per direction (N+1).
    pub nq: usize,
    /// Volume nodes per element (N+1)³.
    pub np: usize,
    /// Number of elements.
    pub nelements: usize,
    /// Reference-element operators (nodes, weights, differentiation,
    /// cubature interpolation).
    pub ops: ElementOperators,
    /// Node coordinates, `nelements * np` each.
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub z: Vec<f64>,
    /// Geometric factors, laid out `[e][slot][node]` with `NVGEO` slots.
    pub vgeo: Vec<f64>,
    /// Surface Jacobian per element face, `nelements * NFACES`.
    pub sj: Vec<f64>,
    /// Physical boundary tag per element face, `nelements * NFACES`;
    /// 0 marks interior faces.
    pub etob: Vec<i32>,
}

impl Mesh {
    /// Uniform box mesh of `nx x ny x nz` affine elements over
    /// `[0, lx] x [0, ly] x [0, lz]`, all boundary faces tagged `1`.
    pub fn uniform_box(order: usize, cub_order: usize, nx: usize, ny: usize, nz: usize) -> Self {
        Self::uniform_box_with_extent(order, cub_order, nx, ny, nz, (1.0, 1.0, 1.0), 1)
    }

    /// Uniform box mesh with explicit extent and boundary tag.
    pub fn uniform_box_with_extent(
        order: usize,
        cub_order: usize,
        nx: usize,
        ny: usize,
        nz: usize,
        extent: (f64, f64, f64),
        boundary_tag: i32,
    ) -> Self {
        assert!(order >= 1, "need at least linear elements");
        assert!(
            nx > 0 && ny > 0 && nz > 0,
            "need at least one element in each direction"
        );
        let (lx, ly, lz) = extent;
        assert!(lx > 0.0 && ly > 0.0 && lz > 0.0, "invalid box extent");

        let ops = ElementOperators::new(order, cub_order.max(order));
        let nq = order + 1;
        let np = nq * nq * nq;
        let nelements = nx * ny * nz;

        let dx = lx / nx as f64;
        let dy = ly / ny as f64;
        let dz = lz / nz as f64;

        let mut x = vec![0.0; nelements * np];
        let mut y = vec![0.0; nelements * np];
        let mut z = vec![0.0; nelements * np];
        let mut vgeo = vec![0.0; nelements * NVGEO * np];
        let mut sj = vec![0.0; nelements * NFACES];
        let mut etob = vec![0i32; nelements * NFACES];

        // Affine map: constant metrics per element, diagonal for a box.
        let rx = 2.0 / dx;
        let sy = 2.0 / dy;
        let tz = 2.0 / dz;
        let jac = (dx / 2.0) * (dy / 2.0) * (dz / 2.0);

        for ez in 0..nz {
            for ey in 0..ny {
                for ex in 0..nx {
                    let e = ex + nx * (ey + ny * ez);
                    let x0 = ex as f64 * dx;
                    let y0 = ey as f64 * dy;
                    let z0 = ez as f64 * dz;

                    for k in 0..nq {
                        for j in 0..nq {
                            for i in 0..nq {
                                let n = i + nq * (j + nq * k);
                                let id = e * np + n;
                                x[id] = x0 + 0.5 * (ops.r[i] + 1.0) * dx;
                                y[id] = y0 + 0.5 * (ops.r[j] + 1.0) * dy;
                                z[id] = z0 + 0.5 * (ops.r[k] + 1.0) * dz;

                                let jw = jac * ops.w[i] * ops.w[j] * ops.w[k];
                                let base = e * NVGEO * np;
                                vgeo[base + G_RX * np + n] = rx;
                                vgeo[base + G_SY * np + n] = sy;
                                vgeo[base + G_TZ * np + n] = tz;
                                vgeo[base + G_J * np + n] = jac;
                                vgeo[base + G_JW * np + n] = jw;
                                vgeo[base + G_IJW * np + n] = 1.0 / jw;
                            }
                        }
                    }

                    // Surface Jacobians by face direction.
                    let area_r = (dy / 2.0) * (dz / 2.0);
                    let area_s = (dx / 2.0) * (dz / 2.0);
                    let area_t = (dx / 2.0) * (dy / 2.0);
                    sj[e * NFACES] = area_r;
                    sj[e * NFACES + 1] = area_r;
                    sj[e * NFACES + 2] = area_s;
                    sj[e * NFACES + 3] = area_s;
                    sj[e * NFACES + 4] = area_t;
                    sj[e * NFACES + 5] = area_t;

                    if ex == 0 {
                        etob[e * NFACES] = boundary_tag;
                    }
                    if ex == nx - 1 {
                        etob[e * NFACES + 1] = boundary_tag;
                    }
                    if ey == 0 {
                        etob[e * NFACES + 2] = boundary_tag;
                    }
                    if ey == ny - 1 {
                        etob[e * NFACES + 3] = boundary_tag;
                    }
                    if ez == 0 {
                        etob[e * NFACES + 4] = boundary_tag;
                    }
                    if ez == nz - 1 {
                        etob[e * NFACES + 5] = boundary_tag;
                    }
                }
            }
        }

        Self {
            order,
            nq,
            np,
            nelements,
            ops,
            x,
            y,
            z,
            vgeo,
            sj,
            etob,
        }
    }

    /// Total number of volume nodes on this rank.
    pub fn nlocal(&self) -> usize {
        self.nelements * self.np
    }

    /// Lumped mass matrix: the quadrature-weighted Jacobian at every local
    /// node.
    pub fn lumped_mass(&self) -> Vec<f64> {
        let mut lmm = vec![0.0; self.nlocal()];
        for e in 0..self.nelements {
            for (n, m) in lmm[e * self.np..(e + 1) * self.np].iter_mut().enumerate() {
                *m = self.vgeo_at(e, G_JW, n);
            }
        }
        lmm
    }

    /// Geometric factor `slot` at node `n` of element `e`.
    pub fn vgeo_at(&self, e: usize, slot: usize, n: usize) -> f64 {
        self.vgeo[e * NVGEO * self.np + slot * self.np + n]
    }

    /// Local volume-node indices lying on `face`.
    pub fn face_node_ids(&self, face: usize) -> Vec<usize> {
        let nq = self.nq;
        let fixed = |coord: usize, value: usize| -> Vec<usize> {
            let mut ids = Vec::with_capacity(nq * nq);
            for k in 0..nq {
                for j in 0..nq {
                    for i in 0..nq {
                        let idx = [i, j, k];
                        if idx[coord] == value {
                            ids.push(i + nq * (j + nq * k));
                        }
                    }
                }
            }
            ids
        };
        match face {
            0 => fixed(0, 0),
            1 => fixed(0, nq - 1),
            2 => fixed(1, 0),
            3 => fixed(1, nq - 1),
            4 => fixed(2, 0),
            5 => fixed(2, nq - 1),
            _ => panic!("face index {} out of range", face),
        }
    }

    /// Boundary tag of `face` on element `e` (0 for interior faces).
    pub fn boundary_tag(&self, e: usize, face: usize) -> i32 {
        self.etob[e * NFACES + face]
    }
}
