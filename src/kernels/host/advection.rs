//! Advection kernels: strong-form volume terms on the collocation grid,
//! dealiased (cubature) variants, the subcycling renditions driven by the
//! contravariant-flux fields, and the Urst kernels that build those fields.
//!
//! Advected fields are stored as `nfields` slabs of stride `field_offset`;
//! the advecting velocity is three slabs of stride `v_offset`. Cubature
//! kernels assume affine elements (constant Jacobian per element), which is
//! what the mesh module provides.

use super::tensor::{apply_axis, tensor3_apply};
use crate::mesh::{G_IJW, G_J, G_JW, G_RX, G_RY, G_RZ, G_SX, G_SY, G_SZ, G_TX, G_TY, G_TZ, NVGEO};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Loop organization of the subcycling cubature advection kernel, selected
/// by the autotune microbenchmark.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AdvectionVariant {
    /// Axis-by-axis tensor contractions, derivative on the GLL grid.
    #[default]
    Reference,
    /// One fused contraction per cubature node.
    Fused,
    /// Derivative taken directly onto the cubature grid.
    Blocked,
}

impl AdvectionVariant {
    pub const ALL: [Self; 3] = [Self::Reference, Self::Fused, Self::Blocked];
    pub const COUNT: usize = Self::ALL.len();

    pub fn from_index(idx: usize) -> Self {
        match idx {
            1 => Self::Fused,
            2 => Self::Blocked,
            _ => Self::Reference,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Self::Reference => 0,
            Self::Fused => 1,
            Self::Blocked => 2,
        }
    }
}

/// Reference-space derivatives of one element field through the collocation
/// differentiation matrix.
fn element_gradient(d: &[f64], nq: usize, u_e: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let dims = (nq, nq, nq);
    let dudr = apply_axis(d, nq, nq, u_e, dims, 0);
    let duds = apply_axis(d, nq, nq, u_e, dims, 1);
    let dudt = apply_axis(d, nq, nq, u_e, dims, 2);
    (dudr, duds, dudt)
}

/// Physical-space gradient at node `n` of element `e` from reference
/// derivatives and the per-node metrics.
#[inline]
fn physical_gradient(
    vgeo: &[f64],
    e: usize,
    np: usize,
    n: usize,
    dudr: f64,
    duds: f64,
    dudt: f64,
) -> (f64, f64, f64) {
    let g = e * NVGEO * np;
    let dudx = vgeo[g + G_RX * np + n] * dudr
        + vgeo[g + G_SX * np + n] * duds
        + vgeo[g + G_TX * np + n] * dudt;
    let dudy = vgeo[g + G_RY * np + n] * dudr
        + vgeo[g + G_SY * np + n] * duds
        + vgeo[g + G_TY * np + n] * dudt;
    let dudz = vgeo[g + G_RZ * np + n] * dudr
        + vgeo[g + G_SZ * np + n] * duds
        + vgeo[g + G_TZ * np + n] * dudt;
    (dudx, dudy, dudz)
}

/// Per-field element loop, parallel over elements when the feature is on.
fn for_each_element_field(
    nelements: usize,
    nfields: usize,
    field_offset: usize,
    np: usize,
    out: &mut [f64],
    body: impl Fn(usize, usize, &mut [f64]) + Sync + Send,
) {
    for f in 0..nfields {
        let slab = &mut out[f * field_offset..f * field_offset + nelements * np];

        #[cfg(feature = "parallel")]
        slab.par_chunks_mut(np)
            .enumerate()
            .for_each(|(e, out_e)| body(f, e, out_e));

        #[cfg(not(feature = "parallel"))]
        for (e, out_e) in slab.chunks_mut(np).enumerate() {
            body(f, e, out_e);
        }
    }
}

// =============================================================================
// Collocation-grid kernels
// =============================================================================

/// Strong-form advection `(U · grad) s` evaluated on the GLL grid.
pub struct StrongAdvectionVolumeKernel {
    pub nq: usize,
    pub np: usize,
}

impl StrongAdvectionVolumeKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        nfields: usize,
        field_offset: usize,
        v_offset: usize,
        u: &[f64],
        s: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        for_each_element_field(nelements, nfields, field_offset, np, out, |f, e, out_e| {
            let s_e = &s[f * field_offset + e * np..f * field_offset + (e + 1) * np];
            let (dudr, duds, dudt) = element_gradient(d, nq, s_e);
            for n in 0..np {
                let id = e * np + n;
                let (dx, dy, dz) = physical_gradient(vgeo, e, np, n, dudr[n], duds[n], dudt[n]);
                out_e[n] = u[id] * dx + u[v_offset + id] * dy + u[2 * v_offset + id] * dz;
            }
        });
    }
}

/// Subtracts the mesh-velocity advection `(W · grad) s` from an already
/// assembled advection term, the ALE correction for moving meshes.
pub struct AdvectMeshVelocityKernel {
    pub nq: usize,
    pub np: usize,
}

impl AdvectMeshVelocityKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        nfields: usize,
        field_offset: usize,
        v_offset: usize,
        w: &[f64],
        s: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        for_each_element_field(nelements, nfields, field_offset, np, out, |f, e, out_e| {
            let s_e = &s[f * field_offset + e * np..f * field_offset + (e + 1) * np];
            let (dudr, duds, dudt) = element_gradient(d, nq, s_e);
            for n in 0..np {
                let id = e * np + n;
                let (dx, dy, dz) = physical_gradient(vgeo, e, np, n, dudr[n], duds[n], dudt[n]);
                out_e[n] -= w[id] * dx + w[v_offset + id] * dy + w[2 * v_offset + id] * dz;
            }
        });
    }
}

/// Subcycling advection on the collocation grid: contracts the
/// JW-scaled contravariant flux `Urst` against reference derivatives and
/// removes the quadrature weight again, `out = (Ur du/dr + Us du/ds +
/// Ut du/dt) / JW`.
pub struct SubCycleStrongVolumeKernel {
    pub nq: usize,
    pub np: usize,
}

impl SubCycleStrongVolumeKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        nfields: usize,
        field_offset: usize,
        urst_offset: usize,
        urst: &[f64],
        s: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        for_each_element_field(nelements, nfields, field_offset, np, out, |f, e, out_e| {
            let s_e = &s[f * field_offset + e * np..f * field_offset + (e + 1) * np];
            let (dudr, duds, dudt) = element_gradient(d, nq, s_e);
            for n in 0..np {
                let id = e * np + n;
                let ijw = vgeo[e * NVGEO * np + G_IJW * np + n];
                out_e[n] = ijw
                    * (urst[id] * dudr[n]
                        + urst[urst_offset + id] * duds[n]
                        + urst[2 * urst_offset + id] * dudt[n]);
            }
        });
    }
}

// =============================================================================
// Contravariant flux (Urst)
// =============================================================================

/// Builds the quadrature-weighted contravariant velocity
/// `Ur = JW (rx u + ry v + rz w)` (and Us, Ut) on the collocation grid, or
/// on the cubature grid after interpolation when specialized for cubature.
pub struct UrstKernel {
    pub nq: usize,
    pub np: usize,
    pub cub_nq: usize,
    pub cubature: bool,
}

impl UrstKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        cub_interp: &[f64],
        cub_w: &[f64],
        v_offset: usize,
        out_offset: usize,
        u: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        let cub_nq = self.cub_nq;
        let cub_np = cub_nq * cub_nq * cub_nq;

        for e in 0..nelements {
            let g = e * NVGEO * np;
            if !self.cubature {
                for n in 0..np {
                    let id = e * np + n;
                    let jw = vgeo[g + G_JW * np + n];
                    let (uu, vv, ww) = (u[id], u[v_offset + id], u[2 * v_offset + id]);
                    for dir in 0..3 {
                        let (mx, my, mz) = metric_row(dir);
                        out[dir * out_offset + id] = jw
                            * (vgeo[g + mx * np + n] * uu
                                + vgeo[g + my * np + n] * vv
                                + vgeo[g + mz * np + n] * ww);
                    }
                }
            } else {
                // Contravariant velocity on the GLL grid, interpolated to the
                // cubature grid, then scaled by J and the cubature weights.
                let jac = vgeo[g + G_J * np];
                for dir in 0..3 {
                    let (mx, my, mz) = metric_row(dir);
                    let mut uc = vec![0.0; np];
                    for (n, v) in uc.iter_mut().enumerate() {
                        let id = e * np + n;
                        *v = vgeo[g + mx * np + n] * u[id]
                            + vgeo[g + my * np + n] * u[v_offset + id]
                            + vgeo[g + mz * np + n] * u[2 * v_offset + id];
                    }
                    let uc = tensor3_apply(cub_interp, cub_nq, nq, &uc);
                    for c in 0..cub_np {
                        let i = c % cub_nq;
                        let j = (c / cub_nq) % cub_nq;
                        let k = c / (cub_nq * cub_nq);
                        out[dir * out_offset + e * cub_np + c] =
                            jac * cub_w[i] * cub_w[j] * cub_w[k] * uc[c];
                    }
                }
            }
        }
    }
}

fn metric_row(dir: usize) -> (usize, usize, usize) {
    match dir {
        0 => (G_RX, G_RY, G_RZ),
        1 => (G_SX, G_SY, G_SZ),
        _ => (G_TX, G_TY, G_TZ),
    }
}

// =============================================================================
// Cubature-grid kernels
// =============================================================================

/// Dealiased strong advection: derivatives are formed on the cubature grid
/// against the JW-scaled contravariant flux and Galerkin-projected back to
/// the GLL nodes.
pub struct StrongAdvectionCubatureVolumeKernel {
    pub nq: usize,
    pub np: usize,
    pub cub_nq: usize,
    pub variant: AdvectionVariant,
}

impl StrongAdvectionCubatureVolumeKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        cub_interp: &[f64],
        cub_d: &[f64],
        w: &[f64],
        nfields: usize,
        field_offset: usize,
        urst_offset: usize,
        urst: &[f64],
        s: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np, cub_nq) = (self.nq, self.np, self.cub_nq);
        let cub_np = cub_nq * cub_nq * cub_nq;
        let variant = self.variant;

        for_each_element_field(nelements, nfields, field_offset, np, out, |f, e, out_e| {
            let s_e = &s[f * field_offset + e * np..f * field_offset + (e + 1) * np];
            let urst_e = |dir: usize, c: usize| urst[dir * urst_offset + e * cub_np + c];

            let prod = cubature_contraction(variant, nq, cub_nq, d, cub_interp, cub_d, s_e, urst_e);

            // Galerkin projection back to the GLL nodes; the flux already
            // carries J and the cubature weights, so only the transpose
            // interpolation and the inverse lumped mass remain.
            let mut interp_t = vec![0.0; nq * cub_nq];
            for c in 0..cub_nq {
                for i in 0..nq {
                    interp_t[i * cub_nq + c] = cub_interp[c * nq + i];
                }
            }
            let back = tensor3_apply(&interp_t, nq, cub_nq, &prod);
            let jac = vgeo[e * NVGEO * np + G_J * np];
            for n in 0..np {
                let i = n % nq;
                let j = (n / nq) % nq;
                let k = n / (nq * nq);
                out_e[n] = back[n] / (jac * w[i] * w[j] * w[k]);
            }
        });
    }
}

/// Subcycling rendition of the cubature advection: the flux history is
/// first interpolated in time with the supplied extrapolation weights, then
/// the stage advection proceeds as in the non-subcycled kernel.
pub struct SubCycleStrongCubatureVolumeKernel {
    pub nq: usize,
    pub np: usize,
    pub cub_nq: usize,
    pub n_ext: usize,
    pub variant: AdvectionVariant,
}

impl SubCycleStrongCubatureVolumeKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        cub_interp: &[f64],
        cub_d: &[f64],
        w: &[f64],
        nfields: usize,
        field_offset: usize,
        urst_offset: usize,
        time_coeff: &[f64],
        urst_history: &[f64],
        s: &[f64],
        out: &mut [f64],
    ) {
        let cub_np = self.cub_nq * self.cub_nq * self.cub_nq;
        let history_stride = 3 * urst_offset;

        // Flux at the stage time.
        let mut urst = vec![0.0; 3 * urst_offset];
        for (j, &c) in time_coeff.iter().enumerate().take(self.n_ext) {
            let slab = &urst_history[j * history_stride..(j + 1) * history_stride];
            for (dir, chunk) in urst.chunks_mut(urst_offset).enumerate() {
                let src = &slab[dir * urst_offset..dir * urst_offset + nelements * cub_np];
                for (o, &v) in chunk.iter_mut().zip(src.iter()) {
                    *o += c * v;
                }
            }
        }

        let inner = StrongAdvectionCubatureVolumeKernel {
            nq: self.nq,
            np: self.np,
            cub_nq: self.cub_nq,
            variant: self.variant,
        };
        inner.launch(
            nelements,
            vgeo,
            d,
            cub_interp,
            cub_d,
            w,
            nfields,
            field_offset,
            urst_offset,
            &urst,
            s,
            out,
        );
    }
}

/// `sum_c Urst_c (du/dr)_c` on the cubature grid, by the selected loop
/// organization. All variants compute the same polynomial contraction.
fn cubature_contraction(
    variant: AdvectionVariant,
    nq: usize,
    cub_nq: usize,
    d: &[f64],
    cub_interp: &[f64],
    cub_d: &[f64],
    s_e: &[f64],
    urst_e: impl Fn(usize, usize) -> f64,
) -> Vec<f64> {
    let cub_np = cub_nq * cub_nq * cub_nq;
    let mut prod = vec![0.0; cub_np];

    match variant {
        AdvectionVariant::Reference => {
            // Derivative on the GLL grid, then interpolate each component.
            let (dudr, duds, dudt) = element_gradient(d, nq, s_e);
            let dr = tensor3_apply(cub_interp, cub_nq, nq, &dudr);
            let ds = tensor3_apply(cub_interp, cub_nq, nq, &duds);
            let dt = tensor3_apply(cub_interp, cub_nq, nq, &dudt);
            for c in 0..cub_np {
                prod[c] = urst_e(0, c) * dr[c] + urst_e(1, c) * ds[c] + urst_e(2, c) * dt[c];
            }
        }
        AdvectionVariant::Fused => {
            // One contraction per cubature node over the full GLL stencil.
            let (dudr, duds, dudt) = element_gradient(d, nq, s_e);
            for c in 0..cub_np {
                let ci = c % cub_nq;
                let cj = (c / cub_nq) % cub_nq;
                let ck = c / (cub_nq * cub_nq);
                let (mut dr, mut ds, mut dt) = (0.0, 0.0, 0.0);
                for k in 0..nq {
                    for j in 0..nq {
                        for i in 0..nq {
                            let wgt = cub_interp[ci * nq + i]
                                * cub_interp[cj * nq + j]
                                * cub_interp[ck * nq + k];
                            let n = i + nq * (j + nq * k);
                            dr += wgt * dudr[n];
                            ds += wgt * duds[n];
                            dt += wgt * dudt[n];
                        }
                    }
                }
                prod[c] = urst_e(0, c) * dr + urst_e(1, c) * ds + urst_e(2, c) * dt;
            }
        }
        AdvectionVariant::Blocked => {
            // Differentiate straight onto the cubature grid along each axis.
            let dims = (nq, nq, nq);
            let t0 = apply_axis(cub_d, cub_nq, nq, s_e, dims, 0);
            let t0 = apply_axis(cub_interp, cub_nq, nq, &t0, (cub_nq, nq, nq), 1);
            let dr = apply_axis(cub_interp, cub_nq, nq, &t0, (cub_nq, cub_nq, nq), 2);

            let t1 = apply_axis(cub_interp, cub_nq, nq, s_e, dims, 0);
            let t1 = apply_axis(cub_d, cub_nq, nq, &t1, (cub_nq, nq, nq), 1);
            let ds = apply_axis(cub_interp, cub_nq, nq, &t1, (cub_nq, cub_nq, nq), 2);

            let t2 = apply_axis(cub_interp, cub_nq, nq, s_e, dims, 0);
            let t2 = apply_axis(cub_interp, cub_nq, nq, &t2, (cub_nq, nq, nq), 1);
            let dt = apply_axis(cub_d, cub_nq, nq, &t2, (cub_nq, cub_nq, nq), 2);

            for c in 0..cub_np {
                prod[c] = urst_e(0, c) * dr[c] + urst_e(1, c) * ds[c] + urst_e(2, c) * dt[c];
            }
        }
    }
    prod
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    fn linear_fields(mesh: &Mesh, offset: usize) -> (Vec<f64>, Vec<f64>) {
        // u = (1, 2, -1) constant; s = x + 2y + 3z so (u·grad)s = 2.
        let mut u = vec![0.0; 3 * offset];
        u[..mesh.nlocal()].fill(1.0);
        u[offset..offset + mesh.nlocal()].fill(2.0);
        u[2 * offset..2 * offset + mesh.nlocal()].fill(-1.0);
        let mut s = vec![0.0; offset];
        for n in 0..mesh.nlocal() {
            s[n] = mesh.x[n] + 2.0 * mesh.y[n] + 3.0 * mesh.z[n];
        }
        (u, s)
    }

    #[test]
    fn test_strong_advection_on_linear_field() {
        let mesh = Mesh::uniform_box(3, 4, 2, 1, 1);
        let offset = mesh.nlocal();
        let (u, s) = linear_fields(&mesh, offset);
        let kernel = StrongAdvectionVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
        };
        let mut out = vec![0.0; offset];
        kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.d,
            1,
            offset,
            offset,
            &u,
            &s,
            &mut out,
        );
        for n in 0..mesh.nlocal() {
            assert!((out[n] - 2.0).abs() < 1e-11, "node {}: {}", n, out[n]);
        }
    }

    #[test]
    fn test_mesh_velocity_correction_cancels() {
        // Advecting with u and then subtracting mesh velocity w = u zeroes
        // the term.
        let mesh = Mesh::uniform_box(2, 3, 1, 1, 1);
        let offset = mesh.nlocal();
        let (u, s) = linear_fields(&mesh, offset);
        let adv = StrongAdvectionVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
        };
        let ale = AdvectMeshVelocityKernel {
            nq: mesh.nq,
            np: mesh.np,
        };
        let mut out = vec![0.0; offset];
        adv.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.d,
            1,
            offset,
            offset,
            &u,
            &s,
            &mut out,
        );
        ale.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.d,
            1,
            offset,
            offset,
            &u,
            &s,
            &mut out,
        );
        for &v in &out[..mesh.nlocal()] {
            assert!(v.abs() < 1e-11);
        }
    }

    #[test]
    fn test_subcycle_collocation_matches_strong_form() {
        let mesh = Mesh::uniform_box(3, 4, 2, 2, 1);
        let offset = mesh.nlocal();
        let (u, s) = linear_fields(&mesh, offset);

        let urst_kernel = UrstKernel {
            nq: mesh.nq,
            np: mesh.np,
            cub_nq: mesh.ops.cub_nq(),
            cubature: false,
        };
        let mut urst = vec![0.0; 3 * offset];
        urst_kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.cub_interp,
            &mesh.ops.cub_w,
            offset,
            offset,
            &u,
            &mut urst,
        );

        let sub = SubCycleStrongVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
        };
        let mut out = vec![0.0; offset];
        sub.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.d,
            1,
            offset,
            offset,
            &urst,
            &s,
            &mut out,
        );
        for n in 0..mesh.nlocal() {
            assert!((out[n] - 2.0).abs() < 1e-11);
        }
    }

    #[test]
    fn test_cubature_variants_agree() {
        let mesh = Mesh::uniform_box(3, 5, 2, 1, 1);
        let offset = mesh.nlocal();
        let cub_np = mesh.ops.cub_nq().pow(3);
        let cub_offset = mesh.nelements * cub_np;

        // A genuinely nonlinear velocity/field pair.
        let mut u = vec![0.0; 3 * offset];
        let mut s = vec![0.0; offset];
        for n in 0..mesh.nlocal() {
            u[n] = 1.0 + mesh.x[n] * mesh.y[n];
            u[offset + n] = mesh.y[n] - mesh.z[n];
            u[2 * offset + n] = 0.5 * mesh.x[n];
            s[n] = mesh.x[n] * mesh.x[n] + mesh.y[n] * mesh.z[n];
        }

        let urst_kernel = UrstKernel {
            nq: mesh.nq,
            np: mesh.np,
            cub_nq: mesh.ops.cub_nq(),
            cubature: true,
        };
        let mut urst = vec![0.0; 3 * cub_offset];
        urst_kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.cub_interp,
            &mesh.ops.cub_w,
            offset,
            cub_offset,
            &u,
            &mut urst,
        );

        let mut results = Vec::new();
        for variant in [
            AdvectionVariant::Reference,
            AdvectionVariant::Fused,
            AdvectionVariant::Blocked,
        ] {
            let kernel = StrongAdvectionCubatureVolumeKernel {
                nq: mesh.nq,
                np: mesh.np,
                cub_nq: mesh.ops.cub_nq(),
                variant,
            };
            let mut out = vec![0.0; offset];
            kernel.launch(
                mesh.nelements,
                &mesh.vgeo,
                &mesh.ops.d,
                &mesh.ops.cub_interp,
                &mesh.ops.cub_d,
                &mesh.ops.w,
                1,
                offset,
                cub_offset,
                &urst,
                &s,
                &mut out,
            );
            results.push(out);
        }
        for other in &results[1..] {
            for (a, b) in results[0].iter().zip(other.iter()) {
                assert!((a - b).abs() < 1e-9, "variants must agree: {} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_cubature_matches_collocation_on_linear_data() {
        // For polynomial data below the dealiasing threshold both grids
        // produce the same advection term.
        let mesh = Mesh::uniform_box(3, 5, 1, 1, 1);
        let offset = mesh.nlocal();
        let cub_np = mesh.ops.cub_nq().pow(3);
        let cub_offset = mesh.nelements * cub_np;
        let (u, s) = linear_fields(&mesh, offset);

        let urst_kernel = UrstKernel {
            nq: mesh.nq,
            np: mesh.np,
            cub_nq: mesh.ops.cub_nq(),
            cubature: true,
        };
        let mut urst = vec![0.0; 3 * cub_offset];
        urst_kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.cub_interp,
            &mesh.ops.cub_w,
            offset,
            cub_offset,
            &u,
            &mut urst,
        );

        let kernel = StrongAdvectionCubatureVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
            cub_nq: mesh.ops.cub_nq(),
            variant: AdvectionVariant::Reference,
        };
        let mut out = vec![0.0; offset];
        kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.d,
            &mesh.ops.cub_interp,
            &mesh.ops.cub_d,
            &mesh.ops.w,
            1,
            offset,
            cub_offset,
            &urst,
            &s,
            &mut out,
        );
        for n in 0..mesh.nlocal() {
            assert!((out[n] - 2.0).abs() < 1e-10, "node {}: {}", n, out[n]);
        }
    }

    #[test]
    fn test_subcycle_cubature_time_interpolation() {
        // With history slabs h0 = 2*flux and h1 = flux, weights [1, 0] must
        // reproduce twice the single-slab result.
        let mesh = Mesh::uniform_box(2, 3, 1, 1, 1);
        let offset = mesh.nlocal();
        let cub_np = mesh.ops.cub_nq().pow(3);
        let cub_offset = mesh.nelements * cub_np;
        let (u, s) = linear_fields(&mesh, offset);

        let urst_kernel = UrstKernel {
            nq: mesh.nq,
            np: mesh.np,
            cub_nq: mesh.ops.cub_nq(),
            cubature: true,
        };
        let mut flux = vec![0.0; 3 * cub_offset];
        urst_kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.cub_interp,
            &mesh.ops.cub_w,
            offset,
            cub_offset,
            &u,
            &mut flux,
        );
        let mut history = vec![0.0; 2 * 3 * cub_offset];
        for (i, &v) in flux.iter().enumerate() {
            history[i] = 2.0 * v;
            history[3 * cub_offset + i] = v;
        }

        let kernel = SubCycleStrongCubatureVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
            cub_nq: mesh.ops.cub_nq(),
            n_ext: 2,
            variant: AdvectionVariant::Reference,
        };
        let mut out = vec![0.0; offset];
        kernel.launch(
            mesh.nelements,
            &mesh.vgeo,
            &mesh.ops.d,
            &mesh.ops.cub_interp,
            &mesh.ops.cub_d,
            &mesh.ops.w,
            1,
            offset,
            cub_offset,
            &[1.0, 0.0],
            &history,
            &s,
            &mut out,
        );
        for n in 0..mesh.nlocal() {
            assert!((out[n] - 4.0).abs() < 1e-10);
        }
    }
}
