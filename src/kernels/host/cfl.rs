//! Per-element CFL reduction kernel.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Computes, per element, the maximum over nodes of
/// `dt * (|ur| idH_i + |us| idH_j + |ut| idH_k)` with `(ur, us, ut)` the
/// contravariant velocity at the node. With a moving mesh the advecting
/// velocity is taken relative to the mesh velocity.
pub struct CflKernel {
    pub nq: usize,
    pub np: usize,
    pub moving_mesh: bool,
}

impl CflKernel {
    /// One output entry per element. `idh` holds the `nq` inverse nodal
    /// spacings; `u` holds three velocity fields of stride `field_offset`.
    /// `mesh_u` is consulted only when the kernel was specialized for a
    /// moving mesh.
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        dt: f64,
        vgeo: &[f64],
        idh: &[f64],
        field_offset: usize,
        u: &[f64],
        mesh_u: Option<&[f64]>,
        out: &mut [f64],
    ) {
        let mesh_u = if self.moving_mesh { mesh_u } else { None };

        let element = |e: usize| -> f64 {
            use crate::mesh::{G_RX, G_RY, G_RZ, G_SX, G_SY, G_SZ, G_TX, G_TY, G_TZ, NVGEO};
            let np = self.np;
            let nq = self.nq;
            let gbase = e * NVGEO * np;
            let mut cfl = 0.0f64;
            for n in 0..np {
                let i = n % nq;
                let j = (n / nq) % nq;
                let k = n / (nq * nq);
                let id = e * np + n;

                let mut uu = u[id];
                let mut vv = u[field_offset + id];
                let mut ww = u[2 * field_offset + id];
                if let Some(w) = mesh_u {
                    uu -= w[id];
                    vv -= w[field_offset + id];
                    ww -= w[2 * field_offset + id];
                }

                let ur = vgeo[gbase + G_RX * np + n] * uu
                    + vgeo[gbase + G_RY * np + n] * vv
                    + vgeo[gbase + G_RZ * np + n] * ww;
                let us = vgeo[gbase + G_SX * np + n] * uu
                    + vgeo[gbase + G_SY * np + n] * vv
                    + vgeo[gbase + G_SZ * np + n] * ww;
                let ut = vgeo[gbase + G_TX * np + n] * uu
                    + vgeo[gbase + G_TY * np + n] * vv
                    + vgeo[gbase + G_TZ * np + n] * ww;

                let local = dt
                    * ((ur * idh[i]).abs() + (us * idh[j]).abs() + (ut * idh[k]).abs());
                cfl = cfl.max(local);
            }
            cfl
        };

        #[cfg(feature = "parallel")]
        out[..nelements]
            .par_iter_mut()
            .enumerate()
            .for_each(|(e, c)| *c = element(e));

        #[cfg(not(feature = "parallel"))]
        for (e, c) in out[..nelements].iter_mut().enumerate() {
            *c = element(e);
        }
    }
}
