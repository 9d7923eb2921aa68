//! HPFRT relaxation-term filter kernel.

use super::tensor::tensor3_apply;

/// Applies the per-field high-pass filter as a relaxation source:
/// `out_s += strength_s * (F_s ⊗ F_s ⊗ F_s) u_s` for every field whose
/// apply flag is set. Strengths arrive pre-negated, so the term always
/// damps the retained high modes.
pub struct FilterRtKernel {
    pub nq: usize,
    pub np: usize,
}

impl FilterRtKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nelements: usize,
        nfields: usize,
        field_offset: usize,
        filter_rt: &[f64],
        filter_s: &[f64],
        apply: &[i32],
        u: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        let nmodes2 = nq * nq;
        for s in 0..nfields {
            if apply[s] == 0 {
                continue;
            }
            let fmat = &filter_rt[s * nmodes2..(s + 1) * nmodes2];
            let strength = filter_s[s];
            for e in 0..nelements {
                let base = s * field_offset + e * np;
                let high = tensor3_apply(fmat, nq, nq, &u[base..base + np]);
                for (n, &h) in high.iter().enumerate() {
                    out[base + n] += strength * h;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{low_pass_amplitudes, Vandermonde};
    use crate::mesh::Mesh;
    use crate::polynomial::legendre;

    #[test]
    fn test_filter_leaves_low_modes_and_damps_top_mode() {
        let mesh = Mesh::uniform_box(4, 4, 1, 1, 1);
        let offset = mesh.nlocal();
        let nq = mesh.nq;
        let vd = Vandermonde::new(mesh.order, &mesh.ops.r);
        let fmat = vd.modal_damping_matrix(&low_pass_amplitudes(nq, nq - 1));

        let kernel = FilterRtKernel {
            nq,
            np: mesh.np,
        };

        // Constant field: entirely below the cutoff, no relaxation added.
        let u = vec![1.0; offset];
        let mut out = vec![0.0; offset];
        kernel.launch(1, 1, offset, &fmat, &[-0.05], &[1], &u, &mut out);
        assert!(out.iter().all(|&v| v.abs() < 1e-12));

        // Top 1D mode in r: fully damped with the configured strength.
        let top: Vec<f64> = (0..mesh.np)
            .map(|n| legendre(mesh.order, mesh.ops.r[n % nq]))
            .collect();
        let mut out = vec![0.0; offset];
        kernel.launch(1, 1, offset, &fmat, &[-0.05], &[1], &top, &mut out);
        for (n, &v) in out.iter().enumerate().take(mesh.np) {
            assert!(
                (v + 0.05 * top[n]).abs() < 1e-12,
                "node {}: {} vs {}",
                n,
                v,
                -0.05 * top[n]
            );
        }
    }

    #[test]
    fn test_disabled_field_is_skipped() {
        let mesh = Mesh::uniform_box(2, 2, 1, 1, 1);
        let offset = mesh.nlocal();
        let nq = mesh.nq;
        let vd = Vandermonde::new(mesh.order, &mesh.ops.r);
        let fmat = vd.modal_damping_matrix(&low_pass_amplitudes(nq, 1));
        let mut filter_rt = vec![0.0; 2 * nq * nq];
        filter_rt[..nq * nq].copy_from_slice(&fmat);
        filter_rt[nq * nq..].copy_from_slice(&fmat);

        let kernel = FilterRtKernel {
            nq,
            np: mesh.np,
        };
        let u = vec![1.0; 2 * offset];
        let mut out = vec![0.0; 2 * offset];
        kernel.launch(1, 2, offset, &filter_rt, &[-1.0, -1.0], &[0, 1], &u, &mut out);
        assert!(
            out[..offset].iter().all(|&v| v == 0.0),
            "field 0 has the apply flag off"
        );
    }
}
