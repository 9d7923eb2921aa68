//! Differential-operator volume kernels: gradient, divergence, curl, and
//! the face-centroid reduction.

use super::tensor::apply_axis;
use crate::mesh::{
    G_JW, G_RX, G_RY, G_RZ, G_SX, G_SY, G_SZ, G_TX, G_TY, G_TZ, NFACES, NVGEO,
};

fn reference_gradients(d: &[f64], nq: usize, u_e: &[f64]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let dims = (nq, nq, nq);
    (
        apply_axis(d, nq, nq, u_e, dims, 0),
        apply_axis(d, nq, nq, u_e, dims, 1),
        apply_axis(d, nq, nq, u_e, dims, 2),
    )
}

/// Physical gradient of a scalar field, three output slabs; the weighted
/// form scales by the quadrature-weighted Jacobian.
pub struct GradientVolumeKernel {
    pub nq: usize,
    pub np: usize,
    pub weighted: bool,
}

impl GradientVolumeKernel {
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        out_offset: usize,
        p: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        for e in 0..nelements {
            let p_e = &p[e * np..(e + 1) * np];
            let (dpdr, dpds, dpdt) = reference_gradients(d, nq, p_e);
            let g = e * NVGEO * np;
            for n in 0..np {
                let id = e * np + n;
                let scale = if self.weighted { vgeo[g + G_JW * np + n] } else { 1.0 };
                out[id] = scale
                    * (vgeo[g + G_RX * np + n] * dpdr[n]
                        + vgeo[g + G_SX * np + n] * dpds[n]
                        + vgeo[g + G_TX * np + n] * dpdt[n]);
                out[out_offset + id] = scale
                    * (vgeo[g + G_RY * np + n] * dpdr[n]
                        + vgeo[g + G_SY * np + n] * dpds[n]
                        + vgeo[g + G_TY * np + n] * dpdt[n]);
                out[2 * out_offset + id] = scale
                    * (vgeo[g + G_RZ * np + n] * dpdr[n]
                        + vgeo[g + G_SZ * np + n] * dpds[n]
                        + vgeo[g + G_TZ * np + n] * dpdt[n]);
            }
        }
    }
}

/// Divergence of a three-field vector, one output slab; optionally weighted
/// by the quadrature-weighted Jacobian.
pub struct DivergenceVolumeKernel {
    pub nq: usize,
    pub np: usize,
    pub weighted: bool,
}

impl DivergenceVolumeKernel {
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        field_offset: usize,
        u: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        for e in 0..nelements {
            let g = e * NVGEO * np;
            let mut div = vec![0.0; np];
            for (f, rows) in [(0usize, (G_RX, G_SX, G_TX)), (1, (G_RY, G_SY, G_TY)), (2, (G_RZ, G_SZ, G_TZ))] {
                let u_e = &u[f * field_offset + e * np..f * field_offset + (e + 1) * np];
                let (dr, ds, dt) = reference_gradients(d, nq, u_e);
                let (mr, ms, mt) = rows;
                for n in 0..np {
                    div[n] += vgeo[g + mr * np + n] * dr[n]
                        + vgeo[g + ms * np + n] * ds[n]
                        + vgeo[g + mt * np + n] * dt[n];
                }
            }
            for n in 0..np {
                let scale = if self.weighted { vgeo[g + G_JW * np + n] } else { 1.0 };
                out[e * np + n] = scale * div[n];
            }
        }
    }
}

/// Curl of a three-field vector, three output slabs.
pub struct CurlKernel {
    pub nq: usize,
    pub np: usize,
}

impl CurlKernel {
    pub fn launch(
        &self,
        nelements: usize,
        vgeo: &[f64],
        d: &[f64],
        field_offset: usize,
        u: &[f64],
        out: &mut [f64],
    ) {
        let (nq, np) = (self.nq, self.np);
        for e in 0..nelements {
            let g = e * NVGEO * np;
            // Full physical gradient of each component, then antisymmetric
            // combinations.
            let mut grad = vec![0.0; 9 * np]; // [component][direction][node]
            for f in 0..3 {
                let u_e = &u[f * field_offset + e * np..f * field_offset + (e + 1) * np];
                let (dr, ds, dt) = reference_gradients(d, nq, u_e);
                for n in 0..np {
                    grad[(3 * f) * np + n] = vgeo[g + G_RX * np + n] * dr[n]
                        + vgeo[g + G_SX * np + n] * ds[n]
                        + vgeo[g + G_TX * np + n] * dt[n];
                    grad[(3 * f + 1) * np + n] = vgeo[g + G_RY * np + n] * dr[n]
                        + vgeo[g + G_SY * np + n] * ds[n]
                        + vgeo[g + G_TY * np + n] * dt[n];
                    grad[(3 * f + 2) * np + n] = vgeo[g + G_RZ * np + n] * dr[n]
                        + vgeo[g + G_SZ * np + n] * ds[n]
                        + vgeo[g + G_TZ * np + n] * dt[n];
                }
            }
            for n in 0..np {
                let id = e * np + n;
                let dudy = grad[np + n];
                let dudz = grad[2 * np + n];
                let dvdx = grad[3 * np + n];
                let dvdz = grad[5 * np + n];
                let dwdx = grad[6 * np + n];
                let dwdy = grad[7 * np + n];
                out[id] = dwdy - dvdz;
                out[field_offset + id] = dudz - dwdx;
                out[2 * field_offset + id] = dvdx - dudy;
            }
        }
    }
}

/// Per-face centroid coordinates, `3 * nelements * NFACES` output entries
/// laid out `[e][face][xyz]`.
pub struct FaceCentroidKernel {
    pub nq: usize,
    pub np: usize,
}

impl FaceCentroidKernel {
    pub fn launch(
        &self,
        nelements: usize,
        x: &[f64],
        y: &[f64],
        z: &[f64],
        out: &mut [f64],
    ) {
        let nq = self.nq;
        let nfp = nq * nq;
        for e in 0..nelements {
            for face in 0..NFACES {
                let (mut cx, mut cy, mut cz) = (0.0, 0.0, 0.0);
                for a in 0..nq {
                    for b in 0..nq {
                        let n = face_node(nq, face, a, b);
                        let id = e * self.np + n;
                        cx += x[id];
                        cy += y[id];
                        cz += z[id];
                    }
                }
                let base = 3 * (e * NFACES + face);
                out[base] = cx / nfp as f64;
                out[base + 1] = cy / nfp as f64;
                out[base + 2] = cz / nfp as f64;
            }
        }
    }
}

/// Volume-node index of face node `(a, b)` under the r/s/t-face ordering.
pub(crate) fn face_node(nq: usize, face: usize, a: usize, b: usize) -> usize {
    match face {
        0 => nq * (a + nq * b),
        1 => (nq - 1) + nq * (a + nq * b),
        2 => a + nq * nq * b,
        3 => a + nq * ((nq - 1) + nq * b),
        4 => a + nq * b,
        5 => a + nq * (b + nq * (nq - 1)),
        _ => panic!("face index {} out of range", face),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;

    #[test]
    fn test_gradient_of_linear_field() {
        let mesh = Mesh::uniform_box(3, 3, 2, 1, 1);
        let offset = mesh.nlocal();
        let p: Vec<f64> = (0..offset)
            .map(|n| 2.0 * mesh.x[n] - mesh.y[n] + 0.5 * mesh.z[n])
            .collect();
        let kernel = GradientVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
            weighted: false,
        };
        let mut out = vec![0.0; 3 * offset];
        kernel.launch(mesh.nelements, &mesh.vgeo, &mesh.ops.d, offset, &p, &mut out);
        for n in 0..offset {
            assert!((out[n] - 2.0).abs() < 1e-11);
            assert!((out[offset + n] + 1.0).abs() < 1e-11);
            assert!((out[2 * offset + n] - 0.5).abs() < 1e-11);
        }
    }

    #[test]
    fn test_weighted_divergence_integrates_flux() {
        // div(x, y, z) = 3; the weighted divergence summed over nodes is
        // 3 * volume.
        let mesh = Mesh::uniform_box(2, 2, 2, 2, 2);
        let offset = mesh.nlocal();
        let mut u = vec![0.0; 3 * offset];
        for n in 0..offset {
            u[n] = mesh.x[n];
            u[offset + n] = mesh.y[n];
            u[2 * offset + n] = mesh.z[n];
        }
        let kernel = DivergenceVolumeKernel {
            nq: mesh.nq,
            np: mesh.np,
            weighted: true,
        };
        let mut out = vec![0.0; offset];
        kernel.launch(mesh.nelements, &mesh.vgeo, &mesh.ops.d, offset, &u, &mut out);
        let total: f64 = out.iter().sum();
        assert!((total - 3.0).abs() < 1e-11, "got {}", total);
    }

    #[test]
    fn test_curl_of_rigid_rotation() {
        // u = (-y, x, 0) has curl (0, 0, 2).
        let mesh = Mesh::uniform_box(3, 3, 1, 2, 1);
        let offset = mesh.nlocal();
        let mut u = vec![0.0; 3 * offset];
        for n in 0..offset {
            u[n] = -mesh.y[n];
            u[offset + n] = mesh.x[n];
        }
        let kernel = CurlKernel {
            nq: mesh.nq,
            np: mesh.np,
        };
        let mut out = vec![0.0; 3 * offset];
        kernel.launch(mesh.nelements, &mesh.vgeo, &mesh.ops.d, offset, &u, &mut out);
        for n in 0..offset {
            assert!(out[n].abs() < 1e-11);
            assert!(out[offset + n].abs() < 1e-11);
            assert!((out[2 * offset + n] - 2.0).abs() < 1e-11);
        }
    }

    #[test]
    fn test_face_centroids_of_unit_box() {
        let mesh = Mesh::uniform_box(2, 2, 1, 1, 1);
        let kernel = FaceCentroidKernel {
            nq: mesh.nq,
            np: mesh.np,
        };
        let mut out = vec![0.0; 3 * NFACES];
        kernel.launch(1, &mesh.x, &mesh.y, &mesh.z, &mut out);
        // Face 0 is x = 0, face 1 is x = 1; both centered in y and z.
        assert!((out[0] - 0.0).abs() < 1e-13);
        assert!((out[1] - 0.5).abs() < 1e-13);
        assert!((out[2] - 0.5).abs() < 1e-13);
        assert!((out[3] - 1.0).abs() < 1e-13);
    }
}
