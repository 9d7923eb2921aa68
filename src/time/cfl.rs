//! Advective CFL estimation.

use log::debug;

use crate::error::SolverError;
use crate::kernels::{KernelHandle, KernelRegistry, SECTION_FLOW};
use crate::kernels::host::CflKernel;
use crate::mesh::Mesh;
use crate::platform::{Comm, DeviceArray};

/// Inverse nodal spacing of a 1D reference-node set: one-sided differences
/// at the endpoints, centered half-widths in the interior.
pub fn inverse_nodal_spacing(r: &[f64]) -> Vec<f64> {
    let n = r.len();
    let mut idh = vec![0.0; n];
    idh[0] = 1.0 / (r[1] - r[0]);
    idh[n - 1] = 1.0 / (r[n - 1] - r[n - 2]);
    for i in 1..n - 1 {
        idh[i] = 2.0 / (r[i + 1] - r[i - 1]);
    }
    idh
}

/// Global advective CFL of the current velocity field.
///
/// The inverse-spacing table is built and uploaded on first use; the
/// per-element maxima are reduced locally and then across ranks.
pub struct CflEstimator {
    handle: KernelHandle,
    scratch: Vec<f64>,
    o_cfl: DeviceArray<f64>,
    o_idh: Option<DeviceArray<f64>>,
}

impl CflEstimator {
    pub fn new(registry: &KernelRegistry, nelements: usize) -> Result<Self, SolverError> {
        Ok(Self {
            handle: registry.get(SECTION_FLOW, "cflHex3D")?,
            scratch: vec![0.0; nelements],
            o_cfl: DeviceArray::zeros(nelements),
            o_idh: None,
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn compute(
        &mut self,
        mesh: &Mesh,
        dt: f64,
        field_offset: usize,
        o_u: &DeviceArray<f64>,
        o_mesh_u: Option<&DeviceArray<f64>>,
        comm: &dyn Comm,
    ) -> Result<f64, SolverError> {
        let kernel = self.handle.downcast::<CflKernel>()?;
        let o_idh = self
            .o_idh
            .get_or_insert_with(|| DeviceArray::from_host(&inverse_nodal_spacing(&mesh.ops.r)));

        kernel.launch(
            mesh.nelements,
            dt,
            &mesh.vgeo,
            o_idh.as_slice(),
            field_offset,
            o_u.as_slice(),
            o_mesh_u.map(|m| m.as_slice()),
            self.o_cfl.as_mut_slice(),
        );

        self.o_cfl.copy_to_host(&mut self.scratch, 0);
        let local = self.scratch.iter().copied().fold(0.0f64, f64::max);
        let global = comm.allreduce_max(local);
        debug!("cfl: local {:.4e} global {:.4e}", local, global);
        Ok(global)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::host::HostCompiler;
    use crate::kernels::{KernelSpec, BLOCKSIZE};
    use crate::platform::SingleRank;

    struct TwoRankMax;

    impl Comm for TwoRankMax {
        fn rank(&self) -> usize {
            0
        }
        fn size(&self) -> usize {
            2
        }
        fn allreduce_max(&self, local: f64) -> f64 {
            // The peer rank reports 7.0.
            local.max(7.0)
        }
        fn allreduce_sum(&self, local: f64) -> f64 {
            local
        }
        fn allreduce_sum_slice(&self, _local: &mut [f64]) {}
    }

    fn built_registry(nq: usize) -> KernelRegistry {
        let mut registry = KernelRegistry::new();
        registry
            .add(
                KernelSpec::builder(SECTION_FLOW, "cflHex3D")
                    .subpath("nrs/")
                    .define("p_Nq", nq)
                    .define("p_MovingMesh", false)
                    .define("p_blockSize", BLOCKSIZE)
                    .build(),
            )
            .unwrap();
        registry.build(&HostCompiler).unwrap();
        registry
    }

    #[test]
    fn test_inverse_nodal_spacing_uniform_grid() {
        let r = [-1.0, 0.0, 1.0];
        let idh = inverse_nodal_spacing(&r);
        assert_eq!(idh, vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_estimator_matches_kernel_max() {
        let mesh = Mesh::uniform_box(3, 3, 2, 1, 1);
        let offset = mesh.nlocal();
        let registry = built_registry(mesh.nq);
        let mut estimator = CflEstimator::new(&registry, mesh.nelements).unwrap();

        let mut u = vec![0.0; 3 * offset];
        u[..offset].fill(1.0);
        let o_u = DeviceArray::from_host(&u);

        let cfl = estimator
            .compute(&mesh, 0.1, offset, &o_u, None, &SingleRank)
            .unwrap();
        assert!(cfl > 0.0);
        // Doubling dt doubles the estimate.
        let cfl2 = estimator
            .compute(&mesh, 0.2, offset, &o_u, None, &SingleRank)
            .unwrap();
        assert!((cfl2 - 2.0 * cfl).abs() < 1e-13);
    }

    #[test]
    fn test_global_reduction_takes_remote_max() {
        let mesh = Mesh::uniform_box(2, 2, 1, 1, 1);
        let offset = mesh.nlocal();
        let registry = built_registry(mesh.nq);
        let mut estimator = CflEstimator::new(&registry, mesh.nelements).unwrap();

        let u = vec![0.0; 3 * offset];
        let o_u = DeviceArray::from_host(&u);
        let cfl = estimator
            .compute(&mesh, 0.1, offset, &o_u, None, &TwoRankMax)
            .unwrap();
        assert_eq!(cfl, 7.0, "remote rank dominates a quiescent local field");
    }
}
