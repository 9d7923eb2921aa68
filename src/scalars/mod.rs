//! Passive-scalar transport ("CDS") state and setup.
//!
//! Scalar fields share one flat device layout: every field slab has the
//! flow solver's `field_offset` stride, prefix-summed into
//! `field_offset_scan`, with `field_offset_sum` the total. Setup derives
//! per-field routing (disabled / CVODE / elliptic), fills the property
//! buffer, translates boundary tags, builds the regularization state and
//! binds every kernel the scalar solver dispatches.

pub mod regularization;

pub use regularization::{AvmSetup, Regularization};

use log::info;

use crate::bc::{scalar_field_label, BcMap};
use crate::config::{
    scalar_key, AdvectionKind, Options, SolverKind, BDF_ORDER, EXT_ORDER, NUMBER_OF_SCALARS,
    SUBCYCLING_STEPS,
};
use crate::error::SolverError;
use crate::flow::FlowState;
use crate::kernels::{KernelHandle, KernelProps, KernelRegistry, KernelSpec, BLOCKSIZE, SECTION_SCALAR};
use crate::mesh::NFACES;
use crate::platform::DeviceArray;
use crate::time::RkTable;

/// Kernel handles bound by scalar-transport setup. Every handle is
/// resolved eagerly; a missing registration fails setup.
#[derive(Debug)]
pub struct ScalarKernels {
    pub strong_advection_volume: KernelHandle,
    pub strong_advection_cubature_volume: Option<KernelHandle>,
    pub advect_mesh_velocity: KernelHandle,
    pub mask_copy: KernelHandle,
    pub mask_copy2: KernelHandle,
    pub sum_makef: KernelHandle,
    pub neumann_bc: KernelHandle,
    pub dirichlet_bc: KernelHandle,
    pub set_elliptic_coeff: KernelHandle,
    pub filter_rt: KernelHandle,
    pub sub_cycle_strong_volume: Option<KernelHandle>,
    pub sub_cycle_strong_cubature_volume: Option<KernelHandle>,
}

/// Scalar-transport state.
#[derive(Debug)]
pub struct ScalarTransport {
    pub nfields: usize,
    /// Per-field slab stride; every entry equals the flow `field_offset`.
    pub field_offset: Vec<usize>,
    /// Exclusive prefix sum of `field_offset`.
    pub field_offset_scan: Vec<usize>,
    pub field_offset_sum: usize,
    pub o_field_offset_scan: DeviceArray<usize>,
    pub solver: Vec<SolverKind>,
    /// 1 when the field participates in gated kernels, 0 when disabled.
    pub compute: Vec<i32>,
    /// 1 when the field is routed to the CVODE collaborator.
    pub cvode_solve: Vec<i32>,
    pub any_cvode_solver: bool,
    pub any_elliptic_solver: bool,
    pub o_compute: DeviceArray<i32>,
    pub o_cvode_solve: DeviceArray<i32>,
    /// Two-slab property buffer: diffusivity then density, each
    /// `field_offset_sum` long.
    pub o_prop: DeviceArray<f64>,
    /// Boundary-condition codes, `etob_offset` entries per field.
    pub etob_offset: usize,
    pub o_etob: DeviceArray<i32>,
    /// Scalar history, `max(nBDF, nEXT)` slabs when any field solves
    /// elliptically.
    pub o_s: DeviceArray<f64>,
    /// Forcing history, `nEXT` slabs when any field solves elliptically.
    pub o_fs: DeviceArray<f64>,
    /// Extrapolated scalars; allocated only for elliptic runs.
    pub o_se: Option<DeviceArray<f64>>,
    /// Assembled right-hand side; allocated only for elliptic runs.
    pub o_bf: Option<DeviceArray<f64>>,
    pub regularization: Option<Regularization>,
    pub n_bdf: usize,
    pub n_ext: usize,
    pub nsubsteps: usize,
    /// Stage tableau shared with the flow solver when subcycling.
    pub rk: Option<RkTable>,
    pub kernels: ScalarKernels,
}

impl ScalarTransport {
    pub fn setup(
        flow: &FlowState,
        options: &Options,
        bc_map: &BcMap,
        registry: &KernelRegistry,
    ) -> Result<Self, SolverError> {
        let nfields = options.usize_or(NUMBER_OF_SCALARS, 0)?;
        let nlocal = flow.nlocal();
        let mesh = &flow.mesh;

        // Layout: uniform stride, exclusive scan.
        let field_offset = vec![flow.field_offset; nfields];
        let mut field_offset_scan = vec![0usize; nfields];
        let mut sum = 0;
        for s in 0..nfields {
            field_offset_scan[s] = sum;
            sum += field_offset[s];
        }
        let field_offset_sum = sum;

        let mut solver = Vec::with_capacity(nfields);
        let mut compute = vec![0i32; nfields];
        let mut cvode_solve = vec![0i32; nfields];
        let mut any_cvode_solver = false;
        let mut any_elliptic_solver = false;
        for s in 0..nfields {
            let kind = SolverKind::parse(options.get(&scalar_key(s, "SOLVER")));
            solver.push(kind);
            if kind.is_enabled() {
                compute[s] = 1;
            }
            if kind == SolverKind::Cvode {
                cvode_solve[s] = 1;
                any_cvode_solver = true;
            }
            any_elliptic_solver |= kind == SolverKind::Elliptic;
        }

        let mut o_prop = DeviceArray::zeros(2 * field_offset_sum);
        for s in 0..nfields {
            if !solver[s].is_enabled() {
                continue;
            }
            let diff = options.f64_or(&scalar_key(s, "DIFFUSIVITY"), 1.0)?;
            let rho = options.f64_or(&scalar_key(s, "DENSITY"), 1.0)?;
            o_prop.slice_mut(field_offset_scan[s], nlocal).fill(diff);
            o_prop
                .slice_mut(field_offset_sum + field_offset_scan[s], nlocal)
                .fill(rho);
        }

        // Boundary-code translation per field; disabled fields keep zeros.
        // Fields beyond the first always live on the fluid mesh.
        let etob_offset = mesh.nelements * NFACES;
        let mut etob = vec![0i32; etob_offset * nfields];
        for s in 0..nfields {
            if !solver[s].is_enabled() {
                continue;
            }
            let label = scalar_field_label(s);
            for e in 0..mesh.nelements {
                for f in 0..NFACES {
                    etob[s * etob_offset + e * NFACES + f] =
                        bc_map.id(mesh.boundary_tag(e, f), &label);
                }
            }
        }

        let n_bdf = flow.scheme.n_bdf();
        let n_ext = flow.scheme.n_ext();
        let nsubsteps = flow.nsubsteps;

        let history_slabs = if any_elliptic_solver { n_bdf.max(n_ext) } else { 1 };
        let forcing_slabs = if any_elliptic_solver { n_ext } else { 1 };

        let regularization = Regularization::setup(
            nfields,
            mesh.nq,
            &mesh.ops.r,
            &compute,
            options,
        )?;

        let cubature = flow.advection.is_cubature();
        let kernels = ScalarKernels {
            strong_advection_volume: registry.get(SECTION_SCALAR, "strongAdvectionVolumeHex3D")?,
            strong_advection_cubature_volume: if cubature {
                Some(registry.get(SECTION_SCALAR, "strongAdvectionCubatureVolumeHex3D")?)
            } else {
                None
            },
            advect_mesh_velocity: registry.get(SECTION_SCALAR, "advectMeshVelocityHex3D")?,
            mask_copy: registry.get(SECTION_SCALAR, "maskCopy")?,
            mask_copy2: registry.get(SECTION_SCALAR, "maskCopy2")?,
            sum_makef: registry.get(SECTION_SCALAR, "sumMakef")?,
            neumann_bc: registry.get(SECTION_SCALAR, "neumannBCHex3D")?,
            dirichlet_bc: registry.get(SECTION_SCALAR, "dirichletBC")?,
            set_elliptic_coeff: registry.get(SECTION_SCALAR, "setEllipticCoeff")?,
            filter_rt: registry.get(SECTION_SCALAR, "filterRTHex3D")?,
            sub_cycle_strong_volume: if nsubsteps > 0 {
                Some(registry.get(SECTION_SCALAR, "subCycleStrongVolumeHex3D")?)
            } else {
                None
            },
            sub_cycle_strong_cubature_volume: if nsubsteps > 0 && cubature {
                Some(registry.get(SECTION_SCALAR, "subCycleStrongCubatureVolumeHex3D")?)
            } else {
                None
            },
        };

        info!(
            "scalar transport: {} fields ({} elliptic, {} cvode, {} disabled)",
            nfields,
            solver.iter().filter(|k| **k == SolverKind::Elliptic).count(),
            cvode_solve.iter().filter(|v| **v == 1).count(),
            compute.iter().filter(|v| **v == 0).count(),
        );

        Ok(Self {
            nfields,
            o_field_offset_scan: DeviceArray::from_host(&field_offset_scan),
            field_offset,
            field_offset_scan,
            field_offset_sum,
            o_compute: DeviceArray::from_host(&compute),
            o_cvode_solve: DeviceArray::from_host(&cvode_solve),
            solver,
            compute,
            cvode_solve,
            any_cvode_solver,
            any_elliptic_solver,
            o_prop,
            etob_offset,
            o_etob: DeviceArray::from_host(&etob),
            o_s: DeviceArray::zeros(history_slabs * field_offset_sum),
            o_fs: DeviceArray::zeros(forcing_slabs * field_offset_sum),
            o_se: any_elliptic_solver.then(|| DeviceArray::zeros(field_offset_sum)),
            o_bf: any_elliptic_solver.then(|| DeviceArray::zeros(field_offset_sum)),
            regularization,
            n_bdf,
            n_ext,
            nsubsteps,
            rk: (nsubsteps > 0).then(|| flow.rk.clone()),
            kernels,
        })
    }

    /// Diffusivity slice of field `s` over `nlocal` nodes.
    pub fn diff(&self, s: usize, nlocal: usize) -> &[f64] {
        self.o_prop.slice(self.field_offset_scan[s], nlocal)
    }

    /// Density slice of field `s` over `nlocal` nodes.
    pub fn rho(&self, s: usize, nlocal: usize) -> &[f64] {
        self.o_prop
            .slice(self.field_offset_sum + self.field_offset_scan[s], nlocal)
    }

    /// Boundary-condition codes of field `s`.
    pub fn etob(&self, s: usize) -> &[i32] {
        self.o_etob.slice(s * self.etob_offset, self.etob_offset)
    }
}

/// Registers every scalar-transport kernel specialization under the `cds`
/// section.
pub fn register_scalar_kernels(
    registry: &mut KernelRegistry,
    options: &Options,
    serial: bool,
) -> Result<(), SolverError> {
    let n = options.usize_or(crate::config::POLYNOMIAL_DEGREE, 0)?;
    let cub_n = options.usize_or(crate::config::CUBATURE_POLYNOMIAL_DEGREE, 0)?;
    let nq = n + 1;
    let np = nq * nq * nq;
    let cub_nq = cub_n + 1;
    let cub_np = cub_nq * cub_nq * cub_nq;

    let nsubsteps = options.usize_or(SUBCYCLING_STEPS, 0)?;
    let n_bdf = options.usize_or(BDF_ORDER, 2)?;
    let mut n_ext = options.usize_or(EXT_ORDER, n_bdf)?;
    if nsubsteps > 0 {
        n_ext = n_bdf;
    }
    let cubature = AdvectionKind::parse(options).is_cubature();

    let base = KernelProps::new().with("p_blockSize", BLOCKSIZE);
    let mesh_props = base.clone().with("p_Nq", nq).with("p_Np", np);
    let cub_props = mesh_props.clone().with("p_cubNq", cub_nq).with("p_cubNp", cub_np);

    registry.add(
        KernelSpec::builder(SECTION_SCALAR, "strongAdvectionVolumeHex3D")
            .subpath("cds/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;
    if cubature {
        registry.add(
            KernelSpec::builder(SECTION_SCALAR, "strongAdvectionCubatureVolumeHex3D")
                .subpath("cds/")
                .serial(serial)
                .props(cub_props.clone())
                .build(),
        )?;
    }

    registry.add(
        KernelSpec::builder(SECTION_SCALAR, "advectMeshVelocityHex3D")
            .subpath("cds/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;

    for name in ["maskCopy", "maskCopy2", "setEllipticCoeff"] {
        registry.add(
            KernelSpec::builder(SECTION_SCALAR, name)
                .subpath("core/")
                .serial(serial)
                .props(base.clone())
                .build(),
        )?;
    }

    registry.add(
        KernelSpec::builder(SECTION_SCALAR, "sumMakef")
            .subpath("cds/")
            .serial(serial)
            .props(
                mesh_props
                    .clone()
                    .with("p_nEXT", n_ext)
                    .with("p_nBDF", n_bdf)
                    .with("p_SUBCYCLING", nsubsteps > 0),
            )
            .build(),
    )?;

    registry.add(
        KernelSpec::builder(SECTION_SCALAR, "neumannBCHex3D")
            .subpath("cds/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;
    registry.add(
        KernelSpec::builder(SECTION_SCALAR, "dirichletBC")
            .subpath("cds/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;

    registry.add(
        KernelSpec::builder(SECTION_SCALAR, "filterRTHex3D")
            .subpath("cds/regularization/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;

    if nsubsteps > 0 {
        let subcycle_props = cub_props
            .with("p_nEXT", n_ext)
            .with("p_nBDF", n_bdf);
        if cubature {
            registry.add(
                KernelSpec::builder(SECTION_SCALAR, "subCycleStrongCubatureVolumeHex3D")
                    .subpath("cds/")
                    .serial(serial)
                    .props(subcycle_props.clone().with("p_knl", 0usize))
                    .build(),
            )?;
        }
        registry.add(
            KernelSpec::builder(SECTION_SCALAR, "subCycleStrongVolumeHex3D")
                .subpath("cds/")
                .serial(serial)
                .props(subcycle_props)
                .build(),
        )?;
    }

    Ok(())
}
