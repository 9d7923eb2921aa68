//! Flow-solver state and kernel registration.
//!
//! [`FlowState`] owns the velocity/pressure side of a run: field offsets,
//! the multistep history buffers, transport properties and the resolved
//! time-integration state. [`register_flow_kernels`] enters every operator
//! the flow solver dispatches into the kernel registry, specialized by the
//! run configuration; it must run before `registry.build`.

use std::time::Duration;

use log::info;

use crate::config::{
    AdvectionKind, Options, BDF_ORDER, CUBATURE_POLYNOMIAL_DEGREE, DENSITY, EXT_ORDER,
    KERNEL_AUTOTUNING, MOVING_MESH, POLYNOMIAL_DEGREE, SUBCYCLING_STEPS, VERBOSE, VISCOSITY,
};
use crate::error::SolverError;
use crate::kernels::autotune::select_advection_variant;
use crate::kernels::{KernelProps, KernelRegistry, KernelSpec, BLOCKSIZE, SECTION_FLOW};
use crate::mesh::{Mesh, NFACES};
use crate::platform::DeviceArray;
use crate::time::{erk4, RkTable, TimeScheme, MAX_ORDER};

/// Velocity components carried by the flow solver.
pub const NV_FIELDS: usize = 3;

/// Field offsets are padded to this many entries so every field slab starts
/// on an aligned device address.
const OFFSET_ALIGNMENT: usize = 64;

/// Wall-clock budget for the advection autotune microbenchmark.
const AUTOTUNE_TARGET_TIME: Duration = Duration::from_millis(300);

/// Round a node count up to the field-slab alignment.
pub fn aligned_offset(n: usize) -> usize {
    n.div_ceil(OFFSET_ALIGNMENT) * OFFSET_ALIGNMENT
}

/// Flow-solver state: geometry, offsets, history buffers and transport
/// properties for the three velocity fields.
pub struct FlowState {
    pub mesh: Mesh,
    /// Padded per-field slab stride, `>= mesh.nlocal()`.
    pub field_offset: usize,
    /// Padded per-direction stride of the contravariant-flux buffers.
    pub cubature_offset: usize,
    pub scheme: TimeScheme,
    pub nsubsteps: usize,
    /// Stage tableau for the subcycling characteristics integrator.
    pub rk: RkTable,
    pub advection: AdvectionKind,
    pub moving_mesh: bool,
    /// Velocity history, `max(nBDF, nEXT)` slabs of `NV_FIELDS` fields.
    pub o_u: DeviceArray<f64>,
    /// Extrapolated velocity at the new time level.
    pub o_ue: DeviceArray<f64>,
    /// Advective forcing history, `nEXT` slabs.
    pub o_fu: DeviceArray<f64>,
    /// Assembled right-hand side of the velocity solve.
    pub o_bf: DeviceArray<f64>,
    /// Contravariant flux (history when subcycling), `3 * cubature_offset`
    /// per slab.
    pub o_urst: DeviceArray<f64>,
    /// Two-slab transport properties: dynamic viscosity then density.
    pub o_prop: DeviceArray<f64>,
    /// Two-slab Helmholtz coefficients for the velocity solve.
    pub o_elliptic_coeff: DeviceArray<f64>,
    /// Lumped mass matrix over local nodes.
    pub o_lmm: DeviceArray<f64>,
    /// Mesh velocity, allocated only for moving-mesh runs.
    pub o_mesh_u: Option<DeviceArray<f64>>,
    /// Device mirrors of the multistep coefficients.
    pub o_coeff_bdf: DeviceArray<f64>,
    pub o_coeff_ext: DeviceArray<f64>,
}

impl FlowState {
    pub fn setup(mesh: Mesh, options: &Options) -> Result<Self, SolverError> {
        let n_bdf = options.usize_or(BDF_ORDER, 2)?;
        let n_ext = options.usize_or(EXT_ORDER, n_bdf)?;
        let nsubsteps = options.usize_or(SUBCYCLING_STEPS, 0)?;
        let scheme = TimeScheme::new(n_bdf, n_ext, nsubsteps > 0)?;

        let advection = AdvectionKind::parse(options);
        let moving_mesh = options.flag(MOVING_MESH);

        let nlocal = mesh.nlocal();
        let field_offset = aligned_offset(nlocal);
        let cub_np = mesh.ops.cub_nq().pow(3);
        let cubature_offset = aligned_offset(mesh.nelements * cub_np);

        let n_states = scheme.n_bdf().max(scheme.n_ext());
        let n_flux_slabs = if nsubsteps > 0 { scheme.n_ext() } else { 1 };

        let mue = options.f64_or(VISCOSITY, 1.0)?;
        let rho = options.f64_or(DENSITY, 1.0)?;
        let mut o_prop = DeviceArray::zeros(2 * field_offset);
        o_prop.slice_mut(0, nlocal).fill(mue);
        o_prop.slice_mut(field_offset, nlocal).fill(rho);

        let o_lmm = DeviceArray::from_host(&mesh.lumped_mass());

        Ok(Self {
            field_offset,
            cubature_offset,
            nsubsteps,
            rk: erk4(),
            advection,
            moving_mesh,
            o_u: DeviceArray::zeros(n_states * NV_FIELDS * field_offset),
            o_ue: DeviceArray::zeros(NV_FIELDS * field_offset),
            o_fu: DeviceArray::zeros(scheme.n_ext() * NV_FIELDS * field_offset),
            o_bf: DeviceArray::zeros(NV_FIELDS * field_offset),
            o_urst: DeviceArray::zeros(n_flux_slabs * 3 * cubature_offset),
            o_prop,
            o_elliptic_coeff: DeviceArray::zeros(2 * field_offset),
            o_lmm,
            o_mesh_u: moving_mesh.then(|| DeviceArray::zeros(NV_FIELDS * field_offset)),
            o_coeff_bdf: DeviceArray::zeros(MAX_ORDER),
            o_coeff_ext: DeviceArray::zeros(MAX_ORDER),
            scheme,
            mesh,
        })
    }

    pub fn nlocal(&self) -> usize {
        self.mesh.nlocal()
    }

    /// Viscosity half of the property buffer.
    pub fn mue(&self) -> &[f64] {
        self.o_prop.slice(0, self.nlocal())
    }

    /// Density half of the property buffer.
    pub fn rho(&self) -> &[f64] {
        self.o_prop.slice(self.field_offset, self.nlocal())
    }

    /// Push the freshly computed coefficients to their device mirrors.
    pub fn upload_coefficients(&mut self) {
        self.o_coeff_bdf.copy_from_host(self.scheme.coeff_bdf(), 0);
        self.o_coeff_ext.copy_from_host(self.scheme.coeff_ext(), 0);
    }
}

fn check_work_group(kernel: &str, nq: usize) -> Result<(), SolverError> {
    if BLOCKSIZE < nq * nq {
        return Err(SolverError::WorkGroupSize {
            kernel: kernel.to_string(),
            required: nq * nq,
            available: BLOCKSIZE,
        });
    }
    Ok(())
}

/// Registers every flow-solver kernel specialization.
///
/// `nelements` sizes the autotune microbenchmark; `serial` selects native
/// `.c` sources over `.okl` device sources.
pub fn register_flow_kernels(
    registry: &mut KernelRegistry,
    options: &Options,
    nelements: usize,
    serial: bool,
) -> Result<(), SolverError> {
    let n = options.usize_or(POLYNOMIAL_DEGREE, 0)?;
    let cub_n = options.usize_or(CUBATURE_POLYNOMIAL_DEGREE, 0)?;
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
    let moving_mesh = options.flag(MOVING_MESH);
    let cubature = AdvectionKind::parse(options).is_cubature();

    let base = KernelProps::new()
        .with("p_NVfields", NV_FIELDS)
        .with("p_blockSize", BLOCKSIZE);
    let mesh_props = base.clone().with("p_Nq", nq).with("p_Np", np);
    let cub_props = mesh_props.clone().with("p_cubNq", cub_nq).with("p_cubNp", cub_np);

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "nStagesSumMany")
            .subpath("core/")
            .serial(serial)
            .props(base.clone())
            .build(),
    )?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "nStagesSum3")
            .subpath("core/")
            .serial(serial)
            .props(base.clone())
            .build(),
    )?;

    check_work_group("computeFaceCentroid", nq)?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "computeFaceCentroid")
            .subpath("nrs/")
            .serial(serial)
            .props(
                mesh_props
                    .clone()
                    .with("p_Nfp", nq * nq)
                    .with("p_Nfaces", NFACES),
            )
            .build(),
    )?;

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "strongAdvectionVolumeHex3D")
            .subpath("nrs/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;
    if cubature {
        registry.add(
            KernelSpec::builder(SECTION_FLOW, "strongAdvectionCubatureVolumeHex3D")
                .subpath("nrs/")
                .serial(serial)
                .props(cub_props.clone())
                .build(),
        )?;
    }

    for name in ["curlHex3D", "gradientVolumeHex3D", "wGradientVolumeHex3D"] {
        registry.add(
            KernelSpec::builder(SECTION_FLOW, name)
                .subpath("nrs/")
                .serial(serial)
                .props(mesh_props.clone())
                .build(),
        )?;
    }

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "sumMakef")
            .subpath("nrs/")
            .serial(serial)
            .props(
                mesh_props
                    .clone()
                    .with("p_nEXT", n_ext)
                    .with("p_nBDF", n_bdf)
                    .with("p_MovingMesh", moving_mesh)
                    .with("p_SUBCYCLING", nsubsteps > 0),
            )
            .build(),
    )?;

    for name in [
        "wDivergenceVolumeHex3D",
        "divergenceVolumeHex3D",
        "advectMeshVelocityHex3D",
        "pressureRhsHex3D",
        "pressureStressHex3D",
        "pressureDirichletBCHex3D",
        "velocityRhsHex3D",
        "velocityDirichletBCHex3D",
        "velocityNeumannBCHex3D",
    ] {
        registry.add(
            KernelSpec::builder(SECTION_FLOW, name)
                .subpath("nrs/")
                .serial(serial)
                .props(mesh_props.clone())
                .build(),
        )?;
    }

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "UrstCubatureHex3D")
            .subpath("nrs/")
            .serial(serial)
            .props(cub_props.clone())
            .build(),
    )?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "UrstHex3D")
            .subpath("nrs/")
            .serial(serial)
            .props(cub_props.clone())
            .build(),
    )?;

    let subcycle_props = cub_props
        .clone()
        .with("p_MovingMesh", moving_mesh)
        .with("p_nEXT", n_ext)
        .with("p_nBDF", n_bdf);

    if cubature && nsubsteps > 0 {
        let autotune = !options.compare(KERNEL_AUTOTUNING, "FALSE");
        let verbose = options.flag(VERBOSE);
        let variant = select_advection_variant(
            nelements,
            nq,
            cub_nq,
            n_ext,
            AUTOTUNE_TARGET_TIME,
            verbose,
            autotune,
        );
        registry.add(
            KernelSpec::builder(SECTION_FLOW, "subCycleStrongCubatureVolumeHex3D")
                .subpath("nrs/")
                .serial(serial)
                .props(subcycle_props.clone().with("p_knl", variant.index()))
                .build(),
        )?;
    }

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "subCycleStrongVolumeHex3D")
            .subpath("nrs/")
            .serial(serial)
            .props(subcycle_props.clone())
            .build(),
    )?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "subCycleRK")
            .subpath("nrs/")
            .serial(serial)
            .props(subcycle_props.clone().with("p_nRK", erk4().n_stages()))
            .build(),
    )?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "subCycleInitU0")
            .subpath("nrs/")
            .serial(serial)
            .props(subcycle_props)
            .build(),
    )?;

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "extrapolate")
            .subpath("core/")
            .serial(serial)
            .props(mesh_props.clone().with("p_nEXT", n_ext))
            .build(),
    )?;

    for name in ["maskCopy", "maskCopy2", "mask"] {
        registry.add(
            KernelSpec::builder(SECTION_FLOW, name)
                .subpath("core/")
                .serial(serial)
                .props(base.clone())
                .build(),
        )?;
    }

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "filterRTHex3D")
            .subpath("nrs/regularization/")
            .serial(serial)
            .props(mesh_props.clone())
            .build(),
    )?;

    check_work_group("cflHex3D", nq)?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "cflHex3D")
            .subpath("nrs/")
            .serial(serial)
            .props(mesh_props.clone().with("p_MovingMesh", moving_mesh))
            .build(),
    )?;

    registry.add(
        KernelSpec::builder(SECTION_FLOW, "setEllipticCoeff")
            .subpath("core/")
            .serial(serial)
            .props(base.clone())
            .build(),
    )?;
    registry.add(
        KernelSpec::builder(SECTION_FLOW, "setEllipticCoeffPressure")
            .subpath("nrs/")
            .serial(serial)
            .props(base)
            .build(),
    )?;

    info!(
        "registered {} flow kernels (N={}, cubN={}, nBDF={}, nEXT={}, substeps={})",
        registry.len(),
        n,
        cub_n,
        n_bdf,
        n_ext,
        nsubsteps
    );
    Ok(())
}
