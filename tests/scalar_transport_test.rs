//! Full setup pipeline: options, mesh, kernel registration, flow state and
//! scalar-transport state, exercised through the public crate surface.

use sem_rs::bc::bc_code;
use sem_rs::config::{
    ADVECTION_TYPE, BDF_ORDER, CUBATURE_POLYNOMIAL_DEGREE, EXT_ORDER, NUMBER_OF_SCALARS,
    POLYNOMIAL_DEGREE, SUBCYCLING_STEPS,
};
use sem_rs::kernels::host::HostCompiler;
use sem_rs::{
    register_flow_kernels, register_scalar_kernels, BcMap, FlowState, KernelRegistry, Mesh,
    Options, ScalarTransport, SolverError, SolverKind, SECTION_SCALAR,
};

fn base_options(nscalars: usize) -> Options {
    let mut opts = Options::new();
    opts.set(POLYNOMIAL_DEGREE, 4);
    opts.set(CUBATURE_POLYNOMIAL_DEGREE, 6);
    opts.set(BDF_ORDER, 3);
    opts.set(EXT_ORDER, 3);
    opts.set(NUMBER_OF_SCALARS, nscalars);
    opts
}

fn built_registry(opts: &Options) -> KernelRegistry {
    let mut registry = KernelRegistry::new();
    register_flow_kernels(&mut registry, opts, 4, false).unwrap();
    register_scalar_kernels(&mut registry, opts, false).unwrap();
    registry.build(&HostCompiler).unwrap();
    registry
}

#[test]
fn test_two_scalar_setup_with_one_disabled_field() {
    let mut opts = base_options(2);
    opts.set("SCALAR00 DIFFUSIVITY", 0.5);
    opts.set("SCALAR00 DENSITY", 1.0);
    opts.set("SCALAR01 SOLVER", "NONE");

    let mesh = Mesh::uniform_box(4, 6, 2, 2, 1);
    let flow = FlowState::setup(mesh, &opts).unwrap();
    let registry = built_registry(&opts);
    let cds = ScalarTransport::setup(&flow, &opts, &BcMap::new(), &registry).unwrap();

    let nlocal = flow.nlocal();
    assert_eq!(cds.nfields, 2);
    assert!(cds.diff(0, nlocal).iter().all(|&v| v == 0.5));
    assert!(cds.rho(0, nlocal).iter().all(|&v| v == 1.0));
    assert!(cds.diff(1, nlocal).iter().all(|&v| v == 0.0));
    assert_eq!(cds.solver[1], SolverKind::None);
    assert_eq!(cds.compute, vec![1, 0]);
    assert!(cds.any_elliptic_solver);
    assert!(!cds.any_cvode_solver);

    // Elliptic runs carry the full multistep history.
    assert_eq!(cds.o_s.len(), 3 * cds.field_offset_sum);
    assert_eq!(cds.o_fs.len(), 3 * cds.field_offset_sum);
    assert!(cds.o_se.is_some());
    assert!(cds.o_bf.is_some());
}

#[test]
fn test_offset_layout_matches_flow_stride() {
    let opts = base_options(3);
    let mesh = Mesh::uniform_box(4, 6, 2, 1, 1);
    let flow = FlowState::setup(mesh, &opts).unwrap();
    let registry = built_registry(&opts);
    let cds = ScalarTransport::setup(&flow, &opts, &BcMap::new(), &registry).unwrap();

    for s in 0..3 {
        assert_eq!(cds.field_offset[s], flow.field_offset);
        assert_eq!(cds.field_offset_scan[s], s * flow.field_offset);
    }
    assert_eq!(cds.field_offset_sum, 3 * flow.field_offset);
    assert_eq!(cds.o_prop.len(), 2 * cds.field_offset_sum);
    assert_eq!(cds.o_etob.len(), 3 * cds.etob_offset);
}

#[test]
fn test_boundary_tags_translate_per_field() {
    let opts = base_options(2);
    let mesh = Mesh::uniform_box(4, 6, 2, 1, 1);
    let flow = FlowState::setup(mesh, &opts).unwrap();
    let registry = built_registry(&opts);

    let mut bc_map = BcMap::new();
    bc_map.set(1, "scalar00", bc_code::DIRICHLET);
    bc_map.set(1, "scalar01", bc_code::ZERO_FLUX);
    let cds = ScalarTransport::setup(&flow, &opts, &bc_map, &registry).unwrap();

    assert!(cds.etob(0).contains(&bc_code::DIRICHLET));
    assert!(!cds.etob(0).contains(&bc_code::ZERO_FLUX));
    assert!(cds.etob(1).contains(&bc_code::ZERO_FLUX));
    // Two elements in x leave interior faces unmapped in both fields.
    assert!(cds.etob(0).contains(&bc_code::NONE));
    assert!(cds.etob(1).contains(&bc_code::NONE));
}

#[test]
fn test_cvode_routing_skips_elliptic_allocations() {
    let mut opts = base_options(2);
    opts.set("SCALAR00 SOLVER", "CVODE");
    opts.set("SCALAR01 SOLVER", "CVODE");

    let mesh = Mesh::uniform_box(4, 6, 1, 1, 1);
    let flow = FlowState::setup(mesh, &opts).unwrap();
    let registry = built_registry(&opts);
    let cds = ScalarTransport::setup(&flow, &opts, &BcMap::new(), &registry).unwrap();

    assert_eq!(cds.cvode_solve, vec![1, 1]);
    assert!(cds.any_cvode_solver);
    assert!(!cds.any_elliptic_solver);
    assert!(cds.o_se.is_none());
    assert!(cds.o_bf.is_none());
    assert_eq!(cds.o_s.len(), cds.field_offset_sum);
    assert_eq!(cds.o_fs.len(), cds.field_offset_sum);
}

#[test]
fn test_subcycling_binds_stage_kernels_and_tableau() {
    let mut opts = base_options(1);
    opts.set(ADVECTION_TYPE, "CUBATURE");
    opts.set(SUBCYCLING_STEPS, 2);
    opts.set("KERNEL AUTOTUNING", "FALSE");

    let mesh = Mesh::uniform_box(4, 6, 2, 1, 1);
    let flow = FlowState::setup(mesh, &opts).unwrap();
    let registry = built_registry(&opts);
    let cds = ScalarTransport::setup(&flow, &opts, &BcMap::new(), &registry).unwrap();

    assert!(cds.kernels.sub_cycle_strong_volume.is_some());
    assert!(cds.kernels.sub_cycle_strong_cubature_volume.is_some());
    assert!(cds.kernels.strong_advection_cubature_volume.is_some());
    let rk = cds.rk.as_ref().unwrap();
    assert_eq!(rk.n_stages(), 4);
    // Subcycling forces matching extrapolation and multistep orders.
    assert_eq!(cds.n_ext, cds.n_bdf);
}

#[test]
fn test_registry_rebuild_is_last_write_wins() {
    let opts = base_options(1);
    let mut registry = KernelRegistry::new();
    register_scalar_kernels(&mut registry, &opts, false).unwrap();
    // Re-registering the same section is allowed before build; the second
    // specialization replaces the first.
    register_scalar_kernels(&mut registry, &opts, true).unwrap();
    registry.build(&HostCompiler).unwrap();
    assert!(registry.get(SECTION_SCALAR, "sumMakef").is_ok());
}

#[test]
fn test_setup_without_registered_kernels_fails() {
    let opts = base_options(1);
    let mesh = Mesh::uniform_box(4, 6, 1, 1, 1);
    let flow = FlowState::setup(mesh, &opts).unwrap();
    let mut registry = KernelRegistry::new();
    registry.build(&HostCompiler).unwrap();
    let err = ScalarTransport::setup(&flow, &opts, &BcMap::new(), &registry).unwrap_err();
    assert!(matches!(err, SolverError::KernelNotFound { .. }));
}
