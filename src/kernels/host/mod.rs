//! Host reference backend.
//!
//! Each device kernel the solver registers has a typed host rendition: a
//! plain struct holding the compile-time defines it was specialized with,
//! and a `launch` method taking the same positional arguments the device
//! kernel would. [`HostCompiler`] is the [`KernelCompiler`] for this
//! backend; it dispatches on the source file stem and bakes the relevant
//! `p_*` defines into the kernel object.

pub mod advection;
pub mod bc;
pub mod cfl;
pub mod filter;
pub mod operators;
pub mod rhs;
pub(crate) mod tensor;
pub mod time;

pub use advection::{
    AdvectMeshVelocityKernel, AdvectionVariant, StrongAdvectionCubatureVolumeKernel,
    StrongAdvectionVolumeKernel, SubCycleStrongCubatureVolumeKernel, SubCycleStrongVolumeKernel,
    UrstKernel,
};
pub use bc::{DirichletBcKernel, MaskCopyKernel, MaskKernel, NeumannBcKernel};
pub use cfl::CflKernel;
pub use filter::FilterRtKernel;
pub use operators::{CurlKernel, DivergenceVolumeKernel, FaceCentroidKernel, GradientVolumeKernel};
pub use rhs::{PressureRhsKernel, PressureStressKernel, SetEllipticCoeffKernel, VelocityRhsKernel};
pub use time::{
    ExtrapolateKernel, NStagesSumKernel, SubCycleInitKernel, SubCycleRkKernel, SumMakefKernel,
};

use super::{KernelCompiler, KernelHandle, KernelSpec};
use crate::error::SolverError;

/// Compiles kernel specializations into host kernel objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct HostCompiler;

fn usize_define(spec: &KernelSpec, name: &str) -> Result<usize, SolverError> {
    spec.props()
        .get(name)
        .and_then(|v| v.as_usize())
        .ok_or_else(|| SolverError::BadDefine {
            kernel: spec.qualified_name(),
            define: name.to_string(),
        })
}

fn bool_define(spec: &KernelSpec, name: &str) -> bool {
    spec.props()
        .get(name)
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

impl KernelCompiler for HostCompiler {
    fn compile(&self, spec: &KernelSpec) -> Result<KernelHandle, SolverError> {
        let name = spec.qualified_name();
        let nq = || usize_define(spec, "p_Nq");
        let np = || nq().map(|q| q * q * q);

        let handle = match spec.stem() {
            "cflHex3D" => KernelHandle::new(
                name,
                CflKernel {
                    nq: nq()?,
                    np: np()?,
                    moving_mesh: bool_define(spec, "p_MovingMesh"),
                },
            ),
            "extrapolate" => KernelHandle::new(
                name,
                ExtrapolateKernel {
                    n_states: usize_define(spec, "p_nEXT")?,
                },
            ),
            "nStagesSum3" => KernelHandle::new(name, NStagesSumKernel { nfields: 3 }),
            "nStagesSumMany" => KernelHandle::new(
                name,
                NStagesSumKernel {
                    nfields: usize_define(spec, "p_NVfields")?,
                },
            ),
            "sumMakef" => KernelHandle::new(
                name,
                SumMakefKernel {
                    n_bdf: usize_define(spec, "p_nBDF")?,
                    n_ext: usize_define(spec, "p_nEXT")?,
                    subcycling: bool_define(spec, "p_SUBCYCLING"),
                },
            ),
            "subCycleRK" => KernelHandle::new(
                name,
                SubCycleRkKernel {
                    n_stages: usize_define(spec, "p_nRK")?,
                },
            ),
            "subCycleInitU0" => KernelHandle::new(name, SubCycleInitKernel),
            "strongAdvectionVolumeHex3D" => KernelHandle::new(
                name,
                StrongAdvectionVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            "strongAdvectionCubatureVolumeHex3D" => KernelHandle::new(
                name,
                StrongAdvectionCubatureVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                    cub_nq: usize_define(spec, "p_cubNq")?,
                    variant: AdvectionVariant::default(),
                },
            ),
            "subCycleStrongVolumeHex3D" => KernelHandle::new(
                name,
                SubCycleStrongVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            "subCycleStrongCubatureVolumeHex3D" => KernelHandle::new(
                name,
                SubCycleStrongCubatureVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                    cub_nq: usize_define(spec, "p_cubNq")?,
                    n_ext: usize_define(spec, "p_nEXT")?,
                    variant: AdvectionVariant::from_index(
                        usize_define(spec, "p_knl").unwrap_or(0),
                    ),
                },
            ),
            "advectMeshVelocityHex3D" => KernelHandle::new(
                name,
                AdvectMeshVelocityKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            "UrstHex3D" => KernelHandle::new(
                name,
                UrstKernel {
                    nq: nq()?,
                    np: np()?,
                    cub_nq: usize_define(spec, "p_cubNq")?,
                    cubature: false,
                },
            ),
            "UrstCubatureHex3D" => KernelHandle::new(
                name,
                UrstKernel {
                    nq: nq()?,
                    np: np()?,
                    cub_nq: usize_define(spec, "p_cubNq")?,
                    cubature: true,
                },
            ),
            "gradientVolumeHex3D" => KernelHandle::new(
                name,
                GradientVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                    weighted: false,
                },
            ),
            "wGradientVolumeHex3D" => KernelHandle::new(
                name,
                GradientVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                    weighted: true,
                },
            ),
            "divergenceVolumeHex3D" => KernelHandle::new(
                name,
                DivergenceVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                    weighted: false,
                },
            ),
            "wDivergenceVolumeHex3D" => KernelHandle::new(
                name,
                DivergenceVolumeKernel {
                    nq: nq()?,
                    np: np()?,
                    weighted: true,
                },
            ),
            "curlHex3D" => KernelHandle::new(
                name,
                CurlKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            "computeFaceCentroid" => KernelHandle::new(
                name,
                FaceCentroidKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            "pressureRhsHex3D" => KernelHandle::new(name, PressureRhsKernel),
            "pressureStressHex3D" => KernelHandle::new(name, PressureStressKernel),
            "velocityRhsHex3D" => KernelHandle::new(name, VelocityRhsKernel),
            "setEllipticCoeff" => {
                KernelHandle::new(name, SetEllipticCoeffKernel { pressure: false })
            }
            "setEllipticCoeffPressure" => {
                KernelHandle::new(name, SetEllipticCoeffKernel { pressure: true })
            }
            "velocityDirichletBCHex3D" | "pressureDirichletBCHex3D" | "dirichletBC" => {
                KernelHandle::new(
                    name,
                    DirichletBcKernel {
                        nq: nq()?,
                        np: np()?,
                    },
                )
            }
            "velocityNeumannBCHex3D" | "neumannBCHex3D" => KernelHandle::new(
                name,
                NeumannBcKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            "mask" => KernelHandle::new(name, MaskKernel),
            "maskCopy" | "maskCopy2" => KernelHandle::new(name, MaskCopyKernel),
            "filterRTHex3D" => KernelHandle::new(
                name,
                FilterRtKernel {
                    nq: nq()?,
                    np: np()?,
                },
            ),
            stem => {
                return Err(SolverError::UnsupportedKernel {
                    stem: stem.to_string(),
                })
            }
        };
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::{KernelSpec, SECTION_FLOW};

    #[test]
    fn test_compile_dispatches_on_stem() {
        let spec = KernelSpec::builder(SECTION_FLOW, "cflHex3D")
            .subpath("nrs/")
            .define("p_Nq", 5usize)
            .define("p_MovingMesh", false)
            .build();
        let handle = HostCompiler.compile(&spec).unwrap();
        let kernel = handle.downcast::<CflKernel>().unwrap();
        assert_eq!(kernel.nq, 5);
        assert_eq!(kernel.np, 125);
        assert!(!kernel.moving_mesh);
    }

    #[test]
    fn test_missing_define_is_fatal() {
        let spec = KernelSpec::builder(SECTION_FLOW, "cflHex3D").build();
        let err = HostCompiler.compile(&spec).unwrap_err();
        assert!(matches!(err, SolverError::BadDefine { .. }));
    }

    #[test]
    fn test_unknown_stem_is_fatal() {
        let spec = KernelSpec::builder(SECTION_FLOW, "noSuchOperator").build();
        let err = HostCompiler.compile(&spec).unwrap_err();
        assert!(matches!(err, SolverError::UnsupportedKernel { .. }));
    }

    #[test]
    fn test_variant_define_selects_loop_organization() {
        let spec = KernelSpec::builder(SECTION_FLOW, "subCycleStrongCubatureVolumeHex3D")
            .define("p_Nq", 4usize)
            .define("p_cubNq", 6usize)
            .define("p_nEXT", 2usize)
            .define("p_knl", 2usize)
            .build();
        let handle = HostCompiler.compile(&spec).unwrap();
        let kernel = handle
            .downcast::<SubCycleStrongCubatureVolumeKernel>()
            .unwrap();
        assert_eq!(kernel.variant, AdvectionVariant::Blocked);
    }
}
