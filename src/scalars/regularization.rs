//! Scalar regularization state: HPFRT filter matrices and the artificial
//! viscosity seam.

use log::info;

use crate::basis::{low_pass_amplitudes, Vandermonde};
use crate::config::{scalar_key, Options, RegularizationKind};
use crate::error::SolverError;
use crate::platform::DeviceArray;

/// Artificial-viscosity collaborator configuration. The AVM model itself
/// (residual evaluation, viscosity transport) lives outside this crate;
/// setup records the per-field method selection once for the whole scalar
/// set so the collaborator can be initialized a single time.
#[derive(Clone, Debug)]
pub struct AvmSetup {
    pub methods: Vec<RegularizationKind>,
}

/// Per-scalar-set regularization state.
///
/// `o_filter_rt` holds one `Nmodes x Nmodes` high-pass matrix block per
/// field at `s * Nmodes²`; fields without HPFRT keep a zero block and a
/// cleared apply flag. Strengths are stored pre-negated so the relaxation
/// term always damps.
#[derive(Debug)]
pub struct Regularization {
    pub apply_filter: bool,
    pub filter_s: Vec<f64>,
    pub o_filter_rt: DeviceArray<f64>,
    pub o_filter_s: DeviceArray<f64>,
    pub o_apply_filter_rt: DeviceArray<i32>,
    pub avm: Option<AvmSetup>,
}

impl Regularization {
    /// Builds the regularization state for `nfields` scalars at `nmodes`
    /// 1D modes (N+1), honoring per-field method selections. Returns
    /// `None` when no field selects a method.
    pub fn setup(
        nfields: usize,
        nmodes: usize,
        gll_nodes: &[f64],
        compute: &[i32],
        options: &Options,
    ) -> Result<Option<Self>, SolverError> {
        let mut methods = Vec::with_capacity(nfields);
        for s in 0..nfields {
            let key = scalar_key(s, "REGULARIZATION METHOD");
            methods.push(RegularizationKind::parse(&key, options.get(&key))?);
        }
        if methods.iter().all(|m| *m == RegularizationKind::None) {
            return Ok(None);
        }

        let mut filter_s = vec![0.0; nfields];
        let mut filter_rt = vec![0.0; nfields * nmodes * nmodes];
        let mut apply = vec![0i32; nfields];
        let mut any_applied = false;

        let vd = Vandermonde::new(nmodes - 1, gll_nodes);

        for s in 0..nfields {
            if methods[s] != RegularizationKind::Hpfrt || compute[s] == 0 {
                continue;
            }
            let filter_modes = options.usize_or(&scalar_key(s, "HPFRT MODES"), 1)?;
            let strength = options.f64_or(&scalar_key(s, "HPFRT STRENGTH"), 0.0)?;
            filter_s[s] = -strength.abs();

            let nc = nmodes.saturating_sub(filter_modes);
            let block = vd.modal_damping_matrix(&low_pass_amplitudes(nmodes, nc));
            filter_rt[s * nmodes * nmodes..(s + 1) * nmodes * nmodes].copy_from_slice(&block);
            apply[s] = 1;
            any_applied = true;
            info!(
                "scalar {:02}: HPFRT over {} modes, strength {:.3e}",
                s, filter_modes, strength
            );
        }

        let avm = methods
            .iter()
            .any(|m| m.is_avm())
            .then(|| AvmSetup { methods: methods.clone() });

        Ok(Some(Self {
            apply_filter: any_applied,
            filter_s: filter_s.clone(),
            o_filter_rt: DeviceArray::from_host(&filter_rt),
            o_filter_s: DeviceArray::from_host(&filter_s),
            o_apply_filter_rt: DeviceArray::from_host(&apply),
            avm,
        }))
    }
}
