//! Time-integration algebra kernels: extrapolation, staged sums, the
//! BDF/EXT right-hand-side assembly and the subcycling RK update.

/// `xe = sum_s coeff[s] * x_s` over `nfields` fields, with `x` holding the
/// time history as `n_states` slabs of `nfields * field_offset` entries,
/// newest first.
pub struct ExtrapolateKernel {
    pub n_states: usize,
}

impl ExtrapolateKernel {
    pub fn launch(
        &self,
        nlocal: usize,
        nfields: usize,
        field_offset: usize,
        coeff: &[f64],
        x: &[f64],
        xe: &mut [f64],
    ) {
        let stride = nfields * field_offset;
        for f in 0..nfields {
            for n in 0..nlocal {
                let id = f * field_offset + n;
                let mut sum = 0.0;
                for (s, &c) in coeff.iter().enumerate().take(self.n_states) {
                    sum += c * x[s * stride + id];
                }
                xe[id] = sum;
            }
        }
    }
}

/// `y = c1 x1 + c2 x2 + c3 x3` over `nfields` fields of stride
/// `field_offset`; the three-stage sum of the RK substep driver.
pub struct NStagesSumKernel {
    pub nfields: usize,
}

impl NStagesSumKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nlocal: usize,
        field_offset: usize,
        c: [f64; 3],
        x1: &[f64],
        x2: &[f64],
        x3: &[f64],
        y: &mut [f64],
    ) {
        for f in 0..self.nfields {
            for n in 0..nlocal {
                let id = f * field_offset + n;
                y[id] = c[0] * x1[id] + c[1] * x2[id] + c[2] * x3[id];
            }
        }
    }
}

/// Assembles the Helmholtz right-hand side
/// `BF = M (sum_j cEXT_j FU_j + idt * sum_j cBDF_j U_j)` per field, with
/// `M` the lumped mass (quadrature-weighted Jacobian). When the kernel was
/// specialized for subcycling the BDF history sum arrives pre-integrated in
/// `subcycled` and replaces the plain history sum. Fields whose gate entry
/// is zero are skipped entirely and their output slab is left untouched.
pub struct SumMakefKernel {
    pub n_bdf: usize,
    pub n_ext: usize,
    pub subcycling: bool,
}

impl SumMakefKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nlocal: usize,
        nfields: usize,
        field_offset: usize,
        lmm: &[f64],
        idt: f64,
        coeff_bdf: &[f64],
        coeff_ext: &[f64],
        gate: Option<&[i32]>,
        u: &[f64],
        subcycled: Option<&[f64]>,
        fu: &[f64],
        bf: &mut [f64],
    ) {
        let stride = nfields * field_offset;
        for f in 0..nfields {
            if let Some(g) = gate {
                if g[f] == 0 {
                    continue;
                }
            }
            for n in 0..nlocal {
                let id = f * field_offset + n;

                let mut ext = 0.0;
                for (j, &c) in coeff_ext.iter().enumerate().take(self.n_ext) {
                    ext += c * fu[j * stride + id];
                }

                let bdf = if self.subcycling {
                    // History already integrated through the fine RK steps.
                    subcycled.map(|s| s[id]).unwrap_or(0.0)
                } else {
                    let mut sum = 0.0;
                    for (j, &c) in coeff_bdf.iter().enumerate().take(self.n_bdf) {
                        sum += c * u[j * stride + id];
                    }
                    sum
                };

                bf[id] = lmm[n] * (ext + idt * bdf);
            }
        }
    }
}

/// RK substep update `u = u0 + sdt * sum_s w_s k_s` over `nfields` fields;
/// `k` holds the stage derivatives as consecutive slabs.
pub struct SubCycleRkKernel {
    pub n_stages: usize,
}

impl SubCycleRkKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nlocal: usize,
        nfields: usize,
        field_offset: usize,
        sdt: f64,
        weights: &[f64],
        u0: &[f64],
        k: &[f64],
        u: &mut [f64],
    ) {
        let stride = nfields * field_offset;
        for f in 0..nfields {
            for n in 0..nlocal {
                let id = f * field_offset + n;
                let mut sum = 0.0;
                for (s, &w) in weights.iter().enumerate().take(self.n_stages) {
                    sum += w * k[s * stride + id];
                }
                u[id] = u0[id] + sdt * sum;
            }
        }
    }
}

/// Seeds the subcycling integration: copies one history slab into the
/// working state, `u0 = x_state`.
pub struct SubCycleInitKernel;

impl SubCycleInitKernel {
    pub fn launch(
        &self,
        nlocal: usize,
        nfields: usize,
        field_offset: usize,
        state: usize,
        x: &[f64],
        u0: &mut [f64],
    ) {
        let stride = nfields * field_offset;
        for f in 0..nfields {
            for n in 0..nlocal {
                let id = f * field_offset + n;
                u0[id] = x[state * stride + id];
            }
        }
    }
}
