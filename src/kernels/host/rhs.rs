//! Pointwise right-hand-side assembly kernels for the pressure and
//! velocity Helmholtz solves, and the elliptic-coefficient fill.

/// Pressure-Poisson right-hand side: combines the assembled forcing with
/// the curl-curl of the extrapolated velocity,
/// `rhs_f = (BF_f - mue * curlcurl(Ue)_f) / rho`.
pub struct PressureRhsKernel;

impl PressureRhsKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nlocal: usize,
        field_offset: usize,
        mue: &[f64],
        rho: &[f64],
        bf: &[f64],
        curlcurl: &[f64],
        rhs: &mut [f64],
    ) {
        for f in 0..3 {
            for n in 0..nlocal {
                let id = f * field_offset + n;
                rhs[id] = (bf[id] - mue[n] * curlcurl[id]) / rho[n];
            }
        }
    }
}

/// Variable-viscosity stress contribution: accumulates
/// `2 grad(mue) · S_f` with `S` the symmetric velocity-gradient tensor,
/// supplied as nine gradient slabs laid out `[component][direction]`.
pub struct PressureStressKernel;

impl PressureStressKernel {
    pub fn launch(
        &self,
        nlocal: usize,
        field_offset: usize,
        grad_mue: &[f64],
        grad_u: &[f64],
        rhs: &mut [f64],
    ) {
        for f in 0..3 {
            for n in 0..nlocal {
                let mut sum = 0.0;
                for j in 0..3 {
                    let s_fj = 0.5
                        * (grad_u[(3 * f + j) * field_offset + n]
                            + grad_u[(3 * j + f) * field_offset + n]);
                    sum += grad_mue[j * field_offset + n] * s_fj;
                }
                rhs[f * field_offset + n] += 2.0 * sum;
            }
        }
    }
}

/// Velocity Helmholtz right-hand side: `rhs_f = BF_f - grad(p)_f`.
pub struct VelocityRhsKernel;

impl VelocityRhsKernel {
    pub fn launch(
        &self,
        nlocal: usize,
        field_offset: usize,
        bf: &[f64],
        grad_p: &[f64],
        rhs: &mut [f64],
    ) {
        for f in 0..3 {
            for n in 0..nlocal {
                let id = f * field_offset + n;
                rhs[id] = bf[id] - grad_p[id];
            }
        }
    }
}

/// Fills the two-slab elliptic coefficient buffer: the diffusive
/// coefficient in the first slab, the Helmholtz zeroth-order term
/// `rho * g0 / dt` in the second. The pressure specialization writes the
/// reciprocal density with a zero zeroth-order term (pure Poisson).
pub struct SetEllipticCoeffKernel {
    pub pressure: bool,
}

impl SetEllipticCoeffKernel {
    #[allow(clippy::too_many_arguments)]
    pub fn launch(
        &self,
        nlocal: usize,
        g0_idt: f64,
        diff: &[f64],
        rho: &[f64],
        offset: usize,
        coeff: &mut [f64],
    ) {
        for n in 0..nlocal {
            if self.pressure {
                coeff[n] = 1.0 / rho[n];
                coeff[offset + n] = 0.0;
            } else {
                coeff[n] = diff[n];
                coeff[offset + n] = rho[n] * g0_idt;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pressure_rhs_combination() {
        let kernel = PressureRhsKernel;
        let (nlocal, offset) = (2, 2);
        let mue = vec![0.5; nlocal];
        let rho = vec![2.0; nlocal];
        let bf = vec![4.0; 3 * offset];
        let cc = vec![2.0; 3 * offset];
        let mut rhs = vec![0.0; 3 * offset];
        kernel.launch(nlocal, offset, &mue, &rho, &bf, &cc, &mut rhs);
        // (4 - 0.5*2)/2 = 1.5
        assert!(rhs.iter().all(|&v| (v - 1.5).abs() < 1e-14));
    }

    #[test]
    fn test_velocity_rhs_subtracts_pressure_gradient() {
        let kernel = VelocityRhsKernel;
        let offset = 3;
        let bf = vec![2.0; 9];
        let gp = vec![0.5; 9];
        let mut rhs = vec![0.0; 9];
        kernel.launch(3, offset, &bf, &gp, &mut rhs);
        assert!(rhs.iter().all(|&v| (v - 1.5).abs() < 1e-14));
    }

    #[test]
    fn test_stress_term_symmetrizes_gradient() {
        let kernel = PressureStressKernel;
        let (nlocal, offset) = (1, 1);
        // grad(mue) = (1, 0, 0); gradU with du0/dx = 2, all else 0.
        let grad_mue = vec![1.0, 0.0, 0.0];
        let mut grad_u = vec![0.0; 9];
        grad_u[0] = 2.0;
        let mut rhs = vec![0.0; 3];
        kernel.launch(nlocal, offset, &grad_mue, &grad_u, &mut rhs);
        assert!((rhs[0] - 4.0).abs() < 1e-14, "2 * gmue_x * S_00");
        assert_eq!(rhs[1], 0.0);
        assert_eq!(rhs[2], 0.0);
    }

    #[test]
    fn test_elliptic_coeff_fills() {
        let helmholtz = SetEllipticCoeffKernel { pressure: false };
        let poisson = SetEllipticCoeffKernel { pressure: true };
        let diff = vec![0.1, 0.1];
        let rho = vec![4.0, 4.0];
        let mut coeff = vec![0.0; 4];
        helmholtz.launch(2, 3.0, &diff, &rho, 2, &mut coeff);
        assert_eq!(&coeff[..2], &[0.1, 0.1]);
        assert_eq!(&coeff[2..], &[12.0, 12.0]);
        poisson.launch(2, 3.0, &diff, &rho, 2, &mut coeff);
        assert_eq!(&coeff[..2], &[0.25, 0.25]);
        assert_eq!(&coeff[2..], &[0.0, 0.0]);
    }
}
