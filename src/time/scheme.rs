//! Multistep time-integration coefficients.
//!
//! The solver treats the stiff terms implicitly with a backward
//! differentiation formula and the advective terms explicitly by
//! extrapolation. Both coefficient sets are derived from the Lagrange
//! polynomial through the recent time levels, so they stay consistent under
//! variable step sizes; for a uniform step they reduce to the classic BDF
//! and Adams extrapolation tables.

use crate::error::SolverError;

/// Highest supported multistep order.
pub const MAX_ORDER: usize = 3;

/// BDF/extrapolation coefficient state for one integration.
///
/// `update` must be called once per time step after the newest `dt` has
/// been pushed with `shift_dt`; during startup the effective orders ramp up
/// from one so no unavailable history level is referenced.
#[derive(Clone, Debug)]
pub struct TimeScheme {
    n_bdf: usize,
    n_ext: usize,
    dt: [f64; MAX_ORDER],
    g0: f64,
    coeff_bdf: [f64; MAX_ORDER],
    coeff_ext: [f64; MAX_ORDER],
}

impl TimeScheme {
    /// Subcycling advances the advective terms along characteristics, which
    /// requires as many extrapolation levels as BDF levels; the
    /// extrapolation order is forced up to match.
    pub fn new(n_bdf: usize, n_ext: usize, subcycling: bool) -> Result<Self, SolverError> {
        if !(1..=MAX_ORDER).contains(&n_bdf) {
            return Err(SolverError::invalid_option(
                "TIME INTEGRATOR",
                n_bdf.to_string(),
                "BDF order must be 1, 2 or 3",
            ));
        }
        if !(1..=MAX_ORDER).contains(&n_ext) {
            return Err(SolverError::invalid_option(
                "EXTRAPOLATION ORDER",
                n_ext.to_string(),
                "extrapolation order must be 1, 2 or 3",
            ));
        }
        let n_ext = if subcycling { n_ext.max(n_bdf) } else { n_ext };
        Ok(Self {
            n_bdf,
            n_ext,
            dt: [0.0; MAX_ORDER],
            g0: 0.0,
            coeff_bdf: [0.0; MAX_ORDER],
            coeff_ext: [0.0; MAX_ORDER],
        })
    }

    /// Pushes the step about to be taken onto the step-size history.
    pub fn shift_dt(&mut self, dt_new: f64) {
        self.dt.rotate_right(1);
        self.dt[0] = dt_new;
    }

    /// Recomputes the coefficients for time step `tstep` (1-based). The
    /// effective orders are `min(tstep, order)`; unused entries are zero.
    pub fn update(&mut self, tstep: usize) {
        let ord_bdf = self.n_bdf.min(tstep).max(1);
        let ord_ext = self.n_ext.min(tstep).max(1);

        // Time levels relative to the new time: t0 = 0 is the level being
        // solved for, t_j < 0 the stored history.
        let mut t = [0.0f64; MAX_ORDER + 1];
        for j in 0..MAX_ORDER {
            t[j + 1] = t[j] - self.dt[j];
        }

        self.coeff_bdf = [0.0; MAX_ORDER];
        let w = lagrange_derivative_weights(&t[..ord_bdf + 1], 0.0);
        self.g0 = w[0] * self.dt[0];
        for j in 0..ord_bdf {
            self.coeff_bdf[j] = -w[j + 1] * self.dt[0];
        }

        self.coeff_ext = [0.0; MAX_ORDER];
        let w = lagrange_weights(&t[1..ord_ext + 1], 0.0);
        self.coeff_ext[..ord_ext].copy_from_slice(&w[..ord_ext]);
    }

    pub fn n_bdf(&self) -> usize {
        self.n_bdf
    }

    pub fn n_ext(&self) -> usize {
        self.n_ext
    }

    pub fn dt(&self) -> &[f64; MAX_ORDER] {
        &self.dt
    }

    /// Leading BDF coefficient, scaled so that
    /// `dt * du/dt = g0 * u_new - sum_j coeff_bdf[j] * u_old[j]`.
    pub fn g0(&self) -> f64 {
        self.g0
    }

    /// `g0 / dt`, the zeroth-order Helmholtz coefficient.
    pub fn g0_idt(&self) -> f64 {
        self.g0 / self.dt[0]
    }

    pub fn coeff_bdf(&self) -> &[f64; MAX_ORDER] {
        &self.coeff_bdf
    }

    pub fn coeff_ext(&self) -> &[f64; MAX_ORDER] {
        &self.coeff_ext
    }

    /// Extrapolation weights re-targeted at an intermediate time `tau`
    /// before the new level, `0 <= tau <= dt[0]`. Used by the subcycling
    /// stages to evaluate the advecting flux at stage times.
    pub fn ext_coeff_at(&self, tau: f64, tstep: usize) -> [f64; MAX_ORDER] {
        let ord = self.n_ext.min(tstep).max(1);
        let mut t = [0.0f64; MAX_ORDER + 1];
        for j in 0..MAX_ORDER {
            t[j + 1] = t[j] - self.dt[j];
        }
        let w = lagrange_weights(&t[1..ord + 1], -tau);
        let mut out = [0.0; MAX_ORDER];
        out[..ord].copy_from_slice(&w[..ord]);
        out
    }
}

/// Lagrange basis weights `L_j(x)` on the given nodes.
fn lagrange_weights(nodes: &[f64], x: f64) -> Vec<f64> {
    let n = nodes.len();
    let mut w = vec![1.0; n];
    for j in 0..n {
        for m in 0..n {
            if m != j {
                w[j] *= (x - nodes[m]) / (nodes[j] - nodes[m]);
            }
        }
    }
    w
}

/// Derivative of the Lagrange basis, `L_j'(x)`, on the given nodes.
fn lagrange_derivative_weights(nodes: &[f64], x: f64) -> Vec<f64> {
    let n = nodes.len();
    let mut w = vec![0.0; n];
    for j in 0..n {
        let mut sum = 0.0;
        for i in 0..n {
            if i == j {
                continue;
            }
            let mut prod = 1.0 / (nodes[j] - nodes[i]);
            for m in 0..n {
                if m != j && m != i {
                    prod *= (x - nodes[m]) / (nodes[j] - nodes[m]);
                }
            }
            sum += prod;
        }
        w[j] = sum;
    }
    w
}

/// Explicit Runge-Kutta tableau used by the subcycling characteristics
/// integrator.
#[derive(Clone, Debug)]
pub struct RkTable {
    pub nodes: Vec<f64>,
    pub weights: Vec<f64>,
}

impl RkTable {
    pub fn n_stages(&self) -> usize {
        self.nodes.len()
    }
}

/// Classic fourth-order explicit Runge-Kutta tableau.
pub fn erk4() -> RkTable {
    RkTable {
        nodes: vec![0.0, 0.5, 0.5, 1.0],
        weights: vec![1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
    }
}
