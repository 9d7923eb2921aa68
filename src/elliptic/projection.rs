//! Solution-space projection for successive elliptic solves.
//!
//! Consecutive solves of the same elliptic problem have strongly correlated
//! solutions. The projection keeps a bounded, A-orthonormal basis of recent
//! solutions; `pre` subtracts the component of the incoming right-hand side
//! the basis already explains (leaving the solver a smaller problem) and
//! `post` folds the retained component back in and absorbs the new solution
//! into the basis with one modified-Gram-Schmidt sweep.

use log::info;

use crate::elliptic::EllipticOperator;
use crate::platform::linalg::{accumulate, weighted_inner_product, weighted_inner_product_multi};
use crate::platform::Comm;

/// Inner product used when orthogonalizing new basis vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionType {
    /// Reuse the right-hand side left by `pre` as `A x` for the new vector.
    /// No extra operator application; accurate to the solver tolerance.
    Classic,
    /// Recompute `A x` exactly, one extra operator application per `post`.
    Aconj,
}

/// Candidates whose post-orthogonalization norm falls below this fraction
/// of their original norm are discarded as linearly dependent.
const DROP_TOL: f64 = 1e-7;

/// Bounded A-orthonormal basis of previous solutions to one elliptic solve
/// context.
pub struct SolutionProjection {
    op: Box<dyn EllipticOperator>,
    projection_type: ProjectionType,
    max_num_vecs: usize,
    num_timesteps: usize,
    verbose: bool,

    /// Full vector length, `nfields * field_offset`.
    stride: usize,
    /// Basis vectors, `max_num_vecs` slabs.
    xx: Vec<f64>,
    /// `A x_i` per basis vector.
    bb: Vec<f64>,
    /// Component of the solution reconstructed by the latest `pre`.
    xbar: Vec<f64>,
    /// Right-hand side as left by the latest `pre` (the Classic `A x`).
    rhs_saved: Vec<f64>,
    alpha: Vec<f64>,

    num_vecs: usize,
    prev_num_vecs: usize,
    timestep: usize,
}

impl SolutionProjection {
    pub fn new(
        op: Box<dyn EllipticOperator>,
        projection_type: ProjectionType,
        max_num_vecs: usize,
        num_timesteps: usize,
        verbose: bool,
    ) -> Self {
        let stride = op.nfields() * op.field_offset();
        Self {
            op,
            projection_type,
            max_num_vecs,
            num_timesteps,
            verbose,
            stride,
            xx: vec![0.0; max_num_vecs * stride],
            bb: vec![0.0; max_num_vecs * stride],
            xbar: vec![0.0; stride],
            rhs_saved: vec![0.0; stride],
            alpha: vec![0.0; max_num_vecs],
            num_vecs: 0,
            prev_num_vecs: 0,
            timestep: 0,
        }
    }

    pub fn num_vecs(&self) -> usize {
        self.num_vecs
    }

    pub fn prev_num_vecs(&self) -> usize {
        self.prev_num_vecs
    }

    pub fn max_num_vecs(&self) -> usize {
        self.max_num_vecs
    }

    /// Project the basis out of `rhs` in place and retain the explained
    /// solution component for the matching `post`. Empty basis: identity.
    pub fn pre(&mut self, rhs: &mut [f64], comm: &dyn Comm) {
        self.prev_num_vecs = self.num_vecs;
        self.xbar.fill(0.0);

        if self.num_vecs > 0 {
            weighted_inner_product_multi(
                self.op.inv_degree(),
                &self.xx,
                rhs,
                self.num_vecs,
                self.op.nfields(),
                self.op.field_offset(),
                &mut self.alpha,
                comm,
            );
            accumulate(
                &self.alpha[..self.num_vecs],
                &self.xx,
                self.num_vecs,
                self.stride,
                &mut self.xbar,
            );
            for a in &mut self.alpha[..self.num_vecs] {
                *a = -*a;
            }
            accumulate(
                &self.alpha[..self.num_vecs],
                &self.bb,
                self.num_vecs,
                self.stride,
                rhs,
            );
        }

        self.rhs_saved.copy_from_slice(rhs);
    }

    /// Fold the retained component back into `x` and absorb the new
    /// solution into the basis. Every `num_timesteps` calls the whole basis
    /// is discarded so the next solve rebuilds it from scratch.
    pub fn post(&mut self, x: &mut [f64], comm: &dyn Comm) {
        // The basis stores the solver's increment, not the full solution.
        let delta = x.to_vec();
        for (xi, &xb) in x.iter_mut().zip(self.xbar.iter()) {
            *xi += xb;
        }

        self.update_projection_space(&delta, comm);

        self.timestep += 1;
        if self.timestep % self.num_timesteps == 0 {
            self.num_vecs = 0;
        }
    }

    fn update_projection_space(&mut self, delta: &[f64], comm: &dyn Comm) {
        // FIFO eviction: drop the oldest slab to make room.
        if self.num_vecs == self.max_num_vecs {
            self.xx.copy_within(self.stride.., 0);
            self.bb.copy_within(self.stride.., 0);
            self.num_vecs -= 1;
        }

        let slot = self.num_vecs;
        self.xx[slot * self.stride..(slot + 1) * self.stride].copy_from_slice(delta);
        match self.projection_type {
            ProjectionType::Classic => {
                self.bb[slot * self.stride..(slot + 1) * self.stride]
                    .copy_from_slice(&self.rhs_saved);
            }
            ProjectionType::Aconj => {
                self.op.apply(
                    delta,
                    &mut self.bb[slot * self.stride..(slot + 1) * self.stride],
                );
            }
        }

        // One MGS sweep in the A-inner product.
        let nfields = self.op.nfields();
        let offset = self.op.field_offset();
        let norm_orig = weighted_inner_product(
            self.op.inv_degree(),
            &self.xx[slot * self.stride..(slot + 1) * self.stride],
            &self.bb[slot * self.stride..(slot + 1) * self.stride],
            nfields,
            offset,
            comm,
        );
        if norm_orig <= 0.0 {
            return;
        }

        let mut norm_new = norm_orig;
        for i in 0..slot {
            let beta = weighted_inner_product(
                self.op.inv_degree(),
                &self.xx[slot * self.stride..(slot + 1) * self.stride],
                &self.bb[i * self.stride..(i + 1) * self.stride],
                nfields,
                offset,
                comm,
            );
            let (head, tail) = self.xx.split_at_mut(slot * self.stride);
            let xi = &head[i * self.stride..(i + 1) * self.stride];
            for (n, t) in tail[..self.stride].iter_mut().enumerate() {
                *t -= beta * xi[n];
            }
            let (head, tail) = self.bb.split_at_mut(slot * self.stride);
            let bi = &head[i * self.stride..(i + 1) * self.stride];
            for (n, t) in tail[..self.stride].iter_mut().enumerate() {
                *t -= beta * bi[n];
            }
            norm_new -= beta * beta;
        }

        let norm_new = norm_new.max(0.0).sqrt();
        if norm_new > DROP_TOL * norm_orig.sqrt() {
            let inv = 1.0 / norm_new;
            for v in &mut self.xx[slot * self.stride..(slot + 1) * self.stride] {
                *v *= inv;
            }
            for v in &mut self.bb[slot * self.stride..(slot + 1) * self.stride] {
                *v *= inv;
            }
            self.num_vecs += 1;
        } else if self.verbose {
            info!(
                "projection: dropped linearly dependent candidate ({} vectors)",
                self.num_vecs
            );
        }
        if self.verbose {
            info!(
                "projection: {} vectors (previous {})",
                self.num_vecs, self.prev_num_vecs
            );
        }
    }
}
