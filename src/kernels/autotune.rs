//! Launch-time selection of the dealiased advection loop organization.
//!
//! The three candidate organizations in
//! [`host::advection`](super::host::advection) compute the same contraction
//! with different memory traffic; which one wins depends on the polynomial
//! order and the element count. Before registration the solver times each
//! candidate on synthetic data and bakes the winner into the kernel
//! specialization as the `p_knl` define.

use std::time::{Duration, Instant};

use log::{debug, info};

use super::host::{AdvectionVariant, SubCycleStrongCubatureVolumeKernel};
use crate::mesh::Mesh;

const WARMUP_REPS: usize = 2;
const MAX_REPS: usize = 50;

/// Times every [`AdvectionVariant`] on a synthetic element batch and
/// returns the fastest. Each candidate gets an equal share of
/// `target_time`; with autotuning disabled the reference organization is
/// returned untimed.
pub fn select_advection_variant(
    nelements: usize,
    nq: usize,
    cub_nq: usize,
    n_ext: usize,
    target_time: Duration,
    verbose: bool,
    enabled: bool,
) -> AdvectionVariant {
    if !enabled {
        return AdvectionVariant::Reference;
    }

    let mesh = Mesh::uniform_box(nq - 1, cub_nq - 1, nelements.max(1), 1, 1);
    let np = mesh.np;
    let cub_np = cub_nq * cub_nq * cub_nq;
    let field_offset = mesh.nlocal();
    let urst_offset = mesh.nelements * cub_np;

    // Deterministic, non-constant inputs; values are irrelevant to timing
    // but keep the contraction from degenerating.
    let s: Vec<f64> = (0..field_offset).map(|n| (0.3 * n as f64).sin()).collect();
    let urst_history: Vec<f64> = (0..n_ext * 3 * urst_offset)
        .map(|n| (0.7 * n as f64).cos())
        .collect();
    let time_coeff: Vec<f64> = (0..n_ext).map(|j| 1.0 / (j + 1) as f64).collect();
    let mut out = vec![0.0; field_offset];

    let budget = target_time / AdvectionVariant::COUNT as u32;
    let mut best = (AdvectionVariant::Reference, Duration::MAX);

    for variant in AdvectionVariant::ALL {
        let kernel = SubCycleStrongCubatureVolumeKernel {
            nq,
            np,
            cub_nq,
            n_ext,
            variant,
        };
        let mut launch = || {
            kernel.launch(
                mesh.nelements,
                &mesh.vgeo,
                &mesh.ops.d,
                &mesh.ops.cub_interp,
                &mesh.ops.cub_d,
                &mesh.ops.w,
                1,
                field_offset,
                urst_offset,
                &time_coeff,
                &urst_history,
                &s,
                &mut out,
            );
        };

        for _ in 0..WARMUP_REPS {
            launch();
        }

        let mut elapsed = Duration::ZERO;
        let mut fastest = Duration::MAX;
        let mut reps = 0;
        while elapsed < budget && reps < MAX_REPS {
            let t0 = Instant::now();
            launch();
            let dt = t0.elapsed();
            fastest = fastest.min(dt);
            elapsed += dt;
            reps += 1;
        }

        if verbose {
            info!(
                "advection autotune: variant {} {:.3e} s ({} reps)",
                variant.index(),
                fastest.as_secs_f64(),
                reps
            );
        } else {
            debug!(
                "advection autotune: variant {} {:.3e} s",
                variant.index(),
                fastest.as_secs_f64()
            );
        }
        if fastest < best.1 {
            best = (variant, fastest);
        }
    }

    info!(
        "advection autotune: selected variant {} ({:.3e} s)",
        best.0.index(),
        best.1.as_secs_f64()
    );
    best.0
}
