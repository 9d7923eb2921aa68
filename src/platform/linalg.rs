//! Vector primitives used by setup and the projection accelerator.
//!
//! Multi-field vectors are stored as `nfields` slabs of stride `offset`,
//! with only the first `nlocal <= offset` entries of each slab meaningful
//! (the tail is alignment padding). Weighted inner products carry the
//! inverse-multiplicity weight of shared mesh nodes so that sums over ranks
//! count each global degree of freedom exactly once; they are finished with
//! a communicator reduction.

use super::comm::Comm;

/// `y = a*x + b*y` over matching slices.
pub fn axpby(a: f64, x: &[f64], b: f64, y: &mut [f64]) {
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi = a * xi + b * *yi;
    }
}

/// Weighted inner product of two multi-field vectors:
/// `sum_f sum_n w[n] * x[f*offset + n] * y[f*offset + n]`,
/// reduced across ranks.
pub fn weighted_inner_product(
    w: &[f64],
    x: &[f64],
    y: &[f64],
    nfields: usize,
    offset: usize,
    comm: &dyn Comm,
) -> f64 {
    let mut sum = 0.0;
    for f in 0..nfields {
        let base = f * offset;
        for (n, &wn) in w.iter().enumerate() {
            sum += wn * x[base + n] * y[base + n];
        }
    }
    comm.allreduce_sum(sum)
}

/// Weighted inner products of `nvecs` stored vectors against one vector,
/// written to `out[..nvecs]` and reduced across ranks in a single
/// collective. Vector `k` of `xs` starts at `k * nfields * offset`.
pub fn weighted_inner_product_multi(
    w: &[f64],
    xs: &[f64],
    y: &[f64],
    nvecs: usize,
    nfields: usize,
    offset: usize,
    out: &mut [f64],
    comm: &dyn Comm,
) {
    let stride = nfields * offset;
    for k in 0..nvecs {
        let xk = &xs[k * stride..(k + 1) * stride];
        let mut sum = 0.0;
        for f in 0..nfields {
            let base = f * offset;
            for (n, &wn) in w.iter().enumerate() {
                sum += wn * xk[base + n] * y[base + n];
            }
        }
        out[k] = sum;
    }
    comm.allreduce_sum_slice(&mut out[..nvecs]);
}

/// `y += sum_k alpha[k] * x_k` over `nvecs` stored vectors.
pub fn accumulate(alpha: &[f64], xs: &[f64], nvecs: usize, stride: usize, y: &mut [f64]) {
    for k in 0..nvecs {
        let xk = &xs[k * stride..(k + 1) * stride];
        let a = alpha[k];
        for (yi, &xi) in y.iter_mut().zip(xk.iter()) {
            *yi += a * xi;
        }
    }
}
