//! Modal basis machinery.
//!
//! The Vandermonde matrix ties the nodal (GLL point values) and modal
//! (Legendre coefficient) views of a 1D trace of the tensor-product
//! element; the hexahedral operators are Kronecker products of it. Also
//! home to the quadratic low-pass amplitude profile used by the HPFRT
//! relaxation filter.

mod vandermonde;

pub use vandermonde::Vandermonde;

/// Modal damping amplitudes for a low-pass filter over `nmodes` Legendre
/// modes with cutoff `nc`.
///
/// Modes below the cutoff pass through untouched (amplitude 0); from the
/// cutoff upward the retained fraction rolls off quadratically, reaching
/// full attenuation (amplitude 1) at the highest mode:
/// `a_k = ((k + 1 - nc) / (nmodes - nc))²` for `k >= nc - 1`.
///
/// The returned values are the *removed* fraction per mode, so a diagonal
/// of `a` sandwiched between the Vandermonde pair gives the high-pass
/// component of a nodal field.
pub fn low_pass_amplitudes(nmodes: usize, nc: usize) -> Vec<f64> {
    let mut amp = vec![0.0; nmodes];
    if nc >= nmodes {
        return amp;
    }
    let span = (nmodes - nc) as f64;
    for (k, a) in amp.iter_mut().enumerate().skip(nc.saturating_sub(1)) {
        let t = (k + 1 - nc) as f64 / span;
        if t > 0.0 {
            *a = t * t;
        }
    }
    amp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_pass_profile_shape() {
        let amp = low_pass_amplitudes(8, 6);
        for &a in &amp[..5] {
            assert_eq!(a, 0.0, "modes below the cutoff pass through");
        }
        assert!((amp[7] - 1.0).abs() < 1e-14, "highest mode is fully damped");
        for pair in amp.windows(2) {
            assert!(pair[0] <= pair[1], "damping grows with mode number");
        }
    }

    #[test]
    fn test_cutoff_beyond_range_disables_filter() {
        let amp = low_pass_amplitudes(6, 6);
        assert!(amp.iter().all(|&a| a == 0.0));
    }
}
