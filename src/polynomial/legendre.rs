//! Legendre polynomial evaluation.
//!
//! P_n are orthogonal on [-1, 1] with ∫ P_m P_n dx = 2/(2n+1) δ_mn. They
//! carry the modal basis of each element: Vandermonde assembly, the spectral
//! low-pass filter and the cubature grid all evaluate them pointwise.

/// Evaluate P_n(x) by the three-term recurrence
/// `(n+1) P_{n+1} = (2n+1) x P_n - n P_{n-1}`.
pub fn legendre(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).0
}

/// Evaluate P'_n(x).
///
/// Interior points use `P'_n = n (x P_n - P_{n-1}) / (x² - 1)`; the
/// endpoints use the closed forms `P'_n(±1) = (±1)^{n+1} n(n+1)/2`.
pub fn legendre_derivative(n: usize, x: f64) -> f64 {
    legendre_and_derivative(n, x).1
}

/// Evaluate P_n(x) and P'_n(x) from one pass of the recurrence.
pub fn legendre_and_derivative(n: usize, x: f64) -> (f64, f64) {
    if n == 0 {
        return (1.0, 0.0);
    }
    if n == 1 {
        return (x, 1.0);
    }

    let mut p_prev = 1.0; // P_{k-1}
    let mut p_curr = x; // P_k

    for k in 1..n {
        let p_next = ((2 * k + 1) as f64 * x * p_curr - k as f64 * p_prev) / (k + 1) as f64;
        p_prev = p_curr;
        p_curr = p_next;
    }

    let dp = if (x - 1.0).abs() < 1e-14 {
        (n * (n + 1)) as f64 / 2.0
    } else if (x + 1.0).abs() < 1e-14 {
        let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
        sign * (n * (n + 1)) as f64 / 2.0
    } else {
        n as f64 * (x * p_curr - p_prev) / (x * x - 1.0)
    };

    (p_curr, dp)
}
