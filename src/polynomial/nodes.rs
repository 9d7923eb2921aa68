//! Quadrature nodes and weights.
//!
//! Two families feed the tensor-product element:
//! - Gauss-Lobatto-Legendre (GLL) nodes, the collocation grid: roots of
//!   (1-x²)P'_N including the endpoints, so surface points coincide with
//!   volume points and the mass matrix collocates.
//! - Gauss-Legendre nodes, the over-integration ("cubature") grid for the
//!   dealiased advection term: interior roots of P_N with strictly positive
//!   weights.
//!
//! Both are found by Newton iteration from Chebyshev initial guesses.

use super::legendre::{legendre, legendre_and_derivative};
use std::f64::consts::PI;

/// GLL nodes for polynomial order N: N+1 points in [-1, 1] with endpoints.
pub fn gauss_lobatto_nodes(order: usize) -> Vec<f64> {
    let n = order;

    if n == 0 {
        return vec![0.0];
    }
    if n == 1 {
        return vec![-1.0, 1.0];
    }

    // Chebyshev-Lobatto initial guess, endpoints pinned exactly.
    let mut nodes: Vec<f64> = (0..=n).map(|j| -(PI * j as f64 / n as f64).cos()).collect();
    nodes[0] = -1.0;
    nodes[n] = 1.0;

    // Interior nodes are zeros of P'_N. With L = (1-x²)P'_N one has
    // L' = -N(N+1) P_N, so the Newton update is
    // x += (1-x²) P'_N / (N(N+1) P_N).
    for node in nodes.iter_mut().take(n).skip(1) {
        let mut x = *node;
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = (1.0 - x * x) * dp / (n as f64 * (n + 1) as f64 * p);
            x += update;
            if update.abs() < 1e-15 {
                break;
            }
        }
        *node = x;
    }

    nodes
}

/// GLL weights: `w_j = 2 / (N(N+1) P_N(x_j)²)`.
pub fn gauss_lobatto_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    if order == 0 {
        return vec![2.0];
    }

    let denom = (order * (order + 1)) as f64;
    nodes
        .iter()
        .map(|&x| {
            let p = legendre(order, x);
            2.0 / (denom * p * p)
        })
        .collect()
}

/// Gauss-Legendre nodes for order N: the N+1 roots of P_{N+1}, all interior.
///
/// Exact for polynomials through degree 2N+1, which is what makes the
/// cubature advection grid dealias quadratic nonlinearities.
pub fn gauss_nodes(order: usize) -> Vec<f64> {
    let n = order + 1; // number of points = roots of P_n

    let mut nodes = Vec::with_capacity(n);
    for k in 0..n {
        // Chebyshev initial guess for the k-th root, ascending order.
        let mut x = -(PI * (k as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100 {
            let (p, dp) = legendre_and_derivative(n, x);
            let update = -p / dp;
            x += update;
            if update.abs() < 1e-15 {
                break;
            }
        }
        nodes.push(x);
    }

    nodes
}

/// Gauss-Legendre weights: `w_k = 2 / ((1 - x_k²) P'_n(x_k)²)`.
pub fn gauss_weights(order: usize, nodes: &[f64]) -> Vec<f64> {
    let n = order + 1;
    nodes
        .iter()
        .map(|&x| {
            let (_, dp) = legendre_and_derivative(n, x);
            2.0 / ((1.0 - x * x) * dp * dp)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polynomial::legendre_derivative;

    #[test]
    fn test_gll_endpoints_and_count() {
        for order in 1..=7 {
            let nodes = gauss_lobatto_nodes(order);
            assert_eq!(nodes.len(), order + 1);
            assert!((nodes[0] + 1.0).abs() < 1e-14, "left endpoint");
            assert!((nodes[order] - 1.0).abs() < 1e-14, "right endpoint");
        }
    }

    #[test]
    fn test_gll_interior_nodes_are_extrema() {
        for order in 2..=7 {
            let nodes = gauss_lobatto_nodes(order);
            for j in 1..order {
                let dp = legendre_derivative(order, nodes[j]);
                assert!(dp.abs() < 1e-12, "interior node {} of order {}", j, order);
            }
        }
    }

    #[test]
    fn test_gll_weights_sum_to_interval_length() {
        for order in 0..=7 {
            let nodes = gauss_lobatto_nodes(order);
            let weights = gauss_lobatto_weights(order, &nodes);
            let sum: f64 = weights.iter().sum();
            assert!((sum - 2.0).abs() < 1e-13, "order {}: sum {}", order, sum);
        }
    }

    #[test]
    fn test_gll_order_two_closed_form() {
        let nodes = gauss_lobatto_nodes(2);
        assert!((nodes[1]).abs() < 1e-14);
        let weights = gauss_lobatto_weights(2, &nodes);
        assert!((weights[0] - 1.0 / 3.0).abs() < 1e-14);
        assert!((weights[1] - 4.0 / 3.0).abs() < 1e-14);
    }

    #[test]
    fn test_gauss_nodes_are_roots_and_sorted() {
        for order in 0..=7 {
            let nodes = gauss_nodes(order);
            assert_eq!(nodes.len(), order + 1);
            for pair in nodes.windows(2) {
                assert!(pair[0] < pair[1], "nodes must ascend");
            }
            for &x in &nodes {
                assert!(x.abs() < 1.0, "Gauss nodes are interior");
                assert!(legendre(order + 1, x).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_gauss_quadrature_exactness() {
        // N+1 Gauss points integrate monomials through degree 2N+1 exactly.
        for order in 1..=5 {
            let nodes = gauss_nodes(order);
            let weights = gauss_weights(order, &nodes);
            for k in 0..=(2 * order + 1) {
                let exact = if k % 2 == 0 { 2.0 / (k + 1) as f64 } else { 0.0 };
                let numerical: f64 = nodes
                    .iter()
                    .zip(weights.iter())
                    .map(|(&x, &w)| w * x.powi(k as i32))
                    .sum();
                assert!(
                    (numerical - exact).abs() < 1e-12,
                    "order {}, degree {}: expected {}, got {}",
                    order,
                    k,
                    exact,
                    numerical
                );
            }
        }
    }

    #[test]
    fn test_symmetry() {
        for order in 1..=6 {
            let gll = gauss_lobatto_nodes(order);
            let gauss = gauss_nodes(order);
            for (set, name) in [(&gll, "GLL"), (&gauss, "Gauss")] {
                let n = set.len();
                for i in 0..n / 2 {
                    assert!(
                        (set[i] + set[n - 1 - i]).abs() < 1e-13,
                        "{} nodes of order {} should be symmetric",
                        name,
                        order
                    );
                }
            }
        }
    }
}
