//! Tensor-product contraction helpers for the host kernels.
//!
//! Element fields are stored i-fastest: `u[i + n0*(j + n1*k)]`. Applying a
//! 1D operator along each axis in turn realizes the Kronecker-product
//! action without ever forming the 3D matrix.

/// Apply a `rows x cols` matrix along `axis` of a field with dims
/// `(n0, n1, n2)`; the axis extent must equal `cols`. Returns the field
/// with that axis resized to `rows`.
pub(crate) fn apply_axis(
    mat: &[f64],
    rows: usize,
    cols: usize,
    src: &[f64],
    dims: (usize, usize, usize),
    axis: usize,
) -> Vec<f64> {
    let (n0, n1, n2) = dims;
    match axis {
        0 => {
            debug_assert_eq!(cols, n0);
            let mut dst = vec![0.0; rows * n1 * n2];
            for k in 0..n2 {
                for j in 0..n1 {
                    for a in 0..rows {
                        let mut sum = 0.0;
                        for c in 0..cols {
                            sum += mat[a * cols + c] * src[c + n0 * (j + n1 * k)];
                        }
                        dst[a + rows * (j + n1 * k)] = sum;
                    }
                }
            }
            dst
        }
        1 => {
            debug_assert_eq!(cols, n1);
            let mut dst = vec![0.0; n0 * rows * n2];
            for k in 0..n2 {
                for a in 0..rows {
                    for i in 0..n0 {
                        let mut sum = 0.0;
                        for c in 0..cols {
                            sum += mat[a * cols + c] * src[i + n0 * (c + n1 * k)];
                        }
                        dst[i + n0 * (a + rows * k)] = sum;
                    }
                }
            }
            dst
        }
        2 => {
            debug_assert_eq!(cols, n2);
            let mut dst = vec![0.0; n0 * n1 * rows];
            for a in 0..rows {
                for j in 0..n1 {
                    for i in 0..n0 {
                        let mut sum = 0.0;
                        for c in 0..cols {
                            sum += mat[a * cols + c] * src[i + n0 * (j + n1 * c)];
                        }
                        dst[i + n0 * (j + n1 * a)] = sum;
                    }
                }
            }
            dst
        }
        _ => panic!("axis {} out of range", axis),
    }
}

/// Apply the same `rows x cols` matrix along all three axes of a `cols³`
/// field, producing a `rows³` field.
pub(crate) fn tensor3_apply(mat: &[f64], rows: usize, cols: usize, src: &[f64]) -> Vec<f64> {
    let t0 = apply_axis(mat, rows, cols, src, (cols, cols, cols), 0);
    let t1 = apply_axis(mat, rows, cols, &t0, (rows, cols, cols), 1);
    apply_axis(mat, rows, cols, &t1, (rows, rows, cols), 2)
}
