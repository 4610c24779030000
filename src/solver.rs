use crate::ModelError;

const PIVOT_EPS: f64 = 1e-12;
const SUM_TOLERANCE: f64 = 1e-6;
const NEGATIVE_TOLERANCE: f64 = 1e-9;

/// Stationary distribution of a row-stochastic transition matrix.
///
/// Solves pi * P = pi by transposing the matrix, subtracting the identity and
/// replacing the last equation (the homogeneous system is rank-deficient by
/// one) with the normalization constraint sum(pi) = 1, then eliminating with
/// partial pivoting.
pub fn stationary_distribution(matrix: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
    let size = matrix.len();

    let mut a = vec![vec![0.0; size]; size];
    for (row_id, row) in matrix.iter().enumerate() {
        for (col_id, &prob) in row.iter().enumerate() {
            a[col_id][row_id] = prob;
        }
    }
    for (diag, row) in a.iter_mut().enumerate() {
        row[diag] -= 1.0;
    }
    for x in a[size - 1].iter_mut() {
        *x = 1.0;
    }

    let mut b = vec![0.0; size];
    b[size - 1] = 1.0;

    // Forward elimination.
    for col in 0..size {
        let mut pivot = col;
        for row in col + 1..size {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < PIVOT_EPS {
            return Err(ModelError::SingularSystem { column: col });
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..size {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..size {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution.
    let mut distribution = vec![0.0; size];
    for row in (0..size).rev() {
        let mut acc = b[row];
        for k in row + 1..size {
            acc -= a[row][k] * distribution[k];
        }
        distribution[row] = acc / a[row][row];
    }

    validate(distribution)
}

/// A reducible or ill-conditioned chain can come out of the solve as a
/// non-probability vector; report that instead of returning it.
fn validate(mut distribution: Vec<f64>) -> Result<Vec<f64>, ModelError> {
    let sum: f64 = distribution.iter().sum();
    let min = distribution.iter().cloned().fold(f64::INFINITY, f64::min);

    if !sum.is_finite() || (sum - 1.0).abs() > SUM_TOLERANCE || min < -NEGATIVE_TOLERANCE {
        return Err(ModelError::DegenerateDistribution { sum, min });
    }

    // Round-off within tolerance, not real mass.
    for p in distribution.iter_mut() {
        if *p < 0.0 {
            *p = 0.0;
        }
    }

    Ok(distribution)
}
