//! Common integer time grid for irregularly sampled intervals

use ndarray::ArrayView1;

use crate::error::{Result, TristageError};

fn gcd(a: i64, b: i64) -> i64 {
    let mut a = a;
    let mut b = b;
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Greatest common divisor of the time gaps in a window
///
/// The finest uniform step that evenly divides every gap; one shift in the
/// dissimilarity table corresponds to one such step.
pub fn grid_step(gaps: &[i64]) -> Result<i64> {
    if gaps.is_empty() {
        return Err(TristageError::InvalidTimeAxis {
            reason: "Window spans no time interval".to_string(),
        });
    }
    let mut step = 0;
    for &gap in gaps {
        if gap <= 0 {
            return Err(TristageError::InvalidTimeAxis {
                reason: format!("Non-positive time gap {}", gap),
            });
        }
        step = gcd(step, gap);
    }
    Ok(step)
}

/// Re-express interval values on a uniform grid of the given step
///
/// Each interval's value is repeated `gap / step` times (zero-order hold),
/// so the expanded sequence holds `sum(gaps) / step` entries.
pub fn expand_row(values: ArrayView1<f64>, gaps: &[i64], step: i64) -> Result<Vec<f64>> {
    if values.len() != gaps.len() {
        return Err(TristageError::DimensionMismatch {
            expected: format!("{} interval values", gaps.len()),
            got: format!("{}", values.len()),
        });
    }

    let total: i64 = gaps.iter().sum();
    let mut expanded = Vec::with_capacity((total / step) as usize);
    for (value, &gap) in values.iter().zip(gaps) {
        let repeats = (gap / step) as usize;
        for _ in 0..repeats {
            expanded.push(*value);
        }
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_grid_step_gcd() {
        // Time points [0, 3, 9, 24]
        assert_eq!(grid_step(&[3, 6, 15]).unwrap(), 3);
        assert_eq!(grid_step(&[4, 6]).unwrap(), 2);
        assert_eq!(grid_step(&[5]).unwrap(), 5);
        assert_eq!(grid_step(&[7, 11]).unwrap(), 1);
    }

    #[test]
    fn test_grid_step_rejects_bad_gaps() {
        assert!(grid_step(&[]).is_err());
        assert!(grid_step(&[3, 0, 6]).is_err());
        assert!(grid_step(&[3, -2]).is_err());
    }

    #[test]
    fn test_expansion_reproduces_originals() {
        let values = array![1.5, -2.0, 0.5];
        let gaps = [3, 6, 15];
        let expanded = expand_row(values.view(), &gaps, 3).unwrap();

        assert_eq!(expanded.len(), 8);
        // Each original interval starts at its cumulative step offset
        assert_eq!(expanded[0], 1.5);
        assert_eq!(expanded[1], -2.0);
        assert_eq!(expanded[3], 0.5);
        // Zero-order hold fills the gaps with the interval value
        assert_eq!(expanded, vec![1.5, -2.0, -2.0, 0.5, 0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_expansion_is_identity_on_uniform_grid() {
        let values = array![0.25, -1.0, 4.0];
        let expanded = expand_row(values.view(), &[2, 2, 2], 2).unwrap();
        assert_eq!(expanded, vec![0.25, -1.0, 4.0]);
    }

    #[test]
    fn test_expansion_rejects_mismatched_lengths() {
        let values = array![1.0, 2.0];
        assert!(expand_row(values.view(), &[3], 3).is_err());
    }
}
