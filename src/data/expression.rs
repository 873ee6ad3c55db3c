//! Expression matrix representation for time-course data

use std::collections::HashSet;

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, TristageError};

/// A gene-expression time course
/// Rows are genes, columns are time points ordered by increasing time
#[derive(Debug, Clone)]
pub struct ExpressionMatrix {
    /// Expression values (genes x time points)
    values: Array2<f64>,
    /// Gene identifiers, one per row
    gene_ids: Vec<String>,
    /// Sampling times in integer time units, strictly increasing
    time: Vec<i64>,
}

impl ExpressionMatrix {
    /// Create a new expression matrix from raw data
    ///
    /// Columns need not arrive time-sorted; they are reordered by increasing
    /// time value here. Duplicate time values and duplicate gene identifiers
    /// are rejected.
    pub fn new(values: Array2<f64>, gene_ids: Vec<String>, time: Vec<i64>) -> Result<Self> {
        let (n_genes, n_timepoints) = values.dim();

        if gene_ids.len() != n_genes {
            return Err(TristageError::DimensionMismatch {
                expected: format!("{} gene IDs", n_genes),
                got: format!("{} gene IDs", gene_ids.len()),
            });
        }

        if time.len() != n_timepoints {
            return Err(TristageError::DimensionMismatch {
                expected: format!("{} time values", n_timepoints),
                got: format!("{} time values", time.len()),
            });
        }

        if n_genes == 0 {
            return Err(TristageError::EmptyData {
                reason: "Expression matrix has no genes".to_string(),
            });
        }

        if n_timepoints < 2 {
            return Err(TristageError::InvalidTimeAxis {
                reason: format!(
                    "At least 2 time points are required, got {}",
                    n_timepoints
                ),
            });
        }

        if values.iter().any(|&x| x.is_nan() || x.is_infinite()) {
            return Err(TristageError::InvalidExpressionMatrix {
                reason: "Expression values must be finite".to_string(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(n_genes);
        for id in &gene_ids {
            if !seen.insert(id.as_str()) {
                return Err(TristageError::InvalidExpressionMatrix {
                    reason: format!("Duplicate gene identifier '{}'", id),
                });
            }
        }

        // Sort columns by time value so downstream code can assume ordering
        let mut order: Vec<usize> = (0..n_timepoints).collect();
        order.sort_by_key(|&j| time[j]);

        let mut sorted_time: Vec<i64> = order.iter().map(|&j| time[j]).collect();
        for pair in sorted_time.windows(2) {
            if pair[0] == pair[1] {
                return Err(TristageError::InvalidTimeAxis {
                    reason: format!("Duplicate time value {}", pair[0]),
                });
            }
        }

        let values = if order.windows(2).all(|w| w[0] < w[1]) {
            sorted_time = time;
            values
        } else {
            log::warn!("Time points arrived unsorted; reordering columns by time");
            values.select(Axis(1), &order)
        };

        Ok(Self {
            values,
            gene_ids,
            time: sorted_time,
        })
    }

    /// Get the number of genes
    pub fn n_genes(&self) -> usize {
        self.values.nrows()
    }

    /// Get the number of time points
    pub fn n_timepoints(&self) -> usize {
        self.values.ncols()
    }

    /// Get the expression values as a view
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Get gene IDs
    pub fn gene_ids(&self) -> &[String] {
        &self.gene_ids
    }

    /// Get the time axis in integer time units
    pub fn time(&self) -> &[i64] {
        &self.time
    }

    /// Gaps between consecutive time points
    pub fn time_gaps(&self) -> Vec<i64> {
        self.time.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Get expression values for a specific gene
    pub fn gene_values(&self, gene_idx: usize) -> ArrayView1<'_, f64> {
        self.values.row(gene_idx)
    }

    /// Get gene index by ID
    pub fn gene_index(&self, gene_id: &str) -> Option<usize> {
        self.gene_ids.iter().position(|id| id == gene_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_expression_matrix_creation() {
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let gene_ids = vec!["gene1".to_string(), "gene2".to_string()];
        let time = vec![0, 3, 6];

        let matrix = ExpressionMatrix::new(values, gene_ids, time).unwrap();
        assert_eq!(matrix.n_genes(), 2);
        assert_eq!(matrix.n_timepoints(), 3);
        assert_eq!(matrix.time(), &[0, 3, 6]);
    }

    #[test]
    fn test_unsorted_columns_reordered() {
        let values = array![[3.0, 1.0, 2.0], [30.0, 10.0, 20.0]];
        let gene_ids = vec!["gene1".to_string(), "gene2".to_string()];
        let time = vec![6, 0, 3];

        let matrix = ExpressionMatrix::new(values, gene_ids, time).unwrap();
        assert_eq!(matrix.time(), &[0, 3, 6]);
        assert_eq!(matrix.gene_values(0).to_vec(), vec![1.0, 2.0, 3.0]);
        assert_eq!(matrix.gene_values(1).to_vec(), vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_duplicate_time_rejected() {
        let values = array![[1.0, 2.0, 3.0]];
        let gene_ids = vec!["gene1".to_string()];
        let time = vec![0, 3, 3];

        assert!(ExpressionMatrix::new(values, gene_ids, time).is_err());
    }

    #[test]
    fn test_duplicate_gene_ids_rejected() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let gene_ids = vec!["gene1".to_string(), "gene1".to_string()];
        let time = vec![0, 3];

        assert!(ExpressionMatrix::new(values, gene_ids, time).is_err());
    }

    #[test]
    fn test_non_finite_values_rejected() {
        let values = array![[1.0, f64::NAN], [3.0, 4.0]];
        let gene_ids = vec!["gene1".to_string(), "gene2".to_string()];
        let time = vec![0, 3];

        assert!(ExpressionMatrix::new(values, gene_ids, time).is_err());
    }

    #[test]
    fn test_time_gaps() {
        let values = array![[1.0, 2.0, 3.0, 4.0]];
        let gene_ids = vec!["gene1".to_string()];
        let time = vec![0, 3, 9, 24];

        let matrix = ExpressionMatrix::new(values, gene_ids, time).unwrap();
        assert_eq!(matrix.time_gaps(), vec![3, 6, 15]);
    }
}
