//! TimeCourse - central data structure for a single inference run

use ndarray::Array2;

use super::{ExpressionMatrix, GeneAnnotation};
use crate::error::{Result, TristageError};
use crate::stages::{StageAssignment, StageWindows};

/// Central data structure bundling the expression time course with the
/// products of each pipeline step
///
/// Pipeline steps (`normalize`, `classify_stages`) fill the optional slots;
/// accessors expose them read-only to downstream components.
#[derive(Debug, Clone)]
pub struct TimeCourse {
    /// Raw expression values
    expression: ExpressionMatrix,
    /// Transcription-factor flags
    annotation: GeneAnnotation,

    // Normalizer products
    /// Row-centered, row-scaled expression (g)
    normalized: Option<Array2<f64>>,
    /// Time-scaled first differences of g (s), genes x (T-1)
    change: Option<Array2<f64>>,
    /// s scaled row-wise to [-1, 1] (sn)
    scaled_change: Option<Array2<f64>>,

    // Classifier products
    /// Per-gene stage labels
    stages: Option<StageAssignment>,
    /// Time-axis windows the labels were derived from
    windows: Option<StageWindows>,
}

impl TimeCourse {
    /// Create a new time course dataset
    pub fn new(expression: ExpressionMatrix, annotation: GeneAnnotation) -> Result<Self> {
        annotation.check_len(expression.n_genes())?;

        Ok(Self {
            expression,
            annotation,
            normalized: None,
            change: None,
            scaled_change: None,
            stages: None,
            windows: None,
        })
    }

    // Getters
    pub fn expression(&self) -> &ExpressionMatrix {
        &self.expression
    }

    pub fn annotation(&self) -> &GeneAnnotation {
        &self.annotation
    }

    pub fn n_genes(&self) -> usize {
        self.expression.n_genes()
    }

    pub fn n_timepoints(&self) -> usize {
        self.expression.n_timepoints()
    }

    pub fn time(&self) -> &[i64] {
        self.expression.time()
    }

    pub fn gene_ids(&self) -> &[String] {
        self.expression.gene_ids()
    }

    pub fn normalized(&self) -> Option<&Array2<f64>> {
        self.normalized.as_ref()
    }

    pub fn change(&self) -> Option<&Array2<f64>> {
        self.change.as_ref()
    }

    pub fn scaled_change(&self) -> Option<&Array2<f64>> {
        self.scaled_change.as_ref()
    }

    pub fn stage_assignment(&self) -> Option<&StageAssignment> {
        self.stages.as_ref()
    }

    pub fn stage_windows(&self) -> Option<&StageWindows> {
        self.windows.as_ref()
    }

    pub fn has_normalization(&self) -> bool {
        self.scaled_change.is_some()
    }

    /// Resolve a gene identifier to its row index
    pub fn gene_index(&self, gene_id: &str) -> Result<usize> {
        self.expression
            .gene_index(gene_id)
            .ok_or_else(|| TristageError::UnknownGene {
                id: gene_id.to_string(),
            })
    }

    // Setters used by pipeline steps
    pub fn set_normalized(&mut self, normalized: Array2<f64>) -> Result<()> {
        self.check_shape(&normalized, self.n_timepoints(), "normalized expression")?;
        self.normalized = Some(normalized);
        Ok(())
    }

    pub fn set_change(&mut self, change: Array2<f64>) -> Result<()> {
        self.check_shape(&change, self.n_timepoints() - 1, "change matrix")?;
        self.change = Some(change);
        Ok(())
    }

    pub fn set_scaled_change(&mut self, scaled: Array2<f64>) -> Result<()> {
        self.check_shape(&scaled, self.n_timepoints() - 1, "scaled change matrix")?;
        self.scaled_change = Some(scaled);
        Ok(())
    }

    pub fn set_stages(&mut self, stages: StageAssignment, windows: StageWindows) -> Result<()> {
        if stages.len() != self.n_genes() {
            return Err(TristageError::DimensionMismatch {
                expected: format!("{} stage labels", self.n_genes()),
                got: format!("{} stage labels", stages.len()),
            });
        }
        if windows.n_timepoints() != self.n_timepoints() {
            return Err(TristageError::DimensionMismatch {
                expected: format!("windows over {} time points", self.n_timepoints()),
                got: format!("windows over {} time points", windows.n_timepoints()),
            });
        }
        self.stages = Some(stages);
        self.windows = Some(windows);
        Ok(())
    }

    fn check_shape(&self, m: &Array2<f64>, expected_cols: usize, what: &str) -> Result<()> {
        if m.nrows() != self.n_genes() || m.ncols() != expected_cols {
            return Err(TristageError::DimensionMismatch {
                expected: format!("{} x {} {}", self.n_genes(), expected_cols, what),
                got: format!("{} x {}", m.nrows(), m.ncols()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn small_course() -> TimeCourse {
        let values = array![[1.0, 2.0, 4.0], [3.0, 3.0, 3.0]];
        let expression = ExpressionMatrix::new(
            values,
            vec!["g1".to_string(), "g2".to_string()],
            vec![0, 2, 4],
        )
        .unwrap();
        let annotation = GeneAnnotation::all_tf(2);
        TimeCourse::new(expression, annotation).unwrap()
    }

    #[test]
    fn test_timecourse_creation() {
        let tc = small_course();
        assert_eq!(tc.n_genes(), 2);
        assert_eq!(tc.n_timepoints(), 3);
        assert!(tc.normalized().is_none());
        assert!(tc.stage_assignment().is_none());
    }

    #[test]
    fn test_annotation_length_checked() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let expression = ExpressionMatrix::new(
            values,
            vec!["g1".to_string(), "g2".to_string()],
            vec![0, 2],
        )
        .unwrap();
        let annotation = GeneAnnotation::all_tf(3);
        assert!(TimeCourse::new(expression, annotation).is_err());
    }

    #[test]
    fn test_gene_index_lookup() {
        let tc = small_course();
        assert_eq!(tc.gene_index("g2").unwrap(), 1);
        assert!(tc.gene_index("missing").is_err());
    }

    #[test]
    fn test_set_change_shape_checked() {
        let mut tc = small_course();
        assert!(tc.set_change(array![[1.0, 2.0], [0.0, 0.0]]).is_ok());
        assert!(tc.set_change(array![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]]).is_err());
    }

    #[test]
    fn test_set_stages_checks_lengths() {
        use crate::stages::Stage;

        let mut tc = small_course();
        let windows = StageWindows::new(2, 1, 3).unwrap();
        let short = StageAssignment::new(vec![Stage::Initiation]);
        assert!(tc.set_stages(short, windows.clone()).is_err());

        let labels = StageAssignment::new(vec![Stage::Initiation, Stage::PrimaryResponse]);
        tc.set_stages(labels, windows).unwrap();
        assert!(tc.stage_assignment().is_some());
        assert!(tc.stage_windows().is_some());
    }
}
