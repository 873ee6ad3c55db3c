//! Per-gene annotation: transcription-factor membership

use std::collections::HashSet;

use crate::error::{Result, TristageError};

/// Transcription-factor flags, one per gene
///
/// Without a TF list every gene is treated as a transcription factor, so
/// target searches stay unrestricted by default.
#[derive(Debug, Clone)]
pub struct GeneAnnotation {
    is_tf: Vec<bool>,
}

impl GeneAnnotation {
    /// Annotation marking every gene as a transcription factor
    pub fn all_tf(n_genes: usize) -> Self {
        Self {
            is_tf: vec![true; n_genes],
        }
    }

    /// Create from explicit per-gene flags
    pub fn new(is_tf: Vec<bool>) -> Self {
        Self { is_tf }
    }

    /// Build flags from a TF identifier list
    ///
    /// List entries that do not match any gene in the matrix are logged and
    /// ignored; genome-wide TF lists routinely contain genes outside the
    /// measured set.
    pub fn from_tf_list(gene_ids: &[String], tf_ids: &[String]) -> Self {
        let known: HashSet<&str> = gene_ids.iter().map(|s| s.as_str()).collect();

        let mut unknown = 0usize;
        let mut members: HashSet<&str> = HashSet::with_capacity(tf_ids.len());
        for id in tf_ids {
            if known.contains(id.as_str()) {
                members.insert(id.as_str());
            } else {
                unknown += 1;
            }
        }

        if unknown > 0 {
            log::warn!(
                "{} of {} TF list entries not present in the expression matrix; ignored",
                unknown,
                tf_ids.len()
            );
        }

        let is_tf = gene_ids
            .iter()
            .map(|id| members.contains(id.as_str()))
            .collect();

        Self { is_tf }
    }

    /// Validate that the annotation covers exactly `n_genes` genes
    pub fn check_len(&self, n_genes: usize) -> Result<()> {
        if self.is_tf.len() != n_genes {
            return Err(TristageError::InvalidAnnotation {
                reason: format!(
                    "Annotation covers {} genes, expression matrix has {}",
                    self.is_tf.len(),
                    n_genes
                ),
            });
        }
        Ok(())
    }

    /// Number of annotated genes
    pub fn n_genes(&self) -> usize {
        self.is_tf.len()
    }

    /// Whether the gene at `gene_idx` is a transcription factor
    pub fn is_tf(&self, gene_idx: usize) -> bool {
        self.is_tf[gene_idx]
    }

    /// Number of transcription factors
    pub fn n_tf(&self) -> usize {
        self.is_tf.iter().filter(|&&x| x).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tf_default() {
        let ann = GeneAnnotation::all_tf(3);
        assert_eq!(ann.n_genes(), 3);
        assert_eq!(ann.n_tf(), 3);
        assert!(ann.is_tf(0) && ann.is_tf(1) && ann.is_tf(2));
    }

    #[test]
    fn test_from_tf_list() {
        let gene_ids = vec!["g1".to_string(), "g2".to_string(), "g3".to_string()];
        let tf_ids = vec!["g2".to_string(), "not_measured".to_string()];

        let ann = GeneAnnotation::from_tf_list(&gene_ids, &tf_ids);
        assert!(!ann.is_tf(0));
        assert!(ann.is_tf(1));
        assert!(!ann.is_tf(2));
        assert_eq!(ann.n_tf(), 1);
    }

    #[test]
    fn test_check_len_mismatch() {
        let ann = GeneAnnotation::all_tf(2);
        assert!(ann.check_len(3).is_err());
        assert!(ann.check_len(2).is_ok());
    }
}
