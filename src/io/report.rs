//! Machine- and human-readable reports for inference queries

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::align::Polarity;
use crate::data::TimeCourse;
use crate::ensemble::InferenceOutcome;
use crate::error::Result;

/// One accepted interaction with its gene identifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub gene_id: String,
    pub polarity: Polarity,
    /// Delay of the winning alignment in time units
    pub delay: i64,
    /// Minimum dissimilarity across reported delays
    pub score: f64,
}

/// One row of the reported dissimilarity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DissimilarityRow {
    pub gene_id: String,
    pub scores: Vec<f64>,
}

/// Full result of one inference query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceReport {
    pub gene: String,
    pub direction: String,
    pub goi_stage: usize,
    pub pool_stage: usize,
    pub n_candidates: usize,
    pub n_runs: usize,
    /// Common grid step in time units
    pub grid_step: i64,
    /// Reported delays of the unthresholded run
    pub delays: Vec<i64>,
    /// Surviving candidates of the unthresholded run
    pub table: Vec<DissimilarityRow>,
    /// Accepted interactions in discovery order
    pub interactions: Vec<InteractionRecord>,
}

impl InferenceReport {
    /// Assemble the report for one completed query
    pub fn from_outcome(dataset: &TimeCourse, outcome: &InferenceOutcome) -> Self {
        let ids = dataset.gene_ids();

        let table = outcome
            .primary
            .table
            .gene_indices
            .iter()
            .enumerate()
            .map(|(row, &gene)| DissimilarityRow {
                gene_id: ids[gene].clone(),
                scores: outcome.primary.table.scores.row(row).to_vec(),
            })
            .collect();

        let interactions = outcome
            .interactions
            .iter()
            .map(|call| InteractionRecord {
                gene_id: ids[call.gene_index].clone(),
                polarity: call.polarity,
                delay: call.delay,
                score: call.score,
            })
            .collect();

        InferenceReport {
            gene: ids[outcome.goi].clone(),
            direction: outcome.direction.name().to_string(),
            goi_stage: outcome.goi_stage.as_number(),
            pool_stage: outcome.pool_stage.as_number(),
            n_candidates: outcome.pool.len(),
            n_runs: outcome.n_runs,
            grid_step: outcome.primary.step,
            delays: outcome.primary.table.delays.clone(),
            table,
            interactions,
        }
    }

    /// Summary statistics for terminal reporting
    pub fn summary(&self) -> InferenceSummary {
        InferenceSummary {
            gene: self.gene.clone(),
            direction: self.direction.clone(),
            goi_stage: self.goi_stage,
            pool_stage: self.pool_stage,
            n_candidates: self.n_candidates,
            n_survivors: self.table.len(),
            n_runs: self.n_runs,
            interactions: self.interactions.clone(),
        }
    }
}

/// Summary of one inference query
#[derive(Debug, Clone)]
pub struct InferenceSummary {
    pub gene: String,
    pub direction: String,
    pub goi_stage: usize,
    pub pool_stage: usize,
    pub n_candidates: usize,
    pub n_survivors: usize,
    pub n_runs: usize,
    pub interactions: Vec<InteractionRecord>,
}

impl std::fmt::Display for InferenceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Interaction Inference Summary")?;
        writeln!(f, "=============================")?;
        writeln!(f, "Gene of interest: {} (stage {})", self.gene, self.goi_stage)?;
        writeln!(
            f,
            "Direction: {} (candidates from stage {})",
            self.direction, self.pool_stage
        )?;
        writeln!(f, "Candidates scored: {}", self.n_candidates)?;
        writeln!(f, "Survived filtering: {}", self.n_survivors)?;
        writeln!(f, "Voting runs: {}", self.n_runs)?;
        writeln!(f, "Accepted interactions: {}", self.interactions.len())?;
        for record in &self.interactions {
            writeln!(
                f,
                "  {}: {} at delay {} (dissimilarity {:.4})",
                record.gene_id, record.polarity, record.delay, record.score
            )?;
        }
        Ok(())
    }
}

/// Write any serializable report as pretty-printed JSON
pub fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
