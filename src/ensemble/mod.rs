//! Majority voting over repeated runs at different denoising thresholds

use std::collections::HashMap;

use log::{debug, info};
use rayon::prelude::*;

use crate::align::{
    compute_dissimilarity, AlignmentQuery, AlignmentResult, CandidateCall, SearchDirection,
    DEFAULT_THRESHOLD,
};
use crate::data::TimeCourse;
use crate::error::{Result, TristageError};
use crate::normalization::threshold_pattern;
use crate::stages::Stage;

/// Parameters for interaction inference
#[derive(Debug, Clone)]
pub struct InferenceParams {
    /// Dissimilarity cutoff for candidate filtering
    pub threshold: f64,
    /// Denoising thresholds; each adds one voting run on quantized data
    pub denoise_thresholds: Vec<f64>,
}

impl Default for InferenceParams {
    fn default() -> Self {
        InferenceParams {
            threshold: DEFAULT_THRESHOLD,
            denoise_thresholds: vec![0.2, 0.2],
        }
    }
}

/// Outcome of one inference query
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    /// Gene row of the query gene
    pub goi: usize,
    /// Stage of the query gene
    pub goi_stage: Stage,
    pub direction: SearchDirection,
    /// Stage the candidates were drawn from
    pub pool_stage: Stage,
    /// Candidate pool row indices
    pub pool: Vec<usize>,
    /// Number of voting runs
    pub n_runs: usize,
    /// Result of the unthresholded run, for reporting
    pub primary: AlignmentResult,
    /// Accepted interactions in discovery order
    pub interactions: Vec<CandidateCall>,
}

/// Infer regulators or targets of one gene by voting across thresholds
///
/// Runs the dissimilarity engine once on the scaled change rates and once
/// per denoising threshold on their quantized variant, then keeps the
/// candidates that recur with a consistent polarity. Stage labels and
/// normalization products must already be present on the dataset.
/// Domain-impossible queries (regulators of an earliest-stage gene, targets
/// of a non-TF or latest-stage gene, an adjacent stage without time
/// intervals) report as not applicable rather than failing.
pub fn infer_interactions(
    dataset: &TimeCourse,
    gene: &str,
    direction: SearchDirection,
    params: &InferenceParams,
) -> Result<InferenceOutcome> {
    let goi = dataset.gene_index(gene)?;
    let stages = dataset
        .stage_assignment()
        .ok_or_else(|| TristageError::InvalidInput {
            reason: "Stage labels are missing; run stage classification first".to_string(),
        })?;
    let windows = dataset
        .stage_windows()
        .ok_or_else(|| TristageError::InvalidInput {
            reason: "Stage windows are missing; run stage classification first".to_string(),
        })?;
    let scaled = dataset
        .scaled_change()
        .ok_or_else(|| TristageError::InvalidInput {
            reason: "Scaled change rates are missing; run normalization first".to_string(),
        })?;
    for &thr in &params.denoise_thresholds {
        if !thr.is_finite() || thr < 0.0 {
            return Err(TristageError::InvalidInput {
                reason: format!("Denoising threshold {} must be a nonnegative number", thr),
            });
        }
    }

    let goi_stage = stages.stage_of(goi);
    let (earlier_stage, later_stage, pool_stage) = match direction {
        SearchDirection::Regulators => {
            let previous = goi_stage.earlier().ok_or_else(|| TristageError::InfeasibleQuery {
                reason: format!(
                    "gene '{}' is assigned to the {} stage and has no earlier stage to search for regulators",
                    gene, goi_stage
                ),
            })?;
            (previous, goi_stage, previous)
        }
        SearchDirection::Targets => {
            if !dataset.annotation().is_tf(goi) {
                return Err(TristageError::InfeasibleQuery {
                    reason: format!(
                        "gene '{}' is not annotated as a transcription factor, so a target search does not apply",
                        gene
                    ),
                });
            }
            let next = goi_stage.later().ok_or_else(|| TristageError::InfeasibleQuery {
                reason: format!(
                    "gene '{}' is assigned to the {} stage and has no later stage to search for targets",
                    gene, goi_stage
                ),
            })?;
            (goi_stage, next, next)
        }
    };

    let earlier = windows.interval_range(earlier_stage);
    let later = windows.interval_range(later_stage);
    for (stage, range) in [(earlier_stage, &earlier), (later_stage, &later)] {
        if range.is_empty() {
            return Err(TristageError::InfeasibleQuery {
                reason: format!("the {} stage holds no time interval on this axis", stage),
            });
        }
    }

    let mut pool = stages.genes_in(pool_stage);
    pool.retain(|&g| g != goi);
    if direction == SearchDirection::Targets {
        pool.retain(|&g| dataset.annotation().is_tf(g));
    }

    info!(
        "Searching {} of gene '{}' ({} stage): {} candidates in the {} stage",
        direction,
        gene,
        goi_stage,
        pool.len(),
        pool_stage
    );

    let mut run_specs: Vec<Option<f64>> = Vec::with_capacity(1 + params.denoise_thresholds.len());
    run_specs.push(None);
    run_specs.extend(params.denoise_thresholds.iter().map(|&t| Some(t)));
    debug!("Voting over {} runs", run_specs.len());

    let time_gaps = dataset.expression().time_gaps();
    let base = scaled.view();
    let mut runs: Vec<AlignmentResult> = run_specs
        .into_par_iter()
        .map(|denoise| {
            let quantized = denoise.map(|thr| threshold_pattern(base, thr));
            // Reborrow so both arms live as long as the closure-local matrix
            let view = match &quantized {
                Some(m) => m.view(),
                None => base.reborrow(),
            };
            let query = AlignmentQuery {
                scaled_change: view,
                time_gaps: &time_gaps,
                earlier: earlier.clone(),
                later: later.clone(),
                goi,
                pool: &pool,
                direction,
                threshold: params.threshold,
            };
            compute_dissimilarity(&query)
        })
        .collect::<Result<Vec<_>>>()?;

    let interactions = vote_across_thresholds(&runs)?;
    info!(
        "{} interactions accepted across {} runs",
        interactions.len(),
        runs.len()
    );

    let n_runs = runs.len();
    let primary = runs.swap_remove(0);

    Ok(InferenceOutcome {
        goi,
        goi_stage,
        direction,
        pool_stage,
        pool,
        n_runs,
        primary,
        interactions,
    })
}

struct VoteEntry {
    call: CandidateCall,
    count: usize,
    conflict: bool,
}

/// Merge candidate calls from repeated runs by majority vote
///
/// A candidate is accepted when it appears in strictly more than half of
/// the runs and every appearance agrees on polarity; any polarity
/// disagreement discards it regardless of count. The accepted record keeps
/// the delay and score of the candidate's first appearance, and a single
/// run returns its calls unchanged.
pub fn vote_across_thresholds(runs: &[AlignmentResult]) -> Result<Vec<CandidateCall>> {
    if runs.is_empty() {
        return Err(TristageError::InvalidInput {
            reason: "At least one run is required for voting".to_string(),
        });
    }
    if runs.len() == 1 {
        return Ok(runs[0].calls.clone());
    }

    let mut order: Vec<usize> = Vec::new();
    let mut votes: HashMap<usize, VoteEntry> = HashMap::new();
    for run in runs {
        for call in &run.calls {
            match votes.get_mut(&call.gene_index) {
                None => {
                    order.push(call.gene_index);
                    votes.insert(
                        call.gene_index,
                        VoteEntry {
                            call: call.clone(),
                            count: 1,
                            conflict: false,
                        },
                    );
                }
                Some(entry) => {
                    entry.count += 1;
                    if entry.call.polarity != call.polarity {
                        entry.conflict = true;
                    }
                }
            }
        }
    }

    let n_runs = runs.len();
    let accepted = order
        .iter()
        .filter_map(|gene| votes.get(gene))
        .filter(|entry| !entry.conflict && 2 * entry.count > n_runs)
        .map(|entry| entry.call.clone())
        .collect();
    Ok(accepted)
}
