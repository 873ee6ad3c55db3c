//! Shifted-window dissimilarity scoring between adjacent stages

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use log::{debug, info};
use ndarray::{s, Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TristageError};

use super::grid::{expand_row, grid_step};

/// Default dissimilarity threshold for candidate filtering
pub const DEFAULT_THRESHOLD: f64 = 0.4;

/// Interaction polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Activator,
    Inhibitor,
}

impl Polarity {
    pub fn name(&self) -> &'static str {
        match self {
            Polarity::Activator => "activator",
            Polarity::Inhibitor => "inhibitor",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Which side of the gene of interest is being searched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    /// Candidates from the previous stage that may regulate the gene
    Regulators,
    /// Candidates from the next stage that the gene may regulate
    Targets,
}

impl SearchDirection {
    pub fn name(&self) -> &'static str {
        match self {
            SearchDirection::Regulators => "regulators",
            SearchDirection::Targets => "targets",
        }
    }
}

impl fmt::Display for SearchDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SearchDirection {
    type Err = TristageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "regulator" | "regulators" => Ok(SearchDirection::Regulators),
            "target" | "targets" => Ok(SearchDirection::Targets),
            other => Err(TristageError::InvalidDirection {
                token: other.to_string(),
            }),
        }
    }
}

/// A dissimilarity query over two adjacent stage windows
///
/// `earlier` and `later` are contiguous column ranges of the change matrix.
/// For a regulator search the gene of interest sits in the later stage and
/// candidates come from the earlier one; a target search is the reverse.
#[derive(Debug, Clone)]
pub struct AlignmentQuery<'a> {
    /// Scaled change matrix, genes x intervals
    pub scaled_change: ArrayView2<'a, f64>,
    /// Time gap per interval column
    pub time_gaps: &'a [i64],
    /// Interval columns of the earlier stage
    pub earlier: Range<usize>,
    /// Interval columns of the later stage
    pub later: Range<usize>,
    /// Row index of the gene of interest
    pub goi: usize,
    /// Candidate row indices
    pub pool: &'a [usize],
    pub direction: SearchDirection,
    /// Dissimilarity cutoff for candidate filtering
    pub threshold: f64,
}

/// Dissimilarity scores for surviving candidates at every reported delay
#[derive(Debug, Clone)]
pub struct DissimilarityTable {
    /// Real-time delay per column
    pub delays: Vec<i64>,
    /// Candidate gene row per table row
    pub gene_indices: Vec<usize>,
    /// Winning-polarity score per candidate and delay
    pub scores: Array2<f64>,
}

impl DissimilarityTable {
    pub fn n_candidates(&self) -> usize {
        self.gene_indices.len()
    }

    pub fn n_delays(&self) -> usize {
        self.delays.len()
    }
}

/// One surviving candidate with resolved polarity
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateCall {
    pub gene_index: usize,
    pub polarity: Polarity,
    /// Delay of the winning alignment in time units
    pub delay: i64,
    /// Minimum dissimilarity across reported delays
    pub score: f64,
}

/// Outcome of one dissimilarity computation
#[derive(Debug, Clone)]
pub struct AlignmentResult {
    /// Common grid step in time units
    pub step: i64,
    pub table: DissimilarityTable,
    /// One call per surviving candidate, in pool order
    pub calls: Vec<CandidateCall>,
    /// Survival mask over the candidate pool
    pub survivors: Vec<bool>,
}

/// Score a candidate pool against a gene of interest across all delays
///
/// The two stage windows are rebinned onto their common grid; each shift
/// aligns the earlier-stage pattern one grid step further ahead of the
/// later-stage pattern, with shift zero comparing the stages in place. At
/// every shift a candidate gets a mean absolute difference (activation) and
/// a mean absolute sum (inhibition) against the fixed gene-of-interest
/// window; the winning hypothesis supplies the tabled score. A candidate
/// survives when its first minimum lies strictly below the threshold and
/// away from the boundary shifts, and the boundary columns are dropped from
/// the reported table. An empty pool or zero survivors is a valid empty
/// result.
pub fn compute_dissimilarity(query: &AlignmentQuery) -> Result<AlignmentResult> {
    validate(query)?;

    let window = query.earlier.start..query.later.end;
    let gaps = &query.time_gaps[window.clone()];
    let step = grid_step(gaps)?;
    let earlier_steps: i64 = query.time_gaps[query.earlier.clone()]
        .iter()
        .map(|g| g / step)
        .sum();
    let later_steps: i64 = query.time_gaps[query.later.clone()]
        .iter()
        .map(|g| g / step)
        .sum();

    let total = (earlier_steps + later_steps) as usize;
    let shifts = earlier_steps.min(later_steps) as usize;
    let width = total - shifts;
    let ncols = shifts + 1;

    let delays: Vec<i64> = (0..=shifts).map(|k| k as i64 * step).collect();
    let keep = if ncols > 2 { 1..ncols - 1 } else { 1..2 };

    debug!(
        "Common grid: step {}, {} steps ({} earlier, {} later), {} shifts, window width {}",
        step, total, earlier_steps, later_steps, shifts, width
    );

    if query.pool.is_empty() {
        debug!("Candidate pool is empty; returning an empty table");
        return Ok(AlignmentResult {
            step,
            table: DissimilarityTable {
                delays: delays[keep.clone()].to_vec(),
                gene_indices: Vec::new(),
                scores: Array2::zeros((0, keep.len())),
            },
            calls: Vec::new(),
            survivors: Vec::new(),
        });
    }

    let goi_grid = expand_row(
        query.scaled_change.row(query.goi).slice(s![window.clone()]),
        gaps,
        step,
    )?;
    let goi_window: &[f64] = match query.direction {
        SearchDirection::Regulators => &goi_grid[shifts..total],
        SearchDirection::Targets => &goi_grid[0..width],
    };

    let n_pool = query.pool.len();
    let mut raw_scores = Array2::from_elem((n_pool, ncols), f64::NAN);
    let mut raw_polarities = Array2::from_elem((n_pool, ncols), Polarity::Inhibitor);

    for (row, &gene) in query.pool.iter().enumerate() {
        let cand_grid = expand_row(
            query.scaled_change.row(gene).slice(s![window.clone()]),
            gaps,
            step,
        )?;
        for k in 0..=shifts {
            let start = match query.direction {
                SearchDirection::Regulators => shifts - k,
                SearchDirection::Targets => k,
            };
            let (act, inh) = activation_inhibition(&cand_grid[start..start + width], goi_window);
            let (polarity, score) = if act < inh {
                (Polarity::Activator, act)
            } else {
                (Polarity::Inhibitor, inh)
            };
            raw_scores[[row, k]] = score;
            raw_polarities[[row, k]] = polarity;
        }
    }

    // Filter: the first minimum must be interior and below the threshold
    let mut survivors = vec![false; n_pool];
    let mut kept_rows = Vec::new();
    for row in 0..n_pool {
        let (m, min_val) = argmin_finite(raw_scores.row(row));
        let interior = if ncols > 2 {
            m > 0 && m < ncols - 1
        } else {
            m == 1
        };
        if min_val.is_finite() && min_val < query.threshold && interior {
            survivors[row] = true;
            kept_rows.push(row);
        }
    }

    let mut scores = Array2::zeros((kept_rows.len(), keep.len()));
    let mut gene_indices = Vec::with_capacity(kept_rows.len());
    let mut calls = Vec::with_capacity(kept_rows.len());
    for (r, &row) in kept_rows.iter().enumerate() {
        scores
            .row_mut(r)
            .assign(&raw_scores.slice(s![row, keep.clone()]));
        gene_indices.push(query.pool[row]);

        // Resolve polarity over the reported columns; later minima win ties
        let mut min_val = f64::INFINITY;
        for j in keep.clone() {
            let v = raw_scores[[row, j]];
            if v < min_val {
                min_val = v;
            }
        }
        let mut polarity = raw_polarities[[row, keep.start]];
        let mut delay = delays[keep.start];
        for j in keep.clone() {
            if raw_scores[[row, j]] == min_val {
                polarity = raw_polarities[[row, j]];
                delay = delays[j];
            }
        }
        calls.push(CandidateCall {
            gene_index: query.pool[row],
            polarity,
            delay,
            score: min_val,
        });
    }

    info!(
        "{} of {} candidates survive filtering (threshold {})",
        calls.len(),
        n_pool,
        query.threshold
    );

    Ok(AlignmentResult {
        step,
        table: DissimilarityTable {
            delays: delays[keep].to_vec(),
            gene_indices,
            scores,
        },
        calls,
        survivors,
    })
}

/// Mean absolute difference and mean absolute sum over a window
fn activation_inhibition(candidate: &[f64], reference: &[f64]) -> (f64, f64) {
    let mut act = 0.0;
    let mut inh = 0.0;
    for (c, g) in candidate.iter().zip(reference) {
        act += (c - g).abs();
        inh += (c + g).abs();
    }
    let n = candidate.len() as f64;
    (act / n, inh / n)
}

/// First-occurrence minimum, treating non-finite entries as infinite
fn argmin_finite(row: ArrayView1<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_val = f64::INFINITY;
    for (j, &v) in row.iter().enumerate() {
        if v < best_val {
            best_val = v;
            best = j;
        }
    }
    (best, best_val)
}

fn validate(query: &AlignmentQuery) -> Result<()> {
    let n_intervals = query.scaled_change.ncols();
    if query.time_gaps.len() != n_intervals {
        return Err(TristageError::DimensionMismatch {
            expected: format!("{} time gaps", n_intervals),
            got: format!("{}", query.time_gaps.len()),
        });
    }
    if query.earlier.is_empty() || query.later.is_empty() {
        return Err(TristageError::InvalidInput {
            reason: "Both stage windows must contain at least one change interval".to_string(),
        });
    }
    if query.later.start != query.earlier.end {
        return Err(TristageError::InvalidInput {
            reason: "Stage windows must be adjacent on the time axis".to_string(),
        });
    }
    if query.later.end > n_intervals {
        return Err(TristageError::InvalidInput {
            reason: "Stage windows exceed the time axis".to_string(),
        });
    }
    let n_genes = query.scaled_change.nrows();
    if query.goi >= n_genes {
        return Err(TristageError::InvalidInput {
            reason: format!("Gene row {} is out of range", query.goi),
        });
    }
    if let Some(&bad) = query.pool.iter().find(|&&g| g >= n_genes) {
        return Err(TristageError::InvalidInput {
            reason: format!("Candidate row {} is out of range", bad),
        });
    }
    if !query.threshold.is_finite() || query.threshold <= 0.0 {
        return Err(TristageError::InvalidInput {
            reason: "Dissimilarity threshold must be positive".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn query<'a>(
        scaled_change: &'a Array2<f64>,
        gaps: &'a [i64],
        earlier: Range<usize>,
        later: Range<usize>,
        goi: usize,
        pool: &'a [usize],
        direction: SearchDirection,
        threshold: f64,
    ) -> AlignmentQuery<'a> {
        AlignmentQuery {
            scaled_change: scaled_change.view(),
            time_gaps: gaps,
            earlier,
            later,
            goi,
            pool,
            direction,
            threshold,
        }
    }

    #[test]
    fn test_direction_tokens() {
        assert_eq!(
            "regulators".parse::<SearchDirection>().unwrap(),
            SearchDirection::Regulators
        );
        assert_eq!(
            "Target".parse::<SearchDirection>().unwrap(),
            SearchDirection::Targets
        );
        assert!("upstream".parse::<SearchDirection>().is_err());
    }

    #[test]
    fn test_regulator_search_finds_leading_candidate() {
        // Gene 0 changes one interval before gene 1; time axis [0,3,6,12,24]
        let sn = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
        ];
        let gaps = [3, 3, 6, 12];
        let pool = [0usize];
        let q = query(&sn, &gaps, 0..1, 1..2, 1, &pool, SearchDirection::Regulators, 0.4);

        let result = compute_dissimilarity(&q).unwrap();
        assert_eq!(result.step, 3);
        assert_eq!(result.survivors, vec![true]);
        assert_eq!(result.table.delays, vec![3]);
        assert_eq!(
            result.calls,
            vec![CandidateCall {
                gene_index: 0,
                polarity: Polarity::Activator,
                delay: 3,
                score: 0.0,
            }]
        );
    }

    #[test]
    fn test_target_search_finds_lagging_candidate() {
        let sn = array![
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
        ];
        let gaps = [3, 3, 6, 12];
        let pool = [1usize];
        let q = query(&sn, &gaps, 0..1, 1..2, 0, &pool, SearchDirection::Targets, 0.4);

        let result = compute_dissimilarity(&q).unwrap();
        assert_eq!(result.survivors, vec![true]);
        assert_eq!(result.calls[0].gene_index, 1);
        assert_eq!(result.calls[0].polarity, Polarity::Activator);
        assert_eq!(result.calls[0].delay, 3);
    }

    #[test]
    fn test_sign_flip_swaps_polarity_not_score() {
        // Uniform grid, three intervals per stage, candidate matches the
        // gene of interest two steps ahead
        let sn = array![
            [1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0, -1.0, 0.0],
            [0.0, 0.0, -1.0, 0.0, 1.0, 0.0],
        ];
        let gaps = [1i64; 6];
        let pool = [1usize, 2];
        let q = query(&sn, &gaps, 0..3, 3..6, 0, &pool, SearchDirection::Targets, 0.4);

        let result = compute_dissimilarity(&q).unwrap();
        assert_eq!(result.table.delays, vec![1, 2]);
        assert_eq!(result.survivors, vec![true, true]);
        assert_eq!(result.table.scores.row(0), result.table.scores.row(1));

        assert_eq!(result.calls[0].polarity, Polarity::Activator);
        assert_eq!(result.calls[1].polarity, Polarity::Inhibitor);
        assert_eq!(result.calls[0].delay, 2);
        assert_eq!(result.calls[1].delay, 2);
        assert_eq!(result.calls[0].score, 0.0);
        assert_eq!(result.calls[1].score, 0.0);
    }

    #[test]
    fn test_activation_inhibition_swap_under_negation() {
        let x = [0.5, -1.0, 0.25];
        let neg: Vec<f64> = x.iter().map(|v| -v).collect();
        let y = [1.0, 0.5, -0.75];

        let (act, inh) = activation_inhibition(&x, &y);
        let (act_neg, inh_neg) = activation_inhibition(&neg, &y);
        assert_eq!(act, inh_neg);
        assert_eq!(inh, act_neg);
    }

    #[test]
    fn test_boundary_minimum_never_survives() {
        // Candidate 1 matches only at shift zero, candidate 2 only at the
        // largest shift; both minima are exactly zero
        let sn = array![
            [1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
            [1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0, -1.0],
        ];
        let gaps = [1i64; 6];
        let pool = [1usize, 2];
        let q = query(&sn, &gaps, 0..3, 3..6, 0, &pool, SearchDirection::Targets, 0.4);

        let result = compute_dissimilarity(&q).unwrap();
        assert_eq!(result.survivors, vec![false, false]);
        assert!(result.calls.is_empty());
        assert_eq!(result.table.n_candidates(), 0);
    }

    #[test]
    fn test_threshold_gates_interior_minimum() {
        let sn = array![
            [1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        ];
        let gaps = [1i64; 6];
        let pool = [1usize];

        let loose = query(&sn, &gaps, 0..3, 3..6, 0, &pool, SearchDirection::Targets, 0.4);
        let result = compute_dissimilarity(&loose).unwrap();
        assert_eq!(result.survivors, vec![true]);
        assert_eq!(result.calls[0].polarity, Polarity::Activator);
        assert_eq!(result.calls[0].delay, 1);

        let tight = query(&sn, &gaps, 0..3, 3..6, 0, &pool, SearchDirection::Targets, 0.2);
        let result = compute_dissimilarity(&tight).unwrap();
        assert_eq!(result.survivors, vec![false]);
    }

    #[test]
    fn test_degenerate_candidate_never_survives() {
        let nan = f64::NAN;
        let sn = array![
            [1.0, 0.0, -1.0, 0.0, 0.0, 0.0],
            [nan, nan, nan, nan, nan, nan],
        ];
        let gaps = [1i64; 6];
        let pool = [1usize];
        let q = query(&sn, &gaps, 0..3, 3..6, 0, &pool, SearchDirection::Targets, 0.4);

        let result = compute_dissimilarity(&q).unwrap();
        assert_eq!(result.survivors, vec![false]);
    }

    #[test]
    fn test_empty_pool_short_circuits() {
        let sn = array![[1.0, 0.0, -1.0, 0.0, 0.0, 0.0]];
        let gaps = [1i64; 6];
        let pool: [usize; 0] = [];
        let q = query(&sn, &gaps, 0..3, 3..6, 0, &pool, SearchDirection::Targets, 0.4);

        let result = compute_dissimilarity(&q).unwrap();
        assert!(result.survivors.is_empty());
        assert_eq!(result.table.n_candidates(), 0);
        assert_eq!(result.table.n_delays(), 2);
        assert_eq!(result.table.delays, vec![1, 2]);
    }

    #[test]
    fn test_malformed_windows_rejected() {
        let sn = array![[1.0, 0.0, -1.0, 0.0, 0.0, 0.0]];
        let gaps = [1i64; 6];
        let pool = [0usize];

        let gap_between = query(&sn, &gaps, 0..2, 3..6, 0, &pool, SearchDirection::Targets, 0.4);
        assert!(compute_dissimilarity(&gap_between).is_err());

        let empty_side = query(&sn, &gaps, 0..0, 0..6, 0, &pool, SearchDirection::Targets, 0.4);
        assert!(compute_dissimilarity(&empty_side).is_err());
    }
}
