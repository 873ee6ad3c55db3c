//! Iterative least-active-cluster extraction over stage windows

use std::fmt;

use log::{debug, info};
use ndarray::{s, Array2, Axis};
use serde::Serialize;

use crate::cluster::{assign_to_centroids, kmeans_restarts, KmeansFit, DEFAULT_MAX_ITER};
use crate::data::TimeCourse;
use crate::error::{Result, TristageError};
use crate::normalization::center_rows;

use super::{Stage, StageAssignment, StageWindows};

/// Default cluster count per stage window
pub const DEFAULT_CLUSTERS: usize = 3;

/// Default number of clustering restarts
pub const DEFAULT_RESTARTS: usize = 1000;

/// Parameters for stage classification
#[derive(Debug, Clone)]
pub struct StageParams {
    /// 1-based time-point index ending the initiation window
    pub boundary: usize,
    /// Number of change intervals given to the primary response
    pub primary_intervals: usize,
    /// Cluster count for the initiation window
    pub clusters_initiation: usize,
    /// Cluster count for the primary-response window
    pub clusters_primary: usize,
    /// Clustering restarts per window
    pub restarts: usize,
    /// Base seed for the restart search
    pub seed: u64,
    /// Fixed centroids reused for the initiation window, bypassing the search
    pub centroids_initiation: Option<Array2<f64>>,
    /// Fixed centroids reused for the primary-response window
    pub centroids_primary: Option<Array2<f64>>,
}

impl Default for StageParams {
    fn default() -> Self {
        StageParams {
            boundary: 2,
            primary_intervals: 1,
            clusters_initiation: DEFAULT_CLUSTERS,
            clusters_primary: DEFAULT_CLUSTERS,
            restarts: DEFAULT_RESTARTS,
            seed: 0,
            centroids_initiation: None,
            centroids_primary: None,
        }
    }
}

/// One cluster from a classification round
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    /// Cluster index within the round
    pub cluster: usize,
    /// Genes assigned to the cluster
    pub n_genes: usize,
    /// Transcription factors among them
    pub n_tf: usize,
    /// Largest absolute value of the mean-centered cluster pattern
    pub pattern_norm: f64,
    /// Whether this cluster was promoted to the next stage
    pub quiescent: bool,
}

/// One clustering round over a stage window
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringRound {
    /// Stage whose window was clustered
    pub stage: usize,
    /// Width of the window in time points
    pub window_points: usize,
    /// Genes entering the round
    pub n_genes: usize,
    /// Genes promoted to the next stage
    pub promoted: usize,
    /// Total within-cluster squared distance of the winning fit
    pub inertia: f64,
    pub clusters: Vec<ClusterSummary>,
    /// Fitted centroids, reusable for a later run
    #[serde(skip)]
    pub centroids: Array2<f64>,
}

/// Outcome of stage classification
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Gene counts per stage in temporal order
    pub histogram: [usize; 3],
    pub rounds: Vec<ClusteringRound>,
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stage assignment")?;
        writeln!(f, "  initiation:         {}", self.histogram[0])?;
        writeln!(f, "  primary response:   {}", self.histogram[1])?;
        writeln!(f, "  secondary response: {}", self.histogram[2])?;
        for round in &self.rounds {
            writeln!(
                f,
                "Round on stage-{} window ({} time points): promoted {} of {} genes",
                round.stage, round.window_points, round.promoted, round.n_genes
            )?;
            for cluster in &round.clusters {
                writeln!(
                    f,
                    "  cluster {}: {} genes ({} TF), pattern norm {:.4}{}",
                    cluster.cluster + 1,
                    cluster.n_genes,
                    cluster.n_tf,
                    cluster.pattern_norm,
                    if cluster.quiescent { " [quiescent]" } else { "" }
                )?;
            }
        }
        Ok(())
    }
}

/// Assign every gene an ordered stage label
///
/// Genes start in the earliest stage with a nonempty window. Each round
/// clusters the centered expression of that stage's genes over its window
/// and promotes the least-active cluster to the next stage; the
/// primary-response round then repeats the extraction on the promoted
/// genes. Rounds whose window is narrower than two time points are
/// skipped. The final assignment is stored on the dataset.
pub fn classify_stages(dataset: &mut TimeCourse, params: &StageParams) -> Result<StageReport> {
    let windows = StageWindows::new(params.boundary, params.primary_intervals, dataset.n_timepoints())?;

    info!(
        "Classifying {} genes into stages (boundary {}, {} primary intervals)",
        dataset.n_genes(),
        params.boundary,
        params.primary_intervals
    );
    debug!(
        "Interval windows: initiation {:?}, primary {:?}, secondary {:?}",
        windows.interval_range(Stage::Initiation),
        windows.interval_range(Stage::PrimaryResponse),
        windows.interval_range(Stage::SecondaryResponse)
    );

    let mut labels = vec![windows.earliest_stage(); dataset.n_genes()];
    let mut rounds = Vec::new();

    let round_specs = [
        (
            Stage::Initiation,
            params.clusters_initiation,
            params.centroids_initiation.as_ref(),
        ),
        (
            Stage::PrimaryResponse,
            params.clusters_primary,
            params.centroids_primary.as_ref(),
        ),
    ];

    for (stage, k, centroids) in round_specs {
        if let Some(round) = run_round(dataset, &mut labels, &windows, stage, k, centroids, params)? {
            rounds.push(round);
        }
    }

    let assignment = StageAssignment::new(labels);
    let histogram = assignment.histogram();
    info!(
        "Stage histogram: {} initiation, {} primary, {} secondary",
        histogram[0], histogram[1], histogram[2]
    );
    dataset.set_stages(assignment, windows)?;

    Ok(StageReport { histogram, rounds })
}

fn run_round(
    dataset: &TimeCourse,
    labels: &mut [Stage],
    windows: &StageWindows,
    from: Stage,
    k: usize,
    centroids: Option<&Array2<f64>>,
    params: &StageParams,
) -> Result<Option<ClusteringRound>> {
    let to = match from.later() {
        Some(stage) => stage,
        None => return Ok(None),
    };

    let window = windows.point_range(from);
    if window.len() < 2 {
        info!(
            "Skipping {} clustering: window has {} time points",
            from,
            window.len()
        );
        return Ok(None);
    }

    let pool: Vec<usize> = labels
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == from)
        .map(|(i, _)| i)
        .collect();
    if pool.is_empty() {
        info!("Skipping {} clustering: no genes in stage", from);
        return Ok(None);
    }

    let rows = dataset.expression().values().select(Axis(0), &pool);
    let centered = center_rows(rows.slice(s![.., window.clone()]));

    let fit = match centroids {
        Some(fixed) => {
            info!(
                "Assigning {} genes to {} fixed centroids on the {} window",
                pool.len(),
                fixed.nrows(),
                from
            );
            assign_to_centroids(centered.view(), fixed.view())?
        }
        None => {
            info!(
                "Clustering {} genes on the {} window into {} groups ({} restarts)",
                pool.len(),
                from,
                k,
                params.restarts
            );
            kmeans_restarts(centered.view(), k, params.restarts, DEFAULT_MAX_ITER, params.seed)?
        }
    };

    let k_eff = fit.centroids.nrows();
    let mut counts = vec![0usize; k_eff];
    let mut tf_counts = vec![0usize; k_eff];
    for (i, &gene) in pool.iter().enumerate() {
        let c = fit.assignments[i];
        counts[c] += 1;
        if dataset.annotation().is_tf(gene) {
            tf_counts[c] += 1;
        }
    }

    let norms = centroid_norms(&fit);
    let mut quiescent: Option<(usize, f64)> = None;
    for c in 0..k_eff {
        if counts[c] == 0 {
            continue;
        }
        let better = match quiescent {
            None => true,
            Some((_, best)) => norms[c] < best,
        };
        if better {
            quiescent = Some((c, norms[c]));
        }
    }
    let (quiescent, quiescent_norm) = quiescent.ok_or_else(|| TristageError::ClusteringFailed {
        reason: "All clusters are empty".to_string(),
    })?;

    for (i, &gene) in pool.iter().enumerate() {
        if fit.assignments[i] == quiescent {
            labels[gene] = to;
        }
    }
    let promoted = counts[quiescent];
    debug!(
        "Quiescent cluster {} (pattern norm {:.4}): promoting {} genes to {}",
        quiescent + 1,
        quiescent_norm,
        promoted,
        to
    );

    let clusters = (0..k_eff)
        .map(|c| ClusterSummary {
            cluster: c,
            n_genes: counts[c],
            n_tf: tf_counts[c],
            pattern_norm: norms[c],
            quiescent: c == quiescent,
        })
        .collect();

    Ok(Some(ClusteringRound {
        stage: from.as_number(),
        window_points: window.len(),
        n_genes: pool.len(),
        promoted,
        inertia: fit.inertia,
        clusters,
        centroids: fit.centroids,
    }))
}

/// Largest absolute value of each mean-centered centroid pattern
fn centroid_norms(fit: &KmeansFit) -> Vec<f64> {
    fit.centroids
        .axis_iter(Axis(0))
        .map(|centroid| {
            let mean = centroid.sum() / centroid.len() as f64;
            centroid.iter().map(|x| (x - mean).abs()).fold(0.0, f64::max)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ExpressionMatrix, GeneAnnotation};
    use ndarray::array;

    fn course() -> TimeCourse {
        let values = array![
            [0.0, 10.0, 10.0, 10.0, 10.0],
            [0.0, 0.0, 10.0, 10.0, 10.0],
            [5.0, 5.0, 5.0, 5.0, 5.0],
            [2.0, 2.0, 2.0, 2.0, 2.0],
        ];
        let ids = ["g1", "g2", "g3", "g4"].iter().map(|s| s.to_string()).collect();
        let expression = ExpressionMatrix::new(values, ids, vec![0, 3, 6, 12, 24]).unwrap();
        TimeCourse::new(expression, GeneAnnotation::all_tf(4)).unwrap()
    }

    fn params() -> StageParams {
        StageParams {
            boundary: 2,
            primary_intervals: 1,
            clusters_initiation: 2,
            clusters_primary: 2,
            restarts: 20,
            seed: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_three_stages() {
        let mut tc = course();
        let report = classify_stages(&mut tc, &params()).unwrap();

        let stages = tc.stage_assignment().unwrap();
        assert_eq!(stages.stage_of(0), Stage::Initiation);
        assert_eq!(stages.stage_of(1), Stage::PrimaryResponse);
        assert_eq!(stages.stage_of(2), Stage::SecondaryResponse);
        assert_eq!(stages.stage_of(3), Stage::SecondaryResponse);

        assert_eq!(report.histogram, [1, 1, 2]);
        assert_eq!(report.rounds.len(), 2);
    }

    #[test]
    fn test_flat_cluster_is_quiescent() {
        let mut tc = course();
        let report = classify_stages(&mut tc, &params()).unwrap();

        // Flat genes form an exactly-zero centered pattern, which must win
        // the quiescent selection in every round
        for round in &report.rounds {
            let chosen = round.clusters.iter().find(|c| c.quiescent).unwrap();
            assert_eq!(chosen.pattern_norm, 0.0);
            for cluster in round.clusters.iter().filter(|c| c.n_genes > 0) {
                assert!(cluster.pattern_norm >= chosen.pattern_norm);
            }
        }
    }

    #[test]
    fn test_empty_initiation_window_skips_first_round() {
        let mut tc = course();
        let p = StageParams {
            boundary: 1,
            primary_intervals: 2,
            restarts: 50,
            ..params()
        };
        let report = classify_stages(&mut tc, &p).unwrap();

        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.rounds[0].stage, 2);
        assert_eq!(report.histogram[0], 0);

        let stages = tc.stage_assignment().unwrap();
        assert!(stages.genes_in(Stage::Initiation).is_empty());
        assert_eq!(stages.stage_of(2), Stage::SecondaryResponse);
        assert_eq!(stages.stage_of(3), Stage::SecondaryResponse);
    }

    #[test]
    fn test_missing_primary_window_keeps_promoted_genes() {
        let mut tc = course();
        let p = StageParams {
            primary_intervals: 0,
            ..params()
        };
        let report = classify_stages(&mut tc, &p).unwrap();

        assert_eq!(report.rounds.len(), 1);
        assert_eq!(report.rounds[0].stage, 1);
        assert_eq!(report.histogram, [1, 3, 0]);
    }

    #[test]
    fn test_fixed_centroids_reproduce_assignment() {
        let mut tc = course();
        let p = params();
        let report = classify_stages(&mut tc, &p).unwrap();
        let labels: Vec<Stage> = tc.stage_assignment().unwrap().labels().to_vec();

        let mut tc_reuse = course();
        let reuse = StageParams {
            centroids_initiation: Some(report.rounds[0].centroids.clone()),
            centroids_primary: Some(report.rounds[1].centroids.clone()),
            restarts: 1,
            ..p
        };
        classify_stages(&mut tc_reuse, &reuse).unwrap();

        assert_eq!(tc_reuse.stage_assignment().unwrap().labels(), labels.as_slice());
    }
}
