//! Seeded k-means clustering with multi-restart search

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::error::{Result, TristageError};

/// Iteration cap for a single k-means run
pub const DEFAULT_MAX_ITER: usize = 100;

/// Result of a single k-means fit
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster centroids (k x n_features)
    pub centroids: Array2<f64>,
    /// Cluster index per input row
    pub assignments: Vec<usize>,
    /// Total within-cluster squared distance
    pub inertia: f64,
}

fn squared_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Nearest centroid by squared distance; ties go to the lowest cluster index
fn nearest_centroid(point: ArrayView1<f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (c, centroid) in centroids.axis_iter(Axis(0)).enumerate() {
        let d = squared_dist(point, centroid);
        if d < best_dist {
            best_dist = d;
            best = c;
        }
    }
    (best, best_dist)
}

/// Spread initial centroids by squared-distance weighting (k-means++ style)
fn init_centroids(data: ArrayView2<f64>, k: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = data.nrows();
    let mut centroids = Array2::zeros((k, data.ncols()));

    let first = rng.gen_range(0..n);
    centroids.row_mut(0).assign(&data.row(first));

    for c in 1..k {
        let dists: Vec<f64> = (0..n)
            .map(|i| {
                let mut min_dist = f64::INFINITY;
                for prev in 0..c {
                    let d = squared_dist(data.row(i), centroids.row(prev));
                    if d < min_dist {
                        min_dist = d;
                    }
                }
                min_dist
            })
            .collect();

        let total: f64 = dists.iter().sum();
        let chosen = if total <= f64::EPSILON {
            // All points coincide with an existing centroid
            rng.gen_range(0..n)
        } else {
            let threshold = rng.gen_range(0.0..total);
            let mut cumulative = 0.0;
            let mut chosen = n - 1;
            for (i, d) in dists.iter().enumerate() {
                cumulative += d;
                if cumulative >= threshold {
                    chosen = i;
                    break;
                }
            }
            chosen
        };
        centroids.row_mut(c).assign(&data.row(chosen));
    }

    centroids
}

/// Run one k-means fit with the supplied RNG
///
/// Identical data, `k` and RNG state produce identical results.
pub fn kmeans(
    data: ArrayView2<f64>,
    k: usize,
    max_iter: usize,
    rng: &mut StdRng,
) -> Result<KmeansFit> {
    let n = data.nrows();

    if k == 0 {
        return Err(TristageError::ClusteringFailed {
            reason: "Cluster count must be positive".to_string(),
        });
    }
    if n < k {
        return Err(TristageError::ClusteringFailed {
            reason: format!("Cannot split {} rows into {} clusters", n, k),
        });
    }
    if data.iter().any(|x| !x.is_finite()) {
        return Err(TristageError::ClusteringFailed {
            reason: "Clustering input contains non-finite values".to_string(),
        });
    }

    let mut centroids = init_centroids(data, k, rng);
    // Sentinel assignment forces a centroid update on the first pass
    let mut assignments = vec![usize::MAX; n];

    // At least one pass so every row gets a valid assignment
    for _ in 0..max_iter.max(1) {
        let mut changed = false;
        for (i, point) in data.axis_iter(Axis(0)).enumerate() {
            let (nearest, _) = nearest_centroid(point, &centroids);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        // Recompute centroids; an emptied cluster keeps its previous position
        let mut sums = Array2::<f64>::zeros((k, data.ncols()));
        let mut counts = vec![0usize; k];
        for (i, point) in data.axis_iter(Axis(0)).enumerate() {
            let c = assignments[i];
            counts[c] += 1;
            let mut sum_row = sums.row_mut(c);
            sum_row += &point;
        }
        for c in 0..k {
            if counts[c] > 0 {
                let scale = 1.0 / counts[c] as f64;
                let mut centroid = centroids.row_mut(c);
                centroid.assign(&sums.row(c));
                centroid.mapv_inplace(|x| x * scale);
            }
        }
    }

    let inertia = data
        .axis_iter(Axis(0))
        .enumerate()
        .map(|(i, point)| squared_dist(point, centroids.row(assignments[i])))
        .sum();

    Ok(KmeansFit {
        centroids,
        assignments,
        inertia,
    })
}

/// Repeat seeded k-means and keep the fit with minimum inertia
///
/// Restart `r` seeds its own RNG from `seed + r`, so the search is
/// reproducible and parallelizable. Exact inertia ties resolve to the
/// earliest restart.
pub fn kmeans_restarts(
    data: ArrayView2<f64>,
    k: usize,
    restarts: usize,
    max_iter: usize,
    seed: u64,
) -> Result<KmeansFit> {
    let reduced = (0..restarts)
        .into_par_iter()
        .map(|r| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(r as u64));
            kmeans(data, k, max_iter, &mut rng).map(|fit| (r, fit))
        })
        .try_reduce_with(|a, b| {
            if b.1.inertia < a.1.inertia || (b.1.inertia == a.1.inertia && b.0 < a.0) {
                Ok(b)
            } else {
                Ok(a)
            }
        });

    match reduced {
        Some(best) => Ok(best?.1),
        None => Err(TristageError::ClusteringFailed {
            reason: "At least one restart is required".to_string(),
        }),
    }
}

/// Assign rows to fixed centroids
///
/// A single deterministic pass with no iteration, for reusing centroids from
/// an earlier run.
pub fn assign_to_centroids(data: ArrayView2<f64>, centroids: ArrayView2<f64>) -> Result<KmeansFit> {
    if centroids.nrows() == 0 {
        return Err(TristageError::ClusteringFailed {
            reason: "No centroids supplied".to_string(),
        });
    }
    if data.ncols() != centroids.ncols() {
        return Err(TristageError::DimensionMismatch {
            expected: format!("{} columns", centroids.ncols()),
            got: format!("{} columns", data.ncols()),
        });
    }

    let centroids = centroids.to_owned();
    let mut assignments = Vec::with_capacity(data.nrows());
    let mut inertia = 0.0;
    for point in data.axis_iter(Axis(0)) {
        let (nearest, dist) = nearest_centroid(point, &centroids);
        assignments.push(nearest);
        inertia += dist;
    }

    Ok(KmeansFit {
        centroids,
        assignments,
        inertia,
    })
}
