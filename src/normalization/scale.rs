//! Row-wise normalization and change-rate transforms

use ndarray::{Array2, ArrayView2, Axis};

use crate::data::TimeCourse;
use crate::error::{Result, TristageError};

/// Subtract each row's mean from that row
pub fn center_rows(m: ArrayView2<f64>) -> Array2<f64> {
    let mut out = m.to_owned();
    if m.ncols() == 0 {
        return out;
    }
    let n = m.ncols() as f64;
    for mut row in out.axis_iter_mut(Axis(0)) {
        let mean = row.sum() / n;
        row.mapv_inplace(|x| x - mean);
    }
    out
}

/// Center each row and scale it to unit standard deviation
///
/// Uses the sample (N-1) divisor. A constant row divides by zero and maps to
/// NaN; callers must tolerate or exclude such rows, they are not repaired
/// here.
pub fn zscore_rows(m: ArrayView2<f64>) -> Array2<f64> {
    let mut out = center_rows(m);
    let n = m.ncols();
    if n < 2 {
        out.fill(f64::NAN);
        return out;
    }
    let denom = (n - 1) as f64;
    for mut row in out.axis_iter_mut(Axis(0)) {
        let ss: f64 = row.iter().map(|&x| x * x).sum();
        let sd = (ss / denom).sqrt();
        row.mapv_inplace(|x| x / sd);
    }
    out
}

/// Per-interval, time-scaled first differences of `g`
///
/// Output has one column per consecutive time-point pair: column j holds
/// (g[j+1] - g[j]) / (t[j+1] - t[j]) for every gene.
pub fn change_rates(g: ArrayView2<f64>, time: &[i64]) -> Result<Array2<f64>> {
    let (n_genes, t_len) = g.dim();

    if time.len() != t_len {
        return Err(TristageError::DimensionMismatch {
            expected: format!("{} time values", t_len),
            got: format!("{} time values", time.len()),
        });
    }
    if t_len < 2 {
        return Err(TristageError::InvalidTimeAxis {
            reason: "Change rates require at least 2 time points".to_string(),
        });
    }

    let mut out = Array2::zeros((n_genes, t_len - 1));
    for j in 0..t_len - 1 {
        let gap = time[j + 1] - time[j];
        if gap <= 0 {
            return Err(TristageError::InvalidTimeAxis {
                reason: format!(
                    "Time points must be strictly increasing, got {} then {}",
                    time[j],
                    time[j + 1]
                ),
            });
        }
        let gap = gap as f64;
        for i in 0..n_genes {
            out[[i, j]] = (g[[i, j + 1]] - g[[i, j]]) / gap;
        }
    }

    Ok(out)
}

/// Divide each row by its maximum absolute finite value
///
/// Puts every gene's change pattern on the same [-1, 1] scale. Rows without
/// a positive maximum (all-zero or NaN) stay undefined.
pub fn scale_rows_to_unit(s: ArrayView2<f64>) -> Array2<f64> {
    let mut out = s.to_owned();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max_abs = row
            .iter()
            .filter(|x| x.is_finite())
            .fold(0.0_f64, |acc, &x| acc.max(x.abs()));
        row.mapv_inplace(|x| x / max_abs);
    }
    out
}

/// Quantize a scaled-change matrix to {-1, 0, 1} via a symmetric cutoff
///
/// NaN entries propagate so degenerate genes stay excluded from scoring in
/// thresholded runs as well.
pub fn threshold_pattern(sn: ArrayView2<f64>, threshold: f64) -> Array2<f64> {
    sn.mapv(|x| {
        if x.is_nan() {
            f64::NAN
        } else if x > threshold {
            1.0
        } else if x < -threshold {
            -1.0
        } else {
            0.0
        }
    })
}

/// Compute and store the normalized expression (g), change rates (s) and
/// unit-scaled change rates (sn) on the dataset
pub fn normalize(tc: &mut TimeCourse) -> Result<()> {
    let g = zscore_rows(tc.expression().values());

    let degenerate = g
        .axis_iter(Axis(0))
        .filter(|row| row.iter().any(|x| !x.is_finite()))
        .count();
    if degenerate > 0 {
        log::warn!(
            "{} gene(s) have constant expression; their normalized rows are undefined \
             and will not survive interaction scoring",
            degenerate
        );
    }

    let s = change_rates(g.view(), tc.time())?;
    let sn = scale_rows_to_unit(s.view());

    log::debug!(
        "Normalized {} genes: expression {}x{}, change rates {}x{}",
        tc.n_genes(),
        g.nrows(),
        g.ncols(),
        s.nrows(),
        s.ncols()
    );

    tc.set_normalized(g)?;
    tc.set_change(s)?;
    tc.set_scaled_change(sn)?;
    Ok(())
}
