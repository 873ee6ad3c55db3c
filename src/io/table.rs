//! Delimited-text reading and writing for matrices and gene lists

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use ndarray::{Array2, ArrayView2};

use crate::align::AlignmentResult;
use crate::data::{ExpressionMatrix, TimeCourse};
use crate::error::{Result, TristageError};

/// Strip surrounding quotes from a string
fn strip_quotes(s: &str) -> String {
    let s = s.trim();
    if (s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')) {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

/// Read an expression matrix from a delimited text file
///
/// Expected format: first column is gene IDs, first row holds one integer
/// time value per sample column. Tab and comma delimiters are detected from
/// the header; columns need not arrive time-sorted.
pub fn read_expression_matrix<P: AsRef<Path>>(path: P) -> Result<ExpressionMatrix> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header_line = lines
        .next()
        .ok_or_else(|| TristageError::EmptyData {
            reason: "Empty expression file".to_string(),
        })??;

    // Detect delimiter
    let delimiter = if header_line.contains('\t') { '\t' } else { ',' };

    let header: Vec<&str> = header_line.split(delimiter).collect();
    if header.len() < 2 {
        return Err(TristageError::InvalidExpressionMatrix {
            reason: "Not enough columns in header".to_string(),
        });
    }

    let time: Result<Vec<i64>> = header[1..]
        .iter()
        .map(|s| {
            let val = strip_quotes(s.trim());
            val.parse::<i64>().map_err(|_| TristageError::InvalidTimeAxis {
                reason: format!("Non-integer time point '{}'", val),
            })
        })
        .collect();
    let time = time?;
    let n_timepoints = time.len();

    let mut gene_ids: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for line in lines {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split(delimiter).collect();
        if fields.len() != n_timepoints + 1 {
            return Err(TristageError::InvalidExpressionMatrix {
                reason: format!(
                    "Row has {} columns, expected {}",
                    fields.len(),
                    n_timepoints + 1
                ),
            });
        }

        gene_ids.push(strip_quotes(fields[0].trim()));

        let row: Result<Vec<f64>> = fields[1..]
            .iter()
            .map(|s| {
                let val = strip_quotes(s.trim());
                val.parse::<f64>()
                    .map_err(|_| TristageError::InvalidExpressionMatrix {
                        reason: format!("Invalid expression value: {}", val),
                    })
            })
            .collect();
        rows.push(row?);
    }

    if gene_ids.is_empty() {
        return Err(TristageError::EmptyData {
            reason: "No genes found in expression file".to_string(),
        });
    }

    let n_genes = gene_ids.len();
    let mut values = Array2::zeros((n_genes, n_timepoints));
    for (i, row) in rows.iter().enumerate() {
        for (j, &val) in row.iter().enumerate() {
            values[[i, j]] = val;
        }
    }

    ExpressionMatrix::new(values, gene_ids, time)
}

/// Read a transcription-factor list, one gene identifier per line
pub fn read_tf_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);

    let mut ids = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let id = strip_quotes(line.trim());
        if id.is_empty() {
            continue;
        }
        ids.push(id);
    }

    if ids.is_empty() {
        return Err(TristageError::EmptyData {
            reason: "No identifiers found in TF list".to_string(),
        });
    }
    Ok(ids)
}

/// Write per-gene stage labels to a TSV file
pub fn write_stage_table<P: AsRef<Path>>(path: P, dataset: &TimeCourse) -> Result<()> {
    let stages = dataset
        .stage_assignment()
        .ok_or_else(|| TristageError::InvalidInput {
            reason: "Stage labels are missing; run stage classification first".to_string(),
        })?;

    let mut file = File::create(path)?;
    writeln!(file, "gene_id\tstage\tstage_name\tis_tf")?;
    for (i, gene_id) in dataset.gene_ids().iter().enumerate() {
        let stage = stages.stage_of(i);
        writeln!(
            file,
            "{}\t{}\t{}\t{}",
            gene_id,
            stage.as_number(),
            stage.name(),
            dataset.annotation().is_tf(i)
        )?;
    }
    Ok(())
}

/// Write accepted interactions to a TSV file
pub fn write_interactions<P: AsRef<Path>>(
    path: P,
    dataset: &TimeCourse,
    calls: &[crate::align::CandidateCall],
) -> Result<()> {
    let mut file = File::create(path)?;
    writeln!(file, "gene_id\tpolarity\tdelay\tscore")?;
    for call in calls {
        writeln!(
            file,
            "{}\t{}\t{}\t{:.6}",
            dataset.gene_ids()[call.gene_index],
            call.polarity,
            call.delay,
            call.score
        )?;
    }
    Ok(())
}

/// Write a dissimilarity table with delays in real time units as headers
pub fn write_dissimilarity_table<P: AsRef<Path>>(
    path: P,
    dataset: &TimeCourse,
    result: &AlignmentResult,
) -> Result<()> {
    let mut file = File::create(path)?;

    let labels: Vec<String> = result
        .table
        .delays
        .iter()
        .map(|d| format!("delay_{}", d))
        .collect();
    writeln!(file, "gene_id\t{}", labels.join("\t"))?;

    for (row, &gene) in result.table.gene_indices.iter().enumerate() {
        let scores: Vec<String> = result
            .table
            .scores
            .row(row)
            .iter()
            .map(|v| format!("{:.6}", v))
            .collect();
        writeln!(file, "{}\t{}", dataset.gene_ids()[gene], scores.join("\t"))?;
    }
    Ok(())
}

/// Write a genes x columns matrix with the given column labels
pub fn write_matrix<P: AsRef<Path>>(
    path: P,
    gene_ids: &[String],
    matrix: ArrayView2<f64>,
    column_labels: &[String],
) -> Result<()> {
    if matrix.nrows() != gene_ids.len() || matrix.ncols() != column_labels.len() {
        return Err(TristageError::DimensionMismatch {
            expected: format!("{} x {} matrix", gene_ids.len(), column_labels.len()),
            got: format!("{} x {}", matrix.nrows(), matrix.ncols()),
        });
    }

    let mut file = File::create(path)?;
    writeln!(file, "gene_id\t{}", column_labels.join("\t"))?;
    for (i, gene_id) in gene_ids.iter().enumerate() {
        let row: Vec<String> = matrix.row(i).iter().map(|v| format!("{:.6}", v)).collect();
        writeln!(file, "{}\t{}", gene_id, row.join("\t"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_expression_matrix() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene_id\t0\t3\t6").unwrap();
        writeln!(file, "gene1\t1.5\t2.0\t4.0").unwrap();
        writeln!(file, "gene2\t0.0\t1.0\t0.5").unwrap();

        let matrix = read_expression_matrix(file.path()).unwrap();
        assert_eq!(matrix.n_genes(), 2);
        assert_eq!(matrix.n_timepoints(), 3);
        assert_eq!(matrix.time(), &[0, 3, 6]);
    }

    #[test]
    fn test_read_expression_matrix_sorts_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene_id,6,0,3").unwrap();
        writeln!(file, "gene1,4.0,1.0,2.0").unwrap();

        let matrix = read_expression_matrix(file.path()).unwrap();
        assert_eq!(matrix.time(), &[0, 3, 6]);
        assert_eq!(matrix.gene_values(0).to_vec(), vec![1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_read_expression_matrix_rejects_non_integer_time() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene_id\t0\tearly\t6").unwrap();
        writeln!(file, "gene1\t1.0\t2.0\t3.0").unwrap();

        let err = read_expression_matrix(file.path()).unwrap_err();
        assert!(matches!(err, TristageError::InvalidTimeAxis { .. }));
    }

    #[test]
    fn test_read_expression_matrix_rejects_ragged_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "gene_id\t0\t3").unwrap();
        writeln!(file, "gene1\t1.0").unwrap();

        assert!(read_expression_matrix(file.path()).is_err());
    }

    #[test]
    fn test_read_tf_list() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "g1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "\"g3\"").unwrap();

        let ids = read_tf_list(file.path()).unwrap();
        assert_eq!(ids, vec!["g1".to_string(), "g3".to_string()]);
    }

    #[test]
    fn test_write_matrix_shape_checked() {
        let file = NamedTempFile::new().unwrap();
        let matrix = ndarray::array![[1.0, 2.0]];
        let ids = vec!["g1".to_string()];
        let labels = vec!["0".to_string()];
        assert!(write_matrix(file.path(), &ids, matrix.view(), &labels).is_err());
    }
}
