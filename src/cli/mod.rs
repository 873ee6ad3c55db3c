//! Command-line interface for tristage

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tristage")]
#[command(version)]
#[command(about = "Stage-aware inference of gene regulatory interactions from expression time courses")]
#[command(disable_help_flag = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer regulators or targets of a gene of interest
    #[command(
        about = "Infer regulators or targets of a gene of interest",
        long_about = "Infer regulators or targets of a gene of interest\n\n\
            Runs the complete pipeline: per-gene standardization, change-rate scaling,\n\
            stage assignment by two rounds of clustering, delay-shifted dissimilarity\n\
            alignment against the adjacent stage, and an ensemble vote across denoised\n\
            replicate runs.\n\n\
            Regulator searches scan the stage preceding the gene of interest; target\n\
            searches scan the stage following it and require the gene of interest to be\n\
            a transcription factor.",
        after_long_help = "\
Examples:
  # Targets of a transcription factor assigned to the initiation stage
  tristage infer -e expression.csv -g lhy --tf-list tf_list.txt \\
    -d targets -o lhy_targets.tsv

  # Regulators of a secondary-response gene, with a custom stage layout
  tristage infer -e expression.csv -g prr5 --tf-list tf_list.txt \\
    -d regulators -b 3 -c 2

  # Single unthresholded run instead of the denoised ensemble
  tristage infer -e expression.csv -g lhy -d targets --no-denoise

  # Full JSON report with the trimmed dissimilarity table
  tristage infer -e expression.csv -g lhy -d targets \\
    --report lhy_targets.json --table lhy_table.tsv"
    )]
    Infer {
        /// Path to expression matrix file
        #[arg(short, long,
            long_help = "Path to the expression matrix file.\n\
                Format: first column = gene IDs, remaining columns = one measurement per\n\
                time point, with the header row holding the times as integers.\n\
                Supports both CSV (comma) and TSV (tab) delimiters (auto-detected).")]
        expression: String,

        /// Path to transcription factor list
        #[arg(long, value_name = "FILE",
            long_help = "Path to a transcription factor list with one gene ID per line.\n\
                Genes on the list are treated as transcription factors, all others are not.\n\
                Without this option every gene counts as a transcription factor.")]
        tf_list: Option<String>,

        /// Gene of interest
        #[arg(short, long)]
        gene: String,

        /// Search direction: regulators or targets
        #[arg(short, long,
            long_help = "Search direction relative to the gene of interest.\n\
                regulators: scan the preceding stage for genes acting on the gene of interest\n\
                targets:    scan the following stage for genes the gene of interest acts on\n\
                            (the gene of interest must be a transcription factor)")]
        direction: String,

        /// First time point of the primary response (1-based) [default: 2]
        #[arg(short, long, default_value = "2",
            long_help = "1-based index of the time point at which the primary response begins.\n\
                Measurements before it form the initiation stage.")]
        boundary: usize,

        /// Measurement intervals spanned by the primary response [default: 1]
        #[arg(short = 'c', long, default_value = "1",
            long_help = "Number of inter-measurement intervals covered by the primary response.\n\
                Later intervals form the secondary response stage.")]
        primary_intervals: usize,

        /// Clusters for the initiation-stage round [default: 3]
        #[arg(long, value_name = "K", default_value = "3")]
        clusters_initiation: usize,

        /// Clusters for the primary-response round [default: 3]
        #[arg(long, value_name = "K", default_value = "3")]
        clusters_primary: usize,

        /// Random restarts per clustering round [default: 1000]
        #[arg(long, default_value = "1000")]
        restarts: usize,

        /// Random seed for clustering [default: 0]
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Dissimilarity threshold for candidate calls [default: 0.4]
        #[arg(long, default_value = "0.4",
            long_help = "Dissimilarity threshold a candidate's best score must stay below.\n\
                Scores range from 0 (perfect agreement at some delay) upward, so smaller\n\
                thresholds demand closer alignment.")]
        threshold: f64,

        /// Denoising thresholds for ensemble runs [default: 0.2,0.2]
        #[arg(long, value_name = "T1,T2,...", value_delimiter = ',', default_value = "0.2,0.2",
            long_help = "Denoising thresholds, one ensemble run per value.\n\
                Each run quantizes the scaled change rates to -1/0/+1 at its threshold\n\
                before alignment; an extra run always uses the unquantized data. A\n\
                candidate is accepted when a strict majority of runs agrees on it and\n\
                no run disputes its polarity.")]
        denoise: Vec<f64>,

        /// Single run on the unquantized data only
        #[arg(long,
            long_help = "Skip the denoised replicate runs and call candidates from one\n\
                run on the unquantized scaled change rates.")]
        no_denoise: bool,

        /// Output file path for accepted interactions [default: interactions.tsv]
        #[arg(short, long, default_value = "interactions.tsv")]
        output: String,

        /// Write the trimmed dissimilarity table to this path
        #[arg(long, value_name = "FILE",
            long_help = "Write the trimmed dissimilarity table to this path.\n\
                Rows are pool genes, columns the candidate delays in time units; entries\n\
                are the winning polarity's dissimilarity at that delay.")]
        table: Option<String>,

        /// Write a JSON report to this path
        #[arg(long, value_name = "FILE",
            long_help = "Write a JSON report to this path, covering the query, the\n\
                dissimilarity table, and the accepted interactions.")]
        report: Option<String>,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Assign genes to response stages only
    #[command(
        long_about = "Assign genes to response stages without running an inference query.\n\n\
            Genes start in the earliest stage holding a measurement interval. Clustering\n\
            on the initiation window promotes all but the quiescent cluster to the\n\
            primary response; a second round on the primary window promotes its\n\
            non-quiescent clusters to the secondary response.",
        after_long_help = "\
Examples:
  tristage stages -e expression.csv --tf-list tf_list.txt -o stage_table.tsv
  tristage stages -e expression.csv -b 3 -c 2 --restarts 200 --seed 42"
    )]
    Stages {
        /// Path to expression matrix file
        #[arg(short, long)]
        expression: String,

        /// Path to transcription factor list
        #[arg(long, value_name = "FILE")]
        tf_list: Option<String>,

        /// First time point of the primary response (1-based) [default: 2]
        #[arg(short, long, default_value = "2")]
        boundary: usize,

        /// Measurement intervals spanned by the primary response [default: 1]
        #[arg(short = 'c', long, default_value = "1")]
        primary_intervals: usize,

        /// Clusters for the initiation-stage round [default: 3]
        #[arg(long, value_name = "K", default_value = "3")]
        clusters_initiation: usize,

        /// Clusters for the primary-response round [default: 3]
        #[arg(long, value_name = "K", default_value = "3")]
        clusters_primary: usize,

        /// Random restarts per clustering round [default: 1000]
        #[arg(long, default_value = "1000")]
        restarts: usize,

        /// Random seed for clustering [default: 0]
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Output file path for the stage table [default: stage_table.tsv]
        #[arg(short, long, default_value = "stage_table.tsv")]
        output: String,

        /// Write a JSON report of the clustering rounds to this path
        #[arg(long, value_name = "FILE")]
        report: Option<String>,

        /// Number of threads (0 = auto) [default: 0]
        #[arg(short = 't', long, default_value = "0")]
        threads: usize,
    },

    /// Normalize expression data only
    #[command(
        long_about = "Normalize expression data without stage assignment or inference.\n\n\
            Standardizes each gene to zero mean and unit standard deviation, converts\n\
            the standardized course to per-unit-time change rates over each measurement\n\
            interval, and rescales each gene's change rates to unit maximum magnitude.",
        after_long_help = "\
Examples:
  tristage normalize -e expression.csv -o scaled_change.tsv
  tristage normalize -e expression.csv --zscore zscore.tsv --change change.tsv"
    )]
    Normalize {
        /// Path to expression matrix file
        #[arg(short, long)]
        expression: String,

        /// Output file path for the scaled change-rate matrix [default: scaled_change.tsv]
        #[arg(short, long, default_value = "scaled_change.tsv")]
        output: String,

        /// Write the standardized matrix to this path
        #[arg(long, value_name = "FILE")]
        zscore: Option<String>,

        /// Write the unscaled change-rate matrix to this path
        #[arg(long, value_name = "FILE")]
        change: Option<String>,
    },
}
