//! tristage command-line interface

use clap::Parser;
use log::{info, LevelFilter};

use tristage::cli::{Cli, Commands};
use tristage::prelude::*;

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() {
    let args: Vec<String> = std::env::args().collect();

    // Find the first non-flag argument (potential subcommand)
    let first_positional = args.iter().skip(1).find(|a| !a.starts_with('-'));
    let subcommands = ["infer", "stages", "normalize", "help"];
    let has_subcommand = first_positional
        .map_or(false, |a| subcommands.contains(&a.as_str()));

    if !has_subcommand {
        // No subcommand — handle top-level help/version manually
        if args.len() == 1 {
            print_no_args();
            return;
        }
        if args.iter().any(|a| a == "--help") {
            print_long_help();
            return;
        }
        if args.iter().any(|a| a == "-h") {
            print_short_help();
            return;
        }
        if args.iter().any(|a| a == "-V" || a == "--version") {
            println!("tristage {}", VERSION);
            return;
        }
        // Unknown flags without subcommand — show hint
        print_no_args();
        return;
    }

    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Some(Commands::Infer {
            expression,
            tf_list,
            gene,
            direction,
            boundary,
            primary_intervals,
            clusters_initiation,
            clusters_primary,
            restarts,
            seed,
            threshold,
            denoise,
            no_denoise,
            output,
            table,
            report,
            threads,
        }) => run_infer(
            &expression,
            tf_list.as_deref(),
            &gene,
            &direction,
            boundary,
            primary_intervals,
            clusters_initiation,
            clusters_primary,
            restarts,
            seed,
            threshold,
            &denoise,
            no_denoise,
            &output,
            table.as_deref(),
            report.as_deref(),
            threads,
        ),
        Some(Commands::Stages {
            expression,
            tf_list,
            boundary,
            primary_intervals,
            clusters_initiation,
            clusters_primary,
            restarts,
            seed,
            output,
            report,
            threads,
        }) => run_stages(
            &expression,
            tf_list.as_deref(),
            boundary,
            primary_intervals,
            clusters_initiation,
            clusters_primary,
            restarts,
            seed,
            &output,
            report.as_deref(),
            threads,
        ),
        Some(Commands::Normalize {
            expression,
            output,
            zscore,
            change,
        }) => run_normalize(&expression, &output, zscore.as_deref(), change.as_deref()),
        None => {
            // Should not reach here (handled above), but just in case
            print_no_args();
            return;
        }
    };

    if let Err(e) = result {
        // A query the stage layout rules out is an answer, not a failure
        if matches!(e, TristageError::InfeasibleQuery { .. }) {
            println!("{}", e);
            return;
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Custom help output
// ---------------------------------------------------------------------------

fn print_no_args() {
    println!("tristage v{}", VERSION);
    println!("Run `tristage -h` for usage or `tristage --help` for detailed information.");
}

fn print_short_help() {
    println!("tristage v{}", VERSION);
    println!();
    println!("Usage: tristage <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  infer      Infer regulators or targets of a gene of interest");
    println!("  stages     Assign genes to response stages only");
    println!("  normalize  Normalize expression data only");
    println!();
    println!("Run `tristage <COMMAND> -h` for command-specific options.");
}

fn print_long_help() {
    println!("tristage v{}", VERSION);
    println!("Stage-aware inference of gene regulatory interactions from expression time courses");
    println!();
    println!("Usage: tristage <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  infer      Infer regulators or targets of a gene of interest");
    println!("               - delay-shifted dissimilarity alignment between adjacent stages");
    println!("               - activator/inhibitor polarity from signed agreement");
    println!("               - majority vote across denoised ensemble runs");
    println!("               - TSV interaction tables and JSON reports");
    println!("  stages     Assign genes to initiation / primary / secondary response stages");
    println!("  normalize  Standardize expression, derive change rates, rescale per gene");
    println!();
    println!("Global Options:");
    println!("  -v, --verbose    Enable verbose output");
    println!("  -h               Print short help");
    println!("      --help       Print detailed help");
    println!("  -V, --version    Print version");
    println!();
    println!("Examples:");
    println!("  tristage infer -e expression.csv --tf-list tf_list.txt \\");
    println!("    -g lhy -d targets -o lhy_targets.tsv");
    println!();
    println!("  tristage infer -e expression.csv -g prr5 -d regulators -b 3 -c 2");
    println!();
    println!("  tristage stages -e expression.csv --tf-list tf_list.txt -o stage_table.tsv");
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn load_dataset(expression_path: &str, tf_list_path: Option<&str>) -> Result<TimeCourse> {
    info!("Loading expression matrix from: {}", expression_path);
    let expression = read_expression_matrix(expression_path)?;
    info!(
        "  {} genes, {} time points",
        expression.n_genes(),
        expression.n_timepoints()
    );

    let annotation = match tf_list_path {
        Some(path) => {
            info!("Loading transcription factor list from: {}", path);
            let tf_ids = read_tf_list(path)?;
            let annotation = GeneAnnotation::from_tf_list(expression.gene_ids(), &tf_ids);
            info!(
                "  {} of {} genes annotated as transcription factors",
                annotation.n_tf(),
                expression.n_genes()
            );
            annotation
        }
        None => GeneAnnotation::all_tf(expression.n_genes()),
    };

    TimeCourse::new(expression, annotation)
}

#[allow(clippy::too_many_arguments)]
fn run_infer(
    expression_path: &str,
    tf_list_path: Option<&str>,
    gene: &str,
    direction: &str,
    boundary: usize,
    primary_intervals: usize,
    clusters_initiation: usize,
    clusters_primary: usize,
    restarts: usize,
    seed: u64,
    threshold: f64,
    denoise: &[f64],
    no_denoise: bool,
    output_path: &str,
    table_path: Option<&str>,
    report_path: Option<&str>,
    threads: usize,
) -> Result<()> {
    // Configure thread pool
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let direction: SearchDirection = direction.parse()?;

    let mut dataset = load_dataset(expression_path, tf_list_path)?;

    info!("Normalizing expression data...");
    normalize(&mut dataset)?;

    let stage_params = StageParams {
        boundary,
        primary_intervals,
        clusters_initiation,
        clusters_primary,
        restarts,
        seed,
        ..StageParams::default()
    };
    classify_stages(&mut dataset, &stage_params)?;

    let params = InferenceParams {
        threshold,
        denoise_thresholds: if no_denoise { Vec::new() } else { denoise.to_vec() },
    };

    info!("Searching for {} of '{}'...", direction, gene);
    let outcome = infer_interactions(&dataset, gene, direction, &params)?;

    let report = InferenceReport::from_outcome(&dataset, &outcome);

    info!("Writing interactions to: {}", output_path);
    write_interactions(output_path, &dataset, &outcome.interactions)?;

    if let Some(path) = table_path {
        info!("Writing dissimilarity table to: {}", path);
        write_dissimilarity_table(path, &dataset, &outcome.primary)?;
    }

    if let Some(path) = report_path {
        info!("Writing JSON report to: {}", path);
        write_json(path, &report)?;
    }

    // Print summary
    let summary = report.summary();
    println!("\n{}", summary);

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_stages(
    expression_path: &str,
    tf_list_path: Option<&str>,
    boundary: usize,
    primary_intervals: usize,
    clusters_initiation: usize,
    clusters_primary: usize,
    restarts: usize,
    seed: u64,
    output_path: &str,
    report_path: Option<&str>,
    threads: usize,
) -> Result<()> {
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .ok();
    }

    let mut dataset = load_dataset(expression_path, tf_list_path)?;

    let stage_params = StageParams {
        boundary,
        primary_intervals,
        clusters_initiation,
        clusters_primary,
        restarts,
        seed,
        ..StageParams::default()
    };
    let report = classify_stages(&mut dataset, &stage_params)?;

    info!("Writing stage table to: {}", output_path);
    write_stage_table(output_path, &dataset)?;

    if let Some(path) = report_path {
        info!("Writing JSON report to: {}", path);
        write_json(path, &report)?;
    }

    println!("\n{}", report);

    Ok(())
}

fn run_normalize(
    expression_path: &str,
    output_path: &str,
    zscore_path: Option<&str>,
    change_path: Option<&str>,
) -> Result<()> {
    let mut dataset = load_dataset(expression_path, None)?;

    info!("Normalizing expression data...");
    normalize(&mut dataset)?;

    let time = dataset.time();
    let point_labels: Vec<String> = time.iter().map(|t| t.to_string()).collect();
    let interval_labels: Vec<String> = time
        .windows(2)
        .map(|w| format!("{}_{}", w[0], w[1]))
        .collect();

    let scaled = dataset
        .scaled_change()
        .ok_or_else(|| TristageError::EmptyData {
            reason: "Scaled change rates not available".to_string(),
        })?;
    info!("Writing scaled change rates to: {}", output_path);
    write_matrix(output_path, dataset.gene_ids(), scaled.view(), &interval_labels)?;

    if let Some(path) = zscore_path {
        let z = dataset.normalized().ok_or_else(|| TristageError::EmptyData {
            reason: "Standardized matrix not available".to_string(),
        })?;
        info!("Writing standardized matrix to: {}", path);
        write_matrix(path, dataset.gene_ids(), z.view(), &point_labels)?;
    }

    if let Some(path) = change_path {
        let c = dataset.change().ok_or_else(|| TristageError::EmptyData {
            reason: "Change rates not available".to_string(),
        })?;
        info!("Writing change rates to: {}", path);
        write_matrix(path, dataset.gene_ids(), c.view(), &interval_labels)?;
    }

    info!("Done!");
    Ok(())
}
