//! tristage: stage-aware inference of gene regulatory interactions
//!
//! This crate infers activating and inhibiting interactions between genes
//! from a single expression time course. Genes are assigned to three response
//! stages (initiation, primary response, secondary response), candidate
//! interactions are scored by delay-shifted dissimilarity between change-rate
//! profiles in adjacent stages, and calls are accepted by majority vote
//! across denoised replicate runs.
//!
//! # Example
//!
//! ```ignore
//! use tristage::prelude::*;
//!
//! // Load data
//! let expression = read_expression_matrix("expression.csv")?;
//! let tfs = read_tf_list("tf_list.txt")?;
//! let annotation = GeneAnnotation::from_tf_list(expression.gene_ids(), &tfs);
//! let mut dataset = TimeCourse::new(expression, annotation)?;
//!
//! // Run the full pipeline for one query
//! let outcome = run_inference(
//!     &mut dataset,
//!     "lhy",
//!     SearchDirection::Targets,
//!     &StageParams::default(),
//!     &InferenceParams::default(),
//! )?;
//!
//! for call in &outcome.interactions {
//!     println!("{} ({})", dataset.gene_ids()[call.gene_index], call.polarity);
//! }
//! ```

pub mod align;
pub mod cli;
pub mod cluster;
pub mod data;
pub mod ensemble;
pub mod error;
pub mod io;
pub mod normalization;
pub mod stages;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::align::{
        compute_dissimilarity, AlignmentQuery, AlignmentResult, CandidateCall, Polarity,
        SearchDirection,
    };
    pub use crate::data::{ExpressionMatrix, GeneAnnotation, TimeCourse};
    pub use crate::ensemble::{infer_interactions, InferenceOutcome, InferenceParams};
    pub use crate::error::{Result, TristageError};
    pub use crate::io::{
        read_expression_matrix, read_tf_list, write_dissimilarity_table, write_interactions,
        write_json, write_matrix, write_stage_table, InferenceReport,
    };
    pub use crate::normalization::normalize;
    pub use crate::stages::{classify_stages, Stage, StageParams, StageReport};
}

use prelude::*;

/// Run the complete inference pipeline for one query
pub fn run_inference(
    dataset: &mut TimeCourse,
    gene: &str,
    direction: SearchDirection,
    stage_params: &StageParams,
    params: &InferenceParams,
) -> Result<InferenceOutcome> {
    // Step 1: Normalize (skip if already done)
    if !dataset.has_normalization() {
        normalize(dataset)?;
    }

    // Step 2: Assign genes to response stages
    classify_stages(dataset, stage_params)?;

    // Step 3: Align against the adjacent stage and vote
    infer_interactions(dataset, gene, direction, params)
}
