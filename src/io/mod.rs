//! Input/Output operations for the inference pipeline

mod report;
mod table;

pub use report::{
    write_json, DissimilarityRow, InferenceReport, InferenceSummary, InteractionRecord,
};
pub use table::{
    read_expression_matrix, read_tf_list, write_dissimilarity_table, write_interactions,
    write_matrix, write_stage_table,
};
