//! Time-grid alignment and dissimilarity scoring

mod dissimilarity;
mod grid;

pub use dissimilarity::{
    compute_dissimilarity, AlignmentQuery, AlignmentResult, CandidateCall, DissimilarityTable,
    Polarity, SearchDirection, DEFAULT_THRESHOLD,
};
pub use grid::{expand_row, grid_step};
