//! Stage assignment for developmental time courses

mod classifier;
mod stage;
mod windows;

pub use classifier::{
    classify_stages, ClusterSummary, ClusteringRound, StageParams, StageReport, DEFAULT_CLUSTERS,
    DEFAULT_RESTARTS,
};
pub use stage::{Stage, StageAssignment};
pub use windows::StageWindows;
