//! Clustering primitives used by stage classification

mod kmeans;

pub use kmeans::{assign_to_centroids, kmeans, kmeans_restarts, KmeansFit, DEFAULT_MAX_ITER};
