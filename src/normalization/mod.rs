//! Normalization of expression time courses

mod scale;

pub use scale::{
    center_rows, change_rates, normalize, scale_rows_to_unit, threshold_pattern, zscore_rows,
};
