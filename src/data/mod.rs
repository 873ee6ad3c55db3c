//! Data structures for time-course inference

mod annotation;
mod dataset;
mod expression;

pub use annotation::GeneAnnotation;
pub use dataset::TimeCourse;
pub use expression::ExpressionMatrix;
