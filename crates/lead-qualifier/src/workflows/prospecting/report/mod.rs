mod summary;
pub mod views;

pub use summary::{aggregate, CriterionCount, QualificationReport};
