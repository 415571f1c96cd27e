//! Data processing modules.

pub mod alignment;
pub mod association;
pub mod evaluation;

// Re-export key types for convenience
pub use alignment::{align, AlignmentError, AlignmentResult, ErrorStats};
pub use association::{associate, format_match, Match};
pub use evaluation::{
    evaluate_trajectories, extract_positions, EvaluationError, EvaluationParams, EvaluationReport,
};
