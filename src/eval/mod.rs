//! Answer scoring for VQA results.
//!
//! This module provides:
//! - Answer normalization to a canonical comparable form
//! - Leave-one-out human-agreement scoring of a single answer
//! - Aggregation into overall, per-question-type and per-answer-type accuracy

pub mod evaluator;
pub mod normalize;
pub mod scorer;

pub use evaluator::{AccuracySummary, EvalReport, ScoreMap, VqaEval, round_to};
pub use normalize::normalize;
pub use scorer::AgreementScorer;
