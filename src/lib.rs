//! VQA Tools - dataset access and accuracy scoring for the VQA benchmark.
//!
//! Loads question and annotation files, indexes them by question and image
//! id, validates a result file against the ground truth, and scores the
//! predicted answers with the human-agreement accuracy metric.
//!
//! # Quick Start
//!
//! ```no_run
//! use vqa_tools::{
//!     eval::VqaEval,
//!     persistence::{save_report, ResultPaths},
//!     store::Vqa,
//! };
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     let vqa = Vqa::open(
//!         Path::new("v2_OpenEnded_mscoco_val2014_questions.json"),
//!         Path::new("v2_mscoco_val2014_annotations.json"),
//!     )?;
//!
//!     let results = Path::new("Results/v2_OpenEnded_mscoco_val2014_fake_results.json");
//!     let res = vqa.load_res(results)?;
//!
//!     let report = VqaEval::new(&vqa, &res)?.evaluate()?;
//!     println!("Overall accuracy: {:.2}", report.accuracy.overall);
//!
//!     save_report(&report, &ResultPaths::for_results_file(results))?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **Vqa**: read-only index over questions and ground-truth annotations
//! - **ResultSet**: predictions validated against a `Vqa` store
//! - **normalize**: canonical form of a free-text answer
//! - **AgreementScorer**: leave-one-out partial credit against human answers
//! - **VqaEval**: per-question scores and grouped accuracy summaries

pub mod config;
pub mod error;
pub mod eval;
pub mod persistence;
pub mod records;
pub mod store;

// Re-export commonly used types
pub use config::{Config, EvalConfig};
pub use error::{Result, VqaError};
pub use eval::{AccuracySummary, AgreementScorer, EvalReport, VqaEval, normalize};
pub use persistence::{ResultPaths, save_report};
pub use records::{Annotation, PredictionRecord, Question};
pub use store::{ImageFilter, QuestionFilter, ResultSet, Vqa};
