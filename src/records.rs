//! Record types for the VQA question, annotation and result files.
//!
//! These mirror the JSON layout of the official files. Unknown fields are
//! ignored; fields that only some dataset versions carry are optional.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Task type tag that switches on multiple-choice validation of results.
pub const MULTIPLE_CHOICE_TASK: &str = "Multiple Choice";

/// Header fields shared by question and annotation files.
///
/// `info` and `license` are free-form objects and are carried verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetHeader {
    #[serde(default)]
    pub info: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_subtype: Option<String>,
    #[serde(default)]
    pub license: Value,
}

impl DatasetHeader {
    /// Whether results for this dataset must pick one of the offered choices.
    pub fn is_multiple_choice(&self) -> bool {
        self.task_type.as_deref() == Some(MULTIPLE_CHOICE_TASK)
    }
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question_id: u64,
    pub image_id: u64,
    pub question: String,
    /// Offered answers, present only for multiple-choice tasks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_choices: Option<Vec<String>>,
}

/// Contents of a question file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestionFile {
    #[serde(flatten)]
    pub header: DatasetHeader,
    pub questions: Vec<Question>,
}

/// One annotator's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEntry {
    pub answer_id: u32,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_confidence: Option<String>,
}

/// Ground truth for one question.
///
/// `answers` keeps every annotator's answer in file order; repeated answers
/// are meaningful for scoring and are never deduplicated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub question_id: u64,
    pub image_id: u64,
    pub question_type: String,
    pub answer_type: String,
    pub answers: Vec<AnswerEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_choice_answer: Option<String>,
}

impl Annotation {
    /// Raw answer strings in annotator order.
    pub fn answer_texts(&self) -> impl Iterator<Item = &str> {
        self.answers.iter().map(|a| a.answer.as_str())
    }
}

/// Contents of an annotation file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnotationFile {
    #[serde(flatten)]
    pub header: DatasetHeader,
    pub annotations: Vec<Annotation>,
}

/// One entry of a result file as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub question_id: u64,
    pub answer: String,
}

impl PredictionRecord {
    pub fn new(question_id: u64, answer: impl Into<String>) -> Self {
        Self {
            question_id,
            answer: answer.into(),
        }
    }
}

/// A validated prediction enriched with ground-truth metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub question_id: u64,
    pub answer: String,
    pub image_id: u64,
    pub question_type: String,
    pub answer_type: String,
}
