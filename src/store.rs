//! In-memory index over a VQA question file and its annotations.
//!
//! [`Vqa`] is built once at load time and is read-only afterwards. A store
//! opened without annotations is in questions-only (test) mode: browsing and
//! filtering by ground truth is unavailable there.

use crate::error::{Result, VqaError};
use crate::persistence::{load_annotations, load_predictions, load_questions};
use crate::records::{
    Annotation, AnnotationFile, DatasetHeader, Prediction, PredictionRecord, Question,
    QuestionFile,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

/// Filter for [`Vqa::get_ques_ids`]. Empty lists skip that filter.
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    pub img_ids: Vec<u64>,
    pub ques_types: Vec<String>,
    pub ans_types: Vec<String>,
}

/// Filter for [`Vqa::get_img_ids`]. Empty lists skip that filter.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    pub ques_ids: Vec<u64>,
    pub ques_types: Vec<String>,
    pub ans_types: Vec<String>,
}

/// Question and ground-truth store.
#[derive(Debug, Clone)]
pub struct Vqa {
    questions: QuestionFile,
    dataset: Option<AnnotationFile>,
    /// question id -> position in `dataset.annotations`
    qa: HashMap<u64, usize>,
    /// question id -> position in `questions.questions`
    qqa: HashMap<u64, usize>,
    /// image id -> question ids, in file order
    img_to_qa: HashMap<u64, Vec<u64>>,
}

impl Vqa {
    /// Load a question file and its annotation file.
    pub fn open(question_path: &Path, annotation_path: &Path) -> Result<Self> {
        let start = Instant::now();
        tracing::info!("loading VQA annotations and questions into memory...");
        let dataset = load_annotations(annotation_path)?;
        let questions = load_questions(question_path)?;
        tracing::info!("loaded in {:.2?}", start.elapsed());

        Ok(Self::from_parts(questions, Some(dataset)))
    }

    /// Load only a question file (test mode).
    pub fn open_questions_only(question_path: &Path) -> Result<Self> {
        tracing::info!("test mode: loading only VQA questions into memory...");
        let questions = load_questions(question_path)?;
        Ok(Self::from_parts(questions, None))
    }

    /// Build a store from already parsed files.
    pub fn from_parts(questions: QuestionFile, dataset: Option<AnnotationFile>) -> Self {
        tracing::debug!("creating index...");

        let qqa = questions
            .questions
            .iter()
            .enumerate()
            .map(|(idx, q)| (q.question_id, idx))
            .collect();

        let mut qa = HashMap::new();
        let mut img_to_qa: HashMap<u64, Vec<u64>> = HashMap::new();

        match &dataset {
            Some(dataset) => {
                for (idx, ann) in dataset.annotations.iter().enumerate() {
                    qa.insert(ann.question_id, idx);
                    img_to_qa
                        .entry(ann.image_id)
                        .or_default()
                        .push(ann.question_id);
                }
            }
            None => {
                for q in &questions.questions {
                    img_to_qa.entry(q.image_id).or_default().push(q.question_id);
                }
            }
        }

        tracing::debug!("index created!");

        Self {
            questions,
            dataset,
            qa,
            qqa,
            img_to_qa,
        }
    }

    /// Whether the store was opened without annotations.
    pub fn is_test_mode(&self) -> bool {
        self.dataset.is_none()
    }

    /// The question file header.
    pub fn header(&self) -> &DatasetHeader {
        &self.questions.header
    }

    /// The `info` object of the question file.
    pub fn info(&self) -> &serde_json::Value {
        &self.questions.header.info
    }

    /// All annotations in file order.
    pub fn annotations(&self) -> Result<&[Annotation]> {
        self.dataset
            .as_ref()
            .map(|d| d.annotations.as_slice())
            .ok_or(VqaError::TestMode("annotations"))
    }

    /// Number of questions in the question file.
    pub fn question_count(&self) -> usize {
        self.questions.questions.len()
    }

    /// Look up a question by id.
    pub fn question(&self, question_id: u64) -> Option<&Question> {
        self.qqa
            .get(&question_id)
            .map(|&idx| &self.questions.questions[idx])
    }

    /// Look up the ground truth of a question.
    pub fn annotation(&self, question_id: u64) -> Option<&Annotation> {
        let dataset = self.dataset.as_ref()?;
        self.qa
            .get(&question_id)
            .map(|&idx| &dataset.annotations[idx])
    }

    /// Question ids matching the filter, in annotation order.
    ///
    /// When image ids are given, results follow the order of `img_ids`;
    /// unknown image ids are skipped.
    pub fn get_ques_ids(&self, filter: &QuestionFilter) -> Result<Vec<u64>> {
        let all = self
            .dataset
            .as_ref()
            .ok_or(VqaError::TestMode("get_ques_ids"))?;

        let candidates: Vec<&Annotation> = if filter.img_ids.is_empty() {
            all.annotations.iter().collect()
        } else {
            filter
                .img_ids
                .iter()
                .filter_map(|img_id| self.img_to_qa.get(img_id))
                .flatten()
                .filter_map(|qid| self.annotation(*qid))
                .collect()
        };

        Ok(candidates
            .into_iter()
            .filter(|ann| matches_types(ann, &filter.ques_types, &filter.ans_types))
            .map(|ann| ann.question_id)
            .collect())
    }

    /// Image ids of annotations matching the filter.
    ///
    /// One entry is returned per matching annotation, so an image with
    /// several matching questions appears several times.
    pub fn get_img_ids(&self, filter: &ImageFilter) -> Result<Vec<u64>> {
        let all = self
            .dataset
            .as_ref()
            .ok_or(VqaError::TestMode("get_img_ids"))?;

        let candidates: Vec<&Annotation> = if filter.ques_ids.is_empty() {
            all.annotations.iter().collect()
        } else {
            filter
                .ques_ids
                .iter()
                .filter_map(|qid| self.annotation(*qid))
                .collect()
        };

        Ok(candidates
            .into_iter()
            .filter(|ann| matches_types(ann, &filter.ques_types, &filter.ans_types))
            .map(|ann| ann.image_id)
            .collect())
    }

    /// Ground truth for the given question ids, in the same order.
    pub fn load_qa(&self, ids: &[u64]) -> Result<Vec<&Annotation>> {
        if self.is_test_mode() {
            return Err(VqaError::TestMode("load_qa"));
        }
        ids.iter()
            .map(|&id| self.annotation(id).ok_or(VqaError::QuestionNotFound(id)))
            .collect()
    }

    /// Render questions and their human answers for display.
    pub fn show_qa(&self, anns: &[&Annotation]) -> Result<String> {
        if self.is_test_mode() {
            return Err(VqaError::TestMode("show_qa"));
        }

        let mut out = String::new();
        for ann in anns {
            let question = self
                .question(ann.question_id)
                .ok_or(VqaError::QuestionNotFound(ann.question_id))?;
            out.push_str(&format!("Question: {}\n", question.question));
            for entry in &ann.answers {
                out.push_str(&format!("Answer {}: {}\n", entry.answer_id, entry.answer));
            }
        }
        Ok(out)
    }

    /// Load a result file and validate it against this store.
    pub fn load_res(&self, result_path: &Path) -> Result<ResultSet> {
        tracing::info!("Loading and preparing results...");
        let predictions = load_predictions(result_path)?;
        self.load_res_from(predictions)
    }

    /// Validate predictions against this store and attach ground-truth metadata.
    ///
    /// The prediction ids must be unique and must equal the annotated ids
    /// exactly. For multiple-choice tasks each answer must be one of the
    /// question's choices.
    pub fn load_res_from(&self, predictions: Vec<PredictionRecord>) -> Result<ResultSet> {
        let start = Instant::now();
        let annotations = self.annotations().map_err(|_| {
            VqaError::MissingGroundTruth("results can only be loaded against annotations".into())
        })?;

        let mut seen = HashSet::with_capacity(predictions.len());
        for pred in &predictions {
            if !seen.insert(pred.question_id) {
                return Err(VqaError::DuplicatePrediction(pred.question_id));
            }
        }

        let missing = annotations
            .iter()
            .filter(|ann| !seen.contains(&ann.question_id))
            .count();
        let unexpected = predictions
            .iter()
            .filter(|p| !self.qa.contains_key(&p.question_id))
            .count();
        if missing > 0 || unexpected > 0 {
            return Err(VqaError::ResultsMismatch {
                missing,
                unexpected,
            });
        }

        let multiple_choice = self.header().is_multiple_choice();
        let mut enriched = HashMap::with_capacity(predictions.len());
        let mut order = Vec::with_capacity(predictions.len());

        for pred in predictions {
            let qid = pred.question_id;
            if multiple_choice {
                let question = self.question(qid).ok_or(VqaError::QuestionNotFound(qid))?;
                let allowed = question
                    .multiple_choices
                    .as_ref()
                    .is_some_and(|choices| choices.contains(&pred.answer));
                if !allowed {
                    return Err(VqaError::InvalidChoice {
                        question_id: qid,
                        answer: pred.answer,
                    });
                }
            }

            let ann = self.annotation(qid).ok_or(VqaError::QuestionNotFound(qid))?;
            enriched.insert(
                qid,
                Prediction {
                    question_id: qid,
                    answer: pred.answer,
                    image_id: ann.image_id,
                    question_type: ann.question_type.clone(),
                    answer_type: ann.answer_type.clone(),
                },
            );
            order.push(qid);
        }

        tracing::info!("DONE (t={:.2}s)", start.elapsed().as_secs_f64());

        Ok(ResultSet {
            header: self.questions.header.clone(),
            predictions: enriched,
            order,
        })
    }
}

fn matches_types(ann: &Annotation, ques_types: &[String], ans_types: &[String]) -> bool {
    (ques_types.is_empty() || ques_types.contains(&ann.question_type))
        && (ans_types.is_empty() || ans_types.contains(&ann.answer_type))
}

/// Validated predictions keyed by question id.
#[derive(Debug, Clone)]
pub struct ResultSet {
    /// Header copied verbatim from the ground-truth question file.
    pub header: DatasetHeader,
    predictions: HashMap<u64, Prediction>,
    order: Vec<u64>,
}

impl ResultSet {
    /// Prediction for a question id.
    pub fn get(&self, question_id: u64) -> Option<&Prediction> {
        self.predictions.get(&question_id)
    }

    /// Predictions in result-file order.
    pub fn iter(&self) -> impl Iterator<Item = &Prediction> {
        self.order.iter().filter_map(|id| self.predictions.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
