//! Evaluation of a result set against ground truth.
//!
//! Per-question scores are kept as fractions in `[0, 1]`; accuracy summaries
//! are percentages. Overall accuracy is the mean of every per-question score,
//! not the mean of the group accuracies.

use super::normalize::normalize;
use super::scorer::AgreementScorer;
use crate::config::EvalConfig;
use crate::error::{Result, VqaError};
use crate::store::{ResultSet, Vqa};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Question id -> score.
pub type ScoreMap = BTreeMap<u64, f64>;

/// Aggregated accuracies, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccuracySummary {
    pub overall: f64,
    pub per_question_type: BTreeMap<String, f64>,
    pub per_answer_type: BTreeMap<String, f64>,
}

/// Everything produced by one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalReport {
    pub accuracy: AccuracySummary,
    #[serde(rename = "evalQA")]
    pub eval_qa: ScoreMap,
    #[serde(rename = "evalQuesType")]
    pub eval_ques_type: BTreeMap<String, ScoreMap>,
    #[serde(rename = "evalAnsType")]
    pub eval_ans_type: BTreeMap<String, ScoreMap>,
    /// Questions whose reference count differed from the expected count.
    #[serde(rename = "irregularReferenceSets", default)]
    pub irregular_reference_sets: usize,
}

impl EvalReport {
    /// Question ids scoring strictly below `threshold` (a fraction).
    pub fn low_scoring(&self, threshold: f64) -> Vec<u64> {
        self.eval_qa
            .iter()
            .filter(|(_, score)| **score < threshold)
            .map(|(qid, _)| *qid)
            .collect()
    }

    /// Print the accuracy breakdown to stdout.
    pub fn print_summary(&self, precision: u32) {
        let p = precision as usize;
        println!("\nOverall Accuracy is: {:.p$}\n", self.accuracy.overall);

        println!("Per Question Type Accuracy is the following:");
        for (ques_type, acc) in &self.accuracy.per_question_type {
            println!("{} : {:.p$}", ques_type, acc);
        }

        println!("\nPer Answer Type Accuracy is the following:");
        for (ans_type, acc) in &self.accuracy.per_answer_type {
            println!("{} : {:.p$}", ans_type, acc);
        }

        if self.irregular_reference_sets > 0 {
            println!(
                "\n{} question(s) had an unexpected number of reference answers",
                self.irregular_reference_sets
            );
        }
        println!();
    }
}

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Running sum per group.
#[derive(Default)]
struct Tally {
    sum: f64,
    count: usize,
}

impl Tally {
    fn add(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    fn percent(&self, precision: u32) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        round_to(100.0 * self.sum / self.count as f64, precision)
    }
}

/// Scores a [`ResultSet`] against the ground truth in a [`Vqa`] store.
pub struct VqaEval<'a> {
    vqa: &'a Vqa,
    res: &'a ResultSet,
    scorer: AgreementScorer,
    precision: u32,
}

impl<'a> VqaEval<'a> {
    /// Create an evaluator with default settings.
    ///
    /// Fails when the store was opened without annotations.
    pub fn new(vqa: &'a Vqa, res: &'a ResultSet) -> Result<Self> {
        Self::with_config(vqa, res, &EvalConfig::default())
    }

    /// Create an evaluator with explicit settings.
    ///
    /// Fails on invalid settings or when the store was opened without
    /// annotations.
    pub fn with_config(vqa: &'a Vqa, res: &'a ResultSet, config: &EvalConfig) -> Result<Self> {
        config.validate()?;
        if vqa.is_test_mode() {
            return Err(VqaError::MissingGroundTruth(
                "evaluation requires an annotation file".to_string(),
            ));
        }
        Ok(Self {
            vqa,
            res,
            scorer: AgreementScorer::from_config(config),
            precision: config.precision,
        })
    }

    /// Evaluate every annotated question.
    pub fn evaluate(&self) -> Result<EvalReport> {
        let ids: Vec<u64> = self
            .vqa
            .annotations()?
            .iter()
            .map(|ann| ann.question_id)
            .collect();
        self.evaluate_ids(&ids)
    }

    /// Evaluate the given question ids.
    ///
    /// The ids are treated as a set: repeats are scored once, in first-seen
    /// order. A requested id without a question, ground truth or prediction
    /// aborts the whole evaluation.
    pub fn evaluate_ids(&self, question_ids: &[u64]) -> Result<EvalReport> {
        let start = Instant::now();
        let mut seen = HashSet::with_capacity(question_ids.len());
        let question_ids: Vec<u64> = question_ids
            .iter()
            .copied()
            .filter(|qid| seen.insert(*qid))
            .collect();
        tracing::info!("computing accuracy for {} questions", question_ids.len());

        let score_precision = self.precision + 2;
        let mut eval_qa = ScoreMap::new();
        let mut eval_ques_type: BTreeMap<String, ScoreMap> = BTreeMap::new();
        let mut eval_ans_type: BTreeMap<String, ScoreMap> = BTreeMap::new();
        let mut overall = Tally::default();
        let mut by_ques_type: BTreeMap<String, Tally> = BTreeMap::new();
        let mut by_ans_type: BTreeMap<String, Tally> = BTreeMap::new();
        let mut irregular = 0;

        for qid in question_ids {
            self.vqa
                .question(qid)
                .ok_or(VqaError::QuestionNotFound(qid))?;
            let ann = self
                .vqa
                .annotation(qid)
                .ok_or(VqaError::QuestionNotFound(qid))?;
            let pred = self.res.get(qid).ok_or(VqaError::PredictionNotFound(qid))?;

            let references: Vec<String> = ann.answer_texts().map(normalize).collect();
            if self.scorer.is_irregular(references.len()) {
                irregular += 1;
                tracing::warn!(
                    "question {} has {} reference answers, expected {}",
                    qid,
                    references.len(),
                    self.scorer.expected_references
                );
            }

            let score = self
                .scorer
                .score_normalized(&normalize(&pred.answer), &references);
            tracing::debug!("question {}: {:.4}", qid, score);

            overall.add(score);
            by_ques_type
                .entry(ann.question_type.clone())
                .or_default()
                .add(score);
            by_ans_type
                .entry(ann.answer_type.clone())
                .or_default()
                .add(score);

            let rounded = round_to(score, score_precision);
            eval_qa.insert(qid, rounded);
            eval_ques_type
                .entry(ann.question_type.clone())
                .or_default()
                .insert(qid, rounded);
            eval_ans_type
                .entry(ann.answer_type.clone())
                .or_default()
                .insert(qid, rounded);
        }

        let accuracy = AccuracySummary {
            overall: overall.percent(self.precision),
            per_question_type: by_ques_type
                .iter()
                .map(|(tag, tally)| (tag.clone(), tally.percent(self.precision)))
                .collect(),
            per_answer_type: by_ans_type
                .iter()
                .map(|(tag, tally)| (tag.clone(), tally.percent(self.precision)))
                .collect(),
        };

        tracing::info!(
            "Done computing accuracy in {:.2?}: overall {}",
            start.elapsed(),
            accuracy.overall
        );

        Ok(EvalReport {
            accuracy,
            eval_qa,
            eval_ques_type,
            eval_ans_type,
            irregular_reference_sets: irregular,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{AnnotationFile, PredictionRecord, QuestionFile};
    use crate::store::tests::{annotation, store_from};

    const EPS: f64 = 1e-9;

    /// 3 "what color" questions answered right, 5 "how many" answered wrong.
    fn uneven_fixture() -> (Vqa, Vec<PredictionRecord>) {
        let mut anns = Vec::new();
        let mut preds = Vec::new();
        for qid in 1..=3 {
            anns.push(annotation(qid, qid * 10, "what color", "other", &["red"; 10]));
            preds.push(PredictionRecord::new(qid, "Red"));
        }
        for qid in 4..=8 {
            anns.push(annotation(qid, qid * 10, "how many", "number", &["2"; 10]));
            preds.push(PredictionRecord::new(qid, "five"));
        }
        (store_from(anns), preds)
    }

    #[test]
    fn test_overall_is_mean_of_question_scores() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();
        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();

        assert!((report.accuracy.per_question_type["what color"] - 100.0).abs() < EPS);
        assert!((report.accuracy.per_question_type["how many"] - 0.0).abs() < EPS);
        assert!((report.accuracy.per_answer_type["other"] - 100.0).abs() < EPS);
        assert!((report.accuracy.per_answer_type["number"] - 0.0).abs() < EPS);

        // 3 of 8 questions right.
        assert!((report.accuracy.overall - 37.5).abs() < EPS);

        let mean_of_qa: f64 =
            report.eval_qa.values().sum::<f64>() / report.eval_qa.len() as f64 * 100.0;
        assert!((report.accuracy.overall - mean_of_qa).abs() < EPS);

        let mean_of_groups: f64 = report.accuracy.per_question_type.values().sum::<f64>()
            / report.accuracy.per_question_type.len() as f64;
        assert!((mean_of_groups - 50.0).abs() < EPS);
        assert!((report.accuracy.overall - mean_of_groups).abs() > 1.0);
    }

    #[test]
    fn test_equal_groups_match_mean_of_groups() {
        let vqa = store_from(vec![
            annotation(1, 1, "is the", "yes/no", &["yes"; 10]),
            annotation(2, 1, "is the", "yes/no", &["yes"; 10]),
            annotation(3, 2, "how many", "number", &["4"; 10]),
            annotation(4, 2, "how many", "number", &["4"; 10]),
        ]);
        let res = vqa
            .load_res_from(vec![
                PredictionRecord::new(1, "yes"),
                PredictionRecord::new(2, "no"),
                PredictionRecord::new(3, "4"),
                PredictionRecord::new(4, "4"),
            ])
            .unwrap();
        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();

        let mean_of_groups: f64 = report.accuracy.per_question_type.values().sum::<f64>()
            / report.accuracy.per_question_type.len() as f64;
        assert!((report.accuracy.overall - 75.0).abs() < EPS);
        assert!((report.accuracy.overall - mean_of_groups).abs() < EPS);
    }

    #[test]
    fn test_group_detail_maps() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();
        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();

        assert_eq!(report.eval_qa.len(), 8);
        assert_eq!(report.eval_ques_type["what color"].len(), 3);
        assert_eq!(report.eval_ques_type["how many"].len(), 5);
        assert_eq!(report.eval_ans_type["number"].get(&4), Some(&0.0));
        assert_eq!(report.eval_ans_type["other"].get(&1), Some(&1.0));
        assert_eq!(report.low_scoring(0.35), vec![4, 5, 6, 7, 8]);
        assert_eq!(report.irregular_reference_sets, 0);
    }

    #[test]
    fn test_partial_credit() {
        let refs = ["red", "red", "red", "blue", "red", "red", "blue", "red", "red", "red"];
        let vqa = store_from(vec![annotation(1, 1, "what color", "other", &refs)]);

        let rare = vqa
            .load_res_from(vec![PredictionRecord::new(1, "blue")])
            .unwrap();
        let report = VqaEval::new(&vqa, &rare).unwrap().evaluate().unwrap();
        assert_eq!(report.eval_qa[&1], 0.6);
        assert_eq!(report.accuracy.overall, 60.0);

        let majority = vqa
            .load_res_from(vec![PredictionRecord::new(1, "red")])
            .unwrap();
        let report = VqaEval::new(&vqa, &majority).unwrap().evaluate().unwrap();
        assert_eq!(report.accuracy.overall, 100.0);
    }

    #[test]
    fn test_single_supporter() {
        let mut refs = vec!["red"];
        refs.extend(vec!["blue"; 9]);
        let vqa = store_from(vec![annotation(1, 1, "what color", "other", &refs)]);
        let res = vqa
            .load_res_from(vec![PredictionRecord::new(1, "red")])
            .unwrap();

        // 9 rounds of 1/3, one round of 0.
        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();
        assert_eq!(report.accuracy.overall, 30.0);
    }

    #[test]
    fn test_precision_rounding() {
        let vqa = store_from(vec![
            annotation(1, 1, "what", "other", &["a cat"; 10]),
            annotation(2, 1, "what", "other", &["dog"; 10]),
            annotation(3, 1, "what", "other", &["dog"; 10]),
        ]);
        let res = vqa
            .load_res_from(vec![
                PredictionRecord::new(1, "cat"),
                PredictionRecord::new(2, "cat"),
                PredictionRecord::new(3, "cat"),
            ])
            .unwrap();

        let config = EvalConfig {
            precision: 1,
            ..Default::default()
        };
        let report = VqaEval::with_config(&vqa, &res, &config)
            .unwrap()
            .evaluate()
            .unwrap();
        assert_eq!(report.accuracy.overall, 33.3);

        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();
        assert_eq!(report.accuracy.overall, 33.33);
    }

    #[test]
    fn test_subset_evaluation() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();
        let report = VqaEval::new(&vqa, &res)
            .unwrap()
            .evaluate_ids(&[1, 4])
            .unwrap();

        assert_eq!(report.eval_qa.len(), 2);
        assert!((report.accuracy.overall - 50.0).abs() < EPS);
        assert_eq!(report.accuracy.per_question_type.len(), 2);
    }

    #[test]
    fn test_missing_prediction_is_fatal() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();

        let other = store_from(vec![annotation(99, 1, "what color", "other", &["red"; 10])]);
        let result = VqaEval::new(&other, &res).unwrap().evaluate();
        assert!(matches!(result, Err(VqaError::PredictionNotFound(99))));

        let result = VqaEval::new(&vqa, &res).unwrap().evaluate_ids(&[1, 1234]);
        assert!(matches!(result, Err(VqaError::QuestionNotFound(1234))));
    }

    #[test]
    fn test_requires_ground_truth() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();
        let questions_only = Vqa::from_parts(QuestionFile::default(), None);

        assert!(matches!(
            VqaEval::new(&questions_only, &res),
            Err(VqaError::MissingGroundTruth(_))
        ));
    }

    #[test]
    fn test_irregular_reference_sets_are_counted() {
        let vqa = store_from(vec![
            annotation(1, 1, "is the", "yes/no", &["yes", "yes", "yes"]),
            annotation(2, 1, "is the", "yes/no", &["yes"; 10]),
        ]);
        let res = vqa
            .load_res_from(vec![
                PredictionRecord::new(1, "yes"),
                PredictionRecord::new(2, "yes"),
            ])
            .unwrap();
        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();

        assert_eq!(report.irregular_reference_sets, 1);
        // Each of the 3 rounds keeps 2 supporters: 2/3.
        assert!((report.eval_qa[&1] - 0.6667).abs() < EPS);
    }

    #[test]
    fn test_summary_json_round_trip() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();
        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();

        let json = serde_json::to_string(&report.accuracy).unwrap();
        assert!(json.contains("\"perQuestionType\""));
        assert!(json.contains("\"perAnswerType\""));
        let parsed: AccuracySummary = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report.accuracy);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"evalQA\""));
        let parsed: EvalReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_repeated_ids_are_scored_once() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();
        let evaluator = VqaEval::new(&vqa, &res).unwrap();

        let report = evaluator.evaluate_ids(&[1, 1, 4]).unwrap();
        assert_eq!(report.eval_qa.len(), 2);
        assert!((report.accuracy.overall - 50.0).abs() < EPS);
        assert!((report.accuracy.per_question_type["what color"] - 100.0).abs() < EPS);

        let mean_of_qa: f64 =
            report.eval_qa.values().sum::<f64>() / report.eval_qa.len() as f64 * 100.0;
        assert!((report.accuracy.overall - mean_of_qa).abs() < EPS);

        assert_eq!(report, evaluator.evaluate_ids(&[1, 4]).unwrap());
    }

    #[test]
    fn test_repeated_annotation_ids_are_scored_once() {
        let vqa = store_from(vec![
            annotation(1, 1, "is the", "yes/no", &["yes"; 10]),
            annotation(2, 1, "is the", "yes/no", &["no"; 10]),
            annotation(1, 1, "is the", "yes/no", &["yes"; 10]),
        ]);
        let res = vqa
            .load_res_from(vec![
                PredictionRecord::new(1, "yes"),
                PredictionRecord::new(2, "yes"),
            ])
            .unwrap();

        let report = VqaEval::new(&vqa, &res).unwrap().evaluate().unwrap();
        assert_eq!(report.eval_qa.len(), 2);
        assert!((report.accuracy.overall - 50.0).abs() < EPS);
    }

    #[test]
    fn test_missing_question_record_is_fatal() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();

        let mut dataset = AnnotationFile::default();
        dataset
            .annotations
            .push(annotation(7, 70, "what color", "other", &["red"; 10]));
        let without_questions = Vqa::from_parts(QuestionFile::default(), Some(dataset));
        assert!(without_questions.question(7).is_none());

        let result = VqaEval::new(&without_questions, &res).unwrap().evaluate();
        assert!(matches!(result, Err(VqaError::QuestionNotFound(7))));
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        let (vqa, preds) = uneven_fixture();
        let res = vqa.load_res_from(preds).unwrap();

        for config in [
            EvalConfig {
                precision: 400,
                ..Default::default()
            },
            EvalConfig {
                precision: u32::MAX,
                ..Default::default()
            },
            EvalConfig {
                agreement_threshold: 0,
                ..Default::default()
            },
            EvalConfig {
                expected_references: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(
                VqaEval::with_config(&vqa, &res, &config),
                Err(VqaError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(33.333333, 2), 33.33);
        assert_eq!(round_to(66.666666, 2), 66.67);
        assert_eq!(round_to(12.5, 0), 13.0);
    }
}
