//! Reading and writing the flat JSON files used by the benchmark.
//!
//! Result files follow the naming scheme `<stem>_results.json`; evaluation
//! outputs are written next to them as `<stem>_accuracy.json`,
//! `<stem>_evalQA.json`, `<stem>_evalQuesType.json` and
//! `<stem>_evalAnsType.json`.

use crate::error::{Result, VqaError};
use crate::eval::EvalReport;
use crate::records::{AnnotationFile, PredictionRecord, QuestionFile};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Suffix identifying a result file.
pub const RESULTS_SUFFIX: &str = "_results.json";

/// Read and parse a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| VqaError::io(path, e))?;
    serde_json::from_str(&content)
        .map_err(|e| VqaError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Serialize a value as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| VqaError::io(parent, e))?;
        }
    }

    let data = serde_json::to_string_pretty(value)
        .map_err(|e| VqaError::Serialization(e.to_string()))?;

    fs::write(path, data).map_err(|e| VqaError::io(path, e))?;

    Ok(())
}

/// Load a question file.
pub fn load_questions(path: &Path) -> Result<QuestionFile> {
    read_json(path)
}

/// Load an annotation file.
pub fn load_annotations(path: &Path) -> Result<AnnotationFile> {
    read_json(path)
}

/// Load a result file, which must be a JSON array of `{question_id, answer}`.
pub fn load_predictions(path: &Path) -> Result<Vec<PredictionRecord>> {
    let value: serde_json::Value = read_json(path)?;
    if !value.is_array() {
        return Err(VqaError::ResultsNotArray(path.display().to_string()));
    }
    serde_json::from_value(value)
        .map_err(|e| VqaError::Serialization(format!("{}: {}", path.display(), e)))
}

/// Output locations for one evaluated result file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPaths {
    pub accuracy: PathBuf,
    pub eval_qa: PathBuf,
    pub eval_ques_type: PathBuf,
    pub eval_ans_type: PathBuf,
}

impl ResultPaths {
    /// Build output paths `<dir>/<stem>_<kind>.json`.
    pub fn in_dir(dir: &Path, stem: &str) -> Self {
        let file = |kind: &str| dir.join(format!("{}_{}.json", stem, kind));
        Self {
            accuracy: file("accuracy"),
            eval_qa: file("evalQA"),
            eval_ques_type: file("evalQuesType"),
            eval_ans_type: file("evalAnsType"),
        }
    }

    /// Derive output paths next to a `<stem>_results.json` file.
    ///
    /// Files without the results suffix use their whole file stem.
    pub fn for_results_file(path: &Path) -> Self {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::in_dir(dir, &results_stem(path))
    }

    /// Same naming as [`Self::for_results_file`], placed in another directory.
    pub fn for_results_file_in(path: &Path, dir: &Path) -> Self {
        Self::in_dir(dir, &results_stem(path))
    }
}

fn results_stem(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match name.strip_suffix(RESULTS_SUFFIX) {
        Some(stem) => stem.to_string(),
        None => path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(name),
    }
}

/// Write the four evaluation outputs.
pub fn save_report(report: &EvalReport, paths: &ResultPaths) -> Result<()> {
    write_json(&report.accuracy, &paths.accuracy)?;
    write_json(&report.eval_qa, &paths.eval_qa)?;
    write_json(&report.eval_ques_type, &paths.eval_ques_type)?;
    write_json(&report.eval_ans_type, &paths.eval_ans_type)?;

    tracing::info!("Saved evaluation to {}", paths.accuracy.display());
    Ok(())
}

/// Find every `*_results.json` file under a directory, sorted by path.
pub fn find_result_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(VqaError::io(
            dir,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(RESULTS_SUFFIX))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    Ok(files)
}
