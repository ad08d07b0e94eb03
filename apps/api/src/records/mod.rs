//! Deposit of courses and exam subjects, pasted or uploaded.

pub mod handlers;

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::extract::{extract_all, ExtractOptions, ExtractionFailure, ExtractionOutcome, Upload};
use crate::models::record::{StudyRecord, UNTITLED};
use crate::store::JsonStore;

/// A pasted record, before defaults are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StoredRecord {
    /// Position in the collection; used to select the record for prompts.
    pub index: usize,
    #[serde(flatten)]
    pub record: StudyRecord,
}

#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub stored: Vec<StoredRecord>,
    pub failed: Vec<ExtractionFailure>,
}

/// Title and year typed next to an upload.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub title: Option<String>,
    pub year: Option<i32>,
}

fn current_year() -> i32 {
    Utc::now().year()
}

fn clean_title(title: Option<&str>) -> Option<String> {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// Appends a pasted record.
pub async fn deposit(
    store: &JsonStore<StudyRecord>,
    new: NewRecord,
) -> Result<StoredRecord, AppError> {
    if new.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let record = StudyRecord {
        title: clean_title(new.title.as_deref()).unwrap_or_else(|| UNTITLED.to_string()),
        year: new.year.unwrap_or_else(current_year),
        text: new.text,
    };
    let len = store.append(record.clone()).await?;

    Ok(StoredRecord {
        index: len - 1,
        record,
    })
}

/// Extracts every uploaded file and appends one record per file that yielded
/// text. Failed files are reported and not stored.
///
/// The form title names the record only when a single file was sent;
/// otherwise each record is titled after its file.
pub async fn deposit_uploads(
    store: &JsonStore<StudyRecord>,
    uploads: Vec<Upload>,
    form: UploadForm,
    options: ExtractOptions,
) -> Result<UploadReport, AppError> {
    if uploads.is_empty() {
        return Err(AppError::Validation("no file was uploaded".to_string()));
    }

    let single_file = uploads.len() == 1;
    let form_title = clean_title(form.title.as_deref());
    let year = form.year.unwrap_or_else(current_year);

    let mut report = UploadReport {
        stored: Vec::new(),
        failed: Vec::new(),
    };

    for outcome in extract_all(uploads, options).await {
        let document = match outcome {
            ExtractionOutcome::Extracted(document) => document,
            ExtractionOutcome::Failed(failure) => {
                report.failed.push(failure);
                continue;
            }
        };

        let title = match (&form_title, single_file) {
            (Some(title), true) => title.clone(),
            _ => document.file_name,
        };
        let record = StudyRecord {
            title,
            year,
            text: document.text,
        };
        let len = store.append(record.clone()).await?;
        report.stored.push(StoredRecord {
            index: len - 1,
            record,
        });
    }

    Ok(report)
}

/// The collection with each record's index.
pub async fn list(store: &JsonStore<StudyRecord>) -> Vec<StoredRecord> {
    store
        .load()
        .await
        .into_iter()
        .enumerate()
        .map(|(index, record)| StoredRecord { index, record })
        .collect()
}
