//! Prompt assembly: a fixed French instruction header, the selected courses,
//! the selected exam subjects, then a closing instruction for the chosen mode.
//!
//! The result is only a default. It is handed back to the user, who may edit
//! it before generation.

pub mod handlers;
pub mod prompts;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::models::record::{RecordKind, StudyRecord};
use crate::prompt::prompts::{
    CHAPTER_LINE, FULL_EXAM_SET_CLOSING, PROMPT_HEADER, SINGLE_QUESTION_CLOSING, SOURCE_BLOCK,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    SingleQuestion,
    #[default]
    FullExamSet,
}

impl GenerationMode {
    /// Output-length budget passed to the model.
    pub fn max_output_length(self) -> u32 {
        match self {
            GenerationMode::SingleQuestion => 256,
            GenerationMode::FullExamSet => 1024,
        }
    }

    fn closing_instruction(self) -> &'static str {
        match self {
            GenerationMode::SingleQuestion => SINGLE_QUESTION_CLOSING,
            GenerationMode::FullExamSet => FULL_EXAM_SET_CLOSING,
        }
    }
}

/// Inclusive year bounds; a missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

impl YearRange {
    pub fn contains(&self, year: i32) -> bool {
        self.from.map_or(true, |from| year >= from) && self.to.map_or(true, |to| year <= to)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptOptions {
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub mode: GenerationMode,
}

/// The default prompt offered to the user, with what it was built from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub prompt: String,
    pub mode: GenerationMode,
    pub max_output_length: u32,
    pub courses_used: Vec<String>,
}

/// Picks the records at `indices` (duplicates ignored, request order kept)
/// and drops those outside `years`. An index past the end of the collection
/// is a validation error.
pub fn select<'a>(
    records: &'a [StudyRecord],
    indices: &[usize],
    years: &YearRange,
    kind: RecordKind,
) -> Result<Vec<&'a StudyRecord>, AppError> {
    let mut seen = Vec::with_capacity(indices.len());
    let mut selected = Vec::with_capacity(indices.len());

    for &index in indices {
        if seen.contains(&index) {
            continue;
        }
        seen.push(index);

        let record = records.get(index).ok_or_else(|| {
            AppError::Validation(format!(
                "{} #{index} does not exist ({} stored)",
                kind.label(),
                records.len()
            ))
        })?;

        if years.contains(record.year) {
            selected.push(record);
        } else {
            debug!(
                "{} '{}' ({}) filtered out by {years:?}",
                kind.label(),
                record.title,
                record.year
            );
        }
    }

    Ok(selected)
}

/// Assembles the generation prompt. Both a course and an exam subject are
/// required.
pub fn build_prompt(
    courses: &[&StudyRecord],
    exams: &[&StudyRecord],
    options: &PromptOptions,
) -> Result<BuiltPrompt, AppError> {
    if courses.is_empty() {
        return Err(AppError::Precondition(
            "Merci de sélectionner au moins un cours (onglet Cours) avant de générer.".to_string(),
        ));
    }
    if exams.is_empty() {
        return Err(AppError::Precondition(
            "Merci de sélectionner au moins un sujet d'annale avant de générer.".to_string(),
        ));
    }

    let mut sections = vec![PROMPT_HEADER.to_string()];

    if let Some(chapter) = options.chapter.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        sections.push(CHAPTER_LINE.replace("{chapter}", chapter));
    }
    for course in courses {
        sections.push(source_block(RecordKind::Course, course));
    }
    for exam in exams {
        sections.push(source_block(RecordKind::Exam, exam));
    }
    sections.push(options.mode.closing_instruction().to_string());

    Ok(BuiltPrompt {
        prompt: sections.join("\n\n"),
        mode: options.mode,
        max_output_length: options.mode.max_output_length(),
        courses_used: courses.iter().map(|c| c.title.clone()).collect(),
    })
}

fn source_block(kind: RecordKind, record: &StudyRecord) -> String {
    SOURCE_BLOCK
        .replace("{label}", kind.label())
        .replace("{title}", &record.title)
        .replace("{year}", &record.year.to_string())
        .replace("{text}", record.text.trim())
}
