//! Feedback collection: one rating per generated line plus an overall rating,
//! appended to the feedback history as a single immutable record.

pub mod handlers;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::errors::AppError;
use crate::models::feedback::{FeedbackRecord, QuestionRating, Rating};
use crate::session::Generation;
use crate::store::JsonStore;

/// Splits generated text into questions: one per non-blank line, trimmed.
pub fn split_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

pub fn question_label(index: usize) -> String {
    format!("Question {}", index + 1)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackPolicy {
    /// Accept feedback only for generations built from exactly one course.
    pub require_single_course: bool,
}

impl FeedbackPolicy {
    pub fn check(&self, generation: &Generation) -> Result<(), AppError> {
        if self.require_single_course && generation.courses_used.len() != 1 {
            return Err(AppError::Precondition(format!(
                "Le feedback n'est possible que pour une génération basée sur un seul cours \
                 ({} cours utilisés).",
                generation.courses_used.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct FormQuestion {
    pub label: String,
    pub question_text: String,
    pub rating: Rating,
}

/// What the rating tab shows: every question with its default rating.
#[derive(Debug, Serialize)]
pub struct FeedbackForm {
    pub questions: Vec<FormQuestion>,
    pub overall_rating: Rating,
    pub courses_used: Vec<String>,
    /// False when the feedback policy would reject a submission.
    pub eligible: bool,
}

pub fn feedback_form(generation: &Generation, policy: &FeedbackPolicy) -> FeedbackForm {
    let questions = split_questions(&generation.text)
        .into_iter()
        .enumerate()
        .map(|(i, question_text)| FormQuestion {
            label: question_label(i),
            question_text,
            rating: Rating::default(),
        })
        .collect();

    FeedbackForm {
        questions,
        overall_rating: Rating::default(),
        courses_used: generation.courses_used.clone(),
        eligible: policy.check(generation).is_ok(),
    }
}

/// Builds the record for one submission. `ratings[i]` rates the i-th
/// question; missing entries default to 3 and every value is clamped to 1–5.
pub fn build_feedback_record(
    generation: &Generation,
    ratings: &[i64],
    overall: Option<i64>,
    now: DateTime<Utc>,
) -> FeedbackRecord {
    let questions = split_questions(&generation.text);
    let per_question_ratings: IndexMap<String, QuestionRating> = questions
        .into_iter()
        .enumerate()
        .map(|(i, question_text)| {
            let rating = ratings.get(i).copied().map(Rating::new).unwrap_or_default();
            let entry = QuestionRating {
                question_text,
                rating,
            };
            (question_label(i), entry)
        })
        .collect();

    FeedbackRecord {
        timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        generated_text: generation.text.clone(),
        per_question_ratings,
        overall_rating: overall.map(Rating::new).unwrap_or_default(),
        courses_used: generation.courses_used.clone(),
    }
}

/// Validates against the policy and appends exactly one record.
pub async fn submit_feedback(
    store: &JsonStore<FeedbackRecord>,
    policy: &FeedbackPolicy,
    generation: &Generation,
    ratings: &[i64],
    overall: Option<i64>,
) -> Result<FeedbackRecord, AppError> {
    policy.check(generation)?;

    let record = build_feedback_record(generation, ratings, overall, Utc::now());
    let total = store.append(record.clone()).await?;

    info!(
        "Stored feedback #{total}: {} questions, overall {}",
        record.per_question_ratings.len(),
        record.overall_rating.value()
    );
    Ok(record)
}
