use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;
pub const DEFAULT_RATING: u8 = 3;

/// A 1–5 rating. Any integer is accepted on input and clamped into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: i64) -> Self {
        Rating(value.clamp(MIN_RATING as i64, MAX_RATING as i64) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Rating(DEFAULT_RATING)
    }
}

impl From<i64> for Rating {
    fn from(value: i64) -> Self {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Rating given to one generated question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionRating {
    #[serde(default, alias = "question")]
    pub question_text: String,
    #[serde(default)]
    pub rating: Rating,
}

/// One rated generation event. Written once, never updated.
///
/// Aliases accept files written by the earlier form application
/// (`generated_questions`, `question_ratings`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedbackRecord {
    #[serde(default = "unknown_timestamp")]
    pub timestamp: String,
    #[serde(default, alias = "generated_questions")]
    pub generated_text: String,
    /// Keyed by `Question N`, in question order.
    #[serde(default, alias = "question_ratings")]
    pub per_question_ratings: IndexMap<String, QuestionRating>,
    #[serde(default)]
    pub overall_rating: Rating,
    #[serde(default)]
    pub courses_used: Vec<String>,
}

fn unknown_timestamp() -> String {
    "Inconnue".to_string()
}
