use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder title for stored records written without one.
pub const UNTITLED: &str = "Sans titre";

/// A stored block of study text: a course chapter or a past exam subject.
///
/// Both collections share this shape. Records are append-only and addressed by
/// their position in the collection; titles are not unique.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyRecord {
    #[serde(default = "untitled", deserialize_with = "title_or_untitled")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: i32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

fn untitled() -> String {
    UNTITLED.to_string()
}

fn title_or_untitled<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(untitled))
}

/// Reads an explicit `null` as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Which collection a study record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Course,
    Exam,
}

impl RecordKind {
    /// French label used in prompts and user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Course => "Cours",
            RecordKind::Exam => "Sujet d'annale",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_placeholders() {
        let record: StudyRecord = serde_json::from_str("{}").unwrap();
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.year, 0);
        assert!(record.text.is_empty());
    }

    #[test]
    fn test_null_fields_take_placeholders() {
        let record: StudyRecord =
            serde_json::from_str(r#"{"title": null, "year": null, "text": "Optique"}"#).unwrap();
        assert_eq!(record.title, UNTITLED);
        assert_eq!(record.year, 0);
        assert_eq!(record.text, "Optique");
    }

    #[test]
    fn test_record_keeps_accents() {
        let record = StudyRecord {
            title: "Électromagnétisme".to_string(),
            year: 2023,
            text: "Loi de Faraday".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("Électromagnétisme"));
    }
}
