//! Flat-file record store.
//!
//! Each collection is one JSON array in its own file. Every write reloads the
//! whole file, mutates the list in memory and overwrites the file. Appends made
//! through the same `JsonStore` are serialized; separate processes writing the
//! same file can still lose each other's updates.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize collection: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A JSON-array collection persisted in a single file.
pub struct JsonStore<T> {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for JsonStore<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _record: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for JsonStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStore").field("path", &self.path).finish()
    }
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
            _record: PhantomData,
        }
    }

    /// Loads the whole collection.
    ///
    /// Never fails: a missing file, unreadable file or invalid JSON yields an
    /// empty collection, and array elements that cannot be read as a record are
    /// skipped. Both are logged.
    pub async fn load(&self) -> Vec<T> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Could not read {}: {e}; treating as empty", self.path.display());
                return Vec::new();
            }
        };
        parse_collection(&raw, &self.path)
    }

    /// Overwrites the file with the given collection, pretty-printed.
    pub async fn save<R: Serialize>(&self, records: &[R]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }

    /// Reloads, appends one record and saves. Returns the new collection length.
    ///
    /// Works on the raw JSON elements, so entries that `load` would skip or
    /// default are written back exactly as they were found.
    pub async fn append(&self, record: T) -> Result<usize, StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load_raw().await;
        items.push(serde_json::to_value(record)?);
        self.save(&items).await?;

        info!("Appended record #{} to {}", items.len(), self.path.display());
        Ok(items.len())
    }

    async fn load_raw(&self) -> Vec<Value> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => parse_array(&raw, &self.path).unwrap_or_default(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                warn!("Could not read {}: {e}; treating as empty", self.path.display());
                Vec::new()
            }
        }
    }
}

fn parse_array(raw: &str, path: &Path) -> Option<Vec<Value>> {
    let document: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("Invalid JSON in {}: {e}; treating as empty", path.display());
            return None;
        }
    };

    match document {
        Value::Array(items) => Some(items),
        _ => {
            warn!("{} does not hold a JSON array; treating as empty", path.display());
            None
        }
    }
}

fn parse_collection<T: DeserializeOwned>(raw: &str, path: &Path) -> Vec<T> {
    let Some(items) = parse_array(raw, path) else {
        return Vec::new();
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable record #{i} in {}: {e}", path.display());
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::feedback::FeedbackRecord;
    use crate::models::record::StudyRecord;

    fn course(title: &str, year: i32) -> StudyRecord {
        StudyRecord {
            title: title.to_string(),
            year,
            text: format!("Contenu de {title}"),
        }
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<FeedbackRecord> =
            JsonStore::new(dir.path().join("feedback_history.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_invalid_json_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, "{not json").unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_non_array_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, r#"{"title": "not a list"}"#).unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_load_skips_unreadable_elements() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, r#"[{"title": "A", "year": 2020, "text": "a"}, 42, {"title": "B"}]"#)
            .unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(&path);
        let records = store.load().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].title, "B");
        assert_eq!(records[1].year, 0);
    }

    #[tokio::test]
    async fn test_save_then_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(dir.path().join("courses.json"));
        let records = vec![course("Thermodynamique", 2021), course("Optique", 2022)];

        store.save(&records).await.unwrap();
        let first = store.load().await;
        store.save(&first).await.unwrap();
        let second = store.load().await;

        assert_eq!(first, records);
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_sequential_appends_preserve_order() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(dir.path().join("courses.json"));

        assert_eq!(store.append(course("Chapitre 1", 2020)).await.unwrap(), 1);
        assert_eq!(store.append(course("Chapitre 2", 2021)).await.unwrap(), 2);

        let records = store.load().await;
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Chapitre 1", "Chapitre 2"]);
    }

    #[tokio::test]
    async fn test_append_keeps_prior_entries_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(dir.path().join("exams.json"));
        let initial = vec![course("Annale 2019", 2019), course("Annale 2020", 2020)];
        store.save(&initial).await.unwrap();

        let len = store.append(course("Annale 2021", 2021)).await.unwrap();

        let records = store.load().await;
        assert_eq!(len, initial.len() + 1);
        assert_eq!(&records[..2], &initial[..]);
    }

    #[tokio::test]
    async fn test_append_keeps_entries_that_do_not_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(
            &path,
            r#"[{"title": "Ancien", "year": null, "text": "a"}, {"title": "B", "year": "2021", "text": "b"}, 7]"#,
        )
        .unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(&path);

        let len = store.append(course("Nouveau", 2024)).await.unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let items = raw.as_array().unwrap();
        assert_eq!(len, 4);
        assert_eq!(items.len(), 4);
        assert_eq!(items[0]["year"], Value::Null);
        assert_eq!(items[1]["year"], "2021");
        assert_eq!(items[2], 7);
        assert_eq!(items[3]["title"], "Nouveau");
    }

    #[tokio::test]
    async fn test_append_to_invalid_file_starts_over() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        std::fs::write(&path, "{oops").unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(&path);

        assert_eq!(store.append(course("Optique", 2022)).await.unwrap(), 1);
        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_saved_file_is_pretty_and_keeps_non_ascii() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("courses.json");
        let store: JsonStore<StudyRecord> = JsonStore::new(&path);
        store.save(&[course("Électricité", 2023)]).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Électricité"));
        assert!(raw.contains('\n'));
    }

    #[tokio::test]
    async fn test_save_creates_missing_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<StudyRecord> =
            JsonStore::new(dir.path().join("nested").join("courses.json"));
        store.save(&[course("Mécanique", 2024)]).await.unwrap();
        assert_eq!(store.load().await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_appends_from_one_store_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonStore<StudyRecord> = JsonStore::new(dir.path().join("courses.json"));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.append(course(&format!("C{i}"), 2020)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.len(), 8);
    }
}
