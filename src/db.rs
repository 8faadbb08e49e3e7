use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::parser::classify::Category;
use crate::parser::sections::Section;

/// The document written for each section. `category` is stored as `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub category: Category,
}

impl From<&Section> for SectionRecord {
    fn from(section: &Section) -> Self {
        Self {
            title: section.title.clone(),
            content: section.content.clone(),
            category: section.category(),
        }
    }
}

/// A keyed document collection supporting full-overwrite writes.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Replace the document at `collection/id` with `record`.
    async fn set(&self, collection: &str, id: &str, record: &SectionRecord)
        -> Result<(), StoreError>;
}

// ── In-memory ──

#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: Mutex<BTreeMap<(String, String), SectionRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one collection, ordered by id.
    pub fn documents(&self, collection: &str) -> Vec<(String, SectionRecord)> {
        self.lock()
            .iter()
            .filter(|((c, _), _)| c == collection)
            .map(|((_, id), r)| (id.clone(), r.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<(String, String), SectionRecord>> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn set(
        &self,
        collection: &str,
        id: &str,
        record: &SectionRecord,
    ) -> Result<(), StoreError> {
        self.lock()
            .insert((collection.to_string(), id.to_string()), record.clone());
        Ok(())
    }
}

// ── SQLite ──

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn count(&self, collection: &str) -> Result<usize, StoreError> {
        let conn = self.lock();
        let n: usize = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            [collection],
            |r| r.get(0),
        )?;
        Ok(n)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id         TEXT NOT NULL,
            title      TEXT NOT NULL,
            content    TEXT NOT NULL,
            type       TEXT NOT NULL CHECK(type IN ('universal','situational')),
            PRIMARY KEY (collection, id)
        );
        ",
    )
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn set(
        &self,
        collection: &str,
        id: &str,
        record: &SectionRecord,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO documents (collection, id, title, content, type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                collection,
                id,
                record.title,
                record.content,
                record.category.as_str(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, content: &str, category: Category) -> SectionRecord {
        SectionRecord {
            title: title.into(),
            content: content.into(),
            category,
        }
    }

    #[test]
    fn record_from_section() {
        let section = Section {
            title: "Core Philosophy".into(),
            content: "Be kind.".into(),
        };
        let r = SectionRecord::from(&section);
        assert_eq!(r, record("Core Philosophy", "Be kind.", Category::Universal));
    }

    #[test]
    fn record_serializes_category_as_type() {
        let r = record("Custom Rule", "Do X.", Category::Situational);
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(
            v,
            serde_json::json!({ "title": "Custom Rule", "content": "Do X.", "type": "situational" })
        );
    }

    #[tokio::test]
    async fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store
            .set("kb", "a", &record("A", "old", Category::Situational))
            .await
            .unwrap();
        store
            .set("kb", "a", &record("A", "new", Category::Situational))
            .await
            .unwrap();
        store
            .set("other", "a", &record("A", "elsewhere", Category::Situational))
            .await
            .unwrap();

        let docs = store.documents("kb");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].1.content, "new");
        assert_eq!(store.documents("other")[0].1.content, "elsewhere");
        assert!(store.documents("missing").is_empty());
    }

    #[tokio::test]
    async fn sqlite_store_replaces_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.sqlite");
        let store = SqliteStore::open(&path).unwrap();

        store
            .set("kb", "core-philosophy", &record("Core Philosophy", "v1", Category::Universal))
            .await
            .unwrap();
        store
            .set("kb", "core-philosophy", &record("Core Philosophy", "v2", Category::Universal))
            .await
            .unwrap();
        store
            .set("kb", "custom-rule", &record("Custom Rule", "Do X.", Category::Situational))
            .await
            .unwrap();
        assert_eq!(store.count("kb").unwrap(), 2);
        assert_eq!(store.count("elsewhere").unwrap(), 0);

        let (content, kind): (String, String) = store
            .lock()
            .query_row(
                "SELECT content, type FROM documents WHERE collection = 'kb' AND id = 'core-philosophy'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(content, "v2");
        assert_eq!(kind, "universal");
    }

    #[test]
    fn sqlite_schema_is_reentrant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.sqlite");
        drop(SqliteStore::open(&path).unwrap());
        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.count("kb").unwrap(), 0);
    }
}
