use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// A stored record: a flat JSON object. The post `content` field is an
/// opaque string blob to this layer.
pub type Record = Map<String, Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The document-database contract consumed by the services.
///
/// Collections are named bags of records keyed by generated ids. Listing
/// orders by a named RFC 3339 timestamp field, newest first, which is the
/// only query shape the application needs.
pub trait DocumentStore {
    /// Insert a record, returning its generated id.
    fn create(&mut self, collection: &str, record: Record) -> Result<String, StoreError>;

    /// Fetch one record, `None` when absent.
    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError>;

    /// All records of a collection, descending by `order_by` field.
    fn list_desc(&self, collection: &str, order_by: &str)
    -> Result<Vec<(String, Record)>, StoreError>;

    /// Shallow-merge `partial` into an existing record.
    fn update(&mut self, collection: &str, id: &str, partial: Record) -> Result<(), StoreError>;

    /// Remove a record.
    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError>;
}

type Collections = HashMap<String, HashMap<String, Record>>;

fn sort_key<'a>(record: &'a Record, order_by: &str) -> &'a str {
    record.get(order_by).and_then(Value::as_str).unwrap_or("")
}

fn list_collection(
    collections: &Collections,
    collection: &str,
    order_by: &str,
) -> Vec<(String, Record)> {
    let mut rows: Vec<(String, Record)> = collections
        .get(collection)
        .map(|records| {
            records
                .iter()
                .map(|(id, record)| (id.clone(), record.clone()))
                .collect()
        })
        .unwrap_or_default();
    // RFC 3339 strings in UTC sort chronologically as plain strings.
    rows.sort_by(|(a_id, a), (b_id, b)| {
        sort_key(b, order_by)
            .cmp(sort_key(a, order_by))
            .then_with(|| a_id.cmp(b_id))
    });
    rows
}

/// In-memory store, the test double for the hosted document database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Collections,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn create(&mut self, collection: &str, record: Record) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    fn list_desc(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<(String, Record)>, StoreError> {
        Ok(list_collection(&self.collections, collection, order_by))
    }

    fn update(&mut self, collection: &str, id: &str, partial: Record) -> Result<(), StoreError> {
        let record = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in partial {
            record.insert(key, value);
        }
        Ok(())
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.remove(id));
        match removed {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

/// File-backed store: the whole database lives in one JSON file that is
/// loaded on open and rewritten after every mutation. Small-scale by
/// design, like the rest of the storage layer.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    collections: Collections,
}

impl JsonFileStore {
    /// Open a store at `path`, creating an empty one if the file does not
    /// exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = if path.exists() {
            let content = fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            Collections::new()
        };
        Ok(JsonFileStore { path, collections })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.collections)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl DocumentStore for JsonFileStore {
    fn create(&mut self, collection: &str, record: Record) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), record);
        self.persist()?;
        Ok(id)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    fn list_desc(
        &self,
        collection: &str,
        order_by: &str,
    ) -> Result<Vec<(String, Record)>, StoreError> {
        Ok(list_collection(&self.collections, collection, order_by))
    }

    fn update(&mut self, collection: &str, id: &str, partial: Record) -> Result<(), StoreError> {
        let record = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(id))
            .ok_or_else(|| StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (key, value) in partial {
            record.insert(key, value);
        }
        self.persist()
    }

    fn delete(&mut self, collection: &str, id: &str) -> Result<(), StoreError> {
        let removed = self
            .collections
            .get_mut(collection)
            .and_then(|records| records.remove(id));
        match removed {
            Some(_) => self.persist(),
            None => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(fields: &[(&str, Value)]) -> Record {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn create_then_get_roundtrips() {
        let mut store = MemoryStore::new();
        let rec = record(&[("title", json!("Hello")), ("publishedAt", json!("2026-01-01T00:00:00Z"))]);

        let id = store.create("posts", rec.clone()).unwrap();
        let fetched = store.get("posts", &id).unwrap();

        assert_eq!(fetched, Some(rec));
    }

    #[test]
    fn get_missing_record_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("posts", "nope").unwrap(), None);
    }

    #[test]
    fn list_orders_by_timestamp_descending() {
        let mut store = MemoryStore::new();
        store
            .create("posts", record(&[("publishedAt", json!("2026-01-01T00:00:00Z")), ("title", json!("old"))]))
            .unwrap();
        store
            .create("posts", record(&[("publishedAt", json!("2026-03-01T00:00:00Z")), ("title", json!("new"))]))
            .unwrap();
        store
            .create("posts", record(&[("publishedAt", json!("2026-02-01T00:00:00Z")), ("title", json!("mid"))]))
            .unwrap();

        let rows = store.list_desc("posts", "publishedAt").unwrap();
        let titles: Vec<&str> = rows
            .iter()
            .map(|(_, r)| r.get("title").and_then(Value::as_str).unwrap())
            .collect();

        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[test]
    fn update_merges_fields_shallowly() {
        let mut store = MemoryStore::new();
        let id = store
            .create("posts", record(&[("title", json!("a")), ("tags", json!(["x"]))]))
            .unwrap();

        store
            .update("posts", &id, record(&[("title", json!("b"))]))
            .unwrap();

        let rec = store.get("posts", &id).unwrap().unwrap();
        assert_eq!(rec.get("title"), Some(&json!("b")));
        assert_eq!(rec.get("tags"), Some(&json!(["x"])));
    }

    #[test]
    fn update_missing_record_errors() {
        let mut store = MemoryStore::new();
        let err = store
            .update("posts", "ghost", record(&[("title", json!("x"))]))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_record() {
        let mut store = MemoryStore::new();
        let id = store.create("posts", record(&[("title", json!("a"))])).unwrap();

        store.delete("posts", &id).unwrap();

        assert_eq!(store.get("posts", &id).unwrap(), None);
        assert!(matches!(
            store.delete("posts", &id),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn json_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("posts.json");

        let id = {
            let mut store = JsonFileStore::open(&path).unwrap();
            store
                .create("posts", record(&[("title", json!("durable"))]))
                .unwrap()
        };

        let store = JsonFileStore::open(&path).unwrap();
        let rec = store.get("posts", &id).unwrap().unwrap();
        assert_eq!(rec.get("title"), Some(&json!("durable")));
    }

    #[test]
    fn json_file_store_delete_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        let id = store.create("posts", record(&[("title", json!("gone"))])).unwrap();
        store.delete("posts", &id).unwrap();
        drop(store);

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("posts", &id).unwrap(), None);
    }

    #[test]
    fn collections_are_independent() {
        let mut store = MemoryStore::new();
        let post_id = store.create("posts", record(&[("title", json!("p"))])).unwrap();
        store.create("users", record(&[("email", json!("a@b.c"))])).unwrap();

        assert_eq!(store.list_desc("posts", "publishedAt").unwrap().len(), 1);
        assert_eq!(store.list_desc("users", "createdAt").unwrap().len(), 1);
        assert_eq!(store.get("users", &post_id).unwrap(), None);
    }
}
