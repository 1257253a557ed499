//! Store, collection and document envelope implementation.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use clinic_uuid::RecordId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{DocStoreError, DocStoreResult};

/// A stored document: store-assigned identity and timestamps plus the payload.
///
/// The payload is flattened into the document on the wire, so a stored patient
/// serialises as one flat JSON object:
///
/// ```json
/// {
///   "id": "550e8400e29b41d4a716446655440000",
///   "createdAt": "2026-03-10T09:30:00Z",
///   "updatedAt": "2026-03-10T09:30:00Z",
///   "name": "Sarah Williams",
///   ...
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document<T> {
    /// Store-assigned identifier, allocated at insert time.
    pub id: RecordId,
    /// When the document was first inserted.
    pub created_at: DateTime<Utc>,
    /// When the document was last written. Equal to `created_at` until the
    /// first replace.
    pub updated_at: DateTime<Utc>,
    /// The domain payload.
    #[serde(flatten)]
    pub data: T,
}

/// Handle to a document store root.
///
/// One `DocStore` is opened at process startup and shared for the process
/// lifetime; collections are cheap typed views handed out on demand.
#[derive(Clone, Debug)]
pub struct DocStore {
    root: PathBuf,
}

impl DocStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DocStoreError::StorageDirCreation`] if the root directory
    /// cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> DocStoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(DocStoreError::StorageDirCreation)?;
        Ok(Self { root })
    }

    /// Returns a typed handle to the named collection.
    ///
    /// The collection directory is created lazily on first insert; reading an
    /// empty collection requires no filesystem state.
    pub fn collection<T>(&self, name: &str) -> Collection<T> {
        Collection {
            name: name.to_owned(),
            dir: self.root.join(name),
            _payload: PhantomData,
        }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// A typed view over one collection of documents.
#[derive(Debug)]
pub struct Collection<T> {
    name: String,
    dir: PathBuf,
    _payload: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            dir: self.dir.clone(),
            _payload: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Inserts a new document, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns a [`DocStoreError`] if the sharded directory cannot be created
    /// or the document cannot be serialised or written.
    pub fn insert(&self, data: T) -> DocStoreResult<Document<T>> {
        let now = Utc::now();
        let doc = Document {
            id: RecordId::new(),
            created_at: now,
            updated_at: now,
            data,
        };
        self.write_document(&doc)?;
        Ok(doc)
    }

    /// Fetches one document by id, or `None` if it does not exist.
    pub fn get(&self, id: &RecordId) -> DocStoreResult<Option<Document<T>>> {
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(&path).map_err(DocStoreError::FileRead)?;
        let doc = serde_json::from_str(&json).map_err(DocStoreError::Deserialization)?;
        Ok(Some(doc))
    }

    /// Lists every document in the collection, in insertion order
    /// (`createdAt`, then id as a tiebreaker).
    ///
    /// Documents that cannot be read or parsed are logged at warn level and
    /// skipped; one corrupt file does not fail the whole scan.
    pub fn list(&self) -> DocStoreResult<Vec<Document<T>>> {
        let mut docs = Vec::new();

        let s1_iter = match fs::read_dir(&self.dir) {
            Ok(it) => it,
            // No directory yet means no documents were ever inserted.
            Err(_) => return Ok(docs),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }
            let s2_iter = match fs::read_dir(&s1_path) {
                Ok(it) => it,
                Err(_) => continue,
            };
            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }
                let file_iter = match fs::read_dir(&s2_path) {
                    Ok(it) => it,
                    Err(_) => continue,
                };
                for entry in file_iter.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    match self.read_document(&path) {
                        Ok(doc) => docs.push(doc),
                        Err(err) => {
                            tracing::warn!(
                                collection = %self.name,
                                path = %path.display(),
                                error = %err,
                                "skipping unreadable document"
                            );
                        }
                    }
                }
            }
        }

        docs.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(docs)
    }

    /// Lists documents matching a predicate. A filtered [`list`](Self::list).
    pub fn find(&self, pred: impl Fn(&Document<T>) -> bool) -> DocStoreResult<Vec<Document<T>>> {
        let mut docs = self.list()?;
        docs.retain(|doc| pred(doc));
        Ok(docs)
    }

    /// Replaces the payload of an existing document, bumping `updatedAt` and
    /// preserving `createdAt`.
    ///
    /// Returns the new document state, or `None` if no document with that id
    /// exists.
    pub fn replace(&self, id: &RecordId, data: T) -> DocStoreResult<Option<Document<T>>> {
        let Some(existing) = self.get(id)? else {
            return Ok(None);
        };
        let doc = Document {
            id: *id,
            created_at: existing.created_at,
            updated_at: Utc::now(),
            data,
        };
        self.write_document(&doc)?;
        Ok(Some(doc))
    }

    /// Deletes a document. Returns `true` if it existed.
    pub fn delete(&self, id: &RecordId) -> DocStoreResult<bool> {
        let path = self.document_path(id);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(DocStoreError::FileDelete)?;
        Ok(true)
    }

    fn document_path(&self, id: &RecordId) -> PathBuf {
        id.sharded_dir(&self.dir).join(format!("{id}.json"))
    }

    fn write_document(&self, doc: &Document<T>) -> DocStoreResult<()> {
        let dir = doc.id.sharded_dir(&self.dir);
        fs::create_dir_all(&dir).map_err(DocStoreError::StorageDirCreation)?;
        let json = serde_json::to_string_pretty(doc).map_err(DocStoreError::Serialization)?;
        let path = dir.join(format!("{}.json", doc.id));
        fs::write(&path, json).map_err(DocStoreError::FileWrite)?;
        Ok(())
    }

    fn read_document(&self, path: &Path) -> DocStoreResult<Document<T>> {
        let json = fs::read_to_string(path).map_err(DocStoreError::FileRead)?;
        serde_json::from_str(&json).map_err(DocStoreError::Deserialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        title: String,
        body: Option<String>,
    }

    fn open_store(dir: &TempDir) -> DocStore {
        DocStore::open(dir.path().join("data")).expect("open store")
    }

    #[test]
    fn insert_then_get_round_trips() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");

        let inserted = notes
            .insert(Note {
                title: "first".into(),
                body: None,
            })
            .expect("insert");
        assert_eq!(inserted.created_at, inserted.updated_at);

        let fetched = notes.get(&inserted.id).expect("get").expect("present");
        assert_eq!(fetched, inserted);
    }

    #[test]
    fn get_unknown_id_is_none() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");
        assert!(notes.get(&RecordId::new()).expect("get").is_none());
    }

    #[test]
    fn list_returns_documents_in_insertion_order() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");

        let mut ids = Vec::new();
        for i in 0..5 {
            let doc = notes
                .insert(Note {
                    title: format!("note-{i}"),
                    body: None,
                })
                .expect("insert");
            ids.push(doc.id);
        }

        let listed: Vec<_> = notes.list().expect("list").into_iter().map(|d| d.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn list_on_empty_store_is_empty() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");
        assert!(notes.list().expect("list").is_empty());
    }

    #[test]
    fn list_skips_corrupt_documents() {
        let tmp = TempDir::new().expect("tempdir");
        let store = open_store(&tmp);
        let notes = store.collection::<Note>("notes");

        let kept = notes
            .insert(Note {
                title: "kept".into(),
                body: None,
            })
            .expect("insert");

        // Plant a file the scan cannot parse next to a valid document.
        let bad_id = RecordId::new();
        let bad_dir = bad_id.sharded_dir(&store.root().join("notes"));
        fs::create_dir_all(&bad_dir).expect("mkdir");
        fs::write(bad_dir.join(format!("{bad_id}.json")), "{ not json").expect("write");

        let listed = notes.list().expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }

    #[test]
    fn replace_preserves_created_at_and_bumps_updated_at() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");

        let inserted = notes
            .insert(Note {
                title: "v1".into(),
                body: None,
            })
            .expect("insert");

        let replaced = notes
            .replace(
                &inserted.id,
                Note {
                    title: "v2".into(),
                    body: Some("edited".into()),
                },
            )
            .expect("replace")
            .expect("present");

        assert_eq!(replaced.created_at, inserted.created_at);
        assert!(replaced.updated_at >= inserted.updated_at);
        assert_eq!(replaced.data.title, "v2");

        let fetched = notes.get(&inserted.id).expect("get").expect("present");
        assert_eq!(fetched, replaced);
    }

    #[test]
    fn replace_unknown_id_is_none() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");
        let result = notes
            .replace(
                &RecordId::new(),
                Note {
                    title: "ghost".into(),
                    body: None,
                },
            )
            .expect("replace");
        assert!(result.is_none());
    }

    #[test]
    fn delete_removes_document_and_reports_absence() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");

        let doc = notes
            .insert(Note {
                title: "to delete".into(),
                body: None,
            })
            .expect("insert");

        assert!(notes.delete(&doc.id).expect("delete"));
        assert!(notes.get(&doc.id).expect("get").is_none());
        assert!(!notes.delete(&doc.id).expect("second delete"));
    }

    #[test]
    fn find_filters_by_predicate() {
        let tmp = TempDir::new().expect("tempdir");
        let notes = open_store(&tmp).collection::<Note>("notes");

        for title in ["alpha", "beta", "alpha"] {
            notes
                .insert(Note {
                    title: title.into(),
                    body: None,
                })
                .expect("insert");
        }

        let alphas = notes.find(|d| d.data.title == "alpha").expect("find");
        assert_eq!(alphas.len(), 2);
    }

    #[test]
    fn payload_is_flattened_on_disk() {
        let tmp = TempDir::new().expect("tempdir");
        let store = open_store(&tmp);
        let notes = store.collection::<Note>("notes");

        let doc = notes
            .insert(Note {
                title: "flat".into(),
                body: None,
            })
            .expect("insert");

        let path = doc
            .id
            .sharded_dir(&store.root().join("notes"))
            .join(format!("{}.json", doc.id));
        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).expect("read")).expect("parse");
        assert_eq!(raw["title"], "flat");
        assert_eq!(raw["id"], doc.id.to_string());
        assert!(raw.get("createdAt").is_some());
        assert!(raw.get("data").is_none());
    }
}
