//! Document storage for the clinic workspace.
//!
//! This crate implements a small document store: named collections of JSON
//! documents kept on the local filesystem. It is the persistence layer behind
//! the patient and appointment services.
//!
//! # Storage Layout
//!
//! Each collection keeps one JSON file per document in a sharded directory
//! tree:
//!
//! ```text
//! <data_dir>/
//! └── <collection>/          # e.g. patients/, appointments/
//!     └── <s1>/              # first two hex characters of the id
//!         └── <s2>/          # next two hex characters
//!             └── <id>.json  # full canonical id as filename
//! ```
//!
//! where `s1`/`s2` are derived from the document's [`RecordId`]. Sharding
//! keeps directory fan-out bounded as collections grow.
//!
//! # Document Envelope
//!
//! The store owns record identity and audit timestamps. Every document is
//! persisted as a [`Document<T>`] envelope: a store-assigned `id`, `createdAt`
//! and `updatedAt` timestamps, and the flattened payload `T`.
//!
//! # Consistency Model
//!
//! Writes touch exactly one file; there are no multi-document transactions.
//! Concurrent writers to the same document race with last-writer-wins
//! semantics. `list` is a full scan: documents that cannot be read or parsed
//! are logged at warn level and skipped rather than failing the whole scan.

mod store;

pub use clinic_uuid::RecordId;
pub use store::{Collection, DocStore, Document};

/// Errors that can occur during document store operations.
#[derive(Debug, thiserror::Error)]
pub enum DocStoreError {
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to write document: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read document: {0}")]
    FileRead(std::io::Error),
    #[error("failed to delete document: {0}")]
    FileDelete(std::io::Error),
    #[error("failed to serialize document: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize document: {0}")]
    Deserialization(serde_json::Error),
}

/// Result type for document store operations.
pub type DocStoreResult<T> = std::result::Result<T, DocStoreError>;
