//! Record identifiers and sharded-path utilities.
//!
//! The document store keeps every record under a path derived from its
//! identifier. To keep path derivation deterministic and consistent across the
//! codebase, identifiers use a *canonical* representation: **32 lowercase
//! hexadecimal characters** (no hyphens).
//!
//! This module provides:
//! - A wrapper type ([`RecordId`]) that *guarantees* the canonical format once
//!   constructed.
//! - Shared sharding logic to derive a record's storage location from its
//!   identifier.
//!
//! ## Canonical form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! Canonical form is *required* for externally supplied identifiers (path
//! parameters, CLI arguments, patient references inside appointments). Use
//! [`RecordId::parse`] to validate an input string.
//!
//! ## Sharded layout
//! For a canonical id `u`, a collection stores its document under
//! `collection_dir/<u[0..2]>/<u[2..4]>/`. Two levels of sharding prevent very
//! large fan-out in a single directory.

use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

use uuid::Uuid;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;

/// A store-assigned record identifier in canonical form (32 lowercase hex
/// characters, no hyphens).
///
/// Once constructed, the contained UUID is guaranteed to be canonical, so the
/// id can be safely embedded in storage paths and document payloads.
///
/// # Construction
/// - [`RecordId::new`] generates a fresh identifier (for newly inserted records).
/// - [`RecordId::parse`] validates an externally supplied identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordId {
    /// Generates a new identifier in canonical form.
    ///
    /// Suitable for allocating a fresh identifier when a document is inserted.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier that must already be canonical.
    ///
    /// This does **not** normalise other common UUID forms (for example,
    /// hyphenated or uppercase); callers must provide the canonical
    /// representation.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> IdResult<Self> {
        if Self::is_canonical(input) {
            // is_canonical guarantees 32 valid hex characters, so parse_str succeeds
            let uuid = Uuid::parse_str(input).expect("is_canonical guarantees valid UUID");
            return Ok(Self(uuid));
        }
        Err(IdError::InvalidInput(format!(
            "record id must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns true if `input` is in canonical form.
    ///
    /// Purely syntactic: exactly 32 bytes, lowercase hex only.
    pub fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }

    /// Returns `parent_dir/<s1>/<s2>/` where `s1`/`s2` are the first four hex
    /// characters of this id.
    ///
    /// The caller appends the document filename; sharding only determines the
    /// directory.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        let s1 = &canonical[0..2];
        let s2 = &canonical[2..4];
        parent_dir.join(s1).join(s2)
    }
}

impl fmt::Display for RecordId {
    /// Formats the identifier in canonical form (32 lowercase hex characters,
    /// no hyphens).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordId {
    type Err = IdError;

    /// Parses a string into a `RecordId`, requiring canonical form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecordId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&self.0.simple())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordId::parse(&s).map_err(serde::de::Error::custom)
    }
}
