//! # API Shared
//!
//! Shared utilities and definitions for the clinic REST API.
//!
//! Contains:
//! - Wire models (requests and responses) with their OpenAPI schemas
//! - Translation from core records to wire responses
//! - The shared `HealthService`
//!
//! Used by `api-rest` and its integration tests for common types.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::{HealthRes, HealthService};
