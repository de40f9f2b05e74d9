//! Error types for Weft operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Weft crates. Uses `thiserror` for derive macros.
//!
//! The variants follow the store's error taxonomy: validation failures are
//! raised before any mutating statement executes, identifier failures are
//! raised before a name reaches generated SQL, and everything the backend
//! reports that is not otherwise classified surfaces as [`Error::Backend`].

use thiserror::Error;

/// Errors that can occur in Weft operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document, collection, or tenant not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Identifier failed the safety rule and cannot be used in generated SQL.
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Caller-supplied input failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Metadata or vector failed to (de)serialize.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Underlying storage or query failure.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Embedding capability failure or dimensionality mismatch.
    #[error("Embedding error: {0}")]
    Embedding(String),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid identifier error.
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an encoding error.
    pub fn encoding(msg: impl std::fmt::Display) -> Self {
        Self::Encoding(msg.to_string())
    }

    /// Create a backend error from anything displayable.
    pub fn backend(msg: impl std::fmt::Display) -> Self {
        Self::Backend(msg.to_string())
    }

    /// Create an embedding error.
    pub fn embedding(msg: impl std::fmt::Display) -> Self {
        Self::Embedding(msg.to_string())
    }

    /// Whether this error is a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether this error should map to a bad-request condition at the
    /// caller's boundary (validation and identifier failures).
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::InvalidIdentifier(_))
    }
}

/// Result type alias using Weft's Error type.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Tests
// ============================================================================
