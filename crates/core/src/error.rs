//! Error types for the governance projection layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`CodecError`] - Proposal content could not be encoded or decoded
//! - [`ResolveError`] - No address resolver recognised a message
//! - [`StorageError`] - Database/repository errors
//! - [`DomainError`] - Unknown enumerated values in stored or supplied data
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! A write rejected by a height guard is *not* an error: it succeeds and
//! leaves the stored row untouched.

use thiserror::Error;

// =============================================================================
// Codec Errors
// =============================================================================

/// Proposal content envelope errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The content value cannot be serialized as a protocol message.
    #[error("Unsupported proposal content type: {kind}")]
    UnsupportedContent {
        /// Concrete Rust type of the rejected value.
        kind: String,
    },

    /// The envelope carries a type URL that no registered decoder handles.
    #[error("Unknown content type URL: {0}")]
    UnknownType(String),

    /// The envelope bytes are not a valid encoding of the declared type.
    #[error("Malformed {type_url} content: {message}")]
    Malformed {
        /// Type URL declared by the envelope.
        type_url: String,
        /// Underlying decoder error.
        message: String,
    },

    /// Encoding a supported value failed.
    #[error("Failed to encode {type_url} content: {message}")]
    Encode {
        /// Type URL of the value being encoded.
        type_url: String,
        /// Underlying encoder error.
        message: String,
    },

    /// The stored JSON rendering is not a type-tagged object.
    #[error("Invalid content envelope: {0}")]
    InvalidEnvelope(String),
}

// =============================================================================
// Resolve Errors
// =============================================================================

/// Address resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every resolver in the chain declined the message.
    #[error("Message not supported: {kind}")]
    MessageNotSupported {
        /// Type URL of the message.
        kind: String,
    },
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Database and repository errors.
///
/// These errors originate from storage operations like queries,
/// transactions, and data serialization.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Failed to establish database connection.
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    /// SQL query execution failed.
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Database migration failed.
    #[error("Migration error: {0}")]
    MigrationError(String),

    /// Transaction begin/commit failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Parameter payload or row data could not be (de)serialized.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Proposal content could not be encoded or decoded.
    #[error("Content codec error: {0}")]
    Codec(#[from] CodecError),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

// =============================================================================
// Domain Errors
// =============================================================================

/// Business rule violations detected before touching storage.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A status or option string is not one of the known values.
    #[error("Unknown {field} value: {value}")]
    UnknownEnumValue {
        /// Name of the enumerated field.
        field: &'static str,
        /// Offending string.
        value: String,
    },

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<DomainError> for StorageError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Storage(inner) => inner,
            other => StorageError::SerializationError(other.to_string()),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    // Test critique: la chaîne de conversion d'erreurs fonctionne
    #[test]
    fn test_error_conversion_chain() {
        let codec_err = CodecError::UnknownType("/foo.Bar".into());
        let storage_err: StorageError = codec_err.into();
        let domain_err: DomainError = storage_err.into();

        assert!(domain_err.to_string().contains("/foo.Bar"));
    }

    // Test critique: l'erreur "unsupported" porte le type concret pour le debug
    #[test]
    fn test_unsupported_content_names_kind() {
        let err = CodecError::UnsupportedContent {
            kind: "my_chain::OpaqueContent".into(),
        };
        assert!(err.to_string().contains("my_chain::OpaqueContent"));

        let err = ResolveError::MessageNotSupported {
            kind: "/cosmos.feegrant.v1beta1.MsgGrantAllowance".into(),
        };
        assert!(err.to_string().contains("MsgGrantAllowance"));
    }

    #[test]
    fn test_domain_error_unwraps_storage() {
        let domain_err = DomainError::Storage(StorageError::QueryError("boom".into()));
        let storage_err: StorageError = domain_err.into();
        assert!(matches!(storage_err, StorageError::QueryError(_)));
    }
}
