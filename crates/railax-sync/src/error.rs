//! # Sync Error Types
//!
//! Error types for connectivity, reconciliation and settings operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sync Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Connectivity   │  │ RemoteRejection │  │  MalformedResponse      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Offline        │  │  Rejected       │  │  MalformedResponse      │ │
//! │  │  Network        │  │  (status, body) │  │                         │ │
//! │  │  Timeout        │  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │    Storage      │  │     Config      │  │  Domain / Internal      │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Storage(DbErr) │  │  InvalidConfig  │  │  Domain(CoreError)      │ │
//! │  │                 │  │  InvalidUrl     │  │  ShuttingDown           │ │
//! │  │                 │  │  ConfigLoad/Save│  │  Internal               │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Connectivity failures degrade to local-only persistence; only a       │
//! │  Storage failure means a write was not durably recorded.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use railax_core::CoreError;
use railax_db::DbError;
use thiserror::Error;

/// Result type alias for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Sync error type covering all possible sync failures.
#[derive(Debug, Error)]
pub enum SyncError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid sync configuration.
    #[error("Invalid sync configuration: {0}")]
    InvalidConfig(String),

    /// Invalid remote base URL.
    #[error("Invalid remote URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Connectivity Errors
    // =========================================================================
    /// The classifier reports no usable link; the call was not attempted.
    #[error("Offline: {0}")]
    Offline(String),

    /// Connection-level failure (DNS, refused, reset, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within its deadline.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    // =========================================================================
    // Remote Errors
    // =========================================================================
    /// The remote answered with a non-success status.
    #[error("Remote rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The remote answered but the payload did not decode.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Local persistence failed, or the store refused the write.
    #[error("Storage error: {0}")]
    Storage(DbError),

    /// Domain rule violation.
    #[error(transparent)]
    Domain(#[from] CoreError),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The agent or service is shutting down.
    #[error("Sync agent is shutting down")]
    ShuttingDown,

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The failure taxonomy surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Connectivity,
    RemoteRejection,
    MalformedResponse,
    Storage,
    Config,
    Domain,
    Internal,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for SyncError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(e) => SyncError::Domain(e),
            other => SyncError::Storage(other),
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SyncError::Timeout(0)
        } else if err.is_decode() {
            SyncError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            SyncError::Rejected {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            SyncError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::MalformedResponse(err.to_string())
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SyncError {
    fn from(err: toml::ser::Error) -> Self {
        SyncError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl SyncError {
    /// Maps the error onto the UI-facing taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            SyncError::Offline(_) | SyncError::Network(_) | SyncError::Timeout(_) => {
                ErrorCategory::Connectivity
            }
            SyncError::Rejected { .. } => ErrorCategory::RemoteRejection,
            SyncError::MalformedResponse(_) => ErrorCategory::MalformedResponse,
            SyncError::Storage(
                DbError::NotFound { .. } | DbError::InvalidState { .. } | DbError::StateConflict { .. },
            ) => ErrorCategory::Domain,
            SyncError::Storage(_) => ErrorCategory::Storage,
            SyncError::InvalidConfig(_)
            | SyncError::InvalidUrl(_)
            | SyncError::ConfigLoadFailed(_)
            | SyncError::ConfigSaveFailed(_) => ErrorCategory::Config,
            SyncError::Domain(_) => ErrorCategory::Domain,
            SyncError::ShuttingDown | SyncError::Internal(_) => ErrorCategory::Internal,
        }
    }

    /// Returns true if the failure means the remote could not be reached.
    pub fn is_connectivity(&self) -> bool {
        self.category() == ErrorCategory::Connectivity
    }

    /// Returns true if local persistence failed.
    pub fn is_storage(&self) -> bool {
        self.category() == ErrorCategory::Storage
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        self.category() == ErrorCategory::Config
    }

    /// Attaches the configured deadline to a timeout raised by the client.
    pub(crate) fn with_timeout_secs(self, secs: u64) -> Self {
        match self {
            SyncError::Timeout(_) => SyncError::Timeout(secs),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(SyncError::Timeout(10).category(), ErrorCategory::Connectivity);
        assert_eq!(SyncError::Offline("no link".into()).category(), ErrorCategory::Connectivity);
        assert_eq!(
            SyncError::Rejected { status: 500, body: "boom".into() }.category(),
            ErrorCategory::RemoteRejection
        );
        assert_eq!(
            SyncError::MalformedResponse("eof".into()).category(),
            ErrorCategory::MalformedResponse
        );
        assert!(SyncError::Storage(DbError::PoolExhausted).is_storage());
        assert!(SyncError::InvalidUrl("x".into()).is_config_error());
    }

    #[test]
    fn test_db_errors_split_by_cause() {
        let domain: SyncError = DbError::Domain(CoreError::AlreadyCompleted {
            booking_id: "BK-1".into(),
        })
        .into();
        assert!(matches!(domain, SyncError::Domain(_)));

        let missing: SyncError = DbError::not_found("Booking", "BK-1").into();
        assert_eq!(missing.category(), ErrorCategory::Domain);

        let unknown: SyncError = DbError::InvalidState {
            booking_id: "BK-1".into(),
            code: 9,
        }
        .into();
        assert_eq!(unknown.category(), ErrorCategory::Domain);
        assert!(!unknown.is_storage());
    }

    #[test]
    fn test_error_display() {
        let err = SyncError::Rejected {
            status: 422,
            body: "missing guest_name".into(),
        };
        assert_eq!(
            err.to_string(),
            "Remote rejected request with status 422: missing guest_name"
        );
        assert_eq!(
            SyncError::Timeout(10).with_timeout_secs(3).to_string(),
            "Request timed out after 3 seconds"
        );
    }
}
