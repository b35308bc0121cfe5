// ── Core error types ──
//
// Caller-facing errors from haven-core. These are NOT wire-specific --
// the reconciliation caller never sees raw HTTP statuses or JSON parse
// failures directly. The `From<haven_api::Error>` impl translates
// transport-layer errors into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("cannot reach appliance at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("operation cancelled")]
    Cancelled,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("remote task failed ({code}): {message}")]
    TaskFailed { code: String, message: String },

    #[error("validation failed: {message}")]
    ValidationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("appliance API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a not-found error.
    pub fn not_found(entity_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            identifier: identifier.into(),
        }
    }

    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<haven_api::Error> for CoreError {
    fn from(err: haven_api::Error) -> Self {
        match err {
            haven_api::Error::Config { message } => CoreError::Config { message },
            haven_api::Error::PemFormat(msg) => CoreError::Config {
                message: format!("invalid PEM data: {msg}"),
            },
            haven_api::Error::CertificateParse(msg) => CoreError::Config {
                message: format!("could not parse certificate: {msg}"),
            },
            haven_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        address: e
                            .url()
                            .map(ToString::to_string)
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            haven_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            haven_api::Error::Connection { address, reason } => {
                CoreError::ConnectionFailed { address, reason }
            }
            haven_api::Error::Io(e) => CoreError::Internal(format!("I/O error: {e}")),
            haven_api::Error::HttpStatus { .. } => {
                let status = err.http_status();
                CoreError::Api {
                    message: err.to_string(),
                    status,
                }
            }
            haven_api::Error::Decode { message, body: _ } => {
                CoreError::Internal(format!("decode error: {message}"))
            }
            haven_api::Error::NotFound { entity, identifier } => CoreError::NotFound {
                entity_type: entity.to_owned(),
                identifier,
            },
            haven_api::Error::TaskFailed { code, message } => {
                CoreError::TaskFailed { code, message }
            }
            haven_api::Error::Timeout { timeout_secs, .. } => CoreError::Timeout { timeout_secs },
            haven_api::Error::Cancelled => CoreError::Cancelled,
        }
    }
}
