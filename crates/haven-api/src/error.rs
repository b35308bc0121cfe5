use thiserror::Error;

/// Top-level error type for the `haven-api` crate.
///
/// Covers every failure mode across the appliance client: certificate
/// handling, transport, the HTTP status contract, response decoding,
/// lookup misses, and the async-task lifecycle. `haven-core` maps these
/// into caller-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Certificates & configuration ────────────────────────────────
    /// The pinned service certificate is missing or unusable.
    #[error("invalid service certificate: {message}")]
    Config { message: String },

    /// PEM decoding produced no usable block.
    #[error("invalid PEM data: {0}")]
    PemFormat(String),

    /// The DER payload of a PEM block is not a well-formed certificate.
    #[error("could not parse certificate: {0}")]
    CertificateParse(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TCP/TLS probe failure (thumbprint engine).
    #[error("could not connect to {address}: {reason}")]
    Connection { address: String, reason: String },

    /// File I/O failure (PEM thumbprints, password files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── API contract ────────────────────────────────────────────────
    /// The appliance answered outside the 2xx range. Carries the exact
    /// response body so the server's own diagnostic is never lost.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    HttpStatus {
        method: String,
        url: String,
        status: u16,
        body: String,
    },

    /// JSON response decoding failed, with the raw body for debugging.
    #[error("could not decode response: {message}")]
    Decode { message: String, body: String },

    /// Client-side linear scan over a list endpoint found no match.
    #[error("{entity} {identifier} was not found")]
    NotFound {
        entity: &'static str,
        identifier: String,
    },

    // ── Tasks ───────────────────────────────────────────────────────
    /// A server-side task reached the FAILED state. Non-retryable.
    #[error("task failed with code {code}: {message}")]
    TaskFailed { code: String, message: String },

    /// The poll ceiling elapsed before the task reached a terminal state.
    #[error("timed out after {timeout_secs}s waiting for {operation}")]
    Timeout {
        timeout_secs: u64,
        operation: String,
    },

    /// The caller's cancellation token fired mid-wait.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` for a linear-scan miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if a remote task reported terminal failure.
    ///
    /// Task failures carry the server's error code and message and must
    /// not be retried -- the task will not change state again.
    pub fn is_task_failure(&self) -> bool {
        matches!(self, Self::TaskFailed { .. })
    }

    /// Returns `true` if this is a transient transport failure.
    ///
    /// Only the task poller retries internally; everything else is
    /// single-shot because the mutating operations are not
    /// idempotent-safe. This helper exists for callers that want to
    /// re-run a whole reconcile pass.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }

    /// HTTP status code of the failed request, if this is a status error.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}
