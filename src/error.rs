//! Error types for the aadhaar-gen client.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`WorkflowError`]: the user action (submit, confirm, export) did not
//!   complete. Every variant is recoverable: the controller has already put
//!   the view back into an interactive state before returning it.
//!
//! * [`DobError`]: the date-of-birth field failed local validation. Carried
//!   inside [`WorkflowError::InvalidDob`]; no request was sent.
//!
//! * [`AssetLoadError`]: one preview image could not be loaded. Non-fatal:
//!   stored in [`crate::render::AssetLoad`] and logged, the workflow still
//!   reaches `Ready`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by a workflow action.
#[derive(Debug, Error)]
pub enum WorkflowError {
    // ── Validation errors ─────────────────────────────────────────────────
    /// The date of birth was missing, malformed, or in the wrong year.
    #[error(transparent)]
    InvalidDob(#[from] DobError),

    /// An event arrived that the current state cannot accept.
    #[error("Cannot handle {event} while {state}")]
    InvalidTransition {
        state: &'static str,
        event: &'static str,
    },

    /// The selected file could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Credential errors ─────────────────────────────────────────────────
    /// The server could not open the document with the supplied password.
    #[error("Wrong password: {message}")]
    WrongPassword { message: String },

    // ── Finalize errors ───────────────────────────────────────────────────
    /// The server refused the disambiguated date of birth.
    #[error("Date of birth rejected: {message}")]
    FinalizeRejected { message: String },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The request could not be sent or its body could not be read.
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    /// The server answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// The request did not complete within the configured timeout.
    #[error("Request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    /// The server answered 2xx but the body did not match the contract.
    #[error("Malformed response from {endpoint}: {detail}")]
    MalformedResponse { endpoint: String, detail: String },

    /// A server-relative path or absolute URL could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write the downloaded PDF.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl WorkflowError {
    /// `true` for errors that never reached the network.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            WorkflowError::InvalidDob(_)
                | WorkflowError::InvalidTransition { .. }
                | WorkflowError::FileRead { .. }
                | WorkflowError::InvalidConfig(_)
        )
    }
}

/// Inline validation failure of the date-of-birth field.
///
/// The `Display` text is the message shown next to the field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DobError {
    #[error("Please pick a date.")]
    Missing,

    #[error("Please pick a valid date (yyyy-mm-dd), got '{input}'.")]
    Malformed { input: String },

    #[error("Year must match {expected}. You picked {picked}.")]
    YearMismatch { expected: String, picked: String },
}

/// A preview image that did not load.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum AssetLoadError {
    #[error("Failed to load image {url}: {detail}")]
    Fetch { url: String, detail: String },

    #[error("Image {url} is not a decodable picture: {detail}")]
    Decode { url: String, detail: String },

    #[error("Image {url} did not load within {secs}s")]
    Timeout { url: String, secs: u64 },
}
