//! Wire contract of the generation server and the [`Backend`] seam.
//!
//! ```text
//! POST /upload        multipart{aadhaar, password}  → ServerResponse
//! POST /finalize-dob  {baseName, dobFull}           → ServerResponse
//! POST /generate-pdf  {frontPath, backPath, baseName} → PDF bytes
//! GET  <preview url>                                → image bytes
//! ```

use crate::error::WorkflowError;
use crate::session::SelectedFile;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::future::Future;

pub const UPLOAD_ENDPOINT: &str = "/upload";
pub const FINALIZE_ENDPOINT: &str = "/finalize-dob";
pub const GENERATE_PDF_ENDPOINT: &str = "/generate-pdf";

/// Server-relative paths of the two generated card faces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedUrls {
    pub download_url_front: String,
    pub download_url_back: String,
}

/// Outcome of an upload or finalize call, one variant per case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerResponse {
    /// The server could not process the document (wrong password on upload,
    /// refused date on finalize).
    Rejected { error: String },
    /// The document only carries a year of birth.
    RequiresDob { yob: String },
    /// Both card faces were generated.
    Generated(GeneratedUrls),
}

/// The JSON body exactly as the server sends it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawServerResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub requires_dob: Option<bool>,
    #[serde(default)]
    pub yob: Option<serde_json::Value>,
    #[serde(default)]
    pub download_url_front: Option<String>,
    #[serde(default)]
    pub download_url_back: Option<String>,
}

impl ServerResponse {
    /// Classify a raw body: `requiresDob`, then `error`, then success.
    pub fn from_raw(raw: RawServerResponse, endpoint: &str) -> Result<Self, WorkflowError> {
        if raw.requires_dob.unwrap_or(false) {
            let yob = match raw.yob {
                Some(serde_json::Value::String(s)) => s,
                Some(serde_json::Value::Number(n)) => n.to_string(),
                other => {
                    return Err(WorkflowError::MalformedResponse {
                        endpoint: endpoint.to_string(),
                        detail: format!("requiresDob without a usable yob: {other:?}"),
                    })
                }
            };
            return Ok(ServerResponse::RequiresDob { yob });
        }

        if let Some(error) = raw.error {
            return Ok(ServerResponse::Rejected { error });
        }

        match (raw.download_url_front, raw.download_url_back) {
            (Some(download_url_front), Some(download_url_back)) => {
                Ok(ServerResponse::Generated(GeneratedUrls {
                    download_url_front,
                    download_url_back,
                }))
            }
            _ => Err(WorkflowError::MalformedResponse {
                endpoint: endpoint.to_string(),
                detail: "missing downloadUrlFront/downloadUrlBack".into(),
            }),
        }
    }

    /// Parse a JSON body.
    pub fn from_json(body: &[u8], endpoint: &str) -> Result<Self, WorkflowError> {
        let raw: RawServerResponse =
            serde_json::from_slice(body).map_err(|e| WorkflowError::MalformedResponse {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;
        Self::from_raw(raw, endpoint)
    }
}

/// Multipart body of `/upload`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub file: SelectedFile,
    pub password: String,
}

/// JSON body of `/finalize-dob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeRequest {
    pub base_name: String,
    /// `dd/mm/yyyy`.
    pub dob_full: String,
}

/// JSON body of `/generate-pdf`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfRequest {
    pub front_path: String,
    pub back_path: String,
    pub base_name: String,
}

/// Transport used by the workflow.
///
/// [`crate::http::HttpBackend`] talks to a real server; tests plug in an
/// in-memory implementation.
pub trait Backend: Send + Sync {
    /// `POST /upload`. Wrong passwords come back in-band as
    /// [`ServerResponse::Rejected`].
    fn upload(
        &self,
        request: UploadRequest,
    ) -> impl Future<Output = Result<ServerResponse, WorkflowError>> + Send;

    /// `POST /finalize-dob`. A non-success status with a JSON body maps to
    /// [`ServerResponse::Rejected`] with the server's message; one without
    /// is an error.
    fn finalize_dob(
        &self,
        request: &FinalizeRequest,
    ) -> impl Future<Output = Result<ServerResponse, WorkflowError>> + Send;

    /// `POST /generate-pdf`, returning the PDF bytes.
    fn generate_pdf(
        &self,
        request: &PdfRequest,
    ) -> impl Future<Output = Result<Vec<u8>, WorkflowError>> + Send;

    /// `GET` a generated preview.
    fn fetch_asset(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, WorkflowError>> + Send;
}
