//! Per-submission state: the chosen file, its derived name and password, and
//! the paths of the most recent successful generation.

use crate::error::WorkflowError;
use std::path::Path;
use tracing::debug;

/// A document picked by the user.
#[derive(Clone)]
pub struct SelectedFile {
    /// File name as shown to the server (no directory components).
    pub name: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for SelectedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectedFile")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, WorkflowError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| WorkflowError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Selected {} ({} bytes)", name, bytes.len());
        Ok(Self { name, bytes })
    }

    pub fn base_name(&self) -> &str {
        derive_base_name(&self.name)
    }
}

/// Everything before the first `.` of a file name.
///
/// `"card.pdf"` → `"card"`, `"card.v2.pdf"` → `"card"`, `"card"` → `"card"`.
pub fn derive_base_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Credentials and naming for one submission.
///
/// Reused by the finalize call when the server asks for a full date of birth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    pub base_name: String,
    pub password: String,
}

impl UploadSession {
    /// Derive the session for `file`; a blank `password_input` falls back to
    /// the file's base name.
    pub fn new(file: &SelectedFile, password_input: Option<&str>) -> Self {
        let base_name = file.base_name().to_string();
        let password = match password_input.map(str::trim) {
            Some(p) if !p.is_empty() => p.to_string(),
            _ => base_name.clone(),
        };
        Self {
            base_name,
            password,
        }
    }

    pub fn password_defaulted(&self) -> bool {
        self.password == self.base_name
    }
}

/// Absolute URLs of the two generated previews.
///
/// Only built after both previews have settled; `base_name` is the session
/// that produced them and names the exported PDF.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GeneratedAssetPaths {
    pub front_url: String,
    pub back_url: String,
    pub base_name: String,
}

/// The controller-owned state shared between submissions.
#[derive(Debug, Default)]
pub struct WorkflowContext {
    session: Option<UploadSession>,
    generated: Option<GeneratedAssetPaths>,
}

impl WorkflowContext {
    pub fn session(&self) -> Option<&UploadSession> {
        self.session.as_ref()
    }

    pub fn begin(&mut self, session: UploadSession) {
        self.session = Some(session);
    }

    pub fn generated(&self) -> Option<&GeneratedAssetPaths> {
        self.generated.as_ref()
    }

    /// Replace (never merge) the stored generation.
    pub fn commit(&mut self, assets: GeneratedAssetPaths) {
        if let Some(prev) = self.generated.replace(assets) {
            debug!("Superseding previous generation for '{}'", prev.base_name);
        }
    }
}
