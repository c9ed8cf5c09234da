//! # aadhaar-gen-client
//!
//! Client for the Aadhaar card generator: upload a card, confirm the date of
//! birth when the card only prints the year, wait for the generated previews,
//! and download the printable PDF.
//!
//! ## Workflow Overview
//!
//! ```text
//! file + password
//!  │
//!  ├─ 1. Submit    POST /upload (password defaults to the file's base name)
//!  ├─ 2. Confirm   POST /finalize-dob, only when the card has a year of birth only
//!  ├─ 3. Render    resolve preview URLs, wait for both images to load
//!  └─ 4. Export    POST /generate-pdf → <baseName>-pdf.pdf
//! ```
//!
//! The controller ([`Workflow`]) owns all per-session state and reports every
//! UI effect through a [`WorkflowView`]; the network sits behind the
//! [`Backend`] trait so a browser binding, the bundled CLI, and tests all
//! drive the same state machine.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aadhaar_gen_client::{ClientConfig, Event, HttpBackend, NoopView, Outcome, SelectedFile, Workflow};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder().server_url("http://localhost:3000").build()?;
//!     let backend = HttpBackend::new(&config)?;
//!     let mut workflow = Workflow::new(backend, Arc::new(NoopView), config);
//!
//!     let file = SelectedFile::from_path("card.pdf").await?;
//!     let mut outcome = workflow
//!         .dispatch(Event::Submit { file: Some(file), password: None })
//!         .await?;
//!     if let Outcome::NeedsDob { .. } = outcome {
//!         outcome = workflow
//!             .dispatch(Event::ConfirmDob { date: Some("1990-05-12".into()) })
//!             .await?;
//!     }
//!     if let Outcome::Generated(_) = outcome {
//!         workflow.dispatch(Event::Export).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `aadhaar-gen` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod dob;
pub mod error;
pub mod export;
pub mod http;
pub mod prefs;
pub mod render;
pub mod session;
pub mod view;
pub mod workflow;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{Backend, FinalizeRequest, GeneratedUrls, PdfRequest, ServerResponse, UploadRequest};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use dob::{validate_dob, DobFull};
pub use error::{AssetLoadError, DobError, WorkflowError};
pub use export::{export_pdf, pdf_file_name};
pub use http::HttpBackend;
pub use prefs::{PreferenceStore, Theme};
pub use render::{AssetLoad, LoadedImage, RenderedResult};
pub use session::{derive_base_name, GeneratedAssetPaths, SelectedFile, UploadSession};
pub use view::{BusyGuard, Indicator, NoopView, SharedView, WorkflowView};
pub use workflow::{Event, Outcome, Workflow, WorkflowState};
