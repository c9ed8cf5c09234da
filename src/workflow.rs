//! The upload → confirm → render → export controller.
//!
//! ## State machine
//!
//! ```text
//!  Idle ──Submit──▶ Submitting ──┬─ Rejected ────────────▶ Idle
//!                                ├─ RequiresDob ─────────▶ NeedsDob
//!                                └─ Generated ─▶ Rendering ─▶ Ready
//!
//!  NeedsDob ──ConfirmDob──▶ Finalizing ──┬─ refused ─▶ NeedsDob (retry)
//!      │                                 └─ accepted ─▶ Rendering ─▶ Ready
//!      └──CancelDob──▶ Idle
//!
//!  any ──Export──▶ Exporting ──▶ (previous state)
//! ```
//!
//! Every UI side effect goes through the [`WorkflowView`]; every network call
//! through the [`Backend`]. `dispatch` takes `&mut self`, so at most one user
//! action is in flight at a time.

use crate::api::{Backend, FinalizeRequest, GeneratedUrls, ServerResponse, UploadRequest};
use crate::config::ClientConfig;
use crate::dob::{dob_prompt, validate_dob};
use crate::error::WorkflowError;
use crate::export::export_pdf;
use crate::render::{render_result, RenderedResult};
use crate::session::{GeneratedAssetPaths, SelectedFile, UploadSession, WorkflowContext};
use crate::view::{BusyGuard, Indicator, SharedView, WorkflowView};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const PASSWORD_ERROR: &str = "Wrong password detected. Please enter it manually.";
pub const UPLOAD_FAILED_ALERT: &str = "Something went wrong";
pub const FINALIZE_FAILED: &str = "Something went wrong while finalizing.";
pub const PDF_FAILED_ALERT: &str = "Failed to generate PDF";

/// Where the workflow currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Submitting,
    /// The prompt for a full date of birth is open.
    NeedsDob { yob: String },
    Finalizing,
    Rendering,
    Ready,
    Exporting,
}

impl WorkflowState {
    fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Submitting => "submitting",
            WorkflowState::NeedsDob { .. } => "waiting for date of birth",
            WorkflowState::Finalizing => "finalizing",
            WorkflowState::Rendering => "rendering",
            WorkflowState::Ready => "ready",
            WorkflowState::Exporting => "exporting",
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// User actions fed into the controller.
#[derive(Debug, Clone)]
pub enum Event {
    /// The form was submitted. `file: None` means nothing was picked.
    Submit {
        file: Option<SelectedFile>,
        password: Option<String>,
    },
    /// Confirm in the date-of-birth prompt; `date` is the raw `yyyy-mm-dd`.
    ConfirmDob { date: Option<String> },
    CancelDob,
    /// Download the PDF of the most recent generation.
    Export,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Event::Submit { .. } => "submit",
            Event::ConfirmDob { .. } => "confirm date of birth",
            Event::CancelDob => "cancel date of birth",
            Event::Export => "export",
        }
    }
}

/// Successful result of one [`Workflow::dispatch`].
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Nothing to do (no file selected, nothing generated yet).
    Ignored,
    /// The server wants the full date of birth; the prompt is open.
    NeedsDob { yob: String },
    DobCancelled,
    /// Both previews settled; the assets are now the export target.
    Generated(Box<RenderedResult>),
    /// The PDF was saved to this path.
    Exported(PathBuf),
}

/// Drives one user's session against a [`Backend`].
pub struct Workflow<B: Backend> {
    backend: B,
    view: SharedView,
    config: ClientConfig,
    state: WorkflowState,
    context: WorkflowContext,
}

impl<B: Backend> Workflow<B> {
    pub fn new(backend: B, view: Arc<dyn WorkflowView>, config: ClientConfig) -> Self {
        Self {
            backend,
            view,
            config,
            state: WorkflowState::Idle,
            context: WorkflowContext::default(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn generated(&self) -> Option<&GeneratedAssetPaths> {
        self.context.generated()
    }

    pub fn session(&self) -> Option<&UploadSession> {
        self.context.session()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Feed one user action into the state machine.
    ///
    /// On `Err` the view has already been told (inline message or alert) and
    /// every busy indicator has been released.
    pub async fn dispatch(&mut self, event: Event) -> Result<Outcome, WorkflowError> {
        debug!("{} ← {}", self.state, event.name());
        match (event, self.state.clone()) {
            (
                Event::Submit { file, password },
                WorkflowState::Idle | WorkflowState::Ready | WorkflowState::NeedsDob { .. },
            ) => {
                let Some(file) = file else {
                    debug!("Submit without a file; ignoring");
                    return Ok(Outcome::Ignored);
                };
                if matches!(self.state, WorkflowState::NeedsDob { .. }) {
                    self.view.close_dob_modal();
                }
                self.submit(file, password.as_deref()).await
            }
            (Event::ConfirmDob { date }, WorkflowState::NeedsDob { yob }) => {
                self.confirm_dob(date.as_deref(), yob).await
            }
            (Event::CancelDob, WorkflowState::NeedsDob { .. }) => {
                self.view.close_dob_modal();
                self.state = WorkflowState::Idle;
                info!("Date of birth prompt cancelled");
                Ok(Outcome::DobCancelled)
            }
            (Event::Export, _) => self.export().await,
            (event, state) => Err(WorkflowError::InvalidTransition {
                state: state.name(),
                event: event.name(),
            }),
        }
    }

    async fn submit(
        &mut self,
        file: SelectedFile,
        password_input: Option<&str>,
    ) -> Result<Outcome, WorkflowError> {
        let session = UploadSession::new(&file, password_input);
        info!(
            "Uploading '{}' ({} password)",
            file.name,
            if session.password_defaulted() {
                "default"
            } else {
                "manual"
            }
        );

        self.state = WorkflowState::Submitting;
        let busy = BusyGuard::acquire(&self.view, Indicator::Submit);

        let response = self
            .backend
            .upload(UploadRequest {
                file,
                password: session.password.clone(),
            })
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                error!("Upload failed: {}", e);
                self.view.alert(UPLOAD_FAILED_ALERT);
                self.state = WorkflowState::Idle;
                return Err(e);
            }
        };

        match response {
            ServerResponse::RequiresDob { yob } => {
                self.context.begin(session);
                // The prompt is its own operation; the submit control is free again.
                drop(busy);
                self.view.open_dob_modal(&dob_prompt(&yob));
                info!("Server needs the full date of birth (year {})", yob);
                self.state = WorkflowState::NeedsDob { yob: yob.clone() };
                Ok(Outcome::NeedsDob { yob })
            }
            ServerResponse::Rejected { error } => {
                warn!("Upload rejected: {}", error);
                self.view.show_password_error(PASSWORD_ERROR);
                self.view.reveal_password_input();
                self.state = WorkflowState::Idle;
                Err(WorkflowError::WrongPassword { message: error })
            }
            ServerResponse::Generated(urls) => {
                self.view.clear_password_error();
                let base_name = session.base_name.clone();
                self.context.begin(session);
                self.render(&urls, &base_name).await
            }
        }
    }

    async fn confirm_dob(
        &mut self,
        date: Option<&str>,
        yob: String,
    ) -> Result<Outcome, WorkflowError> {
        let dob = match validate_dob(date, &yob) {
            Ok(dob) => dob,
            Err(e) => {
                self.view.show_dob_error(&e.to_string());
                return Err(e.into());
            }
        };

        let base_name = self
            .context
            .session()
            .map(|s| s.base_name.clone())
            .unwrap_or_default();
        let request = FinalizeRequest {
            base_name: base_name.clone(),
            dob_full: dob.to_string(),
        };
        info!("Finalizing '{}' with {}", base_name, request.dob_full);

        self.state = WorkflowState::Finalizing;
        let busy = BusyGuard::acquire(&self.view, Indicator::Dob);
        let response = self.backend.finalize_dob(&request).await;

        let failure = match response {
            Ok(ServerResponse::Generated(urls)) => {
                drop(busy);
                self.view.close_dob_modal();
                return self.render(&urls, &base_name).await;
            }
            Ok(ServerResponse::Rejected { error }) => {
                warn!("Date of birth rejected: {}", error);
                self.view.show_dob_error(&error);
                WorkflowError::FinalizeRejected { message: error }
            }
            Ok(ServerResponse::RequiresDob { .. }) => {
                self.view.show_dob_error(FINALIZE_FAILED);
                WorkflowError::MalformedResponse {
                    endpoint: crate::api::FINALIZE_ENDPOINT.to_string(),
                    detail: "server asked for the date of birth again".into(),
                }
            }
            Err(e) => {
                error!("Finalize failed: {}", e);
                self.view.show_dob_error(FINALIZE_FAILED);
                e
            }
        };

        // The prompt stays open for another attempt.
        self.state = WorkflowState::NeedsDob { yob };
        Err(failure)
    }

    async fn render(
        &mut self,
        urls: &GeneratedUrls,
        base_name: &str,
    ) -> Result<Outcome, WorkflowError> {
        self.state = WorkflowState::Rendering;
        match render_result(&self.backend, &self.view, &self.config, urls, base_name).await {
            Ok(rendered) => {
                self.context.commit(rendered.assets.clone());
                self.state = WorkflowState::Ready;
                Ok(Outcome::Generated(Box::new(rendered)))
            }
            Err(e) => {
                error!("Could not show result: {}", e);
                self.view.alert(UPLOAD_FAILED_ALERT);
                self.state = WorkflowState::Idle;
                Err(e)
            }
        }
    }

    async fn export(&mut self) -> Result<Outcome, WorkflowError> {
        let Some(assets) = self.context.generated().cloned() else {
            debug!("Export requested before any generation; ignoring");
            return Ok(Outcome::Ignored);
        };

        let previous = std::mem::replace(&mut self.state, WorkflowState::Exporting);
        let result = export_pdf(&self.backend, &self.view, &assets, &self.config.output_dir).await;
        self.state = previous;

        match result {
            Ok(path) => Ok(Outcome::Exported(path)),
            Err(e) => {
                error!("PDF export failed: {}", e);
                self.view.alert(PDF_FAILED_ALERT);
                Err(e)
            }
        }
    }
}
