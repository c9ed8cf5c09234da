//! reqwest implementation of [`Backend`].

use crate::api::{
    Backend, FinalizeRequest, PdfRequest, ServerResponse, UploadRequest, FINALIZE_ENDPOINT,
    GENERATE_PDF_ENDPOINT, UPLOAD_ENDPOINT,
};
use crate::config::ClientConfig;
use crate::error::WorkflowError;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use std::time::Duration;
use tracing::debug;

/// Fallback message when `/finalize-dob` refuses without an `error` field.
pub const FINALIZE_FALLBACK_ERROR: &str = "Failed to finalize.";

/// Talks to a live generation server.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, WorkflowError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WorkflowError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn send_error(&self, endpoint: &str, e: reqwest::Error) -> WorkflowError {
        if e.is_timeout() {
            WorkflowError::Timeout {
                endpoint: endpoint.to_string(),
                secs: self.config.request_timeout_secs,
            }
        } else {
            WorkflowError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn body(&self, endpoint: &str, response: Response) -> Result<Vec<u8>, WorkflowError> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| self.send_error(endpoint, e))
    }
}

impl Backend for HttpBackend {
    async fn upload(&self, request: UploadRequest) -> Result<ServerResponse, WorkflowError> {
        let url = self.config.endpoint(UPLOAD_ENDPOINT)?;
        let file_part = Part::bytes(request.file.bytes).file_name(request.file.name);
        let form = Form::new()
            .part("aadhaar", file_part)
            .text("password", request.password);

        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(UPLOAD_ENDPOINT, e))?;
        let status = response.status();
        debug!("{} → HTTP {}", UPLOAD_ENDPOINT, status);

        // Wrong passwords arrive as `{error}` bodies, whatever the status.
        let body = self.body(UPLOAD_ENDPOINT, response).await?;
        match ServerResponse::from_json(&body, UPLOAD_ENDPOINT) {
            Err(WorkflowError::MalformedResponse { .. }) if !status.is_success() => {
                Err(WorkflowError::HttpStatus {
                    endpoint: UPLOAD_ENDPOINT.to_string(),
                    status: status.as_u16(),
                })
            }
            other => other,
        }
    }

    async fn finalize_dob(
        &self,
        request: &FinalizeRequest,
    ) -> Result<ServerResponse, WorkflowError> {
        let url = self.config.endpoint(FINALIZE_ENDPOINT)?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(FINALIZE_ENDPOINT, e))?;
        let status = response.status();
        debug!("{} → HTTP {}", FINALIZE_ENDPOINT, status);

        let body = self.body(FINALIZE_ENDPOINT, response).await?;
        if !status.is_success() {
            // A JSON refusal is shown inline; anything else is a broken reply.
            let raw = serde_json::from_slice::<crate::api::RawServerResponse>(&body).map_err(
                |_| WorkflowError::HttpStatus {
                    endpoint: FINALIZE_ENDPOINT.to_string(),
                    status: status.as_u16(),
                },
            )?;
            let error = raw
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| FINALIZE_FALLBACK_ERROR.to_string());
            return Ok(ServerResponse::Rejected { error });
        }
        ServerResponse::from_json(&body, FINALIZE_ENDPOINT)
    }

    async fn generate_pdf(&self, request: &PdfRequest) -> Result<Vec<u8>, WorkflowError> {
        let url = self.config.endpoint(GENERATE_PDF_ENDPOINT)?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.send_error(GENERATE_PDF_ENDPOINT, e))?;

        if !response.status().is_success() {
            return Err(WorkflowError::HttpStatus {
                endpoint: GENERATE_PDF_ENDPOINT.to_string(),
                status: response.status().as_u16(),
            });
        }

        let bytes = self.body(GENERATE_PDF_ENDPOINT, response).await?;
        debug!("{} → {} bytes", GENERATE_PDF_ENDPOINT, bytes.len());
        Ok(bytes)
    }

    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>, WorkflowError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| self.send_error(url.path(), e))?;

        if !response.status().is_success() {
            return Err(WorkflowError::HttpStatus {
                endpoint: url.path().to_string(),
                status: response.status().as_u16(),
            });
        }
        self.body(url.path(), response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let backend = HttpBackend::new(&ClientConfig::default()).unwrap();
        assert_eq!(
            backend.config.endpoint(UPLOAD_ENDPOINT).unwrap().as_str(),
            "http://localhost:3000/upload"
        );
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        // Port 9 (discard) is closed on any sane test host.
        let config = ClientConfig::builder()
            .server_url("http://127.0.0.1:9")
            .request_timeout_secs(5)
            .build()
            .unwrap();
        let backend = HttpBackend::new(&config).unwrap();
        let err = backend
            .generate_pdf(&PdfRequest {
                front_path: "/out/a_front.png".into(),
                back_path: "/out/a_back.png".into(),
                base_name: "card".into(),
            })
            .await
            .unwrap_err();
        assert!(
            matches!(
                err,
                WorkflowError::Transport { .. } | WorkflowError::Timeout { .. }
            ),
            "got {err:?}"
        );
    }
}
