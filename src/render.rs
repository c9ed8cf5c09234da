//! Result rendering: turn server-relative asset paths into loaded previews.
//!
//! ```text
//! GeneratedUrls ──resolve──▶ absolute URLs ──▶ previews + download links
//!                                   │
//!                         load front ∧ load back   (concurrent, unordered)
//!                                   │
//!                  reveal preview · hide instructions · toast
//! ```
//!
//! A preview "loads" when its bytes are fetched and decode as an image. A
//! failed load is logged and recorded but does not stop the flow.

use crate::api::{Backend, GeneratedUrls};
use crate::config::ClientConfig;
use crate::error::{AssetLoadError, WorkflowError};
use crate::session::GeneratedAssetPaths;
use crate::view::SharedView;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Toast shown once both previews have settled.
pub const SUCCESS_TOAST: &str = "Aadhaar card generated successfully!";

/// A decoded preview.
#[derive(Clone)]
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for LoadedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedImage")
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// How one preview load settled.
#[derive(Debug, Clone)]
pub struct AssetLoad {
    pub url: String,
    pub result: Result<LoadedImage, AssetLoadError>,
}

impl AssetLoad {
    pub fn is_loaded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything the renderer produced.
#[derive(Debug, Clone)]
pub struct RenderedResult {
    pub assets: GeneratedAssetPaths,
    pub front: AssetLoad,
    pub back: AssetLoad,
}

/// Resolve a server-relative path against the server's origin.
///
/// `/out/a_front.png` on `http://localhost:3000` → `http://localhost:3000/out/a_front.png`.
/// Anything that would leave the origin (`//host/...`, `https://other/...`)
/// is refused.
pub fn resolve_asset_url(config: &ClientConfig, path: &str) -> Result<Url, WorkflowError> {
    let invalid = |reason: String| WorkflowError::InvalidUrl {
        url: path.to_string(),
        reason,
    };

    let origin = config.origin();
    let off_origin = path.starts_with("//")
        || path.starts_with("/\\")
        || Url::parse(path).is_ok();
    if off_origin {
        return Err(invalid(format!("not a path on {origin}")));
    }

    let joined = if path.starts_with('/') {
        format!("{origin}{path}")
    } else {
        format!("{origin}/{path}")
    };
    let url = Url::parse(&joined).map_err(|e| invalid(e.to_string()))?;
    if url.origin().ascii_serialization() != origin {
        return Err(invalid(format!("not a path on {origin}")));
    }
    Ok(url)
}

/// Strip scheme, host and query from an absolute URL, keeping the path the
/// server resolves against its own file tree.
pub fn strip_origin(url: &str) -> Result<String, WorkflowError> {
    Url::parse(url)
        .map(|u| u.path().to_string())
        .map_err(|e| WorkflowError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
}

/// Show a successful generation and wait for both previews to settle.
pub async fn render_result<B: Backend>(
    backend: &B,
    view: &SharedView,
    config: &ClientConfig,
    urls: &GeneratedUrls,
    base_name: &str,
) -> Result<RenderedResult, WorkflowError> {
    let front_url = resolve_asset_url(config, &urls.download_url_front)?;
    let back_url = resolve_asset_url(config, &urls.download_url_back)?;

    view.set_previews(front_url.as_str(), back_url.as_str());
    view.set_download_links(front_url.as_str(), back_url.as_str());

    let timeout = config.asset_load_timeout();
    let (front, back) = futures::join!(
        load_asset(backend, &front_url, timeout),
        load_asset(backend, &back_url, timeout),
    );
    for load in [&front, &back] {
        if let Err(e) = &load.result {
            warn!("{}", e);
        }
    }

    view.reveal_preview();
    view.hide_instructions();
    view.toast(SUCCESS_TOAST, config.toast_duration());
    info!(
        "Card '{}' ready ({}/2 previews loaded)",
        base_name,
        [&front, &back].iter().filter(|l| l.is_loaded()).count()
    );

    Ok(RenderedResult {
        assets: GeneratedAssetPaths {
            front_url: front_url.to_string(),
            back_url: back_url.to_string(),
            base_name: base_name.to_string(),
        },
        front,
        back,
    })
}

async fn load_asset<B: Backend>(backend: &B, url: &Url, timeout: Option<Duration>) -> AssetLoad {
    let result = match timeout {
        Some(limit) => match tokio::time::timeout(limit, fetch_and_decode(backend, url)).await {
            Ok(r) => r,
            Err(_) => Err(AssetLoadError::Timeout {
                url: url.to_string(),
                secs: limit.as_secs(),
            }),
        },
        None => fetch_and_decode(backend, url).await,
    };
    AssetLoad {
        url: url.to_string(),
        result,
    }
}

async fn fetch_and_decode<B: Backend>(
    backend: &B,
    url: &Url,
) -> Result<LoadedImage, AssetLoadError> {
    let bytes = backend
        .fetch_asset(url)
        .await
        .map_err(|e| AssetLoadError::Fetch {
            url: url.to_string(),
            detail: e.to_string(),
        })?;

    // Decoding is CPU-bound; keep it off the async workers.
    let url_str = url.to_string();
    tokio::task::spawn_blocking(move || -> Result<LoadedImage, AssetLoadError> {
        let img = image::load_from_memory(&bytes).map_err(|e| AssetLoadError::Decode {
            url: url_str.clone(),
            detail: e.to_string(),
        })?;
        debug!("Loaded {} ({}x{})", url_str, img.width(), img.height());
        Ok(LoadedImage {
            width: img.width(),
            height: img.height(),
            bytes,
        })
    })
    .await
    .map_err(|e| AssetLoadError::Decode {
        url: url.to_string(),
        detail: format!("decoder task failed: {e}"),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_against_origin() {
        let config = ClientConfig::builder()
            .server_url("http://localhost:3000/form/")
            .build()
            .unwrap();
        let url = resolve_asset_url(&config, "/out/a_front.png").unwrap();
        assert_eq!(url.as_str(), format!("{}/out/a_front.png", config.origin()));
    }

    #[test]
    fn relative_path_without_slash() {
        let config = ClientConfig::default();
        let url = resolve_asset_url(&config, "out/a_back.png").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3000/out/a_back.png");
    }

    #[test]
    fn refuses_paths_that_leave_the_origin() {
        let config = ClientConfig::default();
        for path in [
            "//evil.example/out/a_front.png",
            "/\\evil.example/out/a_front.png",
            "https://other.example/out/a_front.png",
            "http://localhost:3000.evil.example/a.png",
        ] {
            let err = resolve_asset_url(&config, path).unwrap_err();
            assert!(
                matches!(err, WorkflowError::InvalidUrl { .. }),
                "{path} → {err:?}"
            );
        }
    }

    #[test]
    fn resolved_url_round_trips_through_strip_origin() {
        let config = ClientConfig::default();
        let url = resolve_asset_url(&config, "/out/a_front.png?v=2").unwrap();
        assert!(url.as_str().starts_with("http://localhost:3000/"));
        assert_eq!(strip_origin(url.as_str()).unwrap(), "/out/a_front.png");
    }

    #[test]
    fn strip_origin_keeps_path_only() {
        assert_eq!(
            strip_origin("http://localhost:3000/out/a_front.png?v=2").unwrap(),
            "/out/a_front.png"
        );
        assert!(strip_origin("/out/a_front.png").is_err());
    }
}
