//! PDF export of the most recent generation.
//!
//! The PDF bytes never sit at their final path half-written: they go to a
//! temporary file next to the destination, which is renamed into place on
//! success and removed on every other path.

use crate::api::{Backend, PdfRequest};
use crate::error::WorkflowError;
use crate::render::strip_origin;
use crate::session::GeneratedAssetPaths;
use crate::view::{BusyGuard, Indicator, SharedView};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// `<baseName>-pdf.pdf`.
pub fn pdf_file_name(base_name: &str) -> String {
    format!("{base_name}-pdf.pdf")
}

/// Build the `/generate-pdf` body from stored absolute URLs.
pub fn pdf_request(assets: &GeneratedAssetPaths) -> Result<PdfRequest, WorkflowError> {
    Ok(PdfRequest {
        front_path: strip_origin(&assets.front_url)?,
        back_path: strip_origin(&assets.back_url)?,
        base_name: assets.base_name.clone(),
    })
}

/// Request the PDF and save it as `<output_dir>/<baseName>-pdf.pdf`.
///
/// Holds the PDF indicator busy for the whole call.
pub async fn export_pdf<B: Backend>(
    backend: &B,
    view: &SharedView,
    assets: &GeneratedAssetPaths,
    output_dir: &Path,
) -> Result<PathBuf, WorkflowError> {
    let _busy = BusyGuard::acquire(view, Indicator::Pdf);

    let request = pdf_request(assets)?;
    let bytes = backend.generate_pdf(&request).await?;

    let path = output_dir.join(pdf_file_name(&assets.base_name));
    write_download(&path, &bytes).await?;

    info!("Saved {} ({} bytes)", path.display(), bytes.len());
    view.save_download(&path);
    Ok(path)
}

/// Write `bytes` to `path` via a sibling temporary file.
pub async fn write_download(path: &Path, bytes: &[u8]) -> Result<(), WorkflowError> {
    let write_err = |source| WorkflowError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir).await.map_err(write_err)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".download-")
        .suffix(".part")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    // On error `tmp` is dropped here and the partial file removed.
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name() {
        assert_eq!(pdf_file_name("card"), "card-pdf.pdf");
    }

    #[test]
    fn request_uses_server_relative_paths() {
        let assets = GeneratedAssetPaths {
            front_url: "http://localhost:3000/out/a_front.png".into(),
            back_url: "http://localhost:3000/out/a_back.png".into(),
            base_name: "card".into(),
        };
        let req = pdf_request(&assets).unwrap();
        assert_eq!(req.front_path, "/out/a_front.png");
        assert_eq!(req.back_path, "/out/a_back.png");
        assert_eq!(req.base_name, "card");
    }

    #[tokio::test]
    async fn write_download_leaves_no_partial_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("card-pdf.pdf");
        write_download(&target, b"%PDF-1.7 fake").await.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"%PDF-1.7 fake");
        let names: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["card-pdf.pdf".to_string()]);
    }

    #[tokio::test]
    async fn failed_persist_removes_temporary_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the destination makes the rename fail.
        let target = dir.path().join("card-pdf.pdf");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), b"x").unwrap();

        let err = write_download(&target, b"%PDF").await.unwrap_err();
        assert!(matches!(err, WorkflowError::OutputWriteFailed { .. }));

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "leftover temp files: {leftovers:?}");
    }
}
