//! HTTP transport tests.
//!
//! Each test starts an axum router on an ephemeral port with scripted
//! status/body pairs and points an [`HttpBackend`] at it.

use aadhaar_gen_client::{
    Backend, ClientConfig, Event, FinalizeRequest, HttpBackend, NoopView, Outcome, PdfRequest,
    SelectedFile, ServerResponse, UploadRequest, Workflow, WorkflowError, WorkflowState,
};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

// ── Scripted server ──────────────────────────────────────────────────────────

async fn serve(app: Router) -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    ClientConfig::builder()
        .server_url(format!("http://{addr}"))
        .request_timeout_secs(10)
        .build()
        .unwrap()
}

async fn backend_for(app: Router) -> HttpBackend {
    HttpBackend::new(&serve(app).await).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
struct FormField {
    name: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

type Fields = Arc<Mutex<Vec<FormField>>>;
type Bodies = Arc<Mutex<Vec<Value>>>;

async fn record_upload(State(fields): State<Fields>, mut form: Multipart) -> Json<Value> {
    while let Some(field) = form.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        fields.lock().unwrap().push(FormField {
            name,
            file_name,
            bytes,
        });
    }
    Json(json!({ "requiresDob": true, "yob": 1990 }))
}

async fn refuse_finalize(
    State(bodies): State<Bodies>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    bodies.lock().unwrap().push(body);
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({ "error": "DOB does not match records" })),
    )
}

async fn pdf_bytes(State(bodies): State<Bodies>, Json(body): Json<Value>) -> Vec<u8> {
    bodies.lock().unwrap().push(body);
    b"%PDF-1.7 card".to_vec()
}

fn upload_request() -> UploadRequest {
    UploadRequest {
        file: SelectedFile::new("card.pdf", b"%PDF-1.7 upload".to_vec()),
        password: "card".into(),
    }
}

fn finalize_request() -> FinalizeRequest {
    FinalizeRequest {
        base_name: "card".into(),
        dob_full: "12/05/1990".into(),
    }
}

fn pdf_request() -> PdfRequest {
    PdfRequest {
        front_path: "/out/a_front.png".into(),
        back_path: "/out/a_back.png".into(),
        base_name: "card".into(),
    }
}

fn png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([0, 90, 200]));
    let mut buf = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

// ── /upload ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_sends_card_and_password_fields() {
    let fields = Fields::default();
    let app = Router::new()
        .route("/upload", post(record_upload))
        .with_state(fields.clone());
    let backend = backend_for(app).await;

    let response = backend.upload(upload_request()).await.unwrap();

    assert_eq!(
        response,
        ServerResponse::RequiresDob { yob: "1990".into() }
    );
    let fields = fields.lock().unwrap().clone();
    assert_eq!(
        fields,
        vec![
            FormField {
                name: "aadhaar".into(),
                file_name: Some("card.pdf".into()),
                bytes: b"%PDF-1.7 upload".to_vec(),
            },
            FormField {
                name: "password".into(),
                file_name: None,
                bytes: b"card".to_vec(),
            },
        ]
    );
}

#[tokio::test]
async fn upload_refusal_with_error_body_is_rejected() {
    let app = Router::new().route(
        "/upload",
        post(|| async {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Incorrect password" })),
            )
        }),
    );
    let backend = backend_for(app).await;

    let response = backend.upload(upload_request()).await.unwrap();

    assert_eq!(
        response,
        ServerResponse::Rejected {
            error: "Incorrect password".into()
        }
    );
}

#[tokio::test]
async fn upload_server_error_without_json_is_http_status() {
    let app = Router::new().route(
        "/upload",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
    );
    let backend = backend_for(app).await;

    let err = backend.upload(upload_request()).await.unwrap_err();

    assert!(
        matches!(err, WorkflowError::HttpStatus { status: 500, ref endpoint } if endpoint == "/upload"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn upload_success_with_unreadable_body_is_malformed() {
    let app = Router::new().route("/upload", post(|| async { "<html>ok</html>" }));
    let backend = backend_for(app).await;

    let err = backend.upload(upload_request()).await.unwrap_err();

    assert!(matches!(err, WorkflowError::MalformedResponse { .. }), "got {err:?}");
}

// ── /finalize-dob ────────────────────────────────────────────────────────────

#[tokio::test]
async fn finalize_posts_camel_case_body_and_surfaces_refusal() {
    let bodies = Bodies::default();
    let app = Router::new()
        .route("/finalize-dob", post(refuse_finalize))
        .with_state(bodies.clone());
    let backend = backend_for(app).await;

    let response = backend.finalize_dob(&finalize_request()).await.unwrap();

    assert_eq!(
        response,
        ServerResponse::Rejected {
            error: "DOB does not match records".into()
        }
    );
    assert_eq!(
        bodies.lock().unwrap().as_slice(),
        &[json!({ "baseName": "card", "dobFull": "12/05/1990" })]
    );
}

#[tokio::test]
async fn finalize_refusal_without_message_uses_fallback() {
    let app = Router::new().route(
        "/finalize-dob",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({}))) }),
    );
    let backend = backend_for(app).await;

    let response = backend.finalize_dob(&finalize_request()).await.unwrap();

    assert_eq!(
        response,
        ServerResponse::Rejected {
            error: "Failed to finalize.".into()
        }
    );
}

#[tokio::test]
async fn finalize_refusal_without_json_is_an_error() {
    let app = Router::new().route(
        "/finalize-dob",
        post(|| async { (StatusCode::BAD_GATEWAY, "bad gateway") }),
    );
    let backend = backend_for(app).await;

    let err = backend.finalize_dob(&finalize_request()).await.unwrap_err();

    assert!(
        matches!(err, WorkflowError::HttpStatus { status: 502, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn finalize_success_returns_urls() {
    let app = Router::new().route(
        "/finalize-dob",
        post(|| async {
            Json(json!({
                "downloadUrlFront": "/out/card_front.png",
                "downloadUrlBack": "/out/card_back.png"
            }))
        }),
    );
    let backend = backend_for(app).await;

    let response = backend.finalize_dob(&finalize_request()).await.unwrap();

    match response {
        ServerResponse::Generated(urls) => {
            assert_eq!(urls.download_url_front, "/out/card_front.png");
            assert_eq!(urls.download_url_back, "/out/card_back.png");
        }
        other => panic!("unexpected {other:?}"),
    }
}

// ── /generate-pdf and previews ───────────────────────────────────────────────

#[tokio::test]
async fn generate_pdf_returns_body_bytes() {
    let bodies = Bodies::default();
    let app = Router::new()
        .route("/generate-pdf", post(pdf_bytes))
        .with_state(bodies.clone());
    let backend = backend_for(app).await;

    let bytes = backend.generate_pdf(&pdf_request()).await.unwrap();

    assert_eq!(bytes, b"%PDF-1.7 card");
    assert_eq!(
        bodies.lock().unwrap().as_slice(),
        &[json!({
            "frontPath": "/out/a_front.png",
            "backPath": "/out/a_back.png",
            "baseName": "card"
        })]
    );
}

#[tokio::test]
async fn generate_pdf_failure_is_http_status() {
    let app = Router::new().route(
        "/generate-pdf",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "render failed" })),
            )
        }),
    );
    let backend = backend_for(app).await;

    let err = backend.generate_pdf(&pdf_request()).await.unwrap_err();

    assert!(
        matches!(err, WorkflowError::HttpStatus { status: 500, ref endpoint } if endpoint == "/generate-pdf"),
        "got {err:?}"
    );
}

#[tokio::test]
async fn missing_preview_is_http_status() {
    let config = serve(Router::new()).await;
    let backend = HttpBackend::new(&config).unwrap();
    let url = config.endpoint("/out/missing.png").unwrap();

    let err = backend.fetch_asset(&url).await.unwrap_err();

    assert!(
        matches!(err, WorkflowError::HttpStatus { status: 404, .. }),
        "got {err:?}"
    );
}

// ── Whole workflow over HTTP ─────────────────────────────────────────────────

#[tokio::test]
async fn workflow_generates_and_exports_over_http() {
    let image = png();
    let front = image.clone();
    let back = image;
    let app = Router::new()
        .route(
            "/upload",
            post(|| async {
                Json(json!({
                    "downloadUrlFront": "/out/card_front.png",
                    "downloadUrlBack": "/out/card_back.png"
                }))
            }),
        )
        .route("/out/card_front.png", get(move || async move { front }))
        .route("/out/card_back.png", get(move || async move { back }))
        .route("/generate-pdf", post(|| async { b"%PDF-1.7 card".to_vec() }));

    let out = tempfile::tempdir().unwrap();
    let served = serve(app).await;
    let config = ClientConfig::builder()
        .server_url(served.server_url.as_str())
        .output_dir(out.path())
        .build()
        .unwrap();
    let backend = HttpBackend::new(&config).unwrap();
    let mut workflow = Workflow::new(backend, Arc::new(NoopView), config);

    let outcome = workflow
        .dispatch(Event::Submit {
            file: Some(SelectedFile::new("card.pdf", b"%PDF".to_vec())),
            password: None,
        })
        .await
        .unwrap();
    let Outcome::Generated(rendered) = outcome else {
        panic!("expected Generated");
    };
    assert!(rendered.front.is_loaded() && rendered.back.is_loaded());
    assert_eq!(workflow.state(), &WorkflowState::Ready);

    let outcome = workflow.dispatch(Event::Export).await.unwrap();
    let Outcome::Exported(path) = outcome else {
        panic!("expected Exported");
    };
    assert_eq!(path, out.path().join("card-pdf.pdf"));
    assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 card");
}
