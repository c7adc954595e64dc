//! HTTP surface: the upload form, the upload endpoint and a read-only view
//! of the registry. Uploads stay in memory for the duration of the request.

use crate::core::{OcrProcessor, VisionModel};
use crate::utils::error::ScanError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct DetailsResponse {
    details: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ScanError> for ApiError {
    fn from(e: ScanError) -> Self {
        let status = match &e {
            ScanError::UnknownDocumentType { .. } => StatusCode::NOT_FOUND,
            ScanError::ExtractionFailed { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: format!("Something went wrong: {}", e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

pub fn router<M: VisionModel + 'static>(processor: Arc<OcrProcessor<M>>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload::<M>))
        .route("/health", get(|| async { "ok" }))
        .route("/api/document-types", get(list_document_types::<M>))
        .route("/api/document-types/reload", post(reload_document_types::<M>))
        .route("/api/document-types/:id", get(get_document_type::<M>))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(processor)
}

/// Serves `app` until Ctrl-C.
pub async fn serve(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await
}

async fn index() -> Html<&'static str> {
    Html(UPLOAD_PAGE_HTML)
}

struct Upload {
    filename: String,
    content_type: String,
    bytes: Vec<u8>,
}

async fn upload<M: VisionModel + 'static>(
    State(processor): State<Arc<OcrProcessor<M>>>,
    mut multipart: Multipart,
) -> Result<Json<DetailsResponse>, ApiError> {
    let mut file: Option<Upload> = None;
    let mut doc_type = String::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart upload");
                return Err(ApiError {
                    status: e.status(),
                    message: e.body_text(),
                });
            }
        };

        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(|e| ApiError {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                file = Some(Upload {
                    filename,
                    content_type,
                    bytes: bytes.to_vec(),
                });
            }
            "fileType" => {
                doc_type = field.text().await.map_err(|e| ApiError {
                    status: e.status(),
                    message: e.body_text(),
                })?;
            }
            _ => {}
        }
    }

    let Some(file) = file else {
        return Err(ApiError::bad_request("No file uploaded"));
    };
    if doc_type.trim().is_empty() {
        return Err(ApiError::bad_request("No file type selected"));
    }
    if file.filename.is_empty() {
        return Err(ApiError::bad_request("No file selected"));
    }
    if file.content_type.to_ascii_lowercase().contains("pdf") {
        return Err(ApiError::bad_request("PDF file support coming soon!"));
    }

    tracing::info!(
        doc_type = %doc_type,
        content_type = %file.content_type,
        size = file.bytes.len(),
        "Upload received"
    );

    match processor.process(&file.bytes, &doc_type, &file.content_type).await {
        Ok(details) => Ok(Json(DetailsResponse { details })),
        Err(e) => {
            tracing::error!(error = %e, category = ?e.category(), "Extraction request failed");
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    enabled_only: Option<bool>,
    category: Option<String>,
}

async fn list_document_types<M: VisionModel + 'static>(
    State(processor): State<Arc<OcrProcessor<M>>>,
    Query(query): Query<ListQuery>,
) -> Json<serde_json::Value> {
    let registry = processor.registry();
    let docs = match &query.category {
        Some(category) => registry.list_by_category(category),
        None => registry.list(query.enabled_only.unwrap_or(true)),
    };
    let summaries: Vec<_> = docs.iter().map(|doc| doc.summary()).collect();
    Json(serde_json::json!({ "document_types": summaries }))
}

async fn get_document_type<M: VisionModel + 'static>(
    State(processor): State<Arc<OcrProcessor<M>>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let doc = processor
        .registry()
        .get(&id)
        .ok_or(ScanError::UnknownDocumentType { id })?;
    Ok(Json(serde_json::json!(doc.summary())))
}

async fn reload_document_types<M: VisionModel + 'static>(
    State(processor): State<Arc<OcrProcessor<M>>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let report = tokio::task::spawn_blocking(move || processor.registry().reload())
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("Reload task failed: {}", e),
        })??;

    Ok(Json(serde_json::json!({
        "loaded": report.loaded,
        "skipped": report.skipped,
        "duplicates": report.duplicates,
    })))
}

const UPLOAD_PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>ID document scanner</title>
  <style>
    body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 2rem auto; padding: 0 1rem; }
    label, select, input, button { display: block; margin: 0.5rem 0; }
    pre { background: #f4f4f4; padding: 1rem; white-space: pre-wrap; }
  </style>
</head>
<body>
  <h1>ID document scanner</h1>
  <form id="upload-form">
    <label for="fileType">Document type</label>
    <select id="fileType" name="fileType"><option value="">Select...</option></select>
    <label for="file">Photo</label>
    <input id="file" name="file" type="file" accept="image/*">
    <button type="submit">Extract</button>
  </form>
  <pre id="result"></pre>
  <script>
    const select = document.getElementById('fileType');
    fetch('/api/document-types').then(r => r.json()).then(body => {
      for (const t of body.document_types) {
        const option = document.createElement('option');
        option.value = t.id;
        option.textContent = `${t.name} (${t.country})`;
        select.appendChild(option);
      }
    });
    document.getElementById('upload-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const result = document.getElementById('result');
      result.textContent = 'Processing...';
      const response = await fetch('/upload', { method: 'POST', body: new FormData(event.target) });
      const body = await response.json();
      if (body.error) {
        result.textContent = body.error;
        return;
      }
      try {
        result.textContent = JSON.stringify(JSON.parse(body.details), null, 2);
      } catch (_) {
        result.textContent = body.details;
      }
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::processor::tests::{registry, CountingModel};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const BOUNDARY: &str = "idscan-test-boundary";

    fn multipart_body(file: Option<(&str, &str, &[u8])>, file_type: Option<&str>) -> Vec<u8> {
        let mut body = Vec::new();
        if let Some(doc_type) = file_type {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fileType\"\r\n\r\n{doc_type}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((filename, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_of(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app(model: Arc<CountingModel>) -> Router {
        router(Arc::new(OcrProcessor::new(registry(), model)), 1024 * 1024)
    }

    #[tokio::test]
    async fn test_upload_returns_details() {
        let model = Arc::new(CountingModel::replying("```json\n{\"NIK\":\"3171\"}\n```"));
        let body = multipart_body(Some(("ktp.png", "image/png", b"png-bytes")), Some("ID_KTP"));

        let response = app(model.clone()).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["details"], "{\"NIK\":\"3171\"}");
        assert_eq!(model.last_request().unwrap().media_type, "image/png");
    }

    #[tokio::test]
    async fn test_upload_unknown_type_is_404_without_model_call() {
        let model = Arc::new(CountingModel::replying("{}"));
        let body = multipart_body(Some(("sim.jpg", "image/jpeg", b"jpg")), Some("ID_SIM"));

        let response = app(model.clone()).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let error = json_of(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("Unknown document type: ID_SIM"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_upload_validation_errors() {
        let cases: Vec<(Vec<u8>, &str)> = vec![
            (multipart_body(None, Some("ID_KTP")), "No file uploaded"),
            (
                multipart_body(Some(("ktp.jpg", "image/jpeg", b"x")), Some("")),
                "No file type selected",
            ),
            (
                multipart_body(Some(("ktp.jpg", "image/jpeg", b"x")), None),
                "No file type selected",
            ),
            (
                multipart_body(Some(("", "image/jpeg", b"x")), Some("ID_KTP")),
                "No file selected",
            ),
            (
                multipart_body(Some(("ktp.pdf", "application/pdf", b"%PDF")), Some("ID_KTP")),
                "PDF file support coming soon!",
            ),
        ];

        for (body, expected) in cases {
            let model = Arc::new(CountingModel::replying("{}"));
            let response = app(model.clone()).oneshot(upload_request(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{expected}");
            assert_eq!(json_of(response).await["error"], expected);
            assert_eq!(model.calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_truncated_file_type_part_is_a_multipart_error() {
        let model = Arc::new(CountingModel::replying("{}"));
        let mut body = multipart_body(Some(("ktp.jpg", "image/jpeg", b"x")), None);
        body.truncate(body.len() - format!("--{BOUNDARY}--\r\n").len());
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"fileType\"\r\n\r\nID_K").as_bytes(),
        );

        let response = app(model.clone()).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error = json_of(response).await["error"].as_str().unwrap().to_string();
        assert_ne!(error, "No file type selected");
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_bad_gateway() {
        let model = Arc::new(CountingModel::failing("authentication_error: invalid x-api-key"));
        let body = multipart_body(Some(("ktp.jpg", "image/jpeg", b"jpg")), Some("ID_KTP"));

        let response = app(model).oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let error = json_of(response).await["error"].as_str().unwrap().to_string();
        assert!(error.contains("invalid x-api-key"));
    }

    #[tokio::test]
    async fn test_document_type_endpoints() {
        let model = Arc::new(CountingModel::replying("{}"));

        let response = app(model.clone())
            .oneshot(Request::get("/api/document-types").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let listing = json_of(response).await;
        assert_eq!(listing["document_types"][0]["id"], "ID_KTP");
        assert_eq!(listing["document_types"][0]["fields"][1]["id"], "Name");

        let response = app(model.clone())
            .oneshot(
                Request::get("/api/document-types?category=tax")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(json_of(response).await["document_types"], serde_json::json!([]));

        let response = app(model.clone())
            .oneshot(Request::get("/api/document-types/ID_KTP").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_of(response).await["processing_mode"], "structured");

        let response = app(model)
            .oneshot(Request::get("/api/document-types/NOPE").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reload_endpoint_reports_counts() {
        let model = Arc::new(CountingModel::replying("{}"));
        let response = app(model)
            .oneshot(
                Request::post("/api/document-types/reload")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_of(response).await["loaded"], 1);
    }
}
