//! HTTP transport for the QR generation service.
//!
//! Adapts the [`QrGenerator`] capability to the HTTP surface: method
//! enforcement (via the method router), size-limited body reads, `size`
//! query parameter parsing, and response shaping. Domain validation beyond
//! the query parameter lives in `qrgen-core`; failures that surface from the
//! service after delegation are deliberately folded into a generic 500.

use axum::body::{Body, to_bytes};
use axum::extract::{ConnectInfo, Query, Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use qrgen_core::QrGenerator;
use qrgen_core::types::{DEFAULT_QR_SIZE, MAX_QR_SIZE, MIN_QR_SIZE, PNG_CONTENT_TYPE};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Shared, read-only request-handling state.
///
/// Cloned per request; holds only the service handle and the body limit, so
/// concurrent requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    service: Arc<dyn QrGenerator>,
    max_body_size: usize,
}

impl AppState {
    pub fn new(service: Arc<dyn QrGenerator>, max_body_size: usize) -> Self {
        Self {
            service,
            max_body_size,
        }
    }
}

/// Query parameters accepted by `/generate`.
///
/// `size` is kept as a raw string so parse failures produce the
/// range-naming 400 message instead of a generic extractor rejection.
#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    pub size: Option<String>,
}

/// Builds the service router: exactly two routes.
///
/// Method enforcement happens here: `/generate` only matches POST, so other
/// verbs receive 405 before any body byte is read.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/generate", post(generate))
        .route("/health", get(health).post(health))
        .with_state(state)
}

/// Handles `POST /generate?size={pixels}`: raw payload in, PNG out.
async fn generate(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    Query(params): Query<GenerateParams>,
    request: Request,
) -> Response {
    debug!(
        remote_addr = %remote_addr,
        method = %request.method(),
        user_agent = ?request.headers().get(header::USER_AGENT),
        content_length = ?request.headers().get(header::CONTENT_LENGTH),
        "Received QR generation request"
    );

    debug!(max_size = state.max_body_size, "Reading request body");
    let body: Bytes = match to_bytes(request.into_body(), state.max_body_size).await {
        Ok(body) => body,
        Err(err) => {
            if is_length_limit(&err) {
                warn!(
                    max_allowed = state.max_body_size,
                    remote_addr = %remote_addr,
                    "Request body too large"
                );
                return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
                    .into_response();
            }
            error!(error = %err, remote_addr = %remote_addr, "failed to read request body");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read request body",
            )
                .into_response();
        }
    };

    debug!(body_size = body.len(), "Request body read successfully");

    if body.is_empty() {
        warn!(remote_addr = %remote_addr, "Empty request body received");
        return (StatusCode::BAD_REQUEST, "Request body is empty").into_response();
    }

    // An empty `size=` is treated the same as an absent parameter.
    let size = match params.size.as_deref().filter(|raw| !raw.is_empty()) {
        None => {
            debug!(size = DEFAULT_QR_SIZE, "Using default size");
            DEFAULT_QR_SIZE
        }
        Some(raw) => {
            debug!(size_str = raw, "Parsing size parameter");
            match raw.parse::<u32>() {
                Ok(parsed) if (MIN_QR_SIZE..=MAX_QR_SIZE).contains(&parsed) => {
                    debug!(size = parsed, "Size parameter parsed");
                    parsed
                }
                _ => {
                    warn!(
                        size_str = raw,
                        min = MIN_QR_SIZE,
                        max = MAX_QR_SIZE,
                        remote_addr = %remote_addr,
                        "Invalid size parameter"
                    );
                    return (
                        StatusCode::BAD_REQUEST,
                        "Invalid size parameter: must be between 1 and 2048",
                    )
                        .into_response();
                }
            }
        }
    };

    debug!(
        data_length = body.len(),
        size, "Calling QR generation service"
    );

    let png = match state.service.generate(&body, size) {
        Ok(png) => png,
        Err(err) => {
            error!(
                error = %err,
                data_length = body.len(),
                size,
                remote_addr = %remote_addr,
                "failed to generate QR code"
            );
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response();
        }
    };

    info!(
        data_length = body.len(),
        size,
        output_size = png.len(),
        remote_addr = %remote_addr,
        "QR code request completed successfully"
    );

    ([(header::CONTENT_TYPE, PNG_CONTENT_TYPE)], png).into_response()
}

/// Handles `GET|POST /health` for liveness and readiness probes.
///
/// Always 200; has no dependency on the generation service.
async fn health(ConnectInfo(remote_addr): ConnectInfo<SocketAddr>, method: Method) -> Response {
    debug!(remote_addr = %remote_addr, method = %method, "Health check request received");
    Json(serde_json::json!({ "status": "ok" })).into_response()
}

/// Reports whether a body-read failure was caused by the size limit.
///
/// `to_bytes` surfaces the limit as a `LengthLimitError` somewhere in the
/// error's source chain; anything else is an ordinary read failure.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        if inner.is::<http_body_util::LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrgen_core::{PngEncoder, QrService};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    /// Counts delegations so transport rejections can prove the service was
    /// never reached.
    #[derive(Default)]
    struct RecordingGenerator {
        calls: AtomicUsize,
    }

    impl QrGenerator for RecordingGenerator {
        fn generate(&self, _data: &[u8], _size: u32) -> qrgen_core::Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![1, 2, 3])
        }
    }

    struct FailingGenerator;

    impl QrGenerator for FailingGenerator {
        fn generate(&self, _data: &[u8], _size: u32) -> qrgen_core::Result<Vec<u8>> {
            Err(qrgen_core::Error::EmptyData)
        }
    }

    fn png_router(max_body_size: usize) -> Router {
        let service = Arc::new(QrService::new(PngEncoder::new()));
        router(AppState::new(service, max_body_size))
    }

    fn request(method: &str, uri: &str, body: impl Into<Body>) -> Request {
        Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 42010))))
            .body(body.into())
            .unwrap()
    }

    async fn body_of(response: Response) -> Bytes {
        to_bytes(response.into_body(), usize::MAX).await.unwrap()
    }

    #[tokio::test]
    async fn generate_rejects_non_post_methods() {
        for method in ["GET", "PUT", "DELETE", "PATCH"] {
            let response = png_router(1024)
                .oneshot(request(method, "/generate", "payload"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        }
    }

    #[tokio::test]
    async fn generate_rejects_oversized_bodies_before_delegation() {
        let generator = Arc::new(RecordingGenerator::default());
        let service: Arc<dyn QrGenerator> = generator.clone();
        let app = router(AppState::new(service, 16));

        let response = app
            .oneshot(request("POST", "/generate", vec![b'x'; 64]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(&body_of(response).await[..], b"Request body too large");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn generate_rejects_empty_bodies_distinctly() {
        let response = png_router(1024)
            .oneshot(request("POST", "/generate", Body::empty()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(&body_of(response).await[..], b"Request body is empty");
    }

    #[tokio::test]
    async fn generate_rejects_invalid_size_parameters() {
        for size in ["0", "2049", "abc", "-1", "1.5"] {
            let response = png_router(1024)
                .oneshot(request("POST", &format!("/generate?size={size}"), "payload"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "size={size}");
            assert_eq!(
                &body_of(response).await[..],
                b"Invalid size parameter: must be between 1 and 2048"
            );
        }
    }

    #[tokio::test]
    async fn generate_defaults_to_256_pixels() {
        for uri in ["/generate", "/generate?size="] {
            let response = png_router(1024)
                .oneshot(request("POST", uri, "https://example.com"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let png = body_of(response).await;
            let decoded = image::load_from_memory(&png).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (256, 256));
        }
    }

    #[tokio::test]
    async fn generate_accepts_boundary_sizes() {
        for size in ["1", "2048"] {
            let response = png_router(1024)
                .oneshot(request("POST", &format!("/generate?size={size}"), "payload"))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "size={size}");
        }
    }

    #[tokio::test]
    async fn generate_returns_png_for_valid_requests() {
        let response = png_router(1024)
            .oneshot(request("POST", "/generate?size=128", "https://example.com"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PNG_CONTENT_TYPE
        );

        let png = body_of(response).await;
        assert_eq!(&png[..8], &PNG_MAGIC);
    }

    #[tokio::test]
    async fn generate_folds_service_failures_into_500() {
        let app = router(AppState::new(Arc::new(FailingGenerator), 1024));

        let response = app
            .oneshot(request("POST", "/generate", "payload"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(&body_of(response).await[..], b"Internal server error");
    }

    #[tokio::test]
    async fn health_responds_ok_to_get_and_post() {
        for method in ["GET", "POST"] {
            let response = png_router(1024)
                .oneshot(request(method, "/health", Body::empty()))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body: serde_json::Value =
                serde_json::from_slice(&body_of(response).await).unwrap();
            assert_eq!(body, serde_json::json!({ "status": "ok" }));
        }
    }
}
