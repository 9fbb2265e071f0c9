use anyhow::{Context, Result};
use axum::{
    extract::{Json, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::app::{StyleProfileRequest, StyleProfileResponse};
use crate::environment::AppConfig;
use crate::error::StyleGenError;
use crate::pipeline::StylePipeline;
use crate::TARGET_WEB_REQUEST;

impl IntoResponse for StyleGenError {
    fn into_response(self) -> Response {
        let status = match &self {
            StyleGenError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            StyleGenError::NoSamplesFound { .. } => StatusCode::NOT_FOUND,
            StyleGenError::GenerationFailure(_) | StyleGenError::Upstream(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

/// Build the router with CORS limited to `cors_origins`.
pub fn router(pipeline: StylePipeline, cors_origins: &[String]) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins(cors_origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true);

    Router::new()
        .route("/healthz", get(healthcheck))
        .route("/profile", post(create_style_profile))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

/// A `*` entry allows every origin; credentials rule out a literal wildcard,
/// so the request origin is echoed back instead.
fn allowed_origins(cors_origins: &[String]) -> AllowOrigin {
    if cors_origins.iter().any(|origin| origin == "*") {
        return AllowOrigin::mirror_request();
    }

    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(target: TARGET_WEB_REQUEST, "Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();
    AllowOrigin::list(origins)
}

/// Main application loop, serving the profiling API until Ctrl-C.
pub async fn app_api_loop(config: &AppConfig, pipeline: StylePipeline) -> Result<()> {
    let app = router(pipeline, &config.cors_origins);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(target: TARGET_WEB_REQUEST, "Server running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!(target: TARGET_WEB_REQUEST, "Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        error!("Failed to listen for ctrl-c");
    }
}

/// Lightweight health endpoint.
async fn healthcheck() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git_hash": env!("STYLEGEN_GIT_HASH"),
        "built_at": env!("STYLEGEN_BUILD_TIMESTAMP"),
    }))
}

/// Scrape a publication and return its generated style prompt.
async fn create_style_profile(
    State(pipeline): State<StylePipeline>,
    Json(request): Json<StyleProfileRequest>,
) -> Result<Json<StyleProfileResponse>, StyleGenError> {
    info!(target: TARGET_WEB_REQUEST, "Profile requested for {}", request.substack_url);

    match pipeline.profile(&request.substack_url, &request.config).await {
        Ok(profile) => {
            info!(
                target: TARGET_WEB_REQUEST,
                "Profile for {} built from {} samples",
                request.substack_url,
                profile.samples_used.len()
            );
            Ok(Json(profile.into()))
        }
        Err(e) => {
            warn!(target: TARGET_WEB_REQUEST, "Profile for {} failed: {}", request.substack_url, e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result as StyleResult;
    use crate::llm::{GenerationBackend, GenerationRequest, GenerationResponse, PromptAssembler};
    use crate::scraper::SkipRefresh;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct FixedBackend(Vec<Option<String>>);

    #[async_trait]
    impl GenerationBackend for FixedBackend {
        async fn generate(&self, _request: GenerationRequest) -> StyleResult<GenerationResponse> {
            Ok(GenerationResponse {
                choices: self.0.clone(),
            })
        }
    }

    fn pipeline(root: &TempDir, choices: Vec<Option<String>>) -> StylePipeline {
        StylePipeline::new(
            root.path(),
            Arc::new(SkipRefresh),
            PromptAssembler::new(Arc::new(FixedBackend(choices))),
        )
    }

    fn app(root: &TempDir, choices: Vec<Option<String>>) -> Router {
        router(pipeline(root, choices), &["http://localhost:3000".to_string()])
    }

    fn seed(root: &TempDir, host: &str) {
        let dir = root.path().join(host);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a-post"), "Short lines. Plain words. Nothing fancy.").unwrap();
    }

    async fn post_profile(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/profile")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let root = TempDir::new().unwrap();
        let response = app(&root, vec![])
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_profile_success() {
        let root = TempDir::new().unwrap();
        seed(&root, "example.substack.com");
        let app = app(&root, vec![Some("Keep it plain.".to_string())]);

        let (status, body) =
            post_profile(app, json!({ "substack_url": "https://example.substack.com/" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["style_prompt"], "Keep it plain.");
        assert_eq!(body["metrics"]["sample_count"], 1);
        assert_eq!(body["metrics"]["avg_sentence_length"], 2.0);
        assert_eq!(body["samples_used"], json!(["example.substack.com/a-post"]));
    }

    #[tokio::test]
    async fn test_profile_not_found() {
        let root = TempDir::new().unwrap();
        let (status, body) = post_profile(
            app(&root, vec![Some("unused".to_string())]),
            json!({ "substack_url": "https://empty.substack.com/" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["detail"].as_str().unwrap().contains("empty.substack.com"));
    }

    #[tokio::test]
    async fn test_profile_bad_gateway_on_empty_response() {
        let root = TempDir::new().unwrap();
        seed(&root, "example.substack.com");
        let (status, _) = post_profile(
            app(&root, vec![]),
            json!({ "substack_url": "https://example.substack.com/" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_profile_rejects_bad_input() {
        let root = TempDir::new().unwrap();
        let (status, _) = post_profile(
            app(&root, vec![]),
            json!({ "substack_url": "ftp://example.com/" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = post_profile(
            app(&root, vec![]),
            json!({ "substack_url": "https://example.substack.com/", "max_posts": 40 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["detail"].as_str().unwrap().contains("max_posts"));
    }

    #[tokio::test]
    async fn test_profile_rejects_dot_hosts() {
        let tmp = TempDir::new().unwrap();
        let root = TempDir::new_in(tmp.path()).unwrap();
        fs::write(tmp.path().join(".env"), "OPENAI_API_KEY=sk-secret").unwrap();

        for address in ["http://../", "http://%2e%2e/"] {
            let (status, body) = post_profile(
                app(&root, vec![Some("unused".to_string())]),
                json!({ "substack_url": address }),
            )
            .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", address);
            assert!(!body.to_string().contains("sk-secret"));
        }
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let root = TempDir::new().unwrap();
        let response = app(&root, vec![])
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header("origin", "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
    }

    #[tokio::test]
    async fn test_cors_wildcard_echoes_origin() {
        let root = TempDir::new().unwrap();
        let app = router(pipeline(&root, vec![]), &["*".to_string()]);
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/healthz")
                    .header("origin", "https://reader.example.org")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://reader.example.org"
        );
    }
}
