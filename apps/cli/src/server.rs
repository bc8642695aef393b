//! Webhook HTTP server.

use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;

use prdocs_core::{EventRouter, InboundEvent, RouteOutcome};
use prdocs_shared::{PrDocsError, Result};

/// GitHub caps webhook payloads at 25 MB.
pub(crate) const MAX_BODY_SIZE: usize = 25 * 1024 * 1024;

/// Header carrying the webhook event type.
const EVENT_HEADER: &str = "x-github-event";

/// Shared handler state.
#[derive(Clone)]
pub(crate) struct AppState {
    router: Arc<EventRouter>,
}

impl AppState {
    pub(crate) fn new(router: EventRouter) -> Self {
        Self {
            router: Arc::new(router),
        }
    }
}

/// Build the HTTP router.
///
/// - `GET /health` - liveness check
/// - `POST /webhook` - GitHub webhook receiver
pub(crate) fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(handle_webhook))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    delivery = request
                        .headers()
                        .get("x-github-delivery")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                )
            }),
        )
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// POST /webhook: answers every event and runs at most one batch for it.
async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let event = InboundEvent {
        event_type: headers.get(EVENT_HEADER).and_then(|v| v.to_str().ok()),
        body: &body,
    };

    respond(state.router.route(&event).await)
}

/// Map a routing result to the webhook's status code and short status text.
fn respond(result: Result<RouteOutcome>) -> (StatusCode, String) {
    match result {
        Ok(RouteOutcome::Ignored) => (StatusCode::OK, "Ignored event".into()),
        Ok(RouteOutcome::Skipped { .. }) => (StatusCode::OK, "No action needed".into()),
        Ok(RouteOutcome::Completed(report)) => match report.failed() {
            0 => (StatusCode::OK, "Docs updated".into()),
            n => {
                for failure in report.failures() {
                    tracing::warn!(filename = failure.filename(), "file was not documented");
                }
                (StatusCode::OK, format!("Docs updated with {n} failure(s)"))
            }
        },
        Err(PrDocsError::Validation { message }) => {
            tracing::warn!(%message, "rejected webhook payload");
            (StatusCode::BAD_REQUEST, "Invalid payload".into())
        }
        Err(err) => {
            tracing::error!(error = %err, "webhook processing failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error processing webhook".into(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use http_body_util::BodyExt;
    use prdocs_core::Pipeline;
    use prdocs_shared::{AppConfig, Settings};
    use std::path::{Path, PathBuf};
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn temp_dir(prefix: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("prdocs-{prefix}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn state_for(github: &MockServer, ai: &MockServer, docs: &Path) -> AppState {
        let mut config = AppConfig::default();
        config.github.api_base = github.uri();
        config.pipeline.docs_dir = docs.to_string_lossy().into_owned();
        config.pipeline.request_timeout_secs = 5;
        let endpoint = format!("{}/generate", ai.uri());
        let settings = Settings::resolve_with(&config, |name| match name {
            "GITHUB_TOKEN" => Some("ghp_test".into()),
            "GEMINI_API_KEY" => Some("ai_test".into()),
            "AI_ENDPOINT" => Some(endpoint.clone()),
            _ => None,
        })
        .unwrap();
        AppState::new(EventRouter::new(Pipeline::new(&settings).unwrap()))
    }

    fn headers(event: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(EVENT_HEADER, HeaderValue::from_static(event));
        headers
    }

    fn pr_body(action: &str) -> Bytes {
        Bytes::from(
            serde_json::to_vec(&serde_json::json!({
                "action": action,
                "repository": { "full_name": "octocat/hello-world" },
                "pull_request": { "number": 7 },
            }))
            .unwrap(),
        )
    }

    async fn call(state: AppState, headers: HeaderMap, body: Bytes) -> (StatusCode, String) {
        let response = handle_webhook(State(state), headers, body).await.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn quiet_upstreams() -> (MockServer, MockServer) {
        let github = MockServer::start().await;
        let ai = MockServer::start().await;
        for server in [&github, &ai] {
            Mock::given(any())
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(server)
                .await;
        }
        (github, ai)
    }

    #[tokio::test]
    async fn non_pull_request_event_is_ignored() {
        let (github, ai) = quiet_upstreams().await;
        let tmp = temp_dir("server-ignored");
        let state = state_for(&github, &ai, &tmp.join("docs"));

        let (status, text) = call(state, headers("push"), Bytes::from_static(b"{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Ignored event");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn missing_event_header_is_ignored() {
        let (github, ai) = quiet_upstreams().await;
        let tmp = temp_dir("server-noheader");
        let state = state_for(&github, &ai, &tmp.join("docs"));

        let (status, text) = call(state, HeaderMap::new(), pr_body("closed")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Ignored event");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn opened_action_needs_no_action() {
        let (github, ai) = quiet_upstreams().await;
        let tmp = temp_dir("server-opened");
        let state = state_for(&github, &ai, &tmp.join("docs"));

        let (status, text) = call(state, headers("pull_request"), pr_body("opened")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "No action needed");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn unreadable_payload_is_bad_request() {
        let (github, ai) = quiet_upstreams().await;
        let tmp = temp_dir("server-invalid");
        let state = state_for(&github, &ai, &tmp.join("docs"));

        let (status, text) =
            call(state, headers("pull_request"), Bytes::from_static(b"{\"action\":\"closed\"}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Invalid payload");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn closed_pull_request_updates_docs() {
        let github = MockServer::start().await;
        let ai = MockServer::start().await;
        let tmp = temp_dir("server-closed");
        let docs = tmp.join("docs");

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello-world/pulls/7/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "filename": "a.js",
                "status": "added",
                "raw_url": format!("{}/raw/a.js", github.uri()),
            }])))
            .expect(1)
            .mount(&github)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/a.js"))
            .respond_with(ResponseTemplate::new(200).set_body_string("console.log(1)"))
            .expect(1)
            .mount(&github)
            .await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [ { "content": { "parts": [ { "text": "Logs 1." } ] } } ]
            })))
            .expect(1)
            .mount(&ai)
            .await;

        let state = state_for(&github, &ai, &docs);
        let (status, text) = call(state, headers("pull_request"), pr_body("closed")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Docs updated");
        assert_eq!(std::fs::read_to_string(docs.join("a.js.md")).unwrap(), "Logs 1.");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn per_file_failures_still_answer_ok() {
        let github = MockServer::start().await;
        let ai = MockServer::start().await;
        let tmp = temp_dir("server-partial");

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello-world/pulls/7/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "filename": "gone.js",
                "status": "removed",
                "raw_url": format!("{}/raw/gone.js", github.uri()),
            }])))
            .mount(&github)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/gone.js"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&github)
            .await;

        let state = state_for(&github, &ai, &tmp.join("docs"));
        let (status, text) = call(state, headers("pull_request"), pr_body("synchronize")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(text, "Docs updated with 1 failure(s)");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn listing_failure_is_internal_error() {
        let github = MockServer::start().await;
        let ai = MockServer::start().await;
        let tmp = temp_dir("server-abort");

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&github)
            .await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&ai)
            .await;

        let state = state_for(&github, &ai, &tmp.join("docs"));
        let (status, text) = call(state, headers("pull_request"), pr_body("closed")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error processing webhook");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }
}
