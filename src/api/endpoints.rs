//! API endpoint handlers
//!
//! This module implements the HTTP endpoints of the animator: the HTML
//! form and result pages, the JSON animation endpoint, and a health check.

use crate::api::error::{ApiError, status_for};
use crate::api::pages;
use crate::core::animator::Animator;
use crate::core::config::Config;
use crate::core::constants::download;
use crate::models::animation::{AnimateResponse, AnimationRequest};
use axum::{
    Form, Json, Router,
    extract::State,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub animator: Arc<Animator>,
}

/// Create the router with all endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/animate", post(animate_form))
        .route("/api/animate", post(animate_json))
        .route("/health", get(health_check))
        .with_state(state)
}

fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// GET / - Input form pre-filled with the sample robot
async fn index() -> Html<String> {
    Html(pages::form_page(&pages::sample_request()))
}

/// POST /animate - Form submission, answered with an HTML page
async fn animate_form(
    State(state): State<AppState>,
    Form(request): Form<AnimationRequest>,
) -> Response {
    let request_id = new_request_id();
    info!(request_id = %request_id, "📥 Form submission");

    match state.animator.animate(&request, &request_id).await {
        Ok(cleaned) => Html(pages::result_page(&request, &cleaned)).into_response(),
        Err(error) => (
            status_for(&error),
            Html(pages::failure_page(&request, &error)),
        )
            .into_response(),
    }
}

/// POST /api/animate - JSON submission
async fn animate_json(
    State(state): State<AppState>,
    Json(request): Json<AnimationRequest>,
) -> Result<Json<AnimateResponse>, ApiError> {
    let request_id = new_request_id();
    info!(request_id = %request_id, "📥 JSON submission");

    let markup = state.animator.animate(&request, &request_id).await?;
    Ok(Json(AnimateResponse {
        request_id,
        filename: download::FILE_NAME,
        markup,
    }))
}

/// GET /health - Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "provider": state.animator.provider_name(),
        "deployment": state.config.deployment,
        "api_version": state.config.api_version,
        "request_timeout_secs": state.config.request_timeout.as_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::animator::tests::{CannedProvider, animator};
    use crate::core::provider::RequestError;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    const REPLY: &str = "Here it is:\n```svg\n<svg><circle id=\"eye\"><animate attributeName=\"r\" values=\"5;1;5\" dur=\"1s\"/></circle></svg>\n```";

    fn test_config() -> Config {
        Config::from_lookup(|key| match key {
            "AZURE_OPENAI_ENDPOINT" => Some("https://example.openai.azure.com".to_string()),
            "AZURE_OPENAI_API_KEY" => Some("secret".to_string()),
            "AZURE_OPENAI_DEPLOYMENT_NAME" => Some("gpt-4o".to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn app(provider: CannedProvider) -> Router {
        create_router(AppState {
            config: Arc::new(test_config()),
            animator: Arc::new(animator(Arc::new(provider))),
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_request(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/animate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_index_serves_form() {
        let response = app(CannedProvider::text(REPLY))
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("<form"));
        assert!(body.contains("Animate SVG"));
    }

    #[tokio::test]
    async fn test_form_submission_renders_result() {
        let form = "svg=%3Csvg%3E%3Ccircle+id%3D%22eye%22%2F%3E%3C%2Fsvg%3E&description=&instructions=blink";
        let request = Request::builder()
            .method("POST")
            .uri("/animate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let response = app(CannedProvider::text(REPLY)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("Animation created successfully!"));
        assert!(body.contains("data:image/svg+xml;base64,"));
        assert!(body.contains("&lt;animate attributeName=&quot;r&quot;"));
    }

    #[tokio::test]
    async fn test_form_submission_shows_raw_on_validation_failure() {
        let form = "svg=%3Csvg%2F%3E&instructions=spin";
        let request = Request::builder()
            .method("POST")
            .uri("/animate")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .unwrap();
        let response = app(CannedProvider::text("Sorry, no can do."))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_string(response).await;
        assert!(body.contains("Raw model response"));
        assert!(body.contains("Sorry, no can do."));
    }

    #[tokio::test]
    async fn test_json_success() {
        let response = app(CannedProvider::text(REPLY))
            .oneshot(json_request(json!({
                "original_markup": "<svg><circle id=\"eye\"/></svg>",
                "instruction_text": "blink",
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["filename"], "animated_graphic.svg");
        assert_eq!(body["animation_count"], 1);
        assert!(body["svg"].as_str().unwrap().starts_with("<svg>"));
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_json_missing_input() {
        let provider = CannedProvider::text(REPLY);
        let response = app(provider)
            .oneshot(json_request(json!({"svg": "", "instructions": "blink"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], "missing_input");
    }

    #[tokio::test]
    async fn test_json_request_error() {
        let provider = CannedProvider::failing(|| {
            RequestError::Authentication("Invalid API key".to_string())
        });
        let response = app(provider)
            .oneshot(json_request(json!({"svg": "<svg/>", "instructions": "spin"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], "authentication_error");
    }

    #[tokio::test]
    async fn test_json_validation_error_includes_raw() {
        let response = app(CannedProvider::text("<svg><g></svg>"))
            .oneshot(json_request(json!({"svg": "<svg/>", "instructions": "spin"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["error"]["code"], "malformed_markup");
        assert_eq!(body["error"]["raw"], "<svg><g></svg>");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(CannedProvider::text(REPLY))
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["provider"], "Canned");
        assert_eq!(body["deployment"], "gpt-4o");
    }
}
