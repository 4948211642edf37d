//! HTTP API tests against the router with lexicon models and an in-memory store

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use reviewlens_classifiers::{ModelRegistry, RegistryLoader};
use reviewlens_server::{create_router, AppState, ServerConfig};
use reviewlens_store::{seed_if_empty, MemoryReviewStore, ReviewQuery, ReviewStore};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    store: Arc<MemoryReviewStore>,
    _dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        Self::with_registry(ModelRegistry::builtin())
    }

    fn with_registry(registry: ModelRegistry) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            settings_path: dir.path().join("settings.json"),
            ..ServerConfig::default()
        };

        let store = Arc::new(MemoryReviewStore::new());
        seed_if_empty(store.as_ref()).unwrap();

        let handle = PrometheusBuilder::new().build_recorder().handle();
        let state = AppState::with_components(
            config,
            store.clone(),
            Arc::new(RegistryLoader::new(registry)),
            handle,
        );

        Self {
            router: create_router(state),
            store,
            _dir: dir,
        }
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post(uri, &body.to_string()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn review_id(&self, search: &str) -> i64 {
        self.store.filter(&ReviewQuery::new().search(search)).unwrap()[0].id
    }
}

#[tokio::test]
async fn test_health_reports_model_readiness() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["models_ready"], false);

    app.post_json("/api/analyze", json!({"text": "Great product"})).await;
    let (_, body) = app.get("/health").await;
    assert_eq!(body["models_ready"], true);
}

#[tokio::test]
async fn test_analyze_success_envelope() {
    let app = TestApp::new();
    let (status, body) = app
        .post_json(
            "/api/analyze",
            json!({"text": "Oh great, it broke on day one. Just what I needed. Amazing.", "language": "hi"}),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["error"].is_null());
    assert!(body["details"].is_null());

    let data = &body["data"];
    assert_eq!(data["sentiment"]["label"], "sarcastically positive (actually negative)");
    assert!(data["sentiment"]["full_distribution"]["positive"].is_number());
    assert_eq!(data["sarcasm"]["is_sarcastic"], true);
    assert_eq!(data["language"], "hi");
    assert_eq!(data["stats"]["total_reviews"], 5);

    let stored = app
        .store
        .filter(&ReviewQuery::new().search("broke on day one"))
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sentiment, "sarcastically positive (actually negative)");
}

#[tokio::test]
async fn test_analyze_defaults_language() {
    let app = TestApp::new();
    let (_, body) = app.post_json("/api/analyze", json!({"text": "It works."})).await;
    assert_eq!(body["data"]["language"], "en");
}

#[tokio::test]
async fn test_analyze_validation() {
    let app = TestApp::new();

    let (status, body) = app.post_json("/api/analyze", json!({"text": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Invalid input");
    assert_eq!(body["details"], "Text field cannot be empty");

    let (status, body) = app.post_json("/api/analyze", json!({"text": 42})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input type");
    assert_eq!(body["details"], "Text must be a string");

    let (status, body) = app.post("/api/analyze", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request format");

    let (status, body) = app.post_json("/api/analyze", json!(["text"])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request format");

    // Nothing was stored by rejected requests
    assert_eq!(app.store.count().unwrap(), 4);
}

#[tokio::test]
async fn test_analyze_without_models_is_unavailable() {
    let registry: ModelRegistry = serde_yaml::from_str(
        r#"
version: "1.0"
models:
  sentiment:
    source:
      type: builtin
      implementation: no-such-lexicon
    architecture:
      type: lexicon
"#,
    )
    .unwrap();
    let app = TestApp::with_registry(registry);

    let (status, body) = app.post_json("/api/analyze", json!({"text": "Hello"})).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Model initialization failed");
    assert_eq!(app.store.count().unwrap(), 4);
}

#[tokio::test]
async fn test_list_reviews_filters() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/reviews").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["reviews"].as_array().unwrap().len(), 4);

    let (_, body) = app.get("/api/reviews?sentiment=Positive").await;
    let reviews = body["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["username"], "John");
    assert_eq!(reviews[0]["star_rating"], 5);
    assert_eq!(reviews[0]["helpful_count"], 3);
    assert!(reviews[0]["created_at"].is_string());

    let (_, body) = app
        .get("/api/reviews?sentiment=all&rating=3&language=English&search=works")
        .await;
    assert_eq!(body["reviews"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/reviews?rating=lots").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rate_review() {
    let app = TestApp::new();
    let id = app.review_id("Could be better");

    let (status, body) = app
        .post_json("/api/rate", json!({"reviewId": id, "rating": 4}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        app.store.filter(&ReviewQuery::new().search("Could be better")).unwrap()[0].star_rating,
        4
    );

    for bad in [
        json!({"reviewId": id, "rating": 6}),
        json!({"reviewId": id, "rating": -1}),
        json!({"reviewId": id, "rating": 2.5}),
        json!({"reviewId": id, "rating": "4"}),
        json!({"rating": 3}),
        json!({"reviewId": 0, "rating": 3}),
    ] {
        let (status, body) = app.post_json("/api/rate", bad.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(body["error"], "Invalid rating data");
    }

    let (status, body) = app
        .post_json("/api/rate", json!({"reviewId": 9999, "rating": 3}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_helpful_count() {
    let app = TestApp::new();
    let id = app.review_id("as expected");

    let (status, _) = app
        .post_json("/api/reviews/helpful", json!({"reviewId": id, "increment": false}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post_json("/api/reviews/helpful", json!({"reviewId": id})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        app.store.filter(&ReviewQuery::new().search("as expected")).unwrap()[0].helpful_count,
        1
    );

    for bad in [json!(null), json!(0), json!("false")] {
        let (status, body) = app
            .post_json("/api/reviews/helpful", json!({"reviewId": id, "increment": bad}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{bad}");
        assert_eq!(body["error"], "Increment must be a boolean");
    }
    assert_eq!(
        app.store.filter(&ReviewQuery::new().search("as expected")).unwrap()[0].helpful_count,
        1
    );

    let (status, body) = app.post_json("/api/reviews/helpful", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Review ID is required");

    let (status, _) = app
        .post_json("/api/reviews/helpful", json!({"reviewId": 9999}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_reviews"], 4);
    assert_eq!(body["sentiment_distribution"]["Neutral"], 2);
    assert_eq!(body["sentiment_distribution"]["Positive"], 1);
    assert_eq!(body["sentiment_distribution"]["Negative"], 1);
}

#[tokio::test]
async fn test_settings_roundtrip() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["negative_threshold"], 20);
    assert_eq!(body["sarcasm_api_key"], "");

    let (status, body) = app
        .post_json("/api/settings", json!({"sarcasm_confidence": 90}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["settings"]["sarcasm_confidence"], 90);
    assert_eq!(body["settings"]["negative_threshold"], 20);

    let (_, body) = app.get("/api/settings").await;
    assert_eq!(body["sarcasm_confidence"], 90);

    let (status, body) = app.post_json("/api/settings", json!("dark mode")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_languages() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/languages").await;
    assert_eq!(status, StatusCode::OK);
    let languages = body.as_array().unwrap();
    assert_eq!(languages.len(), 16);
    assert_eq!(languages[0], json!({"code": "en", "name": "English"}));
    assert_eq!(languages[15], json!({"code": "ja", "name": "Japanese"}));
}

#[tokio::test]
async fn test_cors_preflight_allows_frontend() {
    let app = TestApp::new();
    let request = Request::builder()
        .method("OPTIONS")
        .uri("/api/analyze")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:5173"
    );
}

#[tokio::test]
async fn test_unknown_route() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
