//! HTTP routes and handlers

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reviewlens_core::{AnalysisRecord, Error};
use reviewlens_store::ReviewQuery;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{debug, error, warn};

use crate::app::AppState;
use crate::orchestrator::{AnalysisFailure, AnalysisOutcome, FailureKind};

const DEFAULT_LANGUAGE_CODE: &str = "en";

/// Languages offered by the frontend language picker
pub const SUPPORTED_LANGUAGES: [(&str, &str); 16] = [
    ("en", "English"),
    ("hi", "Hindi"),
    ("bn", "Bengali"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("mr", "Marathi"),
    ("gu", "Gujarati"),
    ("kn", "Kannada"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("zh", "Chinese"),
    ("ja", "Japanese"),
];

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);

    let api = Router::new()
        .route("/analyze", post(analyze))
        .route("/reviews", get(list_reviews))
        .route("/reviews/helpful", post(update_helpful))
        .route("/rate", post(rate_review))
        .route("/stats", get(stats))
        .route("/settings", get(get_settings).post(update_settings))
        .route("/languages", get(languages))
        .layer(cors);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .nest("/api", api)
        .fallback(fallback)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let models_ready = state.orchestrator.models().is_ready().await;
    Json(json!({ "status": "ok", "models_ready": models_ready }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn fallback() -> AppError {
    AppError::NotFound("Not found")
}

fn record_request(endpoint: &'static str) {
    metrics::counter!("reviewlens_requests_total", "endpoint" => endpoint).increment(1);
}

/// Response body of `/api/analyze`; every key is always present
#[derive(Debug, Serialize)]
struct AnalysisEnvelope {
    success: bool,
    error: Option<String>,
    details: Option<String>,
    data: Option<AnalysisRecord>,
}

impl AnalysisEnvelope {
    fn failure(failure: AnalysisFailure) -> Self {
        Self {
            success: false,
            error: Some(failure.error),
            details: Some(failure.details),
            data: None,
        }
    }
}

impl IntoResponse for AnalysisOutcome {
    fn into_response(self) -> Response {
        match self {
            AnalysisOutcome::Success(record) => {
                let envelope = AnalysisEnvelope {
                    success: true,
                    error: None,
                    details: None,
                    data: Some(record),
                };
                (StatusCode::OK, Json(envelope)).into_response()
            }
            AnalysisOutcome::Failure(failure) => {
                let status = match failure.kind {
                    FailureKind::InvalidInput => StatusCode::BAD_REQUEST,
                    FailureKind::ModelUnavailable | FailureKind::Timeout => {
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                    FailureKind::Analysis | FailureKind::Internal => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, Json(AnalysisEnvelope::failure(failure))).into_response()
            }
        }
    }
}

/// Main analysis handler
async fn analyze(State(state): State<AppState>, body: Bytes) -> AnalysisOutcome {
    record_request("analyze");

    let data = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) if !map.is_empty() => map,
        _ => {
            return AnalysisOutcome::Failure(AnalysisFailure::new(
                FailureKind::InvalidInput,
                "Invalid request format",
                "Request must contain valid JSON data",
            ))
        }
    };

    let text = match data.get("text") {
        None | Some(Value::Null) => "",
        Some(Value::String(text)) => text.as_str(),
        Some(_) => {
            return AnalysisOutcome::Failure(AnalysisFailure::new(
                FailureKind::InvalidInput,
                "Invalid input type",
                "Text must be a string",
            ))
        }
    };
    let language = data
        .get("language")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_LANGUAGE_CODE);

    debug!(chars = text.len(), language, "analysis request");
    state.orchestrator.analyze(text, language).await
}

/// Review listing filter as sent by the frontend
#[derive(Debug, Default, Deserialize)]
struct ReviewFilterParams {
    sentiment: Option<String>,
    rating: Option<String>,
    language: Option<String>,
    search: Option<String>,
}

impl ReviewFilterParams {
    fn into_query(self) -> Result<ReviewQuery, AppError> {
        let mut query = ReviewQuery::new();
        if let Some(sentiment) = self.sentiment {
            query = query.sentiment(sentiment);
        }
        if let Some(rating) = self.rating.filter(|r| !r.is_empty()) {
            let rating = rating
                .parse::<i64>()
                .map_err(|_| AppError::BadRequest("Invalid rating filter"))?;
            query = query.min_rating(rating);
        }
        if let Some(language) = self.language {
            query = query.language(language);
        }
        if let Some(search) = self.search {
            query = query.search(search);
        }
        Ok(query)
    }
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(params): Query<ReviewFilterParams>,
) -> Result<Json<Value>, AppError> {
    record_request("reviews");

    let query = params.into_query()?;
    let reviews = state.store.filter(&query).map_err(|e| {
        error!("Error fetching reviews: {}", e);
        AppError::Internal("Failed to fetch reviews")
    })?;

    Ok(Json(json!({ "success": true, "reviews": reviews })))
}

async fn rate_review(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, AppError> {
    record_request("rate");

    let data = parse_object(&body).ok_or(AppError::BadRequest("Invalid rating data"))?;
    let review_id = review_id(&data).ok_or(AppError::BadRequest("Invalid rating data"))?;
    let rating = data
        .get("rating")
        .and_then(Value::as_i64)
        .filter(|r| (0..=5).contains(r))
        .ok_or(AppError::BadRequest("Invalid rating data"))?;

    state
        .store
        .set_rating(review_id, rating)
        .map_err(|e| store_error("updating rating", e))?;

    Ok(Json(json!({ "success": true })))
}

async fn update_helpful(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    record_request("helpful");

    let data = parse_object(&body).ok_or(AppError::BadRequest("Review ID is required"))?;
    let review_id = review_id(&data).ok_or(AppError::BadRequest("Review ID is required"))?;
    let increment = match data.get("increment") {
        None => true,
        Some(Value::Bool(increment)) => *increment,
        Some(_) => return Err(AppError::BadRequest("Increment must be a boolean")),
    };

    state
        .store
        .adjust_helpful(review_id, increment)
        .map_err(|e| store_error("updating helpful count", e))?;

    Ok(Json(json!({ "success": true })))
}

async fn stats(State(state): State<AppState>) -> Response {
    record_request("stats");

    match state.store.stats() {
        Ok(stats) => Json(stats).into_response(),
        Err(e) => {
            error!("Error fetching stats: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch stats" })),
            )
                .into_response()
        }
    }
}

async fn get_settings(State(state): State<AppState>) -> Json<Value> {
    Json(Value::Object(state.settings.load()))
}

async fn update_settings(State(state): State<AppState>, body: Bytes) -> Response {
    let patch = match serde_json::from_slice::<Value>(&body) {
        Ok(patch) => patch,
        Err(_) => return settings_error(StatusCode::BAD_REQUEST, "Invalid settings payload"),
    };

    match state.settings.update(patch) {
        Ok(settings) => Json(json!({ "status": "success", "settings": settings })).into_response(),
        Err(Error::Validation(_)) => {
            settings_error(StatusCode::BAD_REQUEST, "Settings must be a JSON object")
        }
        Err(_) => settings_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save settings"),
    }
}

fn settings_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

async fn languages() -> Json<Value> {
    let languages: Vec<Value> = SUPPORTED_LANGUAGES
        .iter()
        .map(|(code, name)| json!({ "code": code, "name": name }))
        .collect();
    Json(Value::Array(languages))
}

fn parse_object(body: &[u8]) -> Option<serde_json::Map<String, Value>> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Positive `reviewId`, given as a number or a numeric string
fn review_id(data: &serde_json::Map<String, Value>) -> Option<i64> {
    let id = match data.get("reviewId")? {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

fn store_error(action: &str, err: Error) -> AppError {
    match err {
        Error::NotFound(_) => AppError::NotFound("Review not found"),
        Error::Validation(_) => AppError::BadRequest("Invalid rating data"),
        other => {
            error!("Error {}: {}", action, other);
            AppError::Internal("Failed to update review")
        }
    }
}

/// Error rendered as `{success: false, error}`
#[derive(Debug)]
enum AppError {
    BadRequest(&'static str),
    NotFound(&'static str),
    Internal(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "success": false, "error": message }))).into_response()
    }
}
