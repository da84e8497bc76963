///! HTTP interface
///!
///! Two JSON endpoints behind a permissive CORS layer: the harvested
///! catalogue and the per-observer visibility report. Harvest failures
///! degrade to empty results rather than error statuses; malformed
///! coordinates fall back to defaults rather than 400s.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{NaiveDateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use skylore_core::catalog::{CatalogueEntry, CatalogueManager};
use skylore_core::visibility::{VisibilityReport, compute_visibility};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<CatalogueManager>,
}

pub fn build_router(state: AppState) -> Router {
    // Answer any origin, any method; OPTIONS pre-flight gets 200/empty.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/constellations", get(list_constellations))
        .route("/api/constellations/{id}", get(get_constellation))
        .route("/api/visibility", get(visibility))
        .fallback(not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        // A panicking handler becomes a generic 500, never a dropped
        // connection or a leaked internal message.
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Full catalogue as a JSON array; empty array when every source failed.
async fn list_constellations(State(state): State<AppState>) -> Json<Vec<CatalogueEntry>> {
    Json(state.manager.catalogue().await)
}

/// Single record by slug, through the short-TTL record cache.
async fn get_constellation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    match state.manager.constellation(&id).await {
        Some(entry) => Json(entry).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "constellation not found"),
    }
}

#[derive(Debug, Deserialize)]
struct VisibilityQuery {
    lat: Option<String>,
    lon: Option<String>,
}

/// Visibility report for an observer. Coordinates arrive as strings so a
/// malformed value degrades to the default instead of a 400.
async fn visibility(
    State(state): State<AppState>,
    Query(query): Query<VisibilityQuery>,
) -> Json<VisibilityReport> {
    let lat = parse_coordinate(query.lat.as_deref(), 90.0);
    let lon = parse_coordinate(query.lon.as_deref(), 180.0);

    let catalogue = state.manager.catalogue().await;
    let now_local = observer_local_time(lon);

    Json(compute_visibility(&catalogue, lat, lon, now_local))
}

fn parse_coordinate(raw: Option<&str>, bound: f64) -> f64 {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(-bound, bound))
        .unwrap_or(0.0)
}

/// Observer wall-clock time approximated from longitude (15 degrees per
/// hour); good enough for the night-window gate.
fn observer_local_time(lon: f64) -> NaiveDateTime {
    let offset_hours = (lon / 15.0).round() as i64;
    (Utc::now() + chrono::Duration::hours(offset_hours)).naive_utc()
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use skylore_core::HarvestError;
    use skylore_core::catalog::{HarvestConfig, PageFetcher, SystemClock};
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    /// Every fetch fails, so the catalogue is always empty.
    struct DownFetcher;

    #[async_trait]
    impl PageFetcher for DownFetcher {
        async fn fetch_page(&self, url: &str) -> Result<String, HarvestError> {
            Err(HarvestError::Unavailable {
                url: url.to_string(),
                attempts: 1,
            })
        }
    }

    fn test_router(dir: &TempDir) -> Router {
        let manager = CatalogueManager::with_fetcher(
            Arc::new(DownFetcher),
            Arc::new(SystemClock),
            dir.path(),
            HarvestConfig {
                batch_delay_ms: 0,
                ..HarvestConfig::default()
            },
        );
        build_router(AppState {
            manager: Arc::new(manager),
        })
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalogue_is_empty_array_when_all_sources_fail() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .uri("/api/constellations")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "[]");
    }

    #[tokio::test]
    async fn test_unknown_record_is_404() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .uri("/api/constellations/no-such-slug")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_visibility_with_malformed_coordinates_still_succeeds() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .uri("/api/visibility?lat=abc&lon=")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("\"visibleIds\":[]"));
        assert!(body.contains("moonPhaseLabel"));
    }

    #[tokio::test]
    async fn test_preflight_gets_cors_headers() {
        let dir = TempDir::new().unwrap();
        let response = test_router(&dir)
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/constellations")
                    .header("origin", "https://example.com")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[test]
    fn test_parse_coordinate_defensive_defaults() {
        assert_eq!(parse_coordinate(Some("47.5"), 90.0), 47.5);
        assert_eq!(parse_coordinate(Some("abc"), 90.0), 0.0);
        assert_eq!(parse_coordinate(None, 90.0), 0.0);
        assert_eq!(parse_coordinate(Some("120"), 90.0), 90.0);
        assert_eq!(parse_coordinate(Some("NaN"), 90.0), 0.0);
    }
}
