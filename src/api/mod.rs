//! HTTP surface for the analysis engine
//!
//! - `POST /v1/` takes an access event and answers `201 Created` with the verdict
//! - `GET /health` reports liveness and the service version

mod error;

pub use error::{ApiError, Result};

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::detection::AnalysisEngine;
use crate::geolocation::GeoResolver;
use crate::models::AccessEvent;
use crate::persistence::EventStore;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Build the service router around a shared engine
pub fn create_router<G, S>(engine: Arc<AnalysisEngine<G, S>>) -> Router
where
    G: GeoResolver + 'static,
    S: EventStore + 'static,
{
    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/", post(analyze_handler::<G, S>))
        .with_state(engine)
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn analyze_handler<G, S>(
    State(engine): State<Arc<AnalysisEngine<G, S>>>,
    payload: std::result::Result<Json<AccessEvent>, JsonRejection>,
) -> Result<impl IntoResponse>
where
    G: GeoResolver + 'static,
    S: EventStore + 'static,
{
    let Json(event) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let event_id = event.event_uuid.clone();
    let username = event.username.clone();

    // SQLite and the GeoIP reader block, keep them off the async workers
    let outcome = tokio::task::spawn_blocking(move || engine.analyze(&event))
        .await
        .map_err(ApiError::from)
        .and_then(|analysis| analysis.map_err(ApiError::from));
    let verdict = outcome.map_err(|e| {
        log::error!("{}", failure_message(&event_id, &username, &e));
        e
    })?;

    log::info!(
        "Analyzed event {} for user '{}': travel_to_suspicious={}, travel_from_suspicious={}",
        event_id,
        username,
        verdict.travel_to_suspicious(),
        verdict.travel_from_suspicious()
    );

    Ok((StatusCode::CREATED, Json(verdict)))
}

fn failure_message(event_id: &str, username: &str, err: &ApiError) -> String {
    format!("Analysis of event {} for user '{}' failed: {}", event_id, username, err)
}
