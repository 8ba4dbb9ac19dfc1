// HTTP request handlers
use crate::domain::snapshot::Snapshot;
use crate::domain::telemetry::Vitals;
use crate::presentation::app_state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct VitalsResponse {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub vitals: Vitals,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    if state.poller.is_stopped() {
        (StatusCode::SERVICE_UNAVAILABLE, "stopped")
    } else {
        (StatusCode::OK, "ok")
    }
}

/// Current snapshot as JSON
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<Arc<Snapshot>> {
    Json(state.poller.snapshot())
}

/// Status bands for the latest reading
pub async fn get_vitals(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.poller.snapshot();
    let Some(reading) = snapshot.latest.as_ref() else {
        return (StatusCode::NOT_FOUND, "no reading received yet").into_response();
    };

    match reading.vitals() {
        Ok(vitals) => Json(VitalsResponse {
            timestamp: reading.timestamp,
            vitals,
        })
        .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Latest reading cannot be classified");
            (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response()
        }
    }
}

/// Server-sent events, one `snapshot` event per published snapshot
pub async fn stream_snapshots(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = state.poller.updates();

    let stream = async_stream::stream! {
        while let Some(snapshot) = updates.next().await {
            match Event::default().event("snapshot").json_data(&*snapshot) {
                Ok(event) => yield Ok(event),
                Err(e) => tracing::warn!(error = %e, "Failed to encode snapshot event"),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
