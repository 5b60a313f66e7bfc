//! HTTP endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/ws`, `/api/MusicSheets/ws` | WebSocket upgrade for live sheets |
//! | `POST` | `/api/MusicSheets/toggle-worker?isRunning=` | Start or stop the producer |
//! | `GET` | `/api/MusicSheets` | List sheets (filter, sort, page) |
//! | `POST` | `/api/MusicSheets` | Create a sheet |
//! | `GET` | `/api/MusicSheets/{id}` | Get one sheet |
//! | `PATCH` | `/api/MusicSheets/{id}` | Update a sheet |
//! | `DELETE` | `/api/MusicSheets/{id}` | Delete a sheet |
//! | `GET` | `/api/MusicSheets/current/tags` | Distinct genres and instruments |
//! | `GET` | `/api/stats` | Registry and producer counters |

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::listener::AppState;
use crate::catalog::query::split_list;
use crate::catalog::{SheetInput, SheetQuery, SheetSummary, SortField, SortOrder};
use crate::producer::{ProducerState, StoreError};
use crate::session;
use crate::stats::{ProducerStatsSnapshot, RegistryStatsSnapshot};

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(websocket))
        .route("/api/MusicSheets/ws", get(websocket))
        .route("/api/MusicSheets/toggle-worker", post(toggle_worker))
        .route("/api/MusicSheets", get(list_sheets).post(create_sheet))
        .route("/api/MusicSheets/current/tags", get(tags))
        .route(
            "/api/MusicSheets/{id}",
            get(get_sheet).patch(update_sheet).delete(delete_sheet),
        )
        .route("/api/stats", get(stats))
        .with_state(state)
}

/// Body for plain status responses
#[derive(Debug, Serialize)]
struct MessageBody {
    message: String,
}

fn message(status: StatusCode, text: impl Into<String>) -> Response {
    (
        status,
        Json(MessageBody {
            message: text.into(),
        }),
    )
        .into_response()
}

fn store_error(error: StoreError) -> Response {
    match error {
        StoreError::NotFound(_) => message(StatusCode::NOT_FOUND, "Music sheet not found."),
        StoreError::Invalid(msg) => message(StatusCode::BAD_REQUEST, msg),
        StoreError::Unavailable(msg) => message(StatusCode::SERVICE_UNAVAILABLE, msg),
    }
}

async fn websocket(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match upgrade {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected non-WebSocket request");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    // The permit lives as long as the session, so concurrent upgrades
    // cannot overshoot the limit
    let permit = match &state.connection_slots {
        Some(slots) => match Arc::clone(slots).try_acquire_owned() {
            Ok(permit) => Some(permit),
            Err(_) => {
                tracing::warn!(
                    max_connections = state.max_connections,
                    "WebSocket rejected: limit reached"
                );
                return StatusCode::SERVICE_UNAVAILABLE.into_response();
            }
        },
        None => None,
    };

    let registry = Arc::clone(state.registry());
    ws.on_upgrade(move |socket| async move {
        session::handle_socket(socket, registry).await;
        drop(permit);
    })
}

#[derive(Debug, Deserialize)]
struct ToggleParams {
    /// Absent means stop
    #[serde(rename = "isRunning", default)]
    is_running: bool,
}

async fn toggle_worker(
    State(state): State<AppState>,
    Query(params): Query<ToggleParams>,
) -> Response {
    if params.is_running {
        state.producer.enable();
    } else {
        state.producer.disable();
    }

    let label = if params.is_running {
        ProducerState::Running
    } else {
        ProducerState::Idle
    };
    message(StatusCode::OK, format!("Worker is now {}.", label))
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    title: Option<String>,
    composer: Option<String>,
    genres: Option<String>,
    instruments: Option<String>,
    #[serde(rename = "_sort")]
    sort: Option<String>,
    #[serde(rename = "_order")]
    order: Option<String>,
    #[serde(rename = "_page")]
    page: Option<i64>,
    #[serde(rename = "_limit")]
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    data: Vec<SheetSummary>,
    total_count: usize,
}

async fn list_sheets(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let page = params.page.unwrap_or(1);
    if page < 1 {
        return message(StatusCode::BAD_REQUEST, "Page number must be greater than 0.");
    }
    let limit = params.limit.unwrap_or(10);
    if limit < 1 {
        return message(StatusCode::BAD_REQUEST, "Limit must be greater than 0.");
    }

    let query = SheetQuery {
        title: params.title.filter(|t| !t.is_empty()),
        composer: params.composer.filter(|c| !c.is_empty()),
        genres: split_list(params.genres.as_deref()),
        instruments: split_list(params.instruments.as_deref()),
        sort: params
            .sort
            .as_deref()
            .map(SortField::parse)
            .unwrap_or_default(),
        order: params
            .order
            .as_deref()
            .map(SortOrder::parse)
            .unwrap_or_default(),
        page: page as usize,
        limit: limit as usize,
    };

    let (sheets, total_count) = state.catalog().list(&query).await;

    Json(ListResponse {
        data: sheets.into_iter().map(SheetSummary::from).collect(),
        total_count,
    })
    .into_response()
}

async fn get_sheet(State(state): State<AppState>, Path(id): Path<u64>) -> Response {
    match state.catalog().get(id).await {
        Some(sheet) => Json(SheetSummary::from(sheet)).into_response(),
        None => message(StatusCode::NOT_FOUND, "Music sheet not found."),
    }
}

async fn create_sheet(State(state): State<AppState>, Json(input): Json<SheetInput>) -> Response {
    match state.catalog().insert(&input.to_sheet()).await {
        Ok(id) => {
            tracing::info!(sheet_id = id, "Music sheet created");
            message(StatusCode::OK, "Music Sheet created successfully")
        }
        Err(e) => store_error(e),
    }
}

async fn update_sheet(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(input): Json<SheetInput>,
) -> Response {
    match state.catalog().update(id, &input).await {
        Ok(()) => message(StatusCode::OK, "Music sheet updated successfully."),
        Err(e) => store_error(e),
    }
}

async fn delete_sheet(State(state): State<AppState>, Path(id): Path<u64>) -> StatusCode {
    if state.catalog().delete(id).await {
        tracing::info!(sheet_id = id, "Music sheet deleted");
    }
    StatusCode::NO_CONTENT
}

async fn tags(State(state): State<AppState>) -> Response {
    Json(state.catalog().tags().await).into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsResponse {
    producer_state: &'static str,
    connections: usize,
    records: usize,
    registry: RegistryStatsSnapshot,
    producer: ProducerStatsSnapshot,
}

async fn stats(State(state): State<AppState>) -> Response {
    Json(StatsResponse {
        producer_state: state.producer.state().as_str(),
        connections: state.registry().len(),
        records: state.catalog().len().await,
        registry: state.registry().stats().snapshot(),
        producer: state.producer.stats().snapshot(),
    })
    .into_response()
}
