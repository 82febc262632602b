//! Read API (C9): thin HTTP endpoints over the windowed query and surge
//! calculator. Grounded on the teacher's `api::routes` shape — a query
//! extractor, a `State<AppState>` handle, a `Json<T>` response.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::query::{calculate_surge, windowed_counts};
use crate::AppState;

const DRIVER_PREFIX: &str = "driver_count_by_region";
const ORDER_PREFIX: &str = "order_count_by_region";

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub window_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub count: i64,
}

/// Matches spec §6's `DriverPositionsCountResponse` shape; reused for the
/// order-count endpoint under its own field name. Declared `Option` per
/// spec.md's documented `| null` variant, but the grounding original
/// (`app/driver_position/service.py`, `app/data_aggregator_service.py`)
/// never actually emits `null` for this endpoint — an empty window is an
/// empty list, so `to_region_counts` always produces `Some`.
#[derive(Debug, Serialize)]
pub struct DriverPositionsCountResponse {
    pub driver_position_counts: Option<Vec<RegionCount>>,
}

#[derive(Debug, Serialize)]
pub struct OrderCountResponse {
    pub order_counts: Option<Vec<RegionCount>>,
}

fn window_minutes(query: &WindowQuery, state: &AppState) -> i64 {
    query.window_minutes.unwrap_or(state.config.window_minutes)
}

fn to_region_counts(counts: HashMap<String, i64>) -> Option<Vec<RegionCount>> {
    Some(
        counts
            .into_iter()
            .map(|(region, count)| RegionCount { region, count })
            .collect(),
    )
}

/// `GET /api/driver-count/:resolution`
pub async fn driver_count(
    Path(resolution): Path<u8>,
    Query(query): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DriverPositionsCountResponse>, StatusCode> {
    let window = window_minutes(&query, &state);
    let counts = windowed_counts(&state.store, DRIVER_PREFIX, resolution, window, Utc::now())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(DriverPositionsCountResponse {
        driver_position_counts: to_region_counts(counts),
    }))
}

/// `GET /api/order-count/:resolution`
pub async fn order_count(
    Path(resolution): Path<u8>,
    Query(query): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<OrderCountResponse>, StatusCode> {
    let window = window_minutes(&query, &state);
    let counts = windowed_counts(&state.store, ORDER_PREFIX, resolution, window, Utc::now())
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok(Json(OrderCountResponse {
        order_counts: to_region_counts(counts),
    }))
}

/// `GET /api/surge-price/:resolution`. Response is a bare `{ cell_id: price
/// }` map per spec §6, not wrapped in an envelope.
pub async fn surge_price(
    Path(resolution): Path<u8>,
    Query(query): Query<WindowQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<HashMap<String, f64>>, StatusCode> {
    let window = window_minutes(&query, &state);
    let (orders, drivers) = tokio::try_join!(
        windowed_counts(&state.store, ORDER_PREFIX, resolution, window, Utc::now()),
        windowed_counts(&state.store, DRIVER_PREFIX, resolution, window, Utc::now()),
    )
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let prices = calculate_surge(&orders, &drivers, state.config.base_price);
    Ok(Json(prices))
}
