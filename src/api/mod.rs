//! Read API (C9): router assembly over `routes`.

pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/driver-count/:resolution", get(routes::driver_count))
        .route("/api/order-count/:resolution", get(routes::order_count))
        .route("/api/surge-price/:resolution", get(routes::surge_price))
        .with_state(state)
}
