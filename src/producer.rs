//! Producer (C6): a generic generate-and-append loop, plus the two
//! concrete event generators. Grounded on the original's `RedisProducer` —
//! same shape (injected generator callback, fixed interval, 2x backoff on
//! a failed append), same Belo Horizonte coordinate box and per-event
//! distributions.

use chrono::Utc;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::{DriverPositionEvent, OrderEvent};
use crate::store::Store;

const BH_LAT_MIN: f64 = -20.0047113796;
const BH_LAT_MAX: f64 = -19.7890619963;
const BH_LON_MIN: f64 = -44.0986149944;
const BH_LON_MAX: f64 = -43.860692326;

const BH_LAT_CENTER: f64 = -19.9191;
const BH_LON_CENTER: f64 = -43.9386;
const LAT_STDDEV: f64 = 0.05;
const LON_STDDEV: f64 = 0.05;

/// Generates one driver position uniformly within the Belo Horizonte box.
pub fn generate_driver_position() -> DriverPositionEvent {
    let mut rng = rand::thread_rng();
    DriverPositionEvent {
        driver_id: Uuid::new_v4().to_string(),
        latitude: rng.gen_range(BH_LAT_MIN..BH_LAT_MAX),
        longitude: rng.gen_range(BH_LON_MIN..BH_LON_MAX),
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// Generates one order, normally distributed around the city center.
pub fn generate_order() -> OrderEvent {
    let mut rng = rand::thread_rng();
    let lat_dist = Normal::new(BH_LAT_CENTER, LAT_STDDEV).expect("fixed, valid stddev");
    let lon_dist = Normal::new(BH_LON_CENTER, LON_STDDEV).expect("fixed, valid stddev");
    OrderEvent {
        order_id: Uuid::new_v4().to_string(),
        customer_id: Uuid::new_v4().to_string(),
        order_value: rng.gen_range(10.0..500.0),
        latitude: lat_dist.sample(&mut rng),
        longitude: lon_dist.sample(&mut rng),
        timestamp: Utc::now().to_rfc3339(),
    }
}

/// Continuously generates data via `generate` and appends it to `stream_name`
/// at `interval`. On an append failure, backs off for `2 * interval` before
/// retrying rather than busy-looping against an unreachable store.
pub struct Producer<F, E>
where
    F: Fn() -> E,
    E: Into<Vec<(String, String)>>,
{
    store: Store,
    stream_name: String,
    interval: Duration,
    generate: F,
    running: Arc<AtomicBool>,
}

impl<F, E> Producer<F, E>
where
    F: Fn() -> E,
    E: Into<Vec<(String, String)>>,
{
    pub fn new(store: Store, stream_name: String, interval: Duration, generate: F) -> Self {
        Self {
            store,
            stream_name,
            interval,
            generate,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.running.store(true, Ordering::SeqCst);
        let shutdown_flag = self.running.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_flag.store(false, Ordering::SeqCst);
        });

        info!(stream = %self.stream_name, "starting producer");
        while self.running.load(Ordering::Relaxed) {
            let fields = (self.generate)().into();
            match self.store.append(&self.stream_name, &fields).await {
                Ok(id) => info!(stream = %self.stream_name, message_id = %id, "data sent"),
                Err(e) => {
                    error!(stream = %self.stream_name, error = %e, "failed to send data");
                    tokio::time::sleep(self.interval * 2).await;
                }
            }
            tokio::time::sleep(self.interval).await;
        }
        warn!(stream = %self.stream_name, "producer stopped");
        Ok(())
    }
}

impl From<DriverPositionEvent> for Vec<(String, String)> {
    fn from(event: DriverPositionEvent) -> Self {
        event.to_stream_fields()
    }
}

impl From<OrderEvent> for Vec<(String, String)> {
    fn from(event: OrderEvent) -> Self {
        event.to_stream_fields()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_position_lands_within_bounding_box() {
        for _ in 0..100 {
            let event = generate_driver_position();
            assert!((BH_LAT_MIN..BH_LAT_MAX).contains(&event.latitude));
            assert!((BH_LON_MIN..BH_LON_MAX).contains(&event.longitude));
        }
    }

    #[test]
    fn order_value_within_expected_range() {
        for _ in 0..100 {
            let event = generate_order();
            assert!((10.0..500.0).contains(&event.order_value));
        }
    }
}
