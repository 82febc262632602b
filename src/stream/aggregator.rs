//! Stream Aggregator (C4): folds raw position/order events into per-minute,
//! per-resolution H3 cell counters.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::HandlerError;
use crate::h3_index;
use crate::models::{time_key, DriverPositionEvent, OrderEvent};
use crate::store::Store;

use super::processor::MessageHandler;

/// Which event stream this aggregator instance is consuming. A driver
/// position bumps `driver_count_by_region` buckets, an order bumps
/// `order_count_by_region` buckets; the rest of the fold (parse, index,
/// key, increment) is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    DriverPosition,
    Order,
}

impl AggregateKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            AggregateKind::DriverPosition => "driver_count_by_region",
            AggregateKind::Order => "order_count_by_region",
        }
    }
}

/// Builds the hash-bucket key for one prefix, minute, and resolution:
/// `"<prefix>:<YYYY-MM-DDTHH:MM>:<resolution>"` (spec §6). Shared with the
/// windowed query path (§4.6) so both agree on layout.
pub fn bucket_key(prefix: &str, minute: &str, resolution: u8) -> String {
    format!("{prefix}:{minute}:{resolution}")
}

pub struct StreamAggregator {
    kind: AggregateKind,
    resolutions: Vec<u8>,
}

impl StreamAggregator {
    pub fn new(kind: AggregateKind, resolutions: Vec<u8>) -> Self {
        Self { kind, resolutions }
    }

    fn extract(&self, fields: &HashMap<String, String>) -> Result<(f64, f64, String), HandlerError> {
        match self.kind {
            AggregateKind::DriverPosition => {
                let event = DriverPositionEvent::parse(fields)?;
                Ok((event.latitude, event.longitude, event.timestamp))
            }
            AggregateKind::Order => {
                let event = OrderEvent::parse(fields)?;
                Ok((event.latitude, event.longitude, event.timestamp))
            }
        }
    }
}

#[async_trait]
impl MessageHandler for StreamAggregator {
    async fn handle(&self, store: &Store, fields: &HashMap<String, String>) -> Result<(), HandlerError> {
        let (latitude, longitude, timestamp) = self.extract(fields)?;
        let minute = time_key(&timestamp)?;
        let cells = h3_index::cells_for(latitude, longitude, &self.resolutions)?;

        let prefix = self.kind.prefix();
        let mut increments = Vec::with_capacity(self.resolutions.len());
        for &resolution in &self.resolutions {
            let cell_id = cells.get(&resolution).expect("cells_for covers every requested resolution").clone();
            increments.push((bucket_key(prefix, minute, resolution), cell_id));
        }

        debug!(prefix, minute, cells = increments.len(), "folding event into buckets");
        store
            .increment_buckets(&increments)
            .await
            .map_err(|e| HandlerError::Transient(e.to_string()))
    }

    fn name(&self) -> &str {
        match self.kind {
            AggregateKind::DriverPosition => "aggregator:driver_position",
            AggregateKind::Order => "aggregator:order",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_key_layout() {
        assert_eq!(
            bucket_key("driver_count_by_region", "2024-05-01T12:34", 8),
            "driver_count_by_region:2024-05-01T12:34:8"
        );
    }
}
