//! Stream Persister (C5): writes raw events to the durable store, verbatim.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::models::{DriverPositionEvent, OrderEvent};
use crate::persist::EventStore;
use crate::store::Store;

use super::processor::MessageHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistKind {
    DriverPosition,
    Order,
}

pub struct StreamPersister {
    kind: PersistKind,
    events: EventStore,
}

impl StreamPersister {
    pub fn new(kind: PersistKind, events: EventStore) -> Self {
        Self { kind, events }
    }
}

#[async_trait]
impl MessageHandler for StreamPersister {
    async fn handle(&self, _store: &Store, fields: &HashMap<String, String>) -> Result<(), HandlerError> {
        match self.kind {
            PersistKind::DriverPosition => {
                let event = DriverPositionEvent::parse(fields)?;
                self.events
                    .store_driver_position(&event)
                    .map_err(|e| HandlerError::Transient(e.to_string()))
            }
            PersistKind::Order => {
                let event = OrderEvent::parse(fields)?;
                self.events
                    .store_order(&event)
                    .map_err(|e| HandlerError::Transient(e.to_string()))
            }
        }
    }

    fn name(&self) -> &str {
        match self.kind {
            PersistKind::DriverPosition => "persister:driver_position",
            PersistKind::Order => "persister:order",
        }
    }
}
