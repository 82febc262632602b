//! Stream-processing core (C3, C4, C5): one generic consumer-group driver
//! plus two handlers that plug into it.

pub mod aggregator;
pub mod persister;
pub mod processor;

pub use aggregator::{AggregateKind, StreamAggregator};
pub use persister::{PersistKind, StreamPersister};
pub use processor::{MessageHandler, StreamProcessor, StreamProcessorConfig};
