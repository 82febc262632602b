//! Store access: a thin Redis Streams + hash-bucket client (C1).

pub mod client;

pub use client::{PendingEntry, Store};
