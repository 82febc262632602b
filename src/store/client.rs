//! Key-Value / Stream Client Factory (C1).
//!
//! Scoped acquisition and release of a connection to the Redis-compatible
//! store backing both the streams and the per-minute counter buckets.
//! Mirrors the original source's `redis_client` context manager: a single
//! owned connection, created at entry and closed on every exit path.

use std::collections::HashMap;

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use redis::streams::{StreamClaimOptions, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, Client, FromRedisValue, RedisError, Value};
use tracing::info;

/// A pending (delivered, not yet acked) message observed via `XPENDING`.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub message_id: String,
    pub idle_ms: i64,
}

/// Owns the connection to the store for the lifetime of one run loop.
/// Cloning is cheap (`ConnectionManager` is an `Arc`-backed handle that
/// reconnects transparently on transient network blips); a terminal
/// connection failure still surfaces as `StoreFatal` to the caller.
#[derive(Clone)]
pub struct Store {
    conn: ConnectionManager,
}

impl Store {
    /// Opens a connection to `redis://host:port`. This is the sole
    /// acquisition point (C1); every binary obtains its `Store` here and
    /// lets it drop at the end of its `run` loop, normally or on signal.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!(redis_url, "connecting to store");
        let client = Client::open(redis_url).context("invalid redis URL")?;
        let conn = client
            .get_connection_manager()
            .await
            .context("failed to connect to store")?;
        Ok(Self { conn })
    }

    fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// Creates the consumer group anchored at the stream's origin ("0").
    /// Returns `Ok(true)` if it was created, `Ok(false)` if it already
    /// existed (BUSYGROUP, treated as success per spec §4.2/§7).
    pub async fn ensure_group(&self, stream: &str, group: &str) -> Result<bool> {
        let mut conn = self.conn();
        let result: Result<(), RedisError> = conn.xgroup_create_mkstream(stream, group, "0").await;
        match result {
            Ok(()) => Ok(true),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(false),
            Err(e) => Err(e).context("unexpected error creating consumer group"),
        }
    }

    /// Reads up to `count` new messages (`>`) for `consumer` in `group`,
    /// blocking up to `block_ms`. Returns an empty vec on timeout.
    pub async fn read_group(
        &self,
        stream: &str,
        group: &str,
        consumer: &str,
        count: usize,
        block_ms: u64,
    ) -> Result<Vec<(String, HashMap<String, String>)>> {
        let mut conn = self.conn();
        let opts = StreamReadOptions::default()
            .group(group, consumer)
            .count(count)
            .block(block_ms as usize);
        let reply: StreamReadReply = conn
            .xread_options(&[stream], &[">"], &opts)
            .await
            .context("xreadgroup failed")?;

        let mut out = Vec::new();
        for key in reply.keys {
            for id in key.ids {
                let mut fields = HashMap::with_capacity(id.map.len());
                for (field, value) in id.map {
                    if let Ok(s) = String::from_redis_value(&value) {
                        fields.insert(field, s);
                    }
                }
                out.push((id.id, fields));
            }
        }
        Ok(out)
    }

    /// Acknowledges one message for `group`.
    pub async fn ack(&self, stream: &str, group: &str, message_id: &str) -> Result<()> {
        let mut conn = self.conn();
        let _: i64 = conn
            .xack(stream, group, &[message_id])
            .await
            .context("xack failed")?;
        Ok(())
    }

    /// Lists pending entries for `group`, regardless of owning consumer.
    pub async fn list_pending(&self, stream: &str, group: &str, count: usize) -> Result<Vec<PendingEntry>> {
        let mut conn = self.conn();
        let reply: redis::streams::StreamPendingCountReply = conn
            .xpending_count(stream, group, "-", "+", count)
            .await
            .context("xpending failed")?;
        Ok(reply
            .ids
            .into_iter()
            .map(|e| PendingEntry {
                message_id: e.id,
                idle_ms: e.last_delivery,
            })
            .collect())
    }

    /// Attempts to claim one pending message into `new_consumer`, provided
    /// its idle time exceeds `min_idle_ms`. Returns `true` if claimed.
    pub async fn claim(
        &self,
        stream: &str,
        group: &str,
        new_consumer: &str,
        min_idle_ms: u64,
        message_id: &str,
    ) -> Result<bool> {
        let mut conn = self.conn();
        let opts = StreamClaimOptions::default();
        let reply: redis::streams::StreamClaimReply = conn
            .xclaim_options(
                stream,
                group,
                new_consumer,
                min_idle_ms as usize,
                &[message_id],
                opts,
            )
            .await
            .context("xclaim failed")?;
        Ok(!reply.ids.is_empty())
    }

    /// Appends one event to `stream` as a single pipelined `XADD`.
    pub async fn append(&self, stream: &str, fields: &[(String, String)]) -> Result<String> {
        let mut conn = self.conn();
        let id: String = conn.xadd(stream, "*", fields).await.context("xadd failed")?;
        Ok(id)
    }

    /// Increments `cell_id` by 1 in each of the given bucket keys, as one
    /// pipelined transaction (spec's "single batched write" fan-out, §4.3
    /// step 4). All increments either reach the store together or, on a
    /// pipeline failure, none do and the message stays un-acked.
    pub async fn increment_buckets(&self, increments: &[(String, String)]) -> Result<()> {
        let mut conn = self.conn();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (bucket_key, cell_id) in increments {
            pipe.cmd("HINCRBY").arg(bucket_key).arg(cell_id).arg(1).ignore();
        }
        pipe.query_async(&mut conn).await.context("bucket increment pipeline failed")?;
        Ok(())
    }

    /// Reads several hash buckets in one pipelined round trip. A bucket
    /// absent from the store (evicted or never written) comes back as an
    /// empty map, per spec's "missing buckets contribute zero".
    pub async fn read_buckets(&self, keys: &[String]) -> Result<Vec<HashMap<String, i64>>> {
        let mut conn = self.conn();
        let mut pipe = redis::pipe();
        for key in keys {
            pipe.cmd("HGETALL").arg(key);
        }
        let replies: Vec<HashMap<String, String>> =
            pipe.query_async(&mut conn).await.context("bucket read pipeline failed")?;
        Ok(replies
            .into_iter()
            .map(|map| {
                map.into_iter()
                    .filter_map(|(cell, count)| count.parse::<i64>().ok().map(|c| (cell, c)))
                    .collect()
            })
            .collect())
    }
}

/// Helper used by tests and by `Value` debugging: best-effort string coercion.
#[allow(dead_code)]
fn value_to_string(value: &Value) -> Option<String> {
    String::from_redis_value(value).ok()
}
