//! Stream Processor (C3): the consumer-group lifecycle shared by the
//! aggregator and the persister.
//!
//! Design Notes §9 calls for "a single stream-processing core parameterized
//! by a message-handler capability" rather than an inheritance hierarchy.
//! `StreamProcessor<H>` is that core; `H: MessageHandler` is the one point
//! of variation. This mirrors the teacher's `EdgeReceiver`/`EdgeReceiverClient`
//! shape (`Arc<AtomicBool>` run flag, `run(self: Arc<Self>)` driver loop,
//! reconnect/backoff bookkeeping) adapted from a single WebSocket feed to a
//! pluggable Redis Streams consumer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::error::{HandlerError, ProcessOutcome};
use crate::metrics::ProcessorStats;
use crate::store::Store;

/// The one point of variation between the aggregator and the persister:
/// what happens to a single message's fields once it's been read.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Processes one message's already-decoded field map. Returning `Err`
    /// leaves the message un-acked, eligible for a future reclaim.
    async fn handle(&self, store: &Store, fields: &HashMap<String, String>) -> Result<(), HandlerError>;

    /// Used only for log lines; does not affect behavior.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct StreamProcessorConfig {
    pub stream_name: String,
    pub consumer_group: String,
    pub consumer_name: String,
    pub batch_size: usize,
    pub reclaim_interval: Duration,
    pub read_timeout: Duration,
    pub idle_sleep: Duration,
    pub min_idle_for_reclaim: Duration,
}

/// Generic consumer-group driver: bootstrap, periodic reclaim, batched
/// read/ack, and per-message error isolation, parameterized by `H`.
pub struct StreamProcessor<H: MessageHandler> {
    store: Store,
    config: StreamProcessorConfig,
    handler: H,
    running: Arc<AtomicBool>,
    stats: Arc<ProcessorStats>,
}

impl<H: MessageHandler> StreamProcessor<H> {
    pub fn new(store: Store, config: StreamProcessorConfig, handler: H) -> Self {
        Self {
            store,
            config,
            handler,
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(ProcessorStats::default()),
        }
    }

    /// A handle callers can use to request shutdown from outside `run`.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn stats(&self) -> Arc<ProcessorStats> {
        self.stats.clone()
    }

    /// Creates the consumer group if absent; BUSYGROUP is success (spec §4.2).
    async fn ensure_group(&self) -> Result<()> {
        match self.store.ensure_group(&self.config.stream_name, &self.config.consumer_group).await {
            Ok(true) => info!(stream = %self.config.stream_name, group = %self.config.consumer_group, "consumer group created"),
            Ok(false) => info!(stream = %self.config.stream_name, group = %self.config.consumer_group, "consumer group already exists"),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    /// Lists pending entries and claims any whose idle time exceeds the
    /// configured threshold. Never fails the caller (spec §4.2): a claim
    /// that loses a race to another consumer is logged as a no-op, not an
    /// error.
    async fn reclaim_stale(&self) {
        let pending = match self
            .store
            .list_pending(&self.config.stream_name, &self.config.consumer_group, 10)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "error listing pending messages");
                return;
            }
        };

        if pending.is_empty() {
            debug!("no pending messages to claim");
            return;
        }

        info!(count = pending.len(), "attempting to claim pending messages");
        let mut claimed = 0u64;
        for entry in pending {
            if entry.idle_ms < self.config.min_idle_for_reclaim.as_millis() as i64 {
                continue;
            }
            match self
                .store
                .claim(
                    &self.config.stream_name,
                    &self.config.consumer_group,
                    &self.config.consumer_name,
                    self.config.min_idle_for_reclaim.as_millis() as u64,
                    &entry.message_id,
                )
                .await
            {
                Ok(true) => {
                    info!(message_id = %entry.message_id, "message successfully claimed");
                    claimed += 1;
                }
                Ok(false) => warn!(message_id = %entry.message_id, "failed to claim message"),
                Err(e) => error!(message_id = %entry.message_id, error = %e, "error claiming message"),
            }
        }
        self.stats.record_reclaimed(claimed);
    }

    /// Reads one batch, dispatches each message to the handler, acks the
    /// successes. Returns `Err` only for a fatal (connection-level) failure
    /// on the read itself; per-message handler failures never propagate.
    async fn consume_once(&self) -> Result<(), ProcessOutcome> {
        let messages = self
            .store
            .read_group(
                &self.config.stream_name,
                &self.config.consumer_group,
                &self.config.consumer_name,
                self.config.batch_size,
                self.config.read_timeout.as_millis() as u64,
            )
            .await
            .map_err(|e| ProcessOutcome::StoreFatal(e.to_string()))?;

        if messages.is_empty() {
            self.stats.record_empty_batch();
            tokio::time::sleep(self.config.idle_sleep).await;
            return Ok(());
        }

        debug!(count = messages.len(), stream = %self.config.stream_name, "processing batch");
        for (message_id, fields) in messages {
            match self.handler.handle(&self.store, &fields).await {
                Ok(()) => {
                    if let Err(e) = self
                        .store
                        .ack(&self.config.stream_name, &self.config.consumer_group, &message_id)
                        .await
                    {
                        warn!(message_id = %message_id, error = %e, "ack failed; message remains pending");
                    } else {
                        self.stats.record_processed();
                    }
                }
                Err(e) => {
                    error!(message_id = %message_id, handler = self.handler.name(), error = %e, "error processing message");
                    self.stats.record_failed();
                }
            }
        }
        Ok(())
    }

    /// Unbounded driver loop: alternates reclaim-if-interval-elapsed and
    /// consume-once until cooperative shutdown or a fatal store error.
    pub async fn run(self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);

        let shutdown_flag = self.running.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown_flag.store(false, Ordering::SeqCst);
        });

        self.ensure_group().await?;

        let mut last_reclaim = Instant::now() - self.config.reclaim_interval;
        let result = loop {
            if !self.running.load(Ordering::Relaxed) {
                break Ok(());
            }
            if last_reclaim.elapsed() >= self.config.reclaim_interval {
                self.reclaim_stale().await;
                last_reclaim = Instant::now();
            }
            match self.consume_once().await {
                Ok(()) => {}
                Err(outcome) => {
                    error!(%outcome, "fatal store error, shutting down");
                    self.running.store(false, Ordering::SeqCst);
                    break Err(anyhow::anyhow!("{outcome}"));
                }
            }
        };

        info!(stream = %self.config.stream_name, "shutting down");
        result
    }
}
