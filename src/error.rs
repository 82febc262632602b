//! Error taxonomy for the stream-processing core.
//!
//! Replaces exception-as-control-flow in the consumer loops with explicit
//! result values the `run` loop dispatches on.

use std::fmt;

/// Outcome of handling a single stream message.
///
/// `MalformedEvent` and `StoreTransient` both leave the message un-acked so
/// it is eligible for a future reclaim; only `StoreFatal` terminates the
/// owning run loop.
#[derive(Debug)]
pub enum ProcessOutcome {
    Ok,
    MalformedEvent(String),
    StoreTransient(String),
    StoreFatal(String),
}

impl fmt::Display for ProcessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessOutcome::Ok => write!(f, "ok"),
            ProcessOutcome::MalformedEvent(r) => write!(f, "malformed event: {r}"),
            ProcessOutcome::StoreTransient(r) => write!(f, "transient store error: {r}"),
            ProcessOutcome::StoreFatal(r) => write!(f, "fatal store error: {r}"),
        }
    }
}

impl ProcessOutcome {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProcessOutcome::StoreFatal(_))
    }
}

/// Error returned by a [`crate::stream::MessageHandler`] for a single message.
///
/// Intentionally does not carry a `Fatal` variant: fatal store errors surface
/// through the processor's own Redis calls (ack/read/claim), not through the
/// handler, since the handler only ever touches the store via the
/// processor-owned connection.
#[derive(Debug)]
pub enum HandlerError {
    Malformed(String),
    Transient(String),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Malformed(r) => write!(f, "{r}"),
            HandlerError::Transient(r) => write!(f, "{r}"),
        }
    }
}

impl From<HandlerError> for ProcessOutcome {
    fn from(e: HandlerError) -> Self {
        match e {
            HandlerError::Malformed(r) => ProcessOutcome::MalformedEvent(r),
            HandlerError::Transient(r) => ProcessOutcome::StoreTransient(r),
        }
    }
}
