//! Error types for the actor runtime.
//!
//! Mirrors the taxonomy in the design: [`ActorError::BadMessage`] for
//! send-site validation failures, [`ActorError::Lifecycle`] for FSM
//! violations, and [`ActorError::Handler`] for errors raised out of a
//! user handler. All three propagate the same way: they mark the actor
//! `ERROR`/`FAILED` and walk up the supervision tree as `FAILED` signals.

use std::sync::Arc;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ActorError>;

/// Errors the runtime itself can raise.
#[derive(Error, Debug, Clone)]
pub enum ActorError {
    /// A `send` was rejected before being enqueued.
    #[error("invalid message [{name}] -> {target}: {reason}")]
    BadMessage {
        target: String,
        name: String,
        reason: BadMessageReason,
    },

    /// An FSM transition was attempted from a state that does not allow it.
    #[error("actor lifecycle error: {0}")]
    Lifecycle(String),

    /// A handler (on_start/on_stop/on_signal/handle) raised an error.
    ///
    /// The original error is preserved via `source()` rather than being
    /// replaced with an opaque placeholder when it propagates further up
    /// the supervision tree.
    #[error("handler error: {0}")]
    Handler(#[source] Arc<dyn std::error::Error + Send + Sync>),

    /// A `FAILED` signal propagated past an ancestor that did not handle it.
    #[error("propagated failure from {child}: {source}")]
    Propagated {
        child: String,
        #[source]
        source: Arc<ActorError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadMessageReason {
    UnknownHandler,
    TooManyArgs,
    WrongPayloadType,
    SignalSentAsMessage,
    MessageSentAsSignal,
}

impl std::fmt::Display for BadMessageReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BadMessageReason::UnknownHandler => "unknown message",
            BadMessageReason::TooManyArgs => "too many arguments",
            BadMessageReason::WrongPayloadType => "wrong parameter type",
            BadMessageReason::SignalSentAsMessage => "signals cannot be sent like messages",
            BadMessageReason::MessageSentAsSignal => "messages cannot be sent like signals",
        };
        f.write_str(s)
    }
}

impl ActorError {
    pub fn handler<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
        ActorError::Handler(Arc::new(err))
    }
}
