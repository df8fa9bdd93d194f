//! Single-threaded cooperative actor runtime with supervision and
//! lifecycle signals.
//!
//! Actors communicate exclusively through one FIFO queue dispatched on a
//! single OS thread (see [`ActorSystem`]). There is no user-level
//! concurrency inside the tree: one actor's handler runs to completion
//! before the next envelope is dispatched. Supervision failures propagate
//! upward as `FAILED` signals until an ancestor's [`Actor::on_signal`]
//! handles them or they reach the root, at which point the whole system
//! shuts down with a non-zero exit code.
//!
//! ```text
//! NOT_STARTED --start--> STARTING --ok--> RUNNING --stop--> STOPPING --ok--> STOPPED
//!                             |                |
//!                            err              err
//!                             v                v
//!                           FAILED  <---------FAILED
//! ```

mod actor;
mod error;
mod id;
mod message;
mod system;

pub use actor::{Actor, ActorContext, ActorState};
pub use error::{ActorError, BadMessageReason, Result};
pub use id::ActorId;
pub use message::{downcast_payload, Envelope, EnvelopeKind, Message, MessageSlot, Payload, Signal, SIGNAL_PREFIX};
pub use system::ActorSystem;
