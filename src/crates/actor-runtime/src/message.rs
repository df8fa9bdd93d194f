//! Messages and lifecycle signals.
//!
//! Both travel through the same FIFO queue as [`Envelope`]s. A signal is
//! a small closed set of lifecycle events (`START`, `STOP`, `STARTED`,
//! `STOPPED`, `FAILED`); a message is an arbitrary, actor-defined payload
//! type. The two are kept structurally distinct (`EnvelopeKind::Signal`
//! vs `EnvelopeKind::Message`) rather than sniffed from a string prefix,
//! but the reserved `actor:` name prefix from the design is still
//! produced by [`Signal::name`] so logs and id-format fidelity match the
//! spec exactly.

use crate::id::ActorId;
use std::any::{Any, TypeId};
use std::fmt;

/// Reserved prefix for signal names.
pub const SIGNAL_PREFIX: &str = "actor:";

/// Lifecycle signals. These are handled by the runtime before (and
/// sometimes instead of) being handed to the actor's own `on_signal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Signal {
    Start,
    Stop,
    Started,
    Stopped,
    Failed,
}

impl Signal {
    pub fn name(&self) -> &'static str {
        match self {
            Signal::Start => "actor:start",
            Signal::Stop => "actor:stop",
            Signal::Started => "actor:started",
            Signal::Stopped => "actor:stopped",
            Signal::Failed => "actor:failed",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Marker trait for actor message payloads.
///
/// Blanket-implemented for any `'static + Send + Debug` type, so actors
/// define plain structs/enums per message name (see the design note on
/// typed messages) and the runtime only ever needs `Any` + `Send` to
/// route them.
pub trait Message: Any + Send + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn type_id_of(&self) -> TypeId;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Send + fmt::Debug> Message for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_id_of(&self) -> TypeId {
        TypeId::of::<T>()
    }
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A type-erased message payload, downcast by the receiving actor's
/// `handle` implementation.
pub type Payload = Box<dyn Message>;

/// Downcast a payload to its concrete type, once `handle` has matched on
/// the message name and knows which type to expect.
pub fn downcast_payload<M: Any>(payload: Payload) -> Option<Box<M>> {
    payload.into_any().downcast::<M>().ok()
}

/// The one shape every envelope in the queue takes, whether it carries a
/// signal or a message.
#[derive(Debug)]
pub enum EnvelopeKind {
    Signal(Signal),
    Message { name: &'static str, payload: Payload },
}

impl EnvelopeKind {
    pub fn name(&self) -> &str {
        match self {
            EnvelopeKind::Signal(s) => s.name(),
            EnvelopeKind::Message { name, .. } => name,
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, EnvelopeKind::Signal(_))
    }
}

/// A single envelope traveling through the scheduler's FIFO queue.
#[derive(Debug)]
pub struct Envelope {
    pub sender: ActorId,
    pub target: ActorId,
    pub kind: EnvelopeKind,
}

impl Envelope {
    pub fn signal(sender: ActorId, target: ActorId, signal: Signal) -> Self {
        Envelope {
            sender,
            target,
            kind: EnvelopeKind::Signal(signal),
        }
    }

    pub fn message(sender: ActorId, target: ActorId, name: &'static str, payload: Payload) -> Self {
        Envelope {
            sender,
            target,
            kind: EnvelopeKind::Message { name, payload },
        }
    }
}

/// A declared message slot in an actor's handler table: the name clients
/// must send under, and the concrete payload type it expects. This is
/// the static analogue of the source's inspected parameter list — since
/// each message name maps 1:1 to one Rust type, "too many args / missing
/// kwarg / wrong type" collapses to "wrong payload type for this name".
#[derive(Debug, Clone, Copy)]
pub struct MessageSlot {
    pub name: &'static str,
    pub type_id: TypeId,
}

impl MessageSlot {
    pub fn of<M: Message + 'static>(name: &'static str) -> Self {
        MessageSlot {
            name,
            type_id: TypeId::of::<M>(),
        }
    }
}
