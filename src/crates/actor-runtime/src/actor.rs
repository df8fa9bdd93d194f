//! The [`Actor`] trait and its ephemeral [`ActorContext`].

use crate::error::Result;
use crate::id::ActorId;
use crate::message::{Message, MessageSlot, Payload, Signal};
use crate::system::SystemHandle;

/// Lifecycle state of an actor, per the FSM in the design.
///
/// ```text
/// NOT_STARTED --START--> STARTING --(on_start ok)--> RUNNING
/// RUNNING     --STOP---> STOPPING --(on_stop ok)---> STOPPED
/// RUNNING     --error--> ERROR    --STOP----------> FAILED
/// STARTING    --error--> FAILED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    NotStarted,
    Starting,
    Running,
    Stopping,
    Stopped,
    Error,
    Failed,
}

impl ActorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ActorState::Stopped | ActorState::Failed)
    }
}

/// The ephemeral, per-dispatch context handed to an actor's handlers.
///
/// Valid only for the duration of the call that produced it: actors must
/// not retain a reference past the handler that received it.
pub struct ActorContext<'a> {
    pub id: ActorId,
    pub parent: ActorId,
    pub sender: Option<ActorId>,
    system: &'a SystemHandle,
}

impl<'a> ActorContext<'a> {
    pub(crate) fn new(
        id: ActorId,
        parent: ActorId,
        sender: Option<ActorId>,
        system: &'a SystemHandle,
    ) -> Self {
        ActorContext {
            id,
            parent,
            sender,
            system,
        }
    }

    /// Spawn a child actor under the current actor.
    pub fn spawn<A: Actor + 'static>(&self, actor: A) -> ActorId {
        self.system.spawn(self.id.clone(), Box::new(actor))
    }

    /// Send a message to an arbitrary target.
    pub fn send<M: Message + 'static>(&self, target: ActorId, name: &'static str, msg: M) {
        self.system.send(self.id.clone(), target, name, Box::new(msg));
    }

    /// Send a message to this actor's direct parent.
    pub fn send_parent<M: Message + 'static>(&self, name: &'static str, msg: M) {
        self.system
            .send(self.id.clone(), self.parent.clone(), name, Box::new(msg));
    }

    /// Reply to whoever sent the message currently being handled.
    ///
    /// A no-op if there is no sender on record (e.g. during a signal with
    /// no originating actor).
    pub fn reply<M: Message + 'static>(&self, name: &'static str, msg: M) {
        if let Some(sender) = self.sender.clone() {
            self.system.send(self.id.clone(), sender, name, Box::new(msg));
        }
    }

    /// Request that `target` (or, if `None`, the current actor) be stopped.
    pub fn stop(&self, target: Option<ActorId>) {
        let target = target.unwrap_or_else(|| self.id.clone());
        self.system.stop(self.id.clone(), target);
    }
}

/// An entity that receives messages and lifecycle signals in order and
/// moves through the FSM in [`ActorState`].
///
/// Object-safe so the supervision tree can store heterogeneous actors
/// behind `Box<dyn Actor>`; individual message payloads stay statically
/// typed at the call site (see [`ActorContext::send`]) and are only
/// type-erased to cross the tree boundary.
pub trait Actor: Send {
    /// Lowercase class name used to build this actor's id segment.
    fn class_name(&self) -> &'static str;

    /// The set of message names this actor accepts and the payload type
    /// each expects. Used by `send` to reject unknown names and mismatched
    /// payload types before they are ever enqueued.
    fn message_table(&self) -> Vec<MessageSlot> {
        Vec::new()
    }

    fn on_start(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    fn on_stop(&mut self, _ctx: &mut ActorContext) -> Result<()> {
        Ok(())
    }

    /// Handle a non-lifecycle signal. Return `Ok(true)` to indicate the
    /// signal was handled (stopping propagation up the supervision tree,
    /// relevant for `FAILED`); `Ok(false)` (the default) lets it escalate.
    fn on_signal(&mut self, _ctx: &mut ActorContext, _signal: &Signal) -> Result<bool> {
        Ok(false)
    }

    /// Handle an ordinary message.
    fn handle(&mut self, ctx: &mut ActorContext, name: &str, payload: Payload) -> Result<()>;
}
