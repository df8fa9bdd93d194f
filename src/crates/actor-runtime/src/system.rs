//! The [`ActorSystem`]: a supervision tree plus a single FIFO dispatch
//! queue, serviced by one OS thread.
//!
//! Every mutation of the tree happens on that one thread. Actor code
//! reaches back into the system only through [`crate::ActorContext`],
//! whose `spawn`/`send`/`stop` calls enqueue work rather than touching the
//! tree directly, so there is never more than one actor's handler running
//! at a time.

use crate::actor::{Actor, ActorContext, ActorState};
use crate::error::{ActorError, BadMessageReason};
use crate::id::{ActorId, EXTERNAL_SENDER, SYSTEM_SENDER};
use crate::message::{Envelope, EnvelopeKind, Message, MessageSlot, Payload, Signal, SIGNAL_PREFIX};
use parking_lot::{Condvar, Mutex};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// How long the dispatch loop parks between empty-queue checks.
///
/// Kept short so a pending shutdown is noticed quickly without spinning.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

struct ActorNode {
    parent_id: ActorId,
    actor: Option<Box<dyn Actor>>,
    /// Captured once at spawn time, independent of whether `actor` is
    /// currently taken for a handler call — an actor sending to itself
    /// mid-handler must still validate against its own handler table.
    message_table: Vec<MessageSlot>,
    children: HashSet<ActorId>,
    next_child_seq: u64,
    state: ActorState,
    last_error: Option<ActorError>,
}

struct Inner {
    tree: Mutex<HashMap<ActorId, ActorNode>>,
    queue: Mutex<VecDeque<Envelope>>,
    queue_cv: Condvar,
    stopping: AtomicBool,
    exit_code: AtomicI32,
    system_error: Mutex<Option<ActorError>>,
}

/// A cheaply-cloneable handle onto the shared runtime state.
///
/// Every [`ActorContext`] carries a reference to one of these so actor
/// handlers can enqueue work without ever seeing the tree or queue
/// directly.
#[derive(Clone)]
pub(crate) struct SystemHandle(Arc<Inner>);

impl SystemHandle {
    fn enqueue(&self, env: Envelope) {
        let mut queue = self.0.queue.lock();
        queue.push_back(env);
        self.0.queue_cv.notify_one();
    }

    /// Emit a signal directly, bypassing the message handler table — only
    /// the runtime itself produces signals, so there is nothing to validate.
    fn emit_signal(&self, sender: ActorId, target: ActorId, signal: Signal) {
        if target.is_root() {
            return;
        }
        self.enqueue(Envelope::signal(sender, target, signal));
    }

    pub(crate) fn spawn(&self, parent: ActorId, actor: Box<dyn Actor>) -> ActorId {
        let class_name = actor.class_name();
        let message_table = actor.message_table();
        let mut tree = self.0.tree.lock();
        let id = if parent.is_root() {
            parent.child_id(class_name, 0)
        } else {
            let node = tree
                .get_mut(&parent)
                .expect("spawn requested from a parent actor that is not in the tree");
            let seq = node.next_child_seq;
            node.next_child_seq += 1;
            let id = parent.child_id(class_name, seq);
            node.children.insert(id.clone());
            id
        };
        tree.insert(
            id.clone(),
            ActorNode {
                parent_id: parent.clone(),
                actor: Some(actor),
                message_table,
                children: HashSet::new(),
                next_child_seq: 0,
                state: ActorState::NotStarted,
                last_error: None,
            },
        );
        drop(tree);
        tracing::debug!(actor = %id, parent = %parent, "actor spawned");
        self.enqueue(Envelope::signal(parent, id.clone(), Signal::Start));
        id
    }

    /// Validate `name`/`payload` against the target's handler table and
    /// enqueue the message if it passes; otherwise log and drop it.
    pub(crate) fn send(&self, sender: ActorId, target: ActorId, name: &'static str, payload: Payload) {
        if name.starts_with(SIGNAL_PREFIX) {
            tracing::warn!(actor = %target, message = name, "dropping message sent under the reserved signal prefix");
            return;
        }
        let outcome = {
            let tree = self.0.tree.lock();
            match tree.get(&target) {
                None => Err(None),
                // Validated against the table captured at spawn time, not
                // `node.actor` directly: a handler sending to itself (or to
                // another actor that happens to be mid-dispatch) must not
                // be rejected just because the actor is temporarily taken
                // out of the tree for its own call (see `with_actor`).
                Some(node) => {
                    let slot = node.message_table.iter().find(|s| s.name == name);
                    match slot {
                        None => Err(Some(BadMessageReason::UnknownHandler)),
                        Some(slot) if slot.type_id != payload.type_id_of() => {
                            Err(Some(BadMessageReason::WrongPayloadType))
                        }
                        Some(_) => Ok(()),
                    }
                }
            }
        };
        match outcome {
            Ok(()) => self.enqueue(Envelope::message(sender, target, name, payload)),
            Err(None) => {
                tracing::warn!(actor = %target, message = name, "dropping message to unknown or busy actor");
            }
            Err(Some(reason)) => {
                tracing::warn!(actor = %target, message = name, %reason, "dropping invalid message");
            }
        }
    }

    /// `STOP` is only honored from the target itself, its direct parent,
    /// or the `/system` sentinel.
    pub(crate) fn stop(&self, sender: ActorId, target: ActorId) {
        let permitted = sender == target
            || sender.as_str() == SYSTEM_SENDER
            || {
                let tree = self.0.tree.lock();
                tree.get(&target).map(|n| n.parent_id == sender).unwrap_or(false)
            };
        if !permitted {
            tracing::warn!(actor = %target, sender = %sender, "stop rejected: sender is not the target, its parent, or /system");
            return;
        }
        self.emit_signal(sender, target, Signal::Stop);
    }

    /// Drop a terminal actor's entry from the tree entirely and unlink it
    /// from its parent's children set, so a long-running system doesn't
    /// accumulate every actor it has ever spawned. Only called once an
    /// actor's own terminal signal has been fully handled and nothing will
    /// read its node data again.
    fn retire(&self, target: &ActorId) {
        let mut tree = self.0.tree.lock();
        if let Some(node) = tree.remove(target) {
            if let Some(parent_node) = tree.get_mut(&node.parent_id) {
                parent_node.children.remove(target);
            }
        }
    }

    /// Remove the actor's behavior from the tree, run `f` against it with
    /// the tree unlocked (so `f` can itself call back into `spawn`/`send`),
    /// then restore it.
    fn with_actor<R>(&self, target: &ActorId, f: impl FnOnce(&mut Box<dyn Actor>, ActorId) -> R) -> Option<R> {
        let (mut actor, parent) = {
            let mut tree = self.0.tree.lock();
            let node = tree.get_mut(target)?;
            (node.actor.take(), node.parent_id.clone())
        };
        let result = actor.as_mut().map(|a| f(a, parent));
        {
            let mut tree = self.0.tree.lock();
            if let Some(node) = tree.get_mut(target) {
                node.actor = actor;
            }
        }
        result
    }

    fn do_start(&self, target: ActorId) {
        let can_start = {
            let mut tree = self.0.tree.lock();
            match tree.get_mut(&target) {
                Some(node) if node.state == ActorState::NotStarted => {
                    node.state = ActorState::Starting;
                    true
                }
                Some(_) => false,
                None => {
                    tracing::warn!(actor = %target, "start signal for unknown actor");
                    return;
                }
            }
        };
        if !can_start {
            return;
        }
        let outcome = self.with_actor(&target, |actor, parent| {
            let mut ctx = ActorContext::new(target.clone(), parent, None, self);
            actor.on_start(&mut ctx)
        });
        match outcome {
            Some(Ok(())) => {
                let parent = {
                    let mut tree = self.0.tree.lock();
                    let node = tree.get_mut(&target).expect("actor present after on_start");
                    node.state = ActorState::Running;
                    node.parent_id.clone()
                };
                tracing::info!(actor = %target, "actor started");
                self.emit_signal(target, parent, Signal::Started);
            }
            Some(Err(err)) => self.fail(target, err),
            None => {}
        }
    }

    fn do_stop(&self, target: ActorId) {
        let (can_stop, children) = {
            let mut tree = self.0.tree.lock();
            match tree.get_mut(&target) {
                Some(node)
                    if matches!(
                        node.state,
                        ActorState::Running | ActorState::Starting | ActorState::Error
                    ) =>
                {
                    node.state = ActorState::Stopping;
                    (true, node.children.clone())
                }
                Some(node) if node.state.is_terminal() => {
                    tracing::warn!(actor = %target, "stop requested for already-terminal actor, ignoring");
                    (false, HashSet::new())
                }
                Some(_) => (false, HashSet::new()),
                None => {
                    tracing::warn!(actor = %target, "stop signal for unknown actor");
                    return;
                }
            }
        };
        if !can_stop {
            return;
        }
        for child in children {
            self.emit_signal(target.clone(), child, Signal::Stop);
        }
        let outcome = self.with_actor(&target, |actor, parent| {
            let mut ctx = ActorContext::new(target.clone(), parent, None, self);
            actor.on_stop(&mut ctx)
        });
        match outcome {
            Some(Ok(())) => {
                let parent = {
                    let mut tree = self.0.tree.lock();
                    let node = tree.get_mut(&target).expect("actor present after on_stop");
                    node.state = ActorState::Stopped;
                    node.parent_id.clone()
                };
                tracing::info!(actor = %target, "actor stopped");
                let is_top_level = parent.is_root();
                self.emit_signal(target.clone(), parent, Signal::Stopped);
                if is_top_level {
                    // The sole top-level actor stopping ends the system.
                    self.request_shutdown();
                }
                self.retire(&target);
            }
            Some(Err(err)) => self.fail(target, err),
            None => {}
        }
    }

    /// A non-lifecycle signal (`STARTED`/`STOPPED`) delivered to a parent
    /// for informational purposes; handled through the same `on_signal`
    /// hook as `FAILED`, but failing to handle it is not itself fatal.
    fn notify_signal(&self, sender: ActorId, target: ActorId, signal: Signal) {
        if target.is_root() {
            return;
        }
        let outcome = self.with_actor(&target, |actor, parent| {
            let mut ctx = ActorContext::new(target.clone(), parent, Some(sender), self);
            actor.on_signal(&mut ctx, &signal)
        });
        if let Some(Err(err)) = outcome {
            self.fail(target, err);
        }
    }

    fn do_failed(&self, child: ActorId, parent: ActorId) {
        if parent.is_root() {
            let err = self.take_last_error(&child);
            self.record_system_failure(err);
            self.request_shutdown();
            self.retire(&child);
            return;
        }
        let outcome = self.with_actor(&parent, |actor, grandparent| {
            let mut ctx = ActorContext::new(parent.clone(), grandparent, Some(child.clone()), self);
            actor.on_signal(&mut ctx, &Signal::Failed)
        });
        if matches!(outcome, Some(Ok(true))) {
            tracing::info!(actor = %parent, child = %child, "child failure handled");
            self.retire(&child);
            return;
        }
        let wrapped = match outcome {
            Some(Err(handler_err)) => handler_err,
            _ => ActorError::Propagated {
                child: child.to_string(),
                source: Arc::new(self.take_last_error(&child)),
            },
        };
        self.retire(&child);
        self.fail(parent, wrapped);
    }

    fn take_last_error(&self, actor: &ActorId) -> ActorError {
        let tree = self.0.tree.lock();
        tree.get(actor)
            .and_then(|n| n.last_error.clone())
            .unwrap_or_else(|| ActorError::Lifecycle(format!("{actor} failed with no recorded error")))
    }

    fn fail(&self, target: ActorId, err: ActorError) {
        let parent = {
            let mut tree = self.0.tree.lock();
            match tree.get_mut(&target) {
                Some(node) => {
                    node.state = ActorState::Failed;
                    node.last_error = Some(err.clone());
                    node.parent_id.clone()
                }
                None => {
                    tracing::error!(actor = %target, error = %err, "failure reported for unknown actor");
                    return;
                }
            }
        };
        tracing::error!(actor = %target, error = %err, "actor failed");
        let is_top_level = parent.is_root();
        self.emit_signal(target.clone(), parent, Signal::Failed);
        if is_top_level {
            self.record_system_failure(err);
            self.request_shutdown();
            // No grandparent will ever dispatch a FAILED signal for this
            // actor (emit_signal just dropped it), so nothing downstream
            // will read its node again via take_last_error/do_failed.
            self.retire(&target);
        }
    }

    fn record_system_failure(&self, err: ActorError) {
        let mut guard = self.0.system_error.lock();
        if guard.is_none() {
            *guard = Some(err);
        }
        self.0.exit_code.store(1, Ordering::SeqCst);
    }

    fn request_shutdown(&self) {
        self.0.stopping.store(true, Ordering::SeqCst);
        self.0.queue_cv.notify_all();
    }

    fn dispatch(&self, env: Envelope) {
        let Envelope { sender, target, kind } = env;
        match kind {
            EnvelopeKind::Signal(Signal::Start) => self.do_start(target),
            EnvelopeKind::Signal(Signal::Stop) => self.do_stop(target),
            EnvelopeKind::Signal(Signal::Failed) => self.do_failed(sender, target),
            EnvelopeKind::Signal(sig @ (Signal::Started | Signal::Stopped)) => {
                self.notify_signal(sender, target, sig)
            }
            EnvelopeKind::Message { name, payload } => self.dispatch_message(sender, target, name, payload),
        }
    }

    fn dispatch_message(&self, sender: ActorId, target: ActorId, name: &'static str, payload: Payload) {
        let runnable = {
            let tree = self.0.tree.lock();
            match tree.get(&target) {
                Some(node) => node.state == ActorState::Running,
                None => {
                    tracing::warn!(actor = %target, message = name, "message for unknown actor");
                    return;
                }
            }
        };
        if !runnable {
            tracing::warn!(actor = %target, message = name, "message dropped, actor not running");
            return;
        }
        let outcome = self.with_actor(&target, |actor, parent| {
            let mut ctx = ActorContext::new(target.clone(), parent, Some(sender), self);
            actor.handle(&mut ctx, name, payload)
        });
        if let Some(Err(err)) = outcome {
            self.fail(target, err);
        }
    }

    fn run(&self) {
        loop {
            let env = {
                let mut queue = self.0.queue.lock();
                loop {
                    if let Some(env) = queue.pop_front() {
                        break Some(env);
                    }
                    if self.0.stopping.load(Ordering::SeqCst) {
                        break None;
                    }
                    self.0.queue_cv.wait_for(&mut queue, POLL_INTERVAL);
                }
            };
            match env {
                Some(env) => self.dispatch(env),
                None => break,
            }
        }
        tracing::info!("actor runtime dispatch loop stopped");
    }
}

/// The supervision tree plus its single dispatch thread.
///
/// A system owns exactly one top-level actor, spawned by [`ActorSystem::start`]
/// as the sole direct child of the implicit root. All failures that climb
/// past that actor are treated as root failures.
pub struct ActorSystem {
    handle: SystemHandle,
    thread: Option<JoinHandle<()>>,
}

impl ActorSystem {
    pub fn new() -> Self {
        let inner = Inner {
            tree: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            stopping: AtomicBool::new(false),
            exit_code: AtomicI32::new(0),
            system_error: Mutex::new(None),
        };
        ActorSystem {
            handle: SystemHandle(Arc::new(inner)),
            thread: None,
        }
    }

    /// Spawn the top-level actor and start the dispatch thread.
    pub fn start<A: Actor + 'static>(&mut self, actor: A) -> ActorId {
        let id = self.handle.spawn(ActorId::root(), Box::new(actor));
        let handle = self.handle.clone();
        self.thread = Some(
            std::thread::Builder::new()
                .name("actor-runtime".to_string())
                .spawn(move || handle.run())
                .expect("failed to start actor runtime dispatch thread"),
        );
        id
    }

    /// Send a message into the tree from outside it.
    pub fn send<M: Message + 'static>(&self, target: ActorId, name: &'static str, msg: M) {
        self.handle
            .send(ActorId::from(EXTERNAL_SENDER), target, name, Box::new(msg));
    }

    /// Request that an actor stop, from outside the tree.
    pub fn stop(&self, target: ActorId) {
        self.handle.stop(ActorId::from(SYSTEM_SENDER), target);
    }

    /// Ask the dispatch loop to exit once its queue drains.
    pub fn shutdown(&self) {
        self.handle.0.stopping.store(true, Ordering::SeqCst);
        self.handle.0.queue_cv.notify_all();
    }

    /// Block until the dispatch thread exits, then report the outcome:
    /// `(0, None)` for an orderly shutdown, or `(1, Some(err))` if an
    /// unhandled failure reached the root.
    pub fn wait_for_shutdown(mut self) -> (i32, Option<ActorError>) {
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        let code = self.handle.0.exit_code.load(Ordering::SeqCst);
        let err = self.handle.0.system_error.lock().clone();
        (code, err)
    }
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorContext;
    use crate::error::Result;
    use std::sync::atomic::AtomicUsize;

    #[derive(Debug)]
    struct Ping;

    struct EchoActor {
        started: Arc<AtomicUsize>,
    }

    impl Actor for EchoActor {
        fn class_name(&self) -> &'static str {
            "echoactor"
        }

        fn message_table(&self) -> Vec<crate::message::MessageSlot> {
            vec![crate::message::MessageSlot::of::<Ping>("ping")]
        }

        fn on_start(&mut self, _ctx: &mut ActorContext) -> Result<()> {
            self.started.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn handle(&mut self, ctx: &mut ActorContext, name: &str, _payload: Payload) -> Result<()> {
            assert_eq!(name, "ping");
            ctx.stop(None);
            Ok(())
        }
    }

    #[test]
    fn actor_starts_handles_and_stops() {
        let started = Arc::new(AtomicUsize::new(0));
        let mut system = ActorSystem::new();
        let id = system.start(EchoActor { started: started.clone() });
        system.send(id, "ping", Ping);
        let (code, err) = system.wait_for_shutdown();
        assert_eq!(code, 0);
        assert!(err.is_none());
        assert_eq!(started.load(Ordering::SeqCst), 1);
    }

    #[derive(Debug)]
    struct Crash;

    struct FlakyChild;

    impl Actor for FlakyChild {
        fn class_name(&self) -> &'static str {
            "flakychild"
        }

        fn message_table(&self) -> Vec<crate::message::MessageSlot> {
            vec![crate::message::MessageSlot::of::<Crash>("crash")]
        }

        fn handle(&mut self, _ctx: &mut ActorContext, _name: &str, _payload: Payload) -> Result<()> {
            Err(ActorError::handler(std::io::Error::new(
                std::io::ErrorKind::Other,
                "boom",
            )))
        }
    }

    struct UnsupervisingParent {
        child: Arc<Mutex<Option<ActorId>>>,
    }

    impl Actor for UnsupervisingParent {
        fn class_name(&self) -> &'static str {
            "unsupervisingparent"
        }

        fn on_start(&mut self, ctx: &mut ActorContext) -> Result<()> {
            let child = ctx.spawn(FlakyChild);
            *self.child.lock() = Some(child);
            Ok(())
        }
        // on_signal default returns Ok(false): does not handle FAILED,
        // so it escalates to the root and the whole system exits non-zero.
    }

    #[test]
    fn unhandled_child_failure_propagates_to_root_and_sets_exit_code() {
        let child_slot = Arc::new(Mutex::new(None));
        let mut system = ActorSystem::new();
        system.start(UnsupervisingParent { child: child_slot.clone() });

        // give the dispatch thread a moment to process the start signal chain
        std::thread::sleep(Duration::from_millis(50));
        let child = child_slot.lock().clone().expect("child spawned");
        system.send(child, "crash", Crash);

        let (code, err) = system.wait_for_shutdown();
        assert_eq!(code, 1);
        assert!(err.is_some());
    }
}
