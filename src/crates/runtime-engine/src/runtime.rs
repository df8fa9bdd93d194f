//! The outermost façade: owns the actor system, installs logging once,
//! and exposes a synchronous submit/wait/stop surface to a host process.

use crate::engine::Engine;
use crate::messages::SubmitJob;
use actor_runtime::{ActorId, ActorSystem};
use graph_builder::{Repositories, StorageManager};
use graph_model::{JobConfig, RuntimeConfig};
use std::sync::Arc;

/// Programmatic entry point. Parsing `sys_config_path`/job config files
/// into [`RuntimeConfig`]/[`JobConfig`] is left to the caller (config
/// file loading is out of scope here); `Runtime` takes the already
/// parsed values directly.
pub struct Runtime {
    config: RuntimeConfig,
    repositories: Arc<dyn Repositories>,
    storage: Arc<dyn StorageManager>,
    system: Option<ActorSystem>,
    engine_id: Option<ActorId>,
}

impl Runtime {
    pub fn new(config: RuntimeConfig, repositories: Arc<dyn Repositories>, storage: Arc<dyn StorageManager>) -> Self {
        // Installed once, process-wide; a second call (e.g. from a test
        // harness that builds more than one Runtime) is ignored rather
        // than panicking.
        let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(rust_log).try_init();

        Runtime {
            config,
            repositories,
            storage,
            system: None,
            engine_id: None,
        }
    }

    /// Start the engine actor and its dispatch thread.
    pub fn start(&mut self) {
        let mut system = ActorSystem::new();
        let engine = Engine::new(self.repositories.clone(), self.storage.clone(), self.config.batch_mode);
        let engine_id = system.start(engine);
        self.system = Some(system);
        self.engine_id = Some(engine_id);
        tracing::info!(batch_mode = self.config.batch_mode, "runtime started");
    }

    /// Submit a job for execution, returning the id it was assigned.
    ///
    /// Assigning the id here, rather than waiting for a reply from the
    /// engine actor, is what lets this stay a synchronous call: the
    /// actor tree's messaging is one-way, so there is no reply channel
    /// to block on without adding one solely for this purpose.
    pub fn submit_job(&mut self, mut job_config: JobConfig) -> String {
        if job_config.job_id.is_empty() {
            job_config.job_id = uuid::Uuid::new_v4().to_string();
        }
        let job_id = job_config.job_id.clone();
        let job_config = Arc::new(job_config);

        let system = self.system.as_ref().expect("start() must be called before submit_job()");
        let engine_id = self.engine_id.clone().expect("start() must be called before submit_job()");
        system.send(engine_id, "submit_job", SubmitJob { job_config });
        job_id
    }

    /// Block until the engine tree has shut down, returning the process
    /// exit code: `0` for a clean shutdown, non-zero if a root failure
    /// propagated all the way up.
    pub fn wait_for_shutdown(mut self) -> i32 {
        let system = self.system.take().expect("start() must be called before wait_for_shutdown()");
        let (code, err) = system.wait_for_shutdown();
        if let Some(err) = &err {
            tracing::error!(%err, "runtime shut down with a root failure");
        }
        code
    }

    /// Async equivalent of [`Self::wait_for_shutdown`], for a host that is
    /// itself running on a tokio executor and cannot block its own thread.
    /// The actor tree's dispatch loop is synchronous regardless; this just
    /// moves the blocking wait onto a dedicated thread via `spawn_blocking`.
    pub async fn wait_for_shutdown_async(self) -> i32 {
        tokio::task::spawn_blocking(move || self.wait_for_shutdown())
            .await
            .expect("wait_for_shutdown task panicked")
    }

    /// Request a clean shutdown from outside the tree.
    pub fn stop(&self) {
        if let (Some(system), Some(engine_id)) = (&self.system, &self.engine_id) {
            system.stop(engine_id.clone());
        }
    }
}
