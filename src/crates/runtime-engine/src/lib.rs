//! Programmatic entry point for the execution core: accepts job
//! submissions and drives each one to completion on the actor runtime.

mod engine;
mod error;
mod job_processor;
mod messages;
mod runtime;

pub use engine::{Engine, EngineContext};
pub use error::EngineError;
pub use job_processor::JobProcessor;
pub use messages::{JobFailed, JobSucceeded, SubmitJob};
pub use runtime::Runtime;
