//! Lowers job configuration into an execution graph and resolves each
//! node to an executable function.
//!
//! [`builder::GraphBuilder`] turns a [`graph_model::JobConfig`] into a
//! [`graph_model::Graph`]; [`resolver::FunctionResolver`] then turns each
//! node in that graph into a boxed [`graph_model::NodeFunction`] the
//! graph processor can invoke. [`collaborators`] defines the narrow
//! traits a host application implements to supply model loading and
//! storage access.

mod builder;
mod collaborators;
mod error;
mod resolver;

pub use builder::GraphBuilder;
pub use collaborators::{
    DataStorage, FileStat, FileStorage, FileType, ModelContext, ModelEntryPoint, ModelLoader,
    ModelRunError, Repositories, StorageManager,
};
pub use error::{GraphBuildError, ResolveError};
pub use resolver::FunctionResolver;
