//! # Converge
//!
//! Primitives for bringing observed state to desired state without
//! redundant side effects.
//!
//! ## Core Concepts
//!
//! - **CommandExecutor**: the single seam through which external tools run
//! - **Resource**: something with state that can be probed and applied
//! - **ResourceState**: the current or desired state of a resource
//! - **execute**: applies resources in order, continuing past failures and
//!   collecting them into an [`ExecuteSummary`]
//!
//! Resources probe and apply through the [`ApplyContext`]'s executor, so a
//! test can swap in a scripted executor and drive the whole flow without
//! touching the host.

pub mod command;
pub mod context;
pub mod executor;
pub mod resource;
pub mod types;

// Re-export main types at crate root
pub use command::{CommandExecutor, CommandOutput, ExecError, Invocation};
pub use context::{ApplyContext, NoProgress, ProgressCallback};
pub use executor::{execute, execute_simple};
pub use resource::{BoxedResource, Resource};
pub use types::{ApplyResult, ExecuteSummary, Failure, ResourceState};
