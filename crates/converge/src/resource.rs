//! Resource trait for probe-then-apply state management
//!
//! A Resource represents something that can be in a certain state,
//! and can be changed to reach a desired state.

use crate::context::ApplyContext;
use crate::types::{ApplyResult, ResourceState};
use anyhow::Result;
use std::fmt;

/// Core trait for convergent resources
///
/// Every resource provides:
/// - Identity (id, description, type)
/// - State detection (current vs desired), probed through the context's executor
/// - State convergence (apply)
///
/// # Example
///
/// ```ignore
/// use converge::{ApplyContext, ApplyResult, Invocation, Resource, ResourceState};
///
/// #[derive(Debug)]
/// struct Plugin(String);
///
/// impl Resource for Plugin {
///     fn id(&self) -> String { format!("plugin:{}", self.0) }
///     fn description(&self) -> String { format!("Install plugin {}", self.0) }
///     fn resource_type(&self) -> &'static str { "plugin" }
///
///     fn current_state(&self, ctx: &ApplyContext) -> anyhow::Result<ResourceState> {
///         let probe = Invocation::new(["wp", "plugin", "is-installed", &self.0]);
///         if ctx.exec.run_status(&probe)? {
///             Ok(ResourceState::Present { details: None })
///         } else {
///             Ok(ResourceState::Absent)
///         }
///     }
///
///     fn desired_state(&self) -> ResourceState {
///         ResourceState::Present { details: None }
///     }
///
///     fn apply(&self, ctx: &mut ApplyContext) -> anyhow::Result<ApplyResult> {
///         ctx.exec.run_checked(&Invocation::new(["wp", "plugin", "install", &self.0]))?;
///         Ok(ApplyResult::Created)
///     }
/// }
/// ```
pub trait Resource: fmt::Debug {
    /// Unique identifier for this resource, e.g. "plugin:query-monitor"
    fn id(&self) -> String;

    /// Human-readable description of what this resource does
    fn description(&self) -> String;

    /// Resource type category, e.g. "plugin", "theme", "constant"
    fn resource_type(&self) -> &'static str;

    /// Detect the current state of this resource
    ///
    /// Resources that cannot be probed cheaply return `Unknown` and rely on
    /// an idempotent apply.
    fn current_state(&self, ctx: &ApplyContext) -> Result<ResourceState>;

    /// Get the desired state for this resource
    fn desired_state(&self) -> ResourceState;

    /// Check if the resource needs changes to reach desired state
    fn needs_apply(&self, ctx: &ApplyContext) -> Result<bool> {
        let current = self.current_state(ctx)?;
        let desired = self.desired_state();
        Ok(current != desired)
    }

    /// Apply changes to reach the desired state
    ///
    /// This method should:
    /// 1. Check if already in desired state (return NoChange)
    /// 2. Make the necessary changes
    /// 3. Return the appropriate ApplyResult
    fn apply(&self, ctx: &mut ApplyContext) -> Result<ApplyResult>;
}

/// A boxed resource for type-erased storage
pub type BoxedResource = Box<dyn Resource>;
