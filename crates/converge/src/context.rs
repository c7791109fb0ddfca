//! Apply context and progress callbacks
//!
//! These let the crate drive resources without depending on a particular
//! process runner or terminal UI.

use crate::command::CommandExecutor;
use crate::types::ApplyResult;
use std::sync::atomic::{AtomicBool, Ordering};

/// Progress callback for execution operations
pub trait ProgressCallback {
    /// Called when starting to apply a batch of resources
    fn on_batch_start(&mut self, label: &str, count: usize);

    /// Called when starting to apply a single resource
    fn on_resource_start(&mut self, id: &str, description: &str);

    /// Called when a resource application completes
    fn on_resource_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _label: &str, _count: usize) {}
    fn on_resource_start(&mut self, _id: &str, _description: &str) {}
    fn on_resource_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Context passed to resource probe and apply operations
pub struct ApplyContext<'a> {
    /// Runner for every external command
    pub exec: &'a dyn CommandExecutor,
    /// Raised when no further resources should be started
    pub interrupt: Option<&'a AtomicBool>,
}

impl<'a> ApplyContext<'a> {
    /// Create a new apply context
    pub fn new(exec: &'a dyn CommandExecutor) -> Self {
        Self {
            exec,
            interrupt: None,
        }
    }

    /// Attach an interrupt flag checked between resources
    pub fn with_interrupt(mut self, flag: &'a AtomicBool) -> Self {
        self.interrupt = Some(flag);
        self
    }

    /// Whether the interrupt flag has been raised
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.is_some_and(|f| f.load(Ordering::SeqCst))
    }
}
