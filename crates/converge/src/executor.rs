//! Execution engine - applies resources in order, continuing past failures

use crate::context::{ApplyContext, ProgressCallback};
use crate::resource::Resource;
use crate::types::{ApplyResult, ExecuteSummary};

/// Apply every resource in order
///
/// A failing resource is recorded in the summary and the next one is
/// attempted. Once the context's interrupt flag is raised, the remaining
/// resources are recorded as skipped without being probed.
pub fn execute<P: ProgressCallback>(
    label: &str,
    resources: &[Box<dyn Resource>],
    ctx: &mut ApplyContext,
    progress: &mut P,
) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    if resources.is_empty() {
        return summary;
    }

    progress.on_batch_start(label, resources.len());
    for resource in resources {
        let id = resource.id();
        let result = if ctx.is_interrupted() {
            ApplyResult::Skipped {
                reason: "interrupted".to_string(),
            }
        } else {
            progress.on_resource_start(&id, &resource.description());
            apply_resource(resource.as_ref(), ctx)
        };
        progress.on_resource_complete(&id, &result);
        summary.add_result(&id, &result);
    }
    progress.on_batch_complete();

    summary
}

/// Apply a single resource, folding errors into `ApplyResult::Failed`
fn apply_resource(resource: &dyn Resource, ctx: &mut ApplyContext) -> ApplyResult {
    match resource.needs_apply(ctx) {
        Ok(false) => return ApplyResult::NoChange,
        Ok(true) => {}
        Err(e) => {
            return ApplyResult::Failed {
                error: format!("{e:#}"),
            };
        }
    }

    match resource.apply(ctx) {
        Ok(result) => result,
        Err(e) => ApplyResult::Failed {
            error: format!("{e:#}"),
        },
    }
}

/// Simple execution without progress reporting
pub fn execute_simple(resources: &[Box<dyn Resource>], ctx: &mut ApplyContext) -> ExecuteSummary {
    use crate::context::NoProgress;

    execute("resources", resources, ctx, &mut NoProgress)
}
