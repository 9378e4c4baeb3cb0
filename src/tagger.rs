//! Phase checkpointing through the control tag.

use tracing::{info, warn};

use crate::error::Result;
use crate::phases::Phase;
use crate::provider::ComputeApi;
use crate::types::Instance;

/// Maximum resource ids accepted by a single EC2 CreateTags/DeleteTags call.
pub const MAX_TAG_RESOURCES: usize = 100;

/// What a tag write did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagOutcome {
    pub tagged: usize,
    /// Instances beyond the per-call limit. They keep their current tag and
    /// are picked up again by a later run.
    pub deferred: usize,
}

/// Moves `instances` to `next`, or takes them out of the lifecycle by
/// deleting the control tag when `next` is `None`.
///
/// Only the first [`MAX_TAG_RESOURCES`] instances are written per call.
pub async fn tag_for_phase<C>(
    compute: &C,
    control_tag: &str,
    next: Option<Phase>,
    instances: &[Instance],
) -> Result<TagOutcome>
where
    C: ComputeApi + ?Sized,
{
    if instances.is_empty() {
        return Ok(TagOutcome::default());
    }

    let tagged = instances.len().min(MAX_TAG_RESOURCES);
    let deferred = instances.len() - tagged;
    let resource_ids: Vec<String> = instances[..tagged]
        .iter()
        .map(|i| i.instance_id.clone())
        .collect();

    if deferred > 0 {
        warn!(
            batch_size = instances.len(),
            tagged = tagged,
            deferred = deferred,
            max_tag_resources = MAX_TAG_RESOURCES,
            "Batch exceeds tag request limit, remaining instances will be retried on a later run"
        );
    }

    match next {
        Some(phase) => {
            compute
                .create_tags(&resource_ids, control_tag, phase.as_str())
                .await?;
            info!(
                control_tag = %control_tag,
                next_phase = %phase,
                tagged = tagged,
                instance_ids = ?resource_ids,
                "Tagged instances for next phase"
            );
        }
        None => {
            compute.delete_tags(&resource_ids, control_tag).await?;
            info!(
                control_tag = %control_tag,
                removed = tagged,
                instance_ids = ?resource_ids,
                "Removed lifecycle control tag, instances left the workflow"
            );
        }
    }

    Ok(TagOutcome { tagged, deferred })
}
