//! Detach phase: remove instances from their autoscaling groups without
//! lowering desired capacity, so replacements are launched.

use std::collections::BTreeMap;

use tracing::{info, warn};

use super::{Phase, PhaseContext, PhaseResult};
use crate::error::Result;
use crate::tagger;
use crate::tags::AUTOSCALING_GROUP_TAG;
use crate::types::Instance;

pub(super) async fn run(ctx: &PhaseContext<'_>, batch: Vec<Instance>) -> Result<PhaseResult> {
    let (groups, ungrouped) = group_by_autoscaling_group(batch);

    // Nothing to detach from; send these straight to drain so they are not
    // stranded at this phase.
    if !ungrouped.is_empty() {
        warn!(
            instance_ids = ?ids(&ungrouped),
            group_tag = AUTOSCALING_GROUP_TAG,
            "Instances have no autoscaling group tag, tagging them for drain directly"
        );
        tagger::tag_for_phase(ctx.compute, ctx.control_tag, Some(Phase::Drain), &ungrouped).await?;
    }

    let mut completed = Vec::new();
    for (group, members) in groups {
        let instance_ids = ids(&members);

        info!(
            autoscaling_group = %group,
            instance_ids = ?instance_ids,
            should_decrement_desired_capacity = false,
            api_action = "DetachInstances",
            "Detaching instances from autoscaling group"
        );

        ctx.autoscaling
            .detach_instances(&group, &instance_ids, false)
            .await
            .inspect_err(|_| {
                if !ungrouped.is_empty() {
                    warn!(
                        autoscaling_group = %group,
                        diverted = ungrouped.len(),
                        instance_ids = ?ids(&ungrouped),
                        "Detach failed after group-less instances were already tagged for drain"
                    );
                }
            })?;

        info!(
            autoscaling_group = %group,
            detached = instance_ids.len(),
            "Successfully detached instances from autoscaling group"
        );

        completed.extend(members);
    }

    Ok(PhaseResult {
        completed,
        diverted: ungrouped.len(),
    })
}

/// Splits the batch into per-group members (ordered by group name) and
/// instances without group membership. Batch order is kept inside each group.
fn group_by_autoscaling_group(batch: Vec<Instance>) -> (BTreeMap<String, Vec<Instance>>, Vec<Instance>) {
    let mut groups: BTreeMap<String, Vec<Instance>> = BTreeMap::new();
    let mut ungrouped = Vec::new();

    for instance in batch {
        match instance.autoscaling_group().map(str::to_string) {
            Some(group) => groups.entry(group).or_default().push(instance),
            None => ungrouped.push(instance),
        }
    }

    (groups, ungrouped)
}

fn ids(instances: &[Instance]) -> Vec<String> {
    instances.iter().map(|i| i.instance_id.clone()).collect()
}
