//! Drain phase: evict workloads from each node, one node at a time.

use tracing::{error, info};

use super::PhaseResult;
use crate::error::{CyklistError, Result};
use crate::provider::NodeDrainer;
use crate::types::Instance;

/// Stops at the first node that fails to drain; remaining nodes are not
/// attempted.
pub(super) async fn run(drainer: &dyn NodeDrainer, batch: Vec<Instance>) -> Result<PhaseResult> {
    let total = batch.len();

    for (position, instance) in batch.iter().enumerate() {
        if instance.private_dns_name.is_empty() {
            return Err(CyklistError::MissingNodeName(instance.instance_id.clone()));
        }

        info!(
            instance_id = %instance.instance_id,
            node = %instance.private_dns_name,
            position = position + 1,
            total = total,
            "Draining node"
        );

        if let Err(e) = drainer.drain(&instance.private_dns_name).await {
            error!(
                instance_id = %instance.instance_id,
                node = %instance.private_dns_name,
                error = %e,
                remaining = total - position - 1,
                "Drain failed, aborting phase"
            );
            return Err(e);
        }
    }

    Ok(PhaseResult {
        completed: batch,
        diverted: 0,
    })
}
