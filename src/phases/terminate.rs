//! Terminate phase: one bulk TerminateInstances call for the whole batch.

use tracing::info;

use super::PhaseResult;
use crate::error::Result;
use crate::provider::ComputeApi;
use crate::types::Instance;

pub(super) async fn run(compute: &dyn ComputeApi, batch: Vec<Instance>) -> Result<PhaseResult> {
    let instance_ids: Vec<String> = batch.iter().map(|i| i.instance_id.clone()).collect();

    info!(
        instance_ids = ?instance_ids,
        api_action = "TerminateInstances",
        "Sending terminate request to AWS EC2 API"
    );

    compute.terminate_instances(&instance_ids).await?;

    info!(terminated = instance_ids.len(), "Successfully requested instance termination");

    Ok(PhaseResult {
        completed: batch,
        diverted: 0,
    })
}
