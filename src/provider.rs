//! Capabilities the lifecycle needs from the outside world.
//!
//! The AWS implementations live in [`crate::aws`] and the kubectl drainer in
//! [`crate::drain`]. Tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{GroupPage, InstancePage, ProviderFilter};

/// EC2 calls: describe, terminate and tag writes.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    /// Fetch one page of instances. `next_token` is `None` on the first call.
    async fn describe_instances_page(
        &self,
        filters: &[ProviderFilter],
        next_token: Option<String>,
    ) -> Result<InstancePage>;

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()>;

    /// Callers must not pass more than [`crate::tagger::MAX_TAG_RESOURCES`] ids.
    async fn create_tags(&self, resource_ids: &[String], key: &str, value: &str) -> Result<()>;

    async fn delete_tags(&self, resource_ids: &[String], key: &str) -> Result<()>;
}

/// EC2 Auto Scaling calls.
#[async_trait]
pub trait AutoscalingApi: Send + Sync {
    async fn detach_instances(
        &self,
        group_name: &str,
        instance_ids: &[String],
        should_decrement_desired_capacity: bool,
    ) -> Result<()>;

    async fn describe_groups_page(&self, next_token: Option<String>) -> Result<GroupPage>;
}

/// Evicts workloads from a Kubernetes node.
#[async_trait]
pub trait NodeDrainer: Send + Sync {
    async fn drain(&self, node_name: &str) -> Result<()>;
}
