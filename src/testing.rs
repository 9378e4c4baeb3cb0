//! In-memory provider fakes for unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{CyklistError, Result};
use crate::provider::{AutoscalingApi, ComputeApi, NodeDrainer};
use crate::tags::TagMap;
use crate::types::{AutoscalingGroup, GroupPage, Instance, InstancePage, ProviderFilter};

pub const ENABLE_TAG: &str = "cyklist.jslee.io/enable";
pub const CONTROL_TAG: &str = "cyklist.jslee.io/phase";

/// Instance launched `launch_offset_secs` after a fixed base time.
pub fn instance(id: &str, launch_offset_secs: i64, tags: &[(&str, &str)]) -> Instance {
    let base = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .expect("valid timestamp")
        .with_timezone(&Utc);

    Instance {
        instance_id: id.to_string(),
        image_id: "ami-0123456789".to_string(),
        private_dns_name: format!("ip-{}.ec2.internal", id),
        launch_time: base + TimeDelta::seconds(launch_offset_secs),
        tags: TagMap::from_pairs(tags.iter().copied()),
    }
}

/// Enabled instance at the given phase, optionally in an autoscaling group.
pub fn lifecycle_instance(
    id: &str,
    launch_offset_secs: i64,
    phase: &str,
    group: Option<&str>,
) -> Instance {
    let mut tags = vec![(ENABLE_TAG, "yes"), (CONTROL_TAG, phase)];
    if let Some(group) = group {
        tags.push((crate::tags::AUTOSCALING_GROUP_TAG, group));
    }
    instance(id, launch_offset_secs, &tags)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComputeCall {
    Describe { token: Option<String> },
    Terminate(Vec<String>),
    CreateTags { ids: Vec<String>, key: String, value: String },
    DeleteTags { ids: Vec<String>, key: String },
}

impl ComputeCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Describe { .. })
    }
}

/// EC2 fake holding instance state; tag writes are applied so that a
/// second discovery sees them.
pub struct FakeCompute {
    instances: Mutex<Vec<Instance>>,
    page_size: usize,
    fail_describe_page: Option<usize>,
    fail_terminate: bool,
    fail_tag_writes: bool,
    calls: Mutex<Vec<ComputeCall>>,
}

impl FakeCompute {
    pub fn new(instances: Vec<Instance>) -> Self {
        Self {
            instances: Mutex::new(instances),
            page_size: 2,
            fail_describe_page: None,
            fail_terminate: false,
            fail_tag_writes: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn failing_describe_on_page(mut self, page: usize) -> Self {
        self.fail_describe_page = Some(page);
        self
    }

    pub fn failing_terminate(mut self) -> Self {
        self.fail_terminate = true;
        self
    }

    pub fn failing_tag_writes(mut self) -> Self {
        self.fail_tag_writes = true;
        self
    }

    pub fn calls(&self) -> Vec<ComputeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<ComputeCall> {
        self.calls().into_iter().filter(ComputeCall::is_mutation).collect()
    }

    pub fn tag_of(&self, instance_id: &str, key: &str) -> Option<String> {
        self.instances
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.instance_id == instance_id)
            .and_then(|i| i.tags.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string()))
    }

    fn matches(instance: &Instance, filters: &[ProviderFilter]) -> bool {
        filters.iter().all(|filter| match filter.name.strip_prefix("tag:") {
            Some(key) => filter.values.iter().any(|v| instance.tags.has(key, v)),
            None => true,
        })
    }

    fn update_tags(&self, ids: &[String], update: impl Fn(&TagMap) -> TagMap) {
        let mut instances = self.instances.lock().unwrap();
        for instance in instances.iter_mut() {
            if ids.contains(&instance.instance_id) {
                instance.tags = update(&instance.tags);
            }
        }
    }

    fn record(&self, call: ComputeCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ComputeApi for FakeCompute {
    async fn describe_instances_page(
        &self,
        filters: &[ProviderFilter],
        next_token: Option<String>,
    ) -> Result<InstancePage> {
        self.record(ComputeCall::Describe {
            token: next_token.clone(),
        });

        let page: usize = next_token.as_deref().map_or(0, |t| t.parse().unwrap());
        if self.fail_describe_page == Some(page) {
            return Err(CyklistError::Aws(
                "fake::ec2".to_string(),
                format!("describe failed on page {}", page),
            ));
        }

        let matching: Vec<Instance> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| Self::matches(i, filters))
            .cloned()
            .collect();

        let start = page * self.page_size;
        let end = (start + self.page_size).min(matching.len());
        let next_token = (end < matching.len()).then(|| (page + 1).to_string());

        Ok(InstancePage {
            instances: matching.get(start..end).unwrap_or_default().to_vec(),
            next_token,
        })
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        self.record(ComputeCall::Terminate(instance_ids.to_vec()));
        if self.fail_terminate {
            return Err(CyklistError::Aws(
                "fake::ec2".to_string(),
                "terminate failed".to_string(),
            ));
        }
        Ok(())
    }

    async fn create_tags(&self, resource_ids: &[String], key: &str, value: &str) -> Result<()> {
        self.record(ComputeCall::CreateTags {
            ids: resource_ids.to_vec(),
            key: key.to_string(),
            value: value.to_string(),
        });
        if self.fail_tag_writes {
            return Err(CyklistError::Aws(
                "fake::ec2".to_string(),
                "create tags failed".to_string(),
            ));
        }
        self.update_tags(resource_ids, |tags| {
            TagMap::from_pairs(tags.iter().chain(std::iter::once((key, value))))
        });
        Ok(())
    }

    async fn delete_tags(&self, resource_ids: &[String], key: &str) -> Result<()> {
        self.record(ComputeCall::DeleteTags {
            ids: resource_ids.to_vec(),
            key: key.to_string(),
        });
        if self.fail_tag_writes {
            return Err(CyklistError::Aws(
                "fake::ec2".to_string(),
                "delete tags failed".to_string(),
            ));
        }
        self.update_tags(resource_ids, |tags| {
            TagMap::from_pairs(tags.iter().filter(|(k, _)| *k != key))
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetachCall {
    pub group: String,
    pub ids: Vec<String>,
    pub decrement: bool,
}

#[derive(Default)]
pub struct FakeAutoscaling {
    groups: Vec<Vec<AutoscalingGroup>>,
    failing_groups: HashSet<String>,
    detach_calls: Mutex<Vec<DetachCall>>,
    describe_tokens: Mutex<Vec<Option<String>>>,
}

impl FakeAutoscaling {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each inner vec is served as one page.
    pub fn with_group_pages(mut self, pages: Vec<Vec<AutoscalingGroup>>) -> Self {
        self.groups = pages;
        self
    }

    pub fn failing_group(mut self, group: &str) -> Self {
        self.failing_groups.insert(group.to_string());
        self
    }

    pub fn detach_calls(&self) -> Vec<DetachCall> {
        self.detach_calls.lock().unwrap().clone()
    }

    pub fn describe_tokens(&self) -> Vec<Option<String>> {
        self.describe_tokens.lock().unwrap().clone()
    }
}

#[async_trait]
impl AutoscalingApi for FakeAutoscaling {
    async fn detach_instances(
        &self,
        group_name: &str,
        instance_ids: &[String],
        should_decrement_desired_capacity: bool,
    ) -> Result<()> {
        self.detach_calls.lock().unwrap().push(DetachCall {
            group: group_name.to_string(),
            ids: instance_ids.to_vec(),
            decrement: should_decrement_desired_capacity,
        });
        if self.failing_groups.contains(group_name) {
            return Err(CyklistError::Aws(
                "fake::autoscaling".to_string(),
                format!("detach from {} failed", group_name),
            ));
        }
        Ok(())
    }

    async fn describe_groups_page(&self, next_token: Option<String>) -> Result<GroupPage> {
        self.describe_tokens.lock().unwrap().push(next_token.clone());

        let page: usize = next_token.as_deref().map_or(0, |t| t.parse().unwrap());
        let next_token = (page + 1 < self.groups.len()).then(|| (page + 1).to_string());

        Ok(GroupPage {
            groups: self.groups.get(page).cloned().unwrap_or_default(),
            next_token,
        })
    }
}

#[derive(Default)]
pub struct FakeDrainer {
    failing_nodes: HashSet<String>,
    drained: Mutex<Vec<String>>,
}

impl FakeDrainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_node(mut self, node: &str) -> Self {
        self.failing_nodes.insert(node.to_string());
        self
    }

    pub fn drained(&self) -> Vec<String> {
        self.drained.lock().unwrap().clone()
    }
}

#[async_trait]
impl NodeDrainer for FakeDrainer {
    async fn drain(&self, node_name: &str) -> Result<()> {
        self.drained.lock().unwrap().push(node_name.to_string());
        if self.failing_nodes.contains(node_name) {
            return Err(CyklistError::Drain {
                node: node_name.to_string(),
                reason: "kubectl exited with status 1".to_string(),
            });
        }
        Ok(())
    }
}
