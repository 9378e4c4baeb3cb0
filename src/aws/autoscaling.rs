use async_trait::async_trait;
use aws_sdk_autoscaling::Client;
use tracing::info;

use crate::error::{CyklistError, Result};
use crate::provider::AutoscalingApi;
use crate::tags::TagMap;
use crate::types::{AutoscalingGroup, GroupPage};

pub struct AutoscalingClient {
    client: Client,
}

impl AutoscalingClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        info!(
            region = %super::region_name(config),
            "AWS Auto Scaling client initialized successfully"
        );

        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl AutoscalingApi for AutoscalingClient {
    async fn detach_instances(
        &self,
        group_name: &str,
        instance_ids: &[String],
        should_decrement_desired_capacity: bool,
    ) -> Result<()> {
        self.client
            .detach_instances()
            .auto_scaling_group_name(group_name)
            .set_instance_ids(Some(instance_ids.to_vec()))
            .should_decrement_desired_capacity(should_decrement_desired_capacity)
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        Ok(())
    }

    async fn describe_groups_page(&self, next_token: Option<String>) -> Result<GroupPage> {
        let mut request = self.client.describe_auto_scaling_groups();

        if let Some(token) = next_token {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        let groups = response
            .auto_scaling_groups()
            .iter()
            .map(|group| AutoscalingGroup {
                name: group.auto_scaling_group_name().unwrap_or_default().to_string(),
                tags: TagMap::from(group.tags()),
            })
            .collect();

        Ok(GroupPage {
            groups,
            next_token: response.next_token().map(|s| s.to_string()),
        })
    }
}
