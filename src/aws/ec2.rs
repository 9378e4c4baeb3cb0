use async_trait::async_trait;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::types::{Filter, Tag};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{CyklistError, Result};
use crate::provider::ComputeApi;
use crate::tags::TagMap;
use crate::types::{Instance, InstancePage, ProviderFilter};

pub struct Ec2Client {
    client: Client,
    region: String,
}

impl Ec2Client {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        let region = super::region_name(config);
        info!(region = %region, "AWS EC2 client initialized successfully");

        Self {
            client: Client::new(config),
            region,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Test EC2 API connectivity by making a simple DescribeRegions call
    pub async fn test_connectivity(&self) -> Result<()> {
        let start_time = std::time::Instant::now();

        self.client
            .describe_regions()
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        info!(
            region = %self.region,
            response_time_ms = start_time.elapsed().as_millis(),
            "EC2 API connectivity test successful"
        );

        Ok(())
    }

    fn to_sdk_filter(filter: &ProviderFilter) -> Filter {
        Filter::builder()
            .name(&filter.name)
            .set_values(Some(filter.values.clone()))
            .build()
    }

    fn to_instance(instance: &aws_sdk_ec2::types::Instance) -> Instance {
        let instance_id = instance.instance_id().unwrap_or_default().to_string();
        let launch_time = instance
            .launch_time()
            .and_then(|dt| DateTime::<Utc>::from_timestamp(dt.secs(), dt.subsec_nanos()))
            .unwrap_or_else(|| {
                debug!(instance_id = %instance_id, "Instance has no launch time, sorting it first");
                DateTime::<Utc>::UNIX_EPOCH
            });

        Instance {
            image_id: instance.image_id().unwrap_or_default().to_string(),
            private_dns_name: instance.private_dns_name().unwrap_or_default().to_string(),
            launch_time,
            tags: TagMap::from(instance.tags()),
            instance_id,
        }
    }
}

#[async_trait]
impl ComputeApi for Ec2Client {
    async fn describe_instances_page(
        &self,
        filters: &[ProviderFilter],
        next_token: Option<String>,
    ) -> Result<InstancePage> {
        let mut request = self
            .client
            .describe_instances()
            .set_filters(Some(filters.iter().map(Self::to_sdk_filter).collect()));

        if let Some(token) = next_token {
            request = request.next_token(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        let instances = response
            .reservations()
            .iter()
            .flat_map(|r| r.instances())
            .map(Self::to_instance)
            .collect();

        Ok(InstancePage {
            instances,
            next_token: response.next_token().map(|s| s.to_string()),
        })
    }

    async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        self.client
            .terminate_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        Ok(())
    }

    async fn create_tags(&self, resource_ids: &[String], key: &str, value: &str) -> Result<()> {
        debug!(
            resource_count = resource_ids.len(),
            tag_key = %key,
            tag_value = %value,
            api_action = "CreateTags",
            "Sending tag request to AWS EC2 API"
        );

        self.client
            .create_tags()
            .set_resources(Some(resource_ids.to_vec()))
            .tags(Tag::builder().key(key).value(value).build())
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        Ok(())
    }

    async fn delete_tags(&self, resource_ids: &[String], key: &str) -> Result<()> {
        debug!(
            resource_count = resource_ids.len(),
            tag_key = %key,
            api_action = "DeleteTags",
            "Sending tag removal request to AWS EC2 API"
        );

        // A tag given without a value is deleted whatever its value is
        self.client
            .delete_tags()
            .set_resources(Some(resource_ids.to_vec()))
            .tags(Tag::builder().key(key).build())
            .send()
            .await
            .map_err(|e| CyklistError::aws(module_path!(), e))?;

        Ok(())
    }
}
