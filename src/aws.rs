//! AWS SDK configuration and provider implementations.

pub mod autoscaling;
pub mod ec2;

pub use autoscaling::AutoscalingClient;
pub use ec2::Ec2Client;

use aws_config::BehaviorVersion;
use aws_config::retry::RetryConfig;
use tracing::{debug, info};

/// Attempts per AWS call, including the first one. Tag writes and detach
/// calls are throttled hard when many instances cycle at once.
pub const MAX_ATTEMPTS: u32 = 20;

/// Loads AWS SDK configuration with an optional explicit region.
///
/// Region resolution priority:
/// 1. Explicit region from Config (--region CLI arg or AWS_REGION env var)
/// 2. AWS SDK defaults (environment variables, ~/.aws/config, IMDS)
pub async fn load_sdk_config(region: Option<&str>) -> aws_config::SdkConfig {
    let loader = aws_config::defaults(BehaviorVersion::latest())
        .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS));

    match region {
        Some(r) => {
            info!(region = %r, "Using explicit AWS region from configuration");
            loader
                .region(aws_config::Region::new(r.to_string()))
                .load()
                .await
        }
        None => {
            debug!("Using default AWS region from AWS SDK (environment/credentials file/IMDS)");
            loader.load().await
        }
    }
}

pub fn region_name(config: &aws_config::SdkConfig) -> String {
    config
        .region()
        .map(|r| r.as_ref())
        .unwrap_or("unknown")
        .to_string()
}
