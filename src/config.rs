use std::time::Duration;

use clap::Parser;

use crate::error::{CyklistError, Result};
use crate::phases::Phase;

/// Default tag key enabling lifecycle processing on an instance.
pub const DEFAULT_ENABLE_TAG: &str = "cyklist.jslee.io/enable";

/// Default tag key holding the current lifecycle phase.
pub const DEFAULT_CONTROL_TAG: &str = "cyklist.jslee.io/phase";

/// Upper bound for `--drain-timeout-seconds`.
pub const MAX_DRAIN_TIMEOUT_SECONDS: u64 = 24 * 60 * 60;

/// Value the enable tag must carry for an instance to be eligible.
pub const ENABLED_VALUE: &str = "yes";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cyklistctl",
    version,
    about = "Detach, drain and terminate EC2 autoscaling group instances one phase per run"
)]
pub struct Config {
    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS EC2 instance tag name to enable/disable node lifecycle processing
    #[arg(long, env = "ENABLE_TAG", default_value = DEFAULT_ENABLE_TAG)]
    pub enable_tag: String,

    /// AWS EC2 instance tag name to use for phase control
    #[arg(long, env = "CONTROL_TAG", default_value = DEFAULT_CONTROL_TAG)]
    pub control_tag: String,

    /// Lifecycle phase to perform: detach, drain or terminate
    #[arg(long, env = "PHASE")]
    pub phase: String,

    /// Limit number of suitably-tagged instances to operate upon
    #[arg(long, env = "MAX_INSTANCES", default_value = "1", allow_negative_numbers = true)]
    pub max_instances: i64,

    /// Path to the kubectl executable used by the drain phase
    #[arg(long, env = "KUBECTL_PATH", default_value = "kubectl")]
    pub kubectl_path: String,

    /// Drain timeout per node in seconds (1 to 86400)
    #[arg(long, env = "DRAIN_TIMEOUT_SECONDS", default_value = "3600")]
    pub drain_timeout_seconds: u64,

    /// Skip instances already running this AMI ID
    #[arg(long, env = "EXCLUDE_IMAGE_ID")]
    pub exclude_image_id: Option<String>,

    /// Only consider instances launched at least this many seconds ago
    #[arg(long, env = "MIN_AGE_SECONDS")]
    pub min_age_seconds: Option<u64>,

    /// Just list which instances would be affected
    #[arg(long, env = "LIST_ONLY", default_value = "false")]
    pub list_only: bool,

    /// Log format: json or pretty
    #[arg(long, env = "LOG_FORMAT", default_value = "json")]
    pub log_format: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parses the requested phase and rejects unusable values.
    pub fn validate(&self) -> Result<Phase> {
        let phase = self.phase.parse::<Phase>()?;

        if self.enable_tag.is_empty() || self.control_tag.is_empty() {
            return Err(CyklistError::InvalidConfig(
                "--enable-tag and --control-tag must not be empty".to_string(),
            ));
        }

        if self.enable_tag == self.control_tag {
            return Err(CyklistError::InvalidConfig(format!(
                "--enable-tag and --control-tag must differ, both are '{}'",
                self.enable_tag
            )));
        }

        if self.drain_timeout_seconds == 0 {
            return Err(CyklistError::InvalidConfig(
                "--drain-timeout-seconds must be greater than zero".to_string(),
            ));
        }

        if self.drain_timeout_seconds > MAX_DRAIN_TIMEOUT_SECONDS {
            return Err(CyklistError::InvalidConfig(format!(
                "--drain-timeout-seconds must be at most {} (one day), got {}",
                MAX_DRAIN_TIMEOUT_SECONDS, self.drain_timeout_seconds
            )));
        }

        Ok(phase)
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }

    pub fn min_age(&self) -> Option<Duration> {
        self.min_age_seconds.map(Duration::from_secs)
    }

    pub fn display(&self, actual_region: &str) {
        let region_info = match &self.region {
            Some(region) => region.clone(),
            None => format!("auto-detect ({})", actual_region),
        };

        tracing::info!(
            region = %region_info,
            phase = %self.phase,
            max_instances = self.max_instances,
            enable_tag = %self.enable_tag,
            control_tag = %self.control_tag,
            kubectl_path = %self.kubectl_path,
            drain_timeout_seconds = self.drain_timeout_seconds,
            exclude_image_id = ?self.exclude_image_id,
            min_age_seconds = ?self.min_age_seconds,
            list_only = self.list_only,
            log_format = %self.log_format,
            log_level = %self.log_level,
            "Configuration initialized"
        );

        if self.list_only {
            tracing::warn!("LIST ONLY MODE ENABLED - No instances will be detached, drained, terminated or tagged");
        }

        if self.max_instances <= 0 {
            tracing::warn!(
                max_instances = self.max_instances,
                "max-instances is not positive, no instances will be selected"
            );
        }
    }
}
