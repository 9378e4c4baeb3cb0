//! Node drain through the `kubectl` executable.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{CyklistError, Result};
use crate::provider::NodeDrainer;

/// Extra time given to the kubectl process on top of its own `--timeout`
/// before it is killed.
const PROCESS_GRACE_PERIOD: Duration = Duration::from_secs(60);

/// Runs `kubectl drain` against one node, ignoring DaemonSet pods and
/// deleting emptyDir data.
pub struct KubectlDrainer {
    kubectl_path: String,
    timeout: Duration,
    grace_period: Duration,
}

impl KubectlDrainer {
    pub fn new(kubectl_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            kubectl_path: kubectl_path.into(),
            timeout,
            grace_period: PROCESS_GRACE_PERIOD,
        }
    }

    #[cfg(test)]
    fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Wall-clock limit for the whole kubectl process.
    fn process_deadline(&self) -> Duration {
        self.timeout.saturating_add(self.grace_period)
    }

    fn drain_args(&self, node_name: &str) -> Vec<String> {
        vec![
            "drain".to_string(),
            node_name.to_string(),
            "--ignore-daemonsets".to_string(),
            "--delete-emptydir-data".to_string(),
            "--force".to_string(),
            format!("--timeout={}s", self.timeout.as_secs()),
        ]
    }
}

#[async_trait]
impl NodeDrainer for KubectlDrainer {
    async fn drain(&self, node_name: &str) -> Result<()> {
        let args = self.drain_args(node_name);
        debug!(
            kubectl_path = %self.kubectl_path,
            args = ?args,
            "Running kubectl drain"
        );

        let start_time = std::time::Instant::now();
        let mut command = Command::new(&self.kubectl_path);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.process_deadline(), command.output())
            .await
            .map_err(|_| CyklistError::DrainTimeout {
                node: node_name.to_string(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| CyklistError::Drain {
                node: node_name.to_string(),
                reason: format!("failed to execute '{}': {}", self.kubectl_path, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CyklistError::Drain {
                node: node_name.to_string(),
                reason: format!("kubectl exited with {}: {}", output.status, stderr.trim()),
            });
        }

        info!(
            node = %node_name,
            duration_seconds = format!("{:.1}", start_time.elapsed().as_secs_f64()),
            "Node drained"
        );

        Ok(())
    }
}
