//! One lifecycle invocation: discover, select, act, checkpoint.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::batch::select_batch;
use crate::config::ENABLED_VALUE;
use crate::discovery::{self, InstanceFilter, LIVE_INSTANCE_STATES};
use crate::error::{CyklistError, Result};
use crate::output;
use crate::phases::{self, Phase, PhaseContext};
use crate::provider::{AutoscalingApi, ComputeApi, NodeDrainer};
use crate::tagger;
use crate::types::{Instance, ProviderFilter};

/// Per-run settings, resolved from the CLI configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub phase: Phase,
    pub enable_tag: String,
    pub control_tag: String,
    pub max_instances: i64,
    pub list_only: bool,
    pub exclude_image_id: Option<String>,
    pub min_age: Option<Duration>,
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NothingToDo,
    Listed {
        count: usize,
    },
    Advanced {
        phase: Phase,
        next: Option<Phase>,
        processed: usize,
        tagged: usize,
        deferred: usize,
        diverted: usize,
    },
}

pub struct Lifecycle<'a> {
    compute: &'a dyn ComputeApi,
    autoscaling: &'a dyn AutoscalingApi,
    drainer: &'a dyn NodeDrainer,
    settings: RunSettings,
}

impl<'a> Lifecycle<'a> {
    pub fn new(
        compute: &'a dyn ComputeApi,
        autoscaling: &'a dyn AutoscalingApi,
        drainer: &'a dyn NodeDrainer,
        settings: RunSettings,
    ) -> Self {
        Self {
            compute,
            autoscaling,
            drainer,
            settings,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        let phase = self.settings.phase;
        let batch = self.select().await?;

        if self.settings.list_only {
            output::print_instances(&batch, &self.settings.control_tag);
            info!(
                phase = %phase,
                listed = batch.len(),
                "List only mode, no changes made"
            );
            return Ok(RunOutcome::Listed { count: batch.len() });
        }

        if batch.is_empty() {
            info!(phase = %phase, "No matching instances, nothing to do");
            return Ok(RunOutcome::NothingToDo);
        }

        let ctx = PhaseContext {
            compute: self.compute,
            autoscaling: self.autoscaling,
            drainer: self.drainer,
            control_tag: &self.settings.control_tag,
        };

        let batch_size = batch.len();
        let result = phases::execute(phase, batch, &ctx).await.inspect_err(|e| {
            error!(
                phase = %phase,
                batch_size = batch_size,
                error = %e,
                "Phase failed, no checkpoint written for the batch, it will be retried on the next run"
            );
        })?;

        let next = phase.next();
        let tag_outcome = tagger::tag_for_phase(
            self.compute,
            &self.settings.control_tag,
            next,
            &result.completed,
        )
        .await
        .inspect_err(|e| {
            error!(
                phase = %phase,
                next_phase = next.map_or("none", |p| p.as_str()),
                batch_size = result.completed.len(),
                error = %e,
                "Failed to record phase progress on instances"
            );
        })?;

        info!(
            phase = %phase,
            next_phase = next.map_or("none", |p| p.as_str()),
            processed = result.completed.len(),
            tagged = tag_outcome.tagged,
            deferred = tag_outcome.deferred,
            diverted = result.diverted,
            "Lifecycle phase complete"
        );

        Ok(RunOutcome::Advanced {
            phase,
            next,
            processed: result.completed.len(),
            tagged: tag_outcome.tagged,
            deferred: tag_outcome.deferred,
            diverted: result.diverted,
        })
    }

    /// Discovers eligible instances at the current phase and returns the
    /// oldest `max_instances` of them.
    pub async fn select(&self) -> Result<Vec<Instance>> {
        let settings = &self.settings;
        let start_time = std::time::Instant::now();

        let discovered =
            discovery::filter_instances(self.compute, &self.provider_filters(), &self.client_filters())
                .await
                .inspect_err(|e| {
                    error!(phase = %settings.phase, error = %e, "Instance discovery failed");
                })?;

        let discovered_count = discovered.len();
        let batch = select_batch(discovered, settings.max_instances);

        for instance in &batch {
            let value = instance.tags.get(&settings.control_tag);
            let current = value.parse::<Phase>()?;
            if current != settings.phase {
                // Provider-side filtering should make this unreachable; a
                // mismatch means the listing is stale or inconsistent.
                return Err(CyklistError::PhaseMismatch {
                    instance_id: instance.instance_id.clone(),
                    found: current,
                    expected: settings.phase,
                });
            }
        }

        info!(
            phase = %settings.phase,
            discovered = discovered_count,
            selected = batch.len(),
            max_instances = settings.max_instances,
            discovery_duration_seconds = format!("{:.2}", start_time.elapsed().as_secs_f64()),
            "Completed instance discovery"
        );

        if batch.len() < discovered_count {
            warn!(
                remaining = discovered_count - batch.len(),
                "More instances are waiting at this phase than max-instances allows"
            );
        }

        Ok(batch)
    }

    fn provider_filters(&self) -> Vec<ProviderFilter> {
        vec![
            discovery::tag_filter(&self.settings.enable_tag, ENABLED_VALUE),
            discovery::tag_filter(&self.settings.control_tag, self.settings.phase.as_str()),
            discovery::state_filter(LIVE_INSTANCE_STATES),
        ]
    }

    fn client_filters(&self) -> Vec<InstanceFilter> {
        let mut filters = Vec::new();
        if let Some(ami) = &self.settings.exclude_image_id {
            filters.push(discovery::not_image_id(ami.clone()));
        }
        if let Some(age) = self.settings.min_age {
            filters.push(discovery::age_at_least(age));
        }
        filters
    }
}
