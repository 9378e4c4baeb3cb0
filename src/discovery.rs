//! Paginated instance and autoscaling group discovery.
//!
//! Provider filters are evaluated server-side. Client-side filters are plain
//! predicates combined with AND logic; if OR logic is required it has to be
//! expressed inside a single predicate.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::provider::{AutoscalingApi, ComputeApi};
use crate::types::{AutoscalingGroup, Instance, ProviderFilter};

/// Client-side predicate over a discovered instance.
pub type InstanceFilter = Box<dyn Fn(&Instance) -> bool + Send + Sync>;

/// Client-side predicate over a discovered autoscaling group.
pub type GroupFilter = Box<dyn Fn(&AutoscalingGroup) -> bool + Send + Sync>;

/// Instance states that can still make progress through the lifecycle.
pub const LIVE_INSTANCE_STATES: &[&str] = &["pending", "running", "stopping", "stopped"];

/// Server-side filter matching a tag key and exact value.
pub fn tag_filter(key: &str, value: &str) -> ProviderFilter {
    ProviderFilter {
        name: format!("tag:{}", key),
        values: vec![value.to_string()],
    }
}

/// Server-side filter on `instance-state-name`.
pub fn state_filter(states: &[&str]) -> ProviderFilter {
    ProviderFilter {
        name: "instance-state-name".to_string(),
        values: states.iter().map(|s| s.to_string()).collect(),
    }
}

/// Passes instances that do not run the given AMI.
pub fn not_image_id(ami: impl Into<String>) -> InstanceFilter {
    let ami = ami.into();
    Box::new(move |instance| instance.image_id != ami)
}

/// Passes instances launched at least `age` ago.
pub fn age_at_least(age: Duration) -> InstanceFilter {
    Box::new(move |instance| {
        Utc::now()
            .signed_duration_since(instance.launch_time)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= age)
    })
}

/// Passes groups carrying the tag with exactly this value.
pub fn group_tag_match(key: impl Into<String>, value: impl Into<String>) -> GroupFilter {
    let (key, value) = (key.into(), value.into());
    Box::new(move |group| group.tags.has(&key, &value))
}

/// Lists every instance matching `filters`, keeping those that pass all
/// `filter_fns`, sorted by launch time with the oldest first.
///
/// Pages are requested until the provider stops returning a continuation
/// token. An error on any page discards everything fetched so far.
pub async fn filter_instances<C>(
    compute: &C,
    filters: &[ProviderFilter],
    filter_fns: &[InstanceFilter],
) -> Result<Vec<Instance>>
where
    C: ComputeApi + ?Sized,
{
    let mut instances = Vec::new();
    let mut next_token: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = compute
            .describe_instances_page(filters, next_token.take())
            .await?;
        pages += 1;

        let fetched = page.instances.len();
        instances.extend(
            page.instances
                .into_iter()
                .filter(|instance| filter_fns.iter().all(|keep| keep(instance))),
        );

        debug!(
            page = pages,
            fetched = fetched,
            kept_total = instances.len(),
            "Fetched instance page"
        );

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    instances.sort_by_key(|instance| instance.launch_time);

    debug!(
        pages = pages,
        instance_count = instances.len(),
        "Instance discovery complete"
    );

    Ok(instances)
}

/// Lists every autoscaling group that passes all `filter_fns`.
pub async fn filter_groups<A>(
    autoscaling: &A,
    filter_fns: &[GroupFilter],
) -> Result<Vec<AutoscalingGroup>>
where
    A: AutoscalingApi + ?Sized,
{
    let mut groups = Vec::new();
    let mut next_token: Option<String> = None;

    loop {
        let page = autoscaling.describe_groups_page(next_token.take()).await?;

        groups.extend(
            page.groups
                .into_iter()
                .filter(|group| filter_fns.iter().all(|keep| keep(group))),
        );

        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => break,
        }
    }

    debug!(group_count = groups.len(), "Autoscaling group discovery complete");

    Ok(groups)
}
