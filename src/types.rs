//! Provider-neutral resource types shared by discovery, phases and output.

use chrono::{DateTime, Utc};

use crate::tags::{AUTOSCALING_GROUP_TAG, TagMap};

/// EC2 instance fields the lifecycle reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub instance_id: String,
    pub image_id: String,
    /// Private DNS name, which is also the Kubernetes node name.
    pub private_dns_name: String,
    pub launch_time: DateTime<Utc>,
    pub tags: TagMap,
}

impl Instance {
    /// Name of the autoscaling group this instance belongs to, if any.
    pub fn autoscaling_group(&self) -> Option<&str> {
        Some(self.tags.get(AUTOSCALING_GROUP_TAG)).filter(|g| !g.is_empty())
    }
}

/// Autoscaling group fields used by group discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoscalingGroup {
    pub name: String,
    pub tags: TagMap,
}

/// Server-side filter passed through to the describe call, e.g.
/// `tag:cyklist.jslee.io/enable = [yes]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFilter {
    pub name: String,
    pub values: Vec<String>,
}

/// One page of a describe-instances listing.
#[derive(Debug, Clone, Default)]
pub struct InstancePage {
    pub instances: Vec<Instance>,
    pub next_token: Option<String>,
}

/// One page of a describe-groups listing.
#[derive(Debug, Clone, Default)]
pub struct GroupPage {
    pub groups: Vec<AutoscalingGroup>,
    pub next_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance_with_tags(tags: TagMap) -> Instance {
        Instance {
            instance_id: "i-0abc".to_string(),
            image_id: "ami-1".to_string(),
            private_dns_name: "ip-10-0-0-1.ec2.internal".to_string(),
            launch_time: DateTime::<Utc>::UNIX_EPOCH,
            tags,
        }
    }

    #[test]
    fn test_autoscaling_group_present() {
        let instance = instance_with_tags(TagMap::from_pairs([(AUTOSCALING_GROUP_TAG, "web")]));
        assert_eq!(instance.autoscaling_group(), Some("web"));
    }

    #[test]
    fn test_autoscaling_group_missing_or_empty() {
        assert_eq!(instance_with_tags(TagMap::default()).autoscaling_group(), None);

        let empty = instance_with_tags(TagMap::from_pairs([(AUTOSCALING_GROUP_TAG, "")]));
        assert_eq!(empty.autoscaling_group(), None);
    }
}
