//! Read-only key/value view over resource tags.

use std::collections::HashMap;

/// Tag applied by EC2 Auto Scaling to group members. It is removed again
/// when an instance is detached from its group.
pub const AUTOSCALING_GROUP_TAG: &str = "aws:autoscaling:groupName";

/// Tag key/value lookups with defaults, similar to reading environment
/// variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagMap(HashMap<String, String>);

impl TagMap {
    /// Build a map from key/value pairs. A repeated key keeps the last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns the tag value, or an empty string if the tag is absent.
    pub fn get(&self, key: &str) -> &str {
        self.get_with_default(key, "")
    }

    pub fn get_with_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.0.get(key).map(String::as_str).unwrap_or(default)
    }

    /// True only when the tag exists AND carries exactly `value`.
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.0.get(key).is_some_and(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[aws_sdk_ec2::types::Tag]> for TagMap {
    fn from(tags: &[aws_sdk_ec2::types::Tag]) -> Self {
        Self::from_pairs(
            tags.iter()
                .filter_map(|tag| tag.key().map(|k| (k, tag.value().unwrap_or_default()))),
        )
    }
}

impl From<&[aws_sdk_autoscaling::types::TagDescription]> for TagMap {
    fn from(tags: &[aws_sdk_autoscaling::types::TagDescription]) -> Self {
        Self::from_pairs(
            tags.iter()
                .filter_map(|tag| tag.key().map(|k| (k, tag.value().unwrap_or_default()))),
        )
    }
}
