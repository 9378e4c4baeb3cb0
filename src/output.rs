//! Instance listing for list-only runs.

use chrono::SecondsFormat;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::tags::AUTOSCALING_GROUP_TAG;
use crate::types::Instance;

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "GROUP")]
    group: String,
    #[tabled(rename = "INSTANCE")]
    instance_id: String,
    #[tabled(rename = "IMAGE")]
    image_id: String,
    #[tabled(rename = "PHASE")]
    phase: String,
    #[tabled(rename = "LAUNCHED")]
    launched: String,
}

/// Renders the batch as an aligned table. Missing tags show as `-`.
pub fn render_instances(instances: &[Instance], control_tag: &str) -> String {
    let rows = instances.iter().map(|instance| InstanceRow {
        group: instance
            .tags
            .get_with_default(AUTOSCALING_GROUP_TAG, "-")
            .to_string(),
        instance_id: instance.instance_id.clone(),
        image_id: instance.image_id.clone(),
        phase: instance.tags.get_with_default(control_tag, "-").to_string(),
        launched: instance
            .launch_time
            .to_rfc3339_opts(SecondsFormat::Secs, true),
    });

    Table::new(rows).with(Style::blank()).to_string()
}

pub fn print_instances(instances: &[Instance], control_tag: &str) {
    println!("{}", render_instances(instances, control_tag));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CONTROL_TAG, instance, lifecycle_instance};

    #[test]
    fn test_render_columns() {
        let table = render_instances(
            &[lifecycle_instance("i-0aaa", 0, "detach", Some("web"))],
            CONTROL_TAG,
        );
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 2);
        for header in ["GROUP", "INSTANCE", "IMAGE", "PHASE", "LAUNCHED"] {
            assert!(lines[0].contains(header), "missing header {header}");
        }
        let fields: Vec<&str> = lines[1].split_whitespace().collect();
        assert_eq!(
            fields,
            vec!["web", "i-0aaa", "ami-0123456789", "detach", "2024-01-01T00:00:00Z"]
        );
    }

    #[test]
    fn test_render_missing_tags_as_dash() {
        let table = render_instances(&[instance("i-0bbb", 60, &[])], CONTROL_TAG);
        let fields: Vec<&str> = table.lines().nth(1).unwrap().split_whitespace().collect();

        assert_eq!(fields[0], "-");
        assert_eq!(fields[3], "-");
        assert_eq!(fields[4], "2024-01-01T00:01:00Z");
    }

    #[test]
    fn test_columns_are_aligned() {
        let table = render_instances(
            &[
                lifecycle_instance("i-1", 0, "drain", Some("a")),
                lifecycle_instance("i-2", 1, "drain", Some("a-much-longer-group")),
            ],
            CONTROL_TAG,
        );
        let offsets: Vec<usize> = table
            .lines()
            .map(|line| line.find("i-").or_else(|| line.find("INSTANCE")).unwrap())
            .collect();

        assert!(offsets.windows(2).all(|w| w[0] == w[1]), "{table}");
    }
}
