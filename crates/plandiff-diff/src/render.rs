//! Text and JSON renderings of a change report.

use chrono::NaiveDateTime;
use plandiff_model::{ModelResult, Task};
use serde_json::{json, Map, Value};

use crate::report::{DiffKind, DiffNode, DiffStatus, ScheduleDiff};

/// One-line summary of a task: slug, name, milestone flag, planned range,
/// flags, and child count.
pub fn task_summary(task: &Task) -> String {
    let mut line = format!("{}: {}", task.slug, task.name);
    if task.milestone {
        line.push_str(" <milestone>");
    }
    let flags = if task.flags.is_empty() {
        "-".to_string()
    } else {
        task.flags.iter().cloned().collect::<Vec<_>>().join(",")
    };
    line.push_str(&format!(
        " | {} -> {} | flags: {} | children: {}",
        day(task.planned_start),
        day(task.planned_finish),
        flags,
        task.children.len()
    ));
    line
}

fn day(value: Option<NaiveDateTime>) -> String {
    value
        .map(|v| v.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Render report trees depth-first, one line per node.
///
/// An added or removed node forces its marker onto every descendant; any
/// other status leaves children with their own markers.
pub fn render_nodes(nodes: &[DiffNode<'_>]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&DiffNode<'_>, usize, Option<DiffStatus>)> =
        nodes.iter().rev().map(|node| (node, 0, None)).collect();
    while let Some((node, depth, forced)) = stack.pop() {
        let status = forced.unwrap_or_else(|| node.status());
        out.push_str(status.marker());
        out.push_str(&"  ".repeat(depth));
        out.push_str(&task_summary(node.task()));
        if let (DiffStatus::Changed, DiffKind::Changed { attributes, .. }) = (status, &node.kind) {
            let names: Vec<&str> = attributes.iter().map(|f| f.as_str()).collect();
            out.push_str(&format!(" | changed: {}", names.join(",")));
        }
        out.push('\n');

        let inherited = match status {
            DiffStatus::Added | DiffStatus::Removed => Some(status),
            DiffStatus::Unchanged | DiffStatus::Changed => None,
        };
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1, inherited)));
    }
    out
}

/// JSON form of one report node: the shown task's attributes plus
/// `status`, the nested `tasks` report array in place of `children`, and
/// for changed nodes `previous` and `changed_attributes`.
pub fn node_to_json(node: &DiffNode<'_>) -> ModelResult<Value> {
    let mut obj = match node.task().attributes()? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    obj.insert("status".into(), Value::from(node.status().as_str()));
    if let DiffKind::Changed { old, attributes, .. } = &node.kind {
        obj.insert("previous".into(), old.attributes()?);
        obj.insert(
            "changed_attributes".into(),
            attributes.iter().map(|f| Value::from(f.as_str())).collect(),
        );
    }
    obj.insert("tasks".into(), nodes_to_json(&node.children)?);
    Ok(Value::Object(obj))
}

pub fn nodes_to_json(nodes: &[DiffNode<'_>]) -> ModelResult<Value> {
    nodes
        .iter()
        .map(node_to_json)
        .collect::<ModelResult<Vec<_>>>()
        .map(Value::Array)
}

impl<'a> ScheduleDiff<'a> {
    /// Indented text rendering of the report.
    pub fn render_text(&self) -> String {
        render_nodes(&self.nodes)
    }

    /// Tree-shaped JSON document mirroring the report.
    pub fn to_json(&self) -> ModelResult<Value> {
        Ok(json!({
            "old": { "name": self.old.name, "slug": self.old.slug },
            "new": { "name": self.new.name, "slug": self.new.slug },
            "summary": self.stats(),
            "tasks": nodes_to_json(&self.nodes)?,
        }))
    }

    pub fn to_json_string(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(&self.to_json()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiffConfig;
    use crate::report::{diff_schedules, diff_tasks};
    use chrono::NaiveDate;
    use plandiff_model::Schedule;

    fn day_of(d: u32) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(2024, 1, d).and_then(|d| d.and_hms_opt(0, 0, 0))
    }

    fn scenario() -> (Schedule, Schedule) {
        let a = Schedule::new(
            "P",
            vec![Task::new("R").with_children([
                Task::new("Plan").with_planned(day_of(1), day_of(3)),
                Task::new("Dev").with_planned(day_of(4), day_of(15)),
            ])],
        );
        let b = Schedule::new(
            "P",
            vec![Task::new("R").with_children([
                Task::new("Plan").with_planned(day_of(1), day_of(3)),
                Task::new("Dev").with_planned(day_of(4), day_of(16)),
            ])],
        );
        (a, b)
    }

    #[test]
    fn summary_line() {
        let task = Task::new("Go live")
            .with_slug("go_live")
            .with_planned(day_of(9), day_of(9))
            .with_flags(["pm", "dev"])
            .milestone();
        assert_eq!(
            task_summary(&task),
            "go_live: Go live <milestone> | 2024-01-09 -> 2024-01-09 | flags: dev,pm | children: 0"
        );
    }

    #[test]
    fn summary_line_without_dates() {
        let task = Task::new("R").with_slug("r").with_children([Task::new("a")]);
        assert_eq!(task_summary(&task), "r: R | ? -> ? | flags: - | children: 1");
    }

    #[test]
    fn identical_schedules_have_no_markers() {
        let (a, _) = scenario();
        let diff = diff_schedules(&a, &a, &DiffConfig::default());
        let text = diff.render_text();
        assert_eq!(text.lines().count(), 3);
        assert!(!text.contains("[+]") && !text.contains("[-]") && !text.contains("[M]"));
        assert!(text.lines().all(|l| l.starts_with("   ")));
    }

    #[test]
    fn changed_line_lists_attributes() {
        let (a, b) = scenario();
        let diff = diff_schedules(&a, &b, &DiffConfig::default());
        let text = diff.render_text();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("   r: R"));
        assert!(lines[1].starts_with("     plan: Plan"));
        assert_eq!(
            lines[2],
            "[M]  dev: Dev | 2024-01-04 -> 2024-01-16 | flags: - | children: 0 | changed: planned_finish"
        );
    }

    #[test]
    fn added_marker_propagates_to_descendants() {
        let old: Vec<Task> = Vec::new();
        let new = vec![Task::new("R").with_slug("r").with_children([Task::new("x").with_slug("x")])];
        let nodes = diff_tasks(&old, &new, &DiffConfig::default());
        let text = render_nodes(&nodes);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[+]r: R"));
        assert!(lines[1].starts_with("[+]  x: x"));
    }

    #[test]
    fn forced_marker_overrides_child_status() {
        let parent = Task::new("R").with_slug("r").with_children([Task::new("x").with_slug("x")]);
        let node = DiffNode {
            kind: DiffKind::Removed(&parent),
            children: vec![DiffNode {
                kind: DiffKind::Unchanged(&parent.children[0]),
                children: Vec::new(),
            }],
        };
        let text = render_nodes(std::slice::from_ref(&node));
        assert!(text.lines().all(|l| l.starts_with("[-]")));
    }

    #[test]
    fn json_nests_tasks_instead_of_children() {
        let (a, b) = scenario();
        let diff = diff_schedules(&a, &b, &DiffConfig::default());
        let json = diff.to_json().unwrap();

        assert_eq!(json["summary"]["changed"], 1);
        assert_eq!(json["summary"]["unchanged"], 2);
        let root = &json["tasks"][0];
        assert_eq!(root["status"], "unchanged");
        assert!(root.get("children").is_none());
        let dev = &root["tasks"][1];
        assert_eq!(dev["status"], "changed");
        assert_eq!(dev["name"], "Dev");
        assert_eq!(dev["planned_finish"], "2024-01-16T00:00:00");
        assert_eq!(dev["previous"]["planned_finish"], "2024-01-15T00:00:00");
        assert_eq!(dev["changed_attributes"], json!(["planned_finish"]));
        assert_eq!(dev["tasks"], json!([]));
    }

    #[test]
    fn json_flags_are_sorted_arrays() {
        let old: Vec<Task> = Vec::new();
        let new = vec![Task::new("R").with_flags(["qe", "dev"])];
        let nodes = diff_tasks(&old, &new, &DiffConfig::default());
        let json = nodes_to_json(&nodes).unwrap();
        assert_eq!(json[0]["flags"], json!(["dev", "qe"]));
        assert_eq!(json[0]["status"], "added");
    }

    #[test]
    fn json_string_is_valid() {
        let (a, b) = scenario();
        let diff = diff_schedules(&a, &b, &DiffConfig::default());
        let text = diff.to_json_string().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["new"]["name"], "P");
    }
}
