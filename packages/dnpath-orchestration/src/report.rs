//! Human- and machine-readable rendering of runs and plans

use crate::error::{MaterializeError, Result};
use crate::materializer::MaterializeOutcome;
use dnpath_core::{ActionRecord, BuildPlan, ContainerEntry};
use serde::Serialize;

fn action_line(out: &mut String, record: &ActionRecord) {
    let marker = if record.simulated { " (dry-run)" } else { "" };
    out.push_str(&format!(
        "  {:<16} {}{}",
        record.kind.as_str(),
        record.dn,
        marker
    ));
    if let Some(detail) = &record.detail {
        out.push_str(&format!("  # {}", detail));
    }
    out.push('\n');
}

/// One line per action, then the final path
///
/// With `quiet`, only the final path is printed.
pub fn render_text(outcome: &MaterializeOutcome, quiet: bool) -> String {
    let mut out = String::new();
    if !quiet {
        for record in &outcome.actions {
            action_line(&mut out, record);
        }
    }
    out.push_str(&outcome.final_path);
    out.push('\n');
    out
}

pub fn render_json(outcome: &MaterializeOutcome) -> Result<String> {
    to_json(outcome)
}

/// Failure summary: which segment failed, at what prefix, and what was done
/// before it
pub fn render_failure_text(err: &MaterializeError) -> String {
    let mut out = String::new();
    for record in err.actions() {
        action_line(&mut out, record);
    }
    out.push_str(&format!("error: {}\n", err));
    out
}

#[derive(Serialize)]
struct FailureReport<'a> {
    error: String,
    category: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    segment: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<&'a str>,
    actions: &'a [ActionRecord],
}

pub fn render_failure_json(err: &MaterializeError) -> Result<String> {
    let (segment, prefix) = match err {
        MaterializeError::SegmentFailed {
            segment, prefix, ..
        } => (Some(segment.raw.as_str()), Some(prefix.as_str())),
        _ => (None, None),
    };
    to_json(&FailureReport {
        error: err.to_string(),
        category: err.category().as_str(),
        segment,
        prefix,
        actions: err.actions(),
    })
}

/// Plan steps with the parent each will be created under
pub fn render_plan_text(plan: &BuildPlan) -> String {
    let mut out = String::new();
    out.push_str(&format!("root: {}\n", plan.root()));
    for (index, step) in plan.iter().enumerate() {
        let parent = plan.parent_of(index).unwrap_or_default();
        out.push_str(&format!(
            "  {}. {:<14} {} under {}\n",
            index + 1,
            step.kind.as_str(),
            step.raw,
            parent
        ));
    }
    out
}

pub fn render_containers_text(containers: &[ContainerEntry]) -> String {
    let mut out = String::new();
    for entry in containers {
        out.push_str(&format!(
            "{}  {}\n",
            entry.created_at.format("%Y-%m-%dT%H:%M:%SZ"),
            entry.dn
        ));
    }
    out
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(MaterializeError::serialization)
}
