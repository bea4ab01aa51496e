//! Creation-order planning

use crate::domain::{BuildPlan, ParsedPath};

/// Reverse the parsed segments into root-to-leaf order
///
/// No filtering happens here; non-container segments stay in the plan and
/// the materializer decides how to treat them.
pub fn plan(parsed: &ParsedPath) -> BuildPlan {
    let steps = parsed.segments.iter().rev().cloned().collect();
    BuildPlan::new(parsed.root.clone(), steps)
}

impl From<&ParsedPath> for BuildPlan {
    fn from(parsed: &ParsedPath) -> Self {
        plan(parsed)
    }
}
