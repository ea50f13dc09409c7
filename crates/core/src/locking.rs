//! Selection and reporting for the management-node locking tool.

use std::fmt::Write as _;

use crate::hsm::{Component, LockResponse};

/// IDs of components not already locked. An absent `Locked` flag
/// counts as unlocked.
pub fn unlocked_ids(components: &[Component]) -> Vec<String> {
    components
        .iter()
        .filter(|c| c.locked != Some(true))
        .map(|c| c.id.clone())
        .collect()
}

/// Operator-facing summary of a lock run. Returns the rendered text;
/// the caller exits non-zero when the response counts failures.
pub fn render_summary(
    management_nodes: &[Component],
    requested: &[String],
    response: &LockResponse,
) -> String {
    let mut out = String::new();

    out.push_str("Operation Summary\n");
    out.push_str("=================\n");

    let all_ids: Vec<&str> = management_nodes.iter().map(|c| c.id.as_str()).collect();
    let _ = writeln!(out, "Found {} management nodes:", all_ids.len());
    let _ = writeln!(out, "    {}", all_ids.join(","));

    let _ = writeln!(out, "Found {} management nodes to lock:", requested.len());
    let _ = writeln!(out, "    {}", requested.join(","));

    if response.counts.success > 0 {
        let _ = writeln!(
            out,
            "Successfully locked {} management nodes:",
            response.counts.success
        );
        let _ = writeln!(out, "    {}", response.success.component_ids.join(","));
    }

    if response.counts.failure > 0 {
        let _ = writeln!(
            out,
            "Failed to lock {} management nodes:",
            response.counts.failure
        );
        for failure in &response.failure {
            let _ = writeln!(out, "    {} - {}", failure.id, failure.reason);
        }
    }

    out
}
