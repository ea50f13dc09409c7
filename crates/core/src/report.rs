//! Check classification and plain-text report rendering.
//!
//! The verification tools print operator-facing reports to stdout; the
//! renderers here turn the pure result structures into that text so
//! the formatting is testable.

use std::fmt::Write as _;

use crate::sls::CabinetClass;

/// Outcome of one labelled check within a cabinet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Warning,
    Fail,
}

/// One labelled check (e.g. "NodeBMCs") and its findings.
///
/// A check can carry both hard errors and warnings at once: a river
/// cabinet's NodeBMC sweep fails on undiscovered BMCs while separately
/// warning about management-node BMCs that are legitimately off the
/// management network.
#[derive(Debug, Clone)]
pub struct Check {
    pub label: String,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl Check {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn status(&self) -> CheckStatus {
        if !self.errors.is_empty() {
            CheckStatus::Fail
        } else if !self.warnings.is_empty() {
            CheckStatus::Warning
        } else {
            CheckStatus::Pass
        }
    }

    fn render(&self, out: &mut String) {
        if !self.errors.is_empty() {
            let _ = writeln!(out, "  {}: FAIL", self.label);
            for finding in &self.errors {
                let _ = writeln!(out, "    {finding}");
            }
        }
        if !self.warnings.is_empty() {
            let _ = writeln!(out, "  {}: WARNING", self.label);
            for finding in &self.warnings {
                let _ = writeln!(out, "    {finding}");
            }
        }
        if self.errors.is_empty() && self.warnings.is_empty() {
            let _ = writeln!(out, "  {}: PASS", self.label);
        }
    }
}

/// All checks for one cabinet.
#[derive(Debug, Clone)]
pub struct CabinetSection {
    pub cabinet: String,
    pub class: CabinetClass,
    pub checks: Vec<Check>,
}

impl CabinetSection {
    /// Number of checks that ended in FAIL.
    pub fn failure_count(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.status() == CheckStatus::Fail)
            .count()
    }
}

/// Per-cabinet component counts taken from HSM state.
#[derive(Debug, Clone, Default)]
pub struct CabinetSummary {
    pub cabinet: String,
    pub class: Option<CabinetClass>,
    pub nodes: u32,
    pub mgmt_nodes: u32,
    pub app_nodes: u32,
    pub compute_nodes: u32,
    pub node_bmcs: u32,
    pub router_bmcs: u32,
    pub chassis_bmcs: u32,
    pub pdu_controllers: u32,
}

/// The full output of the discovery verification run.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    pub summaries: Vec<CabinetSummary>,
    pub river: Vec<CabinetSection>,
    pub mountain: Vec<CabinetSection>,
}

impl DiscoveryReport {
    /// Total number of FAIL checks; the process exit code is derived
    /// from this (warnings alone do not fail the run).
    pub fn failure_count(&self) -> usize {
        self.river
            .iter()
            .chain(self.mountain.iter())
            .map(CabinetSection::failure_count)
            .sum()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str("HSM Cabinet Summary\n");
        out.push_str("===================\n");
        for summary in &self.summaries {
            render_summary(summary, &mut out);
        }
        out.push('\n');

        out.push_str("River Cabinet Checks\n");
        out.push_str("====================\n");
        for section in &self.river {
            let _ = writeln!(out, "{}", section.cabinet);
            for check in &section.checks {
                check.render(&mut out);
            }
        }
        out.push('\n');

        out.push_str("Mountain/Hill Cabinet Checks\n");
        out.push_str("============================\n");
        if self.mountain.is_empty() {
            out.push_str("None Found.\n");
        }
        for section in &self.mountain {
            let _ = writeln!(out, "{} ({})", section.cabinet, section.class);
            for check in &section.checks {
                check.render(&mut out);
            }
        }
        out.push('\n');

        out
    }
}

fn render_summary(summary: &CabinetSummary, out: &mut String) {
    let class = summary
        .class
        .map(|c| c.to_string())
        .unwrap_or_else(|| "Unknown".to_string());
    let _ = writeln!(out, "{} ({})", summary.cabinet, class);

    if summary.class == Some(CabinetClass::River) {
        let _ = writeln!(
            out,
            "  Discovered Nodes:         {:3} ({} Mgmt, {} Application, {} Compute)",
            summary.nodes, summary.mgmt_nodes, summary.app_nodes, summary.compute_nodes,
        );
    } else {
        let _ = writeln!(out, "  Discovered Nodes:         {:3}", summary.nodes);
    }
    let _ = writeln!(out, "  Discovered Node BMCs:     {:3}", summary.node_bmcs);
    let _ = writeln!(out, "  Discovered Router BMCs:   {:3}", summary.router_bmcs);
    let _ = writeln!(out, "  Discovered Chassis BMCs:  {:3}", summary.chassis_bmcs);
    if summary.class == Some(CabinetClass::River) {
        let _ = writeln!(
            out,
            "  Discovered Cab PDU Ctlrs: {:3}",
            summary.pdu_controllers
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_status_precedence() {
        let mut check = Check::new("Nodes");
        assert_eq!(check.status(), CheckStatus::Pass);

        check.warnings.push("- x1 - soft".to_string());
        assert_eq!(check.status(), CheckStatus::Warning);

        check.errors.push("- x2 - hard".to_string());
        assert_eq!(check.status(), CheckStatus::Fail);
    }

    #[test]
    fn check_renders_fail_and_warning_blocks() {
        let check = Check {
            label: "NodeBMCs".to_string(),
            errors: vec!["- x3000c0s1b0 - Not found in HSM Components.".to_string()],
            warnings: vec!["- x3000c0s9b0 - No mgmt port connection.".to_string()],
        };
        let mut out = String::new();
        check.render(&mut out);
        assert_eq!(
            out,
            "  NodeBMCs: FAIL\n    - x3000c0s1b0 - Not found in HSM Components.\n  NodeBMCs: WARNING\n    - x3000c0s9b0 - No mgmt port connection.\n"
        );
    }

    #[test]
    fn empty_mountain_section_prints_none_found() {
        let report = DiscoveryReport::default();
        let text = report.render();
        assert!(text.contains("Mountain/Hill Cabinet Checks\n============================\nNone Found.\n"));
    }

    #[test]
    fn river_summary_breaks_out_roles() {
        let report = DiscoveryReport {
            summaries: vec![CabinetSummary {
                cabinet: "x3000".to_string(),
                class: Some(CabinetClass::River),
                nodes: 12,
                mgmt_nodes: 3,
                app_nodes: 2,
                compute_nodes: 7,
                node_bmcs: 12,
                router_bmcs: 1,
                chassis_bmcs: 0,
                pdu_controllers: 2,
            }],
            ..Default::default()
        };
        let text = report.render();
        assert!(text.contains("x3000 (River)"));
        assert!(text.contains("  Discovered Nodes:          12 (3 Mgmt, 2 Application, 7 Compute)"));
        assert!(text.contains("  Discovered Cab PDU Ctlrs:   2"));
    }

    #[test]
    fn failure_count_ignores_warnings() {
        let report = DiscoveryReport {
            river: vec![CabinetSection {
                cabinet: "x3000".to_string(),
                class: CabinetClass::River,
                checks: vec![
                    Check {
                        label: "Nodes".to_string(),
                        errors: vec!["- x - gone.".to_string()],
                        warnings: vec![],
                    },
                    Check {
                        label: "CabinetPDUControllers".to_string(),
                        errors: vec![],
                        warnings: vec!["- x - gone.".to_string()],
                    },
                ],
            }],
            ..Default::default()
        };
        assert_eq!(report.failure_count(), 1);
    }
}
