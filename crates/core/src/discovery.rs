//! Discovery verification: reconcile SLS layout, HSM state components,
//! and HSM Redfish endpoints.
//!
//! Pure logic -- the caller fetches the three inventories and passes
//! them in. SLS is treated as the source of truth for what *should*
//! exist; HSM components and Redfish endpoints are the two views of
//! what discovery actually found. Severity depends on the cabinet
//! class and component type: river compute infrastructure must be
//! fully discovered (FAIL), while components that are routinely
//! undiscoverable (vendor PDUs, liquid-cooled node BMCs) only warn.

use std::collections::{HashMap, HashSet};

use crate::hsm::{Component, ComponentType, RedfishEndpoint};
use crate::report::{CabinetSection, CabinetSummary, Check, DiscoveryReport};
use crate::sls::{CabinetClass, SlsHardware};
use crate::xname;

/// Run the full verification and produce the printable report.
pub fn verify(
    sls: &[SlsHardware],
    components: &[Component],
    endpoints: &[RedfishEndpoint],
) -> DiscoveryReport {
    let cabinets = cabinet_list(sls);
    let index = Index::build(sls, components, endpoints);

    let mut report = DiscoveryReport {
        summaries: cabinets
            .iter()
            .map(|(cab, class)| summarize_cabinet(cab, *class, components))
            .collect(),
        ..Default::default()
    };

    for (cab, class) in &cabinets {
        match class {
            CabinetClass::River => report.river.push(river_section(cab, sls, &index)),
            CabinetClass::Mountain | CabinetClass::Hill => {
                report
                    .mountain
                    .push(mountain_section(cab, *class, sls, &index));
            }
        }
    }

    report
}

/// Cabinets from SLS, sorted by xname.
fn cabinet_list(sls: &[SlsHardware]) -> Vec<(String, CabinetClass)> {
    let mut cabinets: Vec<(String, CabinetClass)> = sls
        .iter()
        .filter(|hw| hw.type_string == ComponentType::Cabinet)
        .filter_map(|hw| match hw.class {
            Some(class) => Some((hw.xname.clone(), class)),
            None => {
                tracing::warn!(xname = %hw.xname, "Cabinet without a class in SLS, skipping");
                None
            }
        })
        .collect();
    cabinets.sort_by(|a, b| a.0.cmp(&b.0));
    cabinets
}

/// Presence indexes over the two HSM inventories plus the SLS
/// management-port associations.
struct Index<'a> {
    components: HashSet<&'a str>,
    endpoints: HashSet<&'a str>,
    /// BMC xnames that appear in some component's `NodeNics` list,
    /// i.e. have a management switch port cabled to them.
    mgmt_ports: HashSet<&'a str>,
}

impl<'a> Index<'a> {
    fn build(
        sls: &'a [SlsHardware],
        components: &'a [Component],
        endpoints: &'a [RedfishEndpoint],
    ) -> Self {
        let mgmt_ports = sls
            .iter()
            .filter_map(|hw| hw.extra_properties.as_ref())
            .flat_map(|props| props.node_nics.iter())
            .map(String::as_str)
            .collect();

        Self {
            components: components.iter().map(|c| c.id.as_str()).collect(),
            endpoints: endpoints.iter().map(|e| e.id.as_str()).collect(),
            mgmt_ports,
        }
    }

    fn component_present(&self, id: &str) -> bool {
        self.components.contains(id)
    }

    fn endpoint_present(&self, id: &str) -> bool {
        self.endpoints.contains(id)
    }

    /// Chassis BMCs are recorded bare (`x1000c3`) in SLS/components but
    /// may carry a `b0` suffix in the Redfish endpoint inventory.
    fn chassis_present(&self, set: &HashSet<&str>, base: &str) -> bool {
        set.contains(base) || set.contains(format!("{base}b0").as_str())
    }

    fn has_mgmt_port(&self, bmc: &str) -> bool {
        self.mgmt_ports.contains(bmc)
    }
}

const NOT_IN_COMPONENTS: &str = "Not found in HSM Components";
const NOT_IN_ENDPOINTS: &str = "Not found in HSM Redfish Endpoints";
const NO_MGMT_PORT: &str = "No mgmt port connection";

/// Standard presence sweep for a river BMC-class component: HSM state,
/// Redfish endpoint, and (river only) mgmt port cabling.
fn presence_parts(index: &Index<'_>, name: &str, check_mgmt_port: bool) -> Vec<String> {
    let mut parts = Vec::new();
    if !index.component_present(name) {
        parts.push(NOT_IN_COMPONENTS.to_string());
    }
    if !index.endpoint_present(name) {
        parts.push(NOT_IN_ENDPOINTS.to_string());
    }
    if check_mgmt_port && !index.has_mgmt_port(name) {
        parts.push(NO_MGMT_PORT.to_string());
    }
    parts
}

fn finding(name: &str, parts: &[String]) -> String {
    format!("- {} - {}.", name, parts.join("; "))
}

fn nid_string(hw: &SlsHardware) -> String {
    match hw.nid() {
        Some(nid) => nid.to_string(),
        None => "N/A".to_string(),
    }
}

/// Nodes of the SLS dump that live in the given cabinet.
fn cabinet_nodes<'a>(cab: &str, sls: &'a [SlsHardware]) -> Vec<&'a SlsHardware> {
    sls.iter()
        .filter(|hw| hw.type_string == ComponentType::Node && xname::in_cabinet(cab, &hw.xname))
        .collect()
}

/// SLS carries no node-BMC records; infer them from node parents,
/// first occurrence wins (dual-node blades share a BMC).
fn inferred_node_bmcs<'a>(nodes: &[&'a SlsHardware]) -> Vec<(&'a str, &'a SlsHardware)> {
    let mut seen = HashSet::new();
    let mut bmcs = Vec::new();
    for node in nodes {
        if node.parent.is_empty() {
            continue;
        }
        if seen.insert(node.parent.as_str()) {
            bmcs.push((node.parent.as_str(), *node));
        }
    }
    bmcs
}

fn river_section(cab: &str, sls: &[SlsHardware], index: &Index<'_>) -> CabinetSection {
    let nodes = cabinet_nodes(cab, sls);
    let mut checks = Vec::new();

    // Nodes must be in HSM state.
    let mut node_check = Check::new("Nodes");
    for node in &nodes {
        if !index.component_present(&node.xname) {
            node_check.errors.push(format!(
                "- {} ({}, NID {}) - Not found in HSM Components.",
                node.xname,
                node.role().unwrap_or("Unknown"),
                nid_string(node),
            ));
        }
    }
    checks.push(node_check);

    // Node BMCs: full sweep, with the management-NCN exception. One
    // master NCN BMC legitimately sits off the management network, so
    // a missing mgmt port on a Management node's BMC is informational.
    let mut bmc_check = Check::new("NodeBMCs");
    for (bmc, node) in inferred_node_bmcs(&nodes) {
        let mut parts = Vec::new();
        if !index.component_present(bmc) {
            parts.push(NOT_IN_COMPONENTS.to_string());
        }
        if !index.endpoint_present(bmc) {
            parts.push(NOT_IN_ENDPOINTS.to_string());
        }
        let mut mgmt_node_bmc = false;
        if !index.has_mgmt_port(bmc) {
            parts.push(NO_MGMT_PORT.to_string());
            if node.is_management() {
                mgmt_node_bmc = true;
                parts.push(format!(
                    "BMC of mgmt node {}",
                    node.first_alias().unwrap_or("unknown"),
                ));
            }
        }
        if !parts.is_empty() {
            let message = finding(bmc, &parts);
            if mgmt_node_bmc {
                bmc_check.warnings.push(message);
            } else {
                bmc_check.errors.push(message);
            }
        }
    }
    checks.push(bmc_check);

    // Router BMCs and chassis management controllers are present in
    // SLS directly.
    let mut router_check = Check::new("RouterBMCs");
    for hw in typed_in_cabinet(cab, sls, ComponentType::RouterBmc) {
        let parts = presence_parts(index, &hw.xname, true);
        if !parts.is_empty() {
            router_check.errors.push(finding(&hw.xname, &parts));
        }
    }
    checks.push(router_check);

    let mut cmc_check = Check::new("ChassisBMCs/CMCs");
    for hw in typed_in_cabinet(cab, sls, ComponentType::ChassisBmc) {
        let base = xname::chassis_base(&hw.xname);
        let mut parts = Vec::new();
        if !index.chassis_present(&index.components, base) {
            parts.push(NOT_IN_COMPONENTS.to_string());
        }
        if !index.chassis_present(&index.endpoints, base) {
            parts.push(NOT_IN_ENDPOINTS.to_string());
        }
        if !index.has_mgmt_port(&hw.xname) && !index.has_mgmt_port(base) {
            parts.push(NO_MGMT_PORT.to_string());
        }
        if !parts.is_empty() {
            cmc_check.errors.push(finding(base, &parts));
        }
    }
    checks.push(cmc_check);

    // Vendor PDUs are frequently undiscoverable; warn, never fail.
    let mut pdu_check = Check::new("CabinetPDUControllers");
    for hw in typed_in_cabinet(cab, sls, ComponentType::CabinetPDUController) {
        let parts = presence_parts(index, &hw.xname, true);
        if !parts.is_empty() {
            pdu_check.warnings.push(finding(&hw.xname, &parts));
        }
    }
    checks.push(pdu_check);

    CabinetSection {
        cabinet: cab.to_string(),
        class: CabinetClass::River,
        checks,
    }
}

fn mountain_section(
    cab: &str,
    class: CabinetClass,
    sls: &[SlsHardware],
    index: &Index<'_>,
) -> CabinetSection {
    let mut checks = Vec::new();

    // Chassis BMCs against the model's expected topology: every
    // mountain chassis (c0-c7) has one, hill cabinets only c1/c3.
    let sls_chassis: HashSet<&str> = typed_in_cabinet(cab, sls, ComponentType::ChassisBmc)
        .map(|hw| xname::chassis_base(&hw.xname))
        .collect();

    let mut chassis_check = Check::new("ChassisBMCs");
    for slot in xname::expected_chassis_slots(class).unwrap_or(&[]) {
        let base = format!("{cab}{slot}");
        let mut parts = Vec::new();
        if !index.chassis_present(&sls_chassis, &base) {
            parts.push("Not found in SLS Hardware".to_string());
        }
        if !index.chassis_present(&index.components, &base) {
            parts.push(NOT_IN_COMPONENTS.to_string());
        }
        if !index.chassis_present(&index.endpoints, &base) {
            parts.push(NOT_IN_ENDPOINTS.to_string());
        }
        if !parts.is_empty() {
            chassis_check.errors.push(finding(&base, &parts));
        }
    }
    checks.push(chassis_check);

    // Liquid-cooled nodes and their BMCs come and go with blade power;
    // absences are worth a look but not a hard failure.
    let nodes = cabinet_nodes(cab, sls);

    let mut node_check = Check::new("Nodes");
    for node in &nodes {
        if !index.component_present(&node.xname) {
            node_check.warnings.push(format!(
                "- {} ({}, NID {}) - Not found in HSM Components.",
                node.xname,
                node.role().unwrap_or("Unknown"),
                nid_string(node),
            ));
        }
    }
    checks.push(node_check);

    let mut bmc_check = Check::new("NodeBMCs");
    for (bmc, _) in inferred_node_bmcs(&nodes) {
        let parts = presence_parts(index, bmc, false);
        if !parts.is_empty() {
            bmc_check.warnings.push(finding(bmc, &parts));
        }
    }
    checks.push(bmc_check);

    let mut router_check = Check::new("RouterBMCs");
    for hw in typed_in_cabinet(cab, sls, ComponentType::RouterBmc) {
        let parts = presence_parts(index, &hw.xname, false);
        if !parts.is_empty() {
            router_check.errors.push(finding(&hw.xname, &parts));
        }
    }
    checks.push(router_check);

    CabinetSection {
        cabinet: cab.to_string(),
        class,
        checks,
    }
}

fn typed_in_cabinet<'a>(
    cab: &'a str,
    sls: &'a [SlsHardware],
    kind: ComponentType,
) -> impl Iterator<Item = &'a SlsHardware> {
    sls.iter()
        .filter(move |hw| hw.type_string == kind && xname::in_cabinet(cab, &hw.xname))
}

/// Count discovered components per cabinet from the HSM state view.
fn summarize_cabinet(cab: &str, class: CabinetClass, components: &[Component]) -> CabinetSummary {
    let mut summary = CabinetSummary {
        cabinet: cab.to_string(),
        class: Some(class),
        ..Default::default()
    };

    let mut roles: HashMap<&str, u32> = HashMap::new();
    for comp in components {
        if !xname::in_cabinet(cab, &comp.id) {
            continue;
        }
        match comp.kind {
            ComponentType::Node => {
                summary.nodes += 1;
                if let Some(role) = comp.role.as_deref() {
                    *roles.entry(role).or_default() += 1;
                }
            }
            ComponentType::NodeBmc => summary.node_bmcs += 1,
            ComponentType::RouterBmc => summary.router_bmcs += 1,
            ComponentType::ChassisBmc => summary.chassis_bmcs += 1,
            ComponentType::CabinetPDUController => summary.pdu_controllers += 1,
            _ => {}
        }
    }

    summary.compute_nodes = roles.get("Compute").copied().unwrap_or(0);
    summary.mgmt_nodes = roles.get("Management").copied().unwrap_or(0);
    summary.app_nodes = roles.get("Application").copied().unwrap_or(0);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::CheckStatus;

    fn sls_fixture() -> Vec<SlsHardware> {
        serde_json::from_value(serde_json::json!([
            {"Xname": "x3000", "TypeString": "Cabinet", "Class": "River"},
            {"Xname": "x3000c0s9b0n0", "Parent": "x3000c0s9b0", "TypeString": "Node",
             "Class": "River",
             "ExtraProperties": {"Role": "Management", "NID": 100001,
                                 "Aliases": ["ncn-m001"]}},
            {"Xname": "x3000c0s19b0n0", "Parent": "x3000c0s19b0", "TypeString": "Node",
             "Class": "River",
             "ExtraProperties": {"Role": "Compute", "NID": 1}},
            {"Xname": "x3000c0r15b0", "TypeString": "RouterBMC", "Class": "River"},
            {"Xname": "x3000m0", "TypeString": "CabinetPDUController", "Class": "River"},
            // Mgmt switch carrying the BMC port associations.
            {"Xname": "x3000c0w14", "TypeString": "MgmtSwitch", "Class": "River",
             "ExtraProperties": {"NodeNics": ["x3000c0s9b0", "x3000c0s19b0",
                                              "x3000c0r15b0", "x3000m0"]}},
        ]))
        .unwrap()
    }

    fn components_fixture() -> Vec<Component> {
        let list: crate::hsm::ComponentList = serde_json::from_value(serde_json::json!({
            "Components": [
                {"ID": "x3000c0s9b0n0", "Type": "Node", "Role": "Management"},
                {"ID": "x3000c0s19b0n0", "Type": "Node", "Role": "Compute"},
                {"ID": "x3000c0s9b0", "Type": "NodeBMC"},
                {"ID": "x3000c0s19b0", "Type": "NodeBMC"},
                {"ID": "x3000c0r15b0", "Type": "RouterBMC"},
                {"ID": "x3000m0", "Type": "CabinetPDUController"},
            ]
        }))
        .unwrap();
        list.components
    }

    fn endpoints_fixture() -> Vec<RedfishEndpoint> {
        let list: crate::hsm::RedfishEndpointList = serde_json::from_value(serde_json::json!({
            "RedfishEndpoints": [
                {"ID": "x3000c0s9b0"},
                {"ID": "x3000c0s19b0"},
                {"ID": "x3000c0r15b0"},
                {"ID": "x3000m0"},
            ]
        }))
        .unwrap();
        list.endpoints
    }

    fn check<'a>(section: &'a CabinetSection, label: &str) -> &'a Check {
        section
            .checks
            .iter()
            .find(|c| c.label == label)
            .unwrap_or_else(|| panic!("no check labelled {label}"))
    }

    #[test]
    fn healthy_river_cabinet_passes() {
        let report = verify(&sls_fixture(), &components_fixture(), &endpoints_fixture());
        assert_eq!(report.failure_count(), 0);
        let section = &report.river[0];
        for c in &section.checks {
            assert_eq!(c.status(), CheckStatus::Pass, "check {}", c.label);
        }
    }

    #[test]
    fn missing_node_fails_with_role_and_nid() {
        let comps: Vec<Component> = components_fixture()
            .into_iter()
            .filter(|c| c.id != "x3000c0s19b0n0")
            .collect();
        let report = verify(&sls_fixture(), &comps, &endpoints_fixture());

        let nodes = check(&report.river[0], "Nodes");
        assert_eq!(nodes.status(), CheckStatus::Fail);
        assert_eq!(
            nodes.errors,
            vec!["- x3000c0s19b0n0 (Compute, NID 1) - Not found in HSM Components."]
        );
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn node_without_nid_renders_na() {
        let mut sls = sls_fixture();
        // Drop the NID from the compute node.
        sls[2].extra_properties.as_mut().unwrap().nid = None;
        let comps: Vec<Component> = components_fixture()
            .into_iter()
            .filter(|c| c.id != "x3000c0s19b0n0")
            .collect();
        let report = verify(&sls, &comps, &endpoints_fixture());

        let nodes = check(&report.river[0], "Nodes");
        assert!(nodes.errors[0].contains("NID N/A"));
    }

    #[test]
    fn undiscovered_bmc_fails_on_missing_endpoint() {
        let endpoints: Vec<RedfishEndpoint> = endpoints_fixture()
            .into_iter()
            .filter(|e| e.id != "x3000c0s19b0")
            .collect();
        let report = verify(&sls_fixture(), &components_fixture(), &endpoints);

        let bmcs = check(&report.river[0], "NodeBMCs");
        assert_eq!(
            bmcs.errors,
            vec!["- x3000c0s19b0 - Not found in HSM Redfish Endpoints."]
        );
    }

    #[test]
    fn mgmt_node_bmc_without_port_is_a_warning() {
        let mut sls = sls_fixture();
        // Unplug the master NCN's BMC from the management network.
        sls[5]
            .extra_properties
            .as_mut()
            .unwrap()
            .node_nics
            .retain(|nic| nic != "x3000c0s9b0");
        let report = verify(&sls, &components_fixture(), &endpoints_fixture());

        let bmcs = check(&report.river[0], "NodeBMCs");
        assert!(bmcs.errors.is_empty());
        assert_eq!(
            bmcs.warnings,
            vec!["- x3000c0s9b0 - No mgmt port connection; BMC of mgmt node ncn-m001."]
        );
        // An informational warning must not fail the run.
        assert_eq!(report.failure_count(), 0);
    }

    #[test]
    fn compute_bmc_without_port_is_an_error() {
        let mut sls = sls_fixture();
        sls[5]
            .extra_properties
            .as_mut()
            .unwrap()
            .node_nics
            .retain(|nic| nic != "x3000c0s19b0");
        let report = verify(&sls, &components_fixture(), &endpoints_fixture());

        let bmcs = check(&report.river[0], "NodeBMCs");
        assert_eq!(
            bmcs.errors,
            vec!["- x3000c0s19b0 - No mgmt port connection."]
        );
    }

    #[test]
    fn missing_pdu_is_warning_only() {
        let comps: Vec<Component> = components_fixture()
            .into_iter()
            .filter(|c| c.id != "x3000m0")
            .collect();
        let endpoints: Vec<RedfishEndpoint> = endpoints_fixture()
            .into_iter()
            .filter(|e| e.id != "x3000m0")
            .collect();
        let report = verify(&sls_fixture(), &comps, &endpoints);

        let pdus = check(&report.river[0], "CabinetPDUControllers");
        assert_eq!(pdus.status(), CheckStatus::Warning);
        assert_eq!(
            pdus.warnings,
            vec!["- x3000m0 - Not found in HSM Components; Not found in HSM Redfish Endpoints."]
        );
        assert_eq!(report.failure_count(), 0);
    }

    fn hill_fixture() -> (Vec<SlsHardware>, Vec<Component>, Vec<RedfishEndpoint>) {
        let sls = serde_json::from_value(serde_json::json!([
            {"Xname": "x5000", "TypeString": "Cabinet", "Class": "Hill"},
            {"Xname": "x5000c1", "TypeString": "ChassisBMC", "Class": "Hill"},
            {"Xname": "x5000c3", "TypeString": "ChassisBMC", "Class": "Hill"},
            {"Xname": "x5000c1s0b0n0", "Parent": "x5000c1s0b0", "TypeString": "Node",
             "Class": "Hill", "ExtraProperties": {"Role": "Compute", "NID": 1000}},
        ]))
        .unwrap();
        let comps = serde_json::from_value::<crate::hsm::ComponentList>(serde_json::json!({
            "Components": [
                {"ID": "x5000c1", "Type": "ChassisBMC"},
                {"ID": "x5000c3", "Type": "ChassisBMC"},
                {"ID": "x5000c1s0b0n0", "Type": "Node", "Role": "Compute"},
                {"ID": "x5000c1s0b0", "Type": "NodeBMC"},
            ]
        }))
        .unwrap()
        .components;
        // Redfish endpoint inventory uses the b0-suffixed chassis form.
        let endpoints = serde_json::from_value::<crate::hsm::RedfishEndpointList>(
            serde_json::json!({
                "RedfishEndpoints": [
                    {"ID": "x5000c1b0"},
                    {"ID": "x5000c3b0"},
                    {"ID": "x5000c1s0b0"},
                ]
            }),
        )
        .unwrap()
        .endpoints;
        (sls, comps, endpoints)
    }

    #[test]
    fn healthy_hill_cabinet_passes_with_suffixed_endpoints() {
        let (sls, comps, endpoints) = hill_fixture();
        let report = verify(&sls, &comps, &endpoints);
        assert!(report.river.is_empty());
        assert_eq!(report.failure_count(), 0);
        let chassis = check(&report.mountain[0], "ChassisBMCs");
        assert_eq!(chassis.status(), CheckStatus::Pass);
    }

    #[test]
    fn hill_cabinet_missing_expected_chassis_fails() {
        let (mut sls, mut comps, mut endpoints) = hill_fixture();
        sls.retain(|hw| hw.xname != "x5000c3");
        comps.retain(|c| c.id != "x5000c3");
        endpoints.retain(|e| e.id != "x5000c3b0");
        let report = verify(&sls, &comps, &endpoints);

        let chassis = check(&report.mountain[0], "ChassisBMCs");
        assert_eq!(
            chassis.errors,
            vec!["- x5000c3 - Not found in SLS Hardware; Not found in HSM Components; Not found in HSM Redfish Endpoints."]
        );
        assert_eq!(report.failure_count(), 1);
    }

    #[test]
    fn mountain_node_absence_is_warning() {
        let (sls, mut comps, endpoints) = hill_fixture();
        comps.retain(|c| c.id != "x5000c1s0b0n0");
        let report = verify(&sls, &comps, &endpoints);

        let nodes = check(&report.mountain[0], "Nodes");
        assert_eq!(nodes.status(), CheckStatus::Warning);
        assert!(nodes.warnings[0].contains("x5000c1s0b0n0 (Compute, NID 1000)"));
        assert_eq!(report.failure_count(), 0);
    }

    #[test]
    fn summary_counts_by_type_and_role() {
        let report = verify(&sls_fixture(), &components_fixture(), &endpoints_fixture());
        let summary = &report.summaries[0];
        assert_eq!(summary.cabinet, "x3000");
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.mgmt_nodes, 1);
        assert_eq!(summary.compute_nodes, 1);
        assert_eq!(summary.app_nodes, 0);
        assert_eq!(summary.node_bmcs, 2);
        assert_eq!(summary.router_bmcs, 1);
        assert_eq!(summary.pdu_controllers, 1);
    }

    #[test]
    fn cabinets_sort_by_xname() {
        let sls: Vec<SlsHardware> = serde_json::from_value(serde_json::json!([
            {"Xname": "x3001", "TypeString": "Cabinet", "Class": "River"},
            {"Xname": "x1000", "TypeString": "Cabinet", "Class": "Mountain"},
        ]))
        .unwrap();
        let report = verify(&sls, &[], &[]);
        assert_eq!(report.summaries[0].cabinet, "x1000");
        assert_eq!(report.summaries[1].cabinet, "x3001");
    }
}
