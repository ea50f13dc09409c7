//! Candidate selection and bookkeeping for the river Redfish-endpoint
//! discovery fixup.
//!
//! A BMC needs fixing when HSM learned its ethernet interface over
//! DHCP but the discovery job never produced a Redfish endpoint for
//! it. Deleting the stale interface entry makes the next DHCP lease
//! re-trigger discovery; the tool then waits for both records to
//! reappear.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::Duration;

use crate::hsm::{EthernetInterface, RedfishEndpoint};
use crate::sls::SlsHardware;

/// Attempts made while waiting for HSM records to be repopulated.
pub const REPOPULATE_ATTEMPTS: u32 = 5;
/// Delay between repopulation polls.
pub const REPOPULATE_INTERVAL: Duration = Duration::from_secs(60);

/// Interfaces whose BMCs are fixup candidates: the interface has an IP
/// address, the BMC has no Redfish endpoint, and some river node names
/// the BMC as its parent. Reachability is checked separately by the
/// caller (it needs the network).
pub fn candidates<'a>(
    interfaces: &'a [EthernetInterface],
    endpoints: &[RedfishEndpoint],
    river_nodes: &[SlsHardware],
) -> Vec<&'a EthernetInterface> {
    let endpoint_ids: HashSet<&str> = endpoints.iter().map(|e| e.id.as_str()).collect();
    let river_bmcs: HashSet<&str> = river_nodes
        .iter()
        .filter(|hw| !hw.parent.is_empty())
        .map(|hw| hw.parent.as_str())
        .collect();

    interfaces
        .iter()
        .filter(|eth| eth.has_ip())
        .filter(|eth| !endpoint_ids.contains(eth.component_id.as_str()))
        .filter(|eth| river_bmcs.contains(eth.component_id.as_str()))
        .collect()
}

/// Split `pending` into (reappeared, still missing) according to the
/// interface inventory returned by the latest poll, matching on
/// interface ID.
pub fn split_by_interface<'a>(
    pending: &[&'a EthernetInterface],
    current: &[EthernetInterface],
) -> (Vec<&'a EthernetInterface>, Vec<&'a EthernetInterface>) {
    let present: HashSet<&str> = current.iter().map(|e| e.id.as_str()).collect();
    pending
        .iter()
        .copied()
        .partition(|eth| present.contains(eth.id.as_str()))
}

/// Split `pending` into (discovered, still missing) according to the
/// Redfish endpoint inventory, matching on the owning component.
pub fn split_by_endpoint<'a>(
    pending: &[&'a EthernetInterface],
    endpoints: &[RedfishEndpoint],
) -> (Vec<&'a EthernetInterface>, Vec<&'a EthernetInterface>) {
    let present: HashSet<&str> = endpoints.iter().map(|e| e.id.as_str()).collect();
    pending
        .iter()
        .copied()
        .partition(|eth| present.contains(eth.component_id.as_str()))
}

fn id_lines(bmcs: &[&EthernetInterface]) -> String {
    let ids: Vec<&str> = bmcs.iter().map(|eth| eth.component_id.as_str()).collect();
    format!("    {}", ids.join(","))
}

/// Operator-facing summary of a fixup run.
pub fn render_summary(
    fixed: &[&EthernetInterface],
    delete_failures: &[&EthernetInterface],
    interface_timeouts: &[&EthernetInterface],
    endpoint_timeouts: &[&EthernetInterface],
) -> String {
    let mut out = String::new();

    out.push_str("Operation Summary\n");
    out.push_str("=================\n");

    if !delete_failures.is_empty() {
        let _ = writeln!(
            out,
            "Failed to delete EthernetInterface from HSM for {} BMCs:",
            delete_failures.len()
        );
        let _ = writeln!(out, "{}", id_lines(delete_failures));
    }

    if !interface_timeouts.is_empty() {
        let _ = writeln!(
            out,
            "Timeout waiting for EthernetInterface creation for {} BMCs:",
            interface_timeouts.len()
        );
        let _ = writeln!(out, "{}", id_lines(interface_timeouts));
    }

    if !endpoint_timeouts.is_empty() {
        let _ = writeln!(
            out,
            "Timeout waiting for RedfishEndpoint creation for {} BMCs:",
            endpoint_timeouts.len()
        );
        let _ = writeln!(out, "{}", id_lines(endpoint_timeouts));
    }

    if fixed.is_empty() {
        out.push_str("Redfish endpoint discovery fixup succeeded for 0 BMCs\n");
    } else {
        let _ = writeln!(
            out,
            "Redfish endpoint discovery fixup succeeded for {} BMCs:",
            fixed.len()
        );
        let _ = writeln!(out, "{}", id_lines(fixed));
    }

    out
}
