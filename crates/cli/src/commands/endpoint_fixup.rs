//! `endpoint-fixup`: repair river BMCs with stale discovery records.
//!
//! A BMC whose ethernet interface is known to HSM and which answers
//! ping, but which has no Redfish endpoint, never got picked up by the
//! discovery job. Deleting the interface entry forces DHCP to re-learn
//! it, which re-triggers discovery; the command then waits for both
//! records to reappear.

use std::process::ExitCode;

use anyhow::Context as _;
use ridgeline_client::hsm::HsmClient;
use ridgeline_client::ping;
use ridgeline_client::sls::SlsClient;
use ridgeline_core::fixup::{self, REPOPULATE_ATTEMPTS, REPOPULATE_INTERVAL};
use ridgeline_core::hsm::EthernetInterface;

const TROUBLESHOOTING_DOC: &str =
    "https://github.com/Cray-HPE/docs-csm/blob/main/troubleshooting/known_issues/discovery_job_not_creating_redfish_endpoints.md";
const TOKEN_DOC: &str =
    "https://github.com/Cray-HPE/docs-csm/blob/main/operations/security_and_authentication/Retrieve_an_Authentication_Token.md";

pub async fn run() -> anyhow::Result<ExitCode> {
    let (config, token) = match super::authenticate().await {
        Ok(session) => session,
        Err(error) => {
            println!("\nFor troubleshooting and manual steps, see {TOKEN_DOC}\n");
            return Err(error);
        }
    };
    let hsm = HsmClient::new(&config, token.clone());
    let sls = SlsClient::new(&config, token);

    let bmc_types = [("type", "NodeBMC"), ("type", "RouterBMC")];
    let endpoints = hsm
        .redfish_endpoints(&bmc_types)
        .await
        .context("fetching HSM Redfish endpoints")?;
    let interfaces = hsm
        .ethernet_interfaces(&bmc_types)
        .await
        .context("fetching HSM ethernet interfaces")?;
    let river_nodes = sls
        .search_hardware(&[("type", "comptype_node"), ("class", "River")])
        .await
        .context("fetching river nodes from SLS")?;

    let mut pending = Vec::new();
    for eth in fixup::candidates(&interfaces, &endpoints, &river_nodes) {
        if ping::is_reachable(&eth.component_id).await {
            pending.push(eth);
        } else {
            tracing::debug!(bmc = %eth.component_id, "Candidate BMC unreachable, skipping");
        }
    }

    if pending.is_empty() {
        println!("No river BMCs were found to need this RedfishEndpoint discovery fixup.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Found {} river BMCs to fix:", pending.len());
    println!(
        "    {}",
        pending
            .iter()
            .map(|eth| eth.component_id.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );

    // Delete the stale interface entries.
    println!(
        "Deleting {} EthernetInterfaces entries from HSM",
        pending.len()
    );
    let mut deleted = Vec::new();
    let mut delete_failures = Vec::new();
    for eth in pending {
        match hsm.delete_ethernet_interface(&eth.id).await {
            Ok(()) => deleted.push(eth),
            Err(error) => {
                tracing::warn!(bmc = %eth.component_id, %error, "Delete failed");
                delete_failures.push(eth);
            }
        }
    }

    // Wait for DHCP to re-learn the interfaces, then for the discovery
    // job to recreate the Redfish endpoints.
    let (relearned, interface_timeouts) = if deleted.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        wait_for_interfaces(&hsm, &deleted).await
    };
    let (fixed, endpoint_timeouts) = if relearned.is_empty() {
        (Vec::new(), Vec::new())
    } else {
        wait_for_endpoints(&hsm, &relearned).await
    };

    print!(
        "{}",
        fixup::render_summary(&fixed, &delete_failures, &interface_timeouts, &endpoint_timeouts)
    );

    let errors = delete_failures.len() + interface_timeouts.len() + endpoint_timeouts.len();
    if errors > 0 {
        println!("\nFor troubleshooting and manual steps, see {TROUBLESHOOTING_DOC}\n");
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Poll until every pending interface reappears (matched by MAC), or
/// the attempts run out. Returns (reappeared, timed out).
async fn wait_for_interfaces<'a>(
    hsm: &HsmClient,
    pending: &[&'a EthernetInterface],
) -> (Vec<&'a EthernetInterface>, Vec<&'a EthernetInterface>) {
    let params: Vec<(&str, &str)> = pending
        .iter()
        .map(|eth| ("MACAddress", eth.mac_address.as_str()))
        .collect();

    let mut current = Vec::new();
    for attempt in 1..=REPOPULATE_ATTEMPTS {
        tracing::info!(attempt, "Waiting for EthernetInterfaces to be repopulated");
        tokio::time::sleep(REPOPULATE_INTERVAL).await;

        match hsm.ethernet_interfaces(&params).await {
            Ok(interfaces) => {
                if interfaces.len() == pending.len() {
                    return (pending.to_vec(), Vec::new());
                }
                current = interfaces;
            }
            Err(error) => {
                tracing::warn!(attempt, %error, "EthernetInterfaces poll failed");
            }
        }
    }

    fixup::split_by_interface(pending, &current)
}

/// Poll until every pending BMC has a Redfish endpoint again (matched
/// by component ID), or the attempts run out.
async fn wait_for_endpoints<'a>(
    hsm: &HsmClient,
    pending: &[&'a EthernetInterface],
) -> (Vec<&'a EthernetInterface>, Vec<&'a EthernetInterface>) {
    let params: Vec<(&str, &str)> = pending
        .iter()
        .map(|eth| ("id", eth.component_id.as_str()))
        .collect();

    let mut current = Vec::new();
    for attempt in 1..=REPOPULATE_ATTEMPTS {
        tracing::info!(attempt, "Waiting for RedfishEndpoints to be repopulated");
        tokio::time::sleep(REPOPULATE_INTERVAL).await;

        match hsm.redfish_endpoints(&params).await {
            Ok(endpoints) => {
                if endpoints.len() == pending.len() {
                    return (pending.to_vec(), Vec::new());
                }
                current = endpoints;
            }
            Err(error) => {
                tracing::warn!(attempt, %error, "RedfishEndpoints poll failed");
            }
        }
    }

    fixup::split_by_endpoint(pending, &current)
}
