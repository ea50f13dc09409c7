//! BGP configuration plan for the management switch pair.
//!
//! Derives, from the SLS network layout, the full set of prefix lists,
//! per-NCN route maps, and BGP neighbors that a management switch
//! should carry, as typed AOS-CX REST payloads. The plan is computed
//! once and applied to each switch; only the router ID and the VSX
//! peer neighbor differ between the two.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::sls::{SlsNetwork, Subnet};

/// Private ASN used for the management network fabric.
pub const MGMT_ASN: u32 = 65533;

const CAN_BOOTSTRAP: &str = "CAN Bootstrap DHCP Subnet";
const NMN_BOOTSTRAP: &str = "NMN Bootstrap DHCP Subnet";
const HMN_BOOTSTRAP: &str = "HMN Bootstrap DHCP Subnet";
const NMN_METALLB: &str = "NMN MetalLB";
const HMN_METALLB: &str = "HMN MetalLB";
const TFTP_RESERVATION: &str = "cray-tftp";

/// Errors from deriving the plan out of SLS data.
#[derive(Debug, thiserror::Error)]
pub enum BgpPlanError {
    #[error("subnet {0:?} not found in any SLS network")]
    MissingSubnet(&'static str),

    #[error("reservation {0:?} not found in the NMN MetalLB subnet")]
    MissingReservation(&'static str),

    #[error("no worker NCN has an address on all of NMN, HMN, and CAN")]
    NoWorkers,
}

/// The four prefixes advertised to the NCN peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPrefixes {
    pub can: String,
    pub hmn: String,
    pub nmn: String,
    /// Host route of the TFTP service address.
    pub tftp: String,
}

fn find_subnet<'a>(
    networks: &'a [SlsNetwork],
    full_name: &'static str,
) -> Result<&'a Subnet, BgpPlanError> {
    networks
        .iter()
        .flat_map(|n| n.subnets())
        .find(|s| s.full_name.contains(full_name))
        .ok_or(BgpPlanError::MissingSubnet(full_name))
}

/// Pull the CAN/HMN/NMN prefixes and the TFTP host route from SLS.
pub fn extract_prefixes(networks: &[SlsNetwork]) -> Result<NetworkPrefixes, BgpPlanError> {
    let can = find_subnet(networks, CAN_BOOTSTRAP)?.cidr.clone();
    let hmn = find_subnet(networks, HMN_METALLB)?.cidr.clone();
    let nmn_metallb = find_subnet(networks, NMN_METALLB)?;
    let nmn = nmn_metallb.cidr.clone();

    let tftp = nmn_metallb
        .ip_reservations
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|r| r.name.contains(TFTP_RESERVATION))
        .map(|r| format!("{}/32", r.ip_address))
        .ok_or(BgpPlanError::MissingReservation(TFTP_RESERVATION))?;

    Ok(NetworkPrefixes {
        can,
        hmn,
        nmn,
        tftp,
    })
}

/// A worker NCN with its address on each of the three peering networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerNcn {
    pub name: String,
    pub nmn_ip: String,
    pub hmn_ip: String,
    pub can_ip: String,
}

fn worker_addresses(networks: &[SlsNetwork], subnet_name: &'static str) -> BTreeMap<String, String> {
    let mut addresses = BTreeMap::new();
    let Ok(subnet) = find_subnet(networks, subnet_name) else {
        return addresses;
    };
    for reservation in subnet.ip_reservations.as_deref().unwrap_or_default() {
        if reservation.name.starts_with("ncn-w") {
            addresses.insert(reservation.name.clone(), reservation.ip_address.clone());
        }
    }
    addresses
}

/// Collect the worker NCNs, joined by reservation name across the NMN,
/// HMN, and CAN bootstrap subnets. Workers missing an address on any
/// of the three networks cannot peer and are skipped with a warning.
pub fn worker_ncns(networks: &[SlsNetwork]) -> Result<Vec<WorkerNcn>, BgpPlanError> {
    let nmn = worker_addresses(networks, NMN_BOOTSTRAP);
    let hmn = worker_addresses(networks, HMN_BOOTSTRAP);
    let can = worker_addresses(networks, CAN_BOOTSTRAP);

    let mut workers = Vec::new();
    for (name, nmn_ip) in &nmn {
        match (hmn.get(name), can.get(name)) {
            (Some(hmn_ip), Some(can_ip)) => workers.push(WorkerNcn {
                name: name.clone(),
                nmn_ip: nmn_ip.clone(),
                hmn_ip: hmn_ip.clone(),
                can_ip: can_ip.clone(),
            }),
            _ => {
                tracing::warn!(ncn = %name, "Worker NCN lacks an HMN or CAN reservation, skipping");
            }
        }
    }

    if workers.is_empty() {
        return Err(BgpPlanError::NoWorkers);
    }
    Ok(workers)
}

// ---------------------------------------------------------------------------
// AOS-CX REST payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BgpRouterBody {
    pub asn: u32,
    pub router_id: String,
    pub maximum_paths: u32,
    pub ibgp_distance: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrefixListBody {
    pub address_family: &'static str,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrefixListEntryBody {
    pub action: &'static str,
    pub ge: u8,
    pub le: u8,
    pub preference: u32,
    pub prefix: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteMapEntryBody {
    pub action: &'static str,
    pub match_ipv4_prefix_list: BTreeMap<String, String>,
    pub preference: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<RouteMapSet>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_clause: Option<RouteMapMatch>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteMapSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_next_hop_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_preference: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteMapMatch {
    pub ipv4_next_hop_address: String,
}

/// A prefix list and its entries.
#[derive(Debug, Clone)]
pub struct PrefixListPlan {
    pub name: String,
    pub entries: Vec<PrefixListEntryBody>,
}

/// A route map and its ordered entries.
#[derive(Debug, Clone)]
pub struct RouteMapPlan {
    pub name: String,
    pub entries: Vec<RouteMapEntryBody>,
}

/// One BGP neighbor to create on a switch.
#[derive(Debug, Clone)]
pub struct NeighborPlan {
    pub ip: String,
    /// Inbound route map, absent for the VSX peer.
    pub route_map: Option<String>,
    pub passive: bool,
}

/// Switch firmware generations differing in the neighbor payload's
/// address field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirmwareGen {
    V10_05,
    V10_06,
}

impl FirmwareGen {
    /// Map a firmware `current_version` string to a known generation.
    pub fn from_version(version: &str) -> Option<Self> {
        if version.contains("10.06") {
            Some(Self::V10_06)
        } else if version.contains("10.05") {
            Some(Self::V10_05)
        } else {
            None
        }
    }

    fn address_field(self) -> &'static str {
        match self {
            Self::V10_05 => "ip_or_group_name",
            Self::V10_06 => "ip_or_ifname_or_group_name",
        }
    }
}

impl NeighborPlan {
    /// VSX peering neighbor: the partner switch, active, no policy.
    pub fn vsx_peer(peer_ip: &str) -> Self {
        Self {
            ip: peer_ip.to_string(),
            route_map: None,
            passive: false,
        }
    }

    /// Request body for `POST .../bgp_routers/{asn}/bgp_neighbors`.
    pub fn body(&self, asn: u32, firmware: FirmwareGen) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(firmware.address_field().to_string(), json!(self.ip));
        body.insert("remote_as".to_string(), json!(asn));
        body.insert("shutdown".to_string(), json!(false));
        body.insert("activate".to_string(), json!({"ipv4-unicast": true}));
        if self.passive {
            body.insert("passive".to_string(), json!(true));
        }
        if let Some(route_map) = &self.route_map {
            body.insert(
                "route_maps".to_string(),
                json!({"ipv4-unicast": {"in": route_map_path(route_map)}}),
            );
        }
        serde_json::Value::Object(body)
    }
}

fn prefix_list_path(name: &str) -> String {
    format!("/rest/v10.04/system/prefix_lists/{name}")
}

fn route_map_path(name: &str) -> String {
    format!("/rest/v10.04/system/route_maps/{name}")
}

/// Everything to configure on one switch (router ID supplied at apply
/// time, VSX peer added per switch).
#[derive(Debug, Clone)]
pub struct BgpPlan {
    pub asn: u32,
    pub prefix_lists: Vec<PrefixListPlan>,
    pub route_maps: Vec<RouteMapPlan>,
    pub neighbors: Vec<NeighborPlan>,
}

impl BgpPlan {
    pub fn router_body(&self, router_id: &str) -> BgpRouterBody {
        BgpRouterBody {
            asn: self.asn,
            router_id: router_id.to_string(),
            maximum_paths: 8,
            ibgp_distance: 70,
        }
    }
}

fn prefix_match(list: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(list.to_string(), prefix_list_path(list))])
}

/// Build the static plan from the derived prefixes and worker set.
///
/// Route-map entry numbering: one TFTP entry per worker NMN address
/// (preference 10, 20, ..., local preference 1000, 1100, ...), then the
/// CAN, HMN, and NMN entries at the next three steps. The TFTP entries
/// pin traffic for the host route to whichever NCN currently announces
/// it, preferring earlier workers.
pub fn build_plan(prefixes: &NetworkPrefixes, workers: &[WorkerNcn]) -> BgpPlan {
    let prefix_lists = vec![
        PrefixListPlan {
            name: "pl-can".to_string(),
            entries: vec![PrefixListEntryBody {
                action: "permit",
                ge: 24,
                le: 0,
                preference: 10,
                prefix: prefixes.can.clone(),
            }],
        },
        PrefixListPlan {
            name: "pl-hmn".to_string(),
            entries: vec![PrefixListEntryBody {
                action: "permit",
                ge: 24,
                le: 0,
                preference: 20,
                prefix: prefixes.hmn.clone(),
            }],
        },
        PrefixListPlan {
            name: "pl-nmn".to_string(),
            entries: vec![PrefixListEntryBody {
                action: "permit",
                ge: 24,
                le: 0,
                preference: 30,
                prefix: prefixes.nmn.clone(),
            }],
        },
        PrefixListPlan {
            name: "tftp".to_string(),
            entries: vec![PrefixListEntryBody {
                action: "permit",
                ge: 32,
                le: 32,
                preference: 10,
                prefix: prefixes.tftp.clone(),
            }],
        },
    ];

    let tftp_count = workers.len() as u32;
    let mut route_maps = Vec::new();
    for worker in workers {
        let mut entries = Vec::new();
        for (k, peer) in workers.iter().enumerate() {
            entries.push(RouteMapEntryBody {
                action: "permit",
                match_ipv4_prefix_list: prefix_match("tftp"),
                preference: 10 * (k as u32 + 1),
                set: Some(RouteMapSet {
                    ipv4_next_hop_address: None,
                    local_preference: Some(1000 + 100 * k as u32),
                }),
                match_clause: Some(RouteMapMatch {
                    ipv4_next_hop_address: peer.nmn_ip.clone(),
                }),
            });
        }
        for (offset, (list, next_hop)) in [
            ("pl-can", &worker.can_ip),
            ("pl-hmn", &worker.hmn_ip),
            ("pl-nmn", &worker.nmn_ip),
        ]
        .into_iter()
        .enumerate()
        {
            entries.push(RouteMapEntryBody {
                action: "permit",
                match_ipv4_prefix_list: prefix_match(list),
                preference: 10 * tftp_count + 10 * (offset as u32 + 1),
                set: Some(RouteMapSet {
                    ipv4_next_hop_address: Some(next_hop.clone()),
                    local_preference: None,
                }),
                match_clause: None,
            });
        }
        route_maps.push(RouteMapPlan {
            name: worker.name.clone(),
            entries,
        });
    }

    let neighbors = workers
        .iter()
        .map(|worker| NeighborPlan {
            ip: worker.nmn_ip.clone(),
            route_map: Some(worker.name.clone()),
            passive: true,
        })
        .collect();

    BgpPlan {
        asn: MGMT_ASN,
        prefix_lists,
        route_maps,
        neighbors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn networks() -> Vec<SlsNetwork> {
        serde_json::from_value(serde_json::json!([
            {
                "Name": "CAN",
                "ExtraProperties": {"Subnets": [{
                    "Name": "bootstrap_dhcp",
                    "FullName": "CAN Bootstrap DHCP Subnet",
                    "CIDR": "10.102.4.0/24",
                    "IPReservations": [
                        {"Name": "ncn-w001", "IPAddress": "10.102.4.10"},
                        {"Name": "ncn-w002", "IPAddress": "10.102.4.11"},
                    ]
                }]}
            },
            {
                "Name": "HMN",
                "ExtraProperties": {"Subnets": [
                    {"Name": "bootstrap_dhcp", "FullName": "HMN Bootstrap DHCP Subnet",
                     "CIDR": "10.254.0.0/17",
                     "IPReservations": [
                        {"Name": "ncn-w002", "IPAddress": "10.254.1.20"},
                        {"Name": "ncn-w001", "IPAddress": "10.254.1.18"},
                     ]},
                    {"Name": "metallb", "FullName": "HMN MetalLB", "CIDR": "10.94.100.0/24"}
                ]}
            },
            {
                "Name": "NMN",
                "ExtraProperties": {"Subnets": [
                    {"Name": "bootstrap_dhcp", "FullName": "NMN Bootstrap DHCP Subnet",
                     "CIDR": "10.252.0.0/17",
                     "IPReservations": [
                        {"Name": "ncn-w001", "IPAddress": "10.252.1.10"},
                        {"Name": "ncn-w002", "IPAddress": "10.252.1.11"},
                        {"Name": "ncn-m001", "IPAddress": "10.252.1.4"},
                     ]},
                    {"Name": "metallb", "FullName": "NMN MetalLB", "CIDR": "10.92.100.0/24",
                     "IPReservations": [
                        {"Name": "cray-tftp", "IPAddress": "10.92.100.60"},
                     ]}
                ]}
            }
        ]))
        .unwrap()
    }

    #[test]
    fn prefixes_come_from_named_subnets() {
        let prefixes = extract_prefixes(&networks()).unwrap();
        assert_eq!(
            prefixes,
            NetworkPrefixes {
                can: "10.102.4.0/24".to_string(),
                hmn: "10.94.100.0/24".to_string(),
                nmn: "10.92.100.0/24".to_string(),
                tftp: "10.92.100.60/32".to_string(),
            }
        );
    }

    #[test]
    fn missing_metallb_subnet_is_an_error() {
        let mut networks = networks();
        networks.retain(|n| n.name != "HMN");
        assert!(matches!(
            extract_prefixes(&networks),
            Err(BgpPlanError::MissingSubnet(name)) if name.contains("HMN")
        ));
    }

    #[test]
    fn workers_join_by_name_across_subnet_order() {
        let workers = worker_ncns(&networks()).unwrap();
        assert_eq!(workers.len(), 2);
        // HMN listed ncn-w002 first; the join must still pair correctly.
        assert_eq!(workers[0].name, "ncn-w001");
        assert_eq!(workers[0].nmn_ip, "10.252.1.10");
        assert_eq!(workers[0].hmn_ip, "10.254.1.18");
        assert_eq!(workers[0].can_ip, "10.102.4.10");
    }

    #[test]
    fn worker_without_can_address_is_skipped() {
        let mut networks = networks();
        let can_subnets = &mut networks[0].extra_properties.as_mut().unwrap().subnets;
        can_subnets[0]
            .ip_reservations
            .as_mut()
            .unwrap()
            .retain(|r| r.name != "ncn-w002");

        let workers = worker_ncns(&networks).unwrap();
        assert_eq!(workers.len(), 1);
        assert_eq!(workers[0].name, "ncn-w001");
    }

    #[test]
    fn plan_numbering_follows_worker_count() {
        let prefixes = extract_prefixes(&networks()).unwrap();
        let workers = worker_ncns(&networks()).unwrap();
        let plan = build_plan(&prefixes, &workers);

        assert_eq!(plan.asn, MGMT_ASN);
        assert_eq!(plan.prefix_lists.len(), 4);
        assert_eq!(plan.route_maps.len(), 2);

        let entries = &plan.route_maps[0].entries;
        // Two TFTP entries, then CAN/HMN/NMN.
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].preference, 10);
        assert_eq!(entries[0].set.as_ref().unwrap().local_preference, Some(1000));
        assert_eq!(entries[1].preference, 20);
        assert_eq!(entries[1].set.as_ref().unwrap().local_preference, Some(1100));
        assert_eq!(entries[2].preference, 30); // pl-can
        assert_eq!(entries[3].preference, 40); // pl-hmn
        assert_eq!(entries[4].preference, 50); // pl-nmn
        assert_eq!(
            entries[4].set.as_ref().unwrap().ipv4_next_hop_address,
            Some("10.252.1.10".to_string())
        );

        assert_eq!(plan.neighbors.len(), 2);
        assert!(plan.neighbors.iter().all(|n| n.passive));
    }

    #[test]
    fn route_map_entry_serialises_match_keyword() {
        let entry = RouteMapEntryBody {
            action: "permit",
            match_ipv4_prefix_list: prefix_match("tftp"),
            preference: 10,
            set: Some(RouteMapSet {
                ipv4_next_hop_address: None,
                local_preference: Some(1000),
            }),
            match_clause: Some(RouteMapMatch {
                ipv4_next_hop_address: "10.252.1.10".to_string(),
            }),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["match"]["ipv4_next_hop_address"], "10.252.1.10");
        assert_eq!(
            value["match_ipv4_prefix_list"]["tftp"],
            "/rest/v10.04/system/prefix_lists/tftp"
        );
        assert_eq!(value["set"]["local_preference"], 1000);
        assert!(value["set"].get("ipv4_next_hop_address").is_none());
    }

    #[test]
    fn neighbor_body_varies_by_firmware() {
        let neighbor = NeighborPlan {
            ip: "10.252.1.10".to_string(),
            route_map: Some("ncn-w001".to_string()),
            passive: true,
        };

        let v6 = neighbor.body(MGMT_ASN, FirmwareGen::V10_06);
        assert_eq!(v6["ip_or_ifname_or_group_name"], "10.252.1.10");
        assert_eq!(v6["passive"], true);
        assert_eq!(
            v6["route_maps"]["ipv4-unicast"]["in"],
            "/rest/v10.04/system/route_maps/ncn-w001"
        );

        let v5 = neighbor.body(MGMT_ASN, FirmwareGen::V10_05);
        assert_eq!(v5["ip_or_group_name"], "10.252.1.10");
        assert!(v5.get("ip_or_ifname_or_group_name").is_none());
    }

    #[test]
    fn vsx_peer_carries_no_policy() {
        let body = NeighborPlan::vsx_peer("10.252.0.3").body(MGMT_ASN, FirmwareGen::V10_06);
        assert_eq!(body["ip_or_ifname_or_group_name"], "10.252.0.3");
        assert!(body.get("passive").is_none());
        assert!(body.get("route_maps").is_none());
        assert_eq!(body["remote_as"], MGMT_ASN);
    }

    #[test]
    fn firmware_parses_from_version_string() {
        assert_eq!(
            FirmwareGen::from_version("FL.10.06.0110"),
            Some(FirmwareGen::V10_06)
        );
        assert_eq!(
            FirmwareGen::from_version("FL.10.05.0021"),
            Some(FirmwareGen::V10_05)
        );
        assert_eq!(FirmwareGen::from_version("FL.10.08.1010"), None);
    }
}
