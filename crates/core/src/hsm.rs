//! Wire models for the hardware state manager (HSM) v2 API.
//!
//! Only the fields the tools actually read are modelled; everything
//! else in the service's responses is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Hardware type of a state component, as reported by HSM and SLS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ComponentType {
    Cabinet,
    Chassis,
    Node,
    #[serde(rename = "NodeBMC")]
    NodeBmc,
    #[serde(rename = "RouterBMC")]
    RouterBmc,
    #[serde(rename = "ChassisBMC")]
    ChassisBmc,
    CabinetPDUController,
    #[serde(other)]
    Other,
}

/// Response envelope of `GET State/Components`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentList {
    #[serde(rename = "Components", default)]
    pub components: Vec<Component>,
}

/// A single HSM state component.
#[derive(Debug, Clone, Deserialize)]
pub struct Component {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Type")]
    pub kind: ComponentType,
    #[serde(rename = "Role")]
    pub role: Option<String>,
    #[serde(rename = "NID")]
    pub nid: Option<i64>,
    /// Present (and `true`) when the component is locked against
    /// power/firmware operations.
    #[serde(rename = "Locked")]
    pub locked: Option<bool>,
}

/// Response envelope of `GET Inventory/RedfishEndpoints`.
#[derive(Debug, Clone, Deserialize)]
pub struct RedfishEndpointList {
    #[serde(rename = "RedfishEndpoints", default)]
    pub endpoints: Vec<RedfishEndpoint>,
}

/// A discovered Redfish endpoint (one per BMC).
#[derive(Debug, Clone, Deserialize)]
pub struct RedfishEndpoint {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "FQDN")]
    pub fqdn: Option<String>,
}

/// A DHCP-learned ethernet interface tracked by HSM.
///
/// `Inventory/EthernetInterfaces` returns these as a bare array.
#[derive(Debug, Clone, Deserialize)]
pub struct EthernetInterface {
    /// Interface identifier (normalised MAC), used as the DELETE key.
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "MACAddress")]
    pub mac_address: String,
    /// Xname of the component that owns the interface, empty if unknown.
    #[serde(rename = "ComponentID", default)]
    pub component_id: String,
    #[serde(rename = "IPAddresses", default)]
    pub ip_addresses: Vec<InterfaceIpAddress>,
}

/// One IP address entry on an ethernet interface.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceIpAddress {
    #[serde(rename = "IPAddress", default)]
    pub ip_address: String,
}

impl EthernetInterface {
    /// True if the interface has at least one non-empty IP address.
    pub fn has_ip(&self) -> bool {
        self.ip_addresses
            .first()
            .is_some_and(|ip| !ip.ip_address.is_empty())
    }
}

/// Request body of `POST locks/lock`.
#[derive(Debug, Clone, Serialize)]
pub struct LockRequest {
    #[serde(rename = "ComponentIDs")]
    pub component_ids: Vec<String>,
    /// `"rigid"` fails the whole request on any error; the tools use
    /// `"flexible"` so each component is attempted independently.
    #[serde(rename = "ProcessingModel")]
    pub processing_model: String,
}

impl LockRequest {
    pub fn flexible(component_ids: Vec<String>) -> Self {
        Self {
            component_ids,
            processing_model: "flexible".to_string(),
        }
    }
}

/// Response body of `POST locks/lock`.
#[derive(Debug, Clone, Deserialize)]
pub struct LockResponse {
    #[serde(rename = "Counts")]
    pub counts: LockCounts,
    #[serde(rename = "Success", default)]
    pub success: LockSuccess,
    #[serde(rename = "Failure", default)]
    pub failure: Vec<LockFailure>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockCounts {
    #[serde(rename = "Total", default)]
    pub total: u32,
    #[serde(rename = "Success", default)]
    pub success: u32,
    #[serde(rename = "Failure", default)]
    pub failure: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LockSuccess {
    #[serde(rename = "ComponentIDs", default)]
    pub component_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LockFailure {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Reason")]
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_list_parses_hsm_shape() {
        let list: ComponentList = serde_json::from_value(serde_json::json!({
            "Components": [
                {"ID": "x3000c0s9b0n0", "Type": "Node", "Role": "Management",
                 "NID": 100001, "Locked": true},
                {"ID": "x3000c0r15b0", "Type": "RouterBMC"},
                {"ID": "x3000m0p0", "Type": "CabinetPDU"},
            ]
        }))
        .unwrap();

        assert_eq!(list.components.len(), 3);
        assert_eq!(list.components[0].kind, ComponentType::Node);
        assert_eq!(list.components[0].locked, Some(true));
        assert_eq!(list.components[1].role, None);
        // Unmodelled hardware types fall into Other instead of failing.
        assert_eq!(list.components[2].kind, ComponentType::Other);
    }

    #[test]
    fn ethernet_interface_ip_presence() {
        let eth: EthernetInterface = serde_json::from_value(serde_json::json!({
            "ID": "b42e99dfecf0",
            "MACAddress": "b4:2e:99:df:ec:f0",
            "ComponentID": "x3000c0s9b0",
            "IPAddresses": [{"IPAddress": "10.254.1.20"}]
        }))
        .unwrap();
        assert!(eth.has_ip());

        let empty: EthernetInterface = serde_json::from_value(serde_json::json!({
            "ID": "b42e99dfecf1",
            "MACAddress": "b4:2e:99:df:ec:f1",
            "IPAddresses": [{"IPAddress": ""}]
        }))
        .unwrap();
        assert!(!empty.has_ip());
        assert_eq!(empty.component_id, "");
    }

    #[test]
    fn lock_request_serialises_processing_model() {
        let req = LockRequest::flexible(vec!["x3000c0s9b0n0".to_string()]);
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["ProcessingModel"], "flexible");
        assert_eq!(value["ComponentIDs"][0], "x3000c0s9b0n0");
    }

    #[test]
    fn lock_response_defaults_absent_sections() {
        let resp: LockResponse = serde_json::from_value(serde_json::json!({
            "Counts": {"Total": 1, "Success": 1, "Failure": 0}
        }))
        .unwrap();
        assert_eq!(resp.counts.success, 1);
        assert!(resp.success.component_ids.is_empty());
        assert!(resp.failure.is_empty());
    }
}
