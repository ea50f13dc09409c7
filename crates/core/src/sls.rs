//! Wire models for the system layout service (SLS) v1 API.
//!
//! The hardware dump is read-only for the tools, so only the fields
//! the reconciliation rules use are modelled. Network objects are
//! written back with `PUT` after reservation edits, so those types
//! carry a flattened map of every field this crate does not model --
//! a round trip must not drop service-owned data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::hsm::ComponentType;

/// Cooling/packaging class of a cabinet and its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum CabinetClass {
    River,
    Mountain,
    Hill,
}

impl std::fmt::Display for CabinetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CabinetClass::River => "River",
            CabinetClass::Mountain => "Mountain",
            CabinetClass::Hill => "Hill",
        };
        f.write_str(s)
    }
}

/// One entry of the SLS hardware dump (`GET /v1/hardware` returns a
/// flat array of these; `GET /v1/search/hardware` the matching subset).
#[derive(Debug, Clone, Deserialize)]
pub struct SlsHardware {
    #[serde(rename = "Xname")]
    pub xname: String,
    /// Xname of the enclosing component (a node's parent is its BMC).
    #[serde(rename = "Parent", default)]
    pub parent: String,
    #[serde(rename = "TypeString")]
    pub type_string: ComponentType,
    #[serde(rename = "Class")]
    pub class: Option<CabinetClass>,
    #[serde(rename = "ExtraProperties")]
    pub extra_properties: Option<ExtraProperties>,
}

/// Type-specific properties attached to an SLS hardware entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtraProperties {
    #[serde(rename = "Role")]
    pub role: Option<String>,
    #[serde(rename = "NID")]
    pub nid: Option<i64>,
    #[serde(rename = "Aliases", default)]
    pub aliases: Vec<String>,
    /// Xnames of BMCs cabled to this component's management ports.
    #[serde(rename = "NodeNics", default)]
    pub node_nics: Vec<String>,
}

impl SlsHardware {
    pub fn role(&self) -> Option<&str> {
        self.extra_properties.as_ref()?.role.as_deref()
    }

    pub fn nid(&self) -> Option<i64> {
        self.extra_properties.as_ref()?.nid
    }

    pub fn first_alias(&self) -> Option<&str> {
        self.extra_properties
            .as_ref()?
            .aliases
            .first()
            .map(String::as_str)
    }

    pub fn is_management(&self) -> bool {
        self.role() == Some("Management")
    }
}

/// An SLS network object (`GET /v1/networks`).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SlsNetwork {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "ExtraProperties")]
    pub extra_properties: Option<NetworkProperties>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NetworkProperties {
    #[serde(rename = "Subnets", default)]
    pub subnets: Vec<Subnet>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

/// A subnet within an SLS network.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Subnet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "FullName", default)]
    pub full_name: String,
    #[serde(rename = "CIDR")]
    pub cidr: String,
    /// Absent and empty are distinct on the wire; preserve whichever
    /// the service sent.
    #[serde(rename = "IPReservations", skip_serializing_if = "Option::is_none")]
    pub ip_reservations: Option<Vec<IpReservation>>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

/// A DNS A-record / alias reservation inside a subnet.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IpReservation {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "IPAddress")]
    pub ip_address: String,
    #[serde(rename = "Aliases", default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(flatten)]
    pub rest: BTreeMap<String, serde_json::Value>,
}

impl SlsNetwork {
    pub fn subnets(&self) -> &[Subnet] {
        self.extra_properties
            .as_ref()
            .map(|p| p.subnets.as_slice())
            .unwrap_or_default()
    }
}
