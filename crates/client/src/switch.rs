//! Session client for the Aruba AOS-CX switch REST API (v10.04).
//!
//! The switch API is cookie-authenticated: `POST login` establishes a
//! session that subsequent calls reuse. Management switches present
//! self-signed certificates, so verification is disabled for this
//! client only.

use std::collections::BTreeMap;
use std::time::Duration;

use ridgeline_core::bgp::{BgpRouterBody, PrefixListBody, PrefixListEntryBody, RouteMapEntryBody};

use crate::http::{self, ApiError};

const API_VERSION: &str = "v10.04";

/// Timeout on the initial login request only; a wrong switch address
/// fails fast here rather than mid-run.
const LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// A cookie session against one switch.
pub struct SwitchClient {
    client: reqwest::Client,
    base_url: String,
    address: String,
}

impl SwitchClient {
    /// Build a client for the switch at `address`. No traffic is sent
    /// until [`login`](Self::login).
    pub fn connect(address: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("https://{address}/rest/{API_VERSION}"),
            address: address.to_string(),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `POST login` with form credentials; the session cookie is kept
    /// in the client's store.
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&[("username", username), ("password", password)])
            .timeout(LOGIN_TIMEOUT)
            .send()
            .await?;

        http::check_status(response).await?;
        tracing::info!(switch = %self.address, "Switch login succeeded");
        Ok(())
    }

    /// `POST logout`. Best effort; the session expires on its own.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .send()
            .await?;
        http::check_status(response).await
    }

    // ---- BGP router ----

    pub async fn delete_bgp_router(&self, asn: u32) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!(
                "{}/system/vrfs/default/bgp_routers/{asn}",
                self.base_url
            ))
            .send()
            .await?;
        http::check_status(response).await
    }

    pub async fn create_bgp_router(&self, body: &BgpRouterBody) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/system/vrfs/default/bgp_routers", self.base_url))
            .json(body)
            .send()
            .await?;
        http::check_status(response).await
    }

    pub async fn create_bgp_neighbor(
        &self,
        asn: u32,
        body: &serde_json::Value,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/system/vrfs/default/bgp_routers/{asn}/bgp_neighbors",
                self.base_url
            ))
            .json(body)
            .send()
            .await?;
        http::check_status(response).await
    }

    // ---- prefix lists ----

    /// Names of the prefix lists currently on the switch.
    pub async fn prefix_lists(&self) -> Result<Vec<String>, ApiError> {
        self.list_names("system/prefix_lists").await
    }

    pub async fn delete_prefix_list(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!("{}/system/prefix_lists/{name}", self.base_url))
            .send()
            .await?;
        http::check_status(response).await
    }

    pub async fn create_prefix_list(&self, body: &PrefixListBody) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/system/prefix_lists", self.base_url))
            .json(body)
            .send()
            .await?;
        http::check_status(response).await
    }

    pub async fn create_prefix_list_entry(
        &self,
        list: &str,
        body: &PrefixListEntryBody,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/system/prefix_lists/{list}/prefix_list_entries",
                self.base_url
            ))
            .json(body)
            .send()
            .await?;
        http::check_status(response).await
    }

    // ---- route maps ----

    /// Names of the route maps currently on the switch.
    pub async fn route_maps(&self) -> Result<Vec<String>, ApiError> {
        self.list_names("system/route_maps").await
    }

    pub async fn delete_route_map(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!("{}/system/route_maps/{name}", self.base_url))
            .send()
            .await?;
        http::check_status(response).await
    }

    pub async fn create_route_map(&self, name: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!("{}/system/route_maps", self.base_url))
            .json(&serde_json::json!({ "name": name }))
            .send()
            .await?;
        http::check_status(response).await
    }

    pub async fn create_route_map_entry(
        &self,
        map: &str,
        body: &RouteMapEntryBody,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(format!(
                "{}/system/route_maps/{map}/route_map_entries",
                self.base_url
            ))
            .json(body)
            .send()
            .await?;
        http::check_status(response).await
    }

    // ---- system ----

    /// Current firmware version string from `GET firmware`.
    pub async fn firmware_version(&self) -> Result<String, ApiError> {
        let response = self
            .client
            .get(format!("{}/firmware", self.base_url))
            .send()
            .await?;

        #[derive(serde::Deserialize)]
        struct Firmware {
            current_version: String,
        }
        let firmware: Firmware = http::parse_response(response).await?;
        Ok(firmware.current_version)
    }

    /// Persist the running configuration to the startup configuration.
    pub async fn save_config(&self) -> Result<(), ApiError> {
        let response = self
            .client
            .put(format!("{}/fullconfigs/startup-config", self.base_url))
            .query(&[("from", format!("/rest/{API_VERSION}/fullconfigs/running-config"))])
            .send()
            .await?;
        http::check_status(response).await
    }

    /// Collection endpoints return an object keyed by element name.
    async fn list_names(&self, path: &str) -> Result<Vec<String>, ApiError> {
        let response = self
            .client
            .get(format!("{}/{path}", self.base_url))
            .send()
            .await?;

        let entries: BTreeMap<String, serde_json::Value> = http::parse_response(response).await?;
        Ok(entries.into_keys().collect())
    }
}
