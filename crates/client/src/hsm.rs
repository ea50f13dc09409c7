//! Client for the hardware state manager (HSM) v2 API.

use ridgeline_core::hsm::{
    Component, ComponentList, EthernetInterface, LockRequest, LockResponse, RedfishEndpoint,
    RedfishEndpointList,
};

use crate::config::GatewayConfig;
use crate::http::{self, ApiError};

/// Bearer-authenticated HSM client.
pub struct HsmClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HsmClient {
    pub fn new(config: &GatewayConfig, token: String) -> Self {
        Self::with_client(reqwest::Client::new(), config, token)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling when a
    /// tool also talks to SLS through the same gateway).
    pub fn with_client(client: reqwest::Client, config: &GatewayConfig, token: String) -> Self {
        Self {
            client,
            base_url: config.hsm_url(),
            token,
        }
    }

    /// `GET State/Components`, optionally filtered (e.g.
    /// `[("type", "Node"), ("role", "Management")]`).
    pub async fn components(&self, params: &[(&str, &str)]) -> Result<Vec<Component>, ApiError> {
        let response = self
            .client
            .get(format!("{}/State/Components", self.base_url))
            .query(params)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let list: ComponentList = http::parse_response(response).await?;
        Ok(list.components)
    }

    /// `GET Inventory/RedfishEndpoints`, optionally filtered by `type`
    /// or `id`.
    pub async fn redfish_endpoints(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<RedfishEndpoint>, ApiError> {
        let response = self
            .client
            .get(format!("{}/Inventory/RedfishEndpoints", self.base_url))
            .query(params)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let list: RedfishEndpointList = http::parse_response(response).await?;
        Ok(list.endpoints)
    }

    /// `GET Inventory/EthernetInterfaces`, optionally filtered by
    /// `type` or `MACAddress`. Returns a bare array on the wire.
    pub async fn ethernet_interfaces(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<EthernetInterface>, ApiError> {
        let response = self
            .client
            .get(format!("{}/Inventory/EthernetInterfaces", self.base_url))
            .query(params)
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::parse_response(response).await
    }

    /// `DELETE Inventory/EthernetInterfaces/{id}`.
    pub async fn delete_ethernet_interface(&self, id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(format!(
                "{}/Inventory/EthernetInterfaces/{id}",
                self.base_url
            ))
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::check_status(response).await
    }

    /// `POST locks/lock`.
    pub async fn lock_components(&self, request: &LockRequest) -> Result<LockResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/locks/lock", self.base_url))
            .json(request)
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::parse_response(response).await
    }
}
