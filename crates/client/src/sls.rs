//! Client for the system layout service (SLS) v1 API.

use ridgeline_core::sls::{SlsHardware, SlsNetwork};

use crate::config::GatewayConfig;
use crate::http::{self, ApiError};

/// Bearer-authenticated SLS client.
pub struct SlsClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl SlsClient {
    pub fn new(config: &GatewayConfig, token: String) -> Self {
        Self::with_client(reqwest::Client::new(), config, token)
    }

    pub fn with_client(client: reqwest::Client, config: &GatewayConfig, token: String) -> Self {
        Self {
            client,
            base_url: config.sls_url(),
            token,
        }
    }

    /// `GET hardware` -- the full layout dump.
    pub async fn hardware(&self) -> Result<Vec<SlsHardware>, ApiError> {
        let response = self
            .client
            .get(format!("{}/hardware", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::parse_response(response).await
    }

    /// `GET search/hardware` with query filters (e.g.
    /// `[("type", "comptype_node"), ("class", "River")]`).
    pub async fn search_hardware(
        &self,
        params: &[(&str, &str)],
    ) -> Result<Vec<SlsHardware>, ApiError> {
        let response = self
            .client
            .get(format!("{}/search/hardware", self.base_url))
            .query(params)
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::parse_response(response).await
    }

    /// `GET networks`.
    pub async fn networks(&self) -> Result<Vec<SlsNetwork>, ApiError> {
        let response = self
            .client
            .get(format!("{}/networks", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::parse_response(response).await
    }

    /// `PUT networks/{name}` -- SLS takes whole-network writes only.
    pub async fn put_network(&self, network: &SlsNetwork) -> Result<(), ApiError> {
        let response = self
            .client
            .put(format!("{}/networks/{}", self.base_url, network.name))
            .json(network)
            .bearer_auth(&self.token)
            .send()
            .await?;

        http::check_status(response).await
    }
}
