//! Bearer-token acquisition for gateway calls.
//!
//! The OAuth client secret for the admin client lives in a Kubernetes
//! secret; it is exchanged at Keycloak for an access token using the
//! client-credentials grant. An environment override for the secret
//! keeps the tools usable from outside the cluster (and in tests).

use std::collections::BTreeMap;
use std::path::Path;

use base64::Engine as _;
use serde::Deserialize;

use crate::config::GatewayConfig;
use crate::http::{self, ApiError};

/// OAuth client id used for all administrative API access.
pub const ADMIN_CLIENT_ID: &str = "admin-client";

/// Environment variable overriding the Kubernetes secret lookup.
pub const CLIENT_SECRET_ENV: &str = "RIDGELINE_CLIENT_SECRET";

/// Environment variable overriding the Kubernetes API server URL.
pub const K8S_API_URL_ENV: &str = "RIDGELINE_K8S_API_URL";

const SECRET_NAME: &str = "admin-client-auth";
const SECRET_NAMESPACE: &str = "default";
const SECRET_KEY: &str = "client-secret";
const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";
const DEFAULT_K8S_API_URL: &str = "https://kubernetes.default.svc";

/// Errors from secret lookup or the token exchange.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("failed to read service-account credentials: {0}")]
    ServiceAccount(#[source] std::io::Error),

    #[error("secret {SECRET_NAME} has no {SECRET_KEY} entry")]
    MissingSecretKey,

    #[error("secret {SECRET_NAME} is not valid base64-encoded UTF-8: {0}")]
    SecretDecode(String),

    #[error("token response carried no access_token")]
    MissingToken,
}

/// Obtain the admin client secret.
///
/// Prefers [`CLIENT_SECRET_ENV`]; otherwise reads the Kubernetes
/// secret through the API server with the in-cluster service-account
/// credentials.
pub async fn client_secret() -> Result<String, AuthError> {
    if let Ok(secret) = std::env::var(CLIENT_SECRET_ENV) {
        if !secret.is_empty() {
            tracing::debug!("Using client secret from {CLIENT_SECRET_ENV}");
            return Ok(secret);
        }
    }
    read_cluster_secret().await
}

async fn read_cluster_secret() -> Result<String, AuthError> {
    let sa_dir = Path::new(SERVICE_ACCOUNT_DIR);
    let sa_token = tokio::fs::read_to_string(sa_dir.join("token"))
        .await
        .map_err(AuthError::ServiceAccount)?;
    let ca_pem = tokio::fs::read(sa_dir.join("ca.crt"))
        .await
        .map_err(AuthError::ServiceAccount)?;

    let client = reqwest::Client::builder()
        .add_root_certificate(reqwest::Certificate::from_pem(&ca_pem)?)
        .build()?;

    let api_url = std::env::var(K8S_API_URL_ENV).unwrap_or_else(|_| DEFAULT_K8S_API_URL.into());
    let url = format!("{api_url}/api/v1/namespaces/{SECRET_NAMESPACE}/secrets/{SECRET_NAME}");

    let response = client
        .get(&url)
        .bearer_auth(sa_token.trim())
        .send()
        .await?;
    let secret: K8sSecret = http::parse_response(response).await?;

    let encoded = secret
        .data
        .get(SECRET_KEY)
        .ok_or(AuthError::MissingSecretKey)?;
    decode_secret(encoded)
}

/// Kubernetes secret object; `data` values are base64-encoded.
#[derive(Debug, Deserialize)]
struct K8sSecret {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

fn decode_secret(encoded: &str) -> Result<String, AuthError> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| AuthError::SecretDecode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| AuthError::SecretDecode(e.to_string()))
}

/// Keycloak client-credentials token exchange.
pub struct TokenClient {
    client: reqwest::Client,
    token_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

impl TokenClient {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_url: config.token_url(),
        }
    }

    /// Exchange the client secret for a bearer token.
    pub async fn fetch_token(&self, client_secret: &str) -> Result<String, AuthError> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", ADMIN_CLIENT_ID),
            ("client_secret", client_secret),
        ];

        let response = self.client.post(&self.token_url).form(&form).send().await?;
        let token: TokenResponse = http::parse_response(response).await?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_data_is_base64_decoded() {
        // "hunter2" in base64.
        assert_eq!(decode_secret("aHVudGVyMg==").unwrap(), "hunter2");
        assert_eq!(decode_secret(" aHVudGVyMg==\n").unwrap(), "hunter2");
    }

    #[test]
    fn invalid_secret_encoding_is_reported() {
        assert!(matches!(
            decode_secret("!!not-base64!!"),
            Err(AuthError::SecretDecode(_))
        ));
    }

    #[test]
    fn token_response_ignores_extra_fields() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "abc",
            "expires_in": 300,
            "token_type": "Bearer"
        }))
        .unwrap();
        assert_eq!(token.access_token.as_deref(), Some("abc"));
    }
}
