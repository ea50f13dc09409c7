//! Environment-derived client configuration.

/// Base URL of the management API gateway fronting HSM, SLS, and
/// Keycloak.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    base_url: String,
}

/// Environment variable overriding the gateway base URL.
pub const GATEWAY_URL_ENV: &str = "RIDGELINE_GATEWAY_URL";

const DEFAULT_GATEWAY_URL: &str = "https://api-gw-service-nmn.local";

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new(DEFAULT_GATEWAY_URL)
    }
}

impl GatewayConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read the gateway URL from the environment, falling back to the
    /// in-cluster default.
    pub fn from_env() -> Self {
        match std::env::var(GATEWAY_URL_ENV) {
            Ok(url) if !url.is_empty() => Self::new(&url),
            _ => Self::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Keycloak token endpoint for the management realm.
    pub fn token_url(&self) -> String {
        format!(
            "{}/keycloak/realms/shasta/protocol/openid-connect/token",
            self.base_url
        )
    }

    /// HSM v2 API root.
    pub fn hsm_url(&self) -> String {
        format!("{}/apis/smd/hsm/v2", self.base_url)
    }

    /// SLS v1 API root.
    pub fn sls_url(&self) -> String {
        format!("{}/apis/sls/v1", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_points_at_the_gateway() {
        let config = GatewayConfig::default();
        assert_eq!(
            config.token_url(),
            "https://api-gw-service-nmn.local/keycloak/realms/shasta/protocol/openid-connect/token"
        );
        assert_eq!(
            config.hsm_url(),
            "https://api-gw-service-nmn.local/apis/smd/hsm/v2"
        );
        assert_eq!(
            config.sls_url(),
            "https://api-gw-service-nmn.local/apis/sls/v1"
        );
    }

    #[test]
    fn trailing_slash_is_normalised() {
        let config = GatewayConfig::new("https://gateway.example/");
        assert_eq!(config.base_url(), "https://gateway.example");
        assert_eq!(config.sls_url(), "https://gateway.example/apis/sls/v1");
    }
}
