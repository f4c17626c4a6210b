use crate::constants::{Chain, DEFAULT_CHAIN, ETH_RPC_URL, PEANUT_API_URL};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

const DEFAULT_APP_URL: &str = "http://localhost:4040";

/// How amount-bearing links are minted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkMode {
    /// Register the request with the external service, link by identifier.
    #[default]
    Tracked,
    /// Encode the request in the path.
    Simple,
}

impl std::str::FromStr for LinkMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracked" => Ok(LinkMode::Tracked),
            "simple" => Ok(LinkMode::Simple),
            _ => Err(ConfigError::InvalidValue {
                name: "LINK_MODE",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            LinkMode::Tracked => "tracked",
            LinkMode::Simple => "simple",
        })
    }
}

/// Settings shared by every link producer.
#[derive(Clone)]
pub struct AppConfig {
    /// Public base URL that generated links point at
    pub app_base_url: Url,
    /// External payment-request service base URL
    pub api_url: Url,
    /// External service key (None = tracked requests unavailable)
    pub api_key: Option<String>,
    /// Chain for links that do not name one
    pub default_chain: Chain,
    pub link_mode: LinkMode,
    /// Mainnet RPC for ENS name lookups
    pub eth_rpc_url: Url,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("app_base_url", &self.app_base_url.as_str())
            .field("api_url", &self.api_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("default_chain", &self.default_chain)
            .field("link_mode", &self.link_mode)
            .field("eth_rpc_url", &self.eth_rpc_url.as_str())
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_base_url: Url::parse(DEFAULT_APP_URL).expect("static URL"),
            api_url: Url::parse(PEANUT_API_URL).expect("static URL"),
            api_key: None,
            default_chain: DEFAULT_CHAIN,
            link_mode: LinkMode::Tracked,
            eth_rpc_url: Url::parse(ETH_RPC_URL).expect("static URL"),
        }
    }
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    #[cfg(feature = "full")]
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app_base_url = match var("APP_URL") {
            Some(value) => parse_url("APP_URL", value)?,
            None => {
                let port = var("PORT").unwrap_or_else(|| "4040".to_string());
                parse_url("APP_URL", format!("http://localhost:{port}"))?
            }
        };

        let api_url = parse_url(
            "PEANUT_API_URL",
            var("PEANUT_API_URL").unwrap_or_else(|| PEANUT_API_URL.to_string()),
        )?;

        let api_key = var("PEANUT_API_KEY");

        let default_chain = match var("DEFAULT_CHAIN") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "DEFAULT_CHAIN",
                value,
            })?,
            None => DEFAULT_CHAIN,
        };

        let link_mode = match var("LINK_MODE") {
            Some(value) => value.parse()?,
            None => LinkMode::default(),
        };

        let eth_rpc_url = parse_url(
            "ETH_RPC_URL",
            var("ETH_RPC_URL").unwrap_or_else(|| ETH_RPC_URL.to_string()),
        )?;

        if api_key.is_none() && link_mode == LinkMode::Tracked {
            tracing::warn!(
                "PEANUT_API_KEY not set: tracked links and request lookups are unavailable"
            );
        }

        Ok(Self {
            app_base_url,
            api_url,
            api_key,
            default_chain,
            link_mode,
            eth_rpc_url,
        })
    }
}

fn parse_url(name: &'static str, value: String) -> Result<Url, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(url),
        _ => Err(ConfigError::InvalidUrl { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.app_base_url.as_str(), "http://localhost:4040/");
        assert_eq!(config.api_url.as_str(), "https://api.peanut.to/");
        assert_eq!(config.api_key, None);
        assert_eq!(config.default_chain, Chain::Optimism);
        assert_eq!(config.link_mode, LinkMode::Tracked);
        assert_eq!(config.eth_rpc_url.as_str(), "https://cloudflare-eth.com/");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APP_URL", "https://pay.example.com"),
            ("PEANUT_API_KEY", "secret"),
            ("DEFAULT_CHAIN", "Arbitrum"),
            ("LINK_MODE", "simple"),
        ]))
        .unwrap();
        assert_eq!(config.app_base_url.host_str(), Some("pay.example.com"));
        assert_eq!(config.default_chain, Chain::Arbitrum);
        assert_eq!(config.link_mode, LinkMode::Simple);
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn test_port_feeds_default_app_url() {
        let config = AppConfig::from_lookup(lookup(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.app_base_url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("APP_URL", "not a url")])),
            Err(ConfigError::InvalidUrl { name: "APP_URL", .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("DEFAULT_CHAIN", "solana")])),
            Err(ConfigError::InvalidValue { name: "DEFAULT_CHAIN", .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("ETH_RPC_URL", "ws://node")])),
            Err(ConfigError::InvalidUrl { name: "ETH_RPC_URL", .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("LINK_MODE", "fancy")])),
            Err(ConfigError::InvalidValue { name: "LINK_MODE", .. })
        ));
    }
}
