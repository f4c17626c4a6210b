use paylink::{AppConfig, ConfigError};

const DEFAULT_PORT: u16 = 4040;
const DEFAULT_RATE_LIMIT_RPM: u32 = 60;

#[derive(Clone)]
pub struct ServerConfig {
    /// Link generation and external-service settings
    pub app: AppConfig,
    /// Server port
    pub port: u16,
    /// CORS allowed origins
    pub allowed_origins: Vec<String>,
    /// Rate limit requests per minute
    pub rate_limit_rpm: u32,
    /// Directory to serve SPA static files from (None = don't serve SPA)
    pub spa_dir: Option<String>,
    /// Bearer token required for /metrics endpoint (None = public)
    pub metrics_token: Option<String>,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("app", &self.app)
            .field("port", &self.port)
            .field("allowed_origins", &self.allowed_origins)
            .field("rate_limit_rpm", &self.rate_limit_rpm)
            .field("spa_dir", &self.spa_dir)
            .field(
                "metrics_token",
                &self.metrics_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let app = AppConfig::from_lookup(&lookup)?;

        let port = match var("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { name: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let allowed_origins: Vec<String> = var("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| {
                vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:8080".to_string(),
                    format!("http://localhost:{port}"),
                ]
            });

        let rate_limit_rpm = match var("RATE_LIMIT_RPM") {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(rpm) if rpm > 0 => rpm,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        name: "RATE_LIMIT_RPM",
                        value,
                    })
                }
            },
            None => DEFAULT_RATE_LIMIT_RPM,
        };

        let spa_dir = var("SPA_DIR");
        let metrics_token = var("METRICS_TOKEN");

        if allowed_origins.iter().any(|o| o == "*") {
            tracing::warn!("ALLOWED_ORIGINS contains '*': any site may call the API");
        }
        if metrics_token.is_none() {
            tracing::warn!("METRICS_TOKEN not set: /metrics endpoint is publicly accessible");
        }

        Ok(Self {
            app,
            port,
            allowed_origins,
            rate_limit_rpm,
            spa_dir,
            metrics_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<&str, &str> = vars.iter().copied().collect();
        ServerConfig::from_lookup(|name| map.get(name).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 4040);
        assert_eq!(config.rate_limit_rpm, 60);
        assert!(config
            .allowed_origins
            .contains(&"http://localhost:4040".to_string()));
        assert_eq!(config.spa_dir, None);
    }

    #[test]
    fn test_origins_are_split_and_trimmed() {
        let config = load(&[("ALLOWED_ORIGINS", "https://a.example, https://b.example,")]).unwrap();
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_bad_port_is_rejected() {
        assert!(matches!(
            load(&[("PORT", "eighty")]),
            Err(ConfigError::InvalidValue { name: "PORT", .. })
        ));
        assert!(matches!(
            load(&[("RATE_LIMIT_RPM", "0")]),
            Err(ConfigError::InvalidValue { name: "RATE_LIMIT_RPM", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("METRICS_TOKEN", "hunter2"), ("PEANUT_API_KEY", "pk-live")]).unwrap();
        let shown = format!("{config:?}");
        assert!(!shown.contains("hunter2"));
        assert!(!shown.contains("pk-live"));
    }
}
