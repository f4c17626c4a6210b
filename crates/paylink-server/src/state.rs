use crate::config::ServerConfig;
use alloy::providers::RootProvider;
use paylink::{PaymentService, PeanutClient};
use std::sync::Arc;

/// Shared application state
pub struct AppState<S = PeanutClient> {
    pub config: Arc<ServerConfig>,
    /// External payment-request service
    pub service: S,
    /// Mainnet provider for ENS lookups
    pub ens: RootProvider,
}

impl AppState<PeanutClient> {
    /// State backed by the hosted Peanut API.
    pub fn new(config: ServerConfig) -> Self {
        let service = PeanutClient::new(config.app.api_url.clone(), config.app.api_key.clone());
        Self::with_service(config, service)
    }
}

impl<S: PaymentService> AppState<S> {
    pub fn with_service(config: ServerConfig, service: S) -> Self {
        let ens = RootProvider::new_http(config.app.eth_rpc_url.clone());
        Self {
            config: Arc::new(config),
            service,
            ens,
        }
    }

    /// Whether tracked requests can be minted and looked up.
    pub fn tracked_available(&self) -> bool {
        self.config.app.api_key.is_some()
    }
}
