//! Browser wallet (MetaMask and other EIP-1193 providers).
//!
//! Connection state lives in a signal so the header and payment page react to
//! account and chain changes made inside the wallet.

use alloy::primitives::{Address, TxHash};
use leptos::*;
use paylink::{
    ServiceError, TransferReceipt, UnsignedTransfer, WalletError, WalletSession, WalletStatus,
};
use wasm_bindgen::prelude::*;

const RECEIPT_POLL_MS: u32 = 2_000;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["window", "ethereum"], js_name = request)]
    async fn ethereum_request(args: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["window", "ethereum"], js_name = on)]
    fn ethereum_on(event: &str, handler: &Closure<dyn FnMut(JsValue)>) -> Result<(), JsValue>;
}

/// Whether the page has an injected provider.
pub fn is_available() -> bool {
    web_sys::window()
        .and_then(|w| js_sys::Reflect::get(&w, &"ethereum".into()).ok())
        .map(|e| !e.is_undefined() && !e.is_null())
        .unwrap_or(false)
}

async fn request(method: &str, params: serde_json::Value) -> Result<JsValue, WalletError> {
    if !is_available() {
        return Err(WalletError::Provider(
            "No Web3 wallet detected. Please install MetaMask.".to_string(),
        ));
    }

    let args = js_sys::Object::new();
    js_sys::Reflect::set(&args, &"method".into(), &method.into())
        .map_err(|e| WalletError::Provider(format!("Failed to build request: {:?}", e)))?;
    if !params.is_null() {
        let params = js_sys::JSON::parse(&params.to_string())
            .map_err(|e| WalletError::Provider(format!("Failed to encode params: {:?}", e)))?;
        js_sys::Reflect::set(&args, &"params".into(), &params)
            .map_err(|e| WalletError::Provider(format!("Failed to set params: {:?}", e)))?;
    }

    ethereum_request(&args).await.map_err(provider_error)
}

/// Map a thrown EIP-1193 error object onto [`WalletError`].
fn provider_error(err: JsValue) -> WalletError {
    let code = js_sys::Reflect::get(&err, &"code".into())
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64);
    let message = js_sys::Reflect::get(&err, &"message".into())
        .ok()
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    WalletError::classify(code, &message)
}

fn parse_hex_u64(value: &str) -> Option<u64> {
    let digits = value.trim().strip_prefix("0x").unwrap_or(value.trim());
    u64::from_str_radix(digits, 16).ok()
}

fn chain_id_from(value: &JsValue) -> Result<u64, WalletError> {
    value
        .as_string()
        .and_then(|s| parse_hex_u64(&s))
        .ok_or_else(|| WalletError::Provider(format!("Invalid chain id: {:?}", value)))
}

fn first_account(accounts: &JsValue) -> Option<Address> {
    js_sys::Array::from(accounts)
        .get(0)
        .as_string()
        .and_then(|a| a.parse().ok())
}

fn name_error(name: &str, err: ServiceError) -> WalletError {
    match err {
        ServiceError::NotFound(_) => WalletError::Provider(format!("No address is set for {name}")),
        other => WalletError::Provider(format!("Could not resolve {name}: {other}")),
    }
}

/// EIP-1193 wallet session.
#[derive(Clone, Copy)]
pub struct BrowserWallet {
    status: RwSignal<WalletStatus>,
}

impl Default for BrowserWallet {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserWallet {
    pub fn new() -> Self {
        Self {
            status: create_rw_signal(WalletStatus::Disconnected),
        }
    }

    /// Reactive connection state.
    pub fn status_signal(&self) -> ReadSignal<WalletStatus> {
        self.status.read_only()
    }

    /// Prompt for account access and read the active chain.
    pub async fn connect(&self) -> Result<WalletStatus, WalletError> {
        let accounts = request("eth_requestAccounts", serde_json::Value::Null).await?;
        let address = first_account(&accounts)
            .ok_or_else(|| WalletError::Provider("No accounts found".to_string()))?;
        let chain_id = chain_id_from(&request("eth_chainId", serde_json::Value::Null).await?)?;

        let status = WalletStatus::Connected { address, chain_id };
        self.status.set(status);
        Ok(status)
    }

    /// Forget the session. The provider keeps its own permission grant.
    pub fn disconnect(&self) {
        self.status.set(WalletStatus::Disconnected);
    }

    /// Follow account and chain changes made in the wallet UI.
    pub fn watch(&self) {
        if !is_available() {
            return;
        }
        let status = self.status;

        let on_accounts = Closure::<dyn FnMut(JsValue)>::new(move |accounts: JsValue| {
            let next = match (first_account(&accounts), status.get_untracked()) {
                (Some(address), WalletStatus::Connected { chain_id, .. }) => {
                    WalletStatus::Connected { address, chain_id }
                }
                (Some(_), WalletStatus::Disconnected) => return,
                (None, _) => WalletStatus::Disconnected,
            };
            status.set(next);
        });
        let on_chain = Closure::<dyn FnMut(JsValue)>::new(move |chain: JsValue| {
            if let (Ok(chain_id), WalletStatus::Connected { address, .. }) =
                (chain_id_from(&chain), status.get_untracked())
            {
                status.set(WalletStatus::Connected { address, chain_id });
            }
        });

        if let Err(e) = ethereum_on("accountsChanged", &on_accounts) {
            web_sys::console::warn_1(&format!("accountsChanged listener: {:?}", e).into());
        }
        if let Err(e) = ethereum_on("chainChanged", &on_chain) {
            web_sys::console::warn_1(&format!("chainChanged listener: {:?}", e).into());
        }
        // Listeners live as long as the page.
        on_accounts.forget();
        on_chain.forget();
    }

    fn set_chain(&self, chain_id: u64) {
        if let WalletStatus::Connected { address, .. } = self.status.get_untracked() {
            self.status.set(WalletStatus::Connected { address, chain_id });
        }
    }
}

impl WalletSession for BrowserWallet {
    fn status(&self) -> WalletStatus {
        self.status.get_untracked()
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), WalletError> {
        request(
            "wallet_switchEthereumChain",
            serde_json::json!([{ "chainId": format!("0x{:x}", chain_id) }]),
        )
        .await?;
        self.set_chain(chain_id);
        Ok(())
    }

    async fn send_transaction(&self, tx: &UnsignedTransfer) -> Result<TxHash, WalletError> {
        let from = self.status().address().ok_or(WalletError::NotConnected)?;
        let hash = request(
            "eth_sendTransaction",
            serde_json::json!([{
                "from": from.to_checksum(None),
                "to": tx.to.to_checksum(None),
                "data": tx.data.to_string(),
                "value": format!("{:#x}", tx.value),
                "chainId": format!("0x{:x}", tx.chain_id),
            }]),
        )
        .await?;

        hash.as_string()
            .and_then(|h| h.parse().ok())
            .ok_or_else(|| WalletError::Provider(format!("Invalid transaction hash: {:?}", hash)))
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TransferReceipt, WalletError> {
        loop {
            let receipt = request(
                "eth_getTransactionReceipt",
                serde_json::json!([tx_hash.to_string()]),
            )
            .await?;

            if receipt.is_null() || receipt.is_undefined() {
                gloo_timers::future::TimeoutFuture::new(RECEIPT_POLL_MS).await;
                continue;
            }

            let field = |name: &str| {
                js_sys::Reflect::get(&receipt, &name.into())
                    .ok()
                    .and_then(|v| v.as_string())
            };
            return Ok(TransferReceipt {
                tx_hash,
                success: field("status").and_then(|s| parse_hex_u64(&s)) == Some(1),
                block_number: field("blockNumber").and_then(|b| parse_hex_u64(&b)),
            });
        }
    }

    /// Injected providers have no ENS call; the API server resolves on mainnet.
    async fn resolve_name(&self, name: &str) -> Result<Address, WalletError> {
        crate::api::resolve_name(name)
            .await
            .map_err(|e| name_error(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u64() {
        assert_eq!(parse_hex_u64("0xa"), Some(10));
        assert_eq!(parse_hex_u64("0xa4b1"), Some(42161));
        assert_eq!(parse_hex_u64("89"), Some(137));
        assert_eq!(parse_hex_u64("0xzz"), None);
    }

    #[test]
    fn test_name_errors_mention_the_name() {
        assert_eq!(
            name_error("nobody.eth", ServiceError::NotFound("nobody.eth".into())),
            WalletError::Provider("No address is set for nobody.eth".into())
        );
        let WalletError::Provider(message) =
            name_error("alice.eth", ServiceError::HttpError("offline".into()))
        else {
            panic!("expected a provider error");
        };
        assert!(message.contains("alice.eth"));
    }
}
