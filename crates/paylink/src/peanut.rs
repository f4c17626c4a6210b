//! HTTP client for the hosted Peanut request-link API.

use crate::amount::MAX_DECIMALS;
use crate::error::ServiceError;
use crate::link::{self, RequestId};
use crate::service::{CreateRequest, CreatedRequest, FulfillmentReport, PaymentService, RequestDetails};
use crate::transfer::TokenType;
use alloy::primitives::Address;
use serde::{Deserialize, Deserializer};
use url::Url;

const API_KEY_HEADER: &str = "api-key";

/// [`PaymentService`] backed by the Peanut API.
///
/// All calls need the API key; without one they fail with
/// [`ServiceError::NotConfigured`].
#[derive(Clone)]
pub struct PeanutClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl std::fmt::Debug for PeanutClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeanutClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl PeanutClient {
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        Self::with_http_client(
            reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("failed to build HTTP client"),
            base_url,
            api_key,
        )
    }

    /// Create a client with a custom reqwest::Client.
    pub fn with_http_client(http: reqwest::Client, base_url: Url, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, ServiceError> {
        self.api_key.as_deref().ok_or(ServiceError::NotConfigured)
    }

    fn endpoint(&self, request_id: Option<&RequestId>) -> Result<Url, ServiceError> {
        let path = match request_id {
            Some(id) => format!("request-links/{}", urlencoding::encode(id.as_str())),
            None => "request-links".to_string(),
        };
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(&path)
            .map_err(|e| ServiceError::InvalidRequest(format!("bad endpoint URL: {e}")))
    }

    async fn send(&self, req: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response, ServiceError> {
        let resp = req
            .header(API_KEY_HEADER, self.api_key()?)
            .send()
            .await
            .map_err(|e| ServiceError::HttpError(format!("{what} failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), what, "peanut API returned an error");
        if status == reqwest::StatusCode::NOT_FOUND {
            Err(ServiceError::NotFound(what.to_string()))
        } else {
            Err(ServiceError::Api {
                status: status.as_u16(),
                message: truncate(&message, 200),
            })
        }
    }
}

impl PaymentService for PeanutClient {
    async fn create_request(&self, request: &CreateRequest) -> Result<CreatedRequest, ServiceError> {
        let body = serde_json::json!({
            "chainId": request.chain_id.to_string(),
            "tokenAddress": request.token_address.to_checksum(None),
            "tokenAmount": request.token_amount,
            "tokenDecimals": request.token_decimals.to_string(),
            "tokenType": token_type_code(request.token_type),
            "tokenSymbol": request.token_symbol,
            "recipientAddress": request.recipient_address,
        });
        let resp = self
            .send(self.http.post(self.endpoint(None)?).json(&body), "create request")
            .await?;
        let created: RawCreated = resp
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("create request: {e}")))?;

        let request_id = RequestId::new(&created.uuid)
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        let link = created
            .link
            .unwrap_or_else(|| link::service_url(&request_id));
        tracing::info!(request_id = %request_id, "request link created");
        Ok(CreatedRequest { request_id, link })
    }

    async fn get_request_details(&self, request_id: &RequestId) -> Result<RequestDetails, ServiceError> {
        let resp = self
            .send(
                self.http.get(self.endpoint(Some(request_id))?),
                "request details",
            )
            .await?;
        let raw: RawRequestLink = resp
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("request details: {e}")))?;
        RequestDetails::try_from(raw)
    }

    async fn submit_fulfillment(&self, report: &FulfillmentReport) -> Result<(), ServiceError> {
        let body = serde_json::json!({
            "chainId": report.chain_id.to_string(),
            "destinationChainFulfillmentHash": report.tx_hash.to_string(),
            "payerAddress": report.payer_address.to_checksum(None),
            "link": report.link,
        });
        self.send(
            self.http
                .put(self.endpoint(Some(&report.request_id))?)
                .json(&body),
            "submit fulfillment",
        )
        .await?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawCreated {
    #[serde(alias = "requestId", alias = "id")]
    uuid: String,
    #[serde(default)]
    link: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRequestLink {
    recipient_address: String,
    #[serde(deserialize_with = "number_or_string")]
    chain_id: u64,
    #[serde(default)]
    token_address: Option<Address>,
    token_amount: String,
    #[serde(deserialize_with = "number_or_string")]
    token_decimals: u64,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    token_type: Option<serde_json::Value>,
}

impl TryFrom<RawRequestLink> for RequestDetails {
    type Error = ServiceError;

    fn try_from(raw: RawRequestLink) -> Result<Self, Self::Error> {
        let token_decimals = u32::try_from(raw.token_decimals)
            .ok()
            .filter(|d| *d <= MAX_DECIMALS)
            .ok_or_else(|| {
                ServiceError::InvalidResponse(format!(
                    "tokenDecimals {} out of range",
                    raw.token_decimals
                ))
            })?;
        let token_type = match raw.token_type {
            Some(serde_json::Value::Number(n)) if n.as_u64() == Some(0) => TokenType::Native,
            Some(serde_json::Value::String(s)) if s == "0" || s.eq_ignore_ascii_case("native") => {
                TokenType::Native
            }
            _ => TokenType::Erc20,
        };
        Ok(RequestDetails {
            recipient_address: raw.recipient_address,
            chain_id: raw.chain_id,
            token_address: raw.token_address,
            token_amount: raw.token_amount,
            token_decimals,
            token_symbol: raw.token_symbol,
            token_type,
        })
    }
}

/// Peanut link-type codes: 0 native, 1 ERC-20.
fn token_type_code(token_type: TokenType) -> u8 {
    match token_type {
        TokenType::Native => 0,
        TokenType::Erc20 => 1,
    }
}

fn number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, key: Option<&str>) -> PeanutClient {
        PeanutClient::new(Url::parse(base).unwrap(), key.map(str::to_string))
    }

    #[test]
    fn test_endpoint_joins_under_base_path() {
        let c = client("https://api.example.com/v1", Some("k"));
        assert_eq!(
            c.endpoint(None).unwrap().as_str(),
            "https://api.example.com/v1/request-links"
        );
        let id = RequestId::new("abc-123").unwrap();
        assert_eq!(
            c.endpoint(Some(&id)).unwrap().as_str(),
            "https://api.example.com/v1/request-links/abc-123"
        );
    }

    #[test]
    fn test_request_link_accepts_string_numbers() {
        let raw: RawRequestLink = serde_json::from_value(serde_json::json!({
            "recipientAddress": "vitalik.eth",
            "chainId": "10",
            "tokenAddress": "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85",
            "tokenAmount": "5",
            "tokenDecimals": 6,
            "tokenType": "1"
        }))
        .unwrap();
        let details = RequestDetails::try_from(raw).unwrap();
        assert_eq!(details.chain_id, 10);
        assert_eq!(details.token_decimals, 6);
        assert_eq!(details.token_symbol, None);
        assert_eq!(details.token_type, TokenType::Erc20);
    }

    #[test]
    fn test_request_link_rejects_oversized_decimals() {
        for decimals in [serde_json::json!(78), serde_json::json!("4294967296")] {
            let raw: RawRequestLink = serde_json::from_value(serde_json::json!({
                "recipientAddress": "vitalik.eth",
                "chainId": 10,
                "tokenAmount": "5",
                "tokenDecimals": decimals,
            }))
            .unwrap();
            assert!(matches!(
                RequestDetails::try_from(raw),
                Err(ServiceError::InvalidResponse(_))
            ));
        }
    }

    #[test]
    fn test_native_token_type_codes() {
        let raw: RawRequestLink = serde_json::from_value(serde_json::json!({
            "recipientAddress": "vitalik.eth",
            "chainId": 10,
            "tokenAmount": "0.1",
            "tokenDecimals": 18,
            "tokenType": 0
        }))
        .unwrap();
        assert_eq!(
            RequestDetails::try_from(raw).unwrap().token_type,
            TokenType::Native
        );
    }

    #[test]
    fn test_created_accepts_uuid() {
        let raw: RawCreated =
            serde_json::from_value(serde_json::json!({"uuid": "f00d-1"})).unwrap();
        assert_eq!(raw.uuid, "f00d-1");
        assert_eq!(raw.link, None);
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_fast() {
        let c = client("https://api.example.com", None);
        let id = RequestId::new("abc").unwrap();
        assert_eq!(
            c.get_request_details(&id).await,
            Err(ServiceError::NotConfigured)
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hello...");
    }
}
