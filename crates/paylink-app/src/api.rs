//! Calls to the paylink API server.

use alloy::primitives::Address;
use gloo_net::http::{Request, Response};
use paylink::{
    CreateRequest, CreatedRequest, FulfillmentReport, GeneratedLink, PaymentDetails, PaymentForm,
    PaymentService, RequestDetails, RequestId, ServiceError, TokenType, ValidationErrors,
};
use serde::Deserialize;

/// API base URL. Empty string means same-origin (SPA served by the API server).
/// Override at compile time via the PAYLINK_API_URL env var for dev/testing.
const API_URL: &str = {
    match option_env!("PAYLINK_API_URL") {
        Some(url) => url,
        None => "",
    }
};

/// JSON error body returned by the server.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    fields: Option<ValidationErrors>,
}

/// Why a link could not be created.
#[derive(Debug, Clone)]
pub enum CreateLinkError {
    /// Per-field problems to show inline.
    Invalid(ValidationErrors),
    Failed(String),
}

/// Create a payment link from the home-page form.
pub async fn create_link(form: &PaymentForm) -> Result<GeneratedLink, CreateLinkError> {
    let url = format!("{}/api/links", API_URL);
    let resp = Request::post(&url)
        .json(form)
        .map_err(|e| CreateLinkError::Failed(format!("Failed to build request: {}", e)))?
        .send()
        .await
        .map_err(|e| CreateLinkError::Failed(format!("Request failed: {}", e)))?;

    if resp.ok() {
        return resp
            .json::<GeneratedLink>()
            .await
            .map_err(|e| CreateLinkError::Failed(format!("Failed to parse response: {}", e)));
    }

    let status = resp.status();
    match resp.json::<ApiErrorBody>().await {
        Ok(ApiErrorBody {
            fields: Some(fields),
            ..
        }) if !fields.is_empty() => Err(CreateLinkError::Invalid(fields)),
        Ok(body) if !body.message.is_empty() => Err(CreateLinkError::Failed(body.message)),
        _ => Err(CreateLinkError::Failed(format!("HTTP {}", status))),
    }
}

async fn service_error(resp: Response, what: &str) -> ServiceError {
    let status = resp.status();
    let message = resp
        .json::<ApiErrorBody>()
        .await
        .map(|b| b.message)
        .unwrap_or_default();
    match status {
        404 => ServiceError::NotFound(what.to_string()),
        503 => ServiceError::NotConfigured,
        _ => ServiceError::Api { status, message },
    }
}

#[derive(Debug, Deserialize)]
struct EnsAnswer {
    address: Address,
}

/// Look up the address an ENS name points at through the API server.
pub async fn resolve_name(name: &str) -> Result<Address, ServiceError> {
    let url = format!("{}/api/ens/{}", API_URL, encode_segment(name));
    let resp = Request::get(&url)
        .send()
        .await
        .map_err(|e| ServiceError::HttpError(format!("Request failed: {}", e)))?;
    if !resp.ok() {
        return Err(service_error(resp, name).await);
    }
    resp.json::<EnsAnswer>()
        .await
        .map(|answer| answer.address)
        .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
}

fn encode_segment(value: &str) -> String {
    js_sys::encode_uri_component(value).into()
}

/// [`PaymentService`] backed by the API server, which holds the service key.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiService;

impl PaymentService for ApiService {
    async fn create_request(&self, request: &CreateRequest) -> Result<CreatedRequest, ServiceError> {
        let url = format!("{}/api/requests", API_URL);
        let resp = Request::post(&url)
            .json(request)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?
            .send()
            .await
            .map_err(|e| ServiceError::HttpError(format!("Request failed: {}", e)))?;
        if !resp.ok() {
            return Err(service_error(resp, "create request").await);
        }
        resp.json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))
    }

    async fn get_request_details(&self, request_id: &RequestId) -> Result<RequestDetails, ServiceError> {
        let url = format!("{}/api/requests/{}", API_URL, request_id);
        let resp = Request::get(&url)
            .send()
            .await
            .map_err(|e| ServiceError::HttpError(format!("Request failed: {}", e)))?;
        if !resp.ok() {
            return Err(service_error(resp, request_id.as_str()).await);
        }
        let details: PaymentDetails = resp
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(e.to_string()))?;
        request_details(details)
    }

    async fn submit_fulfillment(&self, report: &FulfillmentReport) -> Result<(), ServiceError> {
        let url = format!(
            "{}/api/requests/{}/fulfillment",
            API_URL, report.request_id
        );
        let resp = Request::post(&url)
            .json(report)
            .map_err(|e| ServiceError::InvalidRequest(e.to_string()))?
            .send()
            .await
            .map_err(|e| ServiceError::HttpError(format!("Request failed: {}", e)))?;
        if !resp.ok() {
            return Err(service_error(resp, "submit fulfillment").await);
        }
        Ok(())
    }
}

/// The server answers lookups with resolved details; fold them back.
fn request_details(details: PaymentDetails) -> Result<RequestDetails, ServiceError> {
    let amount = details.amount.exact().ok_or_else(|| {
        ServiceError::InvalidResponse("tracked request without an amount".to_string())
    })?;
    Ok(RequestDetails {
        recipient_address: details.recipient,
        chain_id: details.chain_id,
        token_address: details.token_address,
        token_amount: amount.to_string(),
        token_decimals: details.token_decimals,
        token_symbol: Some(details.token_symbol),
        token_type: details.token_type,
    })
}
