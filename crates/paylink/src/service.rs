//! The external payment-request service seam.
//!
//! [`PaymentService`] mints tracked requests, looks them up, and records
//! settlements. [`crate::peanut::PeanutClient`] talks to the hosted API; the
//! browser app implements it against the companion server.

use crate::error::ServiceError;
use crate::link::RequestId;
use crate::transfer::{prepare_transfer, TokenType, TransferSpec, UnsignedTransfer};
use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Parameters for minting a tracked request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub chain_id: u64,
    pub token_address: Address,
    /// Decimal amount, e.g. `"10"`.
    pub token_amount: String,
    pub token_decimals: u32,
    pub token_type: TokenType,
    pub token_symbol: String,
    /// Address or ENS name.
    pub recipient_address: String,
}

/// A freshly minted request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedRequest {
    pub request_id: RequestId,
    /// Link as issued by the service (its own host).
    pub link: String,
}

/// Stored details of a tracked request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub recipient_address: String,
    pub chain_id: u64,
    pub token_address: Option<Address>,
    pub token_amount: String,
    pub token_decimals: u32,
    #[serde(default)]
    pub token_symbol: Option<String>,
    #[serde(default)]
    pub token_type: TokenType,
}

/// Settlement record sent after an on-chain transfer confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentReport {
    pub request_id: RequestId,
    pub chain_id: u64,
    pub tx_hash: TxHash,
    pub payer_address: Address,
    pub link: String,
}

/// External payment-request service.
///
/// Futures are not required to be `Send`: the browser implementation holds
/// JS handles across awaits.
pub trait PaymentService {
    /// Mint a backend-tracked request.
    fn create_request(
        &self,
        request: &CreateRequest,
    ) -> impl Future<Output = Result<CreatedRequest, ServiceError>>;

    /// Look up a previously minted request.
    fn get_request_details(
        &self,
        request_id: &RequestId,
    ) -> impl Future<Output = Result<RequestDetails, ServiceError>>;

    /// Build the unsigned transfer that fulfills a request.
    ///
    /// The hosted SDK does this locally, so the default does too.
    fn prepare_fulfillment(&self, spec: &TransferSpec) -> Result<UnsignedTransfer, ServiceError> {
        prepare_transfer(spec).map_err(|e| ServiceError::InvalidRequest(e.to_string()))
    }

    /// Record that a request was paid.
    fn submit_fulfillment(
        &self,
        report: &FulfillmentReport,
    ) -> impl Future<Output = Result<(), ServiceError>>;
}
