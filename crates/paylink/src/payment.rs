use crate::amount::Amount;
use crate::constants::{Chain, Token, DEFAULT_CHAIN, DEFAULT_TOKEN};
use crate::transfer::TokenType;
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};

/// Raw payment-creation form, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub recipient: String,
    pub is_advanced_mode: bool,
    pub chain: Option<String>,
    pub amount: Option<String>,
    pub token: Option<String>,
}

/// A validated payment request. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub recipient: String,
    pub chain: Chain,
    /// `None` is an open-ended request: the payer chooses the amount.
    pub amount: Option<Amount>,
    pub token: Token,
    pub is_advanced_mode: bool,
}

impl PaymentRequest {
    pub fn new(recipient: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            chain: DEFAULT_CHAIN,
            amount: None,
            token: DEFAULT_TOKEN,
            is_advanced_mode: false,
        }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.token = token;
        self
    }

    /// Pin the chain; only honoured in advanced mode.
    pub fn with_chain(mut self, chain: Chain) -> Self {
        self.chain = chain;
        self.is_advanced_mode = true;
        self
    }
}

/// How much a resolved request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RequestedAmount {
    Exact(Amount),
    /// Open-ended: the payer must supply an amount when paying.
    Open,
}

impl RequestedAmount {
    pub fn exact(&self) -> Option<&Amount> {
        match self {
            RequestedAmount::Exact(amount) => Some(amount),
            RequestedAmount::Open => None,
        }
    }
}

impl std::fmt::Display for RequestedAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestedAmount::Exact(amount) => write!(f, "{amount}"),
            RequestedAmount::Open => f.write_str("open"),
        }
    }
}

/// Concrete, read-only details of a payable request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    /// Address or ENS name.
    pub recipient: String,
    /// Chain slug, or the decimal chain id when it is not in the table.
    pub chain: String,
    pub chain_id: u64,
    pub amount: RequestedAmount,
    pub token_symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_address: Option<Address>,
    pub token_decimals: u32,
    #[serde(default)]
    pub token_type: TokenType,
    /// Set when the request is tracked by the external service.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl PaymentDetails {
    pub fn known_chain(&self) -> Option<Chain> {
        Chain::from_id(self.chain_id)
    }

    /// Human-readable network name for display.
    pub fn network_label(&self) -> String {
        self.known_chain()
            .map(|c| c.display_name().to_string())
            .unwrap_or_else(|| self.chain.clone())
    }
}

/// Outcome of one fulfillment attempt. At most one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
