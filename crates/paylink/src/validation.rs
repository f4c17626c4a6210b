//! Syntactic validation of the payment-creation form. No network calls.

use crate::amount::Amount;
use crate::constants::{Chain, Token, DEFAULT_CHAIN, DEFAULT_TOKEN};
use crate::payment::{PaymentForm, PaymentRequest};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name suffix accepted in place of an address.
pub const ENS_SUFFIX: &str = ".eth";

pub const RECIPIENT_MESSAGE: &str = "Must be a valid Ethereum address or ENS name";

/// Form fields that can carry an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    Recipient,
    Chain,
    Amount,
    Token,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All field-level problems found in one form submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    fn push(&mut self, field: Field, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// First message attached to `field`, for inline display.
    pub fn message_for(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.0.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// True for a `0x`-prefixed 20-byte hex address or a name ending in `.eth`.
///
/// Mixed-case addresses must carry a valid EIP-55 checksum.
pub fn is_valid_address_or_ens(value: &str) -> bool {
    parse_address(value).is_some() || is_ens_name(value)
}

pub fn is_ens_name(value: &str) -> bool {
    value.len() > ENS_SUFFIX.len()
        && value.ends_with(ENS_SUFFIX)
        && !value.chars().any(char::is_whitespace)
}

/// Parse a strict `0x` hex address, honouring the checksum when one is present.
pub fn parse_address(value: &str) -> Option<Address> {
    let hex = value.strip_prefix("0x")?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let address: Address = value.parse().ok()?;

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper && address.to_checksum(None) != value {
        return None;
    }
    Some(address)
}

/// Validate a submitted form into a [`PaymentRequest`].
///
/// Collects every field error rather than stopping at the first. Outside
/// advanced mode the chain is always the default one.
pub fn validate(form: &PaymentForm) -> Result<PaymentRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let recipient = form.recipient.trim();
    if !is_valid_address_or_ens(recipient) {
        errors.push(Field::Recipient, RECIPIENT_MESSAGE);
    }

    let chain = match non_empty(form.chain.as_deref()) {
        Some(raw) => raw.parse::<Chain>().unwrap_or_else(|_| {
            errors.push(Field::Chain, format!("Unsupported chain: {raw}"));
            DEFAULT_CHAIN
        }),
        None => DEFAULT_CHAIN,
    };

    let token = match non_empty(form.token.as_deref()) {
        Some(raw) => raw.parse::<Token>().unwrap_or_else(|_| {
            errors.push(Field::Token, format!("Unsupported token: {raw}"));
            DEFAULT_TOKEN
        }),
        None => DEFAULT_TOKEN,
    };

    let amount = match non_empty(form.amount.as_deref()) {
        Some(raw) => match Amount::parse(raw) {
            Ok(amount) => Some(amount),
            Err(e) => {
                errors.push(Field::Amount, e.to_string());
                None
            }
        },
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(PaymentRequest {
        recipient: recipient.to_string(),
        chain: if form.is_advanced_mode {
            chain
        } else {
            DEFAULT_CHAIN
        },
        amount,
        token,
        is_advanced_mode: form.is_advanced_mode,
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
