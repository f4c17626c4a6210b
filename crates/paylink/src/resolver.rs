//! Turns a [`PaymentDescriptor`] into concrete [`PaymentDetails`].

use crate::amount::Amount;
use crate::constants::{Chain, DEFAULT_TOKEN, DEFAULT_TOKEN_SYMBOL, TOKEN_DECIMALS};
use crate::error::{ResolveError, ServiceError};
use crate::link::{LiteralRequest, PaymentDescriptor, RequestId};
use crate::payment::{PaymentDetails, RequestedAmount};
use crate::service::PaymentService;
use crate::transfer::TokenType;

/// Resolve any descriptor. Tracked requests cost one service call.
pub async fn resolve<S: PaymentService>(
    descriptor: &PaymentDescriptor,
    service: &S,
    default_chain: Chain,
) -> Result<PaymentDetails, ResolveError> {
    match descriptor {
        PaymentDescriptor::ByIdentifier { request_id } => {
            resolve_by_identifier(request_id, service).await
        }
        PaymentDescriptor::ByLiteral(literal) => Ok(resolve_literal(literal, default_chain)),
    }
}

/// Look up a tracked request. No retry: the caller re-invokes on failure.
pub async fn resolve_by_identifier<S: PaymentService>(
    request_id: &RequestId,
    service: &S,
) -> Result<PaymentDetails, ResolveError> {
    let details = service
        .get_request_details(request_id)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %request_id, error = %e, "payment details lookup failed");
            ResolveError::LoadFailed(e)
        })?;

    let amount = Amount::parse(&details.token_amount).map_err(|e| {
        ResolveError::LoadFailed(ServiceError::InvalidResponse(format!(
            "token amount '{}': {e}",
            details.token_amount
        )))
    })?;

    Ok(PaymentDetails {
        recipient: details.recipient_address,
        chain: chain_name(details.chain_id),
        chain_id: details.chain_id,
        amount: RequestedAmount::Exact(amount),
        token_symbol: details
            .token_symbol
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_SYMBOL.to_string()),
        token_address: details.token_address,
        token_decimals: details.token_decimals,
        token_type: details.token_type,
        request_id: Some(request_id.to_string()),
    })
}

/// Build details straight from link fields.
pub fn resolve_literal(literal: &LiteralRequest, default_chain: Chain) -> PaymentDetails {
    let chain = literal.chain.unwrap_or(default_chain);
    let token = literal.token.unwrap_or(DEFAULT_TOKEN);
    PaymentDetails {
        recipient: literal.recipient.clone(),
        chain: chain.name().to_string(),
        chain_id: chain.id(),
        amount: literal
            .amount
            .clone()
            .map(RequestedAmount::Exact)
            .unwrap_or(RequestedAmount::Open),
        token_symbol: token.symbol().to_string(),
        token_address: Some(token.address_on(chain)),
        token_decimals: TOKEN_DECIMALS,
        token_type: TokenType::Erc20,
        request_id: None,
    }
}

/// Chain slug for a known id, otherwise the id itself.
pub fn chain_name(chain_id: u64) -> String {
    Chain::from_id(chain_id)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| chain_id.to_string())
}
