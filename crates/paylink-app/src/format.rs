//! Display helpers shared by the pages.

use paylink::{Chain, PaymentDetails, RequestedAmount};

/// `0x1234...abcd` form of an address for the header.
pub fn short_address(address: &str) -> String {
    if address.len() > 10 {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

/// Block explorer page for a transaction, when the chain is known.
pub fn explorer_tx_url(chain_id: u64, tx_hash: &str) -> Option<String> {
    Chain::from_id(chain_id).map(|chain| format!("{}/tx/{}", chain.explorer_base(), tx_hash))
}

/// Network name for a wallet's chain id.
pub fn network_name(chain_id: u64) -> String {
    Chain::from_id(chain_id)
        .map(|c| c.display_name().to_string())
        .unwrap_or_else(|| format!("Chain {chain_id}"))
}

/// Headline amount, e.g. `10 USDC` or `Any amount of USDC`.
pub fn amount_label(details: &PaymentDetails) -> String {
    match &details.amount {
        RequestedAmount::Exact(amount) => format!("{amount} {}", details.token_symbol),
        RequestedAmount::Open => format!("Any amount of {}", details.token_symbol),
    }
}
