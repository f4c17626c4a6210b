use thiserror::Error;

/// A payment link that cannot be decoded into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("invalid payment link: {0}")]
    InvalidLink(String),
}

/// Errors returned by the external payment-request service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("http error: {0}")]
    HttpError(String),

    #[error("payment request not found: {0}")]
    NotFound(String),

    #[error("payment service rejected the call ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payment service response: {0}")]
    InvalidResponse(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("payment service is not configured")]
    NotConfigured,
}

/// Failure to turn a descriptor into payment details.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Failed to load payment details. Please try refreshing the page.")]
    LoadFailed(#[source] ServiceError),
}

/// Errors reported by a wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("wallet is not connected")]
    NotConnected,

    #[error("user rejected the request")]
    Rejected,

    #[error("insufficient funds")]
    InsufficientFunds,

    #[error("wallet does not support {0}")]
    Unsupported(&'static str),

    #[error("wallet provider error: {0}")]
    Provider(String),
}

impl WalletError {
    /// Classify a raw provider error by EIP-1193 code and message text.
    pub fn classify(code: Option<i64>, message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        if code == Some(4001) || lower.contains("user rejected") || lower.contains("user denied") {
            WalletError::Rejected
        } else if lower.contains("insufficient funds") {
            WalletError::InsufficientFunds
        } else if code == Some(4100) {
            WalletError::NotConnected
        } else {
            WalletError::Provider(message.to_string())
        }
    }
}

/// Classified outcome of a failed fulfillment attempt.
///
/// The `Display` text is what the payer sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FulfillmentError {
    #[error("Please connect your wallet")]
    NotConnected,

    #[error("Please switch to {expected} network to continue")]
    WrongNetwork { expected: String, actual: u64 },

    #[error("Transaction was rejected by the wallet")]
    Rejected,

    #[error("Insufficient funds to complete the transaction")]
    InsufficientFunds,

    #[error("A payment is already in progress")]
    AttemptInFlight,

    #[error("This payment has already been completed")]
    AlreadyPaid,

    #[error("Enter an amount to pay")]
    AmountRequired,

    #[error("Payment details are not loaded")]
    NotResolved,

    #[error("{0}")]
    Resolve(#[from] ResolveError),

    #[error("Transaction {tx_hash} did not confirm: {reason}")]
    NotConfirmed { tx_hash: String, reason: String },

    #[error("{0}")]
    Failed(String),
}

impl From<WalletError> for FulfillmentError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::NotConnected => FulfillmentError::NotConnected,
            WalletError::Rejected => FulfillmentError::Rejected,
            WalletError::InsufficientFunds => FulfillmentError::InsufficientFunds,
            other => FulfillmentError::Failed(other.to_string()),
        }
    }
}

/// Errors loading runtime configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid URL in {name}: {value}")]
    InvalidUrl { name: &'static str, value: String },

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_rejection() {
        assert_eq!(WalletError::classify(Some(4001), "whatever"), WalletError::Rejected);
        assert_eq!(
            WalletError::classify(None, "MetaMask Tx Signature: User rejected the request."),
            WalletError::Rejected
        );
    }

    #[test]
    fn test_classify_insufficient_funds() {
        assert_eq!(
            WalletError::classify(Some(-32000), "insufficient funds for gas * price + value"),
            WalletError::InsufficientFunds
        );
    }

    #[test]
    fn test_classify_generic() {
        assert_eq!(
            WalletError::classify(Some(-32603), "execution reverted"),
            WalletError::Provider("execution reverted".to_string())
        );
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            FulfillmentError::from(WalletError::Rejected).to_string(),
            "Transaction was rejected by the wallet"
        );
        assert_eq!(
            FulfillmentError::from(WalletError::InsufficientFunds).to_string(),
            "Insufficient funds to complete the transaction"
        );
        assert_eq!(
            FulfillmentError::NotConnected.to_string(),
            "Please connect your wallet"
        );
        let resolve = ResolveError::LoadFailed(ServiceError::NotFound("abc".into()));
        assert_eq!(
            FulfillmentError::from(resolve).to_string(),
            "Failed to load payment details. Please try refreshing the page."
        );
    }
}
