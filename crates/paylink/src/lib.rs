//! Shareable stablecoin payment links.
//!
//! A requester fills in a [`PaymentForm`]; [`validate`] turns it into a
//! [`PaymentRequest`], and the [`link`] codec encodes that as a URL. A payer
//! opening the URL gets a [`PaymentDescriptor`], which the [`resolver`] turns
//! into [`PaymentDetails`] and the [`Fulfillment`] orchestrator pays through a
//! connected wallet.
//!
//! # Collaborators
//!
//! - **Service** ([`PaymentService`]): mints and looks up tracked requests,
//!   records settlements. [`PeanutClient`] is the hosted implementation.
//! - **Wallet** ([`WalletSession`]): reports address and chain, switches
//!   chain, sends transactions, waits for receipts.
//!
//! # Quick example
//!
//! ```
//! use paylink::{link, validate, PaymentForm, PaymentDescriptor};
//!
//! let form = PaymentForm {
//!     recipient: "0xabc0000000000000000000000000000000000123".into(),
//!     amount: Some("10".into()),
//!     ..Default::default()
//! };
//! let request = validate(&form).unwrap();
//! let path = link::encode_path(&request);
//! assert_eq!(path, "/pay/0xabc0000000000000000000000000000000000123/10usdc");
//!
//! let PaymentDescriptor::ByLiteral(literal) = link::decode(&path).unwrap() else {
//!     unreachable!()
//! };
//! assert_eq!(literal.amount.unwrap().as_str(), "10");
//! ```

// Core types
pub mod amount;
pub mod constants;
pub mod error;
pub mod payment;
pub mod validation;

// Links and resolution
pub mod ens;
pub mod link;
pub mod resolver;

// Collaborator seams
pub mod service;
pub mod transfer;
pub mod wallet;

pub mod config;
pub mod fulfillment;

// Hosted service client
#[cfg(feature = "full")]
pub mod peanut;

// Re-exports
pub use amount::{Amount, AmountError};
pub use config::{AppConfig, LinkMode};
pub use constants::{Chain, Token, DEFAULT_CHAIN, DEFAULT_TOKEN};
pub use error::{
    ConfigError, FulfillmentError, LinkError, ResolveError, ServiceError, WalletError,
};
pub use fulfillment::{Action, Fulfillment, FulfillmentState};
pub use link::{GeneratedLink, LiteralRequest, PaymentDescriptor, RequestId};
pub use payment::{FulfillmentResult, PaymentDetails, PaymentForm, PaymentRequest, RequestedAmount};
pub use service::{CreateRequest, CreatedRequest, FulfillmentReport, PaymentService, RequestDetails};
pub use transfer::{prepare_transfer, TokenType, TransferSpec, UnsignedTransfer};
pub use validation::{is_valid_address_or_ens, validate, Field, FieldError, ValidationErrors};
pub use wallet::{TransferReceipt, WalletSession, WalletStatus};

#[cfg(feature = "full")]
pub use peanut::PeanutClient;
