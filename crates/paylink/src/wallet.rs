//! The wallet seam: connection state, chain switching, and sending.

use crate::error::WalletError;
use crate::transfer::UnsignedTransfer;
use alloy::primitives::{Address, TxHash};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Snapshot of a wallet connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum WalletStatus {
    #[default]
    Disconnected,
    #[serde(rename_all = "camelCase")]
    Connected { address: Address, chain_id: u64 },
}

impl WalletStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, WalletStatus::Connected { .. })
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            WalletStatus::Connected { address, .. } => Some(*address),
            WalletStatus::Disconnected => None,
        }
    }

    pub fn chain_id(&self) -> Option<u64> {
        match self {
            WalletStatus::Connected { chain_id, .. } => Some(*chain_id),
            WalletStatus::Disconnected => None,
        }
    }
}

/// Mined transaction outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferReceipt {
    pub tx_hash: TxHash,
    /// `false` if the transaction reverted.
    pub success: bool,
    pub block_number: Option<u64>,
}

/// A connected (or connectable) wallet.
pub trait WalletSession {
    fn status(&self) -> WalletStatus;

    /// Ask the wallet to change its active chain. May wait on the user.
    fn switch_chain(&self, chain_id: u64) -> impl Future<Output = Result<(), WalletError>>;

    /// Sign and broadcast `tx`, returning its hash.
    fn send_transaction(
        &self,
        tx: &UnsignedTransfer,
    ) -> impl Future<Output = Result<TxHash, WalletError>>;

    /// Wait until `tx_hash` is mined.
    fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TransferReceipt, WalletError>>;

    /// Resolve an ENS name through the wallet's provider.
    fn resolve_name(&self, name: &str) -> impl Future<Output = Result<Address, WalletError>> {
        tracing::debug!(name, "wallet cannot resolve names");
        async { Err(WalletError::Unsupported("ENS name resolution")) }
    }
}
