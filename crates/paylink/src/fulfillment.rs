//! Payment fulfillment orchestrator.
//!
//! Drives one payment page: resolves the descriptor, checks the wallet's
//! network, sends the transfer, waits for confirmation, and reports the
//! settlement for tracked requests.
//!
//! ```text
//! Idle -> Resolving -> AwaitingWallet | NetworkMismatch | Ready
//!      -> Submitting -> Confirming -> Succeeded | Failed
//! ```
//!
//! State lives in `Cell`/`RefCell` and no borrow is held across an await,
//! so the orchestrator can be shared by reference between UI callbacks on
//! one thread.

use crate::amount::Amount;
use crate::constants::Chain;
use crate::error::{FulfillmentError, WalletError};
use crate::link::{self, PaymentDescriptor, RequestId};
use crate::payment::{FulfillmentResult, PaymentDetails, RequestedAmount};
use crate::resolver;
use crate::service::{FulfillmentReport, PaymentService};
use crate::transfer::{TokenType, TransferSpec};
use crate::validation::{is_ens_name, parse_address};
use crate::wallet::{WalletSession, WalletStatus};
use alloy::primitives::{Address, TxHash};
use std::cell::{Cell, RefCell};

/// Where a payment page currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentState {
    Idle,
    Resolving,
    /// Details are known but no wallet is connected.
    AwaitingWallet,
    NetworkMismatch { expected: u64, actual: u64 },
    Ready,
    Submitting,
    Confirming { tx_hash: TxHash },
    Succeeded { tx_hash: TxHash },
    Failed { error: FulfillmentError },
}

impl FulfillmentState {
    /// An attempt is between send and confirmation.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            FulfillmentState::Submitting | FulfillmentState::Confirming { .. }
        )
    }
}

/// The single action the payer is offered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    None,
    ConnectWallet,
    SwitchNetwork { chain_id: u64, label: String },
    /// `amount_required` is set for open-ended requests.
    Pay { amount_required: bool },
}

/// Resets the in-flight flag when an attempt ends, however it ends.
struct AttemptGuard<'a>(&'a Cell<bool>);

impl<'a> AttemptGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

type StateObserver = Box<dyn Fn(&FulfillmentState)>;

/// Orchestrates paying one descriptor.
pub struct Fulfillment<S, W> {
    descriptor: PaymentDescriptor,
    default_chain: Chain,
    service: S,
    wallet: W,
    details: RefCell<Option<PaymentDetails>>,
    state: RefCell<FulfillmentState>,
    in_flight: Cell<bool>,
    observer: RefCell<Option<StateObserver>>,
}

impl<S: PaymentService, W: WalletSession> Fulfillment<S, W> {
    pub fn new(descriptor: PaymentDescriptor, service: S, wallet: W, default_chain: Chain) -> Self {
        Self {
            descriptor,
            default_chain,
            service,
            wallet,
            details: RefCell::new(None),
            state: RefCell::new(FulfillmentState::Idle),
            in_flight: Cell::new(false),
            observer: RefCell::new(None),
        }
    }

    /// Call `f` with every state the page passes through, including the
    /// intermediate ones inside [`Fulfillment::pay`].
    pub fn on_state_change(&self, f: impl Fn(&FulfillmentState) + 'static) {
        *self.observer.borrow_mut() = Some(Box::new(f));
    }

    pub fn state(&self) -> FulfillmentState {
        self.state.borrow().clone()
    }

    pub fn details(&self) -> Option<PaymentDetails> {
        self.details.borrow().clone()
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    /// Outcome of the last attempt, in the shape the page renders.
    pub fn result(&self) -> FulfillmentResult {
        match &*self.state.borrow() {
            FulfillmentState::Succeeded { tx_hash } => FulfillmentResult {
                tx_hash: Some(tx_hash.to_string()),
                error: None,
            },
            FulfillmentState::Failed { error } => FulfillmentResult {
                tx_hash: None,
                error: Some(error.to_string()),
            },
            _ => FulfillmentResult::default(),
        }
    }

    /// What the payer can do right now.
    pub fn action(&self) -> Action {
        let details = self.details.borrow();
        let Some(details) = details.as_ref() else {
            return Action::None;
        };
        match &*self.state.borrow() {
            FulfillmentState::AwaitingWallet
            | FulfillmentState::NetworkMismatch { .. }
            | FulfillmentState::Ready
            | FulfillmentState::Failed { .. } => {
                action_for(&evaluate(details, self.wallet.status()), details)
            }
            _ => Action::None,
        }
    }

    /// Resolve the descriptor, or reuse details already resolved.
    pub async fn load(&self) -> Result<PaymentDetails, FulfillmentError> {
        let cached = self.details.borrow().clone();
        if let Some(details) = cached {
            self.refresh();
            return Ok(details);
        }

        self.set_state(FulfillmentState::Resolving);
        match resolver::resolve(&self.descriptor, &self.service, self.default_chain).await {
            Ok(details) => {
                tracing::debug!(
                    recipient = %details.recipient,
                    chain_id = details.chain_id,
                    amount = %details.amount,
                    "payment details resolved"
                );
                *self.details.borrow_mut() = Some(details.clone());
                self.set_state(evaluate(&details, self.wallet.status()));
                Ok(details)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// Re-check the wallet after it connects, disconnects, or changes chain.
    ///
    /// Busy, finished, and failed attempts are left alone.
    pub fn refresh(&self) -> FulfillmentState {
        let details = self.details.borrow().clone();
        if let Some(details) = details {
            let current = self.state();
            if matches!(
                current,
                FulfillmentState::AwaitingWallet
                    | FulfillmentState::NetworkMismatch { .. }
                    | FulfillmentState::Ready
            ) {
                self.set_state(evaluate(&details, self.wallet.status()));
            }
        }
        self.state()
    }

    /// Ask the wallet to move to the requested chain.
    pub async fn switch_network(&self) -> Result<(), FulfillmentError> {
        if self.in_flight.get() {
            return Err(FulfillmentError::AttemptInFlight);
        }
        let details = self.details.borrow().clone();
        let Some(details) = details else {
            return Err(FulfillmentError::NotResolved);
        };
        match self.state() {
            FulfillmentState::Succeeded { .. } => return Err(FulfillmentError::AlreadyPaid),
            FulfillmentState::Resolving => return Err(FulfillmentError::AttemptInFlight),
            _ => {}
        }

        self.set_state(FulfillmentState::Resolving);
        match self.wallet.switch_chain(details.chain_id).await {
            Ok(()) => {
                tracing::info!(chain_id = details.chain_id, "wallet switched network");
                self.set_state(evaluate(&details, self.wallet.status()));
                Ok(())
            }
            Err(e) => {
                tracing::warn!(chain_id = details.chain_id, error = %e, "network switch failed");
                Err(self.fail(e.into()))
            }
        }
    }

    /// Pay the resolved request. `amount` is only read for open requests.
    ///
    /// Rejected with `AttemptInFlight` while another attempt is between send
    /// and confirmation, and with `AlreadyPaid` once a transfer confirmed.
    /// Neither rejection changes the state.
    pub async fn pay(&self, amount: Option<Amount>) -> Result<TxHash, FulfillmentError> {
        let Some(_guard) = AttemptGuard::acquire(&self.in_flight) else {
            tracing::debug!("payment attempt rejected: another is in flight");
            return Err(FulfillmentError::AttemptInFlight);
        };

        let details = self.details.borrow().clone();
        let Some(details) = details else {
            return Err(self.fail(FulfillmentError::NotResolved));
        };
        match self.state() {
            FulfillmentState::Succeeded { .. } => {
                tracing::debug!("payment attempt rejected: already paid");
                return Err(FulfillmentError::AlreadyPaid);
            }
            FulfillmentState::Resolving => return Err(FulfillmentError::AttemptInFlight),
            _ => {}
        }

        let payer = match self.wallet.status() {
            WalletStatus::Disconnected => return Err(self.fail(FulfillmentError::NotConnected)),
            WalletStatus::Connected { chain_id, .. } if chain_id != details.chain_id => {
                self.set_state(FulfillmentState::NetworkMismatch {
                    expected: details.chain_id,
                    actual: chain_id,
                });
                return Err(FulfillmentError::WrongNetwork {
                    expected: details.network_label(),
                    actual: chain_id,
                });
            }
            WalletStatus::Connected { address, .. } => address,
        };

        let amount = match (&details.amount, amount) {
            (RequestedAmount::Exact(exact), _) => exact.clone(),
            (RequestedAmount::Open, Some(chosen)) => chosen,
            (RequestedAmount::Open, None) => {
                return Err(self.fail(FulfillmentError::AmountRequired))
            }
        };

        let recipient = match self.recipient_address(&details.recipient).await {
            Ok(address) => address,
            Err(e) => return Err(self.fail(e)),
        };
        let token_address = match (details.token_address, details.token_type) {
            (Some(address), _) => address,
            (None, TokenType::Native) => Address::ZERO,
            (None, TokenType::Erc20) => {
                return Err(self.fail(FulfillmentError::Failed(format!(
                    "No {} contract known on {}",
                    details.token_symbol,
                    details.network_label()
                ))))
            }
        };

        self.set_state(FulfillmentState::Submitting);
        let spec = TransferSpec {
            chain_id: details.chain_id,
            recipient,
            token_address,
            amount,
            token_decimals: details.token_decimals,
            token_type: details.token_type,
        };
        let tx = match self.service.prepare_fulfillment(&spec) {
            Ok(tx) => tx,
            Err(e) => return Err(self.fail(FulfillmentError::Failed(e.to_string()))),
        };

        let tx_hash = match self.wallet.send_transaction(&tx).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::warn!(error = %e, "wallet did not send the transfer");
                return Err(self.fail(e.into()));
            }
        };
        tracing::info!(tx_hash = %tx_hash, chain_id = details.chain_id, "payment submitted");

        self.set_state(FulfillmentState::Confirming { tx_hash });
        let receipt = match self.wallet.wait_for_receipt(tx_hash).await {
            Ok(receipt) => receipt,
            Err(e) => {
                return Err(self.fail(FulfillmentError::NotConfirmed {
                    tx_hash: tx_hash.to_string(),
                    reason: e.to_string(),
                }))
            }
        };
        if !receipt.success {
            return Err(self.fail(FulfillmentError::NotConfirmed {
                tx_hash: tx_hash.to_string(),
                reason: "transaction reverted".to_string(),
            }));
        }

        tracing::info!(
            tx_hash = %tx_hash,
            block = ?receipt.block_number,
            "payment confirmed"
        );
        self.set_state(FulfillmentState::Succeeded { tx_hash });

        if let Some(request_id) = details.request_id.as_deref() {
            self.report_settlement(request_id, details.chain_id, tx_hash, payer)
                .await;
        }
        Ok(tx_hash)
    }

    async fn recipient_address(&self, recipient: &str) -> Result<Address, FulfillmentError> {
        if let Some(address) = parse_address(recipient) {
            return Ok(address);
        }
        if is_ens_name(recipient) {
            return self.wallet.resolve_name(recipient).await.map_err(|e| match e {
                WalletError::Unsupported(_) => FulfillmentError::Failed(format!(
                    "Could not resolve {recipient}: this wallet cannot look up ENS names"
                )),
                other => other.into(),
            });
        }
        Err(FulfillmentError::Failed(format!(
            "Recipient {recipient} is not a valid address"
        )))
    }

    /// Failures here are logged; the payment already succeeded.
    async fn report_settlement(&self, request_id: &str, chain_id: u64, tx_hash: TxHash, payer: Address) {
        let request_id = match RequestId::new(request_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(request_id, error = %e, "cannot report settlement");
                return;
            }
        };
        let link = link::service_url(&request_id);
        let report = FulfillmentReport {
            request_id,
            chain_id,
            tx_hash,
            payer_address: payer,
            link,
        };
        match self.service.submit_fulfillment(&report).await {
            Ok(()) => tracing::info!(request_id = %report.request_id, "settlement reported"),
            Err(e) => tracing::error!(
                request_id = %report.request_id,
                tx_hash = %tx_hash,
                error = %e,
                "settlement report failed"
            ),
        }
    }

    fn set_state(&self, next: FulfillmentState) {
        *self.state.borrow_mut() = next.clone();
        if let Some(observer) = self.observer.borrow().as_ref() {
            observer(&next);
        }
    }

    fn fail(&self, error: FulfillmentError) -> FulfillmentError {
        self.set_state(FulfillmentState::Failed {
            error: error.clone(),
        });
        error
    }
}

/// Wallet readiness against resolved details.
pub fn evaluate(details: &PaymentDetails, wallet: WalletStatus) -> FulfillmentState {
    match wallet {
        WalletStatus::Disconnected => FulfillmentState::AwaitingWallet,
        WalletStatus::Connected { chain_id, .. } if chain_id != details.chain_id => {
            FulfillmentState::NetworkMismatch {
                expected: details.chain_id,
                actual: chain_id,
            }
        }
        WalletStatus::Connected { .. } => FulfillmentState::Ready,
    }
}

fn action_for(state: &FulfillmentState, details: &PaymentDetails) -> Action {
    match state {
        FulfillmentState::AwaitingWallet => Action::ConnectWallet,
        FulfillmentState::NetworkMismatch { expected, .. } => Action::SwitchNetwork {
            chain_id: *expected,
            label: format!("Switch to {}", details.network_label()),
        },
        FulfillmentState::Ready => Action::Pay {
            amount_required: details.amount == RequestedAmount::Open,
        },
        _ => Action::None,
    }
}
