//! Unsigned ERC-20 transfer construction.

use crate::amount::{Amount, AmountError};
use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;
use serde::{Deserialize, Serialize};

sol! {
    interface IERC20 {
        function transfer(address to, uint256 value) external returns (bool);
    }
}

/// Token standard of the requested asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Native,
    #[default]
    Erc20,
}

/// A transaction for the wallet to sign and send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransfer {
    pub chain_id: u64,
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
}

/// Inputs for [`prepare_transfer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSpec {
    pub chain_id: u64,
    pub recipient: Address,
    /// Token contract; ignored for native transfers.
    pub token_address: Address,
    pub amount: Amount,
    pub token_decimals: u32,
    pub token_type: TokenType,
}

/// Build the unsigned transaction that pays `spec.amount` to `spec.recipient`.
pub fn prepare_transfer(spec: &TransferSpec) -> Result<UnsignedTransfer, AmountError> {
    let value = spec.amount.to_base_units(spec.token_decimals)?;
    Ok(match spec.token_type {
        TokenType::Native => UnsignedTransfer {
            chain_id: spec.chain_id,
            to: spec.recipient,
            value,
            data: Bytes::new(),
        },
        TokenType::Erc20 => {
            let call = IERC20::transferCall {
                to: spec.recipient,
                value,
            };
            UnsignedTransfer {
                chain_id: spec.chain_id,
                to: spec.token_address,
                value: U256::ZERO,
                data: call.abi_encode().into(),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{Chain, Token};

    fn spec(token_type: TokenType) -> TransferSpec {
        TransferSpec {
            chain_id: Chain::Optimism.id(),
            recipient: Address::repeat_byte(0x11),
            token_address: Token::Usdc.address_on(Chain::Optimism),
            amount: Amount::parse("10").unwrap(),
            token_decimals: 6,
            token_type,
        }
    }

    #[test]
    fn test_erc20_transfer_calldata() {
        let tx = prepare_transfer(&spec(TokenType::Erc20)).unwrap();
        assert_eq!(tx.to, Token::Usdc.address_on(Chain::Optimism));
        assert_eq!(tx.value, U256::ZERO);
        // transfer(address,uint256) selector
        assert_eq!(&tx.data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(tx.data.len(), 4 + 32 + 32);

        let decoded = IERC20::transferCall::abi_decode(&tx.data).unwrap();
        assert_eq!(decoded.to, Address::repeat_byte(0x11));
        assert_eq!(decoded.value, U256::from(10_000_000u64));
    }

    #[test]
    fn test_native_transfer_sends_value() {
        let mut native = spec(TokenType::Native);
        native.token_decimals = 18;
        let tx = prepare_transfer(&native).unwrap();
        assert_eq!(tx.to, Address::repeat_byte(0x11));
        assert!(tx.data.is_empty());
        assert_eq!(tx.value, U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64)));
    }
}
