use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain used when a link or form does not name one.
pub const DEFAULT_CHAIN: Chain = Chain::Optimism;

/// Token used when a link or form does not name one.
pub const DEFAULT_TOKEN: Token = Token::Usdc;

/// Symbol reported for tracked requests whose details omit one.
pub const DEFAULT_TOKEN_SYMBOL: &str = "USDC";

/// Both supported stablecoins use 6 decimal places on every chain.
pub const TOKEN_DECIMALS: u32 = 6;

/// Default base URL of the external payment-request API.
pub const PEANUT_API_URL: &str = "https://api.peanut.to";

/// Link shape the external service hands out for tracked requests.
pub const PEANUT_REQUEST_LINK: &str = "https://peanut.to/request/pay";

/// Public mainnet RPC used for ENS lookups when none is configured.
pub const ETH_RPC_URL: &str = "https://cloudflare-eth.com";

/// Networks a payment link may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Mainnet,
    Optimism,
    Arbitrum,
    Polygon,
}

impl Chain {
    pub const ALL: [Chain; 4] = [Chain::Mainnet, Chain::Optimism, Chain::Arbitrum, Chain::Polygon];

    /// EIP-155 chain id.
    pub fn id(self) -> u64 {
        match self {
            Chain::Mainnet => 1,
            Chain::Optimism => 10,
            Chain::Arbitrum => 42161,
            Chain::Polygon => 137,
        }
    }

    pub fn from_id(chain_id: u64) -> Option<Chain> {
        Chain::ALL.into_iter().find(|c| c.id() == chain_id)
    }

    /// Slug used in links and forms.
    pub fn name(self) -> &'static str {
        match self {
            Chain::Mainnet => "mainnet",
            Chain::Optimism => "optimism",
            Chain::Arbitrum => "arbitrum",
            Chain::Polygon => "polygon",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Chain::Mainnet => "Ethereum",
            Chain::Optimism => "Optimism",
            Chain::Arbitrum => "Arbitrum",
            Chain::Polygon => "Polygon",
        }
    }

    pub fn explorer_base(self) -> &'static str {
        match self {
            Chain::Mainnet => "https://etherscan.io",
            Chain::Optimism => "https://optimistic.etherscan.io",
            Chain::Arbitrum => "https://arbiscan.io",
            Chain::Polygon => "https://polygonscan.com",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Chain {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Chain::ALL
            .into_iter()
            .find(|c| c.name() == lower)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Tokens a payment link may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    Usdc,
    Usdt,
}

impl Token {
    pub const ALL: [Token; 2] = [Token::Usdc, Token::Usdt];

    /// Lowercase slug used in links and forms.
    pub fn slug(self) -> &'static str {
        match self {
            Token::Usdc => "usdc",
            Token::Usdt => "usdt",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Token::Usdc => "USDC",
            Token::Usdt => "USDT",
        }
    }

    pub fn decimals(self) -> u32 {
        TOKEN_DECIMALS
    }

    /// Contract address of this token on `chain`.
    pub fn address_on(self, chain: Chain) -> Address {
        match (self, chain) {
            (Token::Usdc, Chain::Mainnet) => address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"),
            (Token::Usdc, Chain::Optimism) => address!("0b2c639c533813f4aa9d7837caf62653d097ff85"),
            (Token::Usdc, Chain::Arbitrum) => address!("af88d065e77c8cc2239327c5edb3a432268e5831"),
            (Token::Usdc, Chain::Polygon) => address!("3c499c542cef5e3811e1192ce70d8cc03d5c3359"),
            (Token::Usdt, Chain::Mainnet) => address!("dac17f958d2ee523a2206206994597c13d831ec7"),
            (Token::Usdt, Chain::Optimism) => address!("94b008aa00579c1307b0ef2c499ad98a8ce58e58"),
            (Token::Usdt, Chain::Arbitrum) => address!("fd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9"),
            (Token::Usdt, Chain::Polygon) => address!("c2132d05d31c914a87c6611c10748aeb04b58e8f"),
        }
    }

    /// Reverse lookup of a contract address, across all chains.
    pub fn from_address(token_address: Address) -> Option<Token> {
        Token::ALL.into_iter().find(|t| {
            Chain::ALL
                .into_iter()
                .any(|c| t.address_on(c) == token_address)
        })
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Token {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Token::ALL
            .into_iter()
            .find(|t| t.slug() == lower)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// A chain or token name outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported value: {0}")]
pub struct UnknownVariant(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_ids_roundtrip_through_table() {
        for chain in Chain::ALL {
            assert_eq!(Chain::from_id(chain.id()), Some(chain));
        }
        assert_eq!(Chain::from_id(8453), None);
    }

    #[test]
    fn test_chain_names_are_case_insensitive() {
        assert_eq!("Optimism".parse::<Chain>(), Ok(Chain::Optimism));
        assert_eq!(" ARBITRUM ".parse::<Chain>(), Ok(Chain::Arbitrum));
        assert!("base".parse::<Chain>().is_err());
    }

    #[test]
    fn test_token_parse_and_symbols() {
        assert_eq!("USDT".parse::<Token>(), Ok(Token::Usdt));
        assert_eq!(Token::Usdc.symbol(), "USDC");
        assert!("dai".parse::<Token>().is_err());
    }

    #[test]
    fn test_token_addresses_are_distinct_per_chain() {
        let usdc_op = Token::Usdc.address_on(Chain::Optimism);
        assert_ne!(usdc_op, Token::Usdc.address_on(Chain::Mainnet));
        assert_eq!(Token::from_address(usdc_op), Some(Token::Usdc));
        assert_eq!(Token::from_address(Address::ZERO), None);
    }

    #[test]
    fn test_serde_uses_slugs() {
        assert_eq!(serde_json::to_string(&Chain::Polygon).unwrap(), "\"polygon\"");
        let token: Token = serde_json::from_str("\"usdt\"").unwrap();
        assert_eq!(token, Token::Usdt);
    }
}
