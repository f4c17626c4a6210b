//! ENS forward resolution against the mainnet registry.

use crate::error::ServiceError;
use crate::validation::is_ens_name;
use alloy::primitives::{address, keccak256, Address, B256};
use alloy::providers::Provider;
use alloy::sol;

/// ENS registry, same address on mainnet and testnets.
pub const ENS_REGISTRY: Address = address!("00000000000C2E074eC69A0dFb2997BA6C7d2e1e");

sol! {
    #[sol(rpc)]
    interface EnsRegistry {
        function resolver(bytes32 node) external view returns (address);
    }

    #[sol(rpc)]
    interface EnsResolver {
        function addr(bytes32 node) external view returns (address);
    }
}

/// EIP-137 namehash. Labels are lowercased; full UTS-46 normalisation is not
/// applied.
pub fn namehash(name: &str) -> B256 {
    name.rsplit('.')
        .filter(|label| !label.is_empty())
        .fold(B256::ZERO, |node, label| {
            let label_hash = keccak256(label.to_lowercase().as_bytes());
            keccak256([node.as_slice(), label_hash.as_slice()].concat())
        })
}

/// Resolve `name` to the address its resolver reports.
///
/// A name without a resolver, or whose resolver returns the zero address,
/// is [`ServiceError::NotFound`].
pub async fn resolve_name<P: Provider>(provider: &P, name: &str) -> Result<Address, ServiceError> {
    if !is_ens_name(name) {
        return Err(ServiceError::InvalidRequest(format!(
            "'{name}' is not an ENS name"
        )));
    }
    let node = namehash(name);

    let resolver = EnsRegistry::new(ENS_REGISTRY, provider)
        .resolver(node)
        .call()
        .await
        .map_err(|e| ServiceError::HttpError(format!("ENS resolver lookup failed: {e}")))?;
    if resolver.is_zero() {
        return Err(ServiceError::NotFound(name.to_string()));
    }

    let resolved = EnsResolver::new(resolver, provider)
        .addr(node)
        .call()
        .await
        .map_err(|e| ServiceError::HttpError(format!("ENS addr lookup failed: {e}")))?;
    if resolved.is_zero() {
        return Err(ServiceError::NotFound(name.to_string()));
    }
    tracing::debug!(name, address = %resolved, "ENS name resolved");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::b256;
    use alloy::providers::RootProvider;

    #[test]
    fn test_namehash_vectors() {
        assert_eq!(namehash(""), B256::ZERO);
        assert_eq!(
            namehash("eth"),
            b256!("93cdeb708b7545dc668eb9280176169d1c33cfd8ed6f04690a0bcc88a93fc4ae")
        );
        assert_eq!(
            namehash("foo.eth"),
            b256!("de9b09fd7c5f901e23a3f19fecc54828e9c848539801e86591bd9801b019f84f")
        );
        assert_eq!(namehash("Foo.ETH"), namehash("foo.eth"));
    }

    #[tokio::test]
    async fn test_rejects_non_ens_names() {
        let provider =
            RootProvider::<alloy::network::Ethereum>::new_http("http://localhost:1".parse().unwrap());
        assert!(matches!(
            resolve_name(&provider, "alice").await,
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_rpc_is_http_error() {
        let provider =
            RootProvider::<alloy::network::Ethereum>::new_http("http://localhost:1".parse().unwrap());
        assert!(matches!(
            resolve_name(&provider, "alice.eth").await,
            Err(ServiceError::HttpError(_))
        ));
    }
}
