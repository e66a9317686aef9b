//! Ethers-backed land registry contract handle.

use async_trait::async_trait;
use ethers::{
    contract::{abigen, ContractCall, ContractError},
    providers::{Middleware, MiddlewareError, PendingTransaction, ProviderError},
    types::{Address, H256, U64},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::traits::{LandRegistry, RemoteFailure, TransactionHandle};
use crate::core::domain::LandDetails;

abigen!(
    LandRegistryContract,
    r#"[
        function registerLand(string landId, string ownerName, string ownerContact) external
        function getLandDetails(string landId) external view returns (string, string, string, address, bool)
        function transferLand(string landId, address newOwner, string newOwnerName, string newOwnerContact) external
    ]"#
);

/// Normalizes a contract call error: a decoded `Error(string)` revert or the
/// JSON-RPC error message is the structured reason.
pub fn contract_failure<M: Middleware>(err: ContractError<M>) -> RemoteFailure {
    let reason = err.decode_revert::<String>().or_else(|| {
        err.as_middleware_error()
            .and_then(|e| e.as_error_response())
            .map(|resp| resp.message.clone())
    });
    RemoteFailure { reason, message: Some(err.to_string()) }
}

pub fn provider_failure(err: &ProviderError) -> RemoteFailure {
    RemoteFailure {
        reason: err.as_error_response().map(|resp| resp.message.clone()),
        message: Some(err.to_string()),
    }
}

/// Contract handle whose mutating calls are sent `from` one account.
pub struct EthersLandRegistry<M: Middleware> {
    contract: LandRegistryContract<M>,
    client: Arc<M>,
    from: Address,
    confirmations: usize,
}

impl<M: Middleware + 'static> EthersLandRegistry<M> {
    pub fn new(address: Address, client: Arc<M>, from: Address, confirmations: usize) -> Self {
        Self {
            contract: LandRegistryContract::new(address, client.clone()),
            client,
            from,
            confirmations: confirmations.max(1),
        }
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }

    async fn submit(&self, call: ContractCall<M, ()>) -> Result<Box<dyn TransactionHandle>, RemoteFailure> {
        let call = call.from(self.from);
        let pending = call.send().await.map_err(contract_failure)?;
        let tx_hash = pending.tx_hash();
        info!(tx_hash = ?tx_hash, from = ?self.from, "Transaction sent");
        Ok(Box::new(EthersTransaction {
            client: self.client.clone(),
            tx_hash,
            confirmations: self.confirmations,
        }))
    }
}

#[async_trait]
impl<M: Middleware + 'static> LandRegistry for EthersLandRegistry<M> {
    async fn register_land(
        &self,
        land_id: &str,
        owner_name: &str,
        owner_contact: &str,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure> {
        debug!(land_id = %land_id, "registerLand");
        let call = self.contract.register_land(
            land_id.to_string(),
            owner_name.to_string(),
            owner_contact.to_string(),
        );
        self.submit(call).await
    }

    async fn get_land_details(&self, land_id: &str) -> Result<LandDetails, RemoteFailure> {
        debug!(land_id = %land_id, "getLandDetails");
        self.contract
            .get_land_details(land_id.to_string())
            .from(self.from)
            .call()
            .await
            .map_err(contract_failure)
    }

    async fn transfer_land(
        &self,
        land_id: &str,
        new_owner: Address,
        new_owner_name: &str,
        new_owner_contact: &str,
    ) -> Result<Box<dyn TransactionHandle>, RemoteFailure> {
        debug!(land_id = %land_id, new_owner = ?new_owner, "transferLand");
        let call = self.contract.transfer_land(
            land_id.to_string(),
            new_owner,
            new_owner_name.to_string(),
            new_owner_contact.to_string(),
        );
        self.submit(call).await
    }
}

/// Pending transaction tracked by hash so it does not borrow the call.
pub struct EthersTransaction<M: Middleware> {
    client: Arc<M>,
    tx_hash: H256,
    confirmations: usize,
}

#[async_trait]
impl<M: Middleware + 'static> TransactionHandle for EthersTransaction<M> {
    fn tx_hash(&self) -> String {
        format!("0x{}", hex::encode(self.tx_hash.as_bytes()))
    }

    async fn await_confirmation(&self) -> Result<(), RemoteFailure> {
        let receipt = PendingTransaction::new(self.tx_hash, self.client.provider())
            .confirmations(self.confirmations)
            .await
            .map_err(|e| provider_failure(&e))?;
        match receipt {
            Some(receipt) if receipt.status == Some(U64::from(1)) => {
                debug!(tx_hash = %self.tx_hash(), block = ?receipt.block_number, "Transaction confirmed");
                Ok(())
            }
            Some(_) => {
                warn!(tx_hash = %self.tx_hash(), "Transaction reverted");
                Err(RemoteFailure::with_reason("Transaction reverted"))
            }
            None => Err(RemoteFailure::with_message("Transaction dropped before confirmation")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::{encode, Token};
    use ethers::providers::{MockProvider, Provider};
    use ethers::types::Bytes;
    use serde_json::json;

    fn registry_with(mock: MockProvider) -> EthersLandRegistry<Provider<MockProvider>> {
        let provider = Arc::new(Provider::new(mock));
        EthersLandRegistry::new(Address::repeat_byte(0xaa), provider, Address::repeat_byte(0x01), 1)
    }

    #[tokio::test]
    async fn get_land_details_decodes_tuple() {
        let owner = Address::repeat_byte(0x42);
        let encoded = encode(&[
            Token::String("CITY-001".into()),
            Token::String("Alice".into()),
            Token::String("alice@example.com".into()),
            Token::Address(owner),
            Token::Bool(true),
        ]);
        let mock = MockProvider::new();
        mock.push::<Bytes, _>(Bytes::from(encoded)).unwrap();

        let details = registry_with(mock).get_land_details("CITY-001").await.unwrap();
        assert_eq!(
            details,
            ("CITY-001".to_string(), "Alice".to_string(), "alice@example.com".to_string(), owner, true)
        );
    }

    #[tokio::test]
    async fn get_land_details_error_is_a_failure() {
        let mock = MockProvider::new();
        mock.push(json!("0x")).unwrap();
        let result = registry_with(mock).get_land_details("NOPE-999").await;
        let failure = result.unwrap_err();
        assert!(failure.message.is_some());
    }

    #[test]
    fn registry_reports_bound_address() {
        let registry = registry_with(MockProvider::new());
        assert_eq!(registry.address(), Address::repeat_byte(0xaa));
    }

    #[test]
    fn tx_hash_is_prefixed_hex() {
        let provider = Arc::new(Provider::new(MockProvider::new()));
        let tx = EthersTransaction { client: provider, tx_hash: H256::repeat_byte(0xab), confirmations: 1 };
        let hash = tx.tx_hash();
        assert!(hash.starts_with("0xabab"));
        assert_eq!(hash.len(), 66);
    }
}
