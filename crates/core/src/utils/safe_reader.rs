use crate::actions::owner_action::ApprovalState;
use crate::actions::safe_transaction::SafeTransaction;
use crate::bindings::multisig::GnosisSafe;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::Provider;
use eyre::{Result, eyre};
use log::{debug, info};

/// Read-only view of a deployed Safe.
pub struct SafeReader<P> {
    provider: P,
    safe: Address,
}

impl<P> SafeReader<P>
where
    P: Provider + Clone + Send + Sync + 'static,
{
    pub fn new(provider: P, safe: Address) -> Self {
        debug!("Creating SafeReader for {}", safe);
        Self { provider, safe }
    }

    pub async fn chain_id(&self) -> Result<u64> {
        Ok(self.provider.get_chain_id().await?)
    }

    pub async fn nonce(&self) -> Result<U256> {
        let safe = GnosisSafe::new(self.safe, self.provider.clone());
        let nonce = safe.nonce().call().await?.nonce;
        debug!("Safe {} nonce {}", self.safe, nonce);
        Ok(nonce)
    }

    pub async fn owners(&self) -> Result<Vec<Address>> {
        let safe = GnosisSafe::new(self.safe, self.provider.clone());
        Ok(safe.getOwners().call().await?.owners)
    }

    pub async fn threshold(&self) -> Result<usize> {
        let safe = GnosisSafe::new(self.safe, self.provider.clone());
        let threshold = safe.getThreshold().call().await?.threshold;
        usize::try_from(threshold)
            .map_err(|_| eyre!("SafeReader: threshold {} too large", threshold))
    }

    /// `getTransactionHash` as computed by the Safe itself.
    pub async fn transaction_hash(&self, tx: &SafeTransaction) -> Result<B256> {
        let safe = GnosisSafe::new(self.safe, self.provider.clone());
        let hash = safe
            .getTransactionHash(
                tx.to,
                tx.value,
                tx.data.clone(),
                tx.operation.as_u8(),
                tx.safe_tx_gas,
                tx.base_gas,
                tx.gas_price,
                tx.gas_token,
                tx.refund_receiver,
                tx.nonce,
            )
            .call()
            .await?
            ._0;
        Ok(hash)
    }

    pub async fn has_approved(&self, owner: Address, safe_hash: B256) -> Result<bool> {
        let safe = GnosisSafe::new(self.safe, self.provider.clone());
        let approved = safe
            .approvedHashes(owner, safe_hash)
            .call()
            .await?
            ._0;
        Ok(approved != U256::ZERO)
    }

    pub async fn approval_state(&self, safe_hash: B256) -> Result<ApprovalState> {
        let (owners, threshold) = tokio::try_join!(self.owners(), self.threshold())?;

        let mut approved = Vec::new();
        for owner in &owners {
            if self.has_approved(*owner, safe_hash).await? {
                approved.push(*owner);
            }
        }
        info!(
            "Safe {}: {} of {} required approvals for {}",
            self.safe,
            approved.len(),
            threshold,
            safe_hash
        );

        Ok(ApprovalState {
            owners,
            threshold,
            approved,
        })
    }
}
