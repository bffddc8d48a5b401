//! Asset Registry - External authority for asset ownership
//!
//! The registry is the sole source of truth for who owns an asset and
//! whether the marketplace holds transfer approval. It is queried fresh
//! on every authorization check, never cached, since ownership may
//! change outside the marketplace at any time.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::{error::MarketError, models::AccountId, MarketResult};

/// Boundary contract toward the asset-ownership collaborator
///
/// `transfer_from` is untrusted: it executes outside the marketplace and
/// may attempt to re-enter it, which is why the engine finishes all of
/// its own bookkeeping before issuing the call.
#[async_trait]
pub trait AssetRegistry: Send + Sync {
    /// Current owner of the asset
    async fn owner_of(&self, collection: &str, token_id: u64) -> MarketResult<AccountId>;

    /// Account approved to transfer the asset, if any
    async fn get_approved(&self, collection: &str, token_id: u64)
        -> MarketResult<Option<AccountId>>;

    /// Move the asset from `from` to `to`; must fail loudly when the
    /// transfer is not authorized
    async fn transfer_from(
        &self,
        collection: &str,
        from: &str,
        to: &str,
        token_id: u64,
    ) -> MarketResult<()>;
}

/// Ownership record for one asset inside the in-memory registry
#[derive(Debug, Clone)]
struct AssetRecord {
    owner: AccountId,
    approved: Option<AccountId>,
}

/// In-memory asset registry for deterministic tests and demos
///
/// Mirrors the transfer semantics of a typical non-fungible asset
/// registry: a transfer requires an outstanding approval and clears it
/// on success, so a new owner must re-approve before re-listing.
#[derive(Default)]
pub struct InMemoryAssetRegistry {
    assets: Arc<RwLock<HashMap<(AccountId, u64), AssetRecord>>>,
}

impl InMemoryAssetRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly minted asset owned by `owner`
    pub async fn mint(&self, collection: &str, token_id: u64, owner: &str) {
        info!("Minting asset {}#{} to {}", collection, token_id, owner);

        self.assets.write().await.insert(
            (collection.to_string(), token_id),
            AssetRecord {
                owner: owner.to_string(),
                approved: None,
            },
        );
    }

    /// Grant `operator` approval to transfer the asset
    pub async fn approve(
        &self,
        collection: &str,
        token_id: u64,
        operator: &str,
    ) -> MarketResult<()> {
        let mut assets = self.assets.write().await;
        let record = assets
            .get_mut(&(collection.to_string(), token_id))
            .ok_or_else(|| Self::unknown_asset(collection, token_id))?;

        record.approved = Some(operator.to_string());
        Ok(())
    }

    /// Revoke any outstanding approval for the asset
    pub async fn revoke_approval(&self, collection: &str, token_id: u64) -> MarketResult<()> {
        let mut assets = self.assets.write().await;
        let record = assets
            .get_mut(&(collection.to_string(), token_id))
            .ok_or_else(|| Self::unknown_asset(collection, token_id))?;

        record.approved = None;
        Ok(())
    }

    fn unknown_asset(collection: &str, token_id: u64) -> MarketError {
        MarketError::registry(format!("unknown asset {}#{}", collection, token_id))
    }
}

#[async_trait]
impl AssetRegistry for InMemoryAssetRegistry {
    async fn owner_of(&self, collection: &str, token_id: u64) -> MarketResult<AccountId> {
        self.assets
            .read()
            .await
            .get(&(collection.to_string(), token_id))
            .map(|record| record.owner.clone())
            .ok_or_else(|| Self::unknown_asset(collection, token_id))
    }

    async fn get_approved(
        &self,
        collection: &str,
        token_id: u64,
    ) -> MarketResult<Option<AccountId>> {
        self.assets
            .read()
            .await
            .get(&(collection.to_string(), token_id))
            .map(|record| record.approved.clone())
            .ok_or_else(|| Self::unknown_asset(collection, token_id))
    }

    async fn transfer_from(
        &self,
        collection: &str,
        from: &str,
        to: &str,
        token_id: u64,
    ) -> MarketResult<()> {
        let mut assets = self.assets.write().await;
        let record = assets
            .get_mut(&(collection.to_string(), token_id))
            .ok_or_else(|| Self::unknown_asset(collection, token_id))?;

        if record.owner != from {
            return Err(MarketError::registry(format!(
                "{} does not own asset {}#{}",
                from, collection, token_id
            )));
        }
        if record.approved.is_none() {
            return Err(MarketError::registry(format!(
                "no transfer approval outstanding for asset {}#{}",
                collection, token_id
            )));
        }

        record.owner = to.to_string();
        // Approval is single-use and does not survive a custody change
        record.approved = None;

        info!(
            "Transferred asset {}#{} from {} to {}",
            collection, token_id, from, to
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mint_sets_owner_without_approval() {
        let registry = InMemoryAssetRegistry::new();
        registry.mint("basic-nft", 0, "alice").await;

        assert_eq!(registry.owner_of("basic-nft", 0).await.unwrap(), "alice");
        assert_eq!(registry.get_approved("basic-nft", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_asset_is_a_registry_error() {
        let registry = InMemoryAssetRegistry::new();

        let result = registry.owner_of("basic-nft", 42).await;
        assert!(matches!(result, Err(MarketError::Registry(_))));
    }

    #[tokio::test]
    async fn transfer_requires_approval_and_clears_it() {
        let registry = InMemoryAssetRegistry::new();
        registry.mint("basic-nft", 0, "alice").await;

        let unapproved = registry.transfer_from("basic-nft", "alice", "bob", 0).await;
        assert!(matches!(unapproved, Err(MarketError::Registry(_))));

        registry.approve("basic-nft", 0, "marketplace").await.unwrap();
        registry
            .transfer_from("basic-nft", "alice", "bob", 0)
            .await
            .unwrap();

        assert_eq!(registry.owner_of("basic-nft", 0).await.unwrap(), "bob");
        assert_eq!(registry.get_approved("basic-nft", 0).await.unwrap(), None);
    }

    #[tokio::test]
    async fn transfer_rejects_stale_owner() {
        let registry = InMemoryAssetRegistry::new();
        registry.mint("basic-nft", 0, "alice").await;
        registry.approve("basic-nft", 0, "marketplace").await.unwrap();

        let result = registry.transfer_from("basic-nft", "carol", "bob", 0).await;
        assert!(matches!(result, Err(MarketError::Registry(_))));
        assert_eq!(registry.owner_of("basic-nft", 0).await.unwrap(), "alice");
    }
}
