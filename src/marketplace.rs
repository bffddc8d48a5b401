//! Marketplace Ledger - Listing and proceeds state machine
//!
//! This module implements the escrow marketplace core: owners list an
//! asset at a price, buyers purchase by sending exactly matching
//! payment, proceeds accrue per-seller and are withdrawn on demand.
//!
//! The one structural rule is checks-effects-interactions: every
//! operation finishes all of its own bookkeeping, with no lock held,
//! before any call crosses the component boundary. A collaborator that
//! re-enters the marketplace during `buy_item`'s transfer step observes
//! an already-cleared listing and cannot purchase twice or double-credit
//! proceeds.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

use crate::{
    config::MarketplaceConfig,
    error::MarketError,
    models::{AccountId, Listing, ListingKey, MarketEvent},
    payout::PayoutProvider,
    registry::AssetRegistry,
    MarketResult,
};

/// The marketplace engine
///
/// Owns the listing and proceeds maps exclusively; asset ownership truth
/// stays with the injected [`AssetRegistry`] and is queried fresh on
/// every authorization check.
pub struct Marketplace {
    /// Configuration
    config: MarketplaceConfig,
    /// Active listings, keyed by (collection, token id)
    listings: Arc<RwLock<HashMap<ListingKey, Listing>>>,
    /// Accumulated sale proceeds per seller, withdrawable on demand
    proceeds: Arc<RwLock<HashMap<AccountId, u64>>>,
    /// Sale credits escrowed while a transfer is in flight; unreachable
    /// by withdrawals until the transfer has gone through
    pending: Arc<RwLock<HashMap<AccountId, u64>>>,
    /// Audit trail of every successful mutating operation
    events: Arc<RwLock<Vec<MarketEvent>>>,
    /// Live event stream for external consumers
    event_tx: broadcast::Sender<MarketEvent>,
    /// External authority for asset ownership and transfer execution
    registry: Arc<dyn AssetRegistry>,
    /// External funds delivery for withdrawals
    payout: Arc<dyn PayoutProvider>,
}

impl Marketplace {
    /// Create a new marketplace over the given collaborators
    pub fn new(
        config: MarketplaceConfig,
        registry: Arc<dyn AssetRegistry>,
        payout: Arc<dyn PayoutProvider>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));

        Self {
            config,
            listings: Arc::new(RwLock::new(HashMap::new())),
            proceeds: Arc::new(RwLock::new(HashMap::new())),
            pending: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
            event_tx,
            registry,
            payout,
        }
    }

    /// List an asset for sale
    ///
    /// Fails with `InvalidPrice` for a zero price, `NotOwner` unless the
    /// caller currently owns the asset, `AlreadyListed` if an active
    /// listing exists for any seller, and `NotApprovedForMarketplace`
    /// unless the registry shows an approval for the marketplace's own
    /// account. Listing again never silently updates; use
    /// [`update_listing`](Self::update_listing) for that.
    pub async fn list_item(
        &self,
        collection: &str,
        token_id: u64,
        price: u64,
        caller: &str,
    ) -> MarketResult<()> {
        if price == 0 {
            return Err(MarketError::InvalidPrice);
        }

        let owner = self.registry.owner_of(collection, token_id).await?;
        if owner != caller {
            return Err(MarketError::not_owner(collection, token_id));
        }

        let key = ListingKey::new(collection, token_id);
        if self.listings.read().await.contains_key(&key) {
            return Err(MarketError::AlreadyListed {
                collection: key.collection,
                token_id,
            });
        }

        let approved = self.registry.get_approved(collection, token_id).await?;
        if approved.as_deref() != Some(self.config.marketplace_account.as_str()) {
            return Err(MarketError::NotApprovedForMarketplace {
                collection: key.collection,
                token_id,
            });
        }

        {
            let mut listings = self.listings.write().await;
            if listings.contains_key(&key) {
                return Err(MarketError::AlreadyListed {
                    collection: key.collection,
                    token_id,
                });
            }
            listings.insert(key.clone(), Listing::new(price, caller));
        }

        info!(
            "Listed asset {}#{} at {} by {}",
            collection, token_id, price, caller
        );

        self.record_event(MarketEvent::item_listed(&key, price, caller))
            .await;

        Ok(())
    }

    /// Cancel an active listing
    ///
    /// Ownership is re-checked at cancel time, not just at list time:
    /// when the asset changed hands outside the marketplace, only the
    /// new owner may cancel the stale listing.
    pub async fn cancel_listing(
        &self,
        collection: &str,
        token_id: u64,
        caller: &str,
    ) -> MarketResult<()> {
        let key = ListingKey::new(collection, token_id);
        if !self.listings.read().await.contains_key(&key) {
            return Err(MarketError::not_listed(collection, token_id));
        }

        let owner = self.registry.owner_of(collection, token_id).await?;
        if owner != caller {
            return Err(MarketError::not_owner(collection, token_id));
        }

        let removed = self.listings.write().await.remove(&key);
        if removed.is_none() {
            return Err(MarketError::not_listed(collection, token_id));
        }

        info!("Canceled listing {}#{} by {}", collection, token_id, caller);

        self.record_event(MarketEvent::item_canceled(&key, caller))
            .await;

        Ok(())
    }

    /// Update the price of an active listing
    ///
    /// Overwrites the price in place; the stored seller is not
    /// re-derived from current ownership. Re-announces the listing with
    /// the same event kind as [`list_item`](Self::list_item), naming
    /// the caller — the verified current owner — not the stored seller.
    pub async fn update_listing(
        &self,
        collection: &str,
        token_id: u64,
        new_price: u64,
        caller: &str,
    ) -> MarketResult<()> {
        if new_price == 0 {
            return Err(MarketError::InvalidPrice);
        }

        let key = ListingKey::new(collection, token_id);
        if !self.listings.read().await.contains_key(&key) {
            return Err(MarketError::not_listed(collection, token_id));
        }

        let owner = self.registry.owner_of(collection, token_id).await?;
        if owner != caller {
            return Err(MarketError::not_owner(collection, token_id));
        }

        {
            let mut listings = self.listings.write().await;
            let listing = listings
                .get_mut(&key)
                .ok_or_else(|| MarketError::not_listed(collection, token_id))?;
            listing.price = new_price;
        }

        info!(
            "Updated listing {}#{} to {} by {}",
            collection, token_id, new_price, caller
        );

        self.record_event(MarketEvent::item_listed(&key, new_price, caller))
            .await;

        Ok(())
    }

    /// Buy a listed asset with an exactly matching payment
    ///
    /// Internal bookkeeping commits strictly before the external
    /// transfer: the listing is removed and the sale price escrowed
    /// first, then the registry is told to move the asset. The escrowed
    /// credit becomes withdrawable proceeds only once the transfer
    /// succeeds, so a reentrant withdrawal cannot drain a purchase that
    /// is about to fail. A transfer failure voids the escrowed credit
    /// and restores the listing; the operation is all-or-nothing.
    pub async fn buy_item(
        &self,
        collection: &str,
        token_id: u64,
        payment: u64,
        caller: &str,
    ) -> MarketResult<()> {
        let key = ListingKey::new(collection, token_id);

        let listing = {
            let mut listings = self.listings.write().await;
            let listing = listings
                .get(&key)
                .cloned()
                .ok_or_else(|| MarketError::not_listed(collection, token_id))?;

            if payment != listing.price {
                return Err(MarketError::PriceNotMet {
                    expected: listing.price,
                    offered: payment,
                });
            }

            listings.remove(&key);
            listing
        };

        {
            let mut pending = self.pending.write().await;
            let credit = pending.entry(listing.seller.clone()).or_insert(0);
            *credit = credit.saturating_add(payment);
        }

        // Untrusted call; all bookkeeping above is already committed and
        // no lock is held here
        if let Err(err) = self
            .registry
            .transfer_from(collection, &listing.seller, caller, token_id)
            .await
        {
            warn!(
                "Transfer of {}#{} failed, rolling back purchase: {}",
                collection, token_id, err
            );

            self.void_pending(&listing.seller, payment).await;
            self.listings.write().await.insert(key, listing);

            return Err(err);
        }

        // Transfer is final; release the escrowed credit for withdrawal
        self.void_pending(&listing.seller, payment).await;
        {
            let mut proceeds = self.proceeds.write().await;
            let balance = proceeds.entry(listing.seller.clone()).or_insert(0);
            *balance = balance.saturating_add(payment);
        }

        info!(
            "Sold asset {}#{} by {} to {} for {}",
            collection, token_id, listing.seller, caller, payment
        );

        self.record_event(MarketEvent::item_bought(
            &key,
            &listing.seller,
            caller,
            payment,
        ))
        .await;

        Ok(())
    }

    /// Withdraw the caller's accumulated proceeds
    ///
    /// The balance is zeroed before funds leave through the payout
    /// provider; a delivery failure restores it, so zeroing and payment
    /// form one atomic unit. Returns the amount withdrawn.
    pub async fn withdraw_proceeds(&self, caller: &str) -> MarketResult<u64> {
        let amount = {
            let mut proceeds = self.proceeds.write().await;
            match proceeds.remove(caller) {
                Some(amount) if amount > 0 => amount,
                _ => return Err(MarketError::NoProceeds),
            }
        };

        if let Err(err) = self.payout.pay(caller, amount).await {
            warn!(
                "Payout of {} to {} failed, restoring balance: {}",
                amount, caller, err
            );

            let mut proceeds = self.proceeds.write().await;
            let balance = proceeds.entry(caller.to_string()).or_insert(0);
            *balance = balance.saturating_add(amount);

            return Err(err);
        }

        info!("Withdrew proceeds of {} for {}", amount, caller);

        self.record_event(MarketEvent::proceeds_withdrawn(caller, amount))
            .await;

        Ok(amount)
    }

    /// Active listing for the asset, if any
    pub async fn get_listing(&self, collection: &str, token_id: u64) -> Option<Listing> {
        self.listings
            .read()
            .await
            .get(&ListingKey::new(collection, token_id))
            .cloned()
    }

    /// Accumulated proceeds owed to `seller`, zero by default
    pub async fn get_proceeds(&self, seller: &str) -> u64 {
        self.proceeds.read().await.get(seller).copied().unwrap_or(0)
    }

    /// Subscribe to live marketplace events
    pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of the full event audit trail
    pub async fn event_trail(&self) -> Vec<MarketEvent> {
        self.events.read().await.clone()
    }

    /// Audit trail serialized as a JSON array, for external indexers
    pub async fn event_trail_json(&self) -> MarketResult<String> {
        let events = self.events.read().await;
        Ok(serde_json::to_string(&*events)?)
    }

    /// Remove an in-flight credit from the escrow bucket
    ///
    /// Only `buy_item` touches the bucket, and each purchase removes
    /// exactly the amount it escrowed, so the subtraction is exact.
    async fn void_pending(&self, seller: &str, amount: u64) {
        let mut pending = self.pending.write().await;
        if let Some(credit) = pending.get_mut(seller) {
            *credit = credit.saturating_sub(amount);
            if *credit == 0 {
                pending.remove(seller);
            }
        }
    }

    /// Append to the audit trail and notify live subscribers
    async fn record_event(&self, event: MarketEvent) {
        self.events.write().await.push(event.clone());
        // Send only fails when nobody is subscribed
        let _ = self.event_tx.send(event);
    }
}
