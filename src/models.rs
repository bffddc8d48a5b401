//! Core data models for the marketplace ledger
//!
//! This module contains the listing state machine types, the event
//! records appended to the audit trail, and shared identity aliases.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Party identity (seller, buyer, collection, marketplace itself)
pub type AccountId = String;

/// Composite identity of one asset: collection plus token id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingKey {
    pub collection: AccountId,
    pub token_id: u64,
}

impl ListingKey {
    /// Create a key for the given collection and token id
    pub fn new<S: Into<AccountId>>(collection: S, token_id: u64) -> Self {
        Self {
            collection: collection.into(),
            token_id,
        }
    }
}

/// An active sale offer for one asset
///
/// A stored listing always has a price greater than zero; absence from
/// the ledger map is the "not listed" state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Asking price, exact-match required at purchase time
    pub price: u64,
    /// Owner of the asset at listing time
    pub seller: AccountId,
    /// When the listing was created
    pub listed_at: DateTime<Utc>,
}

impl Listing {
    /// Create a new listing for the given seller and price
    pub fn new<S: Into<AccountId>>(price: u64, seller: S) -> Self {
        Self {
            price,
            seller: seller.into(),
            listed_at: Utc::now(),
        }
    }
}

/// Notification record appended to the audit trail, one per successful
/// mutating operation, and published to live subscribers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MarketEvent {
    /// A listing was created, or its price re-announced after an update
    ItemListed {
        id: Uuid,
        collection: AccountId,
        token_id: u64,
        price: u64,
        seller: AccountId,
        created_at: DateTime<Utc>,
    },
    /// A listing was removed by its owner
    ItemCanceled {
        id: Uuid,
        collection: AccountId,
        token_id: u64,
        seller: AccountId,
        created_at: DateTime<Utc>,
    },
    /// A listing was purchased: asset transferred, proceeds credited
    ItemBought {
        id: Uuid,
        collection: AccountId,
        token_id: u64,
        seller: AccountId,
        buyer: AccountId,
        price: u64,
        created_at: DateTime<Utc>,
    },
    /// A seller withdrew their accumulated proceeds
    ProceedsWithdrawn {
        id: Uuid,
        seller: AccountId,
        amount: u64,
        created_at: DateTime<Utc>,
    },
}

impl MarketEvent {
    /// Short name of the event kind, for logging and filtering
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ItemListed { .. } => "item.listed",
            Self::ItemCanceled { .. } => "item.canceled",
            Self::ItemBought { .. } => "item.bought",
            Self::ProceedsWithdrawn { .. } => "proceeds.withdrawn",
        }
    }

    pub(crate) fn item_listed(key: &ListingKey, price: u64, seller: &str) -> Self {
        Self::ItemListed {
            id: Uuid::new_v4(),
            collection: key.collection.clone(),
            token_id: key.token_id,
            price,
            seller: seller.to_string(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn item_canceled(key: &ListingKey, seller: &str) -> Self {
        Self::ItemCanceled {
            id: Uuid::new_v4(),
            collection: key.collection.clone(),
            token_id: key.token_id,
            seller: seller.to_string(),
            created_at: Utc::now(),
        }
    }

    pub(crate) fn item_bought(key: &ListingKey, seller: &str, buyer: &str, price: u64) -> Self {
        Self::ItemBought {
            id: Uuid::new_v4(),
            collection: key.collection.clone(),
            token_id: key.token_id,
            seller: seller.to_string(),
            buyer: buyer.to_string(),
            price,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn proceeds_withdrawn(seller: &str, amount: u64) -> Self {
        Self::ProceedsWithdrawn {
            id: Uuid::new_v4(),
            seller: seller.to_string(),
            amount,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_key_equality_is_composite() {
        let a = ListingKey::new("basic-nft", 0);
        let b = ListingKey::new("basic-nft", 0);
        let c = ListingKey::new("basic-nft", 1);
        let d = ListingKey::new("other-nft", 0);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn event_serializes_with_kind_tag() {
        let event = MarketEvent::item_bought(&ListingKey::new("basic-nft", 7), "alice", "bob", 100);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["kind"], "ItemBought");
        assert_eq!(json["seller"], "alice");
        assert_eq!(json["buyer"], "bob");
        assert_eq!(json["price"], 100);
        assert_eq!(event.kind(), "item.bought");
    }
}
