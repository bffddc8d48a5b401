//! Error types for the marketplace ledger
//!
//! Every rejected operation maps to a distinct, named error kind so that
//! callers can branch programmatically instead of string-matching a
//! generic failure.

use thiserror::Error;

use crate::models::AccountId;

/// Main error type for marketplace operations
#[derive(Error, Debug)]
pub enum MarketError {
    /// Listing price of zero (or an update to zero) was submitted
    #[error("price must be greater than zero")]
    InvalidPrice,

    /// Caller is not the current owner of the asset per the registry
    #[error("caller is not the owner of asset {token_id} in collection {collection}")]
    NotOwner {
        collection: AccountId,
        token_id: u64,
    },

    /// An active listing already exists for this asset
    #[error("asset {token_id} in collection {collection} is already listed")]
    AlreadyListed {
        collection: AccountId,
        token_id: u64,
    },

    /// The registry has not approved the marketplace to move this asset
    #[error("marketplace is not approved to transfer asset {token_id} in collection {collection}")]
    NotApprovedForMarketplace {
        collection: AccountId,
        token_id: u64,
    },

    /// No active listing exists for this asset
    #[error("asset {token_id} in collection {collection} is not listed")]
    NotListed {
        collection: AccountId,
        token_id: u64,
    },

    /// Payment does not match the listing price exactly
    #[error("payment of {offered} does not meet the listing price of {expected}")]
    PriceNotMet { expected: u64, offered: u64 },

    /// Withdrawal attempted against an empty proceeds balance
    #[error("no proceeds available for withdrawal")]
    NoProceeds,

    /// Asset registry collaborator rejected or failed a call
    #[error("asset registry error: {0}")]
    Registry(String),

    /// Payout collaborator failed to deliver funds
    #[error("payout error: {0}")]
    Payout(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MarketError {
    /// Create an asset registry error
    pub fn registry<S: Into<String>>(msg: S) -> Self {
        Self::Registry(msg.into())
    }

    /// Create a payout error
    pub fn payout<S: Into<String>>(msg: S) -> Self {
        Self::Payout(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-listed error for the given key
    pub fn not_listed<S: Into<AccountId>>(collection: S, token_id: u64) -> Self {
        Self::NotListed {
            collection: collection.into(),
            token_id,
        }
    }

    /// Create a not-owner error for the given key
    pub fn not_owner<S: Into<AccountId>>(collection: S, token_id: u64) -> Self {
        Self::NotOwner {
            collection: collection.into(),
            token_id,
        }
    }
}
