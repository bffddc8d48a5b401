//! Peer-to-peer escrow marketplace for non-fungible asset transfers
//!
//! Owners list an asset at a price, buyers purchase by sending exactly
//! matching payment, proceeds accrue per-seller and are withdrawn on
//! demand. The crate owns the listing and proceeds ledgers; asset
//! ownership truth lives behind the injected [`registry::AssetRegistry`]
//! collaborator, and withdrawn funds leave through
//! [`payout::PayoutProvider`]. All bookkeeping commits before any call
//! crosses those boundaries, which closes the reentrancy window around
//! the external transfer step.

pub mod config;
pub mod error;
pub mod marketplace;
pub mod models;
pub mod payout;
pub mod registry;

use error::MarketError;

/// Result type alias for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
