//! Payout provider - Delivers withdrawn proceeds to sellers
//!
//! Withdrawals cross the component boundary through this trait. The
//! engine zeroes a seller's balance before calling `pay` and restores it
//! if delivery fails, so the provider never observes a balance that is
//! still withdrawable.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::{models::AccountId, MarketResult};

/// Boundary contract toward the funds-delivery collaborator
#[async_trait]
pub trait PayoutProvider: Send + Sync {
    /// Deliver `amount` to `to`; an error aborts the whole withdrawal
    async fn pay(&self, to: &str, amount: u64) -> MarketResult<()>;
}

/// In-memory payout ledger for deterministic tests and demos
///
/// Credits each recipient's balance instead of moving real funds.
#[derive(Default)]
pub struct InMemoryPayout {
    balances: Arc<RwLock<HashMap<AccountId, u64>>>,
}

impl InMemoryPayout {
    /// Create an empty payout ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount delivered to `account` so far
    pub async fn balance_of(&self, account: &str) -> u64 {
        self.balances
            .read()
            .await
            .get(account)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl PayoutProvider for InMemoryPayout {
    async fn pay(&self, to: &str, amount: u64) -> MarketResult<()> {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(to.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount);

        info!("Paid out {} to {}", amount, to);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pay_accumulates_per_recipient() {
        let payout = InMemoryPayout::new();

        payout.pay("alice", 100).await.unwrap();
        payout.pay("alice", 25).await.unwrap();
        payout.pay("bob", 7).await.unwrap();

        assert_eq!(payout.balance_of("alice").await, 125);
        assert_eq!(payout.balance_of("bob").await, 7);
        assert_eq!(payout.balance_of("carol").await, 0);
    }
}
