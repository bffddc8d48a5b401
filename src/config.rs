//! Configuration for the marketplace engine
//!
//! Settings can be supplied programmatically, loaded from a file, or
//! overridden through `MARKET_`-prefixed environment variables.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{error::MarketError, models::AccountId, MarketResult};

/// Configuration for the marketplace engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Identity of the marketplace itself, compared against the
    /// registry's approval record before an asset may be listed
    pub marketplace_account: AccountId,
    /// Capacity of the live event broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            marketplace_account: "marketplace".to_string(),
            event_channel_capacity: 256,
        }
    }
}

impl MarketplaceConfig {
    /// Load configuration from an optional file, with environment
    /// variables (`MARKET_MARKETPLACE_ACCOUNT`, ...) taking precedence
    pub fn load(path: Option<&str>) -> MarketResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }

        builder
            .add_source(Environment::with_prefix("MARKET").try_parsing(true))
            .build()
            .and_then(|settings| settings.try_deserialize())
            .map_err(|err| MarketError::config(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = MarketplaceConfig::default();

        assert_eq!(config.marketplace_account, "marketplace");
        assert!(config.event_channel_capacity > 0);
    }

    #[test]
    fn load_without_file_falls_back_to_defaults() {
        let config = MarketplaceConfig::load(None).unwrap();

        assert_eq!(config.marketplace_account, "marketplace");
    }

    #[test]
    fn load_rejects_missing_file() {
        let result = MarketplaceConfig::load(Some("/nonexistent/market.toml"));

        assert!(matches!(result, Err(MarketError::Config(_))));
    }
}
