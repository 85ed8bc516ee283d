use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Asset class of a tradeable instrument. Commission rates and quote cache
/// lifetimes are per-class constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Stock,
    Crypto,
    Tamg,
}

impl AssetClass {
    /// Commission rate applied to the gross trade amount.
    /// TAMG subscriptions carry no commission.
    pub fn fee_rate(self) -> f64 {
        match self {
            AssetClass::Stock => 0.001,
            AssetClass::Crypto => 0.0015,
            AssetClass::Tamg => 0.0,
        }
    }

    /// How long a cached quote stays fresh. TAMG never goes through the
    /// market feed; its entry here is inert.
    pub fn quote_ttl(self) -> Duration {
        match self {
            AssetClass::Stock | AssetClass::Tamg => Duration::from_secs(300),
            AssetClass::Crypto => Duration::from_secs(120),
        }
    }
}
