use serde::{Deserialize, Serialize};

/// Point-in-time quote for one symbol, either from the market-data provider
/// or synthesized by the fallback path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
}
