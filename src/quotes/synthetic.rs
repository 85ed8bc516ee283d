//! Synthetic quote fallback. When the market-data provider is down or
//! unconfigured, quotes come from a hard-coded base price table with a
//! bounded pseudo-random perturbation. The perturbation is deterministic
//! within one time bucket so repeated cache misses agree with each other.

use crate::types::asset::AssetClass;
use crate::types::quote::Quote;

const STOCK_BASES: &[(&str, f64)] = &[
    ("AAPL", 178.50),
    ("MSFT", 415.20),
    ("GOOGL", 141.80),
    ("AMZN", 172.30),
    ("NVDA", 118.60),
    ("META", 472.10),
    ("TSLA", 244.90),
    ("JPM", 198.40),
    ("V", 271.55),
    ("WMT", 67.20),
];

const CRYPTO_BASES: &[(&str, f64)] = &[
    ("BTC", 64250.0),
    ("ETH", 3150.0),
    ("SOL", 142.50),
    ("BNB", 571.00),
    ("XRP", 0.52),
    ("ADA", 0.38),
    ("DOGE", 0.12),
    ("DOT", 6.10),
    ("AVAX", 26.40),
    ("LINK", 13.75),
];

const DEFAULT_STOCK_BASE: f64 = 50.0;
const DEFAULT_CRYPTO_BASE: f64 = 1.0;

/// Perturbation band per class: stocks wobble ±3%, crypto ±8%.
fn band(class: AssetClass) -> f64 {
    match class {
        AssetClass::Stock | AssetClass::Tamg => 0.03,
        AssetClass::Crypto => 0.08,
    }
}

fn base_price(symbol: &str, class: AssetClass) -> f64 {
    let (table, default) = match class {
        AssetClass::Crypto => (CRYPTO_BASES, DEFAULT_CRYPTO_BASE),
        AssetClass::Stock | AssetClass::Tamg => (STOCK_BASES, DEFAULT_STOCK_BASE),
    };
    table
        .iter()
        .find(|(sym, _)| *sym == symbol)
        .map(|(_, price)| *price)
        .unwrap_or(default)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D049BB133111EB);
    x ^ (x >> 31)
}

fn symbol_seed(symbol: &str, bucket: u64) -> u64 {
    let mut seed = bucket;
    for byte in symbol.bytes() {
        seed = splitmix64(seed ^ u64::from(byte));
    }
    seed
}

/// Uniform value in `[0, 1)` derived from the seed.
pub fn unit_roll(seed: u64) -> f64 {
    (splitmix64(seed) >> 11) as f64 / (1u64 << 53) as f64
}

/// Build a synthetic quote for the given time bucket (minutes since epoch).
pub fn synthetic_quote(symbol: &str, class: AssetClass, bucket: u64) -> Quote {
    let base = base_price(symbol, class);
    let seed = symbol_seed(symbol, bucket);
    // [-1, 1) scaled into the class band.
    let swing = (unit_roll(seed) * 2.0 - 1.0) * band(class);
    let price = base * (1.0 + swing);
    let volume = 100_000.0 + unit_roll(seed.wrapping_add(1)) * 4_900_000.0;
    Quote {
        symbol: symbol.to_string(),
        price,
        change: price - base,
        change_percent: swing * 100.0,
        volume: volume.round(),
    }
}
