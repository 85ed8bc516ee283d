//! Price Feed Adapter: short-TTL quote cache over a market-data provider,
//! with a deterministic synthetic fallback. Never errors toward callers;
//! availability wins over accuracy here.

pub mod provider;
pub mod synthetic;

pub use provider::{HttpMarketData, MarketDataProvider, QuoteFetchError};
pub use synthetic::synthetic_quote;

use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;

use crate::types::asset::AssetClass;
use crate::types::quote::Quote;

struct CachedQuote {
    quote: Quote,
    fetched_at: Instant,
}

pub struct QuoteFeed<P> {
    provider: P,
    cache: RwLock<HashMap<String, CachedQuote>>,
}

impl<P: MarketDataProvider> QuoteFeed<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Access the underlying provider.
    pub fn provider_ref(&self) -> &P {
        &self.provider
    }

    /// Current quote for one symbol. Infallible: cache, then one provider
    /// attempt, then the synthetic table.
    pub async fn quote(&self, symbol: &str, class: AssetClass) -> Quote {
        self.quotes(&[symbol.to_string()], class)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| synthetic_quote(&symbol.to_uppercase(), class, minute_bucket()))
    }

    /// Batch lookup, one quote per requested symbol, input order preserved.
    pub async fn quotes(&self, symbols: &[String], class: AssetClass) -> Vec<Quote> {
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_uppercase()).collect();
        let ttl = class.quote_ttl();

        let mut resolved: HashMap<String, Quote> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        {
            let cache = self.cache.read().await;
            for symbol in &symbols {
                match cache.get(symbol) {
                    Some(entry) if entry.fetched_at.elapsed() < ttl => {
                        resolved.insert(symbol.clone(), entry.quote.clone());
                    }
                    _ => missing.push(symbol.clone()),
                }
            }
        }

        if !missing.is_empty() {
            let fetched = match self.provider.fetch(&missing, class).await {
                Ok(quotes) => quotes,
                Err(err) => {
                    tracing::warn!(%err, ?class, "market data unavailable, serving synthetic quotes");
                    Vec::new()
                }
            };
            let mut cache = self.cache.write().await;
            for quote in fetched {
                let symbol = quote.symbol.to_uppercase();
                resolved.insert(symbol.clone(), quote.clone());
                cache.insert(
                    symbol,
                    CachedQuote {
                        quote,
                        fetched_at: Instant::now(),
                    },
                );
            }
            // Whatever the provider did not cover gets a synthetic quote.
            let bucket = minute_bucket();
            for symbol in &missing {
                if !resolved.contains_key(symbol) {
                    let quote = synthetic_quote(symbol, class, bucket);
                    resolved.insert(symbol.clone(), quote.clone());
                    cache.insert(
                        symbol.clone(),
                        CachedQuote {
                            quote,
                            fetched_at: Instant::now(),
                        },
                    );
                }
            }
        }

        symbols
            .iter()
            .filter_map(|symbol| resolved.get(symbol).cloned())
            .collect()
    }
}

fn minute_bucket() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
        / 60
}
