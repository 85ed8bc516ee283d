//! Market-data provider seam. The HTTP implementation talks to the hosted
//! quote functions: one endpoint takes an equity symbol list, the other
//! returns the top crypto list in full. Failures are returned to the feed,
//! which absorbs them into the synthetic fallback.

use thiserror::Error;

use crate::types::asset::AssetClass;
use crate::types::quote::Quote;

#[derive(Debug, Error)]
pub enum QuoteFetchError {
    #[error("missing market data credentials")]
    MissingCredentials,
    #[error("market data request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unsupported asset class for market data")]
    UnsupportedClass,
}

#[allow(async_fn_in_trait)]
pub trait MarketDataProvider {
    /// One attempt per batch; no retries. The feed handles failure.
    async fn fetch(
        &self,
        symbols: &[String],
        class: AssetClass,
    ) -> Result<Vec<Quote>, QuoteFetchError>;
}

/// Provider backed by the hosted market-data functions.
#[derive(Clone)]
pub struct HttpMarketData {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpMarketData {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Configure from `MARKET_DATA_URL` / `MARKET_DATA_API_KEY`. With no key
    /// set, every fetch reports missing credentials and the feed serves
    /// synthetic quotes.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("MARKET_DATA_URL")
                .unwrap_or_else(|_| "https://market-data.invalid".to_string()),
            std::env::var("MARKET_DATA_API_KEY").ok(),
        )
    }
}

impl MarketDataProvider for HttpMarketData {
    async fn fetch(
        &self,
        symbols: &[String],
        class: AssetClass,
    ) -> Result<Vec<Quote>, QuoteFetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(QuoteFetchError::MissingCredentials)?;

        let quotes: Vec<Quote> = match class {
            AssetClass::Stock => {
                self.client
                    .get(format!("{}/stock-quotes", self.base_url))
                    .query(&[("symbols", symbols.join(",").as_str()), ("apikey", api_key)])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?
            }
            AssetClass::Crypto => {
                // The crypto function always returns its full top-50 list;
                // filter down to what was asked for.
                let all: Vec<Quote> = self
                    .client
                    .get(format!("{}/crypto-quotes", self.base_url))
                    .query(&[("apikey", api_key)])
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;
                all.into_iter()
                    .filter(|quote| symbols.iter().any(|sym| *sym == quote.symbol))
                    .collect()
            }
            AssetClass::Tamg => return Err(QuoteFetchError::UnsupportedClass),
        };
        Ok(quotes)
    }
}
