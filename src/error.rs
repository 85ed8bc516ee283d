//! Error taxonomy for trading and transfers. Validation variants reject
//! before any write; `Storage` wraps database failures.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TradeError {
    #[error("quantity must be greater than zero")]
    NonPositiveQuantity,
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("insufficient balance: need {needed:.2}, available {available:.2}")]
    InsufficientBalance { needed: f64, available: f64 },
    #[error("insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: f64, held: f64 },
    #[error("no {0} position to sell")]
    NoPosition(String),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl TradeError {
    /// True for errors caused by the request itself, false for backend
    /// failures. Drives the HTTP status mapping.
    pub fn is_validation(&self) -> bool {
        !matches!(self, TradeError::Storage(_))
    }
}
