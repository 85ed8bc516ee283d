pub mod asset;
pub mod position;
pub mod quote;
pub mod trade;
