pub mod api;
pub mod demo;
pub mod error;
pub mod persistence;
pub mod quotes;
pub mod settlement;
pub mod transfers;
pub mod types;
