//! Trading module - swap intent building and submission
//!
//! Execution paths:
//! - ALEX gateway (production, posts xyk auto-swaps)
//! - Dry-run (logs the intent, submits nothing)

pub mod alex;
pub mod executor;

pub use alex::AlexGateway;
pub use executor::{DryRunTrader, TradeExecutor, XykSwapParams};
pub use executor::{DEFAULT_DX, DEFAULT_DY, DEFAULT_FEE};
