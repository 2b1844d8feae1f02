//! Core business logic abstractions

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod filter;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use batch::{BatchItem, JoinPolicy};
pub use convert::{ConversionError, ConversionRequest};
pub use error::RateError;
pub use rate::{DatedRates, DayRates, RatePair, RateProvider, RateTable};
