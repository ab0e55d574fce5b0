//! # nectar-core
//! Foundation types and traits for the Nectar staking engine.

pub mod config;
pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
