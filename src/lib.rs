//! Institutional Flow Signal Scorer
//!
//! Ranks companies by unusual institutional activity across four pillars
//! (13F filings, government awards, patents, ETF trades) and serves the
//! rankings over HTTP.

pub mod application;
pub mod config;
pub mod domain;
pub mod persistence;
pub mod rate_limit;
