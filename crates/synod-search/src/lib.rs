//! Synod Search - Web Search Augmentation
//!
//! This crate provides the augmentation collaborator for Synod:
//! - Provider: the `SearchProvider` trait and `SearchHit` result type
//! - DuckDuckGo: HTML-scraping search client (no API key required)
//!
//! Search is strictly best-effort for callers: the freshness tracker logs
//! and ignores every error this crate produces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod duckduckgo;
pub mod error;
pub mod provider;

pub use duckduckgo::DuckDuckGoProvider;
pub use error::{Error, Result};
pub use provider::{SearchHit, SearchProvider};
