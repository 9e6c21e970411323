//! tally-crawler - Vote-tally extraction CLI for election-results sites
//!
//! Walks a four-level paginated hierarchy (municipality → city → school
//! → ballot table → party results) through an abstract page navigator
//! and assembles one nested JSON document per run.

pub mod commands;
pub mod config;
pub mod error;
pub mod navigator;
pub mod output;
pub mod scrape;

pub use config::Config;
pub use error::ScrapeError;
pub use scrape::models::{City, Municipality, PartyResult, School, Table};
