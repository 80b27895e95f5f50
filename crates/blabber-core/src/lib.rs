//! Blabber Core Library
//!
//! Tag and mention extraction, post and tag count storage, the background
//! tag aggregator and the query facade used by the `blabber` CLI.

pub mod aggregate;
pub mod annotate;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod post;
pub mod query;
pub mod store;
