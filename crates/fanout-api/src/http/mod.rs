//! HTTP interface module.
//!
//! Provides REST endpoints for:
//! - Query submission and fan-out
//! - Connection checks and tab listing
//! - Scraper reports posted over HTTP
//! - Health and coordinator status

pub mod handlers;
pub mod routes;

pub(crate) mod monitoring;

#[cfg(test)]
pub(crate) mod test_support;
