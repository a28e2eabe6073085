//! HTTP client module for the spreadsheet-backed data endpoint.
//!
//! This module provides the `SheetClient` for fetching named sheets as
//! JSON row arrays. The endpoint is read-only and unauthenticated.

pub mod client;
pub mod error;

pub use client::SheetClient;
pub use error::ApiError;
