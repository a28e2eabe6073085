//! Data models for sheet-backed datasets.
//!
//! Every tab in the dashboard is backed by one named sheet from the remote
//! endpoint. Rows are open-shaped (`Record`), so the same model serves
//! Events, Courses, and Winners alike; only the Winners tab derives typed
//! standings on top (see `crate::leaderboard`).

pub mod record;

pub use record::{FieldValue, Record};

/// A named sheet's rows, oldest-first as the source delivers them.
pub type Dataset = Vec<Record>;
