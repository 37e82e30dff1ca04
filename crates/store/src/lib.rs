//! Flat-file persistence for lead records.
//!
//! The collection lives in memory behind a [`LeadStore`] handle and is
//! rewritten to its backing JSON file only on an explicit [`LeadStore::flush`].
//! Identifiers are derived from lead names at creation time (`slug`) and are
//! stable for the life of the record.

pub mod slug;
pub mod store;

pub use store::{LeadStore, StoreError};
