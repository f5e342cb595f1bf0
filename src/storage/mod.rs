//! Output artifact handling.
//!
//! Results are persisted as an append-only CSV file whose header row is
//! written once per run.

mod csv_store;

pub use csv_store::{discard_previous, open_append, COLUMNS};
