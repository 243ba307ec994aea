//! PlanStore - lesson plan rows in a shared spreadsheet
//!
//! The backing table is append-only: rows carry a fixed header
//! (`timestamp, date, class, title, note, links`) and are read back as
//! header-keyed [`Record`]s.
//!
//! # Modules
//!
//! - [`entry`] - `PlanEntry`, `Record` and link extraction
//! - [`store`] - the `RowStore` trait and the in-memory implementation
//! - [`sheets`] - Google Sheets v4 implementation
//! - [`auth`] - service-account token exchange

pub mod auth;
pub mod entry;
mod error;
pub mod sheets;
pub mod store;

pub use auth::{ServiceAccountKey, TokenProvider};
pub use entry::{COLUMNS, PlanEntry, Record, TIMESTAMP_FORMAT, extract_links};
pub use error::StoreError;
pub use sheets::{SheetsClient, SheetsOptions};
pub use store::{MemoryStore, RowStore};
