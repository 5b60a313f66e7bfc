//! Music sheet catalogue
//!
//! The data model for sheets, an in-memory store with genre and instrument
//! name deduplication, and a generator of fake sheets used by the producer.

pub mod generator;
pub mod model;
pub mod query;
pub mod store;

pub use generator::FakeSheetGenerator;
pub use model::{MusicSheet, SheetInput, SheetSummary, TagSet};
pub use query::{SheetQuery, SortField, SortOrder};
pub use store::InMemoryCatalog;
