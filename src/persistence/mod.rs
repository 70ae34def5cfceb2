//! Durable sinks for whale matches: SQLite store and CSV report.

pub mod csv;
pub mod error;
pub mod sqlite;
pub mod traits;

pub use csv::CsvSink;
pub use error::PersistenceError;
pub use sqlite::SqliteWhaleStore;
#[cfg(test)]
pub use traits::MockWhaleStore;
pub use traits::WhaleStore;
