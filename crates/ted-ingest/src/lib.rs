//! TEDF ingestion: raw CSV tables, record files and file discovery.

pub mod csv_table;
pub mod discovery;
pub mod record_file;

pub use csv_table::{CsvTable, read_csv_table, write_csv_table};
pub use discovery::{DiscoveredFile, discover_files};
pub use record_file::{ConsistencyIssue, RecordFile};
