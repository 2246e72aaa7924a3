//! Data acquisition and validation

pub mod csv_import;
pub mod ingest;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use csv_import::CsvProvider;
pub use ingest::{validate_bars, ValidatedBars};
pub use provider::{parse_span, DataError, DataProvider, DataSource, FetchRequest, FetchResult};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;
