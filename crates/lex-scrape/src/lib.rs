//! URL-enumeration scrapers. Each kind's `scrape` function is an async
//! stream of `(source_url, raw_document)` pairs over `&Fetcher`, yielding
//! exactly what the parsers in `lex-parse` expect as input.

pub mod amendments;
pub mod caselaw;
pub mod error;
pub mod legislation;

pub use error::ScrapeError;
