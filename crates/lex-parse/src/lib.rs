//! Document parsers: turn fetched XML/HTML bytes into domain records.
//! Every parser returns `ParseOutcome` rather than `Result` so a single
//! malformed document degrades to a skip/fail entry instead of aborting
//! a whole ingest run.

pub mod amendment;
pub mod caselaw;
pub mod explanatory_note;
pub mod legislation;
pub mod xml_to_markdown;
pub mod xmltree;

pub use xmltree::{parse_tree, Element, Node};
