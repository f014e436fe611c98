//! # dms-search
//!
//! Search over indexed documents driven by metadata templates.
//!
//! - [`build_predicates`]: normalized search input to a predicate set
//! - [`resolve_parallel`] / [`suggest_values`]: autocomplete from earlier documents
//! - [`detect_new_keys`]: warn when indexing introduces a new parallel value
//! - [`SearchService`]: the full request flow over a template and a document store
//! - [`export`] and [`report`]: CSV results and the document scan report

pub mod export;
pub mod indexing;
pub mod parallel;
pub mod predicates;
pub mod report;
pub mod service;

pub use export::{to_csv_string, write_csv};
pub use indexing::{build_document, detect_new_keys, NewIndexKey};
pub use parallel::{
    collect_parallel, resolve_parallel, suggest, suggest_values, FieldValues,
    ParallelSuggestions, Suggestions,
};
pub use predicates::build_predicates;
pub use report::{scan_report, ScanReportLine};
pub use service::{IndexOutcome, SearchOutcome, SearchService};
