#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Data access layer for `PostgreSQL` security labels.
//!
//! Layout: `quote.rs` (identifier/literal quoting), `object.rs` (object kinds,
//! names, and their catalog queries), `statement.rs` (`SECURITY LABEL`
//! rendering), `executor.rs` (transactional execution), `catalog.rs`
//! (catalog reads).

pub mod catalog;
pub mod error;
pub mod executor;
pub mod object;
pub mod quote;
pub mod statement;

pub use catalog::{LabelRow, fetch_label, label_exists};
pub use error::{DataError, Result as DataResult};
pub use executor::execute_statement;
pub use object::{CatalogTarget, LabelTarget, ObjectKind, ObjectName};
pub use statement::{
    LabelStatement, LabelValue, ProviderName, StatementAction, assign_statement, clear_statement,
};
