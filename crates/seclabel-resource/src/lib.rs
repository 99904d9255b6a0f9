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
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Declarative lifecycle for `PostgreSQL` security labels.
//!
//! Layout: `schema.rs` (resource schema), `state.rs` (`ResourceData`),
//! `identity.rs` (external identity), `binding.rs` (typed attributes and
//! replacement planning), `store.rs` (`LabelStore` + `PgLabelStore`),
//! `resource.rs` (`SecurityLabelResource`), `config.rs` (`ProviderConfig`).

pub mod binding;
pub mod config;
pub mod error;
pub mod identity;
pub mod resource;
pub mod schema;
pub mod state;
pub mod store;

pub use binding::{SecurityLabelBinding, replacement_reasons};
pub use config::ProviderConfig;
pub use error::{ResourceError, ResourceResult};
pub use identity::LabelIdentity;
pub use resource::SecurityLabelResource;
pub use schema::{AttributeSchema, ResourceSchema, security_label_schema};
pub use state::ResourceData;
pub use store::{LabelStore, PgLabelStore};
