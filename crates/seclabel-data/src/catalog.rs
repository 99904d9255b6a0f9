//! Catalog reads for labels currently attached to objects.

use sqlx::{Executor, FromRow, Postgres};

use crate::error::{DataError, Result};
use crate::object::{CatalogTarget, LabelTarget, ObjectName};
use crate::quote::quote_ident;

fn map_query_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::QueryFailed { operation, source }
}

/// A label observed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRow {
    /// Provider that owns the label.
    pub provider: String,
    /// Raw label text.
    pub label: String,
    /// Object name in SQL syntax, ready to be fed back into a statement.
    /// Names of schema-scoped kinds are always schema-qualified, independent
    /// of the session's `search_path`.
    pub object_name: String,
}

#[derive(Debug, Clone, FromRow)]
struct LabelRecord {
    provider: String,
    label: String,
    object_name: String,
}

/// Fetch the label attached to `target`, optionally restricted to one provider.
///
/// When several providers label the same object and no provider is given,
/// the first provider in name order wins.
///
/// # Errors
///
/// Returns [`DataError::QueryFailed`] for any failure other than a missing row,
/// and [`DataError::InvalidIdentifier`] if the catalog reports a name that
/// does not parse.
pub async fn fetch_label<'e, E>(
    executor: E,
    target: &LabelTarget,
    provider: Option<&str>,
) -> Result<Option<LabelRow>>
where
    E: Executor<'e, Database = Postgres>,
{
    let kind = target.kind();
    let record = sqlx::query_as::<_, LabelRecord>(kind.catalog_query())
        .bind(target.lookup_key())
        .bind(provider)
        .fetch_optional(executor)
        .await
        .map_err(map_query_err("fetch security label"))?;

    record
        .map(|record| -> Result<LabelRow> {
            // Name columns are raw; qualified names come back as `%I.%I` and are
            // re-rendered so quoting matches the statement builder.
            let object_name = if kind.qualified() {
                ObjectName::parse(&record.object_name)?.render()
            } else {
                quote_ident(&record.object_name)
            };
            Ok(LabelRow {
                provider: record.provider,
                label: record.label,
                object_name,
            })
        })
        .transpose()
}

/// Report whether any provider has labelled `target`.
///
/// # Errors
///
/// Returns [`DataError::QueryFailed`] for any failure other than a missing row.
pub async fn label_exists<'e, E>(executor: E, target: &LabelTarget) -> Result<bool>
where
    E: Executor<'e, Database = Postgres>,
{
    let found = fetch_label(executor, target, None).await?;
    Ok(found.is_some())
}
