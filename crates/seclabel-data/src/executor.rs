//! Transactional execution of `SECURITY LABEL` statements.

use sqlx::PgPool;
use tracing::{debug, warn};

use crate::error::{DataError, Result};
use crate::statement::LabelStatement;

fn map_tx_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> DataError {
    move |source| DataError::TransactionFailed { operation, source }
}

/// Execute a statement inside its own transaction.
///
/// The transaction is committed only when the statement succeeds. Failed
/// statements are rolled back explicitly, and the transaction guard rolls
/// back on any other early return.
///
/// # Errors
///
/// Returns [`DataError::StatementFailed`] when the statement is rejected and
/// [`DataError::TransactionFailed`] when the transaction cannot be opened or
/// committed.
pub async fn execute_statement(pool: &PgPool, statement: &LabelStatement) -> Result<()> {
    let sql = statement.sql();
    let target = statement.target();

    let mut tx = pool.begin().await.map_err(map_tx_err("begin"))?;

    debug!(statement = %sql, "executing security label statement");
    if let Err(source) = sqlx::query(&sql)
        .persistent(false)
        .execute(&mut *tx)
        .await
    {
        if let Err(rollback_err) = tx.rollback().await {
            warn!(
                error = %rollback_err,
                object = %target,
                "failed to roll back security label transaction"
            );
        }
        return Err(DataError::StatementFailed {
            action: statement.action(),
            object_type: target.kind().keyword(),
            object_name: target.name().render(),
            source,
        });
    }

    tx.commit().await.map_err(map_tx_err("commit"))?;
    Ok(())
}
