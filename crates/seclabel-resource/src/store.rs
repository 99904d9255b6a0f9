//! Persistence seam between the lifecycle and the database.

use async_trait::async_trait;
use seclabel_data::{
    DataResult, LabelRow, LabelStatement, LabelTarget, ProviderName, execute_statement,
    fetch_label, label_exists,
};
use sqlx::PgPool;

/// Backend able to apply label statements and read labels back.
#[async_trait]
pub trait LabelStore: Send + Sync {
    /// Execute a statement in its own transaction.
    async fn apply(&self, statement: &LabelStatement) -> DataResult<()>;
    /// Read the label on `target`, restricted to `provider` when given.
    async fn fetch(
        &self,
        target: &LabelTarget,
        provider: Option<&ProviderName>,
    ) -> DataResult<Option<LabelRow>>;
    /// Whether any provider has labelled `target`.
    async fn exists(&self, target: &LabelTarget) -> DataResult<bool>;
}

/// [`LabelStore`] backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgLabelStore {
    pool: PgPool,
}

impl PgLabelStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Access the underlying `SQLx` connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LabelStore for PgLabelStore {
    async fn apply(&self, statement: &LabelStatement) -> DataResult<()> {
        execute_statement(&self.pool, statement).await
    }

    async fn fetch(
        &self,
        target: &LabelTarget,
        provider: Option<&ProviderName>,
    ) -> DataResult<Option<LabelRow>> {
        fetch_label(&self.pool, target, provider.map(ProviderName::as_str)).await
    }

    async fn exists(&self, target: &LabelTarget) -> DataResult<bool> {
        label_exists(&self.pool, target).await
    }
}
