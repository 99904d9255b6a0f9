use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use seclabel_data::{
    DataError, LabelRow, LabelTarget, LabelValue, ObjectKind, ProviderName, assign_statement,
    clear_statement, execute_statement, fetch_label, label_exists,
};
use seclabel_test_support::fixtures::{SeededLabel, TestRole, is_superuser};
use seclabel_test_support::postgres::start_postgres;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::time::sleep;

async fn with_pool<F, Fut>(test: F) -> Result<()>
where
    F: FnOnce(PgPool, String) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let database = match start_postgres() {
        Ok(db) => db,
        Err(err) => {
            eprintln!("skipping catalog tests: {err}");
            return Ok(());
        }
    };
    let url = database.connection_string().to_string();

    let pool = {
        let mut attempts = 0;
        loop {
            match PgPoolOptions::new().max_connections(2).connect(&url).await {
                Ok(pool) => break pool,
                Err(err) => {
                    attempts += 1;
                    if attempts >= 10 {
                        return Err(err).context("failed to connect to test postgres");
                    }
                    sleep(Duration::from_millis(200)).await;
                }
            }
        }
    };

    let result = test(pool.clone(), url).await;
    pool.close().await;
    drop(database);
    result
}

#[tokio::test]
async fn unlabelled_role_has_no_label() -> Result<()> {
    with_pool(|pool, url| async move {
        let role = TestRole::create(&url, "unlabelled")?;
        let target = LabelTarget::parse("ROLE", role.name())?;

        assert!(fetch_label(&pool, &target, None).await?.is_none());
        assert!(fetch_label(&pool, &target, Some("anon")).await?.is_none());
        assert!(!label_exists(&pool, &target).await?);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn missing_objects_read_as_absent() -> Result<()> {
    with_pool(|pool, _url| async move {
        let role = LabelTarget::parse("ROLE", "no_such_role_anywhere")?;
        assert!(!label_exists(&pool, &role).await?);

        // to_regclass/to_regtype yield NULL rather than raising for unknown names.
        let table = LabelTarget::parse("TABLE", "public.no_such_table")?;
        assert!(!label_exists(&pool, &table).await?);
        let domain = LabelTarget::parse("DOMAIN", "no_such_domain")?;
        assert!(!label_exists(&pool, &domain).await?);
        Ok(())
    })
    .await
}

#[tokio::test]
async fn unknown_provider_is_rejected_and_rolled_back() -> Result<()> {
    with_pool(|pool, url| async move {
        let role = TestRole::create(&url, "rejected")?;
        let target = LabelTarget::parse("ROLE", role.name())?;
        let provider = ProviderName::parse("no_such_provider")?;

        let assign = assign_statement(&provider, &target, &LabelValue::parse("MASKED")?);
        let err = execute_statement(&pool, &assign)
            .await
            .err()
            .context("statement for an unknown provider should fail")?;
        assert!(matches!(err, DataError::StatementFailed { .. }));
        assert!(
            err.to_string()
                .starts_with("error creating security label on ROLE")
        );

        let clear = clear_statement(&provider, &target);
        let err = execute_statement(&pool, &clear)
            .await
            .err()
            .context("clear for an unknown provider should fail")?;
        assert!(
            err.to_string()
                .starts_with("error deleting security label on ROLE")
        );

        // The pool must still hand out usable connections after the rollback.
        assert!(!label_exists(&pool, &target).await?);
        Ok(())
    })
    .await
}

const OBJECTS_SQL: &str = r"
    CREATE SCHEMA audit;
    CREATE TABLE public.customers (id integer);
    CREATE VIEW public.customer_ids AS SELECT id FROM public.customers;
    CREATE MATERIALIZED VIEW audit.customer_counts AS
        SELECT count(*) AS total FROM public.customers;
    CREATE FOREIGN DATA WRAPPER seclabel_fdw;
    CREATE SERVER seclabel_server FOREIGN DATA WRAPPER seclabel_fdw;
    CREATE FOREIGN TABLE audit.remote_customers (id integer) SERVER seclabel_server;
    CREATE SEQUENCE public.invoice_numbers;
    CREATE TYPE public.mood AS ENUM ('calm', 'angry');
    CREATE DOMAIN audit.email AS text;
";

#[tokio::test]
async fn labelled_objects_of_every_kind_are_found() -> Result<()> {
    with_pool(|pool, url| async move {
        if !is_superuser(&url) {
            eprintln!("skipping labelled_objects_of_every_kind_are_found: needs a superuser");
            return Ok(());
        }
        sqlx::raw_sql(OBJECTS_SQL).execute(&pool).await?;
        let role = TestRole::create(&url, "labelled")?;
        let database: String = sqlx::query_scalar("SELECT current_database()::text")
            .fetch_one(&pool)
            .await?;

        // (kind, name as configured, name as reported by the catalog)
        let cases = [
            ("ROLE", role.name(), role.name()),
            ("DATABASE", database.as_str(), database.as_str()),
            ("TABLESPACE", "pg_default", "pg_default"),
            ("SCHEMA", "audit", "audit"),
            ("TABLE", "customers", "public.customers"),
            ("VIEW", "public.customer_ids", "public.customer_ids"),
            (
                "MATERIALIZED VIEW",
                "audit.customer_counts",
                "audit.customer_counts",
            ),
            (
                "FOREIGN TABLE",
                "audit.remote_customers",
                "audit.remote_customers",
            ),
            ("SEQUENCE", "invoice_numbers", "public.invoice_numbers"),
            ("TYPE", "public.mood", "public.mood"),
            ("DOMAIN", "audit.email", "audit.email"),
        ];
        for kind in ObjectKind::ALL {
            assert!(
                cases.iter().any(|(keyword, _, _)| *keyword == kind.keyword()),
                "no case for {kind}"
            );
        }

        for (kind, name, reported) in cases {
            let target = LabelTarget::parse(kind, name)?;
            let seeded = SeededLabel::insert(&url, kind, name, "anon", "MASKED")?;
            let expected = LabelRow {
                provider: "anon".to_string(),
                label: "MASKED".to_string(),
                object_name: reported.to_string(),
            };

            assert_eq!(
                fetch_label(&pool, &target, Some("anon")).await?,
                Some(expected.clone()),
                "{kind} {name}"
            );
            assert_eq!(fetch_label(&pool, &target, None).await?, Some(expected));
            assert!(fetch_label(&pool, &target, Some("selinux")).await?.is_none());
            assert!(label_exists(&pool, &target).await?, "{kind} {name}");

            drop(seeded);
            assert!(!label_exists(&pool, &target).await?, "{kind} {name}");
        }
        Ok(())
    })
    .await
}

#[tokio::test]
async fn domains_and_types_are_told_apart() -> Result<()> {
    with_pool(|pool, url| async move {
        if !is_superuser(&url) {
            eprintln!("skipping domains_and_types_are_told_apart: needs a superuser");
            return Ok(());
        }
        sqlx::raw_sql("CREATE DOMAIN public.email AS text")
            .execute(&pool)
            .await?;
        let _seeded = SeededLabel::insert(&url, "DOMAIN", "public.email", "anon", "MASKED")?;

        assert!(label_exists(&pool, &LabelTarget::parse("DOMAIN", "email")?).await?);
        assert!(!label_exists(&pool, &LabelTarget::parse("TYPE", "email")?).await?);
        Ok(())
    })
    .await
}
