use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use sqlx::Row;
use tracing::info;

use crate::error::{Result, StoreError};

/// A persisted repeatable-job definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub name: String,
    pub command: String,
    pub args_base64: String,
    pub cron_spec: String,
    pub cpu: String,
    pub memory: String,
}

/// Terminal outcome of one execution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    Success,
    Error,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Success => "success",
            ExecutionStatus::Error => "error",
        }
    }
}

/// One append-only audit row.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub id: String,
    pub name: String,
    pub command: String,
    pub args_base64: String,
    pub cpu: String,
    pub memory: String,
    pub status: ExecutionStatus,
    pub error: String,
    pub result: String,
    /// Unix epoch seconds.
    pub started_at: i64,
    pub finished_at: i64,
}

/// SQL dialect of the connected backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Sqlite,
    Postgres,
}

#[derive(Clone)]
pub struct Store {
    pool: AnyPool,
    dialect: Dialect,
}

const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS apollo_jobs (
        name TEXT PRIMARY KEY,
        command TEXT NOT NULL,
        args_base64 TEXT,
        cron_spec TEXT NOT NULL,
        cpu TEXT,
        memory TEXT
    )",
    "CREATE TABLE IF NOT EXISTS apollo_executions (
        id TEXT,
        name TEXT NOT NULL,
        command TEXT NOT NULL,
        args_base64 TEXT,
        cpu TEXT,
        memory TEXT,
        status TEXT,
        error TEXT,
        result TEXT,
        started_at BIGINT,
        finished_at BIGINT
    )",
    "CREATE INDEX IF NOT EXISTS idx_apollo_executions_name_started
        ON apollo_executions(name, started_at)",
];

const UPSERT_SQLITE: &str = "INSERT OR REPLACE INTO apollo_jobs
    (name, command, args_base64, cron_spec, cpu, memory)
    VALUES (?, ?, ?, ?, ?, ?)";

const UPSERT_POSTGRES: &str = "INSERT INTO apollo_jobs
    (name, command, args_base64, cron_spec, cpu, memory)
    VALUES (?, ?, ?, ?, ?, ?)
    ON CONFLICT(name) DO UPDATE SET
        command = EXCLUDED.command,
        args_base64 = EXCLUDED.args_base64,
        cron_spec = EXCLUDED.cron_spec,
        cpu = EXCLUDED.cpu,
        memory = EXCLUDED.memory";

const DELETE: &str = "DELETE FROM apollo_jobs WHERE name = ?";

const LIST: &str = "SELECT name, command, args_base64, cron_spec, cpu, memory
    FROM apollo_jobs ORDER BY name";

const ADD_EXECUTION: &str = "INSERT INTO apollo_executions
    (id, name, command, args_base64, cpu, memory, status, error, result, started_at, finished_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

impl Store {
    /// Open the store for `driver` ("sqlite" or "postgres") and run the
    /// idempotent migrations.
    ///
    /// For sqlite, `path` is a filesystem path (created when missing) and
    /// the pool is capped at one connection so writes serialize at the
    /// door. For postgres, `path` is a connection URL and the pool carries
    /// idle/lifetime bounds.
    pub async fn open(driver: &str, path: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let (dialect, url, options) = match driver {
            "sqlite" => {
                let url = if path == ":memory:" {
                    "sqlite::memory:".to_string()
                } else {
                    format!("sqlite://{path}?mode=rwc")
                };
                (Dialect::Sqlite, url, AnyPoolOptions::new().max_connections(1))
            }
            "postgres" => (
                Dialect::Postgres,
                path.to_string(),
                AnyPoolOptions::new()
                    .max_connections(100)
                    .idle_timeout(Duration::from_secs(15 * 60))
                    .max_lifetime(Duration::from_secs(60 * 60)),
            ),
            other => return Err(StoreError::UnsupportedDriver(other.to_string())),
        };

        let pool = options.connect(&url).await?;

        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&pool).await?;
        }

        info!(%driver, "store opened");
        Ok(Self { pool, dialect })
    }

    /// Insert or replace the definition keyed by `record.name`.
    pub async fn upsert(&self, record: &JobRecord) -> Result<()> {
        let sql = match self.dialect {
            Dialect::Sqlite => UPSERT_SQLITE.to_string(),
            Dialect::Postgres => rewrite_placeholders(UPSERT_POSTGRES),
        };

        sqlx::query(&sql)
            .bind(&record.name)
            .bind(&record.command)
            .bind(&record.args_base64)
            .bind(&record.cron_spec)
            .bind(&record.cpu)
            .bind(&record.memory)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Remove the definition for `name`; `NotFound` when nothing matched.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let sql = self.dialect_sql(DELETE);
        let result = sqlx::query(&sql).bind(name).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// All repeatable definitions, ordered by name for deterministic reload.
    pub async fn list(&self) -> Result<Vec<JobRecord>> {
        let rows = sqlx::query(LIST).fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(JobRecord {
                name: row.try_get("name")?,
                command: row.try_get("command")?,
                args_base64: row.try_get::<Option<String>, _>("args_base64")?.unwrap_or_default(),
                cron_spec: row.try_get("cron_spec")?,
                cpu: row.try_get::<Option<String>, _>("cpu")?.unwrap_or_default(),
                memory: row.try_get::<Option<String>, _>("memory")?.unwrap_or_default(),
            });
        }
        Ok(out)
    }

    /// Append one audit row. Duplicate ids are allowed — the table has no
    /// unique constraint, every attempt is its own row.
    pub async fn add_execution(&self, record: &ExecutionRecord) -> Result<()> {
        let sql = self.dialect_sql(ADD_EXECUTION);

        sqlx::query(&sql)
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.command)
            .bind(&record.args_base64)
            .bind(&record.cpu)
            .bind(&record.memory)
            .bind(record.status.as_str())
            .bind(&record.error)
            .bind(&record.result)
            .bind(record.started_at)
            .bind(record.finished_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Count of audit rows for an execution id (test and ops visibility).
    pub async fn count_executions(&self, id: &str) -> Result<i64> {
        let sql = self.dialect_sql("SELECT COUNT(*) AS n FROM apollo_executions WHERE id = ?");
        let row = sqlx::query(&sql).bind(id).fetch_one(&self.pool).await?;
        Ok(row.try_get("n")?)
    }

    fn dialect_sql(&self, sql: &str) -> String {
        match self.dialect {
            Dialect::Sqlite => sql.to_string(),
            Dialect::Postgres => rewrite_placeholders(sql),
        }
    }
}

/// Rewrite `?` placeholders to positional `$1..$N` for backends that
/// require them.
fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    for ch in sql.chars() {
        if ch == '?' {
            n += 1;
            out.push('$');
            out.push_str(&n.to_string());
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, spec: &str) -> JobRecord {
        JobRecord {
            name: name.into(),
            command: "report".into(),
            args_base64: String::new(),
            cron_spec: spec.into(),
            cpu: "500m".into(),
            memory: "1Gi".into(),
        }
    }

    fn execution(id: &str) -> ExecutionRecord {
        ExecutionRecord {
            id: id.into(),
            name: "report".into(),
            command: "report".into(),
            args_base64: String::new(),
            cpu: "500m".into(),
            memory: "1Gi".into(),
            status: ExecutionStatus::Success,
            error: String::new(),
            result: "ok\n".into(),
            started_at: 1_700_000_000,
            finished_at: 1_700_000_010,
        }
    }

    #[test]
    fn placeholder_rewrite_numbers_in_order() {
        assert_eq!(
            rewrite_placeholders("INSERT INTO t (a, b) VALUES (?, ?)"),
            "INSERT INTO t (a, b) VALUES ($1, $2)"
        );
        assert_eq!(rewrite_placeholders("SELECT 1"), "SELECT 1");
    }

    #[tokio::test]
    async fn unknown_driver_is_rejected() {
        let err = Store::open("mysql", "whatever").await;
        assert!(matches!(err, Err(StoreError::UnsupportedDriver(_))));
    }

    #[tokio::test]
    async fn upsert_replaces_by_name() {
        let store = Store::open("sqlite", ":memory:").await.unwrap();

        store.upsert(&record("nightly", "0 0 2 * * *")).await.unwrap();
        store.upsert(&record("nightly", "0 0 4 * * *")).await.unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cron_spec, "0 0 4 * * *");
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let store = Store::open("sqlite", ":memory:").await.unwrap();

        store.upsert(&record("zeta", "0 0 2 * * *")).await.unwrap();
        store.upsert(&record("alpha", "0 0 3 * * *")).await.unwrap();

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn delete_missing_name_is_not_found() {
        let store = Store::open("sqlite", ":memory:").await.unwrap();

        let err = store.delete("ghost").await;
        assert!(matches!(err, Err(StoreError::NotFound { .. })));

        store.upsert(&record("real", "0 0 2 * * *")).await.unwrap();
        store.delete("real").await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn executions_allow_duplicate_ids() {
        let store = Store::open("sqlite", ":memory:").await.unwrap();

        store.add_execution(&execution("job-report-1")).await.unwrap();
        store.add_execution(&execution("job-report-1")).await.unwrap();

        assert_eq!(store.count_executions("job-report-1").await.unwrap(), 2);
        assert_eq!(store.count_executions("other").await.unwrap(), 0);
    }
}
