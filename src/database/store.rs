use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{postgres::PgArguments, PgPool, Row as _};

use crate::config::DatabaseConfig;
use crate::database::manager::DatabaseError;
use crate::database::statement::Statement;

/// One result row, keyed by column name
pub type Row = Map<String, Value>;

/// Executes policy-built statements. Writes are expected to carry a
/// `RETURNING` clause so that "no rows" means "nothing matched".
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError>;

    async fn fetch_optional(&self, statement: &Statement) -> Result<Option<Row>, DatabaseError> {
        Ok(self.fetch_all(statement).await?.into_iter().next())
    }

    /// Cheap connectivity probe used by the health endpoint
    async fn ping(&self) -> Result<(), DatabaseError>;
}

/// PostgreSQL-backed store. Each call borrows one pooled connection.
pub struct PgStore {
    pool: PgPool,
    log_queries: bool,
    slow_query_threshold: Option<Duration>,
}

impl PgStore {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            log_queries: config.enable_query_logging,
            slow_query_threshold: config
                .enable_slow_query_warning
                .then(|| Duration::from_millis(config.slow_query_threshold_ms)),
        }
    }

    /// Wrap any row-producing statement (SELECT or DML with RETURNING) so
    /// each row comes back as a single JSON object. Ordering is applied to
    /// the outer query; a CTE does not carry its ORDER BY out.
    fn as_json_rows(statement: &Statement) -> String {
        let mut sql = format!(
            "WITH result AS ({}) SELECT row_to_json(result) AS row FROM result",
            statement.sql
        );
        if let Some(order_by) = statement.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        sql
    }

    fn observe(&self, statement: &Statement, started: Instant) {
        let elapsed = started.elapsed();
        if self.log_queries {
            tracing::debug!(sql = %statement.sql, params = statement.params.len(), ?elapsed, "statement executed");
        }
        if let Some(threshold) = self.slow_query_threshold {
            if elapsed > threshold {
                tracing::warn!(sql = %statement.sql, ?elapsed, "slow statement");
            }
        }
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn fetch_all(&self, statement: &Statement) -> Result<Vec<Row>, DatabaseError> {
        let sql = Self::as_json_rows(statement);
        let mut q = sqlx::query(&sql);
        for p in statement.params.iter() {
            q = bind_param(q, p);
        }

        let started = Instant::now();
        let rows = q.fetch_all(&self.pool).await?;
        self.observe(statement, started);

        rows.into_iter().map(|row| decode_row(&row)).collect()
    }

    async fn fetch_optional(&self, statement: &Statement) -> Result<Option<Row>, DatabaseError> {
        let sql = Self::as_json_rows(statement);
        let mut q = sqlx::query(&sql);
        for p in statement.params.iter() {
            q = bind_param(q, p);
        }

        let started = Instant::now();
        let row = q.fetch_optional(&self.pool).await?;
        self.observe(statement, started);

        row.map(|row| decode_row(&row)).transpose()
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn decode_row(row: &sqlx::postgres::PgRow) -> Result<Row, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::QueryError(format!(
            "expected a JSON object row, got {}",
            other
        ))),
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::statement::StatementBuilder;

    #[test]
    fn wraps_statement_as_json_rows() {
        let statement = StatementBuilder::new().finish("SELECT \"id\" FROM \"athletes\"".to_string());
        assert_eq!(
            PgStore::as_json_rows(&statement),
            "WITH result AS (SELECT \"id\" FROM \"athletes\") SELECT row_to_json(result) AS row FROM result"
        );
    }

    #[test]
    fn listing_order_is_applied_outside_the_cte() {
        let statement = StatementBuilder::new()
            .finish("SELECT t.* FROM \"tournaments\" t".to_string())
            .ordered_by("start_date, name");
        assert_eq!(
            PgStore::as_json_rows(&statement),
            "WITH result AS (SELECT t.* FROM \"tournaments\" t) \
             SELECT row_to_json(result) AS row FROM result ORDER BY start_date, name"
        );
    }
}
