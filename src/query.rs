use crate::bind::Options;
use crate::cache::StatementCache;
use crate::error::Error;
use crate::resolve::{self, Arg};
use crate::value::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::query::Query;
use sqlx::{mysql::MySqlQueryResult, Executor, MySql};
use tracing::debug;

/// Type alias for SQLx Query with MySQL arguments
pub type Q<'q> = Query<'q, MySql, MySqlArguments>;

/// A query whose named placeholders have been rewritten and bound.
///
/// `NamedQuery` resolves the SQL template and argument once, at construction,
/// and constructs a fresh `Query` on each execution, so it works with any
/// SQLx `Executor` implementation, including `MySqlPool` and `Transaction`.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::MySqlPool;
/// use sqlx_rebind::{args, Arg, NamedQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let query = NamedQuery::new(
///     "INSERT INTO users (id, name) VALUES (:id, :name)",
///     Arg::Value(args! { "id" => 42, "name" => "John Doe" }),
/// )?;
///
/// let result = query.execute(&pool).await?;
/// println!("Inserted {} rows", result.rows_affected());
/// # Ok(())
/// # }
/// ```
///
/// # Using with Transactions
///
/// ```rust,no_run
/// use sqlx::{MySqlPool, Transaction, MySql};
/// use sqlx_rebind::{args, Arg, NamedQuery};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let mut tx: Transaction<MySql> = pool.begin().await?;
///
/// let debit = NamedQuery::new(
///     "UPDATE accounts SET balance = balance - :amount WHERE id = :id",
///     Arg::Value(args! { "amount" => 100, "id" => 1 }),
/// )?;
/// debit.execute(&mut *tx).await?;
///
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
pub struct NamedQuery {
    sql: String,
    values: Vec<Value>,
}

impl NamedQuery {
    /// Resolves an SQL template and argument with default [`Options`].
    ///
    /// The template can contain named placeholders in the format `:name`,
    /// dotted paths into nested maps or records (`:address.city`), and
    /// `IN (:ids)` positions bound to scalar sequences. A sequence argument
    /// tuple-expands the `VALUES (...)` group for batch insertion.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is blank, the argument shape is
    /// unsupported, or a placeholder cannot be resolved.
    pub fn new(template: &str, arg: Arg<'_>) -> crate::Result<Self> {
        Self::with_options(template, arg, &Options::default())
    }

    /// Resolves an SQL template and argument with explicit [`Options`].
    pub fn with_options(template: &str, arg: Arg<'_>, opts: &Options) -> crate::Result<Self> {
        let (sql, values) = resolve::rebind(template, &[arg], opts)?;
        Ok(Self { sql, values })
    }

    /// Like [`NamedQuery::with_options`], reusing first-pass rewrites from
    /// `cache` for templates seen before.
    pub fn with_cache(
        cache: &StatementCache,
        template: &str,
        arg: Arg<'_>,
        opts: &Options,
    ) -> crate::Result<Self> {
        let (sql, values) = resolve::rebind_cached(template, &[arg], opts, Some(cache))?;
        Ok(Self { sql, values })
    }

    /// The rewritten SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The flat argument vector, in placeholder order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Executes the query using the provided executor.
    ///
    /// A fresh `Query` is constructed per call, so the same `NamedQuery` can
    /// run repeatedly and against different executors.
    ///
    /// # Errors
    ///
    /// Returns an error if a value producer fails or the database query
    /// fails.
    pub async fn execute<'e, E>(&self, executor: E) -> crate::Result<MySqlQueryResult>
    where
        E: Executor<'e, Database = MySql>,
    {
        debug!(sql = %self.sql, args = self.values.len(), "executing named query");
        let mut q = sqlx::query::<MySql>(&self.sql);
        for value in &self.values {
            q = push_bind(q, value)?;
        }
        Ok(q.execute(executor).await?)
    }
}

/// Binds one resolved [`Value`] to the query.
///
/// Opaque producers are invoked here, at the driver boundary, and their
/// errors propagate unchanged.
fn push_bind<'q>(q: Q<'q>, value: &Value) -> crate::Result<Q<'q>> {
    let mut value = value.clone();
    loop {
        match value {
            Value::Opaque(producer) => {
                value = producer.sql_value().map_err(Error::Valuer)?;
            }
            Value::Null => return Ok(q.bind(None::<String>)),
            Value::Bool(b) => return Ok(q.bind(b)),
            Value::Int(i) => return Ok(q.bind(i)),
            Value::Float(f) => return Ok(q.bind(f)),
            Value::Text(s) => return Ok(q.bind(s)),
            Value::Bytes(b) => return Ok(q.bind(b)),
            Value::Seq(_) | Value::Map(_) => {
                return Err(Error::UnsupportedArgument(
                    "composite value reached the driver unexpanded",
                ))
            }
        }
    }
}
