use crate::bind::Options;
use crate::cache::StatementCache;
use crate::error::Error;
use crate::resolve::{self, Arg};
use crate::value::Value;
use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::QueryAs,
    Executor, MySql,
};
use tracing::debug;

/// Type alias for SQLx QueryAs with MySQL arguments
pub type QA<'q, R> = QueryAs<'q, MySql, R, MySqlArguments>;

/// A rewritten-and-bound query that returns typed rows.
///
/// `NamedQueryAs` is [`NamedQuery`](crate::NamedQuery) for reads: the same
/// template resolution, returning strongly-typed results through SQLx's
/// `FromRow`. Supports `fetch_all`, `fetch_one`, and `fetch_optional`.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{MySqlPool, FromRow};
/// use sqlx_rebind::{args, Arg, NamedQueryAs};
///
/// #[derive(FromRow)]
/// struct User {
///     id: i32,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = MySqlPool::connect("mysql://localhost/test").await?;
/// let query = NamedQueryAs::<User>::new(
///     "SELECT id, name FROM users WHERE id IN (:ids)",
///     Arg::Value(args! { "ids" => vec![1, 2, 3] }),
/// )?;
///
/// let users: Vec<User> = query.fetch_all(&pool).await?;
/// for user in users {
///     println!("{}: {}", user.id, user.name);
/// }
/// # Ok(())
/// # }
/// ```
pub struct NamedQueryAs<R> {
    sql: String,
    values: Vec<Value>,
    _pd: std::marker::PhantomData<R>,
}

impl<R> NamedQueryAs<R>
where
    for<'row> R: sqlx::FromRow<'row, MySqlRow> + Send + Unpin,
{
    /// Resolves an SQL template and argument with default [`Options`].
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
        Ok(Self {
            sql,
            values,
            _pd: std::marker::PhantomData,
        })
    }

    /// Like [`NamedQueryAs::with_options`], reusing first-pass rewrites from
    /// `cache` for templates seen before.
    pub fn with_cache(
        cache: &StatementCache,
        template: &str,
        arg: Arg<'_>,
        opts: &Options,
    ) -> crate::Result<Self> {
        let (sql, values) = resolve::rebind_cached(template, &[arg], opts, Some(cache))?;
        Ok(Self {
            sql,
            values,
            _pd: std::marker::PhantomData,
        })
    }

    /// The rewritten SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Executes the query and returns all matching rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or if any row cannot be converted
    /// to type `R`.
    pub async fn fetch_all<'e, E>(&self, executor: E) -> crate::Result<Vec<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        debug!(sql = %self.sql, args = self.values.len(), "fetching all rows");
        Ok(self.build()?.fetch_all(executor).await?)
    }

    /// Executes the query and returns exactly one row.
    ///
    /// # Errors
    ///
    /// Returns an error if no row matches, the query fails, or the row
    /// cannot be converted to type `R`.
    pub async fn fetch_one<'e, E>(&self, executor: E) -> crate::Result<R>
    where
        E: Executor<'e, Database = MySql>,
    {
        debug!(sql = %self.sql, args = self.values.len(), "fetching one row");
        Ok(self.build()?.fetch_one(executor).await?)
    }

    /// Executes the query and returns at most one row.
    ///
    /// Returns `Some(row)` if a row matches, `None` otherwise — the
    /// not-found case without an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row cannot be converted to
    /// type `R`.
    pub async fn fetch_optional<'e, E>(&self, executor: E) -> crate::Result<Option<R>>
    where
        E: Executor<'e, Database = MySql>,
    {
        debug!(sql = %self.sql, args = self.values.len(), "fetching optional row");
        Ok(self.build()?.fetch_optional(executor).await?)
    }

    fn build(&self) -> crate::Result<QA<'_, R>> {
        let mut q = sqlx::query_as(&self.sql);
        for value in &self.values {
            q = push_bind_as(q, value)?;
        }
        Ok(q)
    }
}

fn push_bind_as<'q, R>(q: QA<'q, R>, value: &Value) -> crate::Result<QA<'q, R>> {
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
