//! # sqlx-rebind
//!
//! A SQLx preprocessor that rewrites named placeholders into driver-native
//! positional placeholders and binds a map, record, or sequence argument into
//! a flat, ordered argument vector.
//!
//! ## Features
//!
//! - **Named Placeholders**: Use `:param_name` (and dotted paths like
//!   `:address.city`) instead of `?` in your SQL
//! - **Four Dialects**: Emit `?`, `$1`, `@p1`, or `:name` positional forms
//! - **IN Expansion**: A scalar-sequence argument expands `IN (:ids)` into
//!   the matching number of placeholders
//! - **Batch INSERT**: A sequence of maps or records expands the
//!   `VALUES (...)` tuple template into one tuple per element
//! - **Record Binding**: Typed arguments expose fields through a small
//!   descriptor — tags, name transforms and nested records included
//! - **Zero Runtime Overhead at Execution**: Rewriting and binding happen at
//!   query construction; execution just replays the precomputed pair
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["mysql", "runtime-tokio"] }
//! sqlx-rebind = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Basic Query Execution
//!
//! ```rust,no_run
//! use sqlx::MySqlPool;
//! use sqlx_rebind::{args, Arg, NamedQuery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = MySqlPool::connect("mysql://localhost/test").await?;
//!
//! let query = NamedQuery::new(
//!     "INSERT INTO users (id, name) VALUES (:id, :name)",
//!     Arg::Value(args! { "id" => 42, "name" => "John Doe" }),
//! )?;
//!
//! let result = query.execute(&pool).await?;
//! println!("Inserted {} rows", result.rows_affected());
//! # Ok(())
//! # }
//! ```
//!
//! ### IN Expansion
//!
//! ```rust,no_run
//! use sqlx::{MySqlPool, FromRow};
//! use sqlx_rebind::{args, Arg, NamedQueryAs};
//!
//! #[derive(FromRow)]
//! struct User {
//!     id: i32,
//!     name: String,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let query = NamedQueryAs::<User>::new(
//!     "SELECT id, name FROM users WHERE id IN (:ids)",
//!     Arg::Value(args! { "ids" => vec![4, 5, 6] }),
//! )?;
//!
//! // runs `SELECT id, name FROM users WHERE id IN (?,?,?)` with [4, 5, 6]
//! let users: Vec<User> = query.fetch_all(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Batch INSERT from Records
//!
//! ```rust,no_run
//! use sqlx::MySqlPool;
//! use sqlx_rebind::{Arg, FieldDef, FieldRef, NamedQuery, Record, Value};
//!
//! struct User {
//!     id: i64,
//!     name: String,
//! }
//!
//! impl Record for User {
//!     fn fields(&self) -> &'static [FieldDef] {
//!         const FIELDS: &[FieldDef] = &[FieldDef::new("id"), FieldDef::new("name")];
//!         FIELDS
//!     }
//!
//!     fn field(&self, index: usize) -> FieldRef<'_> {
//!         match index {
//!             0 => FieldRef::Value(Value::Int(self.id)),
//!             _ => FieldRef::Value(Value::Text(self.name.clone())),
//!         }
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = MySqlPool::connect("mysql://localhost/test").await?;
//! let users = [
//!     User { id: 1, name: "Alice".into() },
//!     User { id: 2, name: "Bob".into() },
//! ];
//! let refs: Vec<&dyn Record> = users.iter().map(|u| u as &dyn Record).collect();
//!
//! let query = NamedQuery::new(
//!     "INSERT INTO users (id, name) VALUES (:id, :name)",
//!     Arg::Records(&refs),
//! )?;
//!
//! // runs `INSERT INTO users (id, name) VALUES (?, ?),(?, ?)`
//! query.execute(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Rewriting Without Executing
//!
//! The scanner and binder are plain functions, usable with any driver:
//!
//! ```rust
//! use sqlx_rebind::{expand_in, rewrite, Dialect, Value};
//!
//! let r = rewrite("SELECT * FROM user WHERE id = :id", Dialect::Dollar)?;
//! assert_eq!(r.sql, "SELECT * FROM user WHERE id = $1");
//!
//! let (sql, args) = expand_in(
//!     "SELECT * FROM t WHERE id IN (?)",
//!     &[Value::from(vec![2, 3])],
//! )?;
//! assert_eq!(sql, "SELECT * FROM t WHERE id IN (?,?)");
//! # Ok::<(), sqlx_rebind::Error>(())
//! ```
//!
//! ## How It Works
//!
//! 1. **Scan**: a single left-to-right pass rewrites `:name` sites into the
//!    output dialect and collects the identifier list. `::` escapes to a
//!    literal `:`; quoted regions are left alone.
//! 2. **Bind**: the identifier list drives a walk over the argument — map
//!    keys, record fields (by tag, transformed name, or declared name), or
//!    one element of a sequence per `VALUES` tuple — producing the flat
//!    argument vector in placeholder order.
//! 3. **Expand**: scalar-sequence values re-run the scanner with per-site
//!    repeat counts for `IN (...)`; sequence arguments duplicate the
//!    `VALUES (...)` group per element.
//! 4. **Execute**: the façade replays the precomputed `(sql, args)` pair
//!    against any SQLx executor, constructing a fresh query per call.
//!
//! ## Limitations
//!
//! - The execution façade targets MySQL; the rewriting core is
//!   driver-agnostic
//! - Placeholder names are ASCII: `[A-Za-z][A-Za-z0-9_.]*`
//! - Positional `IN` expansion (`expand_in`) supports the `?` dialect only
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at
//! your option.

pub mod bind;
pub mod cache;
pub mod dialect;
pub mod error;
pub mod query;
pub mod query_as;
pub mod record;
pub mod resolve;
pub mod rewrite;
pub mod value;

pub use bind::Options;
pub use cache::StatementCache;
pub use dialect::{dialect_for, register_driver, Dialect};
pub use error::{Error, Result};
pub use query::NamedQuery;
pub use query_as::NamedQueryAs;
pub use record::{snake_case, FieldDef, FieldRef, Record};
pub use resolve::{expand_in, rebind, rebind_cached, Arg};
pub use rewrite::{expand_value_tuples, extract_idents, rewrite, rewrite_named, BindCounts, Rewritten};
pub use value::{Value, Valuer};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::resolve::Arg;
    pub use crate::value::Value;
    pub use crate::NamedQuery;
    pub use crate::NamedQueryAs;
    pub use crate::Options;
}
