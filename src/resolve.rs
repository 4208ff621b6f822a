//! The query resolver: decides between pass-through, named binding and
//! positional `IN` expansion, and produces the final `(sql, args)` pair.

use crate::bind::{self, NamedShape, Options};
use crate::cache::StatementCache;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::rewrite::{self, BindCounts};
use crate::value::Value;
use tracing::debug;

/// One positional argument handed to [`rebind`].
pub enum Arg<'a> {
    /// A dynamic value: scalar, scalar sequence, map, or sequence of maps.
    Value(Value),
    /// A single record.
    Record(&'a dyn Record),
    /// A batch of records for tuple-expanded INSERT.
    Records(&'a [&'a dyn Record]),
}

impl<'a> Arg<'a> {
    /// Wraps anything convertible into a [`Value`].
    pub fn value(v: impl Into<Value>) -> Self {
        Arg::Value(v.into())
    }

    /// Wraps a record argument.
    pub fn record(rec: &'a dyn Record) -> Self {
        Arg::Record(rec)
    }

    /// Wraps a batch of records.
    pub fn records(recs: &'a [&'a dyn Record]) -> Self {
        Arg::Records(recs)
    }

    fn named_shape(&self) -> Option<NamedShape<'_>> {
        match self {
            Arg::Record(rec) => Some(NamedShape::Record(*rec)),
            Arg::Records(recs) => Some(NamedShape::Records(recs)),
            Arg::Value(Value::Map(map)) => Some(NamedShape::Map(map)),
            Arg::Value(Value::Seq(items))
                if items.first().is_some_and(|v| matches!(v, Value::Map(_))) =>
            {
                Some(NamedShape::MapSeq(items))
            }
            _ => None,
        }
    }
}

/// Rewrites `sql` and binds `args` into a flat argument vector.
///
/// Decision table:
///
/// - no arguments: the text passes through unchanged with empty args;
/// - exactly one map, record, or sequence-of-maps/records argument: named
///   rewriting plus binding (the tokenizer/binder path);
/// - one or more scalar or scalar-sequence arguments: positional `IN`
///   expansion (question dialect only; without any sequence the pair passes
///   through untouched);
/// - anything else is an argument-shape error.
pub fn rebind(sql: &str, args: &[Arg<'_>], opts: &Options) -> Result<(String, Vec<Value>)> {
    rebind_cached(sql, args, opts, None)
}

/// [`rebind`] with an optional [`StatementCache`] supplying the first-pass
/// rewrite for templates seen before.
pub fn rebind_cached(
    sql: &str,
    args: &[Arg<'_>],
    opts: &Options,
    cache: Option<&StatementCache>,
) -> Result<(String, Vec<Value>)> {
    if sql.trim().is_empty() {
        return Err(Error::BlankQuery);
    }
    if args.is_empty() {
        return Ok((sql.to_string(), Vec::new()));
    }

    if let Some(shape) = args[0].named_shape() {
        if args.len() > 1 {
            return Err(Error::TooManyArguments);
        }
        let first = match cache {
            Some(cache) => cache.rewrite(sql, opts.dialect)?,
            None => std::sync::Arc::new(rewrite::rewrite(sql, opts.dialect)?),
        };
        let (sql, values) = bind::bind_named(sql, &first, shape, opts)?;
        debug!(placeholders = values.len(), "rebound named query");
        return Ok((sql, values));
    }

    positional(sql, args, opts)
}

/// The positional path: scalar arguments pass through; scalar sequences are
/// flattened and their placeholder expanded in the question dialect.
fn positional(sql: &str, args: &[Arg<'_>], opts: &Options) -> Result<(String, Vec<Value>)> {
    // a scalar supplied where the query names its parameters is a shape error
    if !rewrite::extract_idents(sql)?.is_empty() {
        return Err(Error::UnsupportedArgument(
            "scalar arguments cannot bind named placeholders",
        ));
    }

    let mut flat = Vec::with_capacity(args.len());
    let mut counts = BindCounts::new();
    let mut expanding = false;

    for (index, arg) in args.iter().enumerate() {
        let Arg::Value(value) = arg else {
            return Err(Error::UnsupportedArgument(
                "record arguments cannot follow positional arguments",
            ));
        };
        match value {
            Value::Map(_) => {
                return Err(Error::UnsupportedArgument(
                    "map arguments cannot follow positional arguments",
                ));
            }
            Value::Seq(items) => {
                if !items.iter().all(Value::is_scalar) {
                    return Err(Error::UnsupportedArgument(
                        "IN sequences must contain only scalar values",
                    ));
                }
                if items.is_empty() {
                    return Err(Error::EmptySequenceForIn);
                }
                expanding = true;
                counts.set(index, items.len());
                flat.extend(items.iter().cloned());
            }
            scalar => flat.push(scalar.clone()),
        }
    }

    if !expanding {
        return Ok((sql.to_string(), flat));
    }
    if opts.dialect != crate::Dialect::Question {
        return Err(Error::PositionalInWrongDialect);
    }

    let (sql, slots) =
        rewrite::rewrite_positional(sql, crate::Dialect::Question, crate::Dialect::Question, &counts)?;
    if slots != args.len() {
        return Err(Error::BindCountMismatch);
    }
    debug!(placeholders = flat.len(), "expanded positional IN query");
    Ok((sql, flat))
}

/// Expands scalar-sequence arguments in a `?`-placeholder query, the way
/// drivers expect `IN (...)` lists to arrive.
///
/// ```
/// use sqlx_rebind::{expand_in, Value};
///
/// let (sql, args) = expand_in(
///     "SELECT * FROM t WHERE id IN (?)",
///     &[Value::from(vec![2, 3])],
/// )?;
/// assert_eq!(sql, "SELECT * FROM t WHERE id IN (?,?)");
/// assert_eq!(args, vec![Value::Int(2), Value::Int(3)]);
/// # Ok::<(), sqlx_rebind::Error>(())
/// ```
pub fn expand_in(sql: &str, args: &[Value]) -> Result<(String, Vec<Value>)> {
    let wrapped: Vec<Arg<'_>> = args.iter().map(|v| Arg::Value(v.clone())).collect();
    positional(sql, &wrapped, &Options::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dialect;
    use std::collections::HashMap;

    fn opts(dialect: Dialect) -> Options {
        Options::with_dialect(dialect)
    }

    #[test]
    fn no_args_pass_through() {
        let (sql, values) = rebind("SELECT 1", &[], &Options::default()).unwrap();
        assert_eq!(sql, "SELECT 1");
        assert!(values.is_empty());
    }

    #[test]
    fn blank_query_fails() {
        assert!(matches!(
            rebind("  \n", &[], &Options::default()),
            Err(Error::BlankQuery)
        ));
    }

    #[test]
    fn single_map_takes_named_path() {
        let arg = crate::args! { "id" => 1 };
        let (sql, values) = rebind(
            "SELECT * FROM t WHERE id = :id",
            &[Arg::Value(arg)],
            &opts(Dialect::Dollar),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id = $1");
        assert_eq!(values, vec![Value::Int(1)]);
    }

    #[test]
    fn scalar_with_named_query_is_unsupported() {
        let err = rebind(
            "SELECT * FROM t WHERE id = :id",
            &[Arg::value(42)],
            &Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedArgument(_)));
    }

    #[test]
    fn map_followed_by_more_args_is_too_many() {
        let arg = crate::args! { "id" => 1 };
        let err = rebind(
            "SELECT * FROM t WHERE id = :id",
            &[Arg::Value(arg), Arg::value(2)],
            &Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::TooManyArguments));
    }

    #[test]
    fn positional_in_expansion() {
        let (sql, values) = rebind(
            "SELECT * FROM t WHERE id IN (?)",
            &[Arg::value(vec![2, 3])],
            &Options::default(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id IN (?,?)");
        assert_eq!(values, vec![Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn positional_scalars_pass_through() {
        let (sql, values) = rebind(
            "SELECT * FROM t WHERE a = ? AND b = ?",
            &[Arg::value(1), Arg::value("x")],
            &Options::default(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND b = ?");
        assert_eq!(values, vec![Value::Int(1), Value::Text("x".into())]);
    }

    #[test]
    fn positional_mixed_expansion() {
        let (sql, values) = rebind(
            "SELECT * FROM t WHERE a = ? AND id IN (?) AND b = ?",
            &[Arg::value(1), Arg::value(vec![4, 5, 6]), Arg::value(9)],
            &Options::default(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND id IN (?,?,?) AND b = ?");
        assert_eq!(values.len(), 5);
    }

    #[test]
    fn positional_expansion_needs_question_dialect() {
        let err = rebind(
            "SELECT * FROM t WHERE id IN (?)",
            &[Arg::value(vec![1, 2])],
            &opts(Dialect::Dollar),
        )
        .unwrap_err();
        assert!(matches!(err, Error::PositionalInWrongDialect));
    }

    #[test]
    fn positional_marker_count_must_match_args() {
        let err = rebind(
            "SELECT * FROM t WHERE id IN (?)",
            &[Arg::value(vec![1, 2]), Arg::value(3)],
            &Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::BindCountMismatch));
    }

    #[test]
    fn positional_empty_sequence_fails() {
        let err = rebind(
            "SELECT * FROM t WHERE id IN (?)",
            &[Arg::Value(Value::Seq(vec![]))],
            &Options::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::EmptySequenceForIn));
    }

    #[test]
    fn seq_of_maps_takes_batch_path() {
        let mut row = HashMap::new();
        row.insert("a".to_string(), Value::Int(1));
        let arg = Value::Seq(vec![Value::Map(row)]);
        let (sql, values) = rebind(
            "INSERT INTO t (a) VALUES (:a)",
            &[Arg::Value(arg)],
            &Options::default(),
        )
        .unwrap();
        assert_eq!(sql, "INSERT INTO t (a) VALUES (?)");
        assert_eq!(values, vec![Value::Int(1)]);
    }

    #[test]
    fn expand_in_helper() {
        let (sql, args) = expand_in(
            "SELECT * FROM t WHERE id IN (?) AND state = ?",
            &[Value::from(vec![2, 3]), Value::Int(1)],
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id IN (?,?) AND state = ?");
        assert_eq!(args, vec![Value::Int(2), Value::Int(3), Value::Int(1)]);
    }
}
