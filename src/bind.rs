//! The argument binder: walks a map, record or sequence argument and produces
//! the flat argument vector in placeholder order.

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::record::{canonical_keys, snake_case, FieldRef, Record};
use crate::rewrite::{self, BindCounts, Rewritten};
use crate::value::Value;
use std::collections::HashMap;

/// Rewrite and binding configuration.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Output placeholder dialect.
    pub dialect: Dialect,
    /// Record-field tag preferred over the declared field name.
    pub tag: &'static str,
    /// Transform applied to a declared field name when no tag is present.
    pub name_transform: fn(&str) -> String,
    /// Capacity of a [`StatementCache`](crate::StatementCache) built from
    /// these options; zero disables caching.
    pub statement_cache_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: Dialect::Question,
            tag: "db",
            name_transform: snake_case,
            statement_cache_capacity: 16,
        }
    }
}

impl Options {
    /// Default options with the given dialect.
    pub fn with_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }
}

/// A named argument, classified by the resolver.
pub(crate) enum NamedShape<'a> {
    Map(&'a HashMap<String, Value>),
    Record(&'a dyn Record),
    MapSeq(&'a [Value]),
    Records(&'a [&'a dyn Record]),
}

enum Element<'a> {
    Map(&'a HashMap<String, Value>),
    Record(&'a dyn Record),
}

/// Per-call canonical-key tables, keyed by descriptor slice address.
type KeyCache = HashMap<usize, HashMap<String, usize>>;

/// Binds a named argument against `sql`.
///
/// `first` is the default-count rewrite of `sql` under `opts.dialect`; the
/// binder reuses its identifier list and, when no `IN` expansion or tuple
/// expansion is needed, its query text.
pub(crate) fn bind_named(
    sql: &str,
    first: &Rewritten,
    shape: NamedShape<'_>,
    opts: &Options,
) -> Result<(String, Vec<Value>)> {
    let mut cache = KeyCache::new();
    match shape {
        NamedShape::Map(map) => {
            let values = bind_element(&first.idents, &Element::Map(map), opts, &mut cache)?;
            finish_single(sql, first, values, opts)
        }
        NamedShape::Record(rec) => {
            let values = bind_element(&first.idents, &Element::Record(rec), opts, &mut cache)?;
            finish_single(sql, first, values, opts)
        }
        NamedShape::MapSeq(items) => {
            let elements = items
                .iter()
                .map(|item| match item {
                    Value::Map(map) => Ok(Element::Map(map)),
                    _ => Err(Error::UnsupportedArgument(
                        "batch elements must all be maps",
                    )),
                })
                .collect::<Result<Vec<_>>>()?;
            bind_batch(sql, first, &elements, opts, &mut cache)
        }
        NamedShape::Records(records) => {
            let elements: Vec<Element<'_>> =
                records.iter().map(|rec| Element::Record(*rec)).collect();
            bind_batch(sql, first, &elements, opts, &mut cache)
        }
    }
}

/// Single map/record: detect scalar sequences, expand `IN` sites if any.
fn finish_single(
    sql: &str,
    first: &Rewritten,
    values: Vec<Value>,
    opts: &Options,
) -> Result<(String, Vec<Value>)> {
    let (values, counts) = apply_in_expansion(values)?;
    if counts.is_empty() {
        return Ok((first.sql.clone(), values));
    }
    let second = rewrite::rewrite_named(sql, opts.dialect, &counts, true, false)?;
    Ok((second.sql, values))
}

/// Sequence argument: tuple-expand the `VALUES` group and bind per element.
///
/// Under the question dialect the tuples are textually identical, so
/// expansion happens after the rewrite; every other dialect numbers binds
/// per tuple, so the source text expands first and is rewritten whole.
fn bind_batch(
    sql: &str,
    first: &Rewritten,
    elements: &[Element<'_>],
    opts: &Options,
    cache: &mut KeyCache,
) -> Result<(String, Vec<Value>)> {
    if elements.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let expanded = match opts.dialect {
        Dialect::Question => rewrite::expand_value_tuples(&first.sql, elements.len())?,
        _ => {
            let source = rewrite::expand_value_tuples(sql, elements.len())?;
            rewrite::rewrite_named(&source, opts.dialect, &BindCounts::new(), true, false)?.sql
        }
    };

    let mut values = Vec::with_capacity(first.idents.len() * elements.len());
    for element in elements {
        let bound = bind_element(&first.idents, element, opts, cache)?;
        if bound.iter().any(|v| matches!(v, Value::Seq(_))) {
            return Err(Error::UnsupportedArgument(
                "IN expansion is not supported inside batch elements",
            ));
        }
        values.extend(bound);
    }
    Ok((expanded, values))
}

fn bind_element(
    idents: &[String],
    element: &Element<'_>,
    opts: &Options,
    cache: &mut KeyCache,
) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(idents.len());
    for ident in idents {
        let value = match element {
            Element::Map(map) => lookup_map(map, ident)?,
            Element::Record(rec) => {
                let path: Vec<&str> = ident.split('.').collect();
                lookup_record(*rec, ident, &path, opts, cache)?
            }
        };
        out.push(value);
    }
    Ok(out)
}

/// Dotted-path traversal through nested maps.
///
/// A missing first segment is an error; a missing final segment deeper down
/// binds as NULL; anything unresolved in between is an error.
fn lookup_map(map: &HashMap<String, Value>, ident: &str) -> Result<Value> {
    let mut current = map;
    let segments: Vec<&str> = ident.split('.').collect();
    for (depth, segment) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();
        match current.get(*segment) {
            None if depth > 0 && last => return Ok(Value::Null),
            None => return Err(Error::FieldNotFound(ident.to_string())),
            Some(value) if last => return Ok(value.clone()),
            Some(Value::Map(next)) => current = next,
            Some(_) => return Err(Error::FieldNotFound(ident.to_string())),
        }
    }
    Err(Error::FieldNotFound(ident.to_string()))
}

/// Dotted-path traversal through nested record descriptors.
fn lookup_record(
    rec: &dyn Record,
    ident: &str,
    path: &[&str],
    opts: &Options,
    cache: &mut KeyCache,
) -> Result<Value> {
    let fields = rec.fields();
    let index = {
        let keys = cache
            .entry(fields.as_ptr() as usize)
            .or_insert_with(|| canonical_keys(fields, opts));
        keys.get(path[0]).copied()
    };
    let Some(index) = index else {
        return Err(Error::FieldNotFound(ident.to_string()));
    };

    let rest = &path[1..];
    match rec.field(index) {
        FieldRef::Value(value) if rest.is_empty() => Ok(value),
        FieldRef::Value(_) => Err(Error::FieldNotFound(ident.to_string())),
        FieldRef::Nested(_) if rest.is_empty() => Err(Error::UnsupportedArgument(
            "a nested record cannot bind as a single value",
        )),
        FieldRef::Nested(inner) => lookup_record(inner, ident, rest, opts, cache),
        FieldRef::NilNested if rest.is_empty() => Ok(Value::Null),
        FieldRef::NilNested => Err(Error::NilNestedReference(ident.to_string())),
    }
}

/// Records the length of every scalar-sequence value in [`BindCounts`] and
/// flattens its elements in place.
fn apply_in_expansion(values: Vec<Value>) -> Result<(Vec<Value>, BindCounts)> {
    let mut counts = BindCounts::new();
    let mut out = Vec::with_capacity(values.len());
    for (index, value) in values.into_iter().enumerate() {
        match value {
            Value::Seq(items) => {
                if !items.iter().all(Value::is_scalar) {
                    return Err(Error::UnsupportedArgument(
                        "IN sequences must contain only scalar values",
                    ));
                }
                if items.is_empty() {
                    return Err(Error::EmptySequenceForIn);
                }
                counts.set(index, items.len());
                out.extend(items);
            }
            other => out.push(other),
        }
    }
    Ok((out, counts))
}
