//! Record descriptors: how typed arguments expose named fields to the binder.
//!
//! Instead of runtime reflection, a record supplies a static field table and
//! an indexed getter. Canonical lookup keys are derived per field from the
//! configured tag, a name transform, or the declared name itself.

use crate::bind::Options;
use crate::value::Value;
use std::collections::HashMap;

/// One field of a record descriptor.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// The declared field name.
    pub name: &'static str,
    /// `(tag key, tag value)` pairs attached to the field.
    ///
    /// The value selected by [`Options::tag`] may carry a trailing
    /// `,option` suffix, which is stripped; an empty or `-` value falls back
    /// to the name transform.
    pub tags: &'static [(&'static str, &'static str)],
}

impl FieldDef {
    /// A field with no tags.
    pub const fn new(name: &'static str) -> Self {
        Self { name, tags: &[] }
    }

    /// A field carrying tags.
    pub const fn tagged(name: &'static str, tags: &'static [(&'static str, &'static str)]) -> Self {
        Self { name, tags }
    }
}

/// A field read out of a record instance.
pub enum FieldRef<'a> {
    /// A leaf value.
    Value(Value),
    /// A nested record that dotted paths descend into.
    Nested(&'a dyn Record),
    /// An uninitialized nested record (`Option::None`).
    NilNested,
}

/// A record argument: a typed value with named fields.
///
/// Implementations pair a static field table with an indexed getter:
///
/// ```
/// use sqlx_rebind::{FieldDef, FieldRef, Record, Value};
///
/// struct User {
///     id: i64,
///     full_name: String,
/// }
///
/// impl Record for User {
///     fn fields(&self) -> &'static [FieldDef] {
///         const FIELDS: &[FieldDef] = &[
///             FieldDef::new("id"),
///             FieldDef::tagged("full_name", &[("db", "name")]),
///         ];
///         FIELDS
///     }
///
///     fn field(&self, index: usize) -> FieldRef<'_> {
///         match index {
///             0 => FieldRef::Value(Value::Int(self.id)),
///             _ => FieldRef::Value(Value::Text(self.full_name.clone())),
///         }
///     }
/// }
/// ```
pub trait Record {
    /// The field table for this record type.
    ///
    /// Must return the same slice for every instance of the type; the binder
    /// keys its per-call canonical-key cache on the slice address.
    fn fields(&self) -> &'static [FieldDef];

    /// Reads the field at `index` in [`Record::fields`] order.
    fn field(&self, index: usize) -> FieldRef<'_>;
}

/// Builds the canonical-key table for one field slice.
///
/// Key precedence per field: configured tag value (first comma-separated
/// token; empty or `-` falls back), else `name_transform(name)`. The declared
/// name is additionally accepted when not already taken by another key.
pub(crate) fn canonical_keys(fields: &[FieldDef], opts: &Options) -> HashMap<String, usize> {
    let mut keys = HashMap::with_capacity(fields.len() * 2);
    for (index, field) in fields.iter().enumerate() {
        let tag_value = field
            .tags
            .iter()
            .find(|&&(key, _)| key == opts.tag)
            .map(|&(_, value)| value.split(',').next().unwrap_or(value))
            .filter(|value| !value.is_empty() && *value != "-");

        let key = match tag_value {
            Some(value) => value.to_string(),
            None => (opts.name_transform)(field.name),
        };
        keys.insert(key, index);
        keys.entry(field.name.to_string()).or_insert(index);
    }
    keys
}

/// Lower-snake-cases a declared field name: `FullName` and `fullName` both
/// become `full_name`, `UserID` becomes `user_id`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if i > 0 && (prev_lower || next_lower) {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
