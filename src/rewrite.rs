//! The SQL scanner: named-placeholder rewriting, positional (`IN`) rewriting
//! and `VALUES` tuple expansion.
//!
//! The scanner is character-oriented and single-pass, no backtracking.
//! Placeholder markers and identifier characters are ASCII-only
//! (`A-Z a-z 0-9 _ .` after a leading letter); multi-byte text inside string
//! literals and quoted identifiers is copied through verbatim.

use crate::dialect::Dialect;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Repeat counts for `IN` expansion, keyed by 0-based placeholder index.
///
/// Indices absent from the map repeat once. Counts above one turn a single
/// placeholder into `frag,frag,...,frag`.
#[derive(Debug, Clone, Default)]
pub struct BindCounts(std::collections::HashMap<usize, usize>);

impl BindCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the repeat count for the placeholder at `index`.
    pub fn set(&mut self, index: usize, count: usize) {
        self.0.insert(index, count);
    }

    /// The repeat count for the placeholder at `index` (default 1).
    pub fn get(&self, index: usize) -> usize {
        self.0.get(&index).copied().unwrap_or(1)
    }

    /// True when every placeholder repeats once.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Output of a rewrite pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// The rewritten SQL text (empty when the pass skipped query emission).
    pub sql: String,
    /// Identifiers in source order, duplicates preserved.
    pub idents: Vec<String>,
}

/// Rewrites named placeholders into `to`-dialect positional placeholders.
///
/// Equivalent to [`rewrite_named`] with default repeat counts, emitting both
/// the query text and the identifier list.
///
/// ```
/// use sqlx_rebind::{rewrite, Dialect};
///
/// let r = rewrite("SELECT * FROM user WHERE id = :id", Dialect::Dollar)?;
/// assert_eq!(r.sql, "SELECT * FROM user WHERE id = $1");
/// assert_eq!(r.idents, vec!["id"]);
/// # Ok::<(), sqlx_rebind::Error>(())
/// ```
pub fn rewrite(input: &str, to: Dialect) -> Result<Rewritten> {
    rewrite_named(input, to, &BindCounts::new(), true, true)
}

/// Extracts the identifier list without emitting query text.
pub fn extract_idents(input: &str) -> Result<Vec<String>> {
    rewrite_named(input, Dialect::Question, &BindCounts::new(), false, true).map(|r| r.idents)
}

/// The full named-placeholder scanner.
///
/// One left-to-right pass over `input`:
///
/// - whitespace runs outside quoted regions collapse to a single space;
/// - `::` unescapes to one `:`, inside and outside quoted regions, and never
///   counts as a placeholder;
/// - `:` followed by a letter reads the longest run of `[A-Za-z0-9_.]` as an
///   identifier and emits `counts.get(i)` comma-separated placeholder
///   fragments for it, numbering bind indices monotonically across fragments;
/// - `'...'`, `"..."` and `` `...` `` regions suppress placeholder
///   recognition and whitespace collapsing (doubled quote characters stay
///   inside the region);
/// - everything else is copied verbatim;
/// - a single trailing `;` is trimmed from the final output.
///
/// `keep_query` / `keep_idents` select which halves of the result are
/// produced, so callers needing only the identifier list skip the text
/// emission entirely.
pub fn rewrite_named(
    input: &str,
    to: Dialect,
    counts: &BindCounts,
    keep_query: bool,
    keep_idents: bool,
) -> Result<Rewritten> {
    if input.trim().is_empty() {
        return Err(Error::BlankQuery);
    }

    let chars: Vec<char> = input.chars().collect();
    let n = chars.len();
    let mut sql = String::with_capacity(if keep_query { input.len() + 16 } else { 0 });
    let mut idents: Vec<String> = Vec::new();
    let mut bind_index = 0usize;
    let mut ident_index = 0usize;
    let mut quote: Option<char> = None;
    let mut i = 0usize;

    while i < n {
        let c = chars[i];

        if let Some(q) = quote {
            if c == ':' && chars.get(i + 1) == Some(&':') {
                if keep_query {
                    sql.push(':');
                }
                i += 2;
                continue;
            }
            if c == q {
                if chars.get(i + 1) == Some(&q) {
                    // doubled quote char stays inside the region
                    if keep_query {
                        sql.push(q);
                        sql.push(q);
                    }
                    i += 2;
                    continue;
                }
                quote = None;
            }
            if keep_query {
                sql.push(c);
            }
            i += 1;
            continue;
        }

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                while i < n && matches!(chars[i], ' ' | '\t' | '\r' | '\n') {
                    i += 1;
                }
                if keep_query && !sql.ends_with(' ') {
                    sql.push(' ');
                }
            }
            '\'' | '"' | '`' => {
                quote = Some(c);
                if keep_query {
                    sql.push(c);
                }
                i += 1;
            }
            ':' => {
                if chars.get(i + 1) == Some(&':') {
                    if keep_query {
                        sql.push(':');
                    }
                    i += 2;
                } else if chars.get(i + 1).is_some_and(|ch| ch.is_ascii_alphabetic()) {
                    let start = i + 1;
                    let mut j = start;
                    while j < n && is_ident_char(chars[j]) {
                        j += 1;
                    }
                    let ident: String = chars[start..j].iter().collect();
                    if keep_query {
                        for k in 0..counts.get(ident_index) {
                            if k > 0 {
                                sql.push(',');
                            }
                            bind_index += 1;
                            to.write_placeholder(bind_index, &ident, &mut sql);
                        }
                    }
                    if keep_idents {
                        idents.push(ident);
                    }
                    ident_index += 1;
                    i = j;
                } else {
                    if keep_query {
                        sql.push(':');
                    }
                    i += 1;
                }
            }
            _ => {
                if keep_query {
                    sql.push(c);
                }
                i += 1;
            }
        }
    }

    if keep_query {
        trim_output(&mut sql);
    }
    Ok(Rewritten { sql, idents })
}

/// The positional (`parse-in`) scanner.
///
/// Recognizes `from`-dialect positional markers (`?`; `$` + digits;
/// `@` + digits; `:` + identifier), applies the dialect's doubling escape
/// (`??`, `$$`, `@@`, `::`), and re-emits each marker `counts.get(i)` times
/// in the `to` dialect with monotonically renumbered bind indices. Returns
/// the rewritten text and the number of marker slots found.
pub fn rewrite_positional(
    input: &str,
    from: Dialect,
    to: Dialect,
    counts: &BindCounts,
) -> Result<(String, usize)> {
    if input.trim().is_empty() {
        return Err(Error::BlankQuery);
    }

    let marker = from.marker();
    let chars: Vec<char> = input.chars().collect();
    let n = chars.len();
    let mut sql = String::with_capacity(input.len() + 16);
    let mut bind_index = 0usize;
    let mut slot_index = 0usize;
    let mut quote: Option<char> = None;
    let mut i = 0usize;

    while i < n {
        let c = chars[i];

        if let Some(q) = quote {
            if c == marker && chars.get(i + 1) == Some(&marker) {
                sql.push(marker);
                i += 2;
                continue;
            }
            if c == q {
                if chars.get(i + 1) == Some(&q) {
                    sql.push(q);
                    sql.push(q);
                    i += 2;
                    continue;
                }
                quote = None;
            }
            sql.push(c);
            i += 1;
            continue;
        }

        match c {
            ' ' | '\t' | '\r' | '\n' => {
                while i < n && matches!(chars[i], ' ' | '\t' | '\r' | '\n') {
                    i += 1;
                }
                if !sql.ends_with(' ') {
                    sql.push(' ');
                }
            }
            '\'' | '"' | '`' => {
                quote = Some(c);
                sql.push(c);
                i += 1;
            }
            c if c == marker => {
                if chars.get(i + 1) == Some(&marker) {
                    sql.push(marker);
                    i += 2;
                    continue;
                }
                let (ident, next) = match from {
                    Dialect::Question => (String::new(), i + 1),
                    Dialect::Dollar | Dialect::At => {
                        let start = i + 1;
                        let mut j = start;
                        while j < n && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        if j == start {
                            // bare marker char, not a placeholder
                            sql.push(c);
                            i += 1;
                            continue;
                        }
                        (String::new(), j)
                    }
                    Dialect::Colon => {
                        if !chars.get(i + 1).is_some_and(|ch| ch.is_ascii_alphabetic()) {
                            sql.push(c);
                            i += 1;
                            continue;
                        }
                        let start = i + 1;
                        let mut j = start;
                        while j < n && is_ident_char(chars[j]) {
                            j += 1;
                        }
                        (chars[start..j].iter().collect(), j)
                    }
                };
                for k in 0..counts.get(slot_index) {
                    if k > 0 {
                        sql.push(',');
                    }
                    bind_index += 1;
                    to.write_placeholder(bind_index, &ident, &mut sql);
                }
                slot_index += 1;
                i = next;
            }
            _ => {
                sql.push(c);
                i += 1;
            }
        }
    }

    trim_output(&mut sql);
    Ok((sql, slot_index))
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

fn trim_output(sql: &mut String) {
    while sql.ends_with(' ') {
        sql.pop();
    }
    if sql.ends_with(';') {
        sql.pop();
        while sql.ends_with(' ') {
            sql.pop();
        }
    }
    if sql.starts_with(' ') {
        sql.remove(0);
    }
}

static VALUES_GROUP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\)\s*VALUES\s*\(").unwrap()
});

/// Duplicates the parenthesized group after `VALUES` into `tuples` copies.
///
/// `INSERT INTO t (a, b) VALUES (x, y) ON ...` with three tuples becomes
/// `INSERT INTO t (a, b) VALUES (x, y),(x, y),(x, y) ON ...`. The group is
/// matched with a parenthesis depth counter, so tuple templates may contain
/// nested groups.
pub fn expand_value_tuples(sql: &str, tuples: usize) -> Result<String> {
    let found = VALUES_GROUP.find(sql).ok_or(Error::MalformedInsertTemplate(
        "slice arguments are only supported in INSERT statements with a VALUES clause",
    ))?;

    let open = found.end() - 1;
    let bytes = sql.as_bytes();
    let mut depth = 1usize;
    let mut close = None;
    let mut i = open + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            _ => {}
        }
        i += 1;
    }
    let close = close.ok_or(Error::MalformedInsertTemplate(
        "missing ending parenthesis in VALUES clause",
    ))?;

    let group = &sql[open..=close];
    let mut out = String::with_capacity(sql.len() + tuples.saturating_sub(1) * (group.len() + 1));
    out.push_str(&sql[..=close]);
    for _ in 1..tuples {
        out.push(',');
        out.push_str(group);
    }
    out.push_str(&sql[close + 1..]);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placeholders(sql: &str, d: Dialect) -> usize {
        match d {
            Dialect::Question => sql.matches('?').count(),
            Dialect::Dollar => sql.matches('$').count(),
            Dialect::At => sql.matches("@p").count(),
            Dialect::Colon => sql.matches(':').count(),
        }
    }

    #[test]
    fn simple_named_dollar() {
        let r = rewrite("SELECT * FROM user WHERE id = :id AND name = :name", Dialect::Dollar).unwrap();
        assert_eq!(r.sql, "SELECT * FROM user WHERE id = $1 AND name = $2");
        assert_eq!(r.idents, vec!["id", "name"]);
        assert_eq!(placeholders(&r.sql, Dialect::Dollar), r.idents.len());
    }

    #[test]
    fn simple_named_question() {
        let r = rewrite("SELECT * FROM user WHERE id = :id", Dialect::Question).unwrap();
        assert_eq!(r.sql, "SELECT * FROM user WHERE id = ?");
    }

    #[test]
    fn simple_named_at() {
        let r = rewrite("SELECT * FROM user WHERE city = :address.city", Dialect::At).unwrap();
        assert_eq!(r.sql, "SELECT * FROM user WHERE city = @p1");
        assert_eq!(r.idents, vec!["address.city"]);
    }

    #[test]
    fn colon_output_is_identity_for_named_sites() {
        let input = "SELECT * FROM user WHERE id = :id AND name = :name";
        let r = rewrite(input, Dialect::Colon).unwrap();
        assert_eq!(r.sql, input);

        // idempotent: rewriting the output again changes nothing
        let again = rewrite(&r.sql, Dialect::Colon).unwrap();
        assert_eq!(again.sql, r.sql);
        assert_eq!(again.idents, r.idents);
    }

    #[test]
    fn repeated_identifiers_are_preserved() {
        let r = rewrite("SELECT * FROM t WHERE a = :id OR b = :id", Dialect::Dollar).unwrap();
        assert_eq!(r.sql, "SELECT * FROM t WHERE a = $1 OR b = $2");
        assert_eq!(r.idents, vec!["id", "id"]);
    }

    #[test]
    fn in_expansion_counts() {
        let mut counts = BindCounts::new();
        counts.set(0, 3);
        let r = rewrite_named(
            "SELECT * FROM user WHERE id IN (:ids)",
            Dialect::Question,
            &counts,
            true,
            true,
        )
        .unwrap();
        assert_eq!(r.sql, "SELECT * FROM user WHERE id IN (?,?,?)");
        assert_eq!(r.idents, vec!["ids"]);
    }

    #[test]
    fn in_expansion_counts_dollar_numbers_monotonically() {
        let mut counts = BindCounts::new();
        counts.set(1, 3);
        let r = rewrite_named(
            "SELECT * FROM t WHERE a = :a AND id IN (:ids) AND b = :b",
            Dialect::Dollar,
            &counts,
            true,
            true,
        )
        .unwrap();
        assert_eq!(r.sql, "SELECT * FROM t WHERE a = $1 AND id IN ($2,$3,$4) AND b = $5");
    }

    #[test]
    fn in_expansion_colon_repeats_the_name() {
        let mut counts = BindCounts::new();
        counts.set(0, 3);
        let r = rewrite_named(
            "SELECT * FROM t WHERE id IN (:ids)",
            Dialect::Colon,
            &counts,
            true,
            true,
        )
        .unwrap();
        assert_eq!(r.sql, "SELECT * FROM t WHERE id IN (:ids,:ids,:ids)");
    }

    #[test]
    fn escaped_colon_inside_and_outside_quotes() {
        let r = rewrite(
            r#"SELECT "::foo" FROM x WHERE a = :a AND b = '::b'"#,
            Dialect::Question,
        )
        .unwrap();
        assert_eq!(r.sql, r#"SELECT ":foo" FROM x WHERE a = ? AND b = ':b'"#);
        assert_eq!(r.idents, vec!["a"]);
    }

    #[test]
    fn placeholders_inside_quotes_are_not_recognized() {
        let r = rewrite("SELECT ':not_a_param' FROM t WHERE a = :a", Dialect::Question).unwrap();
        assert_eq!(r.sql, "SELECT ':not_a_param' FROM t WHERE a = ?");
        assert_eq!(r.idents, vec!["a"]);
    }

    #[test]
    fn doubled_quote_stays_inside_string() {
        let r = rewrite("SELECT 'it''s :x here' FROM t", Dialect::Question).unwrap();
        assert_eq!(r.sql, "SELECT 'it''s :x here' FROM t");
        assert!(r.idents.is_empty());
    }

    #[test]
    fn whitespace_collapses_and_trailing_semicolon_trims() {
        let r = rewrite("SELECT *\n  FROM user\tWHERE id = :id ;", Dialect::Question).unwrap();
        assert_eq!(r.sql, "SELECT * FROM user WHERE id = ?");
    }

    #[test]
    fn whitespace_inside_strings_is_preserved() {
        let r = rewrite("SELECT 'a  b\tc' FROM t", Dialect::Question).unwrap();
        assert_eq!(r.sql, "SELECT 'a  b\tc' FROM t");
    }

    #[test]
    fn query_without_placeholders_passes_through() {
        for d in [Dialect::Question, Dialect::Dollar, Dialect::At, Dialect::Colon] {
            let r = rewrite("SELECT 1 FROM dual;", d).unwrap();
            assert_eq!(r.sql, "SELECT 1 FROM dual");
            assert!(r.idents.is_empty());
        }
    }

    #[test]
    fn colon_followed_by_non_letter_is_literal() {
        let r = rewrite("SELECT a:b, x FROM t WHERE t.c = :c", Dialect::Question).unwrap();
        // ":b" is a placeholder (letter follows), ":c" too; test a digit case:
        let r2 = rewrite("SELECT x FROM t WHERE a = b:1 AND c = :c", Dialect::Question).unwrap();
        assert_eq!(r2.sql, "SELECT x FROM t WHERE a = b:1 AND c = ?");
        assert_eq!(r.idents, vec!["b", "c"]);
    }

    #[test]
    fn blank_query_is_rejected() {
        assert!(matches!(rewrite("", Dialect::Question), Err(Error::BlankQuery)));
        assert!(matches!(rewrite("   \n\t", Dialect::Question), Err(Error::BlankQuery)));
    }

    #[test]
    fn skip_query_mode_extracts_idents_only() {
        let idents = extract_idents("INSERT INTO t (a, b) VALUES (:a, :b)").unwrap();
        assert_eq!(idents, vec!["a", "b"]);
    }

    #[test]
    fn positional_question_expansion() {
        let mut counts = BindCounts::new();
        counts.set(0, 2);
        let (sql, slots) = rewrite_positional(
            "SELECT * FROM t WHERE id IN (?)",
            Dialect::Question,
            Dialect::Question,
            &counts,
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE id IN (?,?)");
        assert_eq!(slots, 1);
    }

    #[test]
    fn positional_mixed_scalars_and_sequence() {
        let mut counts = BindCounts::new();
        counts.set(1, 3);
        let (sql, slots) = rewrite_positional(
            "SELECT * FROM t WHERE a = ? AND id IN (?) AND b = ?",
            Dialect::Question,
            Dialect::Question,
            &counts,
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = ? AND id IN (?,?,?) AND b = ?");
        assert_eq!(slots, 3);
    }

    #[test]
    fn positional_escape_is_not_a_marker() {
        let (sql, slots) = rewrite_positional(
            "SELECT a ?? b FROM t WHERE c = ?",
            Dialect::Question,
            Dialect::Question,
            &BindCounts::new(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT a ? b FROM t WHERE c = ?");
        assert_eq!(slots, 1);
    }

    #[test]
    fn positional_dollar_markers_renumber() {
        let (sql, slots) = rewrite_positional(
            "SELECT * FROM t WHERE a = $1 AND b = $2",
            Dialect::Dollar,
            Dialect::Dollar,
            &BindCounts::new(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE a = $1 AND b = $2");
        assert_eq!(slots, 2);
    }

    #[test]
    fn positional_bare_dollar_is_literal() {
        let (sql, slots) = rewrite_positional(
            "SELECT price$ FROM t WHERE a = $1",
            Dialect::Dollar,
            Dialect::Dollar,
            &BindCounts::new(),
        )
        .unwrap();
        assert_eq!(sql, "SELECT price$ FROM t WHERE a = $1");
        assert_eq!(slots, 1);
    }

    #[test]
    fn expand_tuples_basic() {
        let sql = expand_value_tuples("INSERT INTO users (id, name) VALUES (?, ?)", 3).unwrap();
        assert_eq!(sql, "INSERT INTO users (id, name) VALUES (?, ?),(?, ?),(?, ?)");
    }

    #[test]
    fn expand_tuples_preserves_trailing_text() {
        let sql = expand_value_tuples(
            "INSERT INTO t (a) VALUES (:a) ON DUPLICATE KEY UPDATE a = a",
            2,
        )
        .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO t (a) VALUES (:a),(:a) ON DUPLICATE KEY UPDATE a = a"
        );
    }

    #[test]
    fn expand_tuples_handles_nested_parens() {
        let sql = expand_value_tuples("INSERT INTO t (a, b) VALUES (LOWER(:a), :b)", 2).unwrap();
        assert_eq!(sql, "INSERT INTO t (a, b) VALUES (LOWER(:a), :b),(LOWER(:a), :b)");
    }

    #[test]
    fn expand_tuples_is_case_and_space_insensitive() {
        let sql = expand_value_tuples("insert into t (a)  values  (:a)", 2).unwrap();
        assert_eq!(sql, "insert into t (a)  values  (:a),(:a)");
    }

    #[test]
    fn expand_tuples_without_values_clause_fails() {
        let err = expand_value_tuples("UPDATE t SET a = :a", 2).unwrap_err();
        assert!(matches!(err, Error::MalformedInsertTemplate(_)));
    }

    #[test]
    fn expand_tuples_unbalanced_parens_fail() {
        let err = expand_value_tuples("INSERT INTO t (a) VALUES (:a", 2).unwrap_err();
        assert!(matches!(err, Error::MalformedInsertTemplate(_)));
    }

    #[test]
    fn escape_preservation_counts() {
        // one escape + one bind site: two source-marker occurrences collapse
        // to one escape copy plus one emitted marker
        let r = rewrite("SELECT ':: ' || a FROM t WHERE b = :b", Dialect::Colon).unwrap();
        assert_eq!(r.sql.matches(':').count(), 2);
    }
}
