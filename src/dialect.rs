//! Placeholder dialects and the driver-name registry.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::RwLock;

/// Positional placeholder style emitted by the rewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// `?` (MySQL, SQLite)
    #[default]
    Question,
    /// `$1, $2, ...` (PostgreSQL)
    Dollar,
    /// `@p1, @p2, ...` (SQL Server)
    At,
    /// `:name` re-emitted verbatim (Oracle)
    Colon,
}

impl Dialect {
    /// Appends one placeholder fragment to `out`.
    ///
    /// `index` is the 1-based bind index; `ident` is the source identifier,
    /// only consulted by [`Dialect::Colon`].
    pub fn write_placeholder(self, index: usize, ident: &str, out: &mut String) {
        match self {
            Self::Question => out.push('?'),
            Self::Dollar => {
                out.push('$');
                out.push_str(&index.to_string());
            }
            Self::At => {
                out.push_str("@p");
                out.push_str(&index.to_string());
            }
            Self::Colon => {
                out.push(':');
                out.push_str(ident);
            }
        }
    }

    /// The character that introduces this dialect's positional marker.
    pub(crate) fn marker(self) -> char {
        match self {
            Self::Question => '?',
            Self::Dollar => '$',
            Self::At => '@',
            Self::Colon => ':',
        }
    }
}

static REGISTRY: Lazy<RwLock<HashMap<&'static str, Dialect>>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("mysql", Dialect::Question);
    m.insert("mariadb", Dialect::Question);
    m.insert("sqlite", Dialect::Question);
    m.insert("sqlite3", Dialect::Question);
    m.insert("postgres", Dialect::Dollar);
    m.insert("postgresql", Dialect::Dollar);
    m.insert("cockroachdb", Dialect::Dollar);
    m.insert("mssql", Dialect::At);
    m.insert("sqlserver", Dialect::At);
    m.insert("oracle", Dialect::Colon);
    RwLock::new(m)
});

/// Looks up the placeholder dialect for a driver name.
///
/// ```
/// use sqlx_rebind::Dialect;
///
/// assert_eq!(sqlx_rebind::dialect_for("postgres"), Some(Dialect::Dollar));
/// assert_eq!(sqlx_rebind::dialect_for("imaginarydb"), None);
/// ```
pub fn dialect_for(driver: &str) -> Option<Dialect> {
    REGISTRY.read().ok()?.get(driver).copied()
}

/// Registers (or overrides) the dialect for a driver name.
///
/// The registry is a read-mostly table; registration is expected at startup.
pub fn register_driver(driver: &'static str, dialect: Dialect) {
    if let Ok(mut table) = REGISTRY.write() {
        table.insert(driver, dialect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_placeholder_question() {
        let mut s = String::new();
        Dialect::Question.write_placeholder(1, "id", &mut s);
        assert_eq!(s, "?");
    }

    #[test]
    fn write_placeholder_dollar() {
        let mut s = String::new();
        Dialect::Dollar.write_placeholder(12, "id", &mut s);
        assert_eq!(s, "$12");
    }

    #[test]
    fn write_placeholder_at() {
        let mut s = String::new();
        Dialect::At.write_placeholder(3, "id", &mut s);
        assert_eq!(s, "@p3");
    }

    #[test]
    fn write_placeholder_colon_reuses_ident() {
        let mut s = String::new();
        Dialect::Colon.write_placeholder(7, "user_id", &mut s);
        assert_eq!(s, ":user_id");
    }

    #[test]
    fn registry_lookup() {
        assert_eq!(dialect_for("mysql"), Some(Dialect::Question));
        assert_eq!(dialect_for("postgres"), Some(Dialect::Dollar));
        assert_eq!(dialect_for("sqlserver"), Some(Dialect::At));
        assert_eq!(dialect_for("oracle"), Some(Dialect::Colon));
        assert_eq!(dialect_for("nosuchdriver"), None);
    }

    #[test]
    fn registry_registration() {
        register_driver("testdb-dialect-test", Dialect::At);
        assert_eq!(dialect_for("testdb-dialect-test"), Some(Dialect::At));
    }
}
