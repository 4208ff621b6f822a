/// Error types for sqlx-rebind
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The query text was empty or whitespace-only
    #[error("query cannot be blank")]
    BlankQuery,

    /// The top-level argument is neither a map, a record, nor a sequence of those
    #[error("unsupported argument type: {0}")]
    UnsupportedArgument(&'static str),

    /// More than one argument was supplied alongside a map or record argument
    #[error("too many arguments for a named query")]
    TooManyArguments,

    /// A named placeholder has no corresponding map key or record field
    #[error("could not find field '{0}'")]
    FieldNotFound(String),

    /// A dotted path traverses an uninitialized nested record
    #[error("field '{0}' is a nil nested record")]
    NilNestedReference(String),

    /// An argument bound to an `IN (...)` position is an empty sequence
    #[error("empty sequence passed to IN clause")]
    EmptySequenceForIn,

    /// A sequence argument for a batch INSERT has length zero
    #[error("empty batch: sequence argument has no elements")]
    EmptyBatch,

    /// Tuple expansion was requested but the query has no usable `VALUES (...)` group
    #[error("{0}")]
    MalformedInsertTemplate(&'static str),

    /// The number of emitted placeholders does not match the argument count
    #[error("wrong number of arguments")]
    BindCountMismatch,

    /// A scalar sequence appeared in positional arguments under a non-`?` dialect
    #[error("positional IN expansion is only supported for the question dialect")]
    PositionalInWrongDialect,

    /// An opaque value producer failed while encoding its driver value
    #[error("value producer error: {0}")]
    Valuer(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Error from SQLx database operations
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type alias for sqlx-rebind operations
pub type Result<T> = std::result::Result<T, Error>;
