use thiserror::Error;

/// Errors raised while building schema snapshots.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    /// A foreign key lists a different number of parent and referenced columns.
    #[error(
        "foreign key {constraint} pairs {parent} parent columns with {referenced} referenced columns"
    )]
    ForeignKeyArity {
        /// Constraint name as read from the source.
        constraint: String,
        /// Number of parent columns.
        parent: usize,
        /// Number of referenced columns.
        referenced: usize,
    },

    /// A foreign key has no columns at all.
    #[error("foreign key {0} has no columns")]
    EmptyForeignKey(String),

    /// A table or column name is blank after trimming.
    #[error("blank {0} name in schema metadata")]
    BlankName(&'static str),

    /// The metadata source failed.
    #[error("schema reader failed: {0}")]
    Reader(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
