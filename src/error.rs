use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::key::PrimaryKey;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the CRUD engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A key lookup matched zero records.
    #[error("{entity} with key {key} could not be found")]
    NotFound {
        entity: &'static str,
        key: PrimaryKey,
    },

    /// An insert collided with an identity already present in the store.
    #[error("a {entity} with the same key already exists")]
    DuplicateKey { entity: &'static str },

    /// A key or field descriptor named something that is not a mapped column.
    #[error("{entity} has no mapped column named `{field}`")]
    UnknownField { entity: &'static str, field: String },

    #[error(transparent)]
    Database(#[from] DbErr),
}

impl Error {
    /// Classifies a mapper error raised during insert, turning
    /// unique-constraint violations into [`Error::DuplicateKey`].
    pub(crate) fn from_insert(entity: &'static str, err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => Self::DuplicateKey { entity },
            _ => Self::Database(err),
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey { .. })
    }
}
