//! Infrastructure error types

use tempo_domain::TempoError;
use thiserror::Error;

/// Errors raised by infrastructure adapters before mapping into the domain
/// taxonomy.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<InfraError> for TempoError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::Sqlite(rusqlite::Error::QueryReturnedNoRows) => {
                Self::NotFound("requested row does not exist".into())
            }
            InfraError::Sqlite(sql_err) => Self::Database(sql_err.to_string()),
            InfraError::Pool(pool_err) => Self::Database(pool_err.to_string()),
            InfraError::Io(io_err) => Self::Database(io_err.to_string()),
        }
    }
}
