use crate::application::repos::RepoError;

/// Postgres `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";
/// Postgres `invalid_text_representation`.
const INVALID_TEXT: &str = "22P02";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    let db = match err {
        sqlx::Error::RowNotFound => return RepoError::NotFound,
        sqlx::Error::PoolTimedOut => return RepoError::Timeout,
        sqlx::Error::Database(db) => db,
        other => return RepoError::from_persistence(other),
    };

    if db.is_unique_violation() {
        return RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        };
    }
    if db.is_foreign_key_violation() {
        return RepoError::InvalidInput {
            message: db.message().to_string(),
        };
    }
    if db.is_check_violation() {
        return RepoError::Integrity {
            message: db.message().to_string(),
        };
    }
    match db.code().as_deref() {
        Some(QUERY_CANCELED) => RepoError::Timeout,
        Some(INVALID_TEXT) => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        _ => RepoError::from_persistence(db),
    }
}
