use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// Translate sqlx failures into the repository error vocabulary.
///
/// Constraint violations are classified through [`ErrorKind`], which Postgres
/// derives from SQLSTATE codes. The check-constraint case matters here: the
/// `accounts.tokens_balance >= 0` CHECK is the last line against a concurrent
/// overdraft slipping past the guarded deduction, and callers surface it as an
/// integrity failure rather than a bare database error.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    let db = match err {
        sqlx::Error::RowNotFound => return RepoError::NotFound,
        sqlx::Error::Database(db) => db,
        other => return RepoError::from_persistence(other),
    };

    match db.kind() {
        ErrorKind::UniqueViolation => RepoError::Duplicate {
            constraint: db.constraint().unwrap_or("unknown").to_string(),
        },
        ErrorKind::ForeignKeyViolation => RepoError::InvalidInput {
            message: db.message().to_string(),
        },
        ErrorKind::CheckViolation => RepoError::Integrity {
            message: format!(
                "check constraint `{}` violated",
                db.constraint().unwrap_or("unknown")
            ),
        },
        ErrorKind::NotNullViolation => RepoError::Integrity {
            message: db.message().to_string(),
        },
        _ => {
            let message = db.message();
            if message.contains("invalid input syntax") {
                RepoError::InvalidInput {
                    message: message.to_string(),
                }
            } else if message.contains("canceling statement due to user request") {
                RepoError::Timeout
            } else {
                RepoError::from_persistence(sqlx::Error::Database(db))
            }
        }
    }
}
