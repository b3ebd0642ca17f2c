pub mod accounts;
pub mod migrate;
pub mod posts;
pub mod sessions;
pub mod types;
pub mod users;

pub use sqlx::postgres::PgPool;
pub use types::*;

/// True when `err` is a Postgres unique-constraint violation (duplicate
/// email, duplicate linked account). Handlers map these to HTTP 409.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_unique_violations() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::PoolClosed));
    }
}
