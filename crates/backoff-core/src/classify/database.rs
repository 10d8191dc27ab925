//! Database driver errors worth retrying.
//!
//! Only a fixed allow-list of vendor codes counts: connection failures and
//! transaction-state failures for PostgreSQL, busy/locked for SQLite. Every
//! other code, and every error that did not come from the database itself,
//! is final.

use sqlx::postgres::PgDatabaseError;
use sqlx::sqlite::SqliteError;

/// PostgreSQL SQLSTATE codes worth retrying.
/// See <https://www.postgresql.org/docs/current/errcodes-appendix.html>.
pub fn should_retry_postgres_code(code: &str) -> bool {
    matches!(
        code,
        // connection_exception, sqlclient_unable_to_establish_sqlconnection,
        // connection_failure, ...
        "08000" | "08001" | "08004" | "08006"
        // invalid_transaction_state family and invalid_transaction_termination
        | "25000" | "25P01" | "25P02" | "25P03" | "2D000"
    )
}

/// SQLite result codes worth retrying: SQLITE_BUSY (5), SQLITE_LOCKED (6)
/// and their extended forms BUSY_RECOVERY (261), BUSY_SNAPSHOT (517),
/// BUSY_TIMEOUT (773), LOCKED_SHAREDCACHE (262), LOCKED_VTAB (518).
pub fn should_retry_sqlite_code(code: &str) -> bool {
    matches!(code, "5" | "261" | "517" | "773" | "6" | "262" | "518")
}

/// True when `err` is a database error whose vendor code is on the allow-list.
pub fn should_retry_database(err: &sqlx::Error) -> bool {
    let Some(db_err) = err.as_database_error() else {
        return false;
    };

    if let Some(pg) = db_err.try_downcast_ref::<PgDatabaseError>() {
        return should_retry_postgres_code(pg.code());
    }
    if db_err.try_downcast_ref::<SqliteError>().is_some() {
        return db_err
            .code()
            .is_some_and(|code| should_retry_sqlite_code(&code));
    }
    false
}
