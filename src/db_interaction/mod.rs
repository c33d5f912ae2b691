//! Typed queries against the marketplace tables. Every function runs its
//! diesel work on the blocking pool through [`run_query`].

use std::{error::Error, fmt::Debug};

use diesel::{result::DatabaseErrorKind, PgConnection};
use thiserror::Error;

use crate::{telemetry::spawn_blocking_with_tracing, utils::{error_fmt_chain, DbPool}};

pub mod users;
pub mod addresses;
pub mod vendors;
pub mod categories;
pub mod products;
pub mod orders;
pub mod payments;
pub mod reviews;
pub mod cart;
pub mod wishlist;
pub mod staff;
pub mod audit;
pub mod security;
pub mod dashboard;
pub mod finance;
pub mod subscriptions;

#[derive(Error)]
pub enum QueryError{
    #[error("Failed to get a database connection from the pool")]
    PoolError(#[from] r2d2::Error),
    #[error("Tokio threadpool error occured")]
    ThreadpoolError(#[from] tokio::task::JoinError),
    #[error("Failed to run query")]
    RunQueryError(#[source] diesel::result::Error),
    #[error("Row could not be decoded")]
    MalformedRow(#[source] Box<dyn Error + Send + Sync>),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Invalid(String)
}

impl Debug for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)?;
        error_fmt_chain(f, &self.source())
    }
}

impl From<diesel::result::Error> for QueryError {
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => QueryError::NotFound("record"),
            diesel::result::Error::DeserializationError(inner) => QueryError::MalformedRow(inner),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                QueryError::Conflict(info.message().to_string())
            },
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, ref info) => {
                QueryError::Conflict(info.message().to_string())
            },
            other => QueryError::RunQueryError(other)
        }
    }
}

impl QueryError {
    /// Names the missing entity in the message of a bare diesel `NotFound`
    pub fn or_missing(self, entity: &'static str) -> Self{
        match self {
            QueryError::NotFound(_) => QueryError::NotFound(entity),
            other => other
        }
    }
}

/// Checks a connection out of `pool` and runs `query` with it on the blocking
/// threadpool, keeping the caller's tracing span.
pub async fn run_query<F, T>(pool: &DbPool, query: F) -> Result<T, QueryError>
where
    F: FnOnce(&mut PgConnection) -> Result<T, QueryError> + Send + 'static,
    T: Send + 'static
{
    let pool = pool.clone();
    spawn_blocking_with_tracing(move || {
        let mut conn = pool.get()?;
        query(&mut conn)
    })
    .await?
}

/// Escapes `%`, `_` and `\` so user input can be embedded in an ILIKE pattern
pub fn like_pattern(search: &str) -> String{
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards(){
        assert_eq!(like_pattern(" shoes "), "%shoes%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn diesel_not_found_maps_to_not_found(){
        let err = QueryError::from(diesel::result::Error::NotFound).or_missing("vendor");
        assert!(matches!(err, QueryError::NotFound("vendor")));
        assert_eq!(err.to_string(), "vendor not found");
    }

    #[test]
    fn decoding_failures_are_reported_as_malformed_rows(){
        let err = QueryError::from(diesel::result::Error::DeserializationError("bad status".into()));
        assert!(matches!(err, QueryError::MalformedRow(_)));
    }
}
