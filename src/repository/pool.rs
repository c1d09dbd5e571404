//! Async PostgreSQL connection pool. Postgres-only, since spec.md fixes
//! `DATABASE_URL` to a PostgreSQL DSN with `simple`-dictionary full-text
//! search.

use diesel_async::pooled_connection::deadpool::{Object, Pool as DeadPool};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

use super::RepositoryError;

/// A pooled async PostgreSQL connection.
pub type PgConn = Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// Connection pool wrapper, cheap to clone (wraps an `Arc` internally).
#[derive(Clone)]
pub struct DbPool {
    pool: DeadPool<AsyncPgConnection>,
}

impl DbPool {
    /// Build a pool from a `postgres://` or `postgresql://` DSN.
    pub fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let pool = DeadPool::builder(config)
            .max_size(16)
            .build()
            .map_err(|e| RepositoryError::Pool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn get(&self) -> Result<PgConn, RepositoryError> {
        self.pool
            .get()
            .await
            .map_err(|e| RepositoryError::Pool(e.to_string()))
    }
}
