use crate::model::error::DatabaseResult;
use sqlx::PgPool;

/// Cheap-to-clone handle around the Postgres pool. Connects lazily so the
/// server can boot before the database is reachable.
#[derive(Debug, Clone)]
pub struct DbConnection {
    pool: PgPool,
}

impl DbConnection {
    pub fn connect(connection_str: &str) -> DatabaseResult<Self> {
        let pool = PgPool::connect_lazy(connection_str)?;
        Ok(Self { pool })
    }

    /// Wraps an already-connected pool, e.g. one owned by a test harness.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
