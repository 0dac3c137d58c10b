#![allow(dead_code)]

use std::sync::Arc;

use lume_live::auth::Authenticator;
use lume_live::db::{self, DbPool};
use lume_live::store::{SqliteStateStore, StateStore};

/// Fresh in-memory database with migrations applied.
pub fn setup_pool() -> DbPool {
    let pool = db::init_memory_pool();
    db::run_migrations(&pool);
    pool
}

pub fn setup_store() -> (DbPool, Arc<dyn StateStore>) {
    let pool = setup_pool();
    let store: Arc<dyn StateStore> = Arc::new(SqliteStateStore::new(pool.clone()));
    (pool, store)
}

/// Authenticator with a known shared secret and plain presenter password.
pub fn setup_auth(pool: DbPool) -> Authenticator {
    Authenticator::new(
        pool,
        Some("topsecret".to_string()),
        None,
        Some("presenter-pw".to_string()),
    )
}
