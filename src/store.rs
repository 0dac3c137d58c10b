use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use crate::db::DbPool;
use crate::errors::AppError;
use crate::events::SlideState;

/// Durable deck → slide-index store. Swappable so the polling bus and the
/// control path never depend on the backing technology.
pub trait StateStore: Send + Sync {
    fn get(&self, deck_id: &str) -> Result<Option<SlideState>, AppError>;
    fn set(&self, deck_id: &str, slide_index: u32) -> Result<(), AppError>;
}

pub struct SqliteStateStore {
    pool: DbPool,
}

impl SqliteStateStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl StateStore for SqliteStateStore {
    fn get(&self, deck_id: &str) -> Result<Option<SlideState>, AppError> {
        let conn = self.pool.get()?;
        let slide_index: Option<u32> = conn
            .query_row(
                "SELECT slide_index FROM slide_state WHERE deck_id = ?1",
                params![deck_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(slide_index.map(|slide_index| SlideState {
            deck_id: deck_id.to_string(),
            slide_index,
        }))
    }

    fn set(&self, deck_id: &str, slide_index: u32) -> Result<(), AppError> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO slide_state (deck_id, slide_index, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (deck_id) DO UPDATE SET
                 slide_index = excluded.slide_index,
                 updated_at = excluded.updated_at",
            params![deck_id, slide_index, Utc::now().timestamp()],
        )?;
        Ok(())
    }
}
