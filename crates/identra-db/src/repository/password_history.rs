//! SurrealDB implementation of [`PasswordHistoryRepository`].
//!
//! `list_for_user` returns rows newest first, with the record id as a
//! tiebreak so the ordering is total even for identical timestamps.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use identra_core::error::IdentraResult;
use identra_core::models::password_history::{PasswordHistoryEntry, RecordPasswordHistory};
use identra_core::repository::PasswordHistoryRepository;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct HistoryRow {
    user_id: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct HistoryRowWithId {
    record_id: String,
    user_id: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

impl HistoryRow {
    fn into_entry(self, id: Uuid) -> Result<PasswordHistoryEntry, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(PasswordHistoryEntry {
            id,
            user_id,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

impl HistoryRowWithId {
    fn try_into_entry(self) -> Result<PasswordHistoryEntry, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Decode(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Decode(format!("invalid user UUID: {e}")))?;
        Ok(PasswordHistoryEntry {
            id,
            user_id,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the password-history repository.
pub struct SurrealPasswordHistoryRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> Clone for SurrealPasswordHistoryRepository<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
        }
    }
}

impl<C: Connection> SurrealPasswordHistoryRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PasswordHistoryRepository for SurrealPasswordHistoryRepository<C> {
    async fn insert(&self, input: RecordPasswordHistory) -> IdentraResult<PasswordHistoryEntry> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('password_history', $id) SET \
                 user_id = $user_id, \
                 password_hash = $password_hash",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("password_hash", input.password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Decode(e.to_string()))?;

        let rows: Vec<HistoryRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "password_history".into(),
            id: id_str,
        })?;

        Ok(row.into_entry(id)?)
    }

    async fn list_for_user(&self, user_id: Uuid) -> IdentraResult<Vec<PasswordHistoryEntry>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM password_history \
                 WHERE user_id = $user_id \
                 ORDER BY created_at DESC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<HistoryRowWithId> = result.take(0).map_err(DbError::from)?;

        let mut entries = rows
            .into_iter()
            .map(|row| row.try_into_entry())
            .collect::<Result<Vec<_>, DbError>>()?;

        // Record id as tiebreak for identical timestamps: a total order.
        entries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(entries)
    }

    async fn delete_entries(&self, user_id: Uuid, ids: &[Uuid]) -> IdentraResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let user_id_str = user_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM password_history \
                 WHERE user_id = $user_id AND meta::id(id) IN $ids GROUP ALL",
            )
            .bind(("user_id", user_id_str.clone()))
            .bind(("ids", id_strings.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(
                "DELETE password_history \
                 WHERE user_id = $user_id AND meta::id(id) IN $ids",
            )
            .bind(("user_id", user_id_str))
            .bind(("ids", id_strings))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }

    async fn delete_for_user(&self, user_id: Uuid) -> IdentraResult<u64> {
        let user_id_str = user_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM password_history \
                 WHERE user_id = $user_id GROUP ALL",
            )
            .bind(("user_id", user_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE password_history WHERE user_id = $user_id")
            .bind(("user_id", user_id_str))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
