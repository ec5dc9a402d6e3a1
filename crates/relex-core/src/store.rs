//! Relation persistence
//!
//! Stores flat relation records in PostgreSQL using SQLx. Every record is
//! written in its own transaction so a failing insert never affects the
//! records written before or after it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::Mutex;

use crate::{RelexError, Result};

/// Flat persistence form of one extracted relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub subject_head: String,
    pub subject_nn_head: String,
    pub subject: String,
    pub subject_el: Option<String>,
    pub predicate: String,
    pub predicate_canonical: String,
    pub object_head: String,
    pub object_nn_head: String,
    pub object: String,
    pub object_el: Option<String>,
    pub sentence: String,
}

/// Trait for relation sinks
#[async_trait]
pub trait RelationStore: Send + Sync {
    /// Insert and commit a single record
    async fn insert_relation(&self, record: &RelationRecord) -> Result<()>;
}

/// Table names are interpolated into SQL, so only plain identifiers pass
pub(crate) fn check_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RelexError::ConfigError(format!(
            "Invalid table name: {name:?}"
        )))
    }
}

/// PostgreSQL relation store
pub struct PgRelationStore {
    pool: PgPool,
    table: String,
}

impl PgRelationStore {
    /// Create a new store connection
    pub async fn new(database_url: &str, pool_size: u32, table: &str) -> Result<Self> {
        check_identifier(table)?;
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(RelexError::persistence)?;

        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool, table: &str) -> Result<Self> {
        check_identifier(table)?;
        Ok(Self {
            pool,
            table: table.to_string(),
        })
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the relation table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                subject_head TEXT NOT NULL,
                subject_nn_head TEXT NOT NULL,
                subject TEXT NOT NULL,
                subject_el TEXT,
                predicate TEXT NOT NULL,
                predicate_canonical TEXT NOT NULL,
                object_head TEXT NOT NULL,
                object_nn_head TEXT NOT NULL,
                object TEXT NOT NULL,
                object_el TEXT,
                sentence TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(RelexError::persistence)?;

        Ok(())
    }
}

#[async_trait]
impl RelationStore for PgRelationStore {
    async fn insert_relation(&self, record: &RelationRecord) -> Result<()> {
        let sql = format!(
            r#"
            INSERT INTO {} (
                subject_head, subject_nn_head, subject, subject_el,
                predicate, predicate_canonical,
                object_head, object_nn_head, object, object_el,
                sentence
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            self.table
        );

        let mut tx = self.pool.begin().await.map_err(RelexError::persistence)?;

        let inserted = sqlx::query(&sql)
            .bind(&record.subject_head)
            .bind(&record.subject_nn_head)
            .bind(&record.subject)
            .bind(&record.subject_el)
            .bind(&record.predicate)
            .bind(&record.predicate_canonical)
            .bind(&record.object_head)
            .bind(&record.object_nn_head)
            .bind(&record.object)
            .bind(&record.object_el)
            .bind(&record.sentence)
            .execute(&mut *tx)
            .await;

        if let Err(e) = inserted {
            // The insert error is reported, not the rollback error.
            let _ = tx.rollback().await;
            return Err(RelexError::persistence(e));
        }

        tx.commit().await.map_err(RelexError::persistence)
    }
}

/// In-memory relation store for dry runs and tests
#[derive(Default)]
pub struct MemoryRelationStore {
    records: Mutex<Vec<RelationRecord>>,
}

impl MemoryRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records in insertion order
    pub async fn records(&self) -> Vec<RelationRecord> {
        self.records.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl RelationStore for MemoryRelationStore {
    async fn insert_relation(&self, record: &RelationRecord) -> Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}
