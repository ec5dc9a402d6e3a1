//! File work queue with acknowledgement
//!
//! Each input file becomes one task. Workers claim pending tasks, and a task
//! is marked `done` only after every sentence of its file was processed, so an
//! interrupted run picks up unfinished files again (at-least-once).
//!
//! A running task holds a lease renewed by [`TaskQueue::heartbeat`]. Only tasks
//! whose lease went quiet are handed back to pending, so a second batch process
//! on the same queue leaves files in progress alone.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::store::check_identifier;
use crate::{RelexError, Result};

/// Lifecycle of a file task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = RelexError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(RelexError::QueueError(format!("Unknown task status: {other}"))),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One input file to process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub path: PathBuf,
    pub status: TaskStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    /// Time of the last status transition
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            status: TaskStatus::Pending,
            attempts: 0,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    fn transition(&mut self, status: TaskStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

/// Trait for task queues
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Register a file. Returns false when the file is already pending,
    /// running or done. Failed files are put back to pending.
    async fn enqueue(&self, path: &Path) -> Result<bool>;

    /// Claim the oldest pending task for `worker`
    async fn claim(&self, worker: &str) -> Result<Option<Task>>;

    /// Acknowledge a fully processed task
    async fn complete(&self, task_id: Uuid) -> Result<()>;

    /// Record a task that could not be processed
    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()>;

    /// Renew the lease of a running task
    async fn heartbeat(&self, task_id: Uuid) -> Result<()>;

    /// Return running tasks without a heartbeat for `idle_for` to pending
    async fn requeue_stale(&self, idle_for: Duration) -> Result<u64>;
}

// ============================================================================
// PostgreSQL queue
// ============================================================================

/// PostgreSQL-backed task queue
pub struct PgTaskQueue {
    pool: PgPool,
    table: String,
}

#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    path: String,
    status: String,
    attempts: i32,
    last_error: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = RelexError;

    fn try_from(row: TaskRow) -> Result<Self> {
        Ok(Task {
            id: row.id,
            path: PathBuf::from(row.path),
            status: row.status.parse()?,
            attempts: row.attempts.max(0) as u32,
            last_error: row.last_error,
            updated_at: row.updated_at,
        })
    }
}

fn queue_error(context: &str, err: sqlx::Error) -> RelexError {
    RelexError::QueueError(format!("{context}: {err}"))
}

impl PgTaskQueue {
    /// Create a new queue connection
    pub async fn new(database_url: &str, pool_size: u32, table: &str) -> Result<Self> {
        check_identifier(table)?;
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(database_url)
            .await
            .map_err(|e| queue_error("PostgreSQL connection failed", e))?;

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

    /// Create the task table if it does not exist
    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id UUID PRIMARY KEY,
                path TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'pending',
                worker TEXT,
                attempts INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to create task table", e))?;

        Ok(())
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn enqueue(&self, path: &Path) -> Result<bool> {
        let sql = format!(
            r#"
            INSERT INTO {t} (id, path, status)
            VALUES ($1, $2, 'pending')
            ON CONFLICT (path) DO UPDATE
                SET status = 'pending', updated_at = NOW()
                WHERE {t}.status = 'failed'
            RETURNING id
            "#,
            t = self.table
        );

        let row: Option<(Uuid,)> = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(path.to_string_lossy().as_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to enqueue task", e))?;

        Ok(row.is_some())
    }

    async fn claim(&self, worker: &str) -> Result<Option<Task>> {
        let sql = format!(
            r#"
            UPDATE {t} SET
                status = 'running',
                worker = $1,
                attempts = attempts + 1,
                updated_at = NOW()
            WHERE id = (
                SELECT id FROM {t}
                WHERE status = 'pending'
                ORDER BY created_at, path
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, path, status, attempts, last_error, updated_at
            "#,
            t = self.table
        );

        let row: Option<TaskRow> = sqlx::query_as(&sql)
            .bind(worker)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to claim task", e))?;

        let task = row.map(Task::try_from).transpose()?;
        if let Some(task) = &task {
            tracing::debug!(worker, task_id = %task.id, path = %task.path.display(), "Claimed task");
        }
        Ok(task)
    }

    async fn complete(&self, task_id: Uuid) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET status = 'done', last_error = NULL, updated_at = NOW() WHERE id = $1",
            self.table
        );

        sqlx::query(&sql)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to complete task", e))?;

        Ok(())
    }

    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET status = 'failed', last_error = $2, updated_at = NOW() WHERE id = $1",
            self.table
        );

        sqlx::query(&sql)
            .bind(task_id)
            .bind(error)
            .execute(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to record task failure", e))?;

        Ok(())
    }

    async fn heartbeat(&self, task_id: Uuid) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET updated_at = NOW() WHERE id = $1 AND status = 'running'",
            self.table
        );

        sqlx::query(&sql)
            .bind(task_id)
            .execute(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to renew task lease", e))?;

        Ok(())
    }

    async fn requeue_stale(&self, idle_for: Duration) -> Result<u64> {
        let sql = format!(
            r#"
            UPDATE {} SET status = 'pending', updated_at = NOW()
            WHERE status = 'running' AND updated_at < NOW() - make_interval(secs => $1)
            "#,
            self.table
        );

        let result = sqlx::query(&sql)
            .bind(idle_for.as_secs_f64())
            .execute(&self.pool)
            .await
            .map_err(|e| queue_error("Failed to requeue stale tasks", e))?;

        tracing::debug!(requeued = result.rows_affected(), "Requeued stale tasks");
        Ok(result.rows_affected())
    }
}

// ============================================================================
// In-memory queue
// ============================================================================

/// In-memory task queue for dry runs and tests
#[derive(Default)]
pub struct MemoryTaskQueue {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all tasks in enqueue order
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    async fn update(&self, task_id: Uuid, f: impl FnOnce(&mut Task) + Send) -> Result<()> {
        let mut tasks = self.tasks.lock().await;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| RelexError::QueueError(format!("Unknown task: {task_id}")))?;
        f(task);
        Ok(())
    }
}

#[async_trait]
impl TaskQueue for MemoryTaskQueue {
    async fn enqueue(&self, path: &Path) -> Result<bool> {
        let mut tasks = self.tasks.lock().await;
        match tasks.iter_mut().find(|t| t.path == path) {
            Some(task) if task.status == TaskStatus::Failed => {
                task.transition(TaskStatus::Pending);
                Ok(true)
            }
            Some(_) => Ok(false),
            None => {
                tasks.push(Task::new(path));
                Ok(true)
            }
        }
    }

    async fn claim(&self, worker: &str) -> Result<Option<Task>> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.iter_mut().find(|t| t.status == TaskStatus::Pending) else {
            return Ok(None);
        };
        task.transition(TaskStatus::Running);
        task.attempts += 1;
        tracing::debug!(worker, task_id = %task.id, path = %task.path.display(), "Claimed task");
        Ok(Some(task.clone()))
    }

    async fn complete(&self, task_id: Uuid) -> Result<()> {
        self.update(task_id, |task| {
            task.transition(TaskStatus::Done);
            task.last_error = None;
        })
        .await
    }

    async fn fail(&self, task_id: Uuid, error: &str) -> Result<()> {
        let error = error.to_string();
        self.update(task_id, move |task| {
            task.transition(TaskStatus::Failed);
            task.last_error = Some(error);
        })
        .await
    }

    async fn heartbeat(&self, task_id: Uuid) -> Result<()> {
        self.update(task_id, |task| {
            if task.status == TaskStatus::Running {
                task.updated_at = Utc::now();
            }
        })
        .await
    }

    async fn requeue_stale(&self, idle_for: Duration) -> Result<u64> {
        let now = Utc::now();
        let mut tasks = self.tasks.lock().await;
        let mut count = 0;
        for task in tasks.iter_mut().filter(|t| t.status == TaskStatus::Running) {
            let idle = now.signed_duration_since(task.updated_at).to_std();
            if matches!(idle, Ok(idle) if idle >= idle_for) {
                task.transition(TaskStatus::Pending);
                count += 1;
            }
        }
        Ok(count)
    }
}
