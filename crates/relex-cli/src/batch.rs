//! Batch extraction over a directory of sentence files
//!
//! Every file becomes a task in an acknowledged work queue. One worker runs
//! per parser endpoint; a worker claims a task, extracts every non-empty line
//! as a sentence, persists each relation on its own and then marks the task
//! done. Re-running a batch skips files already done.
//!
//! Workers renew the lease of their task after every sentence. At start, a run
//! only takes back running tasks whose lease has gone stale.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use relex_core::{
    DependencyParser, EntityLinker, ExtractionSettings, RelationStore, RelexError, Result, Task,
    TaskQueue,
};
use relex_extractor::{attach_entity_links, extract_relations};

/// Counters of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub files: usize,
    pub failed_files: usize,
    pub sentences: usize,
    pub relations: usize,
    pub parse_failures: usize,
    pub persistence_failures: usize,
}

impl BatchSummary {
    pub fn merge(&mut self, other: &BatchSummary) {
        self.files += other.files;
        self.failed_files += other.failed_files;
        self.sentences += other.sentences;
        self.relations += other.relations;
        self.parse_failures += other.parse_failures;
        self.persistence_failures += other.persistence_failures;
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} files ({} failed), {} sentences, {} relations, {} parse failures, {} persistence failures",
            self.files,
            self.failed_files,
            self.sentences,
            self.relations,
            self.parse_failures,
            self.persistence_failures
        )
    }
}

fn io_error(path: &Path, source: std::io::Error) -> RelexError {
    RelexError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Collect files under `dir` with `extension`, recursively, in path order
pub async fn collect_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current)
            .await
            .map_err(|e| io_error(&current, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&current, e))?
        {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| io_error(&path, e))?;
            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == extension) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Queue-driven batch runner
pub struct BatchRunner {
    parsers: Vec<Arc<dyn DependencyParser>>,
    queue: Arc<dyn TaskQueue>,
    store: Arc<dyn RelationStore>,
    linker: Option<Arc<dyn EntityLinker>>,
    settings: ExtractionSettings,
    stale_after: Duration,
}

impl BatchRunner {
    pub fn new(
        parsers: Vec<Arc<dyn DependencyParser>>,
        queue: Arc<dyn TaskQueue>,
        store: Arc<dyn RelationStore>,
        settings: ExtractionSettings,
    ) -> Self {
        Self {
            parsers,
            queue,
            store,
            linker: None,
            settings,
            stale_after: Duration::from_secs(600),
        }
    }

    /// Run the entity-linking post-pass before persisting
    pub fn with_linker(mut self, linker: Arc<dyn EntityLinker>) -> Self {
        self.linker = Some(linker);
        self
    }

    /// Idle time after which another run's task is taken back
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Enqueue the files of `dir`; returns how many became pending
    pub async fn enqueue_dir(&self, dir: &Path, extension: &str) -> Result<usize> {
        let mut enqueued = 0;
        for path in collect_files(dir, extension).await? {
            if self.queue.enqueue(&path).await? {
                enqueued += 1;
            }
        }
        tracing::info!(dir = %dir.display(), enqueued, "Enqueued input files");
        Ok(enqueued)
    }

    /// Drain the queue with one worker per parser endpoint.
    ///
    /// A worker stopped by a queue error does not stop the others; the first
    /// such error is returned once every worker has finished.
    pub async fn run(&self) -> Result<BatchSummary> {
        if self.parsers.is_empty() {
            return Err(RelexError::ConfigError(
                "no parser endpoint configured".to_string(),
            ));
        }

        let requeued = self.queue.requeue_stale(self.stale_after).await?;
        if requeued > 0 {
            tracing::warn!(requeued, "Requeued tasks abandoned by an earlier run");
        }

        let workers = self
            .parsers
            .iter()
            .map(|parser| self.worker(parser.as_ref()));

        let mut summary = BatchSummary::default();
        let mut first_error = None;
        for (worker_summary, result) in join_all(workers).await {
            summary.merge(&worker_summary);
            if let Err(e) = result {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => {
                tracing::error!(%summary, error = %e, "Batch stopped");
                Err(e)
            }
            None => {
                tracing::info!(%summary, "Batch finished");
                Ok(summary)
            }
        }
    }

    async fn worker(&self, parser: &dyn DependencyParser) -> (BatchSummary, Result<()>) {
        let name = parser.endpoint().to_string();
        let mut summary = BatchSummary::default();
        let result = self.drain(parser, &name, &mut summary).await;

        match &result {
            Ok(()) => tracing::debug!(endpoint = %name, %summary, "Worker finished"),
            Err(e) => tracing::error!(endpoint = %name, %summary, error = %e, "Worker stopped"),
        }
        (summary, result)
    }

    async fn drain(
        &self,
        parser: &dyn DependencyParser,
        name: &str,
        summary: &mut BatchSummary,
    ) -> Result<()> {
        while let Some(task) = self.queue.claim(name).await? {
            tracing::info!(endpoint = name, file = %task.path.display(), "Processing file");
            if let Err(e) = self.process_task(parser, &task, summary).await {
                // A stopped worker never leaves its task running.
                if let Err(fail_err) = self.queue.fail(task.id, &e.to_string()).await {
                    tracing::warn!(task_id = %task.id, error = %fail_err, "Failed to release task");
                }
                return Err(e);
            }
        }
        Ok(())
    }

    async fn process_task(
        &self,
        parser: &dyn DependencyParser,
        task: &Task,
        summary: &mut BatchSummary,
    ) -> Result<()> {
        let content = match tokio::fs::read_to_string(&task.path).await {
            Ok(content) => content,
            Err(e) => {
                tracing::error!(file = %task.path.display(), error = %e, "Failed to read file");
                summary.failed_files += 1;
                return self.queue.fail(task.id, &e.to_string()).await;
            }
        };

        for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
            summary.sentences += 1;
            self.process_sentence(parser, line, summary).await;
            if let Err(e) = self.queue.heartbeat(task.id).await {
                tracing::warn!(file = %task.path.display(), error = %e, "Failed to renew task lease");
            }
        }

        summary.files += 1;
        self.queue.complete(task.id).await
    }

    async fn process_sentence(
        &self,
        parser: &dyn DependencyParser,
        sentence: &str,
        summary: &mut BatchSummary,
    ) {
        tracing::info!(sentence, "Extracting");

        let mut relations = match extract_relations(sentence, parser, &self.settings).await {
            Ok(relations) => relations,
            Err(e) => {
                tracing::warn!(sentence, error = %e, "Failed to parse sentence");
                summary.parse_failures += 1;
                return;
            }
        };

        if let Some(linker) = &self.linker {
            attach_entity_links(&mut relations, linker.as_ref()).await;
        }

        for relation in &relations {
            tracing::info!(relation = %relation, "Relation");
            match self.store.insert_relation(&relation.to_record(sentence)).await {
                Ok(()) => summary.relations += 1,
                Err(e) => {
                    tracing::error!(relation = %relation, error = %e, "Failed to persist relation");
                    summary.persistence_failures += 1;
                }
            }
        }
    }
}
