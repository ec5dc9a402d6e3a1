//! Relex Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout the relex system:
//! - Token identity (`WordUnit`) shared by graphs, phrases and relations
//! - Wire types returned by the external dependency parser
//! - Common error types
//! - Collaborator traits for the parser and entity-linking services
//! - Configuration management
//! - Relation persistence and the file work queue (PostgreSQL)

pub mod config;
pub mod queue;
pub mod store;

pub use config::{
    AppConfig, BatchConfig, ConfigError, DatabaseConfig, ExtractionSettings, LinkingConfig,
    LoggingConfig, ParserConfig,
};
pub use queue::{MemoryTaskQueue, PgTaskQueue, Task, TaskQueue, TaskStatus};
pub use store::{MemoryRelationStore, PgRelationStore, RelationRecord, RelationStore};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for relex operations
#[derive(Error, Debug)]
pub enum RelexError {
    /// The dependency parser was unreachable or returned unusable data
    #[error("Parse failure: {0}")]
    ParseFailure(String),

    /// The entity-linking call failed or returned a non-success status
    #[error("Linking failure: {0}")]
    LinkingFailure(String),

    /// A single insert or commit failed
    #[error("Persistence failure [{}]: {message}", code.as_deref().unwrap_or("-"))]
    PersistenceFailure {
        code: Option<String>,
        message: String,
    },

    #[error("Queue error: {0}")]
    QueueError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RelexError {
    /// Build a persistence failure from a database error, keeping its code
    pub fn persistence(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|c| c.into_owned());
        Self::PersistenceFailure {
            code,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelexError>;

// ============================================================================
// Tokens
// ============================================================================

/// One token of a parsed sentence.
///
/// Equality and hashing use the 1-based `index` only: two units taken from the
/// same parse at the same position are the same unit even when their surface
/// text differs after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordUnit {
    index: usize,
    word: String,
    lemma: String,
    pos: String,
}

impl WordUnit {
    pub fn new(
        index: usize,
        word: impl Into<String>,
        lemma: impl Into<String>,
        pos: impl Into<String>,
    ) -> Self {
        Self {
            index,
            word: word.into(),
            lemma: lemma.into(),
            pos: pos.into(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    /// Lower-cased lemma
    pub fn lemma(&self) -> String {
        self.lemma.to_lowercase()
    }

    pub fn pos(&self) -> &str {
        &self.pos
    }

    /// Surface length in characters
    pub fn len(&self) -> usize {
        self.word.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.word.is_empty()
    }

    /// True when the surface form is non-empty and purely alphabetic
    pub fn is_alphabetic(&self) -> bool {
        !self.word.is_empty() && self.word.chars().all(char::is_alphabetic)
    }

    /// Debug rendering: `(index word pos)`
    pub fn more_info(&self) -> String {
        format!("({} {} {})", self.index, self.word, self.pos)
    }
}

impl PartialEq for WordUnit {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for WordUnit {}

impl std::hash::Hash for WordUnit {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl std::fmt::Display for WordUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.word)
    }
}

// ============================================================================
// Parser wire types
// ============================================================================

/// A token as reported by the parser service (1-based index)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedToken {
    pub index: usize,
    pub word: String,
    pub lemma: String,
    pub pos: String,
}

/// A typed dependency edge as reported by the parser service.
///
/// `head_index` is 0 for the root edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDependency {
    pub relation: String,
    pub head_index: usize,
    pub dependent_index: usize,
}

/// The first parsed sentence of a parser response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedSentence {
    pub tokens: Vec<ParsedToken>,
    pub dependencies: Vec<ParsedDependency>,
}

impl ParsedSentence {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for external dependency parsers
#[async_trait::async_trait]
pub trait DependencyParser: Send + Sync {
    /// Parse one sentence; a response without any sentence yields an empty parse
    async fn parse(&self, sentence: &str) -> Result<ParsedSentence>;

    /// Endpoint name for logging
    fn endpoint(&self) -> &str;
}

/// Trait for external entity linkers
#[async_trait::async_trait]
pub trait EntityLinker: Send + Sync {
    /// Resolve query terms to canonical identifiers; `None` when nothing matched
    async fn link(&self, terms: &[String]) -> Result<Option<Vec<String>>>;
}

// ============================================================================
// Tests
// ============================================================================
