//! Relex Parser - Dependency graphs for single sentences
//!
//! A `DependencyGraph` is built once from one parser response: an indexed
//! token table and the labeled head -> dependent triples over it. It is
//! read-only after construction and discarded after one extraction pass.
//!
//! The external parser is reached through the `DependencyParser` trait;
//! `CoreNlpClient` implements it for a JSON-RPC parser service.

pub mod client;

pub use client::{decode_parse_response, CoreNlpClient};

use std::collections::HashMap;
use std::sync::Arc;

use relex_core::{DependencyParser, ParsedSentence, RelexError, Result, WordUnit};

/// Label of the artificial edge from the virtual root
const ROOT_LABEL: &str = "root";

/// One labeled edge of the parse
#[derive(Debug, Clone)]
pub struct DependencyTriple {
    pub head: Arc<WordUnit>,
    pub relation: String,
    pub dependent: Arc<WordUnit>,
}

impl std::fmt::Display for DependencyTriple {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.head.more_info(),
            self.relation,
            self.dependent.more_info()
        )
    }
}

/// Parsed form of one sentence
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    sentence: String,
    tokens: Vec<Arc<WordUnit>>,
    triples: Vec<DependencyTriple>,
}

impl DependencyGraph {
    /// Parse `sentence` with the external parser and build its graph.
    ///
    /// Any failure of the remote call surfaces as `ParseFailure`; retries are
    /// left to the caller.
    pub async fn parse(sentence: &str, parser: &dyn DependencyParser) -> Result<Self> {
        if sentence.trim().is_empty() {
            return Err(RelexError::ParseFailure("empty sentence".to_string()));
        }

        let parsed = parser.parse(sentence).await?;
        Self::from_parsed(sentence, parsed)
    }

    /// Build the graph from an already decoded parser response
    pub fn from_parsed(sentence: impl Into<String>, parsed: ParsedSentence) -> Result<Self> {
        let mut tokens: Vec<Arc<WordUnit>> = parsed
            .tokens
            .into_iter()
            .map(|t| Arc::new(WordUnit::new(t.index, t.word, t.lemma, t.pos)))
            .collect();
        tokens.sort_by_key(|t| t.index());

        let mut by_index: HashMap<usize, Arc<WordUnit>> = HashMap::with_capacity(tokens.len());
        for token in &tokens {
            if token.index() == 0 {
                return Err(RelexError::ParseFailure(
                    "token index 0 is reserved for the root".to_string(),
                ));
            }
            if by_index.insert(token.index(), Arc::clone(token)).is_some() {
                return Err(RelexError::ParseFailure(format!(
                    "duplicate token index {}",
                    token.index()
                )));
            }
        }

        let resolve = |index: usize| {
            by_index.get(&index).cloned().ok_or_else(|| {
                RelexError::ParseFailure(format!("dependency refers to unknown token {index}"))
            })
        };

        let mut triples = Vec::with_capacity(parsed.dependencies.len());
        for dep in parsed.dependencies {
            if dep.head_index == 0 || dep.relation == ROOT_LABEL {
                continue;
            }
            triples.push(DependencyTriple {
                head: resolve(dep.head_index)?,
                relation: dep.relation,
                dependent: resolve(dep.dependent_index)?,
            });
        }

        Ok(Self {
            sentence: sentence.into(),
            tokens,
            triples,
        })
    }

    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    /// Tokens in index order
    pub fn tokens(&self) -> &[Arc<WordUnit>] {
        &self.tokens
    }

    /// Token at a 1-based position
    pub fn token(&self, index: usize) -> Option<&Arc<WordUnit>> {
        self.tokens
            .binary_search_by_key(&index, |t| t.index())
            .ok()
            .map(|i| &self.tokens[i])
    }

    /// Labeled edges, root edge excluded, in parser order
    pub fn dep_triples(&self) -> &[DependencyTriple] {
        &self.triples
    }

    pub fn words(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.word()).collect()
    }

    pub fn lemmas(&self) -> Vec<String> {
        self.tokens.iter().map(|t| t.lemma()).collect()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.tokens.iter().map(|t| t.pos()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Dump the triples at debug level
    pub fn log_dep_triples(&self) {
        for triple in &self.triples {
            tracing::debug!("{}", triple);
        }
    }
}
