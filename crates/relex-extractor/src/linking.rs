//! Entity linking post-pass
//!
//! Each relation's subject and object are looked up by an external linking
//! service. The query is the phrase head lemma followed by the remaining
//! lemmas of the phrase; returned identifiers are joined with `,`. A failed
//! lookup leaves the link empty and never drops the relation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use relex_core::{EntityLinker, LinkingConfig, RelexError, Result};

use crate::relation::Relation;
use crate::sequence::WordUnitSequence;

#[derive(Debug, Deserialize)]
struct LinkingResponse {
    #[serde(default)]
    results: Vec<LinkingResult>,
}

#[derive(Debug, Deserialize)]
struct LinkingResult {
    #[serde(default)]
    annotations: Vec<Annotation>,
}

#[derive(Debug, Deserialize)]
struct Annotation {
    url: String,
}

/// HTTP client for the entity-linking service
pub struct HttpEntityLinker {
    client: Client,
    api_url: String,
    no_match_sentinel: String,
}

impl HttpEntityLinker {
    /// `api_url` is a prefix; the comma-joined query terms are appended to it
    pub fn new(
        api_url: impl Into<String>,
        no_match_sentinel: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelexError::ConfigError(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            no_match_sentinel: no_match_sentinel.into(),
        })
    }

    pub fn from_config(config: &LinkingConfig) -> Result<Self> {
        Self::new(
            config.api_url.clone(),
            config.no_match_sentinel.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl EntityLinker for HttpEntityLinker {
    async fn link(&self, terms: &[String]) -> Result<Option<Vec<String>>> {
        let url = format!("{}{}", self.api_url, terms.join(","));

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RelexError::LinkingFailure(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(RelexError::LinkingFailure(format!(
                "Linking service returned {}",
                response.status()
            )));
        }

        let body: LinkingResponse = response
            .json()
            .await
            .map_err(|e| RelexError::LinkingFailure(format!("Failed to parse response: {e}")))?;

        let Some(first) = body.results.into_iter().next() else {
            return Ok(None);
        };
        let no_match = first
            .annotations
            .first()
            .map_or(true, |a| a.url == self.no_match_sentinel);
        if no_match {
            return Ok(None);
        }
        Ok(Some(first.annotations.into_iter().map(|a| a.url).collect()))
    }
}

/// Query terms for a phrase: head lemma first, then the other lemmas in
/// sentence order. `None` for a phrase without head.
pub fn linking_query(phrase: &WordUnitSequence) -> Option<Vec<String>> {
    let head = phrase.head()?;
    let mut terms = vec![head.lemma()];
    terms.extend(
        phrase
            .units()
            .iter()
            .filter(|u| u.index() != head.index())
            .map(|u| u.lemma()),
    );
    Some(terms)
}

async fn resolve(linker: &dyn EntityLinker, phrase: &WordUnitSequence) -> Option<Vec<String>> {
    let terms = linking_query(phrase)?;
    match linker.link(&terms).await {
        Ok(links) => links,
        Err(e) => {
            tracing::warn!(query = %terms.join(","), error = %e, "Entity linking failed");
            None
        }
    }
}

/// Attach subject and object links to every relation in place
pub async fn attach_entity_links(relations: &mut [Relation], linker: &dyn EntityLinker) {
    for relation in relations.iter_mut() {
        let subject_el = resolve(linker, relation.subject()).await;
        relation.set_subject_el(subject_el);

        let object_el = resolve(linker, relation.object()).await;
        relation.set_object_el(object_el);
    }
}
