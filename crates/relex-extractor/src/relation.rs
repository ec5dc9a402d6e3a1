//! Extracted subject-predicate-object relations

use relex_core::RelationRecord;

use crate::sequence::{Predicate, WordUnitSequence};

/// One extracted relation with optional entity links
#[derive(Debug, Clone)]
pub struct Relation {
    subject: WordUnitSequence,
    predicate: Predicate,
    object: WordUnitSequence,
    subject_el: Option<String>,
    object_el: Option<String>,
}

impl Relation {
    pub fn new(subject: WordUnitSequence, predicate: Predicate, object: WordUnitSequence) -> Self {
        Self {
            subject,
            predicate,
            object,
            subject_el: None,
            object_el: None,
        }
    }

    pub fn subject(&self) -> &WordUnitSequence {
        &self.subject
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn object(&self) -> &WordUnitSequence {
        &self.object
    }

    pub fn subject_el(&self) -> Option<&str> {
        self.subject_el.as_deref()
    }

    pub fn object_el(&self) -> Option<&str> {
        self.object_el.as_deref()
    }

    /// Attach subject links; multiple identifiers are joined by `,`
    pub fn set_subject_el(&mut self, links: Option<Vec<String>>) {
        self.subject_el = links.map(|l| l.join(","));
    }

    pub fn set_object_el(&mut self, links: Option<Vec<String>>) {
        self.object_el = links.map(|l| l.join(","));
    }

    /// Subject, predicate and object lemma strings
    pub fn lemmatized(&self) -> (String, String, String) {
        (
            self.subject.lemma(),
            self.predicate.lemma(),
            self.object.lemma(),
        )
    }

    /// `subject | canonical predicate | object`, the evaluation key
    pub fn canonical_form(&self) -> String {
        format!(
            "{} | {} | {}",
            self.subject.lemma(),
            self.predicate.canonical_form(),
            self.object.lemma()
        )
    }

    /// Flatten into a persistence record for `sentence`
    pub fn to_record(&self, sentence: &str) -> RelationRecord {
        RelationRecord {
            subject_head: self.subject.head_lemma().unwrap_or_default(),
            subject_nn_head: self.subject.nn_head_lemma().unwrap_or_default(),
            subject: self.subject.lemma(),
            subject_el: self.subject_el.clone(),
            predicate: self.predicate.lemma(),
            predicate_canonical: self.predicate.canonical_form(),
            object_head: self.object.head_lemma().unwrap_or_default(),
            object_nn_head: self.object.nn_head_lemma().unwrap_or_default(),
            object: self.object.lemma(),
            object_el: self.object_el.clone(),
            sentence: sentence.to_string(),
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.predicate, self.object)
    }
}
