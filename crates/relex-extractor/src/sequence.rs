//! Phrase containers built during extraction
//!
//! A `WordUnitSequence` is always kept in sentence order: every mutation
//! re-sorts its members by token index, so rendering never depends on the
//! order in which the rules expanded the phrase.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use relex_core::WordUnit;

/// Ordered phrase with a syntactic anchor
#[derive(Debug, Clone, Default)]
pub struct WordUnitSequence {
    units: Vec<Arc<WordUnit>>,
    head: Option<Arc<WordUnit>>,
    nn_head: Option<Box<WordUnitSequence>>,
}

impl WordUnitSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-token phrase anchored on `unit`
    pub fn with_head(unit: Arc<WordUnit>) -> Self {
        Self {
            units: vec![Arc::clone(&unit)],
            head: Some(unit),
            nn_head: None,
        }
    }

    pub fn from_units(units: Vec<Arc<WordUnit>>, head: Option<Arc<WordUnit>>) -> Self {
        let mut seq = Self {
            units,
            head,
            nn_head: None,
        };
        seq.sort();
        seq
    }

    /// Append all members of `other`; the anchor of `self` is kept
    pub fn extend(&mut self, other: &WordUnitSequence) {
        self.extend_units(other.units.iter().cloned());
    }

    pub fn extend_units<I>(&mut self, units: I)
    where
        I: IntoIterator<Item = Arc<WordUnit>>,
    {
        let before = self.units.len();
        self.units
            .extend(units.into_iter().filter(|unit| !unit.is_empty()));
        if self.units.len() != before {
            self.sort();
        }
    }

    pub fn add_word_unit(&mut self, unit: Arc<WordUnit>) {
        self.extend_units(std::iter::once(unit));
    }

    pub fn contains(&self, unit: &WordUnit) -> bool {
        self.units.iter().any(|u| **u == *unit)
    }

    fn sort(&mut self) {
        // Stable, so duplicates keep their insertion order.
        self.units.sort_by_key(|u| u.index());
    }

    pub fn units(&self) -> &[Arc<WordUnit>] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn head(&self) -> Option<&Arc<WordUnit>> {
        self.head.as_ref()
    }

    pub fn set_head(&mut self, head: Option<Arc<WordUnit>>) {
        self.head = head;
    }

    /// Noun-compound phrase around the head, when one was recognized
    pub fn nn_head(&self) -> Option<&WordUnitSequence> {
        self.nn_head.as_deref()
    }

    pub fn set_nn_head(&mut self, nn_head: WordUnitSequence) {
        self.nn_head = Some(Box::new(nn_head));
    }

    /// Member lemmas joined by a space, in sentence order
    pub fn lemma(&self) -> String {
        self.units
            .iter()
            .map(|u| u.lemma())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Surface words joined by a space, in sentence order
    pub fn words(&self) -> String {
        self.units
            .iter()
            .map(|u| u.word())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn head_lemma(&self) -> Option<String> {
        self.head.as_ref().map(|h| h.lemma())
    }

    /// Lemma of the noun-compound head, or of the plain head without one
    pub fn nn_head_lemma(&self) -> Option<String> {
        match &self.nn_head {
            Some(nn_head) => Some(nn_head.lemma()),
            None => self.head_lemma(),
        }
    }
}

impl std::fmt::Display for WordUnitSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.words())
    }
}

/// Predicate phrase with its auxiliaries and negations tracked separately
#[derive(Debug, Clone, Default)]
pub struct Predicate {
    sequence: WordUnitSequence,
    negation: Vec<Arc<WordUnit>>,
    auxiliary: Vec<Arc<WordUnit>>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_head(unit: Arc<WordUnit>) -> Self {
        Self {
            sequence: WordUnitSequence::with_head(unit),
            ..Self::default()
        }
    }

    pub fn sequence(&self) -> &WordUnitSequence {
        &self.sequence
    }

    pub fn into_sequence(self) -> WordUnitSequence {
        self.sequence
    }

    pub fn negation(&self) -> &[Arc<WordUnit>] {
        &self.negation
    }

    pub fn auxiliary(&self) -> &[Arc<WordUnit>] {
        &self.auxiliary
    }

    pub fn add_auxiliary(&mut self, unit: Arc<WordUnit>) {
        if !self.auxiliary.contains(&unit) {
            self.auxiliary.push(Arc::clone(&unit));
        }
        if !self.sequence.contains(&unit) {
            self.sequence.add_word_unit(unit);
        }
    }

    pub fn add_negation(&mut self, unit: Arc<WordUnit>) {
        if !self.negation.contains(&unit) {
            self.negation.push(Arc::clone(&unit));
        }
        if !self.sequence.contains(&unit) {
            self.sequence.add_word_unit(unit);
        }
    }

    /// Fold `other` into this predicate, skipping tokens already present
    pub fn merge(&mut self, other: &Predicate) {
        let fresh: Vec<_> = other
            .sequence
            .units()
            .iter()
            .filter(|u| !self.sequence.contains(u))
            .cloned()
            .collect();
        self.sequence.extend_units(fresh);

        for unit in &other.negation {
            if !self.negation.contains(unit) {
                self.negation.push(Arc::clone(unit));
            }
        }
        for unit in &other.auxiliary {
            if !self.auxiliary.contains(unit) {
                self.auxiliary.push(Arc::clone(unit));
            }
        }
    }

    /// Auxiliary- and negation-normalized lemma string.
    ///
    /// "is not found" and "was not found" both render as `not find`; a
    /// predicate made only of auxiliaries keeps them ("is" renders as `be`).
    pub fn canonical_form(&self) -> String {
        let is_aux = |u: &Arc<WordUnit>| self.auxiliary.contains(u);
        let is_neg = |u: &Arc<WordUnit>| self.negation.contains(u);

        let mut content: Vec<String> = self
            .sequence
            .units()
            .iter()
            .filter(|&u| !is_aux(u) && !is_neg(u))
            .map(|u| u.lemma())
            .collect();

        if content.is_empty() {
            content = self
                .sequence
                .units()
                .iter()
                .filter(|&u| is_aux(u))
                .map(|u| u.lemma())
                .collect();
        }

        if !self.negation.is_empty() {
            content.insert(0, "not".to_string());
        }
        content.join(" ")
    }
}

impl Deref for Predicate {
    type Target = WordUnitSequence;

    fn deref(&self) -> &Self::Target {
        &self.sequence
    }
}

impl DerefMut for Predicate {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sequence
    }
}

impl std::fmt::Display for Predicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.sequence, f)
    }
}
