//! Rule-based relation extraction over one dependency graph
//!
//! Extraction starts from every subject edge of the sentence:
//!
//! - active subjects (`nsubj`) pair the expanded subject with each
//!   predicate/object candidate of the governing verb, or with the copula of
//!   a nominal or adjectival predicate
//! - passive subjects (`nsubjpass`) produce either an agent relation
//!   (`X is reviewed by Y` gives `Y | be review by | X`) or a bare
//!   `subject | auxiliary | participle` relation
//!
//! Phrase expansion follows noun compounds, numbers, determiner negation,
//! nearby prepositional phrases and verbal modifiers recursively. Conjunctions
//! fan out subjects, predicate heads and objects.

use std::collections::HashMap;
use std::sync::Arc;

use relex_core::{ExtractionSettings, WordUnit};
use relex_parser::DependencyGraph;

use crate::labels::{
    Label, PosClass, AGENT_PREPOSITION, NEGATION_DETERMINER_TAG, RELATIVE_DETERMINER_TAG,
    SUBJECT_POS_BLACKLIST,
};
use crate::relation::Relation;
use crate::sequence::{Predicate, WordUnitSequence};

/// Whitelisted edge of the graph
#[derive(Debug, Clone)]
struct Edge {
    head: Arc<WordUnit>,
    dependent: Arc<WordUnit>,
}

/// Preposition and the phrase it introduces
#[derive(Debug, Clone)]
pub struct PrepPhrase {
    pub preposition: Arc<WordUnit>,
    pub object: WordUnitSequence,
}

impl PrepPhrase {
    /// Preposition and object as one phrase, anchored on the object head
    pub fn to_sequence(&self) -> WordUnitSequence {
        let mut seq = self.object.clone();
        seq.add_word_unit(Arc::clone(&self.preposition));
        seq
    }
}

/// Predicate candidate with its object, if one was found
pub type PredicateObject = (Predicate, Option<WordUnitSequence>);

/// Relation extractor for a single sentence
pub struct RelationExtractor {
    settings: ExtractionSettings,
    index: HashMap<Label, Vec<Edge>>,
}

impl RelationExtractor {
    /// Index the whitelisted edges of `graph` by label
    pub fn new(graph: &DependencyGraph, settings: ExtractionSettings) -> Self {
        let mut index: HashMap<Label, Vec<Edge>> = HashMap::new();
        for triple in graph.dep_triples() {
            let Some(label) = Label::from_label(&triple.relation) else {
                continue;
            };
            let edges = index.entry(label).or_default();
            let seen = edges.iter().any(|edge| {
                edge.head.index() == triple.head.index()
                    && edge.dependent.index() == triple.dependent.index()
            });
            if !seen {
                edges.push(Edge {
                    head: Arc::clone(&triple.head),
                    dependent: Arc::clone(&triple.dependent),
                });
            }
        }

        Self { settings, index }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Extract every relation of the sentence.
    ///
    /// Active subject edges are processed before passive ones, each in parser
    /// order. Duplicate relations are kept.
    pub fn extract(&self) -> Vec<Relation> {
        let mut relations = Vec::new();

        for edge in self.edges(Label::NominalSubject) {
            self.extract_active(edge, &mut relations);
        }
        for edge in self.edges(Label::PassiveNominalSubject) {
            self.extract_passive(edge, &mut relations);
        }

        for relation in &relations {
            tracing::debug!(relation = %relation, "Extracted relation");
        }
        relations
    }

    // ========================================================================
    // Graph queries
    // ========================================================================

    fn edges(&self, label: Label) -> &[Edge] {
        self.index.get(&label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Dependents of `head` over `label`, in parser order
    pub fn dependents(&self, head: &WordUnit, label: Label) -> Vec<Arc<WordUnit>> {
        self.edges(label)
            .iter()
            .filter(|edge| *edge.head == *head)
            .map(|edge| Arc::clone(&edge.dependent))
            .collect()
    }

    /// `head` followed by its `conj_and` and `conj_or` dependents
    pub fn conjuncts(&self, head: &Arc<WordUnit>) -> Vec<Arc<WordUnit>> {
        let mut units = vec![Arc::clone(head)];
        units.extend(self.dependents(head, Label::ConjunctionAnd));
        units.extend(self.dependents(head, Label::ConjunctionOr));
        units
    }

    fn is_blacklisted_preposition(&self, preposition: &WordUnit) -> bool {
        let word = preposition.word().to_lowercase();
        self.settings
            .preposition_blacklist
            .iter()
            .any(|p| p.to_lowercase() == word)
    }

    /// Whether `head` may be expanded below the tokens already on `path`
    fn can_expand(&self, head: &WordUnit, path: &[usize]) -> bool {
        if path.contains(&head.index()) {
            tracing::trace!(head = %head.more_info(), "Expansion cycle skipped");
            return false;
        }
        if path.len() > self.settings.max_expansion_depth {
            tracing::warn!(head = %head.more_info(), "Expansion depth exceeded");
            return false;
        }
        true
    }

    fn accepts_subject_edge(&self, edge: &Edge) -> bool {
        edge.head.is_alphabetic()
            && edge.dependent.is_alphabetic()
            && !SUBJECT_POS_BLACKLIST.contains(&edge.dependent.pos())
    }

    // ========================================================================
    // Noun phrase expansion
    // ========================================================================

    /// Noun compound around `head`: its `nn` modifiers plus the head itself.
    ///
    /// `None` when the head has no compound modifier.
    pub fn noun_compound(&self, head: &Arc<WordUnit>) -> Option<WordUnitSequence> {
        let mut units = self.dependents(head, Label::NounCompound);
        if units.is_empty() {
            return None;
        }
        units.push(Arc::clone(head));
        Some(WordUnitSequence::from_units(units, Some(Arc::clone(head))))
    }

    /// Full phrase anchored on `head`.
    ///
    /// `None` when the phrase degenerates to a single one-character token.
    pub fn expand_head(&self, head: &Arc<WordUnit>) -> Option<WordUnitSequence> {
        self.expand_head_at(head, &[])
    }

    fn expand_head_at(&self, head: &Arc<WordUnit>, path: &[usize]) -> Option<WordUnitSequence> {
        if !self.can_expand(head, path) {
            return None;
        }

        let mut seq = WordUnitSequence::with_head(Arc::clone(head));

        if let Some(compound) = self.noun_compound(head) {
            let modifiers: Vec<_> = compound
                .units()
                .iter()
                .filter(|u| u.index() != head.index())
                .cloned()
                .collect();
            seq.extend_units(modifiers);
            seq.set_nn_head(compound);
        }

        seq.extend_units(self.dependents(head, Label::NumericModifier));
        seq.extend_units(
            self.dependents(head, Label::Negation)
                .into_iter()
                .filter(|u| u.pos() == NEGATION_DETERMINER_TAG),
        );

        for phrase in self.prep_phrases_at(head, path) {
            seq.extend(&phrase.to_sequence());
        }
        for phrase in self.vmod_phrases_at(head, path) {
            seq.extend(&phrase);
        }

        if seq.len() == 1 && seq.units()[0].len() == 1 {
            return None;
        }
        Some(seq)
    }

    /// Prepositional phrases attached close to `head`.
    ///
    /// A preposition qualifies when `|prep - head| < prep_max_distance` and it
    /// is not blacklisted. Its `pobj` dependents become expanded noun phrases;
    /// its `pcomp` dependents become predicate plus object phrases. An object
    /// that loops back into the phrase being expanded is left out, so the
    /// preposition stands alone.
    pub fn prep_phrases(&self, head: &Arc<WordUnit>) -> Vec<PrepPhrase> {
        self.prep_phrases_at(head, &[])
    }

    fn prep_phrases_at(&self, head: &Arc<WordUnit>, path: &[usize]) -> Vec<PrepPhrase> {
        let mut phrases = Vec::new();
        if !self.can_expand(head, path) {
            return phrases;
        }
        let below = descend(path, head);

        for preposition in self.dependents(head, Label::Preposition) {
            if preposition.index().abs_diff(head.index()) >= self.settings.prep_max_distance {
                continue;
            }
            if self.is_blacklisted_preposition(&preposition) {
                continue;
            }

            for pobj in self.dependents(&preposition, Label::PrepositionalObject) {
                if pobj.pos() == RELATIVE_DETERMINER_TAG {
                    continue;
                }
                if below.contains(&pobj.index()) {
                    phrases.push(PrepPhrase {
                        preposition: Arc::clone(&preposition),
                        object: WordUnitSequence::new(),
                    });
                    continue;
                }
                if let Some(object) = self.expand_head_at(&pobj, &below) {
                    phrases.push(PrepPhrase {
                        preposition: Arc::clone(&preposition),
                        object,
                    });
                }
            }

            for pcomp in self.dependents(&preposition, Label::PrepositionalComplement) {
                for (predicate, object) in self.predicate_objects_at(&pcomp, &below) {
                    let mut body = predicate.into_sequence();
                    if let Some(object) = object {
                        body.extend(&object);
                    }
                    phrases.push(PrepPhrase {
                        preposition: Arc::clone(&preposition),
                        object: body,
                    });
                }
            }
        }

        phrases
    }

    /// Verbal-modifier phrases of `head` ("proteins *found in cells*")
    pub fn vmod_phrases(&self, head: &Arc<WordUnit>) -> Vec<WordUnitSequence> {
        self.vmod_phrases_at(head, &[])
    }

    fn vmod_phrases_at(&self, head: &Arc<WordUnit>, path: &[usize]) -> Vec<WordUnitSequence> {
        let mut phrases = Vec::new();
        if !self.can_expand(head, path) {
            return phrases;
        }
        let below = descend(path, head);

        for verb in self.dependents(head, Label::VerbalModifier) {
            for (predicate, object) in self.predicate_objects_at(&verb, &below) {
                let mut phrase = predicate.into_sequence();
                if let Some(object) = object {
                    phrase.extend(&object);
                }
                phrases.push(phrase);
            }
        }

        phrases
    }

    // ========================================================================
    // Predicate expansion
    // ========================================================================

    /// Predicate candidates anchored on `head`.
    ///
    /// Auxiliaries, negations, particles and copulas join the head. An `xcomp`
    /// within `xcomp_max_gap` tokens merges into the predicate; a farther one
    /// is returned as a separate candidate next to the bare predicate.
    pub fn expand_predicate(&self, head: &Arc<WordUnit>) -> Vec<Predicate> {
        self.expand_predicate_at(head, &[])
    }

    fn expand_predicate_at(&self, head: &Arc<WordUnit>, path: &[usize]) -> Vec<Predicate> {
        if !self.can_expand(head, path) {
            return Vec::new();
        }

        let mut base = Predicate::with_head(Arc::clone(head));
        for unit in self.dependents(head, Label::Auxiliary) {
            base.add_auxiliary(unit);
        }
        for unit in self.dependents(head, Label::PassiveAuxiliary) {
            base.add_auxiliary(unit);
        }
        for unit in self.dependents(head, Label::Negation) {
            base.add_negation(unit);
        }
        for unit in self.dependents(head, Label::Particle) {
            base.add_word_unit(unit);
        }
        for unit in self.dependents(head, Label::Copula) {
            base.add_word_unit(unit);
        }

        let complements = self.dependents(head, Label::OpenClausalComplement);
        if complements.is_empty() {
            return vec![base];
        }

        let below = descend(path, head);
        let mut candidates = Vec::new();
        let mut keep_base = false;
        for complement in complements {
            let nested = self.expand_predicate_at(&complement, &below);
            if complement.index().abs_diff(head.index()) > self.settings.xcomp_max_gap {
                keep_base = true;
                candidates.extend(nested);
            } else {
                for sub in nested {
                    let mut merged = base.clone();
                    merged.merge(&sub);
                    merged.set_head(sub.head().cloned());
                    candidates.push(merged);
                }
            }
        }

        if keep_base || candidates.is_empty() {
            candidates.insert(0, base);
        }
        candidates
    }

    /// Predicate/object pairs for the predicate anchored on `head`.
    ///
    /// Objects are searched as direct objects, then adjectival complements,
    /// then (only when neither exists) prepositional phrases on the predicate
    /// head. Candidates without any object are kept with `None`.
    pub fn predicate_objects(&self, head: &Arc<WordUnit>) -> Vec<PredicateObject> {
        self.predicate_objects_at(head, &[])
    }

    fn predicate_objects_at(&self, head: &Arc<WordUnit>, path: &[usize]) -> Vec<PredicateObject> {
        let mut pairs = Vec::new();

        for candidate in self.expand_predicate_at(head, path) {
            let Some(anchor) = candidate.head().cloned() else {
                continue;
            };
            let before = pairs.len();
            // A merged xcomp moves the anchor below the predicate head.
            let anchor_path = if anchor.index() == head.index() {
                path.to_vec()
            } else {
                descend(path, head)
            };
            let below = descend(&anchor_path, &anchor);

            let direct_objects = self.dependents(&anchor, Label::DirectObject);
            for object in &direct_objects {
                for conjunct in self.conjuncts(object) {
                    if let Some(expanded) = self.expand_head_at(&conjunct, &below) {
                        pairs.push((candidate.clone(), Some(expanded)));
                    }
                }
            }

            let complements = self.dependents(&anchor, Label::AdjectivalComplement);
            for adjective in &complements {
                let mut predicate = candidate.clone();
                predicate.add_word_unit(Arc::clone(adjective));

                let phrases: Vec<_> = self
                    .prep_phrases_at(adjective, &below)
                    .into_iter()
                    .filter(|phrase| !phrase.object.is_empty())
                    .collect();
                if phrases.is_empty() {
                    pairs.push((predicate, None));
                } else {
                    for phrase in phrases {
                        pairs.push((predicate.clone(), Some(phrase.to_sequence())));
                    }
                }
            }

            if direct_objects.is_empty() && complements.is_empty() {
                let phrases = self.prep_phrases_at(&anchor, &anchor_path);
                for phrase in phrases.into_iter().filter(|p| !p.object.is_empty()) {
                    let mut predicate = candidate.clone();
                    predicate.add_word_unit(phrase.preposition);
                    pairs.push((predicate, Some(phrase.object)));
                }
            }

            if pairs.len() == before {
                pairs.push((candidate, None));
            }
        }

        pairs
    }

    // ========================================================================
    // Subject-verb-object assembly
    // ========================================================================

    fn push_relation(
        out: &mut Vec<Relation>,
        subject: &WordUnitSequence,
        predicate: Predicate,
        object: WordUnitSequence,
    ) {
        if predicate.is_empty() || object.is_empty() {
            return;
        }
        out.push(Relation::new(subject.clone(), predicate, object));
    }

    fn extract_active(&self, edge: &Edge, out: &mut Vec<Relation>) {
        if !self.accepts_subject_edge(edge) {
            tracing::trace!(
                head = %edge.head.more_info(),
                dependent = %edge.dependent.more_info(),
                "Subject edge filtered"
            );
            return;
        }

        let heads = self.conjuncts(&edge.head);
        for dependent in self.conjuncts(&edge.dependent) {
            let Some(subject) = self.expand_head(&dependent) else {
                continue;
            };

            for head in &heads {
                match PosClass::from_tag(head.pos()) {
                    PosClass::Verb => self.emit_verbal(&subject, head, &heads, out),
                    PosClass::Noun => self.emit_nominal(&subject, head, out),
                    PosClass::Adjective => self.emit_adjectival(&subject, head, out),
                    PosClass::Other => {}
                }
            }
        }
    }

    /// Verbal predicate; a candidate without object borrows the objects of
    /// its sibling verb conjuncts ("collects and analyzes data").
    fn emit_verbal(
        &self,
        subject: &WordUnitSequence,
        head: &Arc<WordUnit>,
        heads: &[Arc<WordUnit>],
        out: &mut Vec<Relation>,
    ) {
        for (predicate, object) in self.predicate_objects(head) {
            if let Some(object) = object {
                Self::push_relation(out, subject, predicate, object);
                continue;
            }

            let Some(anchor) = predicate.head().cloned() else {
                continue;
            };
            let siblings = heads.iter().filter(|sibling| {
                sibling.index() != head.index()
                    && PosClass::from_tag(sibling.pos()) == PosClass::Verb
            });
            for sibling in siblings {
                for (_, sibling_object) in self.predicate_objects(sibling) {
                    if let Some(object) = sibling_object {
                        // Only the bare head is shared; its auxiliaries and
                        // negations stay behind.
                        Self::push_relation(
                            out,
                            subject,
                            Predicate::with_head(Arc::clone(&anchor)),
                            object,
                        );
                    }
                }
            }
        }
    }

    /// Nominal predicate: "Carbon is an element"
    fn emit_nominal(
        &self,
        subject: &WordUnitSequence,
        head: &Arc<WordUnit>,
        out: &mut Vec<Relation>,
    ) {
        let copulas = self.dependents(head, Label::Copula);
        if copulas.is_empty() {
            return;
        }
        let Some(object) = self.expand_head(head) else {
            return;
        };

        for copula in &copulas {
            for predicate in self.expand_predicate(copula) {
                Self::push_relation(out, subject, predicate, object.clone());
            }
        }
    }

    /// Adjectival predicate: "Carbon is unique in ..."
    fn emit_adjectival(
        &self,
        subject: &WordUnitSequence,
        head: &Arc<WordUnit>,
        out: &mut Vec<Relation>,
    ) {
        let Some(copula) = self.dependents(head, Label::Copula).into_iter().next() else {
            return;
        };

        for (mut predicate, object) in self.predicate_objects(head) {
            let Some(object) = object else {
                continue;
            };
            if !predicate.contains(&copula) {
                predicate.add_word_unit(Arc::clone(&copula));
            }
            Self::push_relation(out, subject, predicate, object);
        }
    }

    fn extract_passive(&self, edge: &Edge, out: &mut Vec<Relation>) {
        if !self.accepts_subject_edge(edge) {
            return;
        }

        let verb = &edge.head;
        let Some(auxiliary) = self
            .dependents(verb, Label::PassiveAuxiliary)
            .into_iter()
            .next()
        else {
            return;
        };

        let agent_preposition = self.dependents(verb, Label::Preposition).into_iter().find(|p| {
            p.word().eq_ignore_ascii_case(AGENT_PREPOSITION)
                && p.index().abs_diff(verb.index()) < self.settings.prep_max_distance
        });

        let mut predicate = Predicate::new();
        predicate.add_auxiliary(Arc::clone(&auxiliary));
        predicate.set_head(Some(auxiliary));
        for unit in self.dependents(verb, Label::Negation) {
            predicate.add_negation(unit);
        }

        for dependent in self.conjuncts(&edge.dependent) {
            let Some(patient) = self.expand_head(&dependent) else {
                continue;
            };

            match &agent_preposition {
                Some(by) => {
                    let mut agent_predicate = predicate.clone();
                    agent_predicate.add_word_unit(Arc::clone(verb));
                    agent_predicate.add_word_unit(Arc::clone(by));

                    let agents = self
                        .dependents(by, Label::PrepositionalObject)
                        .into_iter()
                        .filter(|a| a.pos() != RELATIVE_DETERMINER_TAG);
                    for agent in agents {
                        for conjunct in self.conjuncts(&agent) {
                            if let Some(agent) = self.expand_head(&conjunct) {
                                Self::push_relation(
                                    out,
                                    &agent,
                                    agent_predicate.clone(),
                                    patient.clone(),
                                );
                            }
                        }
                    }
                }
                None => Self::push_relation(
                    out,
                    &patient,
                    predicate.clone(),
                    WordUnitSequence::with_head(Arc::clone(verb)),
                ),
            }
        }
    }
}

/// `path` extended by `head`
fn descend(path: &[usize], head: &WordUnit) -> Vec<usize> {
    let mut below = Vec::with_capacity(path.len() + 1);
    below.extend_from_slice(path);
    below.push(head.index());
    below
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::graph;

    fn extract(graph: &DependencyGraph) -> Vec<Relation> {
        RelationExtractor::new(graph, ExtractionSettings::default()).extract()
    }

    fn lemmas(relations: &[Relation]) -> Vec<(String, String, String)> {
        relations.iter().map(Relation::lemmatized).collect()
    }

    fn triple(s: &str, p: &str, o: &str) -> (String, String, String) {
        (s.to_string(), p.to_string(), o.to_string())
    }

    fn carbon() -> DependencyGraph {
        graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("displays", "display", "VBZ"),
                ("flexibility", "flexibility", "NN"),
                (".", ".", "."),
            ],
            &[
                ("root", 0, 2),
                ("nsubj", 2, 1),
                ("dobj", 2, 3),
                ("punct", 2, 4),
            ],
        )
    }

    #[test]
    fn test_simple_svo() {
        let relations = extract(&carbon());
        assert_eq!(
            lemmas(&relations),
            vec![triple("carbon", "display", "flexibility")]
        );
        assert_eq!(
            relations[0].canonical_form(),
            "carbon | display | flexibility"
        );
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let first = lemmas(&extract(&carbon()));
        let second = lemmas(&extract(&carbon()));
        assert_eq!(first, second);

        let extractor = RelationExtractor::new(&carbon(), ExtractionSettings::default());
        assert_eq!(lemmas(&extractor.extract()), lemmas(&extractor.extract()));
    }

    #[test]
    fn test_empty_graph() {
        let empty = graph(&[], &[]);
        assert!(extract(&empty).is_empty());
    }

    #[test]
    fn test_passive_with_agent() {
        let article = graph(
            &[
                ("The", "the", "DT"),
                ("article", "article", "NN"),
                ("is", "be", "VBZ"),
                ("reviewed", "review", "VBN"),
                ("by", "by", "IN"),
                ("Tom", "Tom", "NNP"),
                (".", ".", "."),
            ],
            &[
                ("root", 0, 4),
                ("det", 2, 1),
                ("nsubjpass", 4, 2),
                ("auxpass", 4, 3),
                ("prep", 4, 5),
                ("pobj", 5, 6),
                ("punct", 4, 7),
            ],
        );

        let relations = extract(&article);
        assert_eq!(
            lemmas(&relations),
            vec![triple("tom", "be review by", "article")]
        );
        assert_eq!(relations[0].predicate().canonical_form(), "review by");
    }

    #[test]
    fn test_passive_conjoined_subjects() {
        let seeds = graph(
            &[
                ("Apple", "Apple", "NNP"),
                ("seed", "seed", "NN"),
                ("and", "and", "CC"),
                ("Iron", "Iron", "NNP"),
                ("seed", "seed", "NN"),
                ("are", "be", "VBP"),
                ("followed", "follow", "VBN"),
                ("with", "with", "IN"),
                ("fruits", "fruit", "NNS"),
                ("and", "and", "CC"),
                ("animals", "animal", "NNS"),
                (".", ".", "."),
            ],
            &[
                ("root", 0, 7),
                ("nn", 2, 1),
                ("nsubjpass", 7, 2),
                ("cc", 2, 3),
                ("nn", 5, 4),
                ("conj_and", 2, 5),
                ("auxpass", 7, 6),
                ("prep", 7, 8),
                ("pobj", 8, 9),
                ("cc", 9, 10),
                ("conj_and", 9, 11),
                ("punct", 7, 12),
            ],
        );

        let relations = extract(&seeds);
        assert_eq!(
            lemmas(&relations),
            vec![
                triple("apple seed", "be", "follow"),
                triple("iron seed", "be", "follow"),
            ]
        );

        let record = relations[1].to_record("Apple seed and Iron seed are followed ...");
        assert_eq!(record.subject_head, "seed");
        assert_eq!(record.subject_nn_head, "iron seed");
    }

    #[test]
    fn test_passive_negation() {
        let gene = graph(
            &[
                ("The", "the", "DT"),
                ("gene", "gene", "NN"),
                ("was", "be", "VBD"),
                ("not", "not", "RB"),
                ("found", "find", "VBN"),
            ],
            &[
                ("det", 2, 1),
                ("nsubjpass", 5, 2),
                ("auxpass", 5, 3),
                ("neg", 5, 4),
            ],
        );

        let relations = extract(&gene);
        assert_eq!(lemmas(&relations), vec![triple("gene", "be not", "find")]);
        assert_eq!(relations[0].predicate().canonical_form(), "not be");
    }

    #[test]
    fn test_passive_subject_filter() {
        let which = graph(
            &[
                ("which", "which", "WDT"),
                ("was", "be", "VBD"),
                ("found", "find", "VBN"),
            ],
            &[("nsubjpass", 3, 1), ("auxpass", 3, 2)],
        );
        assert!(extract(&which).is_empty());
    }

    #[test]
    fn test_coordinated_verbs_share_objects() {
        let scientists = graph(
            &[
                ("Scientists", "scientist", "NNS"),
                ("will", "will", "MD"),
                ("collect", "collect", "VB"),
                ("and", "and", "CC"),
                ("analyze", "analyze", "VB"),
                ("data", "data", "NNS"),
            ],
            &[
                ("nsubj", 3, 1),
                ("aux", 3, 2),
                ("cc", 3, 4),
                ("conj_and", 3, 5),
                ("dobj", 5, 6),
            ],
        );

        let relations = extract(&scientists);
        assert_eq!(
            lemmas(&relations),
            vec![
                triple("scientist", "collect", "data"),
                triple("scientist", "analyze", "data"),
            ]
        );
    }

    #[test]
    fn test_conjoined_objects() {
        let tom = graph(
            &[
                ("Tom", "Tom", "NNP"),
                ("eats", "eat", "VBZ"),
                ("apples", "apple", "NNS"),
                ("and", "and", "CC"),
                ("pears", "pear", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("dobj", 2, 3),
                ("cc", 3, 4),
                ("conj_and", 3, 5),
            ],
        );

        assert_eq!(
            lemmas(&extract(&tom)),
            vec![triple("tom", "eat", "apple"), triple("tom", "eat", "pear")]
        );
    }

    #[test]
    fn test_subject_filters() {
        let pronoun = graph(
            &[
                ("It", "it", "PRP"),
                ("displays", "display", "VBZ"),
                ("flexibility", "flexibility", "NN"),
            ],
            &[("nsubj", 2, 1), ("dobj", 2, 3)],
        );
        assert!(extract(&pronoun).is_empty());

        let code = graph(
            &[
                ("CI-1033", "CI-1033", "NN"),
                ("inhibits", "inhibit", "VBZ"),
                ("growth", "growth", "NN"),
            ],
            &[("nsubj", 2, 1), ("dobj", 2, 3)],
        );
        assert!(extract(&code).is_empty());
    }

    #[test]
    fn test_single_character_subject_is_dropped() {
        let x = graph(
            &[
                ("X", "x", "NN"),
                ("displays", "display", "VBZ"),
                ("flexibility", "flexibility", "NN"),
            ],
            &[("nsubj", 2, 1), ("dobj", 2, 3)],
        );
        assert!(extract(&x).is_empty());

        let extractor = RelationExtractor::new(&x, ExtractionSettings::default());
        assert!(extractor.expand_head(&x.tokens()[0]).is_none());
    }

    #[test]
    fn test_copular_noun() {
        let element = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("is", "be", "VBZ"),
                ("an", "a", "DT"),
                ("element", "element", "NN"),
                (".", ".", "."),
            ],
            &[("nsubj", 4, 1), ("cop", 4, 2), ("det", 4, 3)],
        );
        assert_eq!(
            lemmas(&extract(&element)),
            vec![triple("carbon", "be", "element")]
        );
    }

    #[test]
    fn test_copular_adjective_with_prep() {
        let unique = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("is", "be", "VBZ"),
                ("unique", "unique", "JJ"),
                ("in", "in", "IN"),
                ("the", "the", "DT"),
                ("diversity", "diversity", "NN"),
                ("of", "of", "IN"),
                ("roles", "role", "NNS"),
            ],
            &[
                ("nsubj", 3, 1),
                ("cop", 3, 2),
                ("prep", 3, 4),
                ("pobj", 4, 6),
                ("det", 6, 5),
                ("prep", 6, 7),
                ("pobj", 7, 8),
            ],
        );

        let relations = extract(&unique);
        assert_eq!(
            lemmas(&relations),
            vec![triple("carbon", "be unique in", "diversity of role")]
        );
        assert_eq!(relations[0].object().head().unwrap().word(), "diversity");
    }

    #[test]
    fn test_copular_adjective_without_object() {
        let unique = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("is", "be", "VBZ"),
                ("unique", "unique", "JJ"),
            ],
            &[("nsubj", 3, 1), ("cop", 3, 2)],
        );
        assert!(extract(&unique).is_empty());
    }

    #[test]
    fn test_close_xcomp_merges() {
        let john = graph(
            &[
                ("John", "John", "NNP"),
                ("wants", "want", "VBZ"),
                ("to", "to", "TO"),
                ("eat", "eat", "VB"),
                ("apples", "apple", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("xcomp", 2, 4),
                ("aux", 4, 3),
                ("dobj", 4, 5),
            ],
        );

        let relations = extract(&john);
        assert_eq!(
            lemmas(&relations),
            vec![triple("john", "want to eat", "apple")]
        );
        assert_eq!(relations[0].predicate().head().unwrap().word(), "eat");
        assert_eq!(relations[0].predicate().canonical_form(), "want eat");
    }

    #[test]
    fn test_distant_xcomp_is_separate_candidate() {
        let john = graph(
            &[
                ("John", "John", "NNP"),
                ("decided", "decide", "VBD"),
                ("yesterday", "yesterday", "NN"),
                ("morning", "morning", "NN"),
                ("to", "to", "TO"),
                ("publish", "publish", "VB"),
                ("papers", "paper", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("nn", 4, 3),
                ("tmod", 2, 4),
                ("xcomp", 2, 6),
                ("aux", 6, 5),
                ("dobj", 6, 7),
            ],
        );

        let extractor = RelationExtractor::new(&john, ExtractionSettings::default());
        let candidates = extractor.expand_predicate(&john.tokens()[1]);
        let rendered: Vec<String> = candidates.iter().map(|c| c.lemma()).collect();
        assert_eq!(rendered, vec!["decide", "to publish"]);

        assert_eq!(
            lemmas(&extractor.extract()),
            vec![triple("john", "to publish", "paper")]
        );
    }

    #[test]
    fn test_preposition_distance_and_blacklist() {
        let compounds = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("forms", "form", "VBZ"),
                ("compounds", "compound", "NNS"),
                ("including", "include", "VBG"),
                ("oxides", "oxide", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("dobj", 2, 3),
                ("prep", 3, 4),
                ("pobj", 4, 5),
            ],
        );
        assert_eq!(
            lemmas(&extract(&compounds)),
            vec![triple("carbon", "form", "compound")]
        );

        let mut settings = ExtractionSettings::default();
        settings.preposition_blacklist.clear();
        let relations = RelationExtractor::new(&compounds, settings).extract();
        assert_eq!(
            lemmas(&relations),
            vec![triple("carbon", "form", "compound include oxide")]
        );

        let temperature = graph(
            &[
                ("flexibility", "flexibility", "NN"),
                ("at", "at", "IN"),
                ("high", "high", "JJ"),
                ("temperature", "temperature", "NN"),
            ],
            &[("prep", 1, 2), ("amod", 4, 3), ("pobj", 2, 4)],
        );
        let head = &temperature.tokens()[0];
        let near = RelationExtractor::new(&temperature, ExtractionSettings::default());
        assert_eq!(near.prep_phrases(head).len(), 1);

        let spaced = graph(
            &[
                ("flexibility", "flexibility", "NN"),
                ("even", "even", "RB"),
                ("at", "at", "IN"),
                ("temperature", "temperature", "NN"),
            ],
            &[("advmod", 3, 2), ("prep", 1, 3), ("pobj", 3, 4)],
        );
        let head = &spaced.tokens()[0];
        let strict = RelationExtractor::new(&spaced, ExtractionSettings::default());
        assert!(strict.prep_phrases(head).is_empty());

        let settings = ExtractionSettings {
            prep_max_distance: 3,
            ..ExtractionSettings::default()
        };
        let loose = RelationExtractor::new(&spaced, settings);
        let phrases = loose.prep_phrases(head);
        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].to_sequence().lemma(), "at temperature");
    }

    #[test]
    fn test_prep_object_on_verb() {
        let carbon = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("reacts", "react", "VBZ"),
                ("with", "with", "IN"),
                ("oxygen", "oxygen", "NN"),
            ],
            &[("nsubj", 2, 1), ("prep", 2, 3), ("pobj", 3, 4)],
        );
        assert_eq!(
            lemmas(&extract(&carbon)),
            vec![triple("carbon", "react with", "oxygen")]
        );
    }

    #[test]
    fn test_prep_complement() {
        let steel = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("helps", "help", "VBZ"),
                ("in", "in", "IN"),
                ("making", "make", "VBG"),
                ("steel", "steel", "NN"),
            ],
            &[
                ("nsubj", 2, 1),
                ("prep", 2, 3),
                ("pcomp", 3, 4),
                ("dobj", 4, 5),
            ],
        );
        assert_eq!(
            lemmas(&extract(&steel)),
            vec![triple("carbon", "help in", "make steel")]
        );
    }

    #[test]
    fn test_adjectival_complement() {
        let granite = graph(
            &[
                ("The", "the", "DT"),
                ("sample", "sample", "NN"),
                ("looks", "look", "VBZ"),
                ("similar", "similar", "JJ"),
                ("to", "to", "TO"),
                ("granite", "granite", "NN"),
            ],
            &[
                ("det", 2, 1),
                ("nsubj", 3, 2),
                ("acomp", 3, 4),
                ("prep", 4, 5),
                ("pobj", 5, 6),
            ],
        );
        assert_eq!(
            lemmas(&extract(&granite)),
            vec![triple("sample", "look similar", "to granite")]
        );
    }

    #[test]
    fn test_noun_phrase_modifiers() {
        let samples = graph(
            &[
                ("No", "no", "DT"),
                ("3", "3", "CD"),
                ("samples", "sample", "NNS"),
                ("contain", "contain", "VBP"),
                ("not", "not", "RB"),
                ("gene", "gene", "NN"),
                ("expression", "expression", "NN"),
                ("data", "data", "NNS"),
            ],
            &[
                ("neg", 3, 1),
                ("num", 3, 2),
                ("nsubj", 4, 3),
                ("dobj", 4, 8),
                ("neg", 8, 5),
                ("nn", 8, 7),
                ("nn", 8, 6),
            ],
        );

        let relations = extract(&samples);
        assert_eq!(
            lemmas(&relations),
            vec![triple("no 3 sample", "contain", "gene expression data")]
        );

        let object = relations[0].object();
        assert_eq!(object.head().unwrap().word(), "data");
        assert_eq!(object.nn_head().unwrap().lemma(), "gene expression data");
    }

    #[test]
    fn test_noun_compound_puts_head_last() {
        let compound = graph(
            &[
                ("gene", "gene", "NN"),
                ("expression", "expression", "NN"),
                ("data", "data", "NNS"),
            ],
            &[("nn", 3, 2), ("nn", 3, 1)],
        );
        let extractor = RelationExtractor::new(&compound, ExtractionSettings::default());
        let head = &compound.tokens()[2];
        let nn = extractor.noun_compound(head).unwrap();
        let indices: Vec<usize> = nn.units().iter().map(|u| u.index()).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(extractor.noun_compound(&compound.tokens()[0]).is_none());
    }

    #[test]
    fn test_verbal_modifier() {
        let proteins = graph(
            &[
                ("Researchers", "researcher", "NNS"),
                ("studied", "study", "VBD"),
                ("proteins", "protein", "NNS"),
                ("found", "find", "VBN"),
                ("in", "in", "IN"),
                ("cells", "cell", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("dobj", 2, 3),
                ("vmod", 3, 4),
                ("prep", 4, 5),
                ("pobj", 5, 6),
            ],
        );
        assert_eq!(
            lemmas(&extract(&proteins)),
            vec![triple("researcher", "study", "protein find in cell")]
        );
    }

    #[test]
    fn test_unlisted_labels_are_ignored() {
        let carbon = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("displays", "display", "VBZ"),
                ("flexibility", "flexibility", "NN"),
            ],
            &[("nsubj", 2, 1), ("iobj", 2, 3)],
        );
        assert!(extract(&carbon).is_empty());
    }

    fn flexibility_cycle(loop_edges: usize) -> DependencyGraph {
        let mut dependencies = vec![("nsubj", 2, 1), ("dobj", 2, 3), ("prep", 3, 4)];
        dependencies.extend(std::iter::repeat(("pobj", 4, 3)).take(loop_edges));
        graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("displays", "display", "VBZ"),
                ("flexibility", "flexibility", "NN"),
                ("of", "of", "IN"),
            ],
            &dependencies,
        )
    }

    #[test]
    fn test_cyclic_graph_stops_at_revisited_token() {
        let relations = extract(&flexibility_cycle(1));
        assert_eq!(
            lemmas(&relations),
            vec![triple("carbon", "display", "flexibility of")]
        );
    }

    #[test]
    fn test_duplicated_cycle_edges_do_not_multiply() {
        for loop_edges in [2, 3, 8] {
            let relations = extract(&flexibility_cycle(loop_edges));
            assert_eq!(relations.len(), 1);
            assert_eq!(relations[0].object().lemma(), "flexibility of");
        }
    }

    #[test]
    fn test_duplicate_edges_are_indexed_once() {
        let carbon = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("displays", "display", "VBZ"),
                ("flexibility", "flexibility", "NN"),
            ],
            &[("nsubj", 2, 1), ("nsubj", 2, 1), ("dobj", 2, 3), ("dobj", 2, 3)],
        );
        assert_eq!(
            lemmas(&extract(&carbon)),
            vec![triple("carbon", "display", "flexibility")]
        );
    }

    #[test]
    fn test_xcomp_cycle_keeps_base_predicate() {
        let looped = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("tends", "tend", "VBZ"),
                ("bond", "bond", "VB"),
                ("atoms", "atom", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("xcomp", 2, 3),
                ("xcomp", 3, 2),
                ("dobj", 3, 4),
            ],
        );
        assert_eq!(
            lemmas(&extract(&looped)),
            vec![triple("carbon", "tend bond", "atom")]
        );
    }

    #[test]
    fn test_expansion_depth_is_bounded() {
        let chain = graph(
            &[
                ("Carbon", "carbon", "NN"),
                ("forms", "form", "VBZ"),
                ("chains", "chain", "NNS"),
                ("of", "of", "IN"),
                ("rings", "ring", "NNS"),
                ("of", "of", "IN"),
                ("atoms", "atom", "NNS"),
            ],
            &[
                ("nsubj", 2, 1),
                ("dobj", 2, 3),
                ("prep", 3, 4),
                ("pobj", 4, 5),
                ("prep", 5, 6),
                ("pobj", 6, 7),
            ],
        );
        let settings = ExtractionSettings {
            max_expansion_depth: 2,
            ..ExtractionSettings::default()
        };
        let relations = RelationExtractor::new(&chain, settings).extract();
        assert_eq!(
            lemmas(&relations),
            vec![triple("carbon", "form", "chain of ring")]
        );

        assert_eq!(
            lemmas(&extract(&chain)),
            vec![triple("carbon", "form", "chain of ring of atom")]
        );
    }
}
