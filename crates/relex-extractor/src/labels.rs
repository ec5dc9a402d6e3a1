//! Dependency labels and part-of-speech classes the rule set reacts to
//!
//! Labels outside the whitelist are never indexed, so rules only ever see
//! the closed `Label` set.

/// Whitelisted dependency labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    NominalSubject,
    PassiveNominalSubject,
    DirectObject,
    PrepositionalObject,
    NounCompound,
    NumericModifier,
    Negation,
    VerbalModifier,
    Preposition,
    PrepositionalComplement,
    ClausalComplement,
    OpenClausalComplement,
    AdjectivalComplement,
    Copula,
    Auxiliary,
    PassiveAuxiliary,
    Particle,
    ConjunctionAnd,
    ConjunctionOr,
    Coordination,
}

impl Label {
    pub const ALL: [Label; 20] = [
        Label::NominalSubject,
        Label::PassiveNominalSubject,
        Label::DirectObject,
        Label::PrepositionalObject,
        Label::NounCompound,
        Label::NumericModifier,
        Label::Negation,
        Label::VerbalModifier,
        Label::Preposition,
        Label::PrepositionalComplement,
        Label::ClausalComplement,
        Label::OpenClausalComplement,
        Label::AdjectivalComplement,
        Label::Copula,
        Label::Auxiliary,
        Label::PassiveAuxiliary,
        Label::Particle,
        Label::ConjunctionAnd,
        Label::ConjunctionOr,
        Label::Coordination,
    ];

    /// Map a parser label; `None` for labels the rules ignore
    pub fn from_label(label: &str) -> Option<Self> {
        let label = match label {
            "nsubj" => Self::NominalSubject,
            "nsubjpass" => Self::PassiveNominalSubject,
            "dobj" => Self::DirectObject,
            "pobj" => Self::PrepositionalObject,
            "nn" => Self::NounCompound,
            "num" => Self::NumericModifier,
            "neg" => Self::Negation,
            "vmod" => Self::VerbalModifier,
            "prep" => Self::Preposition,
            "pcomp" => Self::PrepositionalComplement,
            "ccomp" => Self::ClausalComplement,
            "xcomp" => Self::OpenClausalComplement,
            "acomp" => Self::AdjectivalComplement,
            "cop" => Self::Copula,
            "aux" => Self::Auxiliary,
            "auxpass" => Self::PassiveAuxiliary,
            "prt" => Self::Particle,
            "conj_and" => Self::ConjunctionAnd,
            "conj_or" => Self::ConjunctionOr,
            "cc" => Self::Coordination,
            _ => return None,
        };
        Some(label)
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            Self::NominalSubject => "nsubj",
            Self::PassiveNominalSubject => "nsubjpass",
            Self::DirectObject => "dobj",
            Self::PrepositionalObject => "pobj",
            Self::NounCompound => "nn",
            Self::NumericModifier => "num",
            Self::Negation => "neg",
            Self::VerbalModifier => "vmod",
            Self::Preposition => "prep",
            Self::PrepositionalComplement => "pcomp",
            Self::ClausalComplement => "ccomp",
            Self::OpenClausalComplement => "xcomp",
            Self::AdjectivalComplement => "acomp",
            Self::Copula => "cop",
            Self::Auxiliary => "aux",
            Self::PassiveAuxiliary => "auxpass",
            Self::Particle => "prt",
            Self::ConjunctionAnd => "conj_and",
            Self::ConjunctionOr => "conj_or",
            Self::Coordination => "cc",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Coarse part-of-speech class of a predicate head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosClass {
    Verb,
    Noun,
    Adjective,
    Other,
}

impl PosClass {
    /// Classify a Penn Treebank tag by its prefix
    pub fn from_tag(tag: &str) -> Self {
        if tag.starts_with("VB") {
            Self::Verb
        } else if tag.starts_with("NN") {
            Self::Noun
        } else if tag.starts_with("JJ") {
            Self::Adjective
        } else {
            Self::Other
        }
    }
}

/// Tags a subject dependent must not carry
pub const SUBJECT_POS_BLACKLIST: [&str; 7] = ["WDT", "DT", "PRP", "JJ", "JJR", "JJS", "IN"];

/// Only negations tagged as determiners ("no") join a noun phrase
pub const NEGATION_DETERMINER_TAG: &str = "DT";

/// Prepositional objects with this tag ("which") are skipped
pub const RELATIVE_DETERMINER_TAG: &str = "WDT";

/// Preposition introducing the agent of a passive verb
pub const AGENT_PREPOSITION: &str = "by";
