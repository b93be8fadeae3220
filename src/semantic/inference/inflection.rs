//! Pluralization and singularization for table-name matching.
//!
//! Naming inference only needs two operations, so they sit behind the
//! [`NameInflector`] trait. [`EnglishInflector`] handles a table of irregular
//! plurals common in schemas and falls back to the `inflector` crate.

use inflector::Inflector as _;

/// Irregular plurals the `inflector` crate gets wrong in schema contexts.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("leaf", "leaves"),
    ("life", "lives"),
    ("knife", "knives"),
    ("wife", "wives"),
    ("half", "halves"),
    ("hero", "heroes"),
    ("potato", "potatoes"),
    ("analysis", "analyses"),
    ("basis", "bases"),
    ("crisis", "crises"),
    ("diagnosis", "diagnoses"),
    ("thesis", "theses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("vertex", "vertices"),
];

/// Linguistic rules used to resolve a column's base name to a table.
pub trait NameInflector: Send + Sync + std::fmt::Debug {
    /// Plural form of `word`, lowercase.
    fn pluralize(&self, word: &str) -> String;

    /// Singular form of `word`, lowercase.
    fn singularize(&self, word: &str) -> String;
}

/// English rules with an extendable irregulars table.
#[derive(Debug, Clone, Default)]
pub struct EnglishInflector {
    extra_irregulars: Vec<(String, String)>,
}

impl EnglishInflector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a project-specific irregular pair (e.g. `("cactus", "cacti")`).
    pub fn with_irregular(mut self, singular: &str, plural: &str) -> Self {
        self.extra_irregulars
            .push((singular.to_lowercase(), plural.to_lowercase()));
        self
    }

    fn irregulars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.extra_irregulars
            .iter()
            .map(|(s, p)| (s.as_str(), p.as_str()))
            .chain(IRREGULAR_PLURALS.iter().copied())
    }
}

impl NameInflector for EnglishInflector {
    fn pluralize(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if lower.is_empty() {
            return lower;
        }
        for (singular, plural) in self.irregulars() {
            if lower == singular || lower == plural {
                return plural.to_string();
            }
        }
        lower.to_plural()
    }

    fn singularize(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if lower.is_empty() {
            return lower;
        }
        for (singular, plural) in self.irregulars() {
            if lower == plural || lower == singular {
                return singular.to_string();
            }
        }
        lower.to_singular()
    }
}

/// Pluralize with the default English rules.
pub fn pluralize(word: &str) -> String {
    EnglishInflector::default().pluralize(word)
}

/// Singularize with the default English rules.
pub fn singularize(word: &str) -> String {
    EnglishInflector::default().singularize(word)
}
