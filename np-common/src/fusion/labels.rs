//! Label normalization applied before accumulation
//!
//! Classifiers use different vocabularies ("sad" vs "sadness"). No canonical
//! label set is assumed: the default is the identity mapping, and a mapping
//! table can be supplied through configuration.

use std::borrow::Cow;
use std::collections::HashMap;

/// Maps classifier labels onto the labels used for accumulation and stress
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LabelNormalizer {
    /// Labels are merged exactly as emitted
    #[default]
    Identity,
    /// Lookup table keyed by lowercase label; unmapped labels pass through
    Table(HashMap<String, String>),
}

impl LabelNormalizer {
    /// Build a table normalizer; an empty table yields `Identity`
    pub fn from_table<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let table: HashMap<String, String> = entries
            .into_iter()
            .map(|(from, to)| (from.as_ref().to_lowercase(), to.into()))
            .collect();

        if table.is_empty() {
            LabelNormalizer::Identity
        } else {
            LabelNormalizer::Table(table)
        }
    }

    pub fn normalize<'a>(&'a self, label: &'a str) -> Cow<'a, str> {
        match self {
            LabelNormalizer::Identity => Cow::Borrowed(label),
            LabelNormalizer::Table(table) => match table.get(&label.to_lowercase()) {
                Some(mapped) => Cow::Borrowed(mapped.as_str()),
                None => Cow::Borrowed(label),
            },
        }
    }
}
