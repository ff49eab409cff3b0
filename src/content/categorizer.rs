//! Keyword-based category assignment

use crate::config::{CategorizerConfig, CategoryEntry};

/// Assigns a category label by keyword matching against an ordered taxonomy
///
/// The taxonomy is fixed at construction. Categories are tested in order and
/// the first one with any keyword present in the lower-cased title plus
/// content prefix wins.
#[derive(Debug, Clone)]
pub struct Categorizer {
    categories: Vec<(String, Vec<String>)>,
    prefix_length: usize,
    fallback: String,
}

impl Categorizer {
    pub fn new(taxonomy: &[CategoryEntry], config: &CategorizerConfig) -> Self {
        let categories = taxonomy
            .iter()
            .map(|entry| {
                let keywords = entry
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (entry.name.clone(), keywords)
            })
            .collect();

        Self {
            categories,
            prefix_length: config.prefix_length,
            fallback: config.fallback.clone(),
        }
    }

    /// Category names in tie-break order, followed by the fallback
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.categories
            .iter()
            .map(|(name, _)| name.as_str())
            .chain(std::iter::once(self.fallback.as_str()))
    }

    pub fn categorize(&self, title: &str, content: &str) -> String {
        let prefix: String = content.chars().take(self.prefix_length).collect();
        let haystack = format!("{} {}", title, prefix).to_lowercase();

        self.categories
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| haystack.contains(k.as_str())))
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| self.fallback.clone())
    }
}
