//! HTML content extraction
//!
//! Turns an arbitrary HTML page into a `(title, content)` pair, or explains
//! why the page has nothing worth keeping.
//!
//! # Pipeline
//!
//! 1. Parse the document and detach non-content nodes (`script`, `style`,
//!    `nav`, `header`, `footer`, `noscript`, `aside`)
//! 2. Title: try each title selector in order; the first candidate whose
//!    length is within bounds and which is not the site name wins. The
//!    document `<title>` has its site suffix (`" - Site"`) removed first.
//! 3. Content: run the content cascade (container selectors, longest text
//!    node, concatenated paragraphs); a candidate is cleaned before it is
//!    measured against the minimum length
//!
//! Extraction is a pure function of the input markup.

use crate::config::ExtractorConfig;
use crate::content::cleaner::{collapse_whitespace, Cleaner};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// Nodes removed before any text is read
const STRIPPED_TAGS: &str = "script, style, nav, header, footer, noscript, aside";

/// Nodes considered by the paragraph fallback
const PARAGRAPH_TAGS: &str = "p, li, blockquote, pre";

/// Separators between a page title and the site name in `<title>`
const TITLE_SUFFIX_SEPARATORS: [&str; 3] = [" - ", " | ", " _ "];

/// Title and body salvaged from a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: String,
    pub content: String,
}

impl ExtractedContent {
    /// Body length in characters
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Why a page produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRejection {
    /// No title candidate passed the length and site-name checks
    NoTitle,

    /// No content strategy produced enough text after cleaning
    ContentTooShort { minimum: usize },
}

impl fmt::Display for ExtractionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoTitle => write!(f, "no usable title"),
            Self::ContentTooShort { minimum } => {
                write!(f, "content shorter than {} chars", minimum)
            }
        }
    }
}

/// A content strategy returns cleaned text that already meets the minimum length
type ContentStrategy = fn(&Extractor, &Html) -> Option<String>;

/// The content cascade, tried in order
const CONTENT_CASCADE: [(&str, ContentStrategy); 3] = [
    ("content-selectors", Extractor::from_content_selectors),
    ("longest-text-node", Extractor::from_longest_text_node),
    ("paragraphs", Extractor::from_paragraphs),
];

struct TitleSelector {
    selector: Selector,
    is_document_title: bool,
}

/// Compiled extraction heuristics
pub struct Extractor {
    title_selectors: Vec<TitleSelector>,
    content_selectors: Vec<Selector>,
    stripped: Selector,
    paragraphs: Selector,
    cleaner: Cleaner,
    site_name: Option<String>,
    min_content_length: usize,
    min_paragraph_length: usize,
    title_min_length: usize,
    title_max_length: usize,
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extractor")
            .field("title_selectors", &self.title_selectors.len())
            .field("content_selectors", &self.content_selectors.len())
            .field("site_name", &self.site_name)
            .field("min_content_length", &self.min_content_length)
            .finish()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}': {:?}", selector, e)))
}

impl Extractor {
    /// Compiles the configured selectors and boilerplate list
    pub fn new(config: &ExtractorConfig) -> Result<Self, ConfigError> {
        let title_selectors = config
            .title_selectors
            .iter()
            .map(|s| {
                Ok(TitleSelector {
                    selector: parse_selector(s)?,
                    is_document_title: s.trim().eq_ignore_ascii_case("title"),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        let content_selectors = config
            .content_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        let cleaner = Cleaner::new(&config.boilerplate)
            .map_err(|e| ConfigError::Validation(format!("invalid boilerplate list: {}", e)))?;

        Ok(Self {
            title_selectors,
            content_selectors,
            stripped: parse_selector(STRIPPED_TAGS)?,
            paragraphs: parse_selector(PARAGRAPH_TAGS)?,
            cleaner,
            site_name: config
                .site_name
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            min_content_length: config.min_content_length,
            min_paragraph_length: config.min_paragraph_length,
            title_min_length: config.title_min_length,
            title_max_length: config.title_max_length,
        })
    }

    /// Extracts a title and body from raw HTML
    pub fn extract(&self, html: &str) -> Result<ExtractedContent, ExtractionRejection> {
        let mut document = Html::parse_document(html);
        self.strip_non_content(&mut document);

        let title = self
            .extract_title(&document)
            .ok_or(ExtractionRejection::NoTitle)?;

        let content = self.extract_content(&document)?;

        Ok(ExtractedContent { title, content })
    }

    fn strip_non_content(&self, document: &mut Html) {
        let ids: Vec<_> = document.select(&self.stripped).map(|el| el.id()).collect();

        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        for title_selector in &self.title_selectors {
            for element in document.select(&title_selector.selector) {
                let mut candidate = collapse_whitespace(&element_text(&element));
                if title_selector.is_document_title {
                    candidate = strip_site_suffix(&candidate).to_string();
                }

                if self.is_acceptable_title(&candidate) {
                    return Some(candidate);
                }
            }
        }

        None
    }

    fn is_acceptable_title(&self, candidate: &str) -> bool {
        let len = candidate.chars().count();
        if len < self.title_min_length || len > self.title_max_length {
            return false;
        }

        match &self.site_name {
            Some(site) => !candidate.eq_ignore_ascii_case(site),
            None => true,
        }
    }

    fn extract_content(&self, document: &Html) -> Result<String, ExtractionRejection> {
        for (name, strategy) in CONTENT_CASCADE {
            if let Some(content) = strategy(self, document) {
                tracing::trace!("Content found by {} ({} chars)", name, content.chars().count());
                return Ok(content);
            }
        }

        Err(ExtractionRejection::ContentTooShort {
            minimum: self.min_content_length,
        })
    }

    /// Cleans a candidate and keeps it only if it reaches the minimum length
    fn accept(&self, raw: &str) -> Option<String> {
        let cleaned = self.cleaner.clean(raw);
        (cleaned.chars().count() >= self.min_content_length).then_some(cleaned)
    }

    fn from_content_selectors(&self, document: &Html) -> Option<String> {
        self.content_selectors
            .iter()
            .flat_map(|selector| document.select(selector))
            .find_map(|element| self.accept(&element_text(&element)))
    }

    fn from_longest_text_node(&self, document: &Html) -> Option<String> {
        document
            .root_element()
            .descendants()
            .filter_map(|node| node.value().as_text())
            .map(|text| text.trim())
            .max_by_key(|text| text.chars().count())
            .and_then(|text| self.accept(text))
    }

    fn from_paragraphs(&self, document: &Html) -> Option<String> {
        let paragraphs: Vec<String> = document
            .select(&self.paragraphs)
            .map(|element| collapse_whitespace(&element_text(&element)))
            .filter(|text| text.chars().count() > self.min_paragraph_length)
            .collect();

        if paragraphs.is_empty() {
            return None;
        }
        self.accept(&paragraphs.join("\n"))
    }
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// Drops a trailing site name from a document title
fn strip_site_suffix(title: &str) -> &str {
    TITLE_SUFFIX_SEPARATORS
        .iter()
        .filter_map(|sep| title.find(sep))
        .min()
        .map(|pos| title[..pos].trim())
        .unwrap_or(title)
}
