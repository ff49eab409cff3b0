//! Content module: turning fetched markup into a titled, categorized body
//!
//! Both stages are pure CPU functions; they never touch the network or the
//! store.

mod categorizer;
mod cleaner;
mod extractor;

pub use categorizer::Categorizer;
pub use cleaner::{collapse_whitespace, Cleaner};
pub use extractor::{ExtractedContent, ExtractionRejection, Extractor};
