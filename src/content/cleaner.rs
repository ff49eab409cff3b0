//! Text normalization applied to every extracted title and body

use once_cell::sync::Lazy;
use regex::Regex;

/// Any whitespace run that contains a line break
static LINE_BREAK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]*\n\s*").expect("valid line break pattern"));

/// Horizontal whitespace runs
static SPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\S\n]+").expect("valid space pattern"));

/// Collapses whitespace and strips a denylist of boilerplate substrings
#[derive(Debug, Clone)]
pub struct Cleaner {
    boilerplate: Option<Regex>,
}

impl Cleaner {
    /// Builds a cleaner from a list of literal boilerplate phrases
    ///
    /// Phrases are matched case-insensitively and may contain regex
    /// metacharacters; they are escaped before compilation.
    pub fn new(boilerplate: &[String]) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = boilerplate
            .iter()
            .map(|phrase| phrase.trim())
            .filter(|phrase| !phrase.is_empty())
            .map(regex::escape)
            .collect();

        let boilerplate = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("(?i)(?:{})", alternatives.join("|")))?)
        };

        Ok(Self { boilerplate })
    }

    /// Cleans a block of text
    ///
    /// Boilerplate goes first so that removing it never leaves a double space.
    pub fn clean(&self, text: &str) -> String {
        let stripped = match &self.boilerplate {
            Some(re) => re.replace_all(text, " "),
            None => text.into(),
        };

        collapse_whitespace(&stripped)
    }
}

/// Collapses whitespace runs to a single newline (if the run spans lines) or
/// a single space, and trims both ends
pub fn collapse_whitespace(text: &str) -> String {
    let lines = LINE_BREAK_RUN.replace_all(text, "\n");
    SPACE_RUN.replace_all(&lines, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner(phrases: &[&str]) -> Cleaner {
        let phrases: Vec<String> = phrases.iter().map(|p| p.to_string()).collect();
        Cleaner::new(&phrases).unwrap()
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_whitespace("  a \t  b  "), "a b");
    }

    #[test]
    fn test_collapse_line_breaks() {
        assert_eq!(collapse_whitespace("first  \n\n   \n second"), "first\nsecond");
    }

    #[test]
    fn test_strips_boilerplate_case_insensitively() {
        let c = cleaner(&["All rights reserved", "Back to top"]);
        assert_eq!(
            c.clean("Once upon a time. ALL RIGHTS RESERVED. back to top"),
            "Once upon a time. ."
        );
    }

    #[test]
    fn test_escapes_metacharacters() {
        let c = cleaner(&["(c) 2024", "©"]);
        assert_eq!(c.clean("story (c) 2024 end ©"), "story end");
        assert_eq!(c.clean("c 2024"), "c 2024");
    }

    #[test]
    fn test_empty_denylist() {
        let c = cleaner(&["", "  "]);
        assert_eq!(c.clean(" plain   text "), "plain text");
    }

    #[test]
    fn test_cjk_phrases() {
        let c = cleaner(&["返回首页"]);
        assert_eq!(c.clean("很久以前 返回首页"), "很久以前");
    }
}
