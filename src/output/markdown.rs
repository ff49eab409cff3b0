//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of a crawl run,
//! including the outcome breakdown and the category aggregate.

use crate::output::traits::{CrawlSummary, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from a crawl summary
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# id-sweep Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Run ID**: {}\n", summary.run_id));
    md.push_str(&format!(
        "- **Id Range**: {}..={} ({} ids)\n",
        summary.start_id,
        summary.end_id,
        summary.total_targets()
    ));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at));
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status));
    md.push_str(&format!("- **Config Hash**: {}\n\n", summary.config_hash));

    // Outcomes
    md.push_str("## Outcomes\n\n");
    md.push_str("| Outcome | Count |\n");
    md.push_str("|---------|-------|\n");
    md.push_str(&format!("| Stored | {} |\n", summary.stored));
    md.push_str(&format!("| Empty | {} |\n", summary.empty));
    md.push_str(&format!("| Failed | {} |\n", summary.failed));
    md.push_str(&format!("| Skipped | {} |\n", summary.skipped));
    md.push_str(&format!("| Not Attempted | {} |\n\n", summary.not_attempted));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}% of {} attempted\n\n",
        summary.success_rate(),
        summary.attempted
    ));

    // Store contents
    md.push_str("## Document Store\n\n");
    md.push_str(&format!(
        "- **Total Documents**: {}\n",
        summary.total_documents
    ));
    if let Some(words) = &summary.word_counts {
        md.push_str(&format!(
            "- **Length**: avg {:.1}, min {}, max {} chars\n",
            words.average, words.min, words.max
        ));
    }
    md.push('\n');

    if !summary.categories.is_empty() {
        md.push_str("## Categories\n\n");
        md.push_str("| Category | Documents |\n");
        md.push_str("|----------|-----------|\n");
        for entry in &summary.categories {
            md.push_str(&format!("| {} | {} |\n", entry.category, entry.count));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::CategoryCount;
    use tempfile::tempdir;

    fn create_test_summary() -> CrawlSummary {
        let mut summary = CrawlSummary::new();
        summary.run_id = 1;
        summary.started_at = "2024-01-01T00:00:00Z".to_string();
        summary.finished_at = Some("2024-01-01T01:00:00Z".to_string());
        summary.duration_seconds = Some(3600);
        summary.status = "completed".to_string();
        summary.config_hash = "abc123".to_string();
        summary.start_id = 1;
        summary.end_id = 100;
        summary.attempted = 100;
        summary.stored = 90;
        summary.empty = 6;
        summary.failed = 4;
        summary.total_documents = 90;
        summary.categories = vec![CategoryCount {
            category: "fable".to_string(),
            count: 90,
        }];
        summary
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&create_test_summary());

        assert!(markdown.contains("# id-sweep Crawl Summary"));
        assert!(markdown.contains("Run ID"));
        assert!(markdown.contains("| Stored | 90 |"));
        assert!(markdown.contains("| fable | 90 |"));
        assert!(markdown.contains("90.00%"));
    }

    #[test]
    fn test_no_category_section_when_empty() {
        let mut summary = create_test_summary();
        summary.categories.clear();
        assert!(!format_markdown_summary(&summary).contains("## Categories"));
    }

    #[test]
    fn test_generate_markdown_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reports").join("summary.md");

        generate_markdown_summary(&create_test_summary(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# id-sweep Crawl Summary"));
    }
}
