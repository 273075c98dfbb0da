//! Markdown rendering
//!
//! This module formats analysis results and scrape reports as markdown, for
//! pasting into issues or READMEs.

use crate::output::stats::ScrapeReport;
use crate::output::MetricsRecord;

/// Formats records as a markdown table with linked repository names
///
/// # Arguments
///
/// * `records` - The records to render, in display order
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_table(records: &[&MetricsRecord]) -> String {
    let mut md = String::new();

    md.push_str("| Repository | Stars | Forks | Watchers |\n");
    md.push_str("|------------|------:|------:|---------:|\n");

    for record in records {
        md.push_str(&format!(
            "| [{}]({}) | {} | {} | {} |\n",
            escape_cell(&record.repository.to_string()),
            record.url,
            record.stars,
            record.forks,
            record.watchers
        ));
    }

    md
}

/// Formats a scrape report as a markdown summary
pub fn format_markdown_report(report: &ScrapeReport) -> String {
    let mut md = String::new();

    md.push_str("# Awesome-Metrics Scrape Summary\n\n");
    md.push_str(&format!("- **Source**: {}\n", report.source_url));
    md.push_str(&format!("- **Output**: {}\n", report.output_path.display()));
    md.push_str(&format!("- **Outcome**: {}\n", report.outcome));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds\n\n",
        report.elapsed.as_secs_f64()
    ));

    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Discovered | {} |\n", report.discovered));
    md.push_str(&format!("| Already collected | {} |\n", report.skipped));
    md.push_str(&format!("| Collected | {} |\n", report.collected));
    md.push_str(&format!("| Not found | {} |\n", report.failures.not_found));
    md.push_str(&format!(
        "| Rate limited | {} |\n",
        report.failures.rate_limited
    ));
    md.push_str(&format!("| Network errors | {} |\n", report.failures.transient));
    md.push_str(&format!(
        "| Malformed responses | {} |\n",
        report.failures.malformed
    ));

    md
}

/// Escapes characters that would break a table cell
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
