//! Markdown record export
//!
//! One section per event, preceded by a short run header.

use crate::config::OutputFormat;
use crate::extract::EventRecord;
use crate::output::json::file_host;
use crate::output::traits::{OutputBatch, OutputResult, OutputWriter};
use std::fmt::Write;

/// Writes `events_<host>_<timestamp>.md`
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownWriter;

impl OutputWriter for MarkdownWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }

    fn file_name(&self, batch: &OutputBatch<'_>) -> String {
        format!("events_{}_{}.md", file_host(batch), batch.timestamp())
    }

    fn render(&self, batch: &OutputBatch<'_>) -> OutputResult<String> {
        Ok(format_markdown(batch))
    }
}

/// Formats a batch as markdown
pub fn format_markdown(batch: &OutputBatch<'_>) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Event Harvest - {}\n\n", batch.timestamp()));
    md.push_str(&format!("- **Source URL**: {}\n", batch.source_url));
    md.push_str(&format!("- **Action**: {}\n", batch.action));
    md.push_str(&format!("- **Total Events**: {}\n", batch.records.len()));
    md.push_str(&format!(
        "- **Success Rate**: {:.1}% ({} / {})\n\n---\n\n",
        batch.report.success_rate, batch.report.succeeded, batch.report.processed_urls
    ));

    for record in batch.records {
        md.push_str(&format_event(record));
        md.push_str("\n---\n\n");
    }

    md
}

/// Formats one record as a markdown section
pub fn format_event(record: &EventRecord) -> String {
    let mut md = String::new();

    let _ = writeln!(md, "## {}\n", record.title);

    if let Some(venue) = &record.venue {
        let _ = writeln!(md, "- **Venue**: {}", venue);
    }

    match (record.start_date, &record.date_text) {
        (Some(date), _) => {
            let _ = writeln!(md, "- **Date**: {}", date.format("%Y-%m-%d"));
        }
        (None, Some(text)) => {
            let _ = writeln!(md, "- **Date**: {}", text);
        }
        (None, None) => {}
    }

    match (record.start_time, record.end_time) {
        (Some(start), Some(end)) => {
            let _ = writeln!(md, "- **Time**: {} - {}", start.format("%H:%M"), end.format("%H:%M"));
        }
        (Some(start), None) => {
            let _ = writeln!(md, "- **Time**: {}", start.format("%H:%M"));
        }
        _ => {}
    }

    match (record.price_value, &record.price_text) {
        (Some(value), _) => {
            let _ = writeln!(md, "- **Price**: {:.2} {}", value, record.currency);
        }
        (None, Some(text)) => {
            let _ = writeln!(md, "- **Price**: {}", text);
        }
        (None, None) => {}
    }

    if let Some(promoter) = &record.promoter {
        let _ = writeln!(md, "- **Promoter**: {}", promoter);
    }

    if !record.lineup.is_empty() {
        let _ = writeln!(md, "- **Lineup**: {}", record.lineup.join(", "));
    }

    let _ = writeln!(md, "- **Source**: <{}>", record.source_url);
    let _ = writeln!(md, "- **Extracted via**: {}", record.extraction_method);

    if let Some(description) = &record.description {
        let _ = writeln!(md, "\n{}", description);
    }

    md
}
