//! JSON record export

use crate::config::{Action, OutputFormat};
use crate::extract::EventRecord;
use crate::output::traits::{OutputBatch, OutputResult, OutputWriter};
use crate::state::RunReport;
use crate::url::{extract_host, host_slug};
use serde::Serialize;

#[derive(Serialize)]
struct JsonDocument<'a> {
    events: &'a [EventRecord],
    source_url: &'a str,
    action: Action,
    report: &'a RunReport,
}

/// Writes `events_<host>_<timestamp>.json`
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self) -> OutputFormat {
        OutputFormat::Json
    }

    fn file_name(&self, batch: &OutputBatch<'_>) -> String {
        format!("events_{}_{}.json", file_host(batch), batch.timestamp())
    }

    fn render(&self, batch: &OutputBatch<'_>) -> OutputResult<String> {
        let document = JsonDocument {
            events: batch.records,
            source_url: batch.source_url.as_str(),
            action: batch.action,
            report: batch.report,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

pub(crate) fn file_host(batch: &OutputBatch<'_>) -> String {
    extract_host(batch.source_url)
        .map(|host| host_slug(&host))
        .unwrap_or_else(|| "unknown".to_string())
}
