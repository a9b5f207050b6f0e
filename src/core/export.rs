/// Downloadable summary of a rendered report.
///
/// Only the target, a timestamp and the aggregate counts are written, not the
/// findings themselves. Files are written atomically (tmp + rename).

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::report_builder::RenderableReport;

pub const DEFAULT_EXPORT_FILE: &str = "scan_report.json";

const SUMMARY_NOTE: &str = "Summary only. Use the HTML report for the full list of findings.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub forms: usize,
    pub xss: usize,
    pub sqli: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportExport {
    pub url: String,
    pub timestamp: String,
    pub stats: ExportStats,
    pub note: String,
}

impl ReportExport {
    pub fn new(report: &RenderableReport) -> Self {
        Self::at(report, Utc::now())
    }

    pub fn at(report: &RenderableReport, when: DateTime<Utc>) -> Self {
        Self {
            url: report.target_url.clone(),
            timestamp: when.to_rfc3339_opts(SecondsFormat::Millis, true),
            stats: ExportStats {
                forms: report.totals.forms,
                xss: report.xss.len(),
                sqli: report.sql_injection.len(),
            },
            note: SUMMARY_NOTE.to_string(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}
