use serde::Serialize;

use crate::core::model::{FormDescriptor, ScanReport, Vulnerability};
use crate::core::VulnerabilityClass;

/// Severity tone of a technical log line. Matches the sink levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Success,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Success => "success",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub level: LogLevel,
    pub text: String,
}

impl LogEntry {
    fn new(level: LogLevel, text: impl Into<String>) -> Self {
        Self { level, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub forms: usize,
    pub vulnerabilities: usize,
}

/// Render-ready view of a [`ScanReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderableReport {
    pub target_url: String,
    pub pages_crawled: u64,
    pub crawled_urls: Vec<String>,
    pub forms: Vec<FormDescriptor>,
    pub xss: Vec<Vulnerability>,
    pub sql_injection: Vec<Vulnerability>,
    pub totals: Totals,
    /// Display tone only: nothing was found.
    pub healthy: bool,
    pub log: Vec<LogEntry>,
}

/// Groups findings by class and derives counts and the technical log.
pub fn build_report(report: &ScanReport) -> RenderableReport {
    let (xss, sql_injection): (Vec<Vulnerability>, Vec<Vulnerability>) = report
        .vulnerabilities
        .iter()
        .cloned()
        .partition(|v| v.class() == VulnerabilityClass::Xss);

    RenderableReport {
        target_url: report.target_url.clone(),
        pages_crawled: report.pages_crawled,
        crawled_urls: report.crawled_urls.clone(),
        forms: report.forms_found.clone(),
        xss,
        sql_injection,
        totals: Totals {
            forms: report.forms_found.len(),
            vulnerabilities: report.vulnerabilities.len(),
        },
        healthy: report.vulnerabilities.is_empty(),
        log: technical_log(report),
    }
}

fn technical_log(report: &ScanReport) -> Vec<LogEntry> {
    let mut log = Vec::with_capacity(report.crawled_urls.len() + report.vulnerabilities.len() + 5);

    log.push(LogEntry::new(
        LogLevel::Success,
        format!("[✓] Scan started on {}", report.target_url),
    ));
    log.push(LogEntry::new(
        LogLevel::Info,
        format!("[@] Pages crawled: {}", report.pages_crawled),
    ));
    for url in &report.crawled_urls {
        log.push(LogEntry::new(LogLevel::Info, format!("  → {}", url)));
    }
    log.push(LogEntry::new(
        LogLevel::Info,
        format!("[@] Forms analysed: {}", report.forms_found.len()),
    ));

    if report.vulnerabilities.is_empty() {
        log.push(LogEntry::new(LogLevel::Success, "[✓] No vulnerabilities detected"));
    } else {
        log.push(LogEntry::new(
            LogLevel::Warn,
            format!("[!] Vulnerabilities detected: {}", report.vulnerabilities.len()),
        ));
        for v in &report.vulnerabilities {
            log.push(LogEntry::new(
                LogLevel::Error,
                format!("[!] {} → {}", v.vuln_type, v.url),
            ));
        }
    }

    log.push(LogEntry::new(LogLevel::Success, "[✓] Scan completed successfully"));
    log
}
