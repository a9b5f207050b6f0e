pub mod core;
pub mod http;
pub mod ui;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use crate::core::error::{ErrorCategory, ScanError};
pub use crate::core::export::ReportExport;
pub use crate::core::model::{FormDescriptor, ScanReport, ScanRequest, Severity, Vulnerability};
pub use crate::core::orchestrator::{ScanOrchestrator, ScanPhase, ScanState, SubmitRejected};
pub use crate::core::report_builder::{build_report, RenderableReport};
pub use crate::http::{ApiClient, ApiRequest, Gateway};

pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration shared by the binary and library callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerConfig {
    pub api_url: String,
    pub timeout_secs: u64,
    pub verbose: bool,
    pub dry_run: bool,
    pub export_path: Option<String>,
    pub html_report: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout_secs: crate::http::client::DEFAULT_TIMEOUT.as_secs(),
            verbose: false,
            dry_run: false,
            export_path: None,
            html_report: None,
        }
    }
}

impl ViewerConfig {
    /// Reads the service base URL from `WEBSEC_API_URL`, then `REACT_APP_API_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let api_url = ["WEBSEC_API_URL", "REACT_APP_API_URL"]
            .iter()
            .filter_map(|key| lookup(key))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Self {
            api_url,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Builds the scan option bag from `key=value` pairs.
/// Values that parse as JSON keep their type, anything else is sent as a string.
pub fn parse_scan_options(raw: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut options = Map::new();
    for item in raw {
        let mut parts = item.splitn(2, '=');
        let key = parts.next().unwrap_or("").trim();
        if key.is_empty() {
            anyhow::bail!("Invalid option '{}': expected key=value", item);
        }
        let raw_value = parts.next().unwrap_or("").trim();
        let value = serde_json::from_str(raw_value)
            .unwrap_or_else(|_| Value::String(raw_value.to_string()));
        options.insert(key.to_string(), value);
    }
    Ok(options)
}

/// Output abstraction for the viewer.
/// The orchestrator calls `on_state` after every transition.
pub trait ScanEventSink: Send + Sync {
    fn on_state(&self, state: &ScanState);
}

pub type SinkRef = Arc<dyn ScanEventSink>;

/// Terminal sink: colored log lines and a spinner while a scan is in flight.
pub struct ConsoleSink {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new_ref() -> SinkRef {
        Arc::new(Self {
            spinner: Mutex::new(None),
        })
    }

    fn log(&self, level: &str, message: &str) {
        use colored::*;
        let colored = match level {
            "success" => message.green().to_string(),
            "error" => message.red().to_string(),
            "warn" => message.yellow().to_string(),
            _ => message.to_string(),
        };
        eprintln!("{}", colored);
    }

    fn stop_spinner(&self) {
        if let Ok(mut slot) = self.spinner.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ScanEventSink for ConsoleSink {
    fn on_state(&self, state: &ScanState) {
        match state {
            ScanState::Scanning => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}") {
                    pb.set_style(style);
                }
                pb.set_message("Scanning for vulnerabilities... this may take a few moments");
                pb.enable_steady_tick(Duration::from_millis(120));
                if let Ok(mut slot) = self.spinner.lock() {
                    if let Some(old) = slot.replace(pb) {
                        old.finish_and_clear();
                    }
                }
            }
            ScanState::Reported(report) => {
                self.stop_spinner();
                self.log(
                    "success",
                    &format!(
                        "[+] Scan completed: {} finding(s) on {}",
                        report.vulnerabilities.len(),
                        report.target_url
                    ),
                );
            }
            ScanState::Failed(err) => {
                self.stop_spinner();
                self.log("error", &format!("[!] Scan failed ({})", err.category));
            }
            ScanState::Idle => self.stop_spinner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn env_lookup_prefers_websec_variable() {
        let config = ViewerConfig::from_lookup(|key| match key {
            "WEBSEC_API_URL" => Some("http://scanner:8000".to_string()),
            "REACT_APP_API_URL" => Some("http://legacy:5000".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url, "http://scanner:8000");
        assert_eq!(config.timeout_secs, 300);
    }

    #[test]
    fn env_lookup_falls_back_to_local_default() {
        let config = ViewerConfig::from_lookup(|key| match key {
            "WEBSEC_API_URL" => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn options_keep_json_types() {
        let raw = vec![
            "max_pages=5".to_string(),
            "cookie=sess=abc".to_string(),
            "login={\"user\":\"admin\"}".to_string(),
        ];
        let options = parse_scan_options(&raw).unwrap();
        assert_eq!(options["max_pages"], json!(5));
        assert_eq!(options["cookie"], json!("sess=abc"));
        assert_eq!(options["login"], json!({ "user": "admin" }));
    }

    #[test]
    fn options_without_key_are_rejected() {
        assert!(parse_scan_options(&["=5".to_string()]).is_err());
    }
}
