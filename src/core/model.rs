use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use url::Url;

use crate::core::error::ScanError;
use crate::core::VulnerabilityClass;

const UNSPECIFIED_SCAN_FAILURE: &str = "The scan service reported an unspecified error";

/// What the user asked to scan. Built once per submission and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    target_url: String,
    options: Map<String, Value>,
}

impl ScanRequest {
    /// Validates the target as an absolute URL. Options are kept as given.
    pub fn new(target_url: &str, options: Map<String, Value>) -> Result<Self, ScanError> {
        let target_url = target_url.trim();
        if target_url.is_empty() {
            return Err(ScanError::request_invalid("URL is required"));
        }
        Url::parse(target_url).map_err(|e| {
            ScanError::request_invalid(format!("Invalid target URL '{}': {}", target_url, e))
        })?;

        Ok(Self {
            target_url: target_url.to_string(),
            options,
        })
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    /// Wire body for `POST /api/scan`: `{ url, ...options }`.
    /// The validated target always wins over an `url` key smuggled into the options.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("url".to_string(), Value::String(self.target_url.clone()));
        for (key, value) in &self.options {
            if key != "url" {
                body.insert(key.clone(), value.clone());
            }
        }
        Value::Object(body)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            _ => Err(format!("unknown severity '{}'", s)),
        }
    }
}

impl Serialize for Severity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// HTTP verb reported by the scanner for a form or a finding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Other(String),
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Other(m) => write!(f, "{}", m),
        }
    }
}

impl From<&str> for HttpMethod {
    fn from(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();
        match upper.as_str() {
            "GET" | "" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            _ => HttpMethod::Other(upper),
        }
    }
}

impl Serialize for HttpMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(HttpMethod::from(raw.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default = "default_field_type")]
    pub field_type: String,
}

fn default_field_type() -> String {
    "text".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescriptor {
    #[serde(default)]
    pub url: String,
    /// Empty means the form posts back to the page it was found on.
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub inputs: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub url: String,
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default)]
    pub payload: String,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Vulnerability {
    pub fn class(&self) -> VulnerabilityClass {
        VulnerabilityClass::of(&self.vuln_type)
    }
}

/// Results of one scan as reported by the remote service.
///
/// `pages_crawled` and `crawled_urls` come from the service independently and
/// are not cross-checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub target_url: String,
    #[serde(default)]
    pub pages_crawled: u64,
    #[serde(default)]
    pub crawled_urls: Vec<String>,
    pub forms_found: Vec<FormDescriptor>,
    pub vulnerabilities: Vec<Vulnerability>,
}

impl ScanReport {
    /// Checks the `results` object against the report schema.
    pub fn from_payload(payload: Value) -> Result<Self, ScanError> {
        serde_json::from_value(payload)
            .map_err(|e| ScanError::request_invalid(format!("Malformed scan report: {}", e)))
    }
}

/// Interprets the `POST /api/scan` envelope.
///
/// A 200 reply can still carry `success: false`; that is reported as a server
/// rejection without an HTTP status.
pub fn parse_scan_response(payload: Value) -> Result<ScanReport, ScanError> {
    let success = payload.get("success").and_then(Value::as_bool).unwrap_or(false);
    if !success {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNSPECIFIED_SCAN_FAILURE);
        return Err(ScanError::server_rejected(message, None));
    }

    match payload {
        Value::Object(mut envelope) => match envelope.remove("results") {
            Some(results) => ScanReport::from_payload(results),
            None => Err(ScanError::request_invalid(
                "Malformed scan report: missing field `results`",
            )),
        },
        _ => Err(ScanError::request_invalid("Malformed scan report: expected an object")),
    }
}
