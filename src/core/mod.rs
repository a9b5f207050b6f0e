pub mod error;
pub mod export;
pub mod model;
pub mod orchestrator;
pub mod report_builder;

use serde::Serialize;

/// The two buckets a reported finding is filed under.
///
/// Only the exact type `"XSS"` is cross-site scripting. Everything else the
/// service reports (`SQLi-Error`, `SQLi-Boolean`, ...) is SQL injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VulnerabilityClass {
    Xss,
    SqlInjection,
}

impl VulnerabilityClass {
    pub fn of(vuln_type: &str) -> Self {
        if vuln_type == "XSS" {
            VulnerabilityClass::Xss
        } else {
            VulnerabilityClass::SqlInjection
        }
    }
}

impl std::fmt::Display for VulnerabilityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VulnerabilityClass::Xss => write!(f, "XSS"),
            VulnerabilityClass::SqlInjection => write!(f, "SQL Injection"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_exact_match() {
        assert_eq!(VulnerabilityClass::of("XSS"), VulnerabilityClass::Xss);
        assert_eq!(VulnerabilityClass::of("xss"), VulnerabilityClass::SqlInjection);
        assert_eq!(VulnerabilityClass::of("SQLi-Boolean"), VulnerabilityClass::SqlInjection);
        assert_eq!(VulnerabilityClass::of(""), VulnerabilityClass::SqlInjection);
    }
}
