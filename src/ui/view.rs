use crate::core::orchestrator::{ScanPhase, ScanState};
use crate::core::report_builder::{build_report, RenderableReport};

pub const LOADING_MESSAGE: &str = "Scanning for vulnerabilities";

/// Target URL input. Disabled while a scan is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputForm {
    pub disabled: bool,
}

impl InputForm {
    pub fn for_phase(phase: ScanPhase) -> Self {
        Self {
            disabled: phase == ScanPhase::Scanning,
        }
    }

    pub fn button_label(&self) -> &'static str {
        if self.disabled {
            "Scanning..."
        } else {
            "Start Scan"
        }
    }

    /// Accepts the URL field's contents. Blank input never leaves the form.
    pub fn accept(&self, url_field: &str) -> Option<String> {
        let url = url_field.trim();
        if self.disabled || url.is_empty() {
            None
        } else {
            Some(url.to_string())
        }
    }
}

/// The one thing on screen for a given state.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Form(InputForm),
    Loading { message: &'static str },
    Report(RenderableReport),
    Error { message: String },
}

pub fn render(state: &ScanState) -> View {
    match state {
        ScanState::Idle => View::Form(InputForm::for_phase(ScanPhase::Idle)),
        ScanState::Scanning => View::Loading {
            message: LOADING_MESSAGE,
        },
        ScanState::Reported(report) => View::Report(build_report(report)),
        ScanState::Failed(err) => View::Error {
            message: err.message.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ScanError;
    use crate::core::model::ScanReport;
    use std::sync::Arc;

    #[test]
    fn each_state_maps_to_one_view() {
        assert_eq!(render(&ScanState::Idle), View::Form(InputForm { disabled: false }));
        assert_eq!(
            render(&ScanState::Scanning),
            View::Loading { message: LOADING_MESSAGE }
        );
        assert_eq!(
            render(&ScanState::Failed(ScanError::server_rejected("internal", Some(500)))),
            View::Error { message: "internal".to_string() }
        );

        let report = ScanReport {
            target_url: "http://t".to_string(),
            pages_crawled: 0,
            crawled_urls: Vec::new(),
            forms_found: Vec::new(),
            vulnerabilities: Vec::new(),
        };
        match render(&ScanState::Reported(Arc::new(report))) {
            View::Report(r) => assert!(r.healthy),
            other => panic!("expected report view, got {:?}", other),
        }
    }

    #[test]
    fn form_is_disabled_while_scanning() {
        let form = InputForm::for_phase(ScanPhase::Scanning);
        assert!(form.disabled);
        assert_eq!(form.button_label(), "Scanning...");
        assert_eq!(form.accept("http://t"), None);
    }

    #[test]
    fn blank_url_is_rejected_at_the_form() {
        let form = InputForm::for_phase(ScanPhase::Idle);
        assert_eq!(form.accept(""), None);
        assert_eq!(form.accept("   "), None);
        assert_eq!(form.accept(" http://t "), Some("http://t".to_string()));
    }
}
