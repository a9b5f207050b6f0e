use colored::*;

use crate::core::model::{FormDescriptor, Vulnerability};
use crate::core::report_builder::{LogLevel, RenderableReport};
use crate::ui::view::View;

const RULE: &str = "──────────────────────────────────────────────────";

/// Terminal rendering of a [`View`].
pub fn render_text(view: &View) -> String {
    match view {
        View::Form(form) => format!(
            "{}\r\nEnter the target URL to detect potential security vulnerabilities. [{}]\r\n",
            "Start New Scan".bright_white().bold(),
            form.button_label()
        ),
        View::Loading { message } => format!("{}\r\n", format!("[*] {}...", message).bright_cyan()),
        View::Error { message } => format!(
            "\r\n{}\r\n{}\r\n",
            "[!] Scan Error".red().bold(),
            message.red()
        ),
        View::Report(report) => render_report(report),
    }
}

fn render_report(report: &RenderableReport) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push_str("\r\n");
    };

    line(String::new());
    line("Scan Report".bright_white().bold().to_string());
    line(format!("Target URL: {}", report.target_url.bright_cyan()));
    let vuln_count = report.totals.vulnerabilities.to_string();
    line(format!(
        "Pages crawled: {}  |  Forms found: {}  |  Vulnerabilities: {}",
        report.pages_crawled.to_string().bold(),
        report.totals.forms.to_string().bold(),
        if report.healthy { vuln_count.green().bold() } else { vuln_count.red().bold() }
    ));
    line(RULE.dimmed().to_string());

    line("Forms Detected".bright_cyan().bold().to_string());
    if report.forms.is_empty() {
        line("  No forms detected on the target.".dimmed().to_string());
    } else {
        for form in &report.forms {
            line(form_row(form));
        }
    }

    line("XSS Vulnerabilities".bright_cyan().bold().to_string());
    if report.xss.is_empty() {
        line("  ✓ No XSS vulnerabilities detected.".green().to_string());
    } else {
        for v in &report.xss {
            line(finding_row(v, false));
        }
    }

    line("SQL Injection Vulnerabilities".bright_cyan().bold().to_string());
    if report.sql_injection.is_empty() {
        line("  ✓ No SQL injection vulnerabilities detected.".green().to_string());
    } else {
        for v in &report.sql_injection {
            line(finding_row(v, true));
        }
    }

    line("Technical Logs".bright_cyan().bold().to_string());
    for entry in &report.log {
        let text = format!("  {}", entry.text);
        line(match entry.level {
            LogLevel::Success => text.green().to_string(),
            LogLevel::Warn => text.yellow().to_string(),
            LogLevel::Error => text.red().to_string(),
            LogLevel::Info => text,
        });
    }
    line(RULE.dimmed().to_string());

    out
}

fn form_row(form: &FormDescriptor) -> String {
    let action = if form.action.is_empty() { "(current page)" } else { form.action.as_str() };
    let params = form
        .inputs
        .iter()
        .map(|i| format!("{} ({})", i.name, i.field_type))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "  {}  action: {}  [{}]  params: {}",
        form.url,
        action,
        form.method.to_string().blue(),
        if params.is_empty() { "-".to_string() } else { params }
    )
}

fn finding_row(v: &Vulnerability, with_type: bool) -> String {
    let mut row = format!("  [{}] ", v.severity.to_string().red().bold());
    if with_type {
        row.push_str(&format!("{} ", v.vuln_type.bold()));
    }
    row.push_str(&format!(
        "{} {}  payload: {}",
        v.method.to_string().blue(),
        v.url,
        v.payload.bright_yellow()
    ));
    if with_type {
        if let Some(ref description) = v.description {
            row.push_str(&format!("  details: {}", description));
        }
    }
    row
}
