/// Self-contained HTML report for a rendered scan.
///
/// Produces a single .html file with embedded CSS, no external assets.
/// Sections mirror the terminal view: stat cards, forms, XSS, SQL injection
/// and the technical log.

use crate::core::model::Vulnerability;
use crate::core::report_builder::RenderableReport;

pub fn generate_html_report(report: &RenderableReport, generated_at: &str) -> String {
    let mut form_rows = String::new();
    for form in &report.forms {
        let action = if form.action.is_empty() { "(current page)" } else { form.action.as_str() };
        let params: String = form
            .inputs
            .iter()
            .map(|i| format!(
                r#"<span class="badge param">{} ({})</span>"#,
                html_escape(&i.name),
                html_escape(&i.field_type)
            ))
            .collect();
        form_rows.push_str(&format!(
            "<tr><td class=\"mono\">{}</td><td>{}</td><td><span class=\"badge method\">{}</span></td><td>{}</td></tr>",
            html_escape(&form.url),
            html_escape(action),
            html_escape(&form.method.to_string()),
            params,
        ));
    }

    let xss_rows: String = report.xss.iter().map(|v| finding_row(v, false)).collect();
    let sqli_rows: String = report.sql_injection.iter().map(|v| finding_row(v, true)).collect();

    let log_lines: String = report
        .log
        .iter()
        .map(|e| format!(
            "<div class=\"log {}\">{}</div>",
            e.level.as_str(),
            html_escape(&e.text)
        ))
        .collect();

    let forms_section = if report.forms.is_empty() {
        empty_state("No forms detected on the target.")
    } else {
        format!(
            "<table><thead><tr><th>URL</th><th>Action</th><th>Method</th><th>Parameters</th></tr></thead><tbody>{}</tbody></table>",
            form_rows
        )
    };
    let xss_section = if report.xss.is_empty() {
        empty_state("✓ No XSS vulnerabilities detected.")
    } else {
        format!(
            "<table><thead><tr><th>URL</th><th>Method</th><th>Payload</th><th>Severity</th></tr></thead><tbody>{}</tbody></table>",
            xss_rows
        )
    };
    let sqli_section = if report.sql_injection.is_empty() {
        empty_state("✓ No SQL injection vulnerabilities detected.")
    } else {
        format!(
            "<table><thead><tr><th>Type</th><th>URL</th><th>Method</th><th>Payload</th><th>Details</th><th>Severity</th></tr></thead><tbody>{}</tbody></table>",
            sqli_rows
        )
    };

    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>WebSec Scan Report</title>
<style>
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{ background: #0a0a0c; color: #e1e1e6; font-family: 'Inter', system-ui, sans-serif; padding: 2rem; }}
h1 {{ font-size: 1.5rem; font-weight: 700; margin-bottom: 0.5rem; }}
.target {{ color: #94949e; margin-bottom: 2rem; }}
.meta {{ display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 1rem; margin-bottom: 2rem; }}
.meta-card {{ background: rgba(255,255,255,0.035); border: 1px solid rgba(255,255,255,0.08); border-radius: 12px; padding: 1.25rem; }}
.meta-card .label {{ font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; color: #64647a; margin-bottom: 0.5rem; }}
.meta-card .value {{ font-size: 1.75rem; font-weight: 700; font-family: 'JetBrains Mono', monospace; }}
.value.critical {{ color: #f43f5e; }}
.value.success {{ color: #10b981; }}
table {{ width: 100%; border-collapse: collapse; font-size: 0.85rem; }}
thead th {{ text-align: left; padding: 0.75rem 1rem; border-bottom: 1px solid rgba(255,255,255,0.08); color: #64647a; font-size: 0.7rem; text-transform: uppercase; letter-spacing: 0.08em; }}
tbody td {{ padding: 0.75rem 1rem; border-bottom: 1px solid rgba(255,255,255,0.04); }}
.mono {{ font-family: 'JetBrains Mono', monospace; font-size: 0.8rem; }}
.badge {{ padding: 0.15rem 0.5rem; border-radius: 9999px; font-size: 0.7rem; font-weight: 700; text-transform: uppercase; background: rgba(255,255,255,0.06); }}
.sev-critical, .sev-high {{ background: rgba(244,63,94,0.1); color: #f43f5e; }}
.sev-medium {{ background: rgba(234,179,8,0.1); color: #eab308; }}
.sev-low {{ background: rgba(16,185,129,0.1); color: #10b981; }}
.panel {{ background: rgba(255,255,255,0.02); border: 1px solid rgba(255,255,255,0.08); border-radius: 12px; overflow: hidden; margin-bottom: 2rem; }}
.panel-header {{ padding: 1rem 1.25rem; border-bottom: 1px solid rgba(255,255,255,0.08); font-weight: 600; font-size: 0.85rem; }}
.empty {{ padding: 2rem; text-align: center; color: #10b981; }}
.logs {{ padding: 1rem 1.25rem; font-family: 'JetBrains Mono', monospace; font-size: 0.8rem; }}
.log.success {{ color: #10b981; }}
.log.warn {{ color: #eab308; }}
.log.error {{ color: #f43f5e; }}
footer {{ color: #64647a; font-size: 0.75rem; }}
</style>
</head>
<body>
<h1>Scan Report</h1>
<div class="target">Target URL: <span class="mono">{target}</span></div>

<div class="meta">
    <div class="meta-card"><div class="label">Pages Crawled</div><div class="value">{pages}</div></div>
    <div class="meta-card"><div class="label">Forms Found</div><div class="value">{forms}</div></div>
    <div class="meta-card"><div class="label">Vulnerabilities</div><div class="value {tone}">{vulns}</div></div>
</div>

<div class="panel"><div class="panel-header">Forms Detected</div>{forms_section}</div>
<div class="panel"><div class="panel-header">XSS Vulnerabilities</div>{xss_section}</div>
<div class="panel"><div class="panel-header">SQL Injection Vulnerabilities</div>{sqli_section}</div>
<div class="panel"><div class="panel-header">Technical Logs</div><div class="logs">{log_lines}</div></div>

<footer>Generated {generated}</footer>
</body>
</html>"#,
        target = html_escape(&report.target_url),
        pages = report.pages_crawled,
        forms = report.totals.forms,
        vulns = report.totals.vulnerabilities,
        tone = if report.healthy { "success" } else { "critical" },
        forms_section = forms_section,
        xss_section = xss_section,
        sqli_section = sqli_section,
        log_lines = log_lines,
        generated = html_escape(generated_at),
    )
}

fn finding_row(v: &Vulnerability, with_details: bool) -> String {
    let severity = format!(
        r#"<span class="badge sev-{}">{}</span>"#,
        v.severity.as_str().to_lowercase(),
        v.severity
    );
    let method = format!(r#"<span class="badge method">{}</span>"#, html_escape(&v.method.to_string()));
    let payload = format!(r#"<code class="mono">{}</code>"#, html_escape(&v.payload));

    if with_details {
        format!(
            "<tr><td>{}</td><td class=\"mono\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&v.vuln_type),
            html_escape(&v.url),
            method,
            payload,
            html_escape(v.description.as_deref().unwrap_or("")),
            severity,
        )
    } else {
        format!(
            "<tr><td class=\"mono\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&v.url),
            method,
            payload,
            severity,
        )
    }
}

fn empty_state(message: &str) -> String {
    format!(r#"<div class="empty">{}</div>"#, message)
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
