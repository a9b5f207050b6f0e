use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + len {
                return;
            }
        }
    }
}

/// Fake scan service answering a single request.
fn serve_once(status_line: &'static str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{}", addr)
}

fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

const SCAN_OK: &str = r#"{"success":true,"results":{"target_url":"http://t","pages_crawled":2,"crawled_urls":["http://t/","http://t/a"],"forms_found":[{"url":"http://t/a","action":"","method":"get","inputs":[{"name":"q","type":"text"}]}],"vulnerabilities":[{"type":"XSS","url":"http://t/a","method":"GET","payload":"<script>","severity":"HIGH"}]}}"#;

/// Single target with --dry-run should print the dry-run message and exit 0.
#[test]
fn test_single_target_dry_run() {
    cargo_bin_cmd!("websec")
        .args(&["http://example.com", "--dry-run", "--max-pages", "20"])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY RUN] Would scan target: http://example.com"))
        .stdout(predicate::str::contains("\"max_pages\":20"));
}

/// Running with no arguments should fail (clap requires a target unless --health/--info).
#[test]
fn test_no_args_shows_error() {
    cargo_bin_cmd!("websec")
        .assert()
        .failure();
}

/// A blank target is refused before any request is made.
#[test]
fn test_blank_target_is_rejected() {
    cargo_bin_cmd!("websec")
        .args(&["   ", "--api-url", &closed_port_url()])
        .env("NO_COLOR", "1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("A target URL is required."));
}

#[test]
fn test_unreachable_service_reports_no_response() {
    cargo_bin_cmd!("websec")
        .args(&["http://example.com", "--api-url", &closed_port_url()])
        .env("NO_COLOR", "1")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No response from server"));
}

#[test]
fn test_server_error_message_is_shown() {
    let api = serve_once("500 Internal Server Error", r#"{"error":"internal"}"#);
    cargo_bin_cmd!("websec")
        .args(&["http://example.com", "--api-url", &api])
        .env("NO_COLOR", "1")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Scan Error"))
        .stdout(predicate::str::contains("internal"));
}

#[test]
fn test_report_with_exports() {
    let api = serve_once("200 OK", SCAN_OK);
    let dir = tempfile::tempdir().unwrap();
    let export = dir.path().join("summary.json");
    let html = dir.path().join("report.html");

    cargo_bin_cmd!("websec")
        .args(&[
            "http://t",
            "--api-url",
            &api,
            "--export",
            export.to_str().unwrap(),
            "--html",
            html.to_str().unwrap(),
        ])
        .env("NO_COLOR", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Target URL: http://t"))
        .stdout(predicate::str::contains("No SQL injection vulnerabilities detected."))
        .stdout(predicate::str::contains("[!] XSS → http://t/a"));

    let summary: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(summary["url"], "http://t");
    assert_eq!(summary["stats"]["forms"], 1);
    assert_eq!(summary["stats"]["xss"], 1);
    assert_eq!(summary["stats"]["sqli"], 0);

    let page = std::fs::read_to_string(&html).unwrap();
    assert!(page.contains("&lt;script&gt;"));
}

#[test]
fn test_health_passes_json_through() {
    let api = serve_once("200 OK", r#"{"status":"healthy"}"#);
    cargo_bin_cmd!("websec")
        .args(&["--health", "--api-url", &api])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\": \"healthy\""));
}
