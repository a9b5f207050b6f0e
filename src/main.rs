use clap::Parser;
use colored::*;
use serde_json::{Map, Value};
use std::process;

use websec_viewer::core::export::DEFAULT_EXPORT_FILE;
use websec_viewer::core::orchestrator::ScanPhase;
use websec_viewer::http::SCAN_PATH;
use websec_viewer::ui::{self, InputForm, View};
use websec_viewer::{
    parse_scan_options, ApiClient, ConsoleSink, ReportExport, ScanOrchestrator, ScanRequest,
    ViewerConfig,
};

#[derive(Parser, Debug)]
#[command(
    name = "websec",
    version,
    about = "Client for the WebSec XSS & SQL injection scanning service",
    override_usage = "websec <target> [options]",
    after_help = "\x1b[1;36mEXAMPLES:\x1b[0m
  Quick scan:                     websec http://target.com
  Against another service:        websec http://target.com --api-url http://scanner:5000
  Session cookie + page limit:    websec http://target.com --cookie \"sess=abc\" --max-pages 20
  Extra scan options:             websec http://target.com -O 'login={\"user\":\"admin\"}'
  Export summary + HTML report:   websec http://target.com --export --html report.html
  Service health:                 websec --health
  Dry-run test:                   websec http://target.com --dry-run"
)]
pub struct Args {
    #[arg(required_unless_present_any = ["health", "info"])]
    pub target: Option<String>,

    #[arg(long, help = "Base URL of the scan service (default: $WEBSEC_API_URL or http://localhost:5000)")]
    pub api_url: Option<String>,

    #[arg(long, help = "Request timeout in seconds [default: 300]")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Cookie header forwarded to the scanner")]
    pub cookie: Option<String>,

    #[arg(long, help = "Maximum number of pages the scanner should crawl")]
    pub max_pages: Option<u64>,

    #[arg(short = 'O', long = "option", help = "Extra scan option as key=value (value may be JSON)")]
    pub options: Vec<String>,

    #[arg(short = 'e', long, num_args = 0..=1, default_missing_value = DEFAULT_EXPORT_FILE,
        help = "Write a JSON summary of the report")]
    pub export: Option<String>,

    #[arg(long, help = "Write a self-contained HTML report")]
    pub html: Option<String>,

    #[arg(long, help = "Query GET /api/health and exit")]
    pub health: bool,

    #[arg(long, help = "Query GET / and exit")]
    pub info: bool,

    #[arg(long, help = "Show the scan request without sending it")]
    pub dry_run: bool,

    #[arg(short = 'v', long, default_value_t = false, help = "Show API traffic (Verbose Mode)")]
    pub verbose: bool,
}

impl Args {
    fn apply(&self, mut config: ViewerConfig) -> ViewerConfig {
        if let Some(ref url) = self.api_url {
            config.api_url = url.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeout_secs = timeout;
        }
        config.verbose = self.verbose;
        config.dry_run = self.dry_run;
        config.export_path = self.export.clone();
        config.html_report = self.html.clone();
        config
    }

    fn scan_options(&self) -> anyhow::Result<Map<String, Value>> {
        let mut options = parse_scan_options(&self.options)?;
        if let Some(ref cookie) = self.cookie {
            options.insert("cookie".to_string(), Value::String(cookie.clone()));
        }
        if let Some(max_pages) = self.max_pages {
            options.insert("max_pages".to_string(), Value::from(max_pages));
        }
        Ok(options)
    }
}

#[tokio::main]
async fn main() {
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.apply(ViewerConfig::from_env());

    let code = match run(&args, &config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", format!("[!] {}", e).red());
            1
        }
    };
    process::exit(code);
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

async fn run(args: &Args, config: &ViewerConfig) -> anyhow::Result<i32> {
    if args.health || args.info {
        let client = ApiClient::new(&config.api_url, config.timeout())?;
        let reply = if args.health { client.health().await } else { client.info().await };
        return Ok(match reply {
            Ok(value) => {
                println!("{}", serde_json::to_string_pretty(&value)?);
                0
            }
            Err(e) => {
                print!("{}", ui::render_text(&View::Error { message: e.message }));
                1
            }
        });
    }

    // Same guard as the interactive form: blank input never reaches the orchestrator.
    let raw_target = args.target.as_deref().unwrap_or("");
    let target = match InputForm::for_phase(ScanPhase::Idle).accept(raw_target) {
        Some(t) => t,
        None => anyhow::bail!("A target URL is required."),
    };
    let options = args.scan_options()?;

    if config.dry_run {
        let request = ScanRequest::new(&target, options)?;
        println!("[DRY RUN] Would scan target: {}", request.target_url());
        println!(
            "[DRY RUN] POST {}{} {}",
            config.api_url.trim_end_matches('/'),
            SCAN_PATH,
            request.to_body()
        );
        return Ok(0);
    }

    print_scan_config(&target, config);

    let client = ApiClient::new(&config.api_url, config.timeout())?;
    let orchestrator = ScanOrchestrator::new(client);
    orchestrator.subscribe(ConsoleSink::new_ref());

    let ticket = orchestrator.submit(&target, options)?;
    tokio::select! {
        _ = orchestrator.run(ticket) => {}
        _ = tokio::signal::ctrl_c() => {
            orchestrator.reset();
        }
    }

    let state = orchestrator.state();
    if state.phase() == ScanPhase::Idle {
        eprintln!("{}", "[!] Scan abandoned by user.".yellow());
        return Ok(130);
    }

    let view = ui::render(&state);
    print!("{}", ui::render_text(&view));

    match view {
        View::Report(report) => {
            if let Some(ref path) = config.export_path {
                ReportExport::new(&report).save(path)?;
                eprintln!("{}", format!("[+] Summary exported to {}", path).green());
            }
            if let Some(ref path) = config.html_report {
                let generated = chrono::Utc::now().to_rfc3339();
                std::fs::write(path, ui::generate_html_report(&report, &generated))?;
                eprintln!("{}", format!("[+] HTML report written to {}", path).green());
            }
            Ok(0)
        }
        _ => Ok(1),
    }
}

/// Prints the request summary before the scan starts.
fn print_scan_config(target: &str, config: &ViewerConfig) {
    eprintln!("{}", format!("[+] Target:     {}", target).green().bold());
    eprintln!("{}", format!("[+] Service:    {}", config.api_url).blue());
    eprintln!("{}", format!("[+] Timeout:    {}s", config.timeout_secs).blue());
    if let Some(ref path) = config.export_path {
        eprintln!("{}", format!("[+] Export:     {}", path).yellow());
    }
    if let Some(ref path) = config.html_report {
        eprintln!("{}", format!("[+] HTML:       {}", path).yellow());
    }
    eprintln!("{}", "──────────────────────────────────────────────────".dimmed());
}
