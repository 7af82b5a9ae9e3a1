//! openclaw-gate CLI - admission policy for an intercepting HTTPS proxy

use clap::{Parser, Subcommand};
use hyper::Uri;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use openclaw_gate::policy::write_guard::GMAIL_API_PREFIX;
use openclaw_gate::{
    AuditEntry, AuditLogger, Config, Decision, PolicyEngine, ReloadWatcher, RequestHook,
    RequestInfo, TracingSink, Verdict, WriteGuard,
};

#[derive(Parser)]
#[command(name = "openclaw-gate")]
#[command(about = "Request-admission policy for an intercepting HTTPS proxy")]
#[command(version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); overrides the config
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a single request; exits 1 when it would be blocked
    Check {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Domains CSV (overrides config)
        #[arg(long)]
        domains: Option<PathBuf>,

        /// HTTP method
        method: String,

        /// Absolute request URL
        url: String,
    },

    /// Answer `METHOD URL` lines on stdin with one JSON decision per line
    Serve {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Domains CSV (overrides config)
        #[arg(long)]
        domains: Option<PathBuf>,
    },

    /// Validate a configuration file
    ValidateConfig {
        /// Path to configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Print the Gmail write-guard rule table
    ListRules {
        /// API prefix the table is compiled under
        #[arg(long, default_value = GMAIL_API_PREFIX)]
        prefix: String,
    },
}

/// One line of `serve` output
#[derive(Serialize)]
struct DecisionLine<'a> {
    method: &'a str,
    url: String,
    verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'static str>,
}

impl<'a> DecisionLine<'a> {
    fn new(decision: &Decision<'a>) -> Self {
        let rejection = decision.rejection();
        Self {
            method: decision.request.method,
            url: decision.request.full_url(),
            verdict: decision.verdict,
            status: rejection.map(|r| r.status.as_u16()),
            reason: rejection.map(|r| r.reason),
            body: rejection.map(|r| r.body),
        }
    }
}

fn load_config(path: Option<&Path>, domains: Option<PathBuf>) -> openclaw_gate::Result<Config> {
    let mut cfg = match path {
        Some(p) => Config::from_file(p)?,
        None => Config::parse("")?,
    };
    if let Some(domains) = domains {
        cfg.allowlist.domains_file = domains;
    }
    Ok(cfg)
}

/// Logged once the subscriber is up, since the config decides its level.
fn log_config_source(path: Option<&Path>) {
    match path {
        Some(p) => tracing::info!(path = %p.display(), "Loaded configuration"),
        None => tracing::info!("Using default configuration"),
    }
}

fn print_rules(guard: &WriteGuard) {
    for (i, rule) in guard.rules().iter().enumerate() {
        println!(
            "  {}. {:?} {} ({})",
            i + 1,
            rule.exactness(),
            rule.pattern(),
            rule.regex()
        );
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Split a `METHOD URL` line. A URL that does not parse leaves the host
/// empty, which the allow-list rejects.
fn parse_request_line(line: &str) -> Option<(&str, Uri)> {
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let uri = parts
        .next()
        .and_then(|u| u.parse::<Uri>().ok())
        .unwrap_or_default();
    Some((method, uri))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            config,
            domains,
            method,
            url,
        } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            let cfg = load_config(config.as_deref(), domains)?;
            log_config_source(config.as_deref());
            let engine = PolicyEngine::from_config(&cfg)?;

            let uri: Uri = url
                .parse()
                .map_err(|e| openclaw_gate::Error::invalid_url(format!("{}: {}", url, e)))?;
            let request = RequestInfo::from_uri(&method, &uri);
            let decision = engine.evaluate(&request);

            println!("{}", AuditEntry::from_decision(&decision).summary());
            if let Some(rejection) = decision.rejection() {
                println!("  Status: {}", rejection.status.as_u16());
                println!("  Reason: {}", rejection.reason);
                println!("  Body: {}", rejection.body);
                std::process::exit(1);
            }
        }

        Commands::Serve { config, domains } => {
            let cfg = load_config(config.as_deref(), domains)?;
            init_logging(cli.log_level.as_deref().unwrap_or(&cfg.logging.level));
            log_config_source(config.as_deref());

            let engine = Arc::new(PolicyEngine::from_config(&cfg)?);
            let mut hook = RequestHook::new(engine.clone())
                .with_request_logging(
                    cfg.logging.log_allowed_requests,
                    cfg.logging.log_blocked_requests,
                )
                .with_sink(Arc::new(TracingSink));

            if let Some(ref audit_path) = cfg.logging.audit_log {
                match AuditLogger::open(audit_path, cfg.logging.audit_format) {
                    Ok(logger) => {
                        tracing::info!(path = %audit_path.display(), "Audit log enabled");
                        hook = hook.with_sink(Arc::new(logger));
                    }
                    Err(e) => {
                        eprintln!(
                            "Error: Failed to open audit log '{}': {}",
                            audit_path.display(),
                            e
                        );
                        std::process::exit(1);
                    }
                }
            }

            let watcher = ReloadWatcher::from_config(engine.allowlist().clone(), &cfg.allowlist);
            let _reload_trigger = watcher.trigger();
            watcher.spawn();

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = tokio::io::stdout();

            loop {
                let line = tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Shutting down...");
                        break;
                    }
                    line = lines.next_line() => line?,
                };
                let Some(line) = line else {
                    break;
                };
                let Some((method, uri)) = parse_request_line(&line) else {
                    continue;
                };

                let request = RequestInfo::from_uri(method, &uri);
                let decision = hook.decide(&request);
                let mut out = serde_json::to_string(&DecisionLine::new(&decision))?;
                out.push('\n');
                stdout.write_all(out.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        Commands::ValidateConfig { config } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            println!("Validating configuration: {}", config.display());

            let cfg = Config::from_file(&config)?;

            println!("Configuration is valid!");
            println!();
            println!("  Domains file: {}", cfg.allowlist.domains_file.display());
            println!("  Watch for changes: {}", cfg.allowlist.watch);
            let guard_state = if cfg.write_guard.enabled {
                "enabled"
            } else {
                "disabled"
            };
            println!("  Write guard: {}", guard_state);
            println!("  API prefix: {}", cfg.write_guard.api_prefix);
            println!("  Log level: {}", cfg.logging.level);
            println!("  Log allowed requests: {}", cfg.logging.log_allowed_requests);
            println!("  Log blocked requests: {}", cfg.logging.log_blocked_requests);
            match cfg.logging.audit_log {
                Some(ref p) => {
                    println!("  Audit log: {} ({:?})", p.display(), cfg.logging.audit_format)
                }
                None => println!("  Audit log: disabled"),
            }

            let engine = PolicyEngine::from_config(&cfg)?;
            println!("  Domains: {}", engine.allowlist().len());
            println!("  Write rules: {}", engine.write_guard().rule_count());
            print_rules(engine.write_guard());
        }

        Commands::ListRules { prefix } => {
            let guard = WriteGuard::with_prefix(&prefix)?;
            println!("Blocked write operations ({} rules):", guard.rule_count());
            print_rules(&guard);
        }
    }

    Ok(())
}
