use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use hawkscan::config::Config;
use hawkscan::error::ScanError;
use hawkscan::findings::Severity;
use hawkscan::output::OutputFormat;
use hawkscan::probe::payloads::{PayloadCatalog, ProbePayload};
use hawkscan::target::strip_trailing_slashes;
use hawkscan::ScanOptions;

const EXIT_PASS: i32 = 0;
const EXIT_POLICY_FAIL: i32 = 1;
const EXIT_UNUSABLE: i32 = 2;

const CONFIG_FILE: &str = ".hawkscan.toml";

/// Probe one web target for reflected XSS, SQL injection hints, weak TLS and
/// missing security headers.
#[derive(Parser)]
#[command(name = "hawkscan", version, author)]
struct Cli {
    /// Debug-level logs on stderr (RUST_LOG takes precedence)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a single http:// or https:// URL
    Scan(ScanArgs),
    /// Print the built-in SQLi and XSS payload catalogs
    ListPayloads(ListArgs),
    /// Write a commented .hawkscan.toml into the current directory
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args)]
struct ScanArgs {
    /// Target URL, query string included
    url: String,

    /// Alternate configuration file
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Report format
    #[arg(long, short = 'f', default_value = "console", value_parser = parse_format)]
    format: OutputFormat,

    /// Lowest suspected-finding severity that fails the run
    #[arg(long, value_parser = parse_severity)]
    fail_on: Option<Severity>,

    /// Report destination (stdout when omitted)
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Stop sending requests after this many seconds
    #[arg(long, env = "HAWKSCAN_DEADLINE")]
    deadline: Option<u64>,
}

impl ScanArgs {
    fn options(&self) -> ScanOptions {
        ScanOptions {
            config_path: self.config.clone(),
            format: self.format,
            fail_on_override: self.fail_on,
            deadline: self.deadline.map(Duration::from_secs),
        }
    }
}

#[derive(Args)]
struct ListArgs {
    #[arg(long, short = 'f', value_enum, default_value_t = ListFormat::Table)]
    format: ListFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListFormat {
    Table,
    Json,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::from_str_lenient(s)
        .ok_or_else(|| format!("unknown format '{s}' (console, json, sarif)"))
}

fn parse_severity(s: &str) -> Result<Severity, String> {
    Severity::from_str_lenient(s)
        .ok_or_else(|| format!("unknown severity '{s}' (info, low, medium, high, critical)"))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Scan(args) => scan(&args),
        Command::ListPayloads(args) => list_payloads(args.format),
        Command::Init { force } => init(force),
    };

    let code = outcome.unwrap_or_else(|e| {
        eprintln!("hawkscan: {e}");
        e.exit_code()
    });
    process::exit(code);
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "hawkscan=debug" } else { "hawkscan=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn scan(args: &ScanArgs) -> Result<i32, ScanError> {
    let report = hawkscan::scan(strip_trailing_slashes(&args.url), &args.options())?;
    let rendered = hawkscan::render_report(&report, args.format)?;

    match &args.output {
        Some(path) => std::fs::write(path, &rendered)?,
        None => println!("{rendered}"),
    }

    Ok(if report.target.is_none() {
        EXIT_UNUSABLE
    } else if report.verdict.pass {
        EXIT_PASS
    } else {
        EXIT_POLICY_FAIL
    })
}

fn list_payloads(format: ListFormat) -> Result<i32, ScanError> {
    let catalog = PayloadCatalog::default();

    if let ListFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(EXIT_PASS);
    }

    print_group("SQL injection", &catalog.sql);
    print_group("Cross-site scripting", &catalog.xss);
    println!(
        "{} database error signatures, {} reflection markers",
        catalog.error_signatures.len(),
        catalog.reflection_markers.len()
    );
    Ok(EXIT_PASS)
}

fn print_group(title: &str, payloads: &[ProbePayload]) {
    println!("{title} ({} payloads)", payloads.len());
    for payload in payloads {
        println!("  {:<20} {}", payload.category, payload.value);
    }
    println!();
}

fn init(force: bool) -> Result<i32, ScanError> {
    let path = PathBuf::from(CONFIG_FILE);
    if path.exists() && !force {
        eprintln!("{CONFIG_FILE} already exists; pass --force to replace it");
        return Ok(EXIT_POLICY_FAIL);
    }
    std::fs::write(&path, Config::starter_toml())?;
    println!("Wrote {CONFIG_FILE}");
    Ok(EXIT_PASS)
}
