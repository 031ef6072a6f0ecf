use clap::{Parser, ValueEnum};
use console::{Term, set_colors_enabled, style};
use std::io::{self, IsTerminal};
use std::process;
use std::time::Duration;
use tokio::signal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use ntpeek::{
    NtpError, ProbeResult, compare_many, fmt, query_one,
    stats::{Stats, compute_stats},
};
use std::collections::BTreeMap;

#[path = "ntpeek/config_store.rs"]
mod config_store;

use config_store::ConfigStore;

const DEFAULT_CLI_VERSION: u8 = 3;
const DEFAULT_CLI_TIMEOUT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "ntpeek")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query NTP servers and report clock offset and round-trip delay")]
#[command(long_about = Some(
    "Query and compare NTP servers from the CLI.\n\
     \n\
     Examples:\n\
       ntpeek pool.ntp.org\n\
       ntpeek --server time.google.com --verbose\n\
       ntpeek --compare ntp1 ntp2 --format json\n\
     \n\
     Defaults for --timeout, --format and --ntp-version can be set in\n\
     config.toml under [defaults] (see NTPEEK_CONFIG_DIR)."
))]
struct Args {
    /// Query a single NTP server
    #[arg(short, long)]
    server: Option<String>,

    /// Compare multiple servers
    #[arg(short = 'C', long, num_args = 2..)]
    compare: Option<Vec<String>>,

    /// Show every header field
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    format: Option<OutputFormat>,

    /// Alias for JSON output
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty-print JSON
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Disable colored output
    #[arg(long = "no-color", alias = "nocolor")]
    no_color: bool,

    /// NTP version to request (2, 3 or 4)
    #[arg(short = 'n', long, value_parser = clap::value_parser!(u8).range(2..=4))]
    ntp_version: Option<u8>,

    /// Timeout in seconds for each send and receive
    #[arg(long)]
    timeout: Option<f64>,

    /// Positional server name or IPv4 address, optionally with port (e.g. 192.168.1.23:123)
    #[arg(index = 1)]
    target: Option<String>,

    /// Query until interrupted
    #[arg(long)]
    infinite: bool,

    /// Interval between queries in seconds (only with --infinite or --count)
    #[arg(short = 'i', long, default_value_t = 1.0)]
    interval: f64,

    /// Number of queries
    #[arg(short = 'c', long, default_value_t = 1)]
    count: u32,
}

/// Settings after merging flags over config file defaults.
struct Settings {
    format: OutputFormat,
    version: u8,
    timeout: Duration,
    interval: Duration,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("NTPEEK_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let term = Term::stdout();

    let store = match ConfigStore::load() {
        Ok(store) => store,
        Err(e) => {
            term.write_line(&style(format!("Error: {}", e)).red().to_string())
                .ok();
            process::exit(1);
        }
    };
    debug!(path = %store.path().display(), "configuration loaded");

    let settings = match merge_settings(&args, &store) {
        Ok(s) => s,
        Err(msg) => {
            term.write_line(&style(msg).red().to_string()).ok();
            process::exit(2);
        }
    };

    let want_color = settings.format == OutputFormat::Text
        && io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && !args.no_color;
    set_colors_enabled(want_color);

    if args.infinite && args.count != 1 {
        term.write_line(
            &style("--infinite cannot be used with --count")
                .red()
                .to_string(),
        )
        .ok();
        process::exit(2);
    }
    if args.interval != 1.0 && !args.infinite && args.count == 1 {
        term.write_line(
            &style("--interval requires --infinite or --count")
                .red()
                .to_string(),
        )
        .ok();
        process::exit(2);
    }

    let exit_code = match (&args.compare, &args.server, &args.target) {
        (Some(list), _, _) => compare_loop(list, &args, &settings, &term).await,
        (_, Some(server), _) => query_loop(server, &args, &settings, &term).await,
        (_, None, Some(pos)) => query_loop(pos, &args, &settings, &term).await,
        _ => {
            term.write_line(
                &style("Error: Provide either a server, a positional argument, or --compare")
                    .red()
                    .bold()
                    .to_string(),
            )
            .ok();
            1
        }
    };

    process::exit(exit_code);
}

fn merge_settings(args: &Args, store: &ConfigStore) -> Result<Settings, String> {
    let defaults = &store.defaults;

    let format = if args.json {
        OutputFormat::Json
    } else if let Some(f) = args.format {
        f
    } else {
        match defaults.format.as_deref() {
            None | Some("text") => OutputFormat::Text,
            Some("json") => OutputFormat::Json,
            Some(other) => return Err(format!("Error: unknown format '{other}' in config")),
        }
    };
    if args.pretty && format != OutputFormat::Json {
        return Err("Error: There is no pretty print for the plain text display".into());
    }

    let timeout = args
        .timeout
        .or(defaults.timeout)
        .unwrap_or(DEFAULT_CLI_TIMEOUT);
    let timeout = Duration::try_from_secs_f64(timeout)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| {
            format!("Error: timeout must be a positive number of seconds, got {timeout}")
        })?;
    let interval = Duration::try_from_secs_f64(args.interval).map_err(|_| {
        format!(
            "Error: --interval must be a non-negative number of seconds, got {}",
            args.interval
        )
    })?;

    Ok(Settings {
        format,
        version: args
            .ntp_version
            .or(defaults.version)
            .unwrap_or(DEFAULT_CLI_VERSION),
        timeout,
        interval,
    })
}

/// Sleep for the interval; returns false when interrupted in infinite mode.
async fn pause(args: &Args, settings: &Settings) -> bool {
    let sleep = tokio::time::sleep(settings.interval);
    if args.infinite {
        tokio::select! {
            _ = sleep => true,
            _ = signal::ctrl_c() => false,
        }
    } else {
        sleep.await;
        true
    }
}

async fn query_loop(target: &str, args: &Args, settings: &Settings, term: &Term) -> i32 {
    let repeated = args.count > 1 || args.infinite;
    let mut all = Vec::new();
    let mut n = 0u32;
    loop {
        match query_one(target, settings.version, settings.timeout).await {
            Ok(res) => {
                if repeated && settings.format == OutputFormat::Text && !args.verbose {
                    term.write_line(&fmt::text::render_short_probe(&res)).ok();
                } else {
                    output(term, std::slice::from_ref(&res), settings.format, args);
                }
                all.push(res);
            }
            Err(e) => return handle_error(term, e),
        }
        n += 1;
        if !args.infinite && n >= args.count {
            break;
        }
        if !pause(args, settings).await {
            break;
        }
    }

    if all.len() > 1 {
        if let Some(stats) = compute_stats(&all) {
            output_stats(term, &all[0].target.name, &stats, settings.format, args.pretty);
        }
    }
    0
}

async fn compare_loop(list: &[String], args: &Args, settings: &Settings, term: &Term) -> i32 {
    let mut all: BTreeMap<String, Vec<ProbeResult>> = BTreeMap::new();
    let mut n = 0u32;
    loop {
        match compare_many(list, settings.version, settings.timeout).await {
            Ok(results) => {
                output(term, &results, settings.format, args);
                for r in results {
                    all.entry(r.target.name.clone()).or_default().push(r);
                }
            }
            Err(e) => return handle_error(term, e),
        }
        n += 1;
        if !args.infinite && n >= args.count {
            break;
        }
        if !pause(args, settings).await {
            break;
        }
    }

    if all.values().any(|v| v.len() > 1) {
        for (name, vals) in &all {
            if let Some(stats) = compute_stats(vals) {
                output_stats(term, name, &stats, settings.format, args.pretty);
            }
        }
    }
    0
}

fn output(term: &Term, results: &[ProbeResult], format: OutputFormat, args: &Args) {
    match format {
        OutputFormat::Text => {
            let s = if results.len() == 1 {
                fmt::text::render_probe(&results[0], args.verbose)
            } else {
                fmt::text::render_compare(results, args.verbose)
            };
            term.write_line(&s).ok();
        }
        OutputFormat::Json => match fmt::json::to_json(results, args.pretty, args.verbose) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("error serializing: {}", e),
        },
    }
}

fn output_stats(term: &Term, name: &str, stats: &Stats, format: OutputFormat, pretty: bool) {
    match format {
        OutputFormat::Json => match fmt::json::stats_to_json(name, stats, pretty) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("error serializing: {}", e),
        },
        OutputFormat::Text => {
            term.write_line(&fmt::text::render_stats(name, stats)).ok();
        }
    }
}

fn handle_error(term: &Term, err: NtpError) -> i32 {
    term.write_line(&style(format!("Error: {}", err)).red().to_string())
        .ok();
    match err {
        NtpError::Resolution { .. } | NtpError::InvalidTarget(_) => 2,
        NtpError::Transport { .. } => 3,
        NtpError::Encoding(_) | NtpError::Decoding(_) => 4,
        _ => 1,
    }
}
