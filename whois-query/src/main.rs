//! WHOIS Query CLI Application
//!
//! Looks up the WHOIS record for a URL, hostname or IP address and prints it
//! as pretty JSON. A thin interface over whois-query-lib.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use console::Style;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use whois_query_lib::{
    load_env_config, parse_flags, parse_timeout_string, ConfigManager, FileConfig, QueryOptions,
    WhoisQuery,
};

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for whois-query
#[derive(Parser, Debug)]
#[command(name = "whois-query")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Look up the WHOIS record for any URL or IP address")]
#[command(
    long_about = "Look up the WHOIS record for any URL or IP address.\n\nThe input is reduced to its registrable domain using the public suffix list (www.google.com.au/tos.html becomes google.com.au), queried over WHOIS and printed as JSON."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// URL, hostname or IP address to look up
    #[arg(value_name = "URL")]
    pub url: String,

    /// Query through the system whois executable instead of a direct socket
    #[arg(short = 'n', long = "native", help_heading = "Transport")]
    pub native: bool,

    /// Executable used with --native
    #[arg(
        short = 'e',
        long = "executable",
        value_name = "PATH",
        help_heading = "Transport"
    )]
    pub executable: Option<String>,

    /// Socket client flags (1 = recurse, 2 = quick; decimal or 0x hex)
    #[arg(
        short = 'f',
        long = "flags",
        value_name = "FLAGS",
        help_heading = "Transport"
    )]
    pub flags: Option<String>,

    /// WHOIS server for the socket client (host or host:port)
    #[arg(
        short = 's',
        long = "server",
        value_name = "HOST",
        help_heading = "Transport"
    )]
    pub server: Option<String>,

    /// Timeout for the reverse lookup and the query (e.g. 5s, 1m)
    #[arg(
        short = 't',
        long = "timeout",
        value_name = "DURATION",
        help_heading = "Transport"
    )]
    pub timeout: Option<String>,

    /// Include the raw WHOIS response in the output
    #[arg(short = 'r', long = "raw", help_heading = "Output")]
    pub raw: bool,

    /// Print the resolved domain and exit without querying
    #[arg(long = "resolve-only", help_heading = "Output")]
    pub resolve_only: bool,

    /// Silence connection warnings
    #[arg(short = 'q', long = "quiet", help_heading = "Output")]
    pub quiet: bool,

    /// Public suffix list file replacing the bundled list
    #[arg(long = "suffix-list", value_name = "FILE", help_heading = "Configuration")]
    pub suffix_list: Option<PathBuf>,

    /// Configuration file (overrides discovery and WQ_CONFIG)
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Verbose logging to stderr
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.verbose);

    if let Err(e) = run(args).await {
        let error_style = Style::new().for_stderr().red().bold();
        eprintln!("{} {}", error_style.apply_to("Error:"), e);
        process::exit(1);
    }
}

/// Install the tracing subscriber; `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "whois_query=debug,whois_query_lib=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let options = build_options(&args)?;
    debug!(?options, "Effective query options");

    let query = WhoisQuery::new(options);

    if args.resolve_only {
        let domain = query.resolve(&args.url).await?;
        println!("{}", domain);
        return Ok(());
    }

    let record = query.run(&args.url).await?;
    println!("{}", record.to_json_pretty()?);
    Ok(())
}

/// Build query options: config file, then `WQ_*` variables, then CLI flags.
fn build_options(args: &Args) -> Result<QueryOptions, Box<dyn std::error::Error>> {
    let env_config = load_env_config(args.verbose);
    let config_manager = ConfigManager::new(args.verbose);

    // Step 1: Config file (explicit --config, then WQ_CONFIG, then discovery)
    let file_config: FileConfig = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => {
            debug!(%path, "Using explicit config file");
            config_manager
                .load_file(path)
                .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?
        }
        None => config_manager.discover_and_load()?,
    };
    let options = file_config.apply(QueryOptions::default());

    // Step 2: Environment variables (WQ_*)
    let options = env_config.apply(options);

    // Step 3: CLI arguments (highest precedence)
    apply_cli_args(options, args)
}

/// Overlay explicitly passed CLI flags onto `options`.
///
/// Boolean flags only ever switch a setting on; leaving one off keeps the
/// config or environment value.
fn apply_cli_args(
    mut options: QueryOptions,
    args: &Args,
) -> Result<QueryOptions, Box<dyn std::error::Error>> {
    if args.native {
        options.use_native_executable = true;
    }
    if let Some(executable) = &args.executable {
        options.executable = executable.clone();
    }
    if let Some(flags) = &args.flags {
        options.flags = parse_flags(flags)
            .ok_or_else(|| format!("Invalid flags '{}', expected a number", flags))?;
    }
    if let Some(server) = &args.server {
        options.server = Some(server.clone());
    }
    if let Some(timeout) = &args.timeout {
        let secs = parse_timeout_string(timeout)
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                format!(
                    "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                    timeout
                )
            })?;
        options.timeout = Duration::from_secs(secs);
    }
    if args.raw {
        options.include_raw = true;
    }
    if args.quiet {
        options.quiet = true;
    }
    if let Some(path) = &args.suffix_list {
        options.suffix_list = Some(path.clone());
    }
    Ok(options)
}
