// HttpSleuth - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading and logging initialisation (debug mode support)
// 3. One run over the given log, results on stdout
// 4. Exit codes

use clap::Parser;
use httpsleuth::app::scan::{self, RunOptions};
use httpsleuth::core::filter::{FilterState, StatusFilter};
use httpsleuth::core::render::RenderOptions;
use httpsleuth::core::segment::SegmentConfig;
use httpsleuth::platform::config::{self, PlatformPaths};
use httpsleuth::util::{self, error::HttpSleuthError};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// Extract HTTP transactions from mobile application logs.
#[derive(Parser, Debug)]
#[command(name = "httpsleuth", version, about)]
struct Cli {
    /// Log file to process.
    file: PathBuf,

    /// Print request bodies.
    #[arg(long = "req")]
    request_body: bool,

    /// Print response bodies.
    #[arg(long = "resp")]
    response_body: bool,

    /// Only transactions with status < 400 (wins over --res-nok).
    #[arg(long = "res-ok")]
    res_ok: bool,

    /// Only transactions with status >= 400.
    #[arg(long = "res-nok")]
    res_nok: bool,

    /// Shell-style wildcard matched against each record's JSON form.
    #[arg(long)]
    filter: Option<String>,

    /// Print each matching record as one JSON line.
    #[arg(long)]
    json: bool,

    /// Config file (defaults to config.toml in the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr.
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PlatformPaths::resolve().config_file());
    let (app_config, config_warnings) = config::load_config(&config_path);

    util::logging::init(
        cli.debug,
        app_config.log_level.as_deref(),
        app_config.log_file.as_deref(),
    );

    tracing::debug!(
        version = util::constants::APP_VERSION,
        config = %config_path.display(),
        "{} starting",
        util::constants::APP_NAME
    );
    for warning in &config_warnings {
        tracing::warn!("{}", warning);
    }

    let mut filter = FilterState {
        status: StatusFilter::from_flags(cli.res_ok, cli.res_nok),
        pattern: None,
    };
    if let Some(pattern) = cli.filter.as_deref() {
        if let Err(e) = filter.set_pattern(pattern) {
            let e = HttpSleuthError::from(e);
            tracing::error!(error = %e, "Invalid filter");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    let options = RunOptions {
        render: RenderOptions {
            request_body: cli.request_body || app_config.request_body,
            response_body: cli.response_body || app_config.response_body,
        },
        filter,
        json: cli.json || app_config.json,
        detection_lines: app_config.detection_lines,
        segment: SegmentConfig {
            max_block_lines: app_config.max_block_lines,
        },
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match scan::run(&cli.file, &options, &mut out) {
        Ok(_) => {}
        Err(HttpSleuthError::Detect(e)) => {
            tracing::debug!(error = %e, "Detection failed");
            eprintln!("No suitable logs found in '{}'", cli.file.display());
            std::process::exit(1);
        }
        Err(e) => {
            // Records emitted before the failure still reach stdout.
            if let Err(flush_err) = out.flush() {
                tracing::debug!(error = %flush_err, "Flushing partial output failed");
            }
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
