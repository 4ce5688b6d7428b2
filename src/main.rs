use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use twr_mirror::config::{self, DEFAULT_CONFIG_PATH};
use twr_mirror::handler;
use twr_mirror::ingest::HttpFetcher;
use twr_mirror::logging;
use twr_mirror::sink::{DirectorySink, Sink};
use twr_mirror::verify;
use twr_mirror::Mirror;

/// Mirror the WRA reservoir open-data feeds into object storage.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the mirror configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Fetch and validate every source without publishing.
    #[arg(long)]
    check: bool,

    /// Write objects into this directory instead of the configured sink.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match config::load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logger(&config.logging) {
        eprintln!("cannot initialise logging: {}", e);
        return ExitCode::FAILURE;
    }

    if args.check {
        return check(&config);
    }

    let mirror = match build(&config, &args) {
        Ok(mirror) => mirror,
        Err(e) => {
            logging::error(logging::Component::Orchestrator, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let response = handler::invoke(&mirror);
    match serde_json::to_string(&response) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("cannot encode response: {}", e),
    }

    if response.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Fetch and validate only; needs no sink credentials.
fn check(config: &config::MirrorConfig) -> ExitCode {
    let prepared = HttpFetcher::new(&config.http).and_then(|f| Ok((f, config.descriptors()?)));
    let (fetcher, sources) = match prepared {
        Ok(prepared) => prepared,
        Err(e) => {
            logging::error(logging::Component::Orchestrator, None, &e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let report = verify::run_verification(&fetcher, &sources);
    verify::print_summary(&report);
    if report.summary.failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn build(
    config: &config::MirrorConfig,
    args: &Args,
) -> Result<Mirror<HttpFetcher, Box<dyn Sink>>, twr_mirror::ConfigError> {
    match &args.output_dir {
        Some(dir) => Ok(Mirror::new(
            HttpFetcher::new(&config.http)?,
            Box::new(DirectorySink::new(dir)) as Box<dyn Sink>,
            config.descriptors()?,
        )),
        None => config.build_mirror(),
    }
}
