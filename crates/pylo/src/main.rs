mod cli;
mod error;
mod output;
mod progress;

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use pylo_api::PanClient;
use pylo_config::Config;
use pylo_core::RunContext;

use crate::cli::Cli;
use crate::error::CliError;
use crate::progress::BarProgress;

const FILE_FILTER: &str = "info,pylo=debug,pylo_core=debug,pylo_api=debug,pylo_config=debug";

#[tokio::main]
async fn main() {
    human_panic::setup_panic!();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Console layer at the `-v` level (`RUST_LOG` wins) plus a debug-level
/// file layer writing `<log_dir>/<timestamp>_pylo.log`.
fn init_tracing(cli: &Cli, log_dir: &Path) -> Result<(WorkerGuard, PathBuf), CliError> {
    let log_error = |message: String| CliError::LogFile {
        path: log_dir.display().to_string(),
        message,
    };
    std::fs::create_dir_all(log_dir).map_err(|e| log_error(e.to_string()))?;

    let file_name = format!(
        "{}_pylo.log",
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&file_name)
        .build(log_dir)
        .map_err(|e| log_error(e.to_string()))?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)));
    let file = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(EnvFilter::new(FILE_FILTER));

    tracing_subscriber::registry().with(console).with(file).init();

    Ok((guard, log_dir.join(file_name)))
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_file = cli.config.clone().unwrap_or_else(pylo_config::config_path);
    let mut config = pylo_config::load_config(&config_file)?;
    if let Some(dir) = &cli.log_dir {
        config.log_dir.clone_from(dir);
    }

    if cli.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    let (_guard, log_file) = init_tracing(&cli, &config.log_dir)?;
    if !cli.quiet {
        println!("{}\n", output::banner());
    }
    info!(
        config = %config_file.display(),
        log = %log_file.display(),
        "starting bring-up"
    );

    let mut ctx = build_context(&config, cli.insecure)?;
    let progress = BarProgress::new(cli.quiet);
    let result = pylo_core::run(&mut ctx, &progress).await;
    progress.finish();

    let (report, outcome) = match result {
        Ok(report) => (report, Ok(())),
        Err(failure) => (failure.report, Err(CliError::from(failure.error))),
    };
    if !cli.quiet {
        println!("{}", output::summary(&report));
        println!("Log: {}", log_file.display());
    }
    outcome
}

/// Credentials, templates and one API client per firewall.
fn build_context(config: &Config, insecure: bool) -> Result<RunContext<PanClient>, CliError> {
    let credentials = pylo_config::load_credentials(&config.credentials_file)?;
    let templates = pylo_config::load_templates(config)?;
    let transport = config.transport(insecure);

    let devices = credentials
        .into_iter()
        .map(|creds| {
            let url = PanClient::base_url_for(&creds.host).map_err(|e| CliError::InvalidHost {
                host: creds.host.clone(),
                message: e.to_string(),
            })?;
            let client = PanClient::new(url, &transport).map_err(|e| CliError::Setup {
                message: e.to_string(),
            })?;
            Ok((creds, client))
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    Ok(RunContext::new(
        devices,
        templates,
        config.template_params(),
        config.run_settings(),
    )?)
}
