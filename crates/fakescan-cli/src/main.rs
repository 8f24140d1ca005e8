//! FakeScan CLI - deepfake screening and dataset preparation.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod output;

use commands::{dataset, Cli, Commands, ExitCode};

fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();

    // Usage errors exit with 1; 2 is reserved for "no face detected"
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::Error.into()
            } else {
                ExitCode::Success.into()
            };
        }
    };

    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Image(args) => commands::image::run(args),
        Commands::Video(args) => commands::video::run(args),
        Commands::Crop(args) => dataset::crop(args),
        Commands::VideoFaces(args) => dataset::video_faces(args),
        Commands::Split(args) => dataset::split(args),
        Commands::Balance(args) => dataset::balance(args),
        Commands::Dedup(args) => dataset::dedup(args),
        Commands::Jobs(args) => dataset::jobs(args),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::for_error(&e)
        }
    };

    exit_code.into()
}

/// Logs go to stderr; `RUST_LOG` wins over `-v` when set.
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,fakescan=info")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .with(filter)
            .init();
    }
}
