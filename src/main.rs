//! Valet - local PHP development environment for Linux.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use valet::cli::Cli;
use valet::commands::CommandRegistry;
use valet::config::Settings;
use valet::engine::Engine;
use valet::error::ValetError;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(verb) = cli.command else {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    let settings = match Settings::load_or_default(&cli.config) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    let registry = match Engine::from_settings(settings) {
        Ok(engine) => CommandRegistry::new(Arc::new(engine)),
        Err(e) => return report_error(&e, cli.json),
    };

    match registry.dispatch_verb(verb) {
        Ok(result) => {
            if cli.json {
                match serde_json::to_string_pretty(&result) {
                    Ok(out) => println!("{}", out),
                    Err(e) => return report_error(&e.into(), cli.json),
                }
            } else {
                println!("{}", result.message);
            }
            ExitCode::SUCCESS
        }
        Err(e) => report_error(&e, cli.json),
    }
}

fn report_error(e: &ValetError, json: bool) -> ExitCode {
    error!(code = e.code(), error = %e, "Command failed");
    if json {
        let body = serde_json::json!({
            "error": { "code": e.code(), "message": e.to_string() }
        });
        println!("{}", body);
    } else {
        eprintln!("{}", e);
    }
    ExitCode::FAILURE
}

/// Initialize logging based on settings. `RUST_LOG` overrides the level.
fn init_logging(settings: &Settings) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    match settings.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
