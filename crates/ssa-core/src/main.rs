//! `ssa-core` command line interface.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use ssa_common::{OperationResult, OutputFormat};
use ssa_config::Settings;
use ssa_core::logging::{generate_run_id, host_id, LogConfig};
use ssa_core::MasterController;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

const EXIT_OK: u8 = 0;
const EXIT_OPERATION_ERROR: u8 = 1;

#[derive(Debug, Parser)]
#[command(
    name = "ssa-core",
    about = "SkySeeAll hardware capability and module command layer",
    version
)]
struct Cli {
    /// Output format
    #[arg(long, short = 'f', global = true, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to settings.toml (overrides the resolution order)
    #[arg(long, global = true, env = "SSA_SETTINGS")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Aggregate status of all controllers, capabilities, and proxies
    Status,

    /// Detected hardware capability snapshot
    Capabilities,

    /// Execute one module action
    Exec {
        /// Module name (tactical, spectrum, intel, vision, system)
        module: String,

        /// Action name from the module's catalog
        action: String,

        /// Action parameters as a JSON object
        #[arg(long, default_value = "{}")]
        params: String,
    },

    /// Enable a module
    Enable { module: String },

    /// Disable a module
    Disable { module: String },

    /// Validate settings and report deployment gaps
    Check,

    /// Build and schema information
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    LogConfig::from_env(cli.verbose, cli.quiet).init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %e, "startup failed");
            eprintln!("error: {}", e);
            ExitCode::from(EXIT_OPERATION_ERROR)
        }
    }
}

fn run(cli: Cli) -> ssa_common::Result<u8> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Command::Check => {
            let report = ssa_config::validate(&settings);
            print_value(&json!(report), cli.format);
            Ok(if report.is_ok() { EXIT_OK } else { EXIT_OPERATION_ERROR })
        }
        Command::Version => {
            print_value(
                &json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                    "modules": ssa_core::MODULES,
                }),
                cli.format,
            );
            Ok(EXIT_OK)
        }
        Command::Status => {
            let master = boot(&settings);
            print_value(&master.get_all_status(), cli.format);
            Ok(EXIT_OK)
        }
        Command::Capabilities => {
            let master = boot(&settings);
            print_value(
                &json!({
                    "capabilities": master.snapshot().as_map(),
                    "detected_at": master.snapshot().detected_at.clone(),
                    "summary": master.snapshot().summary(),
                    "emulation_mode": master.emulation_mode().as_str(),
                }),
                cli.format,
            );
            Ok(EXIT_OK)
        }
        Command::Exec {
            module,
            action,
            params,
        } => {
            let params: Value = serde_json::from_str(&params)
                .map_err(|e| ssa_common::Error::Config(format!("--params is not valid JSON: {}", e)))?;
            let master = boot(&settings);
            let result = master.execute(&module, &action, params);
            let code = if result.is_error() {
                EXIT_OPERATION_ERROR
            } else {
                EXIT_OK
            };
            print_result(&result, cli.format);
            Ok(code)
        }
        Command::Enable { module } => {
            let master = boot(&settings);
            let result = master.enable_module(&module);
            let code = if result.is_error() {
                EXIT_OPERATION_ERROR
            } else {
                EXIT_OK
            };
            print_result(&result, cli.format);
            Ok(code)
        }
        Command::Disable { module } => {
            let master = boot(&settings);
            let result = master.disable_module(&module);
            let code = if result.is_error() {
                EXIT_OPERATION_ERROR
            } else {
                EXIT_OK
            };
            print_result(&result, cli.format);
            Ok(code)
        }
    }
}

fn boot(settings: &Settings) -> MasterController {
    let run_id = generate_run_id();
    info!(
        run_id = %run_id,
        host_id = %host_id(),
        mode = %settings.emulation_mode,
        "starting control layer"
    );
    MasterController::new(settings)
}

fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", value),
        OutputFormat::Pretty => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default())
        }
        OutputFormat::Summary => println!("{}", summarize_value(value)),
    }
}

fn print_result(result: &OperationResult, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Pretty => {
            print_value(&json!(result), format);
        }
        OutputFormat::Summary => match result {
            OperationResult::Error { message, .. } => println!("error: {}", message),
            _ => {
                let payload = result.payload().cloned().unwrap_or(Value::Null);
                println!("{}: {}", result.source(), summarize_value(&payload));
            }
        },
    }
}

/// One line: top-level keys with scalar values, counts for arrays.
fn summarize_value(value: &Value) -> String {
    match value.as_object() {
        Some(map) => map
            .iter()
            .map(|(k, v)| match v {
                Value::Array(items) => format!("{}={} items", k, items.len()),
                Value::Object(_) => format!("{}={{..}}", k),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(" "),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_exec() {
        let cli = Cli::try_parse_from([
            "ssa-core",
            "exec",
            "spectrum",
            "start_sdr",
            "--params",
            r#"{"frequency": 100.0}"#,
        ])
        .unwrap();
        match cli.command {
            Command::Exec { module, action, params } => {
                assert_eq!(module, "spectrum");
                assert_eq!(action, "start_sdr");
                assert!(params.contains("frequency"));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_cli_rejects_missing_action() {
        assert!(Cli::try_parse_from(["ssa-core", "exec", "spectrum"]).is_err());
    }

    #[test]
    fn test_summarize_value() {
        let value = json!({"networks": [1, 2, 3], "count": 3, "nested": {"a": 1}});
        let line = summarize_value(&value);
        assert!(line.contains("networks=3 items"));
        assert!(line.contains("count=3"));
        assert!(line.contains("nested={..}"));
    }
}
