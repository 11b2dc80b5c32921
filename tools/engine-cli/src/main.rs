//! engine-cli: drive the computation worker from a terminal.
//!
//! Spawns the worker, sends one command through the command bridge and
//! prints the correlated response as JSON.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use engine_bridge::domain::COMMAND_ALIASES;
use engine_bridge::{BridgeConfig, CommandBridge, ResponseStatus};
use engine_bus::OutputEventBus;
use engine_host::{Sidecar, SidecarConfig, HOST_COMMANDS};
use engine_telemetry::{init_tracing, TelemetryConfig};

/// Send a command to the computation worker and print the response
#[derive(Parser, Debug)]
#[command(name = "engine-cli")]
#[command(about = "Send a command to the computation worker and print the response")]
struct Args {
    /// Command name, e.g. `get_data_stats` or `load_data`
    #[arg(required_unless_present = "list_commands")]
    command: Option<String>,

    /// Command params as a JSON object
    #[arg(default_value = "{}")]
    params: String,

    /// Worker executable
    #[arg(short, long, default_value = "mark-six-engine")]
    program: PathBuf,

    /// Argument passed to the worker (repeatable)
    #[arg(long = "worker-arg", allow_hyphen_values = true)]
    worker_args: Vec<String>,

    /// Data directory used to resolve `load_data` file paths
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Bridge configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the response timeout, in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Print known command names and exit
    #[arg(long)]
    list_commands: bool,
}

impl Args {
    fn bridge_config(&self) -> Result<BridgeConfig> {
        let config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                BridgeConfig::from_json_str(&text)?
            }
            None => BridgeConfig::default(),
        };

        Ok(match self.timeout_ms {
            Some(ms) => config.with_default_timeout(Duration::from_millis(ms)),
            None => config,
        })
    }

    fn sidecar_config(&self, output_event: &str) -> SidecarConfig {
        let config = SidecarConfig::new(&self.program)
            .with_args(self.worker_args.iter().cloned())
            .with_output_event(output_event);
        match &self.data_dir {
            Some(dir) => config.with_data_dir(dir),
            None => config,
        }
    }

    fn parsed_params(&self) -> Result<Value> {
        serde_json::from_str(&self.params).context("params must be valid JSON")
    }
}

fn print_commands() {
    println!("caller commands (aliased):");
    for (caller, worker) in COMMAND_ALIASES {
        println!("  {caller:<20} -> {worker}");
    }
    println!("host commands:");
    for command in HOST_COMMANDS {
        println!("  {command}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.list_commands {
        print_commands();
        return Ok(());
    }

    init_tracing(&TelemetryConfig::from_env())?;

    let Some(command) = args.command.as_deref() else {
        bail!("no command given");
    };
    let params = args.parsed_params()?;
    let bridge_config = args.bridge_config()?;

    let bus = Arc::new(OutputEventBus::new());
    let sidecar = Arc::new(
        Sidecar::spawn(&args.sidecar_config(&bridge_config.output_event), bus.clone()).await?,
    );
    let bridge = CommandBridge::new(bridge_config, bus, sidecar.clone())?;

    info!(command = command, "Invoking worker command");
    let outcome = tokio::select! {
        result = bridge.invoke(command, params) => result,
        _ = tokio::signal::ctrl_c() => {
            sidecar.shutdown().await?;
            bail!("interrupted");
        }
    };

    if let Err(e) = sidecar.shutdown().await {
        warn!(error = %e, "Failed to stop worker cleanly");
    }

    let response = outcome?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.status() == ResponseStatus::Error {
        bail!(
            "worker reported an error: {}",
            response.message().unwrap_or("no message")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_and_params() {
        let args = Args::try_parse_from([
            "engine-cli",
            "load_data",
            r#"{"file_path": "2024"}"#,
            "--timeout-ms",
            "500",
        ])
        .unwrap();

        assert_eq!(args.command.as_deref(), Some("load_data"));
        assert_eq!(args.parsed_params().unwrap()["file_path"], "2024");
        assert_eq!(
            args.bridge_config().unwrap().default_timeout,
            Duration::from_millis(500)
        );
    }

    #[test]
    fn test_command_required_unless_listing() {
        assert!(Args::try_parse_from(["engine-cli"]).is_err());
        assert!(Args::try_parse_from(["engine-cli", "--list-commands"]).is_ok());
    }

    #[test]
    fn test_sidecar_config_from_args() {
        let args = Args::try_parse_from([
            "engine-cli",
            "get_data_stats",
            "--program",
            "python3",
            "--worker-arg",
            "-u",
            "--worker-arg",
            "engine.py",
            "--data-dir",
            "/srv/data",
        ])
        .unwrap();

        let config = args.sidecar_config("python-response");
        assert_eq!(config.program, PathBuf::from("python3"));
        assert_eq!(config.args, vec!["-u", "engine.py"]);
        assert_eq!(config.data_dir, Some(PathBuf::from("/srv/data")));
    }

    #[test]
    fn test_default_params_are_empty_object() {
        let args = Args::try_parse_from(["engine-cli", "get_data_stats"]).unwrap();
        assert_eq!(args.parsed_params().unwrap(), serde_json::json!({}));
    }
}
