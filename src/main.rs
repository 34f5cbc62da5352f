// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use arma_dllexport::config::{finalize_config, load_and_validate_config, Config, RuntimeBuilder};
use arma_dllexport::engine::ExportOutcome;

const USAGE: &str = "<target.dll> [config.(yaml|yml|toml)] [--keep-il] [--json]";

/// Parsed command line
struct CliArgs {
    target: Option<PathBuf>,
    config: Option<PathBuf>,
    keep_il: bool,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs> {
    let mut cli = CliArgs {
        target: None,
        config: None,
        keep_il: false,
        json: false,
    };

    for arg in args {
        match arg.as_str() {
            "--keep-il" => cli.keep_il = true,
            "--json" => cli.json = true,
            flag if flag.starts_with("--") => bail!("unknown option {}", flag),
            path if cli.target.is_none() => cli.target = Some(PathBuf::from(path)),
            path if cli.config.is_none() => cli.config = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument {}", extra),
        }
    }
    Ok(cli)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("arma-dllexport");

    if args.len() < 2 || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} {}", program, USAGE);
        return ExitCode::FAILURE;
    }

    init_tracing();

    match run(&args[1..]).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> Result<()> {
    let cli = parse_args(args)?;

    let mut config = match &cli.config {
        Some(path) => load_and_validate_config(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => finalize_config(Config::default()).context("invalid toolchain configuration")?,
    };
    if cli.keep_il {
        config.wrapper.keep_il = true;
    }

    let target = cli
        .target
        .or_else(|| config.target.clone())
        .context("no target module given")?;

    let mut exporter = RuntimeBuilder::open(&config, &target)
        .await
        .with_context(|| format!("cannot export from {}", target.display()))?;
    let outcome = exporter
        .export()
        .await
        .with_context(|| format!("export from {} failed", target.display()))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    match outcome {
        ExportOutcome::NothingToExport => {
            println!("Nothing to export in {}", target.display());
        }
        ExportOutcome::Exported(summary) => {
            println!(
                "✅ {} exported as {} ({})",
                summary.candidate, summary.alias, summary.platform
            );
            if let Some(listing) = summary.intermediate {
                println!("   Patched listing kept at {}", listing.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_positionals_and_flags() {
        let cli = parse_args(&args(&["a.dll", "--json", "export.yaml", "--keep-il"])).unwrap();

        assert_eq!(cli.target, Some(PathBuf::from("a.dll")));
        assert_eq!(cli.config, Some(PathBuf::from("export.yaml")));
        assert!(cli.keep_il && cli.json);
    }

    #[test]
    fn test_rejects_unknown_and_extra_arguments() {
        assert!(parse_args(&args(&["a.dll", "--verbose"])).is_err());
        assert!(parse_args(&args(&["a.dll", "b.yaml", "c"])).is_err());
    }
}
