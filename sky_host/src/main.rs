use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use sky_hooks::{Runtime, RuntimeConfig};

mod report;
mod scenario;
mod sim;

use scenario::Scenario;

/// Replays scripted host events through the hook runtime and reports what
/// each patched call site would have done.
#[derive(Parser, Debug)]
#[command(about = "Drive the hook runtime from a JSON scenario", version)]
struct Args {
    /// Scenario JSON describing the world and the events to replay
    #[arg(long)]
    scenario: PathBuf,

    /// Optional runtime config JSON (custom id bases, journal switch)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lua effect script consulted after the built-in effect handlers
    #[arg(long)]
    script: Option<PathBuf>,

    /// Path to write the JSON report instead of printing it
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// Log every dispatch and menu transition
    #[arg(long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    let config =
        RuntimeConfig::from_json_file(args.config.as_deref()).context("loading runtime config")?;
    let scenario = Scenario::from_json_file(&args.scenario)?;

    let mut runtime = build_runtime(config, &args)?;
    let mut host = scenario.host();
    let report = scenario
        .run(&mut runtime, &mut host)
        .with_context(|| format!("running scenario '{}'", scenario.name))?;

    match &args.report_json {
        Some(path) => {
            report.persist(path)?;
            report.print_summary();
            println!("Report written to {}", path.display());
        }
        None => println!("{}", report.to_json_string()?),
    }
    Ok(())
}

#[cfg(feature = "lua")]
fn build_runtime(config: RuntimeConfig, args: &Args) -> Result<Runtime> {
    let mut builder = Runtime::builder(config);
    if let Some(path) = &args.script {
        let resolver = sky_lua::LuaResolver::from_file(path)
            .with_context(|| format!("loading effect script {}", path.display()))?;
        builder = builder.secondary(Box::new(resolver));
    }
    Ok(builder.build())
}

#[cfg(not(feature = "lua"))]
fn build_runtime(config: RuntimeConfig, args: &Args) -> Result<Runtime> {
    if let Some(path) = &args.script {
        anyhow::bail!(
            "cannot load {}: built without the `lua` feature",
            path.display()
        );
    }
    Ok(Runtime::new(config))
}
