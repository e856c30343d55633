//! lfg: command line front end for the dungeon queue simulator.

mod args;
mod prompt;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use lfg::{ConsoleReporter, Reporter, Simulation, TracingReporter};

use crate::args::{CliArgs, Command, USAGE, parse_args};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let cli = match parse_args(&args) {
        Ok(Command::Run(cli)) => cli,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return;
        }
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!();
            eprintln!("{USAGE}");
            process::exit(2);
        }
    };

    // Progress is only visible through the log in JSON mode.
    init_tracing(if cli.json { "info" } else { "warn" });

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Initialize tracing with LFG_LOG and LOG_FORMAT support. Logs go to stderr so
/// they never mix with the report on stdout.
fn init_tracing(default_level: &str) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match std::env::var("LFG_LOG").as_deref() {
            Ok("trace") => "trace",
            Ok("debug") => "debug",
            Ok("info") => "info",
            Ok("warn") | Ok("warning") => "warn",
            Ok("error") => "error",
            _ => default_level,
        };
        EnvFilter::new(filter_directive(level))
    };

    let use_json = std::env::var("LOG_FORMAT").as_deref() == Ok("json");

    if use_json {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    } else {
        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr));
        let _ = subscriber.try_init();
    }
}

/// Library and binary share the `lfg` target prefix.
fn filter_directive(level: &str) -> String {
    format!("lfg={level}")
}

async fn run(cli: CliArgs) -> anyhow::Result<()> {
    let config = {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut out = std::io::stdout();
        prompt::complete_config(&cli, &mut input, &mut out)?
    };
    info!(?config, "Configuration complete");

    let simulation = Simulation::new(config)?;
    let reporter: Arc<dyn Reporter> = if cli.json {
        Arc::new(TracingReporter)
    } else {
        println!();
        println!(
            "Number of parties that can be formed: {}",
            simulation.config().roles.parties()
        );
        Arc::new(ConsoleReporter::stdout())
    };

    let report = simulation.with_reporter(reporter).run().await?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{}", report.render_summary());
    }

    Ok(())
}
