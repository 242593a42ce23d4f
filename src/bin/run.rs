// Omniflow pipeline runner
// Run with: cargo run --bin omniflow-run -- app.json --inputs inputs.json

//! # Omniflow Runner Binary
//!
//! Loads an app definition from a JSON file, optionally a per-component
//! inputs file, and executes the pipeline against live endpoints, printing
//! each step transition as it happens. Streaming steps print their partial
//! text inline.
//!
//! The inputs file maps component id to that step's parameter values:
//!
//! ```json
//! { "comp-1": { "prompt": "Hello", "model": "gpt-4o" } }
//! ```

use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use omniflow::{
    App, AppRepository, Context, InMemoryAppRepository, ProcessEnvSettings, ReqwestClient,
    StepStatus, StepUpdate, WorkflowEngine,
};

#[derive(Parser)]
#[command(name = "omniflow-run", about = "Execute an Omniflow app definition")]
struct Args {
    /// Path to the app definition JSON file
    app: PathBuf,

    /// Path to a JSON file with per-component input values
    #[arg(long)]
    inputs: Option<PathBuf>,

    /// Print full step results instead of a summary line
    #[arg(long)]
    verbose: bool,
}

fn print_update(update: &StepUpdate, verbose: bool) {
    match update.status {
        StepStatus::Pending => {}
        StepStatus::Running => match &update.result {
            // Streaming partial: overwrite the current line with running text
            Some(partial) => {
                let text = partial.as_str().unwrap_or_default();
                let tail: String = text
                    .chars()
                    .rev()
                    .take(60)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                print!("\r  {} {}", "...".dimmed(), tail.replace('\n', " ").dimmed());
                let _ = std::io::Write::flush(&mut std::io::stdout());
            }
            None => println!("{} {}", "▶".blue(), update.component_id.bold()),
        },
        StepStatus::Success => {
            println!("\r{} {}", "✓".green(), update.component_id.bold());
            if verbose {
                if let Some(data) = &update.result {
                    let pretty =
                        serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
                    println!("{}", pretty.dimmed());
                }
            }
        }
        StepStatus::Error => {
            println!(
                "\r{} {} {}",
                "✗".red(),
                update.component_id.bold(),
                update.error.as_deref().unwrap_or("unknown error").red()
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env is optional; keys referenced as {{env.*}} come from here
    let _ = dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    let app: App = serde_json::from_str(&std::fs::read_to_string(&args.app)?)?;
    app.validate()?;
    info!(app = %app.id, "loaded app definition");

    let inputs: HashMap<String, Context> = match &args.inputs {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => HashMap::new(),
    };

    let apps = Arc::new(InMemoryAppRepository::new());
    apps.save_app(app.clone()).await?;

    let engine = WorkflowEngine::new(
        apps,
        Arc::new(ReqwestClient::new()),
        Arc::new(ProcessEnvSettings),
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let verbose = args.verbose;
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            print_update(&update, verbose);
        }
    });

    println!("{} {}", "Running".bold(), app.name);
    let outcome = engine
        .execute_app(&app.id, &inputs, &tx, Context::new())
        .await;

    drop(tx);
    printer.await?;
    outcome?;

    Ok(())
}
