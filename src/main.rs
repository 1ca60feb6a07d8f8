//! # Taskpilot
//!
//! Natural-language task assistant: books meetings, sends email and
//! reminders, and mails digests on a schedule.
//!
//! Usage:
//!   taskpilot serve                      # Scheduler + HTTP gateway
//!   taskpilot run "email bob@x.com ..."  # Process one task and exit
//!   taskpilot ask "plan my week"         # Text-generator reply only
//!   taskpilot tick                       # One scheduler pass now

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use taskpilot_agent::Agent;
use taskpilot_core::config::TaskpilotConfig;
use taskpilot_scheduler::{PeriodicScheduler, SchedulerSettings};

#[derive(Parser)]
#[command(
    name = "taskpilot",
    version,
    about = "📋 Taskpilot: calendar, email and reminders from plain sentences"
)]
struct Cli {
    /// Config file (default: ~/.taskpilot/config.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the scheduler and the HTTP gateway
    Serve {
        /// Override the gateway port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Process one task and print the outcome as JSON
    Run { task: String },
    /// Send text to the language model and print its reply
    Ask { text: String },
    /// Run one scheduler pass against the current time
    Tick,
}

struct Services {
    agent: Arc<Agent>,
    scheduler: Arc<PeriodicScheduler>,
}

fn load_config(path: Option<&str>) -> Result<TaskpilotConfig> {
    let mut config = match path {
        Some(p) => TaskpilotConfig::load_from(&TaskpilotConfig::expand_path(p))?,
        None => TaskpilotConfig::load()?,
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

fn build_services(config: &TaskpilotConfig) -> Result<Services> {
    let tz = config.timezone()?;
    let generator = taskpilot_providers::create_provider(&config.llm)?;
    let calendar = taskpilot_channels::create_calendar(config, tz)?;
    let mailer = taskpilot_channels::create_mailer(config)?;

    tracing::info!(
        "✅ Collaborators: generator={}, calendar={}, mailer={} ({})",
        generator.name(),
        calendar.name(),
        mailer.name(),
        tz.name()
    );

    let agent = Agent::new(
        generator,
        calendar.clone(),
        mailer.clone(),
        config.user.email.clone(),
        tz,
    );
    let scheduler = PeriodicScheduler::new(SchedulerSettings::from_config(config)?, calendar, mailer);

    Ok(Services {
        agent: Arc::new(agent),
        scheduler: Arc::new(scheduler),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "taskpilot=debug,tower_http=debug"
    } else {
        "taskpilot=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    let services = build_services(&config)?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if config.scheduler.enabled {
                services.scheduler.start()?;
            } else {
                tracing::info!("Scheduler disabled in config");
            }

            let state = taskpilot_gateway::AppState::new(
                services.agent.clone(),
                services.scheduler.clone(),
            );
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {e}");
                }
                tracing::info!("Shutting down...");
            };
            taskpilot_gateway::start(&config.gateway, state, shutdown).await?;

            if config.scheduler.enabled {
                services.scheduler.stop().await?;
            }
        }
        Command::Run { task } => {
            let outcome = services.agent.process_task(&task).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Ask { text } => {
            let reply = services.agent.process_command(&text).await?;
            println!("{reply}");
        }
        Command::Tick => {
            let report = services.scheduler.evaluate(chrono::Utc::now()).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
