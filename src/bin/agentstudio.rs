use std::path::PathBuf;

use agentstudio::cli::{build_host, task_request};
use agentstudio::utils::LoggingConfig;
use agentstudio::ResultRecord;
use clap::{Parser, Subcommand};
use futures::StreamExt;

#[derive(Parser)]
#[command(name = "agentstudio", version, about = "Agent Studio CLI", author)]
struct Cli {
    /// Settings file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Builtin agent to run
    #[arg(long, global = true, default_value = "echo")]
    agent: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream the answer to a query
    Chat {
        query: String,
        #[arg(long)]
        session: Option<String>,
    },
    /// Create and process a task
    Task {
        #[arg(long = "type", default_value = "general")]
        task_type: String,
        #[arg(long = "param")]
        params: Vec<String>,
    },
    /// Print the agent card
    Card,
}

fn print_record(record: &ResultRecord) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let (settings, host) = build_host(&cli.agent, cli.config.as_deref())?;
    if LoggingConfig::is_debug() {
        LoggingConfig::init();
    } else {
        LoggingConfig::init_with_level(&settings.log_level);
    }

    match cli.command {
        Command::Chat { query, session } => {
            let mut records = host.stream(&query, session, None).await?;
            while let Some(record) = records.next().await {
                print_record(&record)?;
            }
        }
        Command::Task { task_type, params } => {
            let request = task_request(&task_type, &params)?;
            let task = host.create_task(request.clone())?;
            let mut records = host.process_task(request.with_id(task.task_id.clone()));
            while let Some(record) = records.next().await {
                print_record(&record)?;
            }
            drop(records);
            println!(
                "{}",
                serde_json::to_string(&host.get_task_status(&task.task_id))?
            );
        }
        Command::Card => {
            println!("{}", serde_json::to_string_pretty(&host.agent_card())?);
        }
    }
    Ok(())
}
