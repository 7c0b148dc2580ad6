//! `oso-cloud` - command-line client for Oso Cloud.
//!
//! Every command prints its result as JSON on stdout; logs go to stderr.

mod cli;
mod config;

use anyhow::Context;
use clap::Parser;
use oso_cloud::OsoCloud;
use oso_cloud_sdk::OsoCloudClient;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command, parse_fact, parse_pattern, parse_value};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = config::load(cli.config.as_deref())?;
    let oso = OsoCloud::new(&config).context("failed to create Oso Cloud client")?;

    let output = run(&oso, &cli.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(oso: &OsoCloud, command: &Command) -> anyhow::Result<serde_json::Value> {
    let output = match command {
        Command::Authorize {
            actor,
            action,
            resource,
        } => {
            let allowed = oso
                .authorize(&parse_value(actor)?, action, &parse_value(resource)?, &[])
                .await?;
            json!({ "allowed": allowed })
        }
        Command::List {
            actor,
            action,
            resource_type,
        } => {
            let ids = oso
                .list(&parse_value(actor)?, action, resource_type, &[])
                .await?;
            json!(ids)
        }
        Command::Actions { actor, resource } => {
            let actions = oso
                .actions(&parse_value(actor)?, &parse_value(resource)?, &[])
                .await?;
            json!(actions)
        }
        Command::Tell { predicate, args } => {
            oso.insert(&parse_fact(predicate, args)?).await?;
            json!({ "offset": oso.causal_offset() })
        }
        Command::Delete { predicate, args } => {
            oso.delete(&parse_pattern(predicate, args)?).await?;
            json!({ "offset": oso.causal_offset() })
        }
        Command::Get { predicate, args } => {
            let facts = oso.get(&parse_pattern(predicate, args)?).await?;
            serde_json::to_value(facts)?
        }
        Command::Policy { file } => {
            let src = std::fs::read_to_string(file)
                .with_context(|| format!("failed to read policy {}", file.display()))?;
            oso.policy(&src).await?;
            json!({ "offset": oso.causal_offset() })
        }
        Command::PolicyMetadata => serde_json::to_value(oso.policy_metadata().await?)?,
    };
    Ok(output)
}
