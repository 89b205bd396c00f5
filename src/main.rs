mod auth;
mod config;
mod generate;
mod models;
mod server;
mod storage;

use anyhow::Context;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "pixel-builder", version, about = "Pixel Builder AI backend")]
struct Cli {
    /// Override config file path.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP API server (default).
    Serve,
    /// Generate pixel art and print the result JSON (headless).
    Generate {
        prompt: String,
        /// Canvas size as WIDTHxHEIGHT.
        #[arg(long, default_value = "32x32")]
        size: String,
        /// Palette style: pixel, retro or modern.
        #[arg(long, default_value = "pixel")]
        style: String,
    },
    /// Print the available styles and sizes as JSON.
    Styles,
    /// Account administration.
    User {
        #[command(subcommand)]
        cmd: UserCommand,
    },
}

#[derive(Debug, Subcommand)]
enum UserCommand {
    /// List registered accounts.
    List,
    /// Allow an account to log in again.
    Activate { email: String },
    /// Block an account and revoke its tokens.
    Deactivate { email: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref()).context("load config")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            server::serve(&cfg).await?;
        }
        Command::Generate {
            prompt,
            size,
            style,
        } => {
            let req = generate::GenerationRequest {
                prompt,
                size,
                style,
                colors: Some(16),
            };
            let result = generate::generate(&req, &mut rand::rng())?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Styles => {
            println!("{}", serde_json::to_string_pretty(&generate::catalogue())?);
        }
        Command::User { cmd } => {
            let storage = storage::StorageHandle::new(cfg.database_path())?.open()?;
            match cmd {
                UserCommand::List => {
                    for u in storage.list_users()? {
                        println!(
                            "{:>4}. {} <{}>{}",
                            u.id,
                            u.username,
                            u.email,
                            if u.is_active { "" } else { "  (inactive)" }
                        );
                    }
                }
                UserCommand::Activate { email } => {
                    set_active(&storage, &email, true)?;
                }
                UserCommand::Deactivate { email } => {
                    set_active(&storage, &email, false)?;
                }
            }
        }
    }

    Ok(())
}

fn set_active(storage: &storage::Storage, email: &str, active: bool) -> anyhow::Result<()> {
    if !storage.set_user_active(email, active, models::now_unix())? {
        anyhow::bail!("no account with email {email}");
    }
    println!(
        "{} {email}.",
        if active { "Activated" } else { "Deactivated" }
    );
    Ok(())
}
