pub mod commands;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "authctl")]
#[command(about = "authctl - manage the users file and inspect bearer tokens")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "Users file (defaults to USERS_FILE or users.json)")]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Manage user records")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "Issue and verify bearer tokens")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut config = AppConfig::from_env();
    if let Some(file) = cli.file {
        config.storage.users_file = file;
    }

    dispatch(cli.command, &config, output_format).await
}

async fn dispatch(command: Commands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    config.validate()?;

    match command {
        Commands::User { cmd } => commands::user::handle(cmd, config, output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, config, output_format).await,
    }
}
