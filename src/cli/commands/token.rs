use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::auth::TokenSigner;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::store::UserStore;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a token for an existing user")]
    Issue {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Verify a token and print its claims")]
    Verify {
        #[arg(help = "Bearer token")]
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let signer = TokenSigner::from_config(&config.security)?;

    match cmd {
        TokenCommands::Issue { username } => {
            let store = UserStore::new(config.storage.users_file.clone());
            let user = store
                .find(&username)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", username))?;

            let issued = signer.issue(&user)?;

            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": issued.token, "expires_in": issued.expires_in })),
                ),
                OutputFormat::Text => {
                    println!("{}", issued.token);
                    Ok(())
                }
            }
        }
        TokenCommands::Verify { token } => {
            let claims = signer.verify(token.trim())?;
            let expires_at = Utc
                .timestamp_opt(claims.exp, 0)
                .single()
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();

            output_success(
                &output_format,
                &format!("Token valid for '{}' until {}", claims.sub, expires_at),
                Some(json!({ "claims": claims })),
            )
        }
    }
}
