use clap::Subcommand;
use serde_json::json;

use crate::auth::password::hash_password_blocking;
use crate::cli::utils::{output_empty_collection, output_success, read_line_from_stdin};
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::store::{normalize_email, User, UserStore};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Add a user to the users file")]
    Add {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Email address")]
        email: Option<String>,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "List stored users")]
    List,

    #[command(about = "Remove a user from the users file")]
    Remove {
        #[arg(help = "Username")]
        username: String,
    },
}

pub async fn handle(cmd: UserCommands, config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = UserStore::new(config.storage.users_file.clone());

    match cmd {
        UserCommands::Add { username, email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_line_from_stdin("Password: ")?,
            };
            if username.trim().is_empty() || password.is_empty() {
                anyhow::bail!("username and password must not be empty");
            }

            let hash = hash_password_blocking(password, config.security.bcrypt_cost).await?;
            let user = User::new(username, hash, normalize_email(email));
            let profile = user.profile();
            store.insert(user).await?;

            output_success(
                &output_format,
                &format!("User '{}' added to {}", profile.username, store.path().display()),
                Some(json!({ "user": profile })),
            )
        }
        UserCommands::List => {
            let users = store.load().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users found");
            }

            match output_format {
                OutputFormat::Json => {
                    let profiles: Vec<_> = users.iter().map(User::profile).collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": profiles }))?);
                }
                OutputFormat::Text => {
                    for user in &users {
                        match &user.email {
                            Some(email) => println!("{} <{}>", user.username, email),
                            None => println!("{}", user.username),
                        }
                    }
                }
            }
            Ok(())
        }
        UserCommands::Remove { username } => {
            let removed = store.remove(&username).await?;
            output_success(
                &output_format,
                &format!("User '{}' removed", removed.username),
                None,
            )
        }
    }
}
