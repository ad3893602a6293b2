pub mod commands;

use clap::{Parser, Subcommand};
use serde::Serialize;
use sqlx::PgPool;

use crate::config;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "chatctl")]
#[command(about = "chatctl - administration for the chat API database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Populate the database with demo users, chats and messages")]
    Seed,

    #[command(about = "Create a staff superuser account")]
    CreateSuperuser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        email: String,
    },
}

#[derive(Debug, Clone, Copy)]
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

    /// Print a result either as its text line or as pretty JSON
    pub fn print<T: Serialize>(self, text: &str, value: &T) -> anyhow::Result<()> {
        match self {
            OutputFormat::Text => println!("{text}"),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        }
        Ok(())
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    let pool = DatabaseManager::connect(&config::config().database)?;
    DatabaseManager::migrate(&pool).await?;
    Ok(pool)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let pool = connect().await?;

    let result = match cli.command {
        Commands::Migrate => output_format.print("Migrations applied", &serde_json::json!({ "migrated": true })),
        Commands::Seed => commands::seed::handle(&pool, output_format).await,
        Commands::CreateSuperuser {
            username,
            password,
            email,
        } => commands::superuser::handle(&pool, &username, &password, &email, output_format).await,
    };

    pool.close().await;
    result
}
