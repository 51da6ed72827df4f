pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fleetctl")]
#[command(about = "FleetOps CLI - schema migrations and tenant administration")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Schema migration management")]
    Migrate {
        #[command(subcommand)]
        cmd: commands::migrate::MigrateCommands,
    },

    #[command(about = "Organization (tenant) administration")]
    Org {
        #[command(subcommand)]
        cmd: commands::org::OrgCommands,
    },

    #[command(about = "Mint a JWT for an organization member")]
    Token(commands::token::TokenArgs),
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Migrate { cmd } => commands::migrate::run(cmd).await,
        Commands::Org { cmd } => commands::org::run(cmd).await,
        Commands::Token(args) => commands::token::run(args),
    }
}
