use anyhow::Context;
use clap::Subcommand;

use crate::database::manager::DatabaseManager;
use crate::migrations::Migrator;

#[derive(Subcommand)]
pub enum MigrateCommands {
    #[command(about = "Apply all pending migrations")]
    Up,

    #[command(about = "Revert the most recent applied migrations")]
    Down {
        #[arg(long, default_value_t = 1, help = "How many migrations to revert")]
        steps: usize,
    },

    #[command(about = "Show which migrations are applied")]
    Status,
}

pub async fn run(cmd: MigrateCommands) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await.context("connecting to database")?;
    let migrator = Migrator::new();

    match cmd {
        MigrateCommands::Up => {
            let ran = migrator.up(&pool).await.context("applying migrations")?;
            println!("Applied {} migration(s)", ran);
        }
        MigrateCommands::Down { steps } => {
            let ran = migrator.down(&pool, steps).await.context("reverting migrations")?;
            println!("Reverted {} migration(s)", ran);
        }
        MigrateCommands::Status => {
            for (name, applied) in migrator.status(&pool).await? {
                let marker = if applied { "applied" } else { "pending" };
                println!("{:<32} {}", name, marker);
            }
        }
    }

    Ok(())
}
