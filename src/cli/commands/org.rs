use anyhow::Context;
use clap::Subcommand;

use crate::database::manager::DatabaseManager;
use crate::database::models::SubscriptionPlan;
use crate::services::OrganizationService;

#[derive(Subcommand)]
pub enum OrgCommands {
    #[command(about = "Create a new organization")]
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
        #[arg(long, help = "FREE | BASIC | PROFESSIONAL | ENTERPRISE (default: FREE trial)")]
        plan: Option<String>,
    },

    #[command(about = "List all organizations")]
    List,
}

fn parse_plan(raw: &str) -> anyhow::Result<SubscriptionPlan> {
    match raw.to_ascii_uppercase().as_str() {
        "FREE" => Ok(SubscriptionPlan::Free),
        "BASIC" => Ok(SubscriptionPlan::Basic),
        "PROFESSIONAL" => Ok(SubscriptionPlan::Professional),
        "ENTERPRISE" => Ok(SubscriptionPlan::Enterprise),
        other => anyhow::bail!("unknown plan: {}", other),
    }
}

pub async fn run(cmd: OrgCommands) -> anyhow::Result<()> {
    let pool = DatabaseManager::pool().await.context("connecting to database")?;
    let service = OrganizationService::new(pool);

    match cmd {
        OrgCommands::Create { name, slug, plan } => {
            let plan = plan.as_deref().map(parse_plan).transpose()?;
            let org = service.create(&name, &slug, plan).await?;
            println!(
                "Created organization {} (id {}, plan {}, status {})",
                org.name,
                org.id,
                org.plan.as_str(),
                org.status.as_str()
            );
        }
        OrgCommands::List => {
            for org in service.list().await? {
                println!(
                    "{:<6} {:<32} {:<20} {:<14} {}",
                    org.id,
                    org.name,
                    org.slug,
                    org.plan.as_str(),
                    org.status.as_str()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_parses_case_insensitively() {
        assert!(matches!(parse_plan("enterprise"), Ok(SubscriptionPlan::Enterprise)));
        assert!(parse_plan("platinum").is_err());
    }
}
