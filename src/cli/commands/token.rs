use clap::Args;

use crate::auth::{generate_jwt, Claims};
use crate::database::models::OrgRole;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long)]
    pub user: i64,

    #[arg(long)]
    pub org: i64,

    #[arg(long, default_value = "VIEWER", help = "OWNER | ADMIN | MANAGER | VIEWER")]
    pub role: String,

    /// Superuser tokens bypass tenant isolation. Operator use only.
    #[arg(long, default_value_t = false)]
    pub superuser: bool,
}

pub fn run(args: TokenArgs) -> anyhow::Result<()> {
    let role: OrgRole = args.role.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let claims = Claims::new(args.user, args.org, role, args.superuser);
    let token = generate_jwt(&claims)?;
    println!("{}", token);
    Ok(())
}
