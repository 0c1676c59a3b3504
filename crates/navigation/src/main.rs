use anyhow::{Context, bail};

use gatehouse_auth::Role;
use gatehouse_navigation::{NavigationConfig, RouteCheck};

const USAGE: &str = "usage: gatehouse-check <role> <path>...";

fn main() -> anyhow::Result<()> {
    gatehouse_observability::init();

    let mut args = std::env::args().skip(1);
    let role = Role::new(args.next().context(USAGE)?);
    let paths: Vec<String> = args.collect();
    if paths.is_empty() {
        bail!(USAGE);
    }

    let config = NavigationConfig::from_env()?;
    let table = config.load_table()?;
    tracing::debug!(version = table.version(), %role, "checking routes");

    for path in &paths {
        let check = RouteCheck::evaluate(&table, &role, path);
        println!("{}", serde_json::to_string(&check)?);
    }

    Ok(())
}
