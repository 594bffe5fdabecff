//! Lists every listable kind the cluster serves, most commonly used kinds first.
//! Kinds served by more than one group are reported at the end.
use kubekind::{Client, Discovery};
use tracing::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let client = Client::try_default()?;
    info!(environment = %client.environment(), "Discovering kinds");
    let discovery = Discovery::new(client);

    for res in discovery.resource_kinds_prioritized().await?.iter() {
        let scope = if res.namespaced { "namespaced" } else { "cluster" };
        println!("{:<32} {:<36} {:<40} {}", res.kind, res.api_version, res.name, scope);
    }

    let registry = discovery.resource_kinds().await?;
    for conflict in registry.conflicts() {
        println!(
            "# {} is also served by {}, using {}",
            conflict.kind, conflict.discarded, conflict.kept
        );
    }
    Ok(())
}
