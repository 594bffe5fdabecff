//! A tiny `kubectl get` over discovered kinds:
//! get <Kind> [name] [-n namespace] [-o yaml]
use anyhow::{bail, Result};
use kubekind::{
    core::{FetchParams, Payload},
    Client, Discovery,
};
use tracing::*;

#[derive(clap::Parser)]
struct App {
    #[arg(long, short, value_enum, default_value_t)]
    output: OutputMode,
    #[arg(long, short)]
    namespace: Option<String>,
    /// Kind as registered, e.g. Deployment
    kind: String,
    name: Option<String>,
}

#[derive(clap::ValueEnum, Clone, Copy, Default, PartialEq, Eq)]
enum OutputMode {
    #[default]
    Json,
    Yaml,
}

impl From<OutputMode> for FetchParams {
    fn from(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Json => FetchParams::json(),
            OutputMode::Yaml => FetchParams::yaml(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let app: App = clap::Parser::parse();
    let discovery = Discovery::new(Client::try_default()?);

    let params = FetchParams::from(app.output);
    let fetched = discovery
        .fetch_resource(app.name.as_deref(), &app.kind, app.namespace.as_deref(), &params)
        .await?;
    let Some(payload) = fetched else {
        let known = discovery.resource_kinds_prioritized().await?;
        let hint: Vec<_> = known.iter().take(5).map(|r| r.kind.as_str()).collect();
        bail!("kind {} is not served, try one of {}", app.kind, hint.join(", "));
    };
    debug!(kind = %app.kind, "Fetched");

    match payload {
        Payload::Json(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Payload::Yaml(text) => print!("{text}"),
    }
    Ok(())
}
