use anyhow::Result;
use clap::Parser;
use nr_sync::registry::AppRegistryClient;
use nr_sync::secrets::SecretsManagerProvider;
use nr_sync::{SyncConfig, run_sync};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Debug, Parser)]
#[command(
    name = "nr-appregistry",
    about = "Synchronize New Relic application inventory into AWS Service Catalog AppRegistry"
)]
struct Cli {
    /// Secrets Manager ARN of the secret holding the New Relic user key
    #[arg(long, env = "NewRelicUserKeySecretARN")]
    user_key_secret_arn: String,

    /// NerdGraph API endpoint the discovery query is posted to
    #[arg(long, env = "NewRelicNerdGraphEndPoint")]
    nerdgraph_endpoint: String,

    /// Directory holding the attribute group schema bundles
    #[arg(long, default_value = "schemas")]
    schema_dir: String,

    /// Name prefix for registry applications
    #[arg(long, default_value = "NewRelic")]
    namespace: String,

    /// AWS region override
    #[arg(long)]
    region: Option<String>,

    /// Opaque trigger payload, logged for traceability only
    #[arg(long)]
    event: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Some(event) = &cli.event {
        info!(event = %event, "Invocation event");
    }

    let config = SyncConfig {
        nerdgraph_endpoint: cli.nerdgraph_endpoint,
        user_key_secret_arn: cli.user_key_secret_arn,
        namespace: cli.namespace,
        schema_dir: cli.schema_dir,
        region: cli.region,
        registry_endpoint: None,
        secrets_endpoint: None
    };

    let secrets =
        SecretsManagerProvider::new(config.region.clone(), config.secrets_endpoint.clone()).await;
    let registry = Arc::new(
        AppRegistryClient::new(config.region.clone(), config.registry_endpoint.clone()).await
    );

    let report = run_sync(&config, &secrets, registry).await?;
    println!("{}", report.summary());

    Ok(())
}
