//! gatehouse - Gateway API policy translation and proxy infrastructure

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use kube::{CustomResourceExt, ResourceExt};
use serde_json::json;
use tracing::info;

use gatehouse_common::config::GatewayConfig;
use gatehouse_common::crd::ProxyPatchPolicy;
use gatehouse_common::telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use gatehouse_infra::{build_client, build_store, new_manager, InfraEvent, InfraRunner};
use gatehouse_operator::{translator_config, Snapshot};
use gatehouse_translator::Translator;

/// gatehouse - attaches proxy patch policies to gateways and manages proxy fleets
#[derive(Parser, Debug)]
#[command(name = "gatehouse", version, about, long_about = None)]
struct Cli {
    /// Generate CRD manifests and exit
    #[arg(long)]
    crd: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogOutput::Json, global = true)]
    log_format: LogOutput,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogOutput {
    Json,
    Pretty,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run one translation pass over a snapshot and print the IR and
    /// policy statuses as JSON
    Translate {
        /// Multi-document YAML with Gateways and ProxyPatchPolicies
        #[arg(long)]
        snapshot: PathBuf,
        /// Gateway configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Create or update the proxy fleets for a snapshot's Gateways in the
    /// current cluster
    ApplyInfra {
        /// Multi-document YAML with Gateways
        #[arg(long)]
        snapshot: PathBuf,
        /// Gateway configuration file; defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.crd {
        let crd = serde_yaml::to_string(&ProxyPatchPolicy::crd())
            .map_err(|e| anyhow::anyhow!("Failed to serialize CRD: {}", e))?;
        println!("{crd}");
        return Ok(());
    }

    init_telemetry(TelemetryConfig {
        filter: None,
        format: match cli.log_format {
            LogOutput::Json => LogFormat::Json,
            LogOutput::Pretty => LogFormat::Pretty,
        },
    })?;

    match cli.command {
        Some(Commands::Translate { snapshot, config }) => {
            translate(&snapshot, config.as_deref())
        }
        Some(Commands::ApplyInfra { snapshot, config }) => {
            apply_infra(&snapshot, config.as_deref()).await
        }
        None => {
            anyhow::bail!("no command given; see --help")
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<GatewayConfig> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
            Ok(GatewayConfig::from_yaml(&raw)?)
        }
        None => Ok(GatewayConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> anyhow::Result<Snapshot> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    Ok(Snapshot::from_yaml(&raw)?)
}

fn translate(snapshot_path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut snapshot = load_snapshot(snapshot_path)?;
    let mut ir = snapshot.xds_ir(&config)?;

    let translator = Translator::new(translator_config(&config));
    let outcomes = translator.process_patch_policies(&mut snapshot.policies, &mut ir);
    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    info!(
        policies = outcomes.len(),
        accepted,
        bundles = ir.len(),
        "translation pass complete"
    );

    let statuses: Vec<_> = snapshot
        .policies
        .iter()
        .map(|p| {
            json!({
                "namespace": p.namespace(),
                "name": p.name_any(),
                "status": p.status,
            })
        })
        .collect();
    let output = json!({ "xdsIR": ir, "policies": statuses });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn apply_infra(snapshot_path: &Path, config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let snapshot = load_snapshot(snapshot_path)?;
    let infra = snapshot.infra(&config);

    let client = build_client(&config).await?;
    let store = build_store(client, &config);
    let manager = new_manager(&config, store)?;

    let runner = InfraRunner::new(manager, config.rate_limit.enabled);
    runner.start().await?;
    info!(fleets = infra.len(), "applying proxy infrastructure");
    runner
        .run(futures::stream::iter(infra.into_iter().map(InfraEvent::Upsert)))
        .await;
    Ok(())
}
