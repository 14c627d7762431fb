use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use revrec::config::AppConfig;
use revrec::core::model::{AnalysisData, FormInput};
use revrec::core::metrics;
use revrec::core::normalize::normalize;
use revrec::gateway::Gateway;
use revrec::log::init_logging;
use revrec::sync::{SyncOutcome, sync_local_to_remote};
use revrec::ui;
use std::collections::HashMap;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show the active user
    Whoami,
    /// Invalidate the session and clear the cached user
    Logout,
    /// Calculate metrics for one settlement period and save the analysis
    Calc {
        /// Gross billed value, locale-formatted (e.g. "50.889,20")
        #[arg(long)]
        vbv: String,
        /// Client-paid deductions
        #[arg(long, default_value = "0")]
        pagos_cliente: String,
        /// Net settlement component
        #[arg(long, default_value = "0")]
        vrl: String,
        /// Net settlement component (adjustments)
        #[arg(long, default_value = "0")]
        vrlj: String,
        /// Reporting period (e.g. "2026-07")
        #[arg(long)]
        periodo: String,
        /// Additional figures as name=value pairs
        #[arg(long = "extra")]
        extras: Vec<String>,
    },
    /// List saved analyses for the configured tenant
    List,
    /// List analyses whose period contains the given text
    Find { periodo: String },
    /// List analyses entered by one user (defaults to the active user)
    History {
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Delete one analysis by id
    Delete { id: String },
    /// Push locally-cached analyses to the remote store
    Sync,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => run(cmd, cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

async fn run(command: Commands, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    let gateway = Gateway::from_config(&config);

    match command {
        Commands::Setup => unreachable!("Setup command is handled separately"),
        Commands::Whoami => {
            match gateway.current_user().await {
                Some(user) => println!("{} <{}> (tenant {})", user.name, user.email, user.tenant_id),
                None => println!("No active user."),
            }
            Ok(())
        }
        Commands::Logout => {
            gateway.logout().await;
            println!("Signed out.");
            Ok(())
        }
        Commands::Calc {
            vbv,
            pagos_cliente,
            vrl,
            vrlj,
            periodo,
            extras,
        } => {
            let form = FormInput {
                vbv: normalize(&vbv),
                valores_pagos_cliente: normalize(&pagos_cliente),
                vrl: normalize(&vrl),
                vrlj: normalize(&vrlj),
                additional_values: parse_extras(&extras)?,
                periodo,
                tenant_id: config.tenant_id.clone(),
            };

            let validation = metrics::validate_form_data(&form);
            if !ui::print_validation(&validation) {
                bail!("Form data is not valid; nothing was saved");
            }

            let user_id = gateway
                .current_user()
                .await
                .map(|u| u.id)
                .unwrap_or_else(|| "offline".to_string());

            let analysis = AnalysisData::new(&user_id, form);
            ui::print_metrics(&analysis.calculated_data);
            gateway.save_analysis(&analysis).await;
            println!("Saved analysis {}.", analysis.id);
            Ok(())
        }
        Commands::List => {
            let analyses = gateway.load_analyses(&config.tenant_id).await;
            print_analyses(&analyses);
            Ok(())
        }
        Commands::Find { periodo } => {
            let analyses = gateway.analyses_by_period(&config.tenant_id, &periodo).await;
            print_analyses(&analyses);
            Ok(())
        }
        Commands::History { user_id } => {
            let user_id = match user_id {
                Some(id) => id,
                None => match gateway.current_user().await {
                    Some(user) => user.id,
                    None => bail!("No active user; pass --user-id explicitly"),
                },
            };
            let analyses = gateway.analyses_by_user(&user_id, &config.tenant_id).await;
            print_analyses(&analyses);
            Ok(())
        }
        Commands::Delete { id } => {
            gateway.delete_analysis(&id, &config.tenant_id).await;
            println!("Deleted analysis {id}.");
            Ok(())
        }
        Commands::Sync => {
            match sync_local_to_remote(&gateway, &config.tenant_id).await? {
                SyncOutcome::RemoteUnavailable => {
                    println!("Remote store is not configured; nothing synced.")
                }
                SyncOutcome::NothingToSync => println!("No local analyses to sync."),
                SyncOutcome::Synced(count) => println!("Synced {count} analyses."),
            }
            Ok(())
        }
    }
}

fn print_analyses(analyses: &[AnalysisData]) {
    if analyses.is_empty() {
        println!("No analyses found.");
        return;
    }
    println!("{}", ui::analyses_table(analyses));
}

/// Parses repeated `name=value` arguments, normalizing each value.
fn parse_extras(extras: &[String]) -> Result<HashMap<String, f64>> {
    let mut values = HashMap::new();
    for extra in extras {
        let (name, value) = extra
            .split_once('=')
            .with_context(|| format!("Invalid extra value (expected name=value): {extra}"))?;
        values.insert(name.to_string(), normalize(value));
    }
    Ok(values)
}

fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;

    if path.exists() {
        bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let default_config = r#"---
# Isolation boundary for this organization's analyses.
tenant_id: "my-restaurant"

# Uncomment to enable the remote store; without it everything stays local.
# remote:
#   base_url: "https://your-project.supabase.co"
#   api_key: "your-anon-key"
#   access_token: "your-session-token"
"#;

    std::fs::write(&path, default_config)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;

    tracing::info!("Created default configuration at {}", path.display());
    Ok(())
}
