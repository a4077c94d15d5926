use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, user_message, ClientError, ConnectionStatus, DcaClient, JsonRpcWalletProvider,
    PlanDraft,
};
use serde_json::Value;
use shared::domain::{Address, PlanId};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dca", about = "Manage and execute DCA plans from a wallet")]
struct Cli {
    /// Backend base URL; overrides dca.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    /// JSON-RPC endpoint of the wallet node.
    #[arg(long)]
    rpc_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect the wallet and register it with the backend.
    Connect,
    /// List the plans owned by the connected wallet.
    Plans,
    Create {
        amount: String,
        frequency: String,
        to_address: String,
        #[arg(long, default_value = "minutes")]
        unit: String,
        #[arg(long, default_value = "SONIC")]
        token: String,
        #[arg(long, default_value = "low")]
        risk: String,
    },
    Execute {
        plan_id: String,
    },
    Delete {
        plan_id: String,
    },
    History {
        plan_id: String,
    },
    Schedule {
        plan_id: String,
        frequency: String,
    },
    Stop {
        plan_id: String,
    },
    /// Show what the backend knows about a wallet address.
    Wallet {
        address: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(api_url) = cli.api_url {
        settings.api_url = api_url;
    }
    if let Some(rpc_url) = cli.rpc_url {
        settings.wallet_rpc_url = rpc_url;
    }

    let provider = Arc::new(
        JsonRpcWalletProvider::new(&settings.wallet_rpc_url)
            .with_context(|| format!("invalid wallet rpc url {}", settings.wallet_rpc_url))?,
    );
    let client = DcaClient::new(&settings, provider)
        .with_context(|| format!("invalid backend url {}", settings.api_url))?;

    match cli.command {
        Command::Connect => {
            let session = connect(&client).await?;
            if let Some(address) = session.address {
                println!("connected {address}");
            }
        }
        Command::Plans => {
            connect(&client).await?;
            let plans = client.owned_plans().await.map_err(report)?;
            if plans.is_empty() {
                println!("no DCA plans for this wallet");
            }
            for plan in plans {
                println!(
                    "{}  {} {} every {} to {} ({} risk)",
                    plan.id,
                    plan.amount,
                    plan.token,
                    plan.frequency,
                    plan.to_address.short(),
                    plan.risk_level
                );
            }
        }
        Command::Create {
            amount,
            frequency,
            to_address,
            unit,
            token,
            risk,
        } => {
            connect(&client).await?;
            let draft = PlanDraft {
                amount,
                frequency_value: frequency,
                frequency_unit: unit,
                to_address,
                token_symbol: token,
                risk_level: risk,
            };
            let created = client.create_plan(&draft).await.map_err(report)?;
            print_json(&created)?;
        }
        Command::Execute { plan_id } => {
            connect(&client).await?;
            let outcome = client
                .execute_plan(&PlanId::from(plan_id))
                .await
                .map_err(report)?;
            println!("{} (tx {})", outcome.message, outcome.tx_hash);
        }
        Command::Delete { plan_id } => {
            let reply = client
                .gateway()
                .delete_plan(&PlanId::from(plan_id))
                .await
                .map_err(report)?;
            print_json(&reply)?;
        }
        Command::History { plan_id } => {
            let history = client
                .gateway()
                .execution_history(&PlanId::from(plan_id))
                .await
                .map_err(report)?;
            print_json(&history)?;
        }
        Command::Schedule { plan_id, frequency } => {
            let ack = client
                .gateway()
                .schedule_plan(&PlanId::from(plan_id), &frequency)
                .await
                .map_err(report)?;
            println!("{}", ack.message.unwrap_or_default());
        }
        Command::Stop { plan_id } => {
            let reply = client
                .gateway()
                .stop_plan(&PlanId::from(plan_id))
                .await
                .map_err(report)?;
            print_json(&reply)?;
        }
        Command::Wallet { address } => {
            let details = client
                .gateway()
                .wallet_details(&Address::from(address))
                .await
                .map_err(report)?;
            print_json(&details)?;
        }
    }

    Ok(())
}

async fn connect(client: &DcaClient) -> Result<client_core::WalletSession> {
    let session = client.connection().connect().await.map_err(report)?;
    if session.status == ConnectionStatus::Error {
        warn!("wallet connected but backend registration failed");
    }
    Ok(session)
}

fn report(err: ClientError) -> anyhow::Error {
    let message = user_message(&err);
    anyhow::Error::new(err).context(message)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
