//! Payments CLI
//!
//! Command-line interface for the Payments API.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use payments_client::PaymentsClient;
use payments_types::{PaymentRequest, TransactionId};

#[derive(Parser)]
#[command(name = "payments")]
#[command(author, version, about = "Payments API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Payments API
    #[arg(
        long,
        env = "PAYMENTS_API_URL",
        default_value = "http://localhost:3000"
    )]
    api_url: String,

    /// Client identifier sent as `X-Client-Id`
    #[arg(long, env = "PAYMENTS_CLIENT_ID")]
    client_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the API is up
    Ping,
    /// Pay for an order
    Pay {
        /// JSON file with `{"order": {...}, "creditCard": {...}}`
        #[arg(long)]
        file: PathBuf,
    },
    /// Transaction lookups
    Transaction {
        #[command(subcommand)]
        action: TransactionCommands,
    },
}

#[derive(Subcommand)]
enum TransactionCommands {
    /// Get a transaction by ID
    Get {
        /// Transaction ID (UUID)
        id: String,
    },
    /// Get the transaction recorded for an order
    Order {
        /// Order ID
        order_id: String,
    },
}

fn parse_transaction_id(s: &str) -> Result<TransactionId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid transaction ID: {}", s))
}

fn read_payment_request(path: &Path) -> Result<PaymentRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid payment request in {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut client = PaymentsClient::new(&cli.api_url);
    if let Some(id) = cli.client_id {
        client = client.with_client_id(id);
    }

    match cli.command {
        Commands::Ping => {
            let reply = client.ping().await?;
            println!("✓ {}", reply.trim());
        }

        Commands::Pay { file } => {
            let req = read_payment_request(&file)?;
            match client.pay_request(&req).await? {
                Some(reference) => println!("{}", serde_json::to_string_pretty(&reference)?),
                None => {
                    println!("✗ No fraud decision was reached for order {}", req.order.id);
                    std::process::exit(1);
                }
            }
        }

        Commands::Transaction { action } => match action {
            TransactionCommands::Get { id } => {
                let transaction_id = parse_transaction_id(&id)?;
                let tx = client.get_transaction(transaction_id).await?;
                println!("{}", serde_json::to_string_pretty(&tx)?);
            }
            TransactionCommands::Order { order_id } => {
                let tx = client.transaction_for_order(&order_id).await?;
                println!("{}", serde_json::to_string_pretty(&tx)?);
            }
        },
    }

    Ok(())
}
