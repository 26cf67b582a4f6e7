//! Client example demonstrating full payment flows against a running server.
//!
//! Starts a stub fraud checker and the payments server in-process, then
//! drives them through the client SDK.
//!
//! Run with: cargo run -p payments-app --example client_example --no-default-features --features sqlite

use axum::{Json, Router, routing::{get, post}};
use chrono::{TimeZone, Utc};
use payments_client::PaymentsClient;
use payments_hex::{
    FraudCheckerClient, FraudCheckerSettings, PaymentService, ResiliencyStrategy,
    inbound::HttpServer,
};
use payments_repo::build_repo;
use payments_types::{CreditCard, Currency, FraudCheckRequest, FraudStatus, Item, Money, Order};
use rust_decimal::Decimal;
use std::net::SocketAddr;
use tempfile::tempdir;
use tokio::net::TcpListener;

/// Stub verdicts keyed on the card holder.
async fn check(Json(req): Json<FraudCheckRequest>) -> Json<FraudStatus> {
    let overall = match req.credit_card.holder_name.as_str() {
        "Mallory" => FraudStatus::FAIL,
        "Eve" => "suspicious",
        _ => FraudStatus::PASS,
    };
    Json(FraudStatus::new(overall))
}

async fn spawn(router: Router) -> anyhow::Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("server stopped: {e}");
        }
    });
    Ok(addr)
}

fn card(holder: &str) -> CreditCard {
    CreditCard {
        number: "4111111111111111".into(),
        holder_name: holder.into(),
        issuing_bank: "Example Bank".into(),
        valid_until: Utc.with_ymd_and_hms(2030, 1, 31, 0, 0, 0).unwrap(),
        cvv: 123,
    }
}

fn order(id: &str) -> anyhow::Result<Order> {
    let book = Money::new(Decimal::new(123545, 2), Currency::INR)?;
    Ok(Order::new(
        id,
        vec![Item {
            id: 1,
            name: "Rust in Action".into(),
            price: book,
            quantity: 1,
        }],
    )?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().with_env_filter("info").init();

    // Stub fraud checker
    let fraud_router = Router::new()
        .route("/ping", get(|| async { "pong" }))
        .route("/check", post(check));
    let fraud_addr = spawn(fraud_router).await?;

    // Use a temp file-backed SQLite DB
    let tmp = tempdir()?;
    let db_path = tmp.path().join("payments.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    println!("🚀 Starting server...");
    println!("   Database: {db_url}");
    println!("   Fraud checker: http://{fraud_addr}");

    // Build repository (handles connection and migration)
    let repo = build_repo(&db_url).await?;

    let settings = FraudCheckerSettings {
        base_url: format!("http://{fraud_addr}"),
        strategy: ResiliencyStrategy::Retry,
        ..FraudCheckerSettings::default()
    };
    let fraud_checker = FraudCheckerClient::from_settings(&settings)?;

    let service = PaymentService::new(repo, fraud_checker);
    let server = HttpServer::new(service);
    let addr = spawn(server.router()).await?;

    // Create client
    let client = PaymentsClient::new(format!("http://{addr}")).with_client_id("example");

    // ─────────────────────────────────────────────────────────────────────────
    // Demo: Full payment flow
    // ─────────────────────────────────────────────────────────────────────────

    let pong = client.ping().await?;
    println!("✅ Server ping: {pong}");

    let order_a = order("ORDER-A")?;
    println!("   Order total: {}", order_a.amount());

    let reference = client.pay(&order_a, &card("Alice")).await?;
    println!("✅ Alice paid: {reference:?}");

    let reference = client.pay(&order("ORDER-M")?, &card("Mallory")).await?;
    println!("✅ Mallory paid: {reference:?}");

    let reference = client.pay(&order("ORDER-E")?, &card("Eve")).await?;
    println!("✅ Eve paid (no decision expected): {reference:?}");

    // Paying twice for the same order is a conflict
    let again = client.pay(&order_a, &card("Alice")).await;
    println!("✅ Second payment for ORDER-A rejected: {}", again.is_err());

    println!("\n📋 Recorded transactions:");
    for order_id in ["ORDER-A", "ORDER-M", "ORDER-E"] {
        match client.transaction_for_order(order_id).await {
            Ok(tx) => println!("   - {order_id}: {} {} ({})", tx.status, tx.value, tx.id),
            Err(e) => println!("   - {order_id}: {e}"),
        }
    }

    println!("\n🎉 Example completed successfully!");

    Ok(())
}
