//! # Payments Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Initialize the repository adapter
//! - Build the fraud checker for the configured resiliency strategy
//! - Create the payment service
//! - Start the HTTP server

mod config;

use opentelemetry::global;
use opentelemetry_sdk::{
    metrics::SdkMeterProvider, propagation::TraceContextPropagator, trace as sdktrace,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payments_hex::{FraudCheckerClient, PaymentService, inbound::HttpServer};
use payments_repo::build_repo;
use payments_types::FraudChecker;

/// OTLP exporters, installed only when an endpoint is configured.
struct Telemetry {
    tracer_provider: sdktrace::SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    fn init() -> anyhow::Result<(sdktrace::Tracer, Self)> {
        global::set_text_map_propagator(TraceContextPropagator::new());

        // Use gRPC exporter with batch processing (non-blocking)
        let span_exporter = opentelemetry_otlp::SpanExporter::builder()
            .with_tonic()
            .build()?;
        let tracer_provider = sdktrace::SdkTracerProvider::builder()
            .with_batch_exporter(span_exporter)
            .build();
        global::set_tracer_provider(tracer_provider.clone());

        // HTTP metrics layer reads the global meter provider
        let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .build()?;
        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(metric_exporter)
            .build();
        global::set_meter_provider(meter_provider.clone());

        use opentelemetry::trace::TracerProvider as _;
        let tracer = tracer_provider.tracer("payments-service");

        Ok((
            tracer,
            Self {
                tracer_provider,
                meter_provider,
            },
        ))
    }

    fn shutdown(self) {
        // Flush before exit
        let _ = self.tracer_provider.shutdown();
        let _ = self.meter_provider.shutdown();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let (otel_layer, telemetry) = if std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT").is_some() {
        let (tracer, telemetry) = Telemetry::init()?;
        (
            Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Some(telemetry),
        )
    } else {
        (None, None)
    };

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,payments_app=debug,payments_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting payments server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_target());

    // Build repository (handles connection and migration)
    let repo = build_repo(&config.database_url).await?;

    let fraud_checker = FraudCheckerClient::from_settings(&config.fraud_checker)?;
    tracing::info!(
        base_url = %config.fraud_checker.base_url,
        strategy = %fraud_checker.strategy(),
        "Fraud checker configured"
    );

    // The remote service may come up later; a failed probe is not fatal
    match fraud_checker.ping().await {
        Ok(reply) => tracing::info!(reply = %reply.trim(), "Fraud checker reachable"),
        Err(e) => tracing::warn!(error = %e, "Fraud checker ping failed"),
    }

    // Create the payment service
    let service = PaymentService::new(repo, fraud_checker);

    // Create and run the HTTP server
    let server = HttpServer::with_rate_limit(service, config.rate_limit_per_minute);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    if let Some(telemetry) = telemetry {
        telemetry.shutdown();
    }
    Ok(())
}
