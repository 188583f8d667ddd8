use std::sync::Arc;

use clap::Parser;
use futures::future::join_all;
use tokio::signal;
use tokio::task::JoinError;
use tracing::{info, warn, Level};
use uuid::Uuid;

use crpt_client::client::{ApiResponse, DocumentSubmitter};
use crpt_client::config::ClientConfig;
use crpt_client::document::{Document, Product};
use crpt_client::error::CrptError;
use crpt_client::ratelimit::RateGate;

/// Taxpayer ids used for the demo documents.
const DEMO_OWNER_INN: &str = "7712345678";
const DEMO_PRODUCER_INN: &str = "7709876543";

#[derive(Parser, Debug)]
#[command(name = "crpt-client", version, about = "Rate-limited CRPT document submission demo")]
struct Args {
    /// Access token for the registry API
    #[arg(long)]
    token: String,

    /// Path to a YAML configuration file
    #[arg(long)]
    config: Option<String>,

    /// Number of demo documents to submit
    #[arg(long, default_value_t = 5)]
    count: u32,

    /// Override the configured requests-per-window limit
    #[arg(long)]
    limit: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    info!("Starting CRPT document submission demo");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(limit) = args.limit {
        config.rate_limit.request_limit = limit;
    }
    config.validate()?;
    info!(
        base_url = %config.api.base_url,
        request_limit = config.rate_limit.request_limit,
        window = ?config.rate_limit.window,
        "Configuration loaded"
    );

    let gate = Arc::new(RateGate::new(
        config.rate_limit.request_limit,
        config.rate_limit.window,
    ));
    let submitter = Arc::new(DocumentSubmitter::new(gate.clone(), &config.api)?);

    // Fire all submissions at once; the gate spreads them across windows.
    let workers: Vec<_> = (0..args.count)
        .map(|sequence| {
            let submitter = submitter.clone();
            let token = args.token.clone();
            tokio::spawn(async move {
                let document = sample_document(sequence);
                let response = submitter.submit(&token, &document).await?;
                if !response.is_success() {
                    warn!(
                        doc_id = %document.doc_id,
                        status = response.status,
                        body = %response.body,
                        "registry rejected the document"
                    );
                }
                Ok::<_, CrptError>(response)
            })
        })
        .collect();

    // Run the submissions with graceful shutdown on Ctrl+C
    let mut demo = join_all(workers);
    tokio::select! {
        results = &mut demo => {
            summarize(results);
        }
        _ = shutdown_signal() => {
            gate.close();
            summarize(demo.await);
        }
    }

    info!("CRPT document submission demo stopped");
    Ok(())
}

/// Log how the demo run went.
fn summarize(results: Vec<Result<Result<ApiResponse, CrptError>, JoinError>>) {
    let mut delivered = 0;
    let mut cancelled = 0;
    let mut failed = 0;
    for result in results {
        match result {
            Ok(Ok(_)) => delivered += 1,
            Ok(Err(CrptError::Cancelled(_))) => cancelled += 1,
            _ => failed += 1,
        }
    }
    info!(delivered, cancelled, failed, "demo run finished");
}

/// Build a demo goods-introduction document.
fn sample_document(sequence: u32) -> Document {
    let today = chrono::Utc::now().format("%Y-%m-%d").to_string();
    Document {
        description: format!("Demo introduction #{}", sequence),
        doc_id: Uuid::new_v4().to_string(),
        doc_status: "DRAFT".to_string(),
        doc_type: "LP_INTRODUCE_GOODS".to_string(),
        import_request: false,
        owner_inn: DEMO_OWNER_INN.to_string(),
        participant_inn: DEMO_OWNER_INN.to_string(),
        producer_inn: DEMO_PRODUCER_INN.to_string(),
        production_date: today.clone(),
        production_type: "OWN_PRODUCTION".to_string(),
        products: vec![Product {
            certificate_document: "CONFORMITY_CERTIFICATE".to_string(),
            certificate_document_date: today.clone(),
            certificate_document_number: format!("CERT-{:04}", sequence),
            owner_inn: DEMO_OWNER_INN.to_string(),
            producer_inn: DEMO_PRODUCER_INN.to_string(),
            production_date: today.clone(),
            tnved_code: "6401921000".to_string(),
            uit_code: Uuid::new_v4().simple().to_string(),
            uitu_code: String::new(),
        }],
        reg_date: today,
        reg_number: format!("REG-{:06}", sequence),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, closing the admission gate");
        }
        _ = terminate => {
            info!("Received SIGTERM, closing the admission gate");
        }
    }
}
