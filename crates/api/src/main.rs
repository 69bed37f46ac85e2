use std::sync::Arc;

use finpuls_api::app;
use finpuls_infra::{StorageConfig, StorageRouter};
use finpuls_tokens::BankGateway;

#[tokio::main]
async fn main() {
    finpuls_observability::init();

    let cfg = match StorageConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "invalid storage configuration");
            std::process::exit(1);
        }
    };

    let storage = StorageRouter::connect(&cfg)
        .await
        .expect("failed to connect storage units");

    let gateway: Arc<dyn BankGateway> = Arc::new(app::services::UnconfiguredBankGateway);
    let services = Arc::new(app::services::build_services(&storage, gateway));

    let router = app::build_app(services);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind listener");

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, router).await.unwrap();
}
