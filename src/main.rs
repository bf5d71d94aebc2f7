//! Payroll engine HTTP server.
//!
//! Reads the policy directory from `PAYROLL_CONFIG_DIR` and the listen address
//! from `PAYROLL_BIND_ADDR`. Log filtering follows `RUST_LOG`.

use std::env;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use payroll_engine::api::{AppState, create_router};
use payroll_engine::config::ConfigLoader;
use payroll_engine::service::PayrollService;
use payroll_engine::store::MemoryStore;

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config_dir =
        env::var("PAYROLL_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let bind_addr =
        env::var("PAYROLL_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

    let loader = ConfigLoader::load(&config_dir)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_dir = %config_dir,
        policy = %loader.config().metadata().code,
        "Starting payroll engine"
    );

    let store = Arc::new(MemoryStore::new());
    let service = PayrollService::new(
        loader.config().clone(),
        store.clone(),
        store.clone(),
        store.clone(),
        store,
    );
    let router = create_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "Listening");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .init();
}
