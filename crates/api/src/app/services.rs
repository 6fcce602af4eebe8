//! Service wiring: config + seed data -> `ScmService`.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;

use stockpact_core::SystemClock;
use stockpact_infra::providers::Seed;
use stockpact_infra::{ScmConfig, ScmService};

/// The facade the HTTP layer talks to (in-memory ledger and collaborators).
pub type AppServices = ScmService;

pub fn load_seed(path: &Path) -> anyhow::Result<Seed> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    Seed::from_json(&raw).with_context(|| format!("invalid seed file {}", path.display()))
}

/// Build the facade from `config`, seeding collaborators from `api.seed_file`.
pub fn build_services(config: ScmConfig) -> anyhow::Result<AppServices> {
    config.validate().context("invalid configuration")?;

    let seed = match &config.api.seed_file {
        Some(path) => load_seed(path)?,
        None => {
            tracing::warn!("no seed file configured; collaborators start empty");
            Seed::default()
        }
    };
    tracing::info!(
        products = seed.products.len(),
        stock_positions = seed.stock.len(),
        purchase_orders = seed.purchase_orders.len(),
        vendors = seed.vendors.len(),
        "collaborator data loaded"
    );

    Ok(ScmService::in_memory(config, Arc::new(SystemClock), seed))
}
