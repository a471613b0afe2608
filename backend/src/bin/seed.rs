//! Price grid seed
//!
//! Upserts the depot and store grids, backfills unassigned locations and,
//! with `SEED_FILL_PRICES=1`, prices every sellable product that has no price.
//! Exits 0 with a JSON summary, or 1 after logging the failure.

use std::{process::ExitCode, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use retail_ops_backend::{
    services::{run_seed, PgPriceListStore, SeedOptions},
    Config,
};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rops_seed=info,retail_ops_backend=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    dotenvy::dotenv().ok();

    match seed().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Seed failed");
            ExitCode::FAILURE
        }
    }
}

async fn seed() -> anyhow::Result<()> {
    let config = Config::load()?;
    let options = SeedOptions::from_env();

    let db_pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&db_pool).await?;
    }

    let store = PgPriceListStore::new(db_pool.clone());
    let summary = run_seed(&store, options).await?;

    tracing::info!(
        summary = %serde_json::to_string(&summary)?,
        depot_items_created = summary.depot_items_created,
        store_items_created = summary.store_items_created,
        warehouses_backfilled = summary.warehouses_backfilled,
        stores_backfilled = summary.stores_backfilled,
        "Seed completed"
    );

    db_pool.close().await;
    Ok(())
}
