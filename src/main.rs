use std::sync::Arc;

use anyhow::Context;
use config::Config;
use db::Db;
use ranker::ContributionRanker;
use snapshot::SnapshotStore;
use store::ContributionStore;
use warp::Filter;

pub mod config;
pub mod db;
pub mod error;
pub mod leaderboard;
pub mod ranker;
pub mod snapshot;
pub mod store;

async fn open_store(config: &Config) -> anyhow::Result<Option<Arc<dyn ContributionStore>>> {
    if let Some(path) = &config.snapshot_path {
        let store = SnapshotStore::from_file(path)?;
        log::info!("serving leaderboard from snapshot {}", path.display());
        return Ok(Some(Arc::new(store)));
    }

    let Some(database_url) = &config.database_url else {
        log::warn!("DATABASE_URL is not set, leaderboard requests will return 503");
        return Ok(None);
    };

    match Db::connect(database_url, config).await {
        Ok(db) => {
            log::info!("connected to {}", db.name());
            Ok(Some(Arc::new(db)))
        }
        Err(error) => {
            log::error!("failed to connect to database: {}", error);
            Ok(None)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    if std::env::var_os("RUST_APP_LOG").is_none() {
        std::env::set_var("RUST_APP_LOG", "info");
    }
    pretty_env_logger::init_custom_env("RUST_APP_LOG");
    log::info!("Contributor Leaderboard");

    let config = Config::from_env().context("loading configuration")?;
    let ranker = Arc::new(ContributionRanker::new(open_store(&config).await?));
    if !ranker.is_configured() {
        log::warn!("no contribution store available");
    }

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(["GET", "HEAD", "OPTIONS"])
        .allow_headers([
            "Host",
            "Accept",
            "User-Agent",
            "Content-Type",
            "Content-Length",
            "Access-Control-Request-Method",
            "Access-Control-Request-Headers",
        ])
        .build();

    let routes = leaderboard::route(ranker)
        .with(cors)
        .with(warp::log("leaderboard"));

    log::info!("listening on {}", config.bind_addr);
    warp::serve(routes).run(config.bind_addr).await;

    Ok(())
}
