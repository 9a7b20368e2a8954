use std::sync::Arc;

use api::{config::DashboardConfig, telemetry};
use dashboard::{render_view, HttpSnapshotSource, SnapshotFetcher, ViewOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_cli_tracing()?;

    let config = DashboardConfig::from_env()?;
    let source = HttpSnapshotSource::new(config.api_url.clone(), config.request_timeout)?;
    tracing::info!(api_url = %source.url(), "dashboard starting");

    let fetcher = Arc::new(SnapshotFetcher::new(Arc::new(source)));
    let options = ViewOptions {
        sort: config.sort,
        sector: config.sector.clone(),
    };

    let mut updates = fetcher.subscribe();
    println!("{}", render_view(&fetcher.current(), &options));
    let guard = fetcher.clone().spawn_polling(config.poll_interval);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                println!("{}", render_view(&state, &options));
            }
            _ = &mut shutdown => {
                tracing::info!("dashboard shutting down");
                break;
            }
        }
    }

    guard.stop();
    Ok(())
}
