use anyhow::Result;
use std::sync::Arc;
use tracing::{error, info};
use velarium::commands::CommandIssuer;
use velarium::config::Config;
use velarium::store::{FirebaseStore, RemoteStore};
use velarium::synchronizer::AwningSynchronizer;
use velarium::web;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    velarium::logging::init_logging(&config.logging)?;
    config.validate()?;

    info!("Velarium awning synchronizer starting up");

    let store: Arc<dyn RemoteStore> =
        Arc::new(FirebaseStore::new(&config.store, &config.credentials)?);
    let mut synchronizer = AwningSynchronizer::new(config.clone(), store.clone());
    let issuer = CommandIssuer::new(
        config.commands.clone(),
        store,
        synchronizer.subscribe_state(),
    );

    // Spawn web server
    let web_task = if config.web.enabled {
        let state = web::AppState {
            issuer,
            state_rx: synchronizer.subscribe_state(),
            config: Arc::new(config.clone()),
        };
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            if let Err(e) = web::serve(state, &host, port).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    // Stop the synchronizer loop on ctrl-c
    let shutdown = synchronizer.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.request();
        }
    });

    // Run the synchronizer in the current task
    match synchronizer.run().await {
        Ok(_) => {
            info!("Synchronizer shutdown complete");
            if let Some(task) = web_task {
                task.abort();
            }
            Ok(())
        }
        Err(e) => {
            error!("Synchronizer failed with error: {}", e);
            if let Some(task) = web_task {
                task.abort();
            }
            Err(anyhow::anyhow!("Synchronizer error: {}", e))
        }
    }
}
