use clap::Args;
use mailgate_email::handlers::{router, AppState};
use mailgate_email::DispatchService;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

#[derive(Args)]
pub struct ServeCommand {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, env = "MAILGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the server to, overriding the configuration
    #[arg(long)]
    pub address: Option<String>,
}

impl ServeCommand {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = super::load_config(self.config.as_deref())?;
        let address = self.address.unwrap_or_else(|| config.address.clone());

        let dispatch_service = Arc::new(DispatchService::from_config(&config)?);
        for (index, provider) in config.providers.iter().enumerate() {
            debug!(
                "Provider #{}: {} at {}",
                index, provider.service_name, provider.endpoint
            );
        }

        let state = Arc::new(AppState::new(dispatch_service, config.limits));
        let app = router(state);

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(async move {
            let listener = TcpListener::bind(&address).await?;
            info!(
                "Mail gateway listening on {} with {} provider(s)",
                address,
                config.providers.len()
            );

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            info!("Mail gateway stopped");
            Ok::<(), anyhow::Error>(())
        })
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
