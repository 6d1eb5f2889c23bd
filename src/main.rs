//! apptpush - appointment notification watcher
//!
//! Connects to the push endpoint for one user and prints every appointment
//! notification as a JSON line until interrupted.

use apptpush_client::{
    AppointmentNotification, Config, NotificationListener, SessionSupervisor, StaticCredentials,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apptpush")]
#[command(about = "Watch appointment push notifications for a user")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, env = "APPTPUSH_CONFIG")]
    config: Option<PathBuf>,

    /// WebSocket endpoint (overrides the config file)
    #[arg(long, env = "APPTPUSH_URL")]
    url: Option<String>,

    /// User whose appointment topic to subscribe to
    #[arg(short, long, env = "APPTPUSH_USER_ID")]
    user_id: i64,

    /// Access token sent as the Authorization header
    #[arg(short = 't', long, env = "APPTPUSH_TOKEN")]
    token: Option<String>,

    /// Authorization scheme
    #[arg(long, env = "APPTPUSH_TOKEN_TYPE", default_value = "Bearer")]
    token_type: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).map_err(|e| {
        tracing::error!("Failed to load config: {}", e);
        e
    })?;
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    if let Some(url) = cli.url {
        config.endpoint.url = url;
    }
    if let Err(e) = config.validate() {
        tracing::error!("Configuration error: {}", e);
        return Err(e.into());
    }

    let credentials = match cli.token {
        Some(token) => StaticCredentials::new(token).with_token_type(cli.token_type),
        None => {
            tracing::warn!("No access token given, the session will not connect");
            StaticCredentials::empty()
        }
    };

    tracing::info!("Starting apptpush");
    tracing::info!("  Endpoint: {}", config.endpoint.url);
    tracing::info!("  User: {}", cli.user_id);

    let supervisor = SessionSupervisor::websocket(config, Arc::new(credentials))?;

    // Held for the lifetime of the process; the session keeps only a weak
    // reference.
    let listener: Arc<dyn NotificationListener> =
        Arc::new(|notification: &AppointmentNotification| {
            match serde_json::to_string(notification) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::warn!("Failed to render notification: {}", e),
            }
        });

    supervisor.connect(cli.user_id);
    supervisor.set_listener(Some(&listener));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down ({})", supervisor.state());
    supervisor.disconnect();

    Ok(())
}
