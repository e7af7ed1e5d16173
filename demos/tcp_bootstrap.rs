use bootstrap_connect::{Connector, Settings, TcpDialer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Connects to the first reachable `TCP_ADDRESSES` entry, retrying per
/// `TCP_MAX_RETRIES` / `TCP_BACKOFF_MS`, then closes the connection.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootstrap_connect=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env("TCP")?;
    let connector = Connector::new(TcpDialer).configure(settings.options());
    let mut handle = connector.connect(settings.target()?).await?;

    if let Some(stream) = handle.connection() {
        println!("connected to {}", stream.peer_addr()?);
    }

    handle.close().await;
    Ok(())
}
