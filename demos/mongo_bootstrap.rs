use bootstrap_connect::{mongo::MongoDialer, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reads `MONGODB_URI` and `MONGODB_NAMESPACE` (database name), connects with
/// the database-site preset and lists the collections.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootstrap_connect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env("MONGODB")?;
    let connector = MongoDialer::new()
        .app_name("bootstrap-demo")
        .connector()
        .configure(settings.options());

    // A service that cannot reach its database should not start.
    let mut handle = connector.connect(settings.target()?).await?;

    if let Some(connection) = handle.connection() {
        let names = connection.database().list_collection_names().await?;
        println!("{names:?}");
    }

    handle.close().await;
    Ok(())
}
