use std::time::Duration;

use bootstrap_connect::{
    kafka::{KafkaConsumerDialer, KafkaProducerDialer},
    Settings,
};
use rdkafka::producer::FutureRecord;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Reads `KAFKA_ADDRESSES` and `KAFKA_NAMESPACE` (consumer group), brings up
/// a producer and a consumer, sends one message and shuts both down.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bootstrap_connect=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env("KAFKA")?;
    let target = settings.target()?;

    let mut producer = KafkaProducerDialer::new()
        .set("client.id", "bootstrap-demo")
        .connector()
        .configure(settings.options())
        .connect(target.clone())
        .await?;
    let mut consumer = KafkaConsumerDialer::new()
        .connector()
        .configure(settings.options())
        .connect(target)
        .await?;

    if let Some(producer) = producer.connection() {
        let record = FutureRecord::<(), _>::to("bootstrap-demo").payload("hello");
        producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| err)?;
    }

    consumer.close().await;
    producer.close().await;
    Ok(())
}
