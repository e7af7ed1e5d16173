//! Kafka producer and consumer connector sites.
//!
//! Creating an `rdkafka` client does not contact the cluster, so each dial
//! also fetches cluster metadata on the blocking pool. A client whose
//! metadata fetch fails is handed back as a partial resource.

use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, Producer};

use crate::{options, BoxError, Connector, Dial, DialError, Target};

/// Retries of the producer site (6 dials in total).
pub const PRODUCER_MAX_RETRIES: u32 = 5;
/// Retries of the consumer site (3 dials in total).
pub const CONSUMER_MAX_RETRIES: u32 = 2;
/// Wait between broker dials, both sites.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(2);

const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(5);

/// Dials a [`FutureProducer`] against an address-list target.
#[derive(Clone, Debug)]
pub struct KafkaProducerDialer {
    overrides: Vec<(String, String)>,
    metadata_timeout: Duration,
}

/// Dials a [`StreamConsumer`]; the target namespace is the consumer group.
#[derive(Clone, Debug)]
pub struct KafkaConsumerDialer {
    overrides: Vec<(String, String)>,
    metadata_timeout: Duration,
}

impl Default for KafkaProducerDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl KafkaProducerDialer {
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }

    /// Sets an extra client property. Applied after the site defaults.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Connector preset for the producer site.
    pub fn connector(self) -> Connector<Self> {
        Connector::new(self).configure([
            options::max_retries(PRODUCER_MAX_RETRIES),
            options::backoff(DEFAULT_BACKOFF),
        ])
    }
}

impl Default for KafkaConsumerDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl KafkaConsumerDialer {
    pub fn new() -> Self {
        Self {
            overrides: Vec::new(),
            metadata_timeout: DEFAULT_METADATA_TIMEOUT,
        }
    }

    /// Sets an extra client property. Applied after `group.id`.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    pub fn metadata_timeout(mut self, timeout: Duration) -> Self {
        self.metadata_timeout = timeout;
        self
    }

    /// Connector preset for the consumer site.
    pub fn connector(self) -> Connector<Self> {
        Connector::new(self).configure([
            options::max_retries(CONSUMER_MAX_RETRIES),
            options::backoff(DEFAULT_BACKOFF),
        ])
    }
}

fn bootstrap_config(target: &Target) -> Result<ClientConfig, &'static str> {
    let addresses = target
        .address_list()
        .ok_or("kafka targets need a broker address list")?;
    let mut config = ClientConfig::new();
    config.set("bootstrap.servers", addresses.join(","));
    Ok(config)
}

fn apply_overrides(config: &mut ClientConfig, overrides: &[(String, String)]) {
    for (key, value) in overrides {
        config.set(key, value);
    }
}

#[async_trait::async_trait]
impl Dial for KafkaProducerDialer {
    type Connection = FutureProducer;

    async fn dial(&self, target: &Target) -> Result<FutureProducer, DialError<FutureProducer>> {
        let mut config =
            bootstrap_config(target).map_err(DialError::<FutureProducer>::permanent)?;
        config
            .set("message.send.max.retries", PRODUCER_MAX_RETRIES.to_string())
            .set("retry.backoff.ms", DEFAULT_BACKOFF.as_millis().to_string());
        apply_overrides(&mut config, &self.overrides);

        let timeout = self.metadata_timeout;
        let probe = tokio::task::spawn_blocking(
            move || -> Result<FutureProducer, DialError<FutureProducer>> {
                let producer: FutureProducer = match config.create() {
                    Ok(producer) => producer,
                    Err(err) => return Err(DialError::permanent(err)),
                };
                match producer.client().fetch_metadata(None, timeout) {
                    Ok(_) => Ok(producer),
                    Err(err) => Err(DialError::transient(err).with_partial(producer)),
                }
            },
        )
        .await;

        probe.unwrap_or_else(|err| {
            Err(DialError::transient(format!("metadata probe did not finish: {err}")))
        })
    }

    /// Flushes queued messages; fails if they are not delivered in time.
    async fn disconnect(&self, producer: FutureProducer) -> Result<(), BoxError> {
        let timeout = self.metadata_timeout;
        tokio::task::spawn_blocking(move || producer.flush(timeout))
            .await
            .map_err(|err| format!("producer flush did not finish: {err}"))??;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Dial for KafkaConsumerDialer {
    type Connection = StreamConsumer;

    async fn dial(&self, target: &Target) -> Result<StreamConsumer, DialError<StreamConsumer>> {
        let mut config =
            bootstrap_config(target).map_err(DialError::<StreamConsumer>::permanent)?;
        let group = target.namespace().ok_or_else(|| {
            DialError::<StreamConsumer>::permanent("kafka consumers need a group id as namespace")
        })?;
        config.set("group.id", group);
        apply_overrides(&mut config, &self.overrides);

        let timeout = self.metadata_timeout;
        let probe = tokio::task::spawn_blocking(
            move || -> Result<StreamConsumer, DialError<StreamConsumer>> {
                let consumer: StreamConsumer = match config.create() {
                    Ok(consumer) => consumer,
                    Err(err) => return Err(DialError::permanent(err)),
                };
                match consumer.fetch_metadata(None, timeout) {
                    Ok(_) => Ok(consumer),
                    Err(err) => Err(DialError::transient(err).with_partial(consumer)),
                }
            },
        )
        .await;

        probe.unwrap_or_else(|err| {
            Err(DialError::transient(format!("metadata probe did not finish: {err}")))
        })
    }

    async fn disconnect(&self, consumer: StreamConsumer) -> Result<(), BoxError> {
        consumer.unsubscribe();
        Ok(())
    }
}
