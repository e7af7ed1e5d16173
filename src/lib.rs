//! `bootstrap-connect` establishes connections to backing services at
//! process startup, tolerating transient unavailability with a bounded,
//! deterministic retry budget.
//!
//! The crate wraps any client behind the [`Dial`] capability:
//! - [`Connector::connect`] dials with retries and backoff
//! - [`ConfiguredHandle`] owns the live connection and releases it on
//!   [`close`](ConfiguredHandle::close)
//! - [`ConnectOption`]s tune retry limits and timeouts before or after
//!   connecting
//!
//! With `max_retries = N` a connect call makes at most `N + 1` dials.
//!
//! Connector sites: [`TcpDialer`] (always available), `mongo::MongoDialer`
//! (feature `mongodb`), `kafka::KafkaProducerDialer` and
//! `kafka::KafkaConsumerDialer` (feature `kafka`).

mod backoff;
mod connector;
mod dial;
mod error;
mod handle;
mod settings;
mod target;
mod tcp;

pub mod events;
pub mod options;

#[cfg(feature = "kafka")]
pub mod kafka;
#[cfg(feature = "mongodb")]
pub mod mongo;

#[cfg(test)]
mod testing;

pub use backoff::{BackoffPolicy, ExponentialBackoff, FixedBackoff};
pub use connector::Connector;
pub use dial::{Dial, DialError, DialErrorKind};
pub use error::{BoxError, ConfigError, ConnectError, DialTimedOut};
pub use events::ConnectEvents;
pub use handle::ConfiguredHandle;
pub use options::{ConnectOption, ConnectParams};
pub use settings::Settings;
pub use target::{Endpoint, Target};
pub use tcp::TcpDialer;

pub type Result<T> = std::result::Result<T, ConnectError>;
