use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::{error::ConfigError, options, target::redact_uri, ConnectOption, Target};

/// Connection settings for one service, read from the environment or a
/// JSON file.
///
/// Every retry knob is optional; only the knobs that are set become
/// [`ConnectOption`]s, so code-level defaults stay in effect otherwise.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub addresses: Vec<String>,
    pub uri: Option<String>,
    pub namespace: Option<String>,
    pub max_retries: Option<u32>,
    pub backoff_ms: Option<u64>,
    pub dial_timeout_ms: Option<u64>,
    pub deadline_ms: Option<u64>,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("addresses", &self.addresses)
            .field("uri", &self.uri.as_deref().map(redact_uri))
            .field("namespace", &self.namespace)
            .field("max_retries", &self.max_retries)
            .field("backoff_ms", &self.backoff_ms)
            .field("dial_timeout_ms", &self.dial_timeout_ms)
            .field("deadline_ms", &self.deadline_ms)
            .finish()
    }
}

impl Settings {
    /// Reads settings from environment variables named `{prefix}_{KEY}`.
    ///
    /// Reads:
    /// - `{prefix}_ADDRESSES`: comma-separated `host:port` list
    /// - `{prefix}_URI`: connection string (wins over addresses)
    /// - `{prefix}_NAMESPACE`: consumer group or database name
    /// - `{prefix}_MAX_RETRIES`, `{prefix}_BACKOFF_MS`,
    ///   `{prefix}_DIAL_TIMEOUT_MS`, `{prefix}_DEADLINE_MS`
    ///
    /// Variables that are set but blank are treated as unset.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bootstrap_connect::Settings;
    ///
    /// let settings = Settings::from_env("KAFKA").expect("invalid KAFKA_* env vars");
    /// let target = settings.target().expect("KAFKA_ADDRESSES or KAFKA_URI required");
    /// ```
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |suffix: &str| {
            let key = format!("{prefix}_{suffix}");
            lookup(&key)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (key, value))
        };

        let addresses = read("ADDRESSES")
            .map(|(_, value)| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|a| !a.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            addresses,
            uri: read("URI").map(|(_, value)| value),
            namespace: read("NAMESPACE").map(|(_, value)| value),
            max_retries: parse(read("MAX_RETRIES"))?,
            backoff_ms: parse(read("BACKOFF_MS"))?,
            dial_timeout_ms: parse(read("DIAL_TIMEOUT_MS"))?,
            deadline_ms: parse(read("DEADLINE_MS"))?,
        })
    }

    /// Reads settings from a JSON object with the field names as keys.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Builds the connect target. A connection string wins over addresses.
    pub fn target(&self) -> Result<Target, ConfigError> {
        let target = match self.uri.as_deref().filter(|uri| !uri.trim().is_empty()) {
            Some(uri) => Target::connection_string(uri),
            None if !self.addresses.is_empty() => Target::addresses(self.addresses.iter().cloned()),
            None => return Err(ConfigError::Missing("addresses or uri".to_owned())),
        };
        Ok(match &self.namespace {
            Some(namespace) => target.with_namespace(namespace.clone()),
            None => target,
        })
    }

    /// One option per knob that is set, in declaration order.
    pub fn options(&self) -> Vec<ConnectOption> {
        let mut opts = Vec::new();
        if let Some(n) = self.max_retries {
            opts.push(options::max_retries(n));
        }
        if let Some(ms) = self.backoff_ms {
            opts.push(options::backoff(Duration::from_millis(ms)));
        }
        if let Some(ms) = self.dial_timeout_ms {
            opts.push(options::dial_timeout(Duration::from_millis(ms)));
        }
        if let Some(ms) = self.deadline_ms {
            opts.push(options::deadline(Duration::from_millis(ms)));
        }
        opts
    }
}

fn parse<T: FromStr>(entry: Option<(String, String)>) -> Result<Option<T>, ConfigError> {
    entry
        .map(|(key, value)| {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value })
        })
        .transpose()
}
