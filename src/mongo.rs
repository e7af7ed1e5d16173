//! MongoDB connector site.
//!
//! A dial parses the connection string, builds a client and pings `admin`.
//! A client whose ping fails is handed back as a partial resource so the
//! connector shuts it down before the next attempt.

use std::time::Duration;

use mongodb::{bson::doc, error::ErrorKind, options::ClientOptions, Client, Database};

use crate::{options, BoxError, Connector, Dial, DialError, Target};

/// Total dials of the database site: one attempt plus two retries.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Wait between database dials.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(5);

/// A verified client together with the database named by the target
/// namespace.
#[derive(Clone, Debug)]
pub struct MongoConnection {
    client: Client,
    database: Database,
}

impl MongoConnection {
    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[derive(Clone, Debug)]
pub struct MongoDialer {
    server_selection_timeout: Duration,
    app_name: Option<String>,
}

impl Default for MongoDialer {
    fn default() -> Self {
        Self::new()
    }
}

impl MongoDialer {
    pub fn new() -> Self {
        Self {
            server_selection_timeout: Duration::from_secs(5),
            app_name: None,
        }
    }

    /// Bounds how long the verification ping waits for a server.
    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.server_selection_timeout = timeout;
        self
    }

    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Connector preset for the database site: 3 dials, 5 s apart.
    pub fn connector(self) -> Connector<Self> {
        Connector::new(self).configure([
            options::max_retries(DEFAULT_MAX_RETRIES),
            options::timeout(DEFAULT_BACKOFF),
        ])
    }
}

#[async_trait::async_trait]
impl Dial for MongoDialer {
    type Connection = MongoConnection;

    async fn dial(&self, target: &Target) -> Result<MongoConnection, DialError<MongoConnection>> {
        let Some(uri) = target.uri() else {
            return Err(DialError::permanent("mongodb targets need a connection string"));
        };
        let Some(db_name) = target.namespace() else {
            return Err(DialError::permanent(
                "mongodb targets need a database name as namespace",
            ));
        };

        let mut client_options = ClientOptions::parse(uri).await.map_err(classify)?;
        client_options.server_selection_timeout = Some(self.server_selection_timeout);
        if let Some(name) = &self.app_name {
            client_options.app_name = Some(name.clone());
        }
        let client = Client::with_options(client_options).map_err(classify)?;

        let connection = MongoConnection {
            database: client.database(db_name),
            client,
        };
        let ping = connection
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await;
        match ping {
            Ok(_) => Ok(connection),
            Err(err) => Err(DialError::transient(err).with_partial(connection)),
        }
    }

    async fn disconnect(&self, connection: MongoConnection) -> Result<(), BoxError> {
        connection.client.shutdown().await;
        Ok(())
    }
}

/// Malformed connection strings are permanent; everything else (DNS seed
/// lookups, server selection) may clear up on retry.
fn classify(err: mongodb::error::Error) -> DialError<MongoConnection> {
    if matches!(err.kind.as_ref(), ErrorKind::InvalidArgument { .. }) {
        DialError::permanent(err)
    } else {
        DialError::transient(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn address_list_target_is_rejected() {
        let err = MongoDialer::new()
            .dial(&Target::addresses(["db-1:27017"]).with_namespace("ledger"))
            .await
            .expect_err("needs a connection string");
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn missing_database_name_is_rejected() {
        let err = MongoDialer::new()
            .dial(&Target::connection_string("mongodb://localhost:27017"))
            .await
            .expect_err("needs a namespace");
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn malformed_uri_is_permanent() {
        let err = MongoDialer::new()
            .dial(&Target::connection_string("localhost:27017").with_namespace("ledger"))
            .await
            .expect_err("no scheme");
        assert!(err.is_permanent());
    }

    #[test]
    fn preset_matches_database_site() {
        let connector = MongoDialer::new().connector();
        assert_eq!(connector.params().max_retries, 2);
        assert_eq!(connector.params().backoff, Duration::from_secs(5));
    }
}
