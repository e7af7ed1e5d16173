use std::fmt;
use std::sync::Arc;

use crate::{
    connector::dial_with_retry, BackoffPolicy, ConnectEvents, ConnectOption, ConnectParams, Dial,
    FixedBackoff, Result, Target,
};

/// A live connection returned by [`Connector::connect`](crate::Connector::connect).
///
/// The handle exclusively owns the raw connection. Callers that share the
/// underlying client with workers must stop those workers before calling
/// [`close`](Self::close). Dropping the handle without closing it drops the
/// raw connection without calling [`Dial::disconnect`].
pub struct ConfiguredHandle<D: Dial, P = FixedBackoff> {
    connection: Option<D::Connection>,
    params: ConnectParams,
    target: Target,
    dialer: Arc<D>,
    policy: Arc<P>,
    events: Arc<dyn ConnectEvents>,
}

impl<D: Dial, P> fmt::Debug for ConfiguredHandle<D, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfiguredHandle")
            .field("target", &self.target)
            .field("params", &self.params)
            .field("open", &self.connection.is_some())
            .finish()
    }
}

impl<D: Dial, P: BackoffPolicy> ConfiguredHandle<D, P> {
    pub(crate) fn new(
        connection: D::Connection,
        params: ConnectParams,
        target: Target,
        dialer: Arc<D>,
        policy: Arc<P>,
        events: Arc<dyn ConnectEvents>,
    ) -> Self {
        Self {
            connection: Some(connection),
            params,
            target,
            dialer,
            policy,
            events,
        }
    }

    /// Borrows the raw connection, or `None` once closed.
    pub fn connection(&self) -> Option<&D::Connection> {
        self.connection.as_ref()
    }

    pub fn connection_mut(&mut self) -> Option<&mut D::Connection> {
        self.connection.as_mut()
    }

    /// Applies options in order and returns the same handle.
    ///
    /// The updated parameters are used by [`reconnect`](Self::reconnect).
    pub fn configure<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = ConnectOption>,
    {
        self.params.apply(options);
        self
    }

    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn is_closed(&self) -> bool {
        self.connection.is_none()
    }

    /// Releases the connection through [`Dial::disconnect`].
    ///
    /// Calling it on a closed handle does nothing. Disconnect errors go to the
    /// event sink and are not returned.
    pub async fn close(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };
        match self.dialer.disconnect(connection).await {
            Ok(()) => self.events.disconnected(&self.target),
            Err(err) => self.events.disconnect_failed(&self.target, &*err),
        }
    }

    /// Closes the current connection, if any, and dials again with the
    /// handle's current parameters.
    ///
    /// On failure the handle stays closed.
    pub async fn reconnect(&mut self) -> Result<()> {
        self.close().await;
        let connection = dial_with_retry(
            &*self.dialer,
            &*self.policy,
            &self.params,
            &self.target,
            &*self.events,
        )
        .await?;
        self.connection = Some(connection);
        Ok(())
    }

    /// Takes the raw connection out of the handle. The caller becomes
    /// responsible for releasing it.
    pub fn into_connection(mut self) -> Option<D::Connection> {
        self.connection.take()
    }
}
