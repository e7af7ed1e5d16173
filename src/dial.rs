use std::fmt;

use crate::{BoxError, Target};

/// The external capability the connector drives: open and release one raw
/// connection.
#[async_trait::async_trait]
pub trait Dial: Send + Sync {
    /// Raw client handed to the caller on success.
    type Connection: Send + 'static;

    /// Makes one attempt to open a connection to `target`.
    async fn dial(&self, target: &Target) -> Result<Self::Connection, DialError<Self::Connection>>;

    /// Releases a connection obtained from [`Dial::dial`].
    async fn disconnect(&self, connection: Self::Connection) -> Result<(), BoxError> {
        drop(connection);
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DialErrorKind {
    /// Worth retrying: refused, unreachable, timed out.
    Transient,
    /// Retrying cannot help: unparsable target, rejected configuration.
    Permanent,
}

/// Failure of a single dial.
///
/// A collaborator that built a resource before failing (a client created but
/// never verified) hands it back through [`DialError::with_partial`]; the
/// connector disconnects it before the next attempt.
pub struct DialError<C> {
    kind: DialErrorKind,
    source: BoxError,
    partial: Option<C>,
}

impl<C> DialError<C> {
    pub fn transient(source: impl Into<BoxError>) -> Self {
        Self {
            kind: DialErrorKind::Transient,
            source: source.into(),
            partial: None,
        }
    }

    pub fn permanent(source: impl Into<BoxError>) -> Self {
        Self {
            kind: DialErrorKind::Permanent,
            source: source.into(),
            partial: None,
        }
    }

    /// Attaches a partially-initialized resource that must be released.
    pub fn with_partial(mut self, connection: C) -> Self {
        self.partial = Some(connection);
        self
    }

    pub fn kind(&self) -> DialErrorKind {
        self.kind
    }

    pub fn is_permanent(&self) -> bool {
        self.kind == DialErrorKind::Permanent
    }

    pub fn source(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.source.as_ref()
    }

    pub fn into_parts(self) -> (DialErrorKind, BoxError, Option<C>) {
        (self.kind, self.source, self.partial)
    }
}

impl<C> fmt::Debug for DialError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialError")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("partial", &self.partial.is_some())
            .finish()
    }
}

impl<C> fmt::Display for DialError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            DialErrorKind::Transient => write!(f, "dial failed: {}", self.source),
            DialErrorKind::Permanent => write!(f, "dial rejected: {}", self.source),
        }
    }
}
