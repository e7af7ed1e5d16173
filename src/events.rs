//! Structured event sink for the connect lifecycle.
//!
//! The connector never logs directly; it reports to a [`ConnectEvents`]
//! implementation handed to it at construction. [`TracingEvents`] (default
//! with the `tracing` feature) forwards to `tracing`; [`NoopEvents`] drops
//! everything.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use crate::Target;

/// Receives connect lifecycle notifications. Every method defaults to a no-op.
pub trait ConnectEvents: Send + Sync {
    /// About to make dial number `attempt` (1-based).
    fn dialing(&self, _target: &Target, _attempt: u32) {}

    /// Dial number `attempt` failed with a transient error.
    fn attempt_failed(&self, _target: &Target, _attempt: u32, _error: &(dyn Error + 'static)) {}

    /// Dial number `attempt` failed with a permanent error. No retry follows.
    fn rejected(&self, _target: &Target, _attempt: u32, _error: &(dyn Error + 'static)) {}

    /// Waiting `wait` before the next dial.
    fn backing_off(&self, _target: &Target, _attempt: u32, _wait: Duration) {}

    /// A partial resource returned with a dial error was released.
    /// `error` is set when releasing it failed.
    fn partial_discarded(&self, _target: &Target, _error: Option<&(dyn Error + 'static)>) {}

    /// Connected after `attempts` dials.
    fn connected(&self, _target: &Target, _attempts: u32) {}

    /// Gave up after `attempts` dials.
    fn exhausted(&self, _target: &Target, _attempts: u32, _error: &(dyn Error + 'static)) {}

    /// A handle released its connection.
    fn disconnected(&self, _target: &Target) {}

    /// Releasing a handle's connection failed. Not propagated to the caller.
    fn disconnect_failed(&self, _target: &Target, _error: &(dyn Error + 'static)) {}
}

/// Discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEvents;

impl ConnectEvents for NoopEvents {}

/// Forwards events to `tracing` with structured fields.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEvents;

#[cfg(feature = "tracing")]
impl ConnectEvents for TracingEvents {
    fn dialing(&self, target: &Target, attempt: u32) {
        tracing::debug!(service = %target, attempt, "dialing");
    }

    fn attempt_failed(&self, target: &Target, attempt: u32, error: &(dyn Error + 'static)) {
        tracing::warn!(service = %target, attempt, error = %error, "connection attempt failed");
    }

    fn rejected(&self, target: &Target, attempt: u32, error: &(dyn Error + 'static)) {
        tracing::error!(
            service = %target,
            attempt,
            error = %error,
            "connection attempt rejected, not retrying"
        );
    }

    fn backing_off(&self, target: &Target, attempt: u32, wait: Duration) {
        tracing::info!(
            service = %target,
            attempt,
            wait_ms = millis(wait),
            "backing off before next attempt"
        );
    }

    fn partial_discarded(&self, target: &Target, error: Option<&(dyn Error + 'static)>) {
        match error {
            Some(error) => tracing::warn!(
                service = %target,
                error = %error,
                "failed to release partially opened connection"
            ),
            None => tracing::debug!(service = %target, "released partially opened connection"),
        }
    }

    fn connected(&self, target: &Target, attempts: u32) {
        tracing::info!(service = %target, attempts, "connected");
    }

    fn exhausted(&self, target: &Target, attempts: u32, error: &(dyn Error + 'static)) {
        tracing::error!(
            service = %target,
            attempts,
            error = %error,
            "failed to connect after retries"
        );
    }

    fn disconnected(&self, target: &Target) {
        tracing::info!(service = %target, "disconnected");
    }

    fn disconnect_failed(&self, target: &Target, error: &(dyn Error + 'static)) {
        tracing::error!(service = %target, error = %error, "error while disconnecting");
    }
}

#[cfg(feature = "tracing")]
fn millis(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}

/// Sink used when none is configured.
pub fn default_events() -> Arc<dyn ConnectEvents> {
    #[cfg(feature = "tracing")]
    {
        Arc::new(TracingEvents)
    }
    #[cfg(not(feature = "tracing"))]
    {
        Arc::new(NoopEvents)
    }
}
