use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout, timeout_at, Instant};

use crate::{
    events::default_events, BackoffPolicy, ConfiguredHandle, ConnectError, ConnectEvents,
    ConnectOption, ConnectParams, Dial, DialError, DialErrorKind, DialTimedOut, FixedBackoff,
    Result, Target,
};

/// Bounded-retry dialer producing a [`ConfiguredHandle`].
///
/// With `max_retries = N` the connector makes at most `N + 1` dials: one
/// initial attempt and up to `N` retries, waiting
/// [`BackoffPolicy::wait_time`] between them. Dials are sequential; the
/// waits suspend the calling task.
///
/// ```no_run
/// use std::time::Duration;
/// use bootstrap_connect::{options, Connector, Target, TcpDialer};
///
/// # async fn run() -> bootstrap_connect::Result<()> {
/// let connector = Connector::new(TcpDialer).configure([
///     options::max_retries(5),
///     options::backoff(Duration::from_secs(2)),
/// ]);
/// let mut handle = connector.connect(Target::addresses(["127.0.0.1:9092"])).await?;
/// handle.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Connector<D, P = FixedBackoff> {
    dialer: Arc<D>,
    policy: Arc<P>,
    params: ConnectParams,
    events: Arc<dyn ConnectEvents>,
}

impl<D, P> fmt::Debug for Connector<D, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("dialer", &std::any::type_name::<D>())
            .field("policy", &std::any::type_name::<P>())
            .field("params", &self.params)
            .finish()
    }
}

impl<D: Dial> Connector<D> {
    /// Creates a connector with default parameters, fixed backoff and the
    /// default event sink.
    pub fn new(dialer: D) -> Self {
        Self {
            dialer: Arc::new(dialer),
            policy: Arc::new(FixedBackoff),
            params: ConnectParams::default(),
            events: default_events(),
        }
    }
}

impl<D: Dial, P: BackoffPolicy> Connector<D, P> {
    /// Replaces the backoff policy.
    pub fn with_policy<Q: BackoffPolicy>(self, policy: Q) -> Connector<D, Q> {
        Connector {
            dialer: self.dialer,
            policy: Arc::new(policy),
            params: self.params,
            events: self.events,
        }
    }

    /// Replaces all parameters at once.
    pub fn with_params(mut self, params: ConnectParams) -> Self {
        self.params = params;
        self
    }

    /// Routes lifecycle events to `events` instead of the default sink.
    pub fn with_events(mut self, events: Arc<dyn ConnectEvents>) -> Self {
        self.events = events;
        self
    }

    /// Applies options in order; later options override earlier ones.
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

    pub fn dialer(&self) -> &D {
        &self.dialer
    }

    /// Dials `target` until it succeeds or the retry budget is spent.
    ///
    /// Fails fast with [`ConnectError::InvalidTarget`] on a malformed target
    /// or a permanent dial error. The returned handle owns the connection;
    /// the connector keeps no reference to it.
    pub async fn connect(&self, target: Target) -> Result<ConfiguredHandle<D, P>> {
        let connection = dial_with_retry(
            &*self.dialer,
            &*self.policy,
            &self.params,
            &target,
            &*self.events,
        )
        .await?;

        Ok(ConfiguredHandle::new(
            connection,
            self.params.clone(),
            target,
            Arc::clone(&self.dialer),
            Arc::clone(&self.policy),
            Arc::clone(&self.events),
        ))
    }
}

/// Validates `target`, then dials until one succeeds, a dial is rejected,
/// the retry budget runs out or `params.deadline` expires.
///
/// The deadline bounds dials and backoff waits only. Releasing a partial
/// resource always runs to completion, bounded by `params.dial_timeout` when
/// one is set.
pub(crate) async fn dial_with_retry<D, P>(
    dialer: &D,
    policy: &P,
    params: &ConnectParams,
    target: &Target,
    events: &dyn ConnectEvents,
) -> Result<D::Connection>
where
    D: Dial + ?Sized,
    P: BackoffPolicy + ?Sized,
{
    target.validate()?;

    let deadline = params.deadline.map(Deadline::start);
    let mut retries = RetryBudget::new(params.max_retries);
    let mut failed = 0u32;

    loop {
        within_deadline(deadline, failed)?;
        let attempt = failed.saturating_add(1);
        events.dialing(target, attempt);

        let dial = async {
            match params.dial_timeout {
                Some(limit) => timeout(limit, dialer.dial(target))
                    .await
                    .unwrap_or_else(|_| Err(DialError::transient(DialTimedOut(limit)))),
                None => dialer.dial(target).await,
            }
        };
        let outcome = bounded(deadline, failed, dial).await?;

        let (kind, source, partial) = match outcome {
            Ok(connection) => {
                events.connected(target, attempt);
                return Ok(connection);
            }
            Err(error) => error.into_parts(),
        };
        failed = attempt;

        // A resource handed back with an error is never reused.
        if let Some(partial) = partial {
            release_partial(dialer, params.dial_timeout, target, events, partial).await;
        }

        if kind == DialErrorKind::Permanent {
            events.rejected(target, attempt, &*source);
            return Err(ConnectError::InvalidTarget {
                reason: source.to_string(),
                source: Some(source),
            });
        }
        events.attempt_failed(target, attempt, &*source);

        if !retries.spend() {
            events.exhausted(target, attempt, &*source);
            return Err(ConnectError::ConnectionExhausted {
                attempts: attempt,
                source,
            });
        }

        within_deadline(deadline, failed)?;
        let wait = policy.wait_time(attempt, params.backoff);
        events.backing_off(target, attempt, wait);
        bounded(deadline, failed, sleep(wait)).await?;
    }
}

/// Retries left in one connect call.
#[derive(Debug)]
struct RetryBudget {
    left: u32,
}

impl RetryBudget {
    fn new(max_retries: u32) -> Self {
        Self { left: max_retries }
    }

    /// Spends one retry; `false` once none are left.
    fn spend(&mut self) -> bool {
        match self.left.checked_sub(1) {
            Some(left) => {
                self.left = left;
                true
            }
            None => false,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    limit: Duration,
    expires: Instant,
}

impl Deadline {
    fn start(limit: Duration) -> Self {
        Self {
            limit,
            expires: Instant::now() + limit,
        }
    }

    fn exceeded(self, attempts: u32) -> ConnectError {
        ConnectError::DeadlineExceeded {
            deadline: self.limit,
            attempts,
        }
    }
}

fn within_deadline(deadline: Option<Deadline>, attempts: u32) -> Result<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline.expires => Err(deadline.exceeded(attempts)),
        _ => Ok(()),
    }
}

async fn bounded<F: Future>(
    deadline: Option<Deadline>,
    attempts: u32,
    future: F,
) -> Result<F::Output> {
    match deadline {
        Some(deadline) => timeout_at(deadline.expires, future)
            .await
            .map_err(|_| deadline.exceeded(attempts)),
        None => Ok(future.await),
    }
}

async fn release_partial<D: Dial + ?Sized>(
    dialer: &D,
    limit: Option<Duration>,
    target: &Target,
    events: &dyn ConnectEvents,
    partial: D::Connection,
) {
    let released = match limit {
        Some(limit) => timeout(limit, dialer.disconnect(partial))
            .await
            .unwrap_or_else(|_| Err(DialTimedOut(limit).into())),
        None => dialer.disconnect(partial).await,
    };
    events.partial_discarded(
        target,
        released
            .as_ref()
            .err()
            .map(|err| &**err as &(dyn Error + 'static)),
    );
}
