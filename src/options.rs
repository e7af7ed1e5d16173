use std::time::Duration;

/// Configures retry and timeout behavior of a connect call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectParams {
    /// Maximum number of retries after the initial dial.
    ///
    /// `max_retries = N` allows `N + 1` dials in total before the connect
    /// call gives up with `ConnectionExhausted`.
    pub max_retries: u32,
    /// Base wait between dials, handed to the backoff policy.
    pub backoff: Duration,
    /// Upper bound on a single dial. A dial that exceeds it counts as failed.
    pub dial_timeout: Option<Duration>,
    /// Upper bound on the whole connect call, waits included.
    pub deadline: Option<Duration>,
}

impl Default for ConnectParams {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(2),
            dial_timeout: None,
            deadline: None,
        }
    }
}

/// A named mutation of one [`ConnectParams`] field.
///
/// Options apply in sequence, so a later option for the same field wins.
/// Values are taken as-is; a zero duration or zero retries is allowed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectOption {
    MaxRetries(u32),
    Backoff(Duration),
    DialTimeout(Duration),
    Deadline(Duration),
}

impl ConnectOption {
    pub fn apply(&self, params: &mut ConnectParams) {
        match *self {
            Self::MaxRetries(n) => params.max_retries = n,
            Self::Backoff(wait) => params.backoff = wait,
            Self::DialTimeout(limit) => params.dial_timeout = Some(limit),
            Self::Deadline(limit) => params.deadline = Some(limit),
        }
    }
}

impl ConnectParams {
    /// Applies `options` in order.
    pub fn apply<I>(&mut self, options: I)
    where
        I: IntoIterator<Item = ConnectOption>,
    {
        for option in options {
            option.apply(self);
        }
    }
}

pub fn max_retries(n: u32) -> ConnectOption {
    ConnectOption::MaxRetries(n)
}

pub fn backoff(wait: Duration) -> ConnectOption {
    ConnectOption::Backoff(wait)
}

/// Same as [`backoff`]: the database site calls its retry interval the
/// connection timeout.
pub fn timeout(wait: Duration) -> ConnectOption {
    ConnectOption::Backoff(wait)
}

pub fn dial_timeout(limit: Duration) -> ConnectOption {
    ConnectOption::DialTimeout(limit)
}

pub fn deadline(limit: Duration) -> ConnectOption {
    ConnectOption::Deadline(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_consumer_site() {
        let params = ConnectParams::default();
        assert_eq!(params.max_retries, 2);
        assert_eq!(params.backoff, Duration::from_secs(2));
        assert_eq!(params.dial_timeout, None);
        assert_eq!(params.deadline, None);
    }

    #[test]
    fn last_write_wins_for_same_field() {
        let mut params = ConnectParams::default();
        params.apply([max_retries(7), backoff(Duration::from_secs(1)), max_retries(4)]);
        assert_eq!(params.max_retries, 4);
        assert_eq!(params.backoff, Duration::from_secs(1));
    }

    #[test]
    fn timeout_alias_sets_backoff() {
        let mut params = ConnectParams::default();
        params.apply([timeout(Duration::from_secs(5))]);
        assert_eq!(params.backoff, Duration::from_secs(5));
    }

    #[test]
    fn zero_values_are_accepted() {
        let mut params = ConnectParams::default();
        params.apply([
            max_retries(0),
            backoff(Duration::ZERO),
            dial_timeout(Duration::ZERO),
        ]);
        assert_eq!(params.max_retries, 0);
        assert_eq!(params.backoff, Duration::ZERO);
        assert_eq!(params.dial_timeout, Some(Duration::ZERO));
    }

    #[test]
    fn separate_calls_compose() {
        let mut params = ConnectParams::default();
        params.apply([deadline(Duration::from_secs(30))]);
        params.apply([deadline(Duration::from_secs(10)), dial_timeout(Duration::from_secs(3))]);
        assert_eq!(params.deadline, Some(Duration::from_secs(10)));
        assert_eq!(params.dial_timeout, Some(Duration::from_secs(3)));
    }
}
