//! Scripted dialer and recording event sink shared by unit tests.

use std::collections::VecDeque;
use std::error::Error;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Mutex,
};
use std::time::Duration;

use crate::{BoxError, ConnectEvents, Dial, DialError, Target};

#[derive(Clone, Debug)]
pub(crate) enum Step {
    Fail,
    FailWithPartial(u32),
    Reject,
    RejectWithPartial(u32),
    Succeed(u32),
    Hang,
}

/// Plays `Step`s in order; once the script runs out every dial fails.
pub(crate) struct ScriptedDialer {
    script: Mutex<VecDeque<Step>>,
    dials: AtomicU32,
    released: Mutex<Vec<u32>>,
    fail_disconnect: bool,
    disconnect_delay: Option<Duration>,
}

impl ScriptedDialer {
    pub(crate) fn new(script: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            dials: AtomicU32::new(0),
            released: Mutex::new(Vec::new()),
            fail_disconnect: false,
            disconnect_delay: None,
        }
    }

    pub(crate) fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    /// Every disconnect takes `delay` before it completes.
    pub(crate) fn slow_disconnect(mut self, delay: Duration) -> Self {
        self.disconnect_delay = Some(delay);
        self
    }

    pub(crate) fn dials(&self) -> u32 {
        self.dials.load(Ordering::SeqCst)
    }

    pub(crate) fn released(&self) -> Vec<u32> {
        self.released.lock().expect("released list poisoned").clone()
    }
}

#[async_trait::async_trait]
impl Dial for ScriptedDialer {
    type Connection = u32;

    async fn dial(&self, _target: &Target) -> Result<u32, DialError<u32>> {
        self.dials.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .lock()
            .expect("script poisoned")
            .pop_front()
            .unwrap_or(Step::Fail);

        match step {
            Step::Fail => Err(DialError::transient("connection refused")),
            Step::FailWithPartial(id) => {
                Err(DialError::transient("handshake failed").with_partial(id))
            }
            Step::Reject => Err(DialError::permanent("rejected by script")),
            Step::RejectWithPartial(id) => {
                Err(DialError::permanent("rejected by script").with_partial(id))
            }
            Step::Succeed(id) => Ok(id),
            Step::Hang => {
                std::future::pending::<()>().await;
                unreachable!("pending never resolves")
            }
        }
    }

    async fn disconnect(&self, connection: u32) -> Result<(), BoxError> {
        if let Some(delay) = self.disconnect_delay {
            tokio::time::sleep(delay).await;
        }
        self.released
            .lock()
            .expect("released list poisoned")
            .push(connection);
        if self.fail_disconnect {
            return Err("broken pipe".into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    Dialing(u32),
    Failed(u32),
    Rejected(u32),
    BackingOff(Duration),
    PartialDiscarded { failed: bool },
    Connected(u32),
    Exhausted(u32),
    Disconnected,
    DisconnectFailed,
}

#[derive(Default)]
pub(crate) struct RecordingEvents {
    log: Mutex<Vec<Event>>,
}

impl RecordingEvents {
    fn push(&self, event: Event) {
        self.log.lock().expect("event log poisoned").push(event);
    }

    pub(crate) fn all(&self) -> Vec<Event> {
        self.log.lock().expect("event log poisoned").clone()
    }

    pub(crate) fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.all().iter().filter(|e| predicate(e)).count()
    }

    pub(crate) fn backoffs(&self) -> Vec<Duration> {
        self.all()
            .into_iter()
            .filter_map(|e| match e {
                Event::BackingOff(wait) => Some(wait),
                _ => None,
            })
            .collect()
    }
}

impl ConnectEvents for RecordingEvents {
    fn dialing(&self, _target: &Target, attempt: u32) {
        self.push(Event::Dialing(attempt));
    }

    fn attempt_failed(&self, _target: &Target, attempt: u32, _error: &(dyn Error + 'static)) {
        self.push(Event::Failed(attempt));
    }

    fn rejected(&self, _target: &Target, attempt: u32, _error: &(dyn Error + 'static)) {
        self.push(Event::Rejected(attempt));
    }

    fn backing_off(&self, _target: &Target, _attempt: u32, wait: Duration) {
        self.push(Event::BackingOff(wait));
    }

    fn partial_discarded(&self, _target: &Target, error: Option<&(dyn Error + 'static)>) {
        self.push(Event::PartialDiscarded {
            failed: error.is_some(),
        });
    }

    fn connected(&self, _target: &Target, attempts: u32) {
        self.push(Event::Connected(attempts));
    }

    fn exhausted(&self, _target: &Target, attempts: u32, _error: &(dyn Error + 'static)) {
        self.push(Event::Exhausted(attempts));
    }

    fn disconnected(&self, _target: &Target) {
        self.push(Event::Disconnected);
    }

    fn disconnect_failed(&self, _target: &Target, _error: &(dyn Error + 'static)) {
        self.push(Event::DisconnectFailed);
    }
}
