use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::core::Result;
use crate::error::VfsError;

use super::registry::{Registration, Registry};
use super::{ChangeDescription, EventFilter};

pub type NotifyCallback = dyn Fn(&ChangeDescription) + Send + Sync;

/// Post-mutation event fan-out.
pub struct Notifier {
    registry: Arc<Registry<NotifyCallback>>,
}

impl Notifier {
    pub(crate) fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Registers `callback` for the events accepted by `filter` and returns a handle that can
    /// also block until matching events have been observed.
    pub fn on_event<F>(&self, filter: EventFilter, callback: F) -> AwaitableNotification
    where
        F: Fn(&ChangeDescription) + Send + Sync + 'static,
    {
        let state = Arc::new(AwaitState::default());
        let recorder = Arc::clone(&state);
        let registration = self.registry.register(
            filter,
            Arc::new(move |change: &ChangeDescription| {
                callback(change);
                recorder.record(change);
            }),
        );
        AwaitableNotification {
            registration,
            state,
        }
    }

    /// Same as [`on_event`](Self::on_event) without a user callback.
    pub fn watch(&self, filter: EventFilter) -> AwaitableNotification {
        self.on_event(filter, |_| {})
    }

    pub(crate) fn notify(&self, change: &ChangeDescription) {
        for armed in self.registry.select(change) {
            if let Some(callback) = armed.callback() {
                callback(change);
            }
        }
    }

    pub(crate) fn notify_all(&self, changes: &[ChangeDescription]) {
        for change in changes {
            tracing::trace!(%change, "notify");
            self.notify(change);
        }
    }
}

#[derive(Default)]
struct AwaitState {
    events: Mutex<Vec<ChangeDescription>>,
    signal: Condvar,
}

impl AwaitState {
    fn record(&self, change: &ChangeDescription) {
        self.events.lock().push(change.clone());
        self.signal.notify_all();
    }
}

/// A notification registration that can be waited on.
///
/// Every matching event since registration is recorded. Waiting never consumes events, and two
/// awaitables registered for the same events keep separate records.
#[must_use = "the callback is unregistered when the notification is dropped"]
pub struct AwaitableNotification {
    registration: Registration,
    state: Arc<AwaitState>,
}

impl AwaitableNotification {
    /// Blocks until at least one event has been observed.
    pub fn wait(&self, timeout: Option<Duration>) -> Result<Vec<ChangeDescription>> {
        self.wait_until(1, |_| true, timeout)
    }

    /// Blocks until at least `count` events have been observed.
    pub fn wait_for_count(
        &self,
        count: usize,
        timeout: Option<Duration>,
    ) -> Result<Vec<ChangeDescription>> {
        self.wait_until(count, |_| true, timeout)
    }

    /// Blocks until at least `count` observed events satisfy `predicate` and returns all of
    /// them.
    ///
    /// # Errors
    /// * `Timeout` - `timeout` elapsed first. `None` waits indefinitely.
    pub fn wait_until<P>(
        &self,
        count: usize,
        predicate: P,
        timeout: Option<Duration>,
    ) -> Result<Vec<ChangeDescription>>
    where
        P: Fn(&ChangeDescription) -> bool,
    {
        let started = Instant::now();
        // A timeout too large to represent waits without a deadline.
        let deadline = timeout.and_then(|timeout| started.checked_add(timeout));
        let mut events = self.state.events.lock();
        loop {
            let matched: Vec<ChangeDescription> =
                events.iter().filter(|&e| predicate(e)).cloned().collect();
            if matched.len() >= count {
                return Ok(matched);
            }
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    return Err(VfsError::Timeout {
                        waited: started.elapsed(),
                    }
                    .into());
                }
                Some(deadline) => {
                    self.state.signal.wait_until(&mut events, deadline);
                }
                None => self.state.signal.wait(&mut events),
            }
        }
    }

    /// Events observed so far.
    pub fn events(&self) -> Vec<ChangeDescription> {
        self.state.events.lock().clone()
    }

    pub fn dispose(&self) {
        self.registration.dispose();
    }

    pub fn is_disposed(&self) -> bool {
        self.registration.is_disposed()
    }
}

impl fmt::Debug for AwaitableNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwaitableNotification")
            .field("registration", &self.registration)
            .field("observed", &self.state.events.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};
    use crate::hub::{ChangeKind, NodeFilter};
    use crate::path::SimulatedOs;
    use crate::vfs::{ContainerKind, Location};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn created(path: &str) -> ChangeDescription {
        let location = Location::new(path, path, None, SimulatedOs::Linux);
        ChangeDescription::new(ChangeKind::Created, ContainerKind::File, location)
    }

    fn created_files() -> EventFilter {
        EventFilter::new(ChangeKind::Created, NodeFilter::File)
    }

    #[test]
    fn test_callback_runs_and_event_is_recorded() -> Result<()> {
        let notifier = Notifier::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let awaitable = notifier.on_event(created_files(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        notifier.notify(&created("/a"));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let events = awaitable.wait(Some(Duration::from_millis(100)))?;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].path(), "/a");
        Ok(())
    }

    #[test]
    fn test_timeout() {
        let notifier = Notifier::new();
        let awaitable = notifier.watch(created_files());

        let err = awaitable.wait(Some(Duration::from_millis(20))).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Timeout));
    }

    #[test]
    fn test_timeout_reports_elapsed_time() {
        let notifier = Notifier::new();
        let awaitable = notifier.watch(created_files());

        let err = awaitable.wait(Some(Duration::from_millis(20))).unwrap_err();
        match err.downcast_ref::<VfsError>() {
            Some(VfsError::Timeout { waited }) => assert!(*waited >= Duration::from_millis(20)),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_unbounded_timeout_returns_recorded_events() -> Result<()> {
        let notifier = Notifier::new();
        let awaitable = notifier.watch(created_files());
        notifier.notify(&created("/a"));

        let events = awaitable.wait(Some(Duration::MAX))?;
        assert_eq!(events.len(), 1);
        Ok(())
    }

    #[test]
    fn test_wait_for_count_from_another_thread() -> Result<()> {
        let notifier = Arc::new(Notifier::new());
        let awaitable = notifier.watch(created_files());

        let producer = Arc::clone(&notifier);
        let handle = thread::spawn(move || {
            for i in 0..3 {
                producer.notify(&created(&format!("/f{i}")));
            }
        });

        let events = awaitable.wait_for_count(3, Some(Duration::from_secs(5)))?;
        handle.join().expect("producer thread panicked");
        assert_eq!(events.len(), 3);
        Ok(())
    }

    #[test]
    fn test_wait_until_predicate() -> Result<()> {
        let notifier = Notifier::new();
        let awaitable = notifier.watch(created_files());
        notifier.notify(&created("/a.txt"));
        notifier.notify(&created("/b.log"));

        let logs = awaitable.wait_until(
            1,
            |e| e.name().ends_with(".log"),
            Some(Duration::from_millis(100)),
        )?;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].name(), "b.log");

        let err = awaitable
            .wait_until(2, |e| e.name().ends_with(".log"), Some(Duration::from_millis(20)))
            .unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::Timeout));
        Ok(())
    }

    #[test]
    fn test_independent_awaitables() -> Result<()> {
        let notifier = Notifier::new();
        let early = notifier.watch(created_files());
        notifier.notify(&created("/one"));
        let late = notifier.watch(created_files());
        notifier.notify(&created("/two"));

        assert_eq!(early.wait_for_count(2, Some(Duration::from_millis(100)))?.len(), 2);
        assert_eq!(late.wait(Some(Duration::from_millis(100)))?.len(), 1);

        early.dispose();
        notifier.notify(&created("/three"));
        assert_eq!(early.events().len(), 2);
        assert_eq!(late.events().len(), 2);
        Ok(())
    }
}
