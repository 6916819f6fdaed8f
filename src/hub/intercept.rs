use std::sync::Arc;

use crate::core::Result;

use super::registry::{Registration, Registry};
use super::{ChangeDescription, EventFilter};

pub type InterceptCallback = dyn Fn(&ChangeDescription) -> Result<()> + Send + Sync;

/// Pre-mutation veto point.
///
/// Callbacks receive the change that is about to happen. Returning an error aborts the
/// operation before the storage is touched; the error reaches the caller unchanged.
pub struct Interceptor {
    registry: Arc<Registry<InterceptCallback>>,
}

impl Interceptor {
    pub(crate) fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    /// Registers `callback` for the events accepted by `filter`.
    ///
    /// # Example
    /// ```
    /// use vfs_double::{ChangeKind, EventFilter, MemoryStorage, NodeFilter, StorageBackend};
    ///
    /// let storage = MemoryStorage::new();
    /// let _veto = storage.intercept().event(
    ///     EventFilter::new(ChangeKind::Created, NodeFilter::Any),
    ///     |change| anyhow::bail!("no new entries: {}", change.path()),
    /// );
    /// let location = storage.resolve("/forbidden").unwrap();
    /// assert!(storage.create_directory(&location).is_err());
    /// assert!(storage.get_container(&location).is_none());
    /// ```
    pub fn event<F>(&self, filter: EventFilter, callback: F) -> Registration
    where
        F: Fn(&ChangeDescription) -> Result<()> + Send + Sync + 'static,
    {
        self.registry.register(filter, Arc::new(callback))
    }

    /// Runs every matching callback in registration order, stopping at the first error.
    pub(crate) fn intercept(&self, change: &ChangeDescription) -> Result<()> {
        for armed in self.registry.select(change) {
            if let Some(callback) = armed.callback() {
                if let Err(err) = callback(change) {
                    tracing::trace!(%change, error = %err, "operation vetoed by interception");
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{ChangeKind, NodeFilter};
    use crate::path::SimulatedOs;
    use crate::vfs::{ContainerKind, Location};
    use parking_lot::Mutex;

    fn creating(path: &str) -> ChangeDescription {
        let location = Location::new(path, path, None, SimulatedOs::Linux);
        ChangeDescription::new(ChangeKind::Created, ContainerKind::File, location)
    }

    #[derive(Debug, thiserror::Error)]
    #[error("injected")]
    struct Injected;

    #[test]
    fn test_error_propagates_verbatim() {
        let interceptor = Interceptor::new();
        let _veto = interceptor.event(EventFilter::new(ChangeKind::Created, NodeFilter::File), |_| {
            Err(Injected.into())
        });

        let err = interceptor.intercept(&creating("/a")).unwrap_err();
        assert!(err.downcast_ref::<Injected>().is_some());
    }

    #[test]
    fn test_first_error_stops_the_chain() {
        let interceptor = Interceptor::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let filter = EventFilter::new(ChangeKind::Created, NodeFilter::Any);

        let first_calls = Arc::clone(&calls);
        let _first = interceptor.event(filter.clone(), move |_| {
            first_calls.lock().push("first");
            Err(Injected.into())
        });
        let second_calls = Arc::clone(&calls);
        let _second = interceptor.event(filter, move |_| {
            second_calls.lock().push("second");
            Ok(())
        });

        assert!(interceptor.intercept(&creating("/a")).is_err());
        assert_eq!(*calls.lock(), vec!["first"]);
    }

    #[test]
    fn test_disposed_interception_no_longer_vetoes() {
        let interceptor = Interceptor::new();
        let veto = interceptor.event(EventFilter::new(ChangeKind::Created, NodeFilter::Any), |_| {
            Err(Injected.into())
        });
        assert!(interceptor.intercept(&creating("/a")).is_err());

        veto.dispose();
        assert!(interceptor.intercept(&creating("/a")).is_ok());
    }

    #[test]
    fn test_filter_is_respected() {
        let interceptor = Interceptor::new();
        let _veto = interceptor.event(
            EventFilter::new(ChangeKind::Created, NodeFilter::Directory),
            |_| Err(Injected.into()),
        );
        assert!(interceptor.intercept(&creating("/a")).is_ok());
    }
}
