use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::{ChangeDescription, EventFilter};

/// Ordered list of callbacks of one kind.
pub(crate) struct Registry<F: ?Sized> {
    next_id: AtomicU64,
    slots: Mutex<Vec<Slot<F>>>,
}

struct Slot<F: ?Sized> {
    id: u64,
    filter: EventFilter,
    callback: Arc<F>,
    active: Arc<AtomicBool>,
}

/// A callback selected for one event, together with its liveness flag.
pub(crate) struct Armed<F: ?Sized> {
    callback: Arc<F>,
    active: Arc<AtomicBool>,
}

impl<F: ?Sized> Armed<F> {
    /// `None` once the registration has been disposed, even after it was selected.
    pub(crate) fn callback(&self) -> Option<&F> {
        self.active
            .load(Ordering::Acquire)
            .then_some(self.callback.as_ref())
    }
}

impl<F: ?Sized + Send + Sync + 'static> Registry<F> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            slots: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn register(self: &Arc<Self>, filter: EventFilter, callback: Arc<F>) -> Registration {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        self.slots.lock().push(Slot {
            id,
            filter,
            callback,
            active: Arc::clone(&active),
        });
        let owner: Weak<dyn Unregister> = Arc::downgrade(self) as Weak<dyn Unregister>;
        Registration { id, active, owner }
    }

    /// Callbacks whose filter accepts `event`, in registration order. The slot list is not
    /// locked while the caller runs them.
    pub(crate) fn select(&self, event: &ChangeDescription) -> Vec<Armed<F>> {
        self.slots
            .lock()
            .iter()
            .filter(|slot| slot.active.load(Ordering::Acquire) && slot.filter.matches(event))
            .map(|slot| Armed {
                callback: Arc::clone(&slot.callback),
                active: Arc::clone(&slot.active),
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

trait Unregister: Send + Sync {
    fn unregister(&self, id: u64);
}

impl<F: ?Sized + Send + Sync> Unregister for Registry<F> {
    fn unregister(&self, id: u64) {
        self.slots.lock().retain(|slot| slot.id != id);
    }
}

/// Handle of a registered callback.
///
/// The callback stays registered until [`dispose`](Self::dispose) is called or the handle is
/// dropped. After disposal the callback is never invoked again.
#[must_use = "the callback is unregistered when the registration is dropped"]
pub struct Registration {
    id: u64,
    active: Arc<AtomicBool>,
    owner: Weak<dyn Unregister>,
}

impl Registration {
    pub fn dispose(&self) {
        if self.active.swap(false, Ordering::AcqRel) {
            if let Some(owner) = self.owner.upgrade() {
                owner.unregister(self.id);
            }
        }
    }

    pub fn is_disposed(&self) -> bool {
        !self.active.load(Ordering::Acquire)
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{ChangeKind, NodeFilter};
    use crate::path::SimulatedOs;
    use crate::vfs::{ContainerKind, Location};

    type Callback = dyn Fn(&ChangeDescription) -> u32 + Send + Sync;

    fn created() -> ChangeDescription {
        let location = Location::new("/a", "/a", None, SimulatedOs::Linux);
        ChangeDescription::new(ChangeKind::Created, ContainerKind::File, location)
    }

    #[test]
    fn test_select_in_registration_order() {
        let registry: Arc<Registry<Callback>> = Registry::new();
        let filter = EventFilter::new(ChangeKind::Created, NodeFilter::Any);
        let _first = registry.register(filter.clone(), Arc::new(|_: &ChangeDescription| 1u32));
        let _second = registry.register(filter, Arc::new(|_: &ChangeDescription| 2u32));

        let event = created();
        let results: Vec<u32> = registry
            .select(&event)
            .iter()
            .filter_map(|armed| armed.callback().map(|cb| cb(&event)))
            .collect();
        assert_eq!(results, vec![1, 2]);
    }

    #[test]
    fn test_dispose_removes_and_disarms() {
        let registry: Arc<Registry<Callback>> = Registry::new();
        let filter = EventFilter::new(ChangeKind::Created, NodeFilter::Any);
        let registration = registry.register(filter, Arc::new(|_: &ChangeDescription| 1u32));

        let event = created();
        let selected = registry.select(&event);
        registration.dispose();

        assert!(registration.is_disposed());
        assert_eq!(registry.len(), 0);
        // already selected callbacks are suppressed as well
        assert!(selected[0].callback().is_none());
    }

    #[test]
    fn test_drop_disposes() {
        let registry: Arc<Registry<Callback>> = Registry::new();
        {
            let _registration = registry.register(
                EventFilter::new(ChangeKind::Deleted, NodeFilter::File),
                Arc::new(|_: &ChangeDescription| 0u32),
            );
            assert_eq!(registry.len(), 1);
        }
        assert_eq!(registry.len(), 0);
    }
}
