//! Interception (pre-mutation veto) and notification (post-mutation event) hooks.
//!
//! Both registries are keyed by an [`EventFilter`]: the kind of change, the kind of node and an
//! optional wildcard pattern on the node's name. Callbacks run synchronously on the thread that
//! performs the operation, in registration order. Interception callbacks run before the storage
//! lock is taken and may veto the operation by returning an error; notification callbacks run
//! after the lock has been released.

mod intercept;
mod notify;
mod registry;

use std::fmt;

use crate::matching::{MatchType, is_match};
use crate::vfs::{ContainerKind, Location};

pub use intercept::{InterceptCallback, Interceptor};
pub use notify::{AwaitableNotification, NotifyCallback, Notifier};
pub use registry::Registration;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Created,
    Deleted,
    Changed,
    Renamed,
}

/// Which node kinds a registration listens to.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum NodeFilter {
    File,
    Directory,
    #[default]
    Any,
}

impl NodeFilter {
    pub fn matches(self, kind: ContainerKind) -> bool {
        match self {
            NodeFilter::File => kind == ContainerKind::File,
            NodeFilter::Directory => kind == ContainerKind::Directory,
            NodeFilter::Any => true,
        }
    }
}

/// Payload passed to interception and notification callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDescription {
    change: ChangeKind,
    node: ContainerKind,
    location: Location,
    old_location: Option<Location>,
}

impl ChangeDescription {
    pub(crate) fn new(change: ChangeKind, node: ContainerKind, location: Location) -> Self {
        Self {
            change,
            node,
            location,
            old_location: None,
        }
    }

    pub(crate) fn renamed(node: ContainerKind, location: Location, old_location: Location) -> Self {
        Self {
            change: ChangeKind::Renamed,
            node,
            location,
            old_location: Some(old_location),
        }
    }

    pub fn change(&self) -> ChangeKind {
        self.change
    }

    pub fn node(&self) -> ContainerKind {
        self.node
    }

    /// The affected location; the destination for a rename.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The source of a rename.
    pub fn old_location(&self) -> Option<&Location> {
        self.old_location.as_ref()
    }

    pub fn path(&self) -> &str {
        self.location.full_path()
    }

    pub fn name(&self) -> &str {
        self.location.name()
    }
}

impl fmt::Display for ChangeDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.old_location {
            Some(old) => write!(f, "{:?} {:?} {} -> {}", self.change, self.node, old, self.location),
            None => write!(f, "{:?} {:?} {}", self.change, self.node, self.location),
        }
    }
}

/// Selects the events a callback is registered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    change: ChangeKind,
    node: NodeFilter,
    pattern: Option<String>,
}

impl EventFilter {
    pub fn new(change: ChangeKind, node: NodeFilter) -> Self {
        Self {
            change,
            node,
            pattern: None,
        }
    }

    /// Only events whose node name matches the wildcard `pattern` (`*`, `?`).
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn change(&self) -> ChangeKind {
        self.change
    }

    pub fn node(&self) -> NodeFilter {
        self.node
    }

    pub fn matches(&self, event: &ChangeDescription) -> bool {
        if self.change != event.change || !self.node.matches(event.node) {
            return false;
        }
        match &self.pattern {
            Some(pattern) => is_match(
                pattern,
                event.name(),
                MatchType::Simple,
                event.location.os().is_case_sensitive(),
            ),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::SimulatedOs;

    fn event(change: ChangeKind, node: ContainerKind, path: &str) -> ChangeDescription {
        let location = Location::new(path, path, Some("/".to_string()), SimulatedOs::Linux);
        ChangeDescription::new(change, node, location)
    }

    #[test]
    fn test_filter_by_change_and_node() {
        let filter = EventFilter::new(ChangeKind::Created, NodeFilter::File);
        assert!(filter.matches(&event(ChangeKind::Created, ContainerKind::File, "/a")));
        assert!(!filter.matches(&event(ChangeKind::Created, ContainerKind::Directory, "/a")));
        assert!(!filter.matches(&event(ChangeKind::Deleted, ContainerKind::File, "/a")));

        let any = EventFilter::new(ChangeKind::Deleted, NodeFilter::Any);
        assert!(any.matches(&event(ChangeKind::Deleted, ContainerKind::Directory, "/a")));
    }

    #[test]
    fn test_filter_by_pattern() {
        let filter = EventFilter::new(ChangeKind::Changed, NodeFilter::Any).with_pattern("*.log");
        assert!(filter.matches(&event(ChangeKind::Changed, ContainerKind::File, "/var/app.log")));
        assert!(!filter.matches(&event(ChangeKind::Changed, ContainerKind::File, "/var/app.txt")));
    }

    #[test]
    fn test_display() {
        let location = Location::new("/b", "/b", None, SimulatedOs::Linux);
        let old = Location::new("/a", "/a", None, SimulatedOs::Linux);
        let renamed = ChangeDescription::renamed(ContainerKind::File, location, old);
        assert_eq!(renamed.to_string(), "Renamed File /a -> /b");
    }
}
