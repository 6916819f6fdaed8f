//! Pluggable permission policy.
//!
//! The storage consults its [`AccessStrategy`] before reading bytes, writing bytes and
//! enumerating a directory. The default strategy compares a simulated active identity
//! against the owner/group tags and unix mode recorded on the container.

use parking_lot::RwLock;

use crate::core::Result;
use crate::error::VfsError;
use crate::path::SimulatedOs;
use crate::vfs::{Container, Location, UnixMode};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum AccessOperation {
    Read,
    Write,
    Enumerate,
}

impl AccessOperation {
    /// The owner, group and other bits that grant this operation.
    fn mode_bits(self) -> [UnixMode; 3] {
        match self {
            AccessOperation::Read | AccessOperation::Enumerate => [
                UnixMode::USER_READ,
                UnixMode::GROUP_READ,
                UnixMode::OTHER_READ,
            ],
            AccessOperation::Write => [
                UnixMode::USER_WRITE,
                UnixMode::GROUP_WRITE,
                UnixMode::OTHER_WRITE,
            ],
        }
    }
}

/// A simulated user and primary group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    user: String,
    group: String,
}

impl Identity {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn group(&self) -> &str {
        &self.group
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new("user", "user")
    }
}

pub trait AccessStrategy: Send + Sync {
    /// Returns `Ok(())` when `operation` on `container` is allowed, otherwise an error
    /// (the built-in strategy raises `AccessDenied`).
    fn check_access(
        &self,
        os: SimulatedOs,
        location: &Location,
        container: &Container,
        operation: AccessOperation,
    ) -> Result<()>;

    /// The identity stamped as owner when a unix mode is set. `None` leaves tags untouched.
    fn identity(&self) -> Option<Identity> {
        None
    }
}

/// Owner/group/other permission checks against a mutable active identity.
///
/// Access is granted when the platform has no permission model, when the container carries no
/// owner tags, or when one of these holds: the identity is the owner and the owner bit is set,
/// the identity's group is the container's group and the group bit is set, the other bit is
/// set.
#[derive(Debug, Default)]
pub struct DefaultAccessStrategy {
    identity: RwLock<Identity>,
}

impl DefaultAccessStrategy {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity: RwLock::new(identity),
        }
    }

    /// Switches the active identity for all subsequent checks.
    pub fn set_identity(&self, identity: Identity) {
        *self.identity.write() = identity;
    }

    pub fn current_identity(&self) -> Identity {
        self.identity.read().clone()
    }
}

impl AccessStrategy for DefaultAccessStrategy {
    fn check_access(
        &self,
        os: SimulatedOs,
        location: &Location,
        container: &Container,
        operation: AccessOperation,
    ) -> Result<()> {
        if !os.has_permission_model() {
            return Ok(());
        }
        let (Some(owner), Some(group)) = (container.owner(), container.group()) else {
            return Ok(());
        };

        let mode = container.mode();
        let [owner_bit, group_bit, other_bit] = operation.mode_bits();
        let identity = self.identity.read();

        let granted = (identity.user == owner && mode.contains(owner_bit))
            || (identity.group == group && mode.contains(group_bit))
            || mode.contains(other_bit);
        if granted {
            Ok(())
        } else {
            tracing::debug!(
                path = %location,
                user = %identity.user,
                ?operation,
                "access denied"
            );
            Err(VfsError::access_denied(location).into())
        }
    }

    fn identity(&self) -> Option<Identity> {
        Some(self.current_identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};
    use std::time::SystemTime;

    fn location() -> Location {
        Location::new("/foo", "foo", Some("/".to_string()), SimulatedOs::Linux)
    }

    fn owned_dir(mode: u32) -> Container {
        Container::directory(SystemTime::UNIX_EPOCH)
            .with_owner("alice", "staff")
            .with_mode(UnixMode::from_bits(mode))
    }

    #[test]
    fn test_owner_bits() {
        let strategy = DefaultAccessStrategy::new(Identity::new("alice", "staff"));
        let dir = owned_dir(0o400);
        let loc = location();
        assert!(
            strategy
                .check_access(SimulatedOs::Linux, &loc, &dir, AccessOperation::Enumerate)
                .is_ok()
        );
        let err = strategy
            .check_access(SimulatedOs::Linux, &loc, &dir, AccessOperation::Write)
            .unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::AccessDenied));
    }

    #[test]
    fn test_group_and_other_bits() {
        let strategy = DefaultAccessStrategy::new(Identity::new("bob", "staff"));
        let loc = location();
        assert!(
            strategy
                .check_access(SimulatedOs::Linux, &loc, &owned_dir(0o040), AccessOperation::Read)
                .is_ok()
        );
        assert!(
            strategy
                .check_access(SimulatedOs::Linux, &loc, &owned_dir(0o400), AccessOperation::Read)
                .is_err()
        );

        strategy.set_identity(Identity::new("carol", "guests"));
        assert!(
            strategy
                .check_access(SimulatedOs::Linux, &loc, &owned_dir(0o002), AccessOperation::Write)
                .is_ok()
        );
    }

    #[test]
    fn test_untagged_container_is_always_allowed() {
        let strategy = DefaultAccessStrategy::new(Identity::new("bob", "bob"));
        let file = Container::file(SystemTime::UNIX_EPOCH).with_mode(UnixMode::from_bits(0));
        assert!(
            strategy
                .check_access(SimulatedOs::Linux, &location(), &file, AccessOperation::Write)
                .is_ok()
        );
    }

    #[test]
    fn test_platform_without_permission_model() {
        let strategy = DefaultAccessStrategy::new(Identity::new("bob", "bob"));
        assert!(
            strategy
                .check_access(
                    SimulatedOs::Windows,
                    &location(),
                    &owned_dir(0),
                    AccessOperation::Read
                )
                .is_ok()
        );
    }
}
