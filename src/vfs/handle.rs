use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use crate::access::AccessOperation;
use crate::core::Result;
use crate::error::VfsError;
use crate::hub::{ChangeDescription, ChangeKind};

use super::storage::Shared;
use super::{Container, ContainerKind, Drive, FileAttributes, Location, TimeStamps, UnixMode};

/// Live handle to a container stored in a [`MemoryStorage`](crate::MemoryStorage).
///
/// The handle addresses its container by location. Every call locks the storage, so a handle
/// observes changes made through other handles, and fails with `NotFound` once the container
/// has been removed or moved away.
///
/// Mutations go through the same pipeline as structural operations: access check, a `Changed`
/// interception, the update under the storage lock, then a `Changed` notification.
#[derive(Clone)]
pub struct ContainerRef {
    shared: Arc<Shared>,
    location: Location,
}

impl ContainerRef {
    pub(crate) fn new(shared: Arc<Shared>, location: Location) -> Self {
        Self { shared, location }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn exists(&self) -> bool {
        self.shared.lock().get(&self.location).is_some()
    }

    /// Detached copy of the container as it is now.
    pub fn snapshot(&self) -> Result<Container> {
        self.shared
            .lock()
            .get(&self.location)
            .map(|node| node.container.clone())
            .ok_or_else(|| VfsError::not_found(&self.location).into())
    }

    pub fn kind(&self) -> Result<ContainerKind> {
        self.read(Container::kind)
    }

    pub fn is_file(&self) -> Result<bool> {
        self.read(Container::is_file)
    }

    pub fn is_dir(&self) -> Result<bool> {
        self.read(Container::is_dir)
    }

    pub fn len(&self) -> Result<u64> {
        self.read(Container::len)
    }

    pub fn times(&self) -> Result<TimeStamps> {
        self.read(Container::times)
    }

    pub fn attributes(&self) -> Result<FileAttributes> {
        self.read(Container::attributes)
    }

    pub fn is_encrypted(&self) -> Result<bool> {
        self.read(Container::is_encrypted)
    }

    /// Returns the file payload and bumps the last access time.
    ///
    /// # Errors
    /// * `NotFound` - the container no longer exists.
    /// * `NotSupported` - the container is a directory.
    /// * `AccessDenied` - the active identity may not read the file.
    pub fn read_bytes(&self) -> Result<Vec<u8>> {
        let snapshot = self.snapshot()?;
        if snapshot.is_dir() {
            return Err(VfsError::not_supported(format!(
                "cannot read bytes of the directory '{}'",
                self.location
            ))
            .into());
        }
        self.shared
            .check_access(&self.location, &snapshot, AccessOperation::Read)?;

        let now = self.shared.now();
        let mut tree = self.shared.lock();
        let node = tree
            .get_mut(&self.location)
            .ok_or_else(|| VfsError::not_found(&self.location))?;
        node.container.set_last_access_time(now);
        Ok(node.container.bytes().to_vec())
    }

    /// Replaces the file payload.
    ///
    /// # Errors
    /// * `NotSupported` - the container is a directory.
    /// * `AccessDenied` - the active identity may not write the file.
    /// * `CapacityExceeded` - the drive has no room for the growth; the old payload is kept.
    pub fn write_bytes(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let bytes = bytes.into();
        let location = self.location.clone();
        self.update(Some(AccessOperation::Write), move |container, drive, now| {
            ensure_file(container, &location)?;
            if let Some(drive) = drive {
                drive.resize(container.len(), bytes.len() as u64)?;
            }
            container.set_bytes(bytes)?;
            container.set_last_write_time(now);
            container.set_last_access_time(now);
            Ok(())
        })
    }

    /// Appends to the file payload.
    pub fn append_bytes(&self, bytes: &[u8]) -> Result<()> {
        let location = self.location.clone();
        self.update(Some(AccessOperation::Write), move |container, drive, now| {
            ensure_file(container, &location)?;
            let old_len = container.len();
            if let Some(drive) = drive {
                drive.resize(old_len, old_len + bytes.len() as u64)?;
            }
            let mut payload = container.bytes().to_vec();
            payload.extend_from_slice(bytes);
            container.set_bytes(payload)?;
            container.set_last_write_time(now);
            container.set_last_access_time(now);
            Ok(())
        })
    }

    pub fn set_attributes(&self, attributes: FileAttributes) -> Result<()> {
        self.update(None, |container, _, _| {
            container.set_attributes(attributes);
            Ok(())
        })
    }

    pub fn set_creation_time(&self, time: SystemTime) -> Result<()> {
        self.update(None, |container, _, _| {
            container.set_creation_time(time);
            Ok(())
        })
    }

    pub fn set_last_access_time(&self, time: SystemTime) -> Result<()> {
        self.update(None, |container, _, _| {
            container.set_last_access_time(time);
            Ok(())
        })
    }

    pub fn set_last_write_time(&self, time: SystemTime) -> Result<()> {
        self.update(None, |container, _, _| {
            container.set_last_write_time(time);
            Ok(())
        })
    }

    pub fn encrypt(&self) -> Result<()> {
        self.update(Some(AccessOperation::Write), |container, _, _| {
            container.set_encrypted(true);
            Ok(())
        })
    }

    pub fn decrypt(&self) -> Result<()> {
        self.update(Some(AccessOperation::Write), |container, _, _| {
            container.set_encrypted(false);
            Ok(())
        })
    }

    /// Sets the permission bits and stamps the active identity as owner and group.
    pub fn set_unix_mode(&self, mode: UnixMode) -> Result<()> {
        let identity = self.shared.access_strategy().identity();
        self.update(None, move |container, _, _| {
            container.set_mode(mode);
            if let Some(identity) = identity {
                container.set_owner(identity.user(), identity.group());
            }
            Ok(())
        })
    }

    /// Attaches a value under `key`. Metadata changes are not announced.
    pub fn set_metadata<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> Result<()> {
        let mut tree = self.shared.lock();
        let node = tree
            .get_mut(&self.location)
            .ok_or_else(|| VfsError::not_found(&self.location))?;
        node.container.set_metadata(key, value);
        Ok(())
    }

    /// The value under `key`, if it was stored with type `T`.
    pub fn metadata<T: Any + Send + Sync>(&self, key: &str) -> Result<Option<Arc<T>>> {
        self.read(|container| container.metadata::<T>(key))
    }

    fn read<T>(&self, query: impl FnOnce(&Container) -> T) -> Result<T> {
        let tree = self.shared.lock();
        let node = tree
            .get(&self.location)
            .ok_or_else(|| VfsError::not_found(&self.location))?;
        Ok(query(&node.container))
    }

    /// Applies `apply` to a staged copy of the container and commits it only on success.
    fn update<F>(&self, operation: Option<AccessOperation>, apply: F) -> Result<()>
    where
        F: FnOnce(&mut Container, Option<&mut Drive>, SystemTime) -> Result<()>,
    {
        let snapshot = self.snapshot()?;
        if let Some(operation) = operation {
            self.shared
                .check_access(&self.location, &snapshot, operation)?;
        }

        let change =
            ChangeDescription::new(ChangeKind::Changed, snapshot.kind(), self.location.clone());
        self.shared.interceptor().intercept(&change)?;

        let now = self.shared.now();
        {
            let mut tree = self.shared.lock();
            let (node, drive) = tree
                .node_and_drive(&self.location)
                .ok_or_else(|| VfsError::not_found(&self.location))?;
            let mut staged = node.container.clone();
            apply(&mut staged, drive, now)?;
            node.container = staged;
        }

        tracing::trace!(path = %self.location, "container changed");
        self.shared.notifier().notify(&change);
        Ok(())
    }
}

fn ensure_file(container: &Container, location: &Location) -> Result<()> {
    if container.is_dir() {
        return Err(VfsError::not_supported(format!(
            "the directory '{location}' cannot hold a byte payload"
        ))
        .into());
    }
    Ok(())
}

impl fmt::Debug for ContainerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRef")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}
