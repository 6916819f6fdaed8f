use std::time::SystemTime;

use crate::vfs::{Container, ContainerRef, Drive, Location};

/// Operations every storage engine exposes to the file-system facade above it.
///
/// Raw path strings enter through [`resolve`](Self::resolve); every other operation works on
/// canonical [`Location`]s.
pub trait StorageBackend {
    /// Canonicalizes `path` against the current directory.
    fn resolve(&self, path: &str) -> Result<Location>;

    /// Inserts the container built by `factory` unless `location` is already occupied.
    ///
    /// Returns `(true, handle)` when this call created the entry and `(false, handle)` for the
    /// entry that already existed. The factory and the `Created` interception callbacks may run
    /// even when another thread wins the race; the factory's result is then discarded and no
    /// notification is sent.
    fn try_add_container<F>(&self, location: &Location, factory: F) -> Result<(bool, ContainerRef)>
    where
        F: FnOnce(&Location, SystemTime) -> Container;

    fn get_container(&self, location: &Location) -> Option<ContainerRef>;

    /// Removes `location` and everything below it. `Ok(false)` when nothing was there.
    fn remove_container(&self, location: &Location) -> Result<bool>;

    /// Relocates the subtree at `source` to `destination`.
    fn move_container(&self, source: &Location, destination: &Location) -> Result<()>;

    /// Duplicates the subtree at `source` under `destination`.
    fn copy_container(&self, source: &Location, destination: &Location) -> Result<()>;

    fn current_directory(&self) -> Location;

    fn set_current_directory(&self, location: &Location) -> Result<()>;

    /// Lists the entries below `location` whose name matches `pattern`, parents first.
    fn enumerate(&self, location: &Location, pattern: &str, recursive: bool)
    -> Result<Vec<Location>>;

    /// Registers a drive, or updates the capacity of an existing one.
    fn add_drive(&self, name: &str, total_bytes: u64) -> Result<Drive>;

    fn get_drive(&self, name: &str) -> Option<Drive>;
}

pub type Result<T> = std::result::Result<T, anyhow::Error>;
