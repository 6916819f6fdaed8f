//! This module provides the in-memory storage tree behind the file-system double.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, MutexGuard, RwLock};

use crate::access::{AccessOperation, AccessStrategy};
use crate::core::{Result, StorageBackend};
use crate::error::VfsError;
use crate::hub::{ChangeDescription, ChangeKind, Interceptor, Notifier};
use crate::matching::{MatchType, is_match};
use crate::path::{PathRules, SimulatedOs, comparison_key, normalize, normalize_drive_name, root_of};
use crate::time::Clock;

use super::{Container, ContainerKind, ContainerRef, Drive, Location, StorageOptions};

/// An in-memory, thread-safe storage tree of files and directories spread over one or more
/// capacity-bounded drives.
///
/// `MemoryStorage` reproduces the observable behavior of a hierarchical file system without
/// touching the host: path resolution for a simulated platform, byte content, timestamps and
/// attributes, drive capacity accounting, owner/group permissions and encryption flags. Every
/// mutation passes an interception point before it happens and is announced to notification
/// callbacks after it happened.
///
/// ### Internal state
///
/// * `entries`: The core storage map that holds every container.
///   - Key: the comparison key of the canonical path (one trailing separator stripped, case
///     folded on case-insensitive platforms).
///   - Value: the [`Location`] as it was spelled when the entry was created, plus the
///     [`Container`].
///   - Uses `BTreeMap` for:
///     - Ordered traversal (a parent always sorts before its descendants).
///     - Efficient prefix-based queries (subtree removal, moves, enumeration).
///     - Deterministic iteration.
///
/// * `drives`: Every registered [`Drive`], keyed by the comparison key of its root.
///
/// * `cwd`: The current directory, used by [`resolve`](StorageBackend::resolve) to anchor
///   relative paths. Defaults to the root of the platform's default drive.
///
/// ### Invariants
///
/// 1. **Drive roots**: every registered drive has exactly one root entry of type `Directory`.
/// 2. **Parent consistency**: every non-root entry has a parent entry of type `Directory`.
/// 3. **Capacity**: `used_bytes <= total_bytes` for every drive; `used_bytes` is the sum of the
///    file payloads stored on it.
/// 4. **Atomicity**: an operation either applies its tree change, its drive accounting and its
///    notifications, or none of them.
///
/// ### Lifecycle
///
/// - On creation the default drive (`/` or `C:\`) is registered with the configured default
///   capacity and becomes the current directory.
/// - A drive referenced for the first time by [`resolve`](StorageBackend::resolve) is
///   registered on the fly with the default capacity.
/// - Containers live until they are removed, or until their drive is removed.
///
/// ### Thread Safety
///
/// `MemoryStorage` is cheap to clone; clones share the same tree. One mutex guards the tree,
/// the drives and the current directory. Interception callbacks run on the caller's thread
/// before the lock is taken, so they may query the storage. Notification callbacks run after
/// the lock is released.
///
/// ### Example
///
/// ```
/// use vfs_double::{MemoryStorage, StorageBackend};
///
/// let storage = MemoryStorage::new();
/// let docs = storage.resolve("/docs").unwrap();
/// storage.create_directory(&docs).unwrap();
///
/// let note = storage.resolve("/docs/note.txt").unwrap();
/// storage.create_file(&note, b"Hello".to_vec()).unwrap();
/// assert!(storage.exists(&note));
///
/// storage.remove_container(&docs).unwrap();
/// assert!(!storage.exists(&note));
/// ```
#[derive(Clone)]
pub struct MemoryStorage {
    shared: Arc<Shared>,
}

/// State shared between a storage and the container handles it hands out.
pub(crate) struct Shared {
    rules: PathRules,
    tree: Mutex<Tree>,
    access: RwLock<Arc<dyn AccessStrategy>>,
    clock: Arc<dyn Clock>,
    default_capacity: u64,
    interceptor: Interceptor,
    notifier: Notifier,
}

impl Shared {
    pub(crate) fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock()
    }

    pub(crate) fn now(&self) -> SystemTime {
        self.clock.now()
    }

    pub(crate) fn os(&self) -> SimulatedOs {
        self.rules.os()
    }

    pub(crate) fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub(crate) fn access_strategy(&self) -> Arc<dyn AccessStrategy> {
        Arc::clone(&*self.access.read())
    }

    /// Runs the active access strategy. Must not be called with the tree locked.
    pub(crate) fn check_access(
        &self,
        location: &Location,
        container: &Container,
        operation: AccessOperation,
    ) -> Result<()> {
        self.access_strategy()
            .check_access(self.os(), location, container, operation)
    }
}

#[derive(Clone)]
pub(crate) struct Node {
    pub(crate) location: Location,
    pub(crate) container: Container,
}

pub(crate) struct Tree {
    os: SimulatedOs,
    cwd: Location,
    entries: BTreeMap<String, Node>,
    drives: BTreeMap<String, Drive>,
}

impl Tree {
    fn new(os: SimulatedOs, default_capacity: u64, now: SystemTime) -> Self {
        let root = os.default_drive();
        let mut tree = Self {
            os,
            cwd: Location::new(root, root, Some(root.to_string()), os),
            entries: BTreeMap::new(),
            drives: BTreeMap::new(),
        };
        tree.insert_drive(root, default_capacity, now);
        tree
    }

    pub(crate) fn get(&self, location: &Location) -> Option<&Node> {
        self.entries.get(location.key())
    }

    pub(crate) fn get_mut(&mut self, location: &Location) -> Option<&mut Node> {
        self.entries.get_mut(location.key())
    }

    fn contains(&self, location: &Location) -> bool {
        self.entries.contains_key(location.key())
    }

    /// The node of `location` together with the drive that owns it.
    pub(crate) fn node_and_drive(
        &mut self,
        location: &Location,
    ) -> Option<(&mut Node, Option<&mut Drive>)> {
        let node = self.entries.get_mut(location.key())?;
        let drive = self.drives.get_mut(&location.root_key());
        Some((node, drive))
    }

    fn drive_mut(&mut self, location: &Location) -> Option<&mut Drive> {
        self.drives.get_mut(&location.root_key())
    }

    fn drive_name(&self, location: &Location) -> Option<String> {
        self.drives
            .get(&location.root_key())
            .map(|drive| drive.name().to_string())
    }

    fn insert_drive(&mut self, root: &str, total_bytes: u64, now: SystemTime) -> Drive {
        let key = comparison_key(root, self.os);
        let drive = Drive::new(root, total_bytes);
        self.drives.insert(key.clone(), drive.clone());
        let location = Location::new(root, root, Some(root.to_string()), self.os);
        self.entries.insert(
            key,
            Node {
                location,
                container: Container::directory(now),
            },
        );
        tracing::debug!(drive = root, total_bytes, "drive registered");
        drive
    }

    /// Registers `root` with `total_bytes`, or updates the capacity of the existing drive.
    fn register_drive(&mut self, root: &str, total_bytes: u64, now: SystemTime) -> Result<Drive> {
        match self.drives.get_mut(&comparison_key(root, self.os)) {
            Some(drive) => {
                drive.set_total_bytes(total_bytes)?;
                Ok(drive.clone())
            }
            None => Ok(self.insert_drive(root, total_bytes, now)),
        }
    }

    /// Name of the drive rooted at `root`, registering it with `default_capacity` if needed.
    fn ensure_drive(&mut self, root: &str, default_capacity: u64, now: SystemTime) -> String {
        match self.drives.get(&comparison_key(root, self.os)) {
            Some(drive) => drive.name().to_string(),
            None => self.insert_drive(root, default_capacity, now).name().to_string(),
        }
    }

    /// Keys of `location` and all its descendants on the same drive, in depth-first pre-order.
    fn subtree_keys(&self, location: &Location) -> Vec<String> {
        let key = location.key();
        let root_key = location.root_key();
        let separator = self.os.separator();
        let mut prefix = key.to_string();
        prefix.push(separator);

        let mut keys: Vec<String> = self
            .entries
            .range::<str, _>((Bound::Included(key), Bound::Unbounded))
            .take_while(|(k, _)| k.starts_with(key))
            .filter(|(k, node)| {
                (k.as_str() == key || k.starts_with(&prefix))
                    && node.location.root_key() == root_key
            })
            .map(|(k, _)| k.clone())
            .collect();
        // Byte order puts `b.txt` between `b` and `b/x`; order by components instead.
        keys.sort_by(|a, b| a.split(separator).cmp(b.split(separator)));
        keys
    }

    /// Fails unless the drive of `location` is registered and its parent exists as a directory.
    fn ensure_parent(&self, location: &Location) -> Result<()> {
        if !self.drives.contains_key(&location.root_key()) {
            return Err(VfsError::parent_not_found(location).into());
        }
        let Some(parent) = location.parent() else {
            return Ok(());
        };
        match self.get(&parent) {
            Some(node) if node.container.is_dir() => Ok(()),
            _ => Err(VfsError::parent_not_found(location).into()),
        }
    }

    fn insert(&mut self, location: Location, container: Container) -> Location {
        let drive = self.drive_name(&location);
        let location = location.with_drive(drive);
        self.entries.insert(
            location.key().to_string(),
            Node {
                location: location.clone(),
                container,
            },
        );
        location
    }

    /// Removes the subtree at `location`, children first, releasing file payloads.
    fn remove_subtree(&mut self, location: &Location) -> Vec<ChangeDescription> {
        let keys = self.subtree_keys(location);
        let root_key = location.root_key();
        let mut changes = Vec::with_capacity(keys.len());
        for key in keys.iter().rev() {
            let Some(node) = self.entries.remove(key) else {
                continue;
            };
            if node.container.is_file() {
                if let Some(drive) = self.drives.get_mut(&root_key) {
                    drive.release(node.container.len());
                }
            }
            changes.push(ChangeDescription::new(
                ChangeKind::Deleted,
                node.container.kind(),
                node.location,
            ));
        }
        changes
    }

    /// Moves or copies the subtree at `source` to `destination`.
    ///
    /// Nothing is touched unless the whole operation can succeed: the source must exist, the
    /// destination must be free with an existing parent directory, and the destination drive
    /// must have room for every byte that lands on it.
    fn relocate(
        &mut self,
        source: &Location,
        destination: &Location,
        copy: bool,
        now: SystemTime,
    ) -> Result<Vec<ChangeDescription>> {
        if !self.contains(source) {
            return Err(VfsError::not_found(source).into());
        }
        self.ensure_parent(destination)?;
        if self.contains(destination) {
            return Err(VfsError::already_exists(destination).into());
        }

        let keys = self.subtree_keys(source);
        let bytes: u64 = keys
            .iter()
            .filter_map(|key| self.entries.get(key))
            .filter(|node| node.container.is_file())
            .map(|node| node.container.len())
            .sum();

        let source_drive = source.root_key();
        let destination_drive = destination.root_key();
        let cross_drive = source_drive != destination_drive;
        if copy || cross_drive {
            if let Some(drive) = self.drives.get_mut(&destination_drive) {
                drive.charge(bytes)?;
            }
        }
        if !copy && cross_drive {
            if let Some(drive) = self.drives.get_mut(&source_drive) {
                drive.release(bytes);
            }
        }

        let destination = destination
            .clone()
            .with_drive(self.drive_name(destination));
        let planned: Vec<(String, Location)> = keys
            .iter()
            .filter_map(|key| {
                let node = self.entries.get(key)?;
                let target = node.location.rebase(source, &destination)?;
                Some((key.clone(), target))
            })
            .collect();

        let mut changes = Vec::with_capacity(planned.len());
        for (key, target) in planned {
            let node = if copy {
                self.entries.get(&key).cloned()
            } else {
                self.entries.remove(&key)
            };
            let Some(mut node) = node else {
                continue;
            };
            let kind = node.container.kind();
            let old = std::mem::replace(&mut node.location, target.clone());
            if copy {
                node.container.set_creation_time(now);
                node.container.set_last_access_time(now);
            }
            self.entries.insert(target.key().to_string(), node);
            changes.push(if copy {
                ChangeDescription::new(ChangeKind::Created, kind, target)
            } else {
                ChangeDescription::renamed(kind, target, old)
            });
        }

        if !copy {
            if let Some(cwd) = self.cwd.rebase(source, &destination) {
                self.cwd = cwd;
            }
        }
        Ok(changes)
    }

    /// Changes the stored spelling of a subtree whose key stays the same.
    fn relabel(&mut self, source: &Location, destination: &Location) -> Vec<ChangeDescription> {
        let keys = self.subtree_keys(source);
        let mut changes = Vec::with_capacity(keys.len());
        for key in keys {
            let Some(node) = self.entries.get_mut(&key) else {
                continue;
            };
            let Some(target) = node.location.rebase(source, destination) else {
                continue;
            };
            let target = target.with_drive(node.location.drive().map(str::to_string));
            let old = std::mem::replace(&mut node.location, target.clone());
            changes.push(ChangeDescription::renamed(node.container.kind(), target, old));
        }
        if let Some(cwd) = self.cwd.rebase(source, destination) {
            self.cwd = cwd;
        }
        changes
    }
}

impl MemoryStorage {
    /// Creates a storage with default [`StorageOptions`].
    pub fn new() -> Self {
        Self::with_options(StorageOptions::default())
    }

    pub fn with_options(options: StorageOptions) -> Self {
        let rules = options.rules();
        let now = options.clock.now();
        let tree = Tree::new(rules.os(), options.default_drive_capacity, now);
        Self {
            shared: Arc::new(Shared {
                rules,
                tree: Mutex::new(tree),
                access: RwLock::new(options.access),
                clock: options.clock,
                default_capacity: options.default_drive_capacity,
                interceptor: Interceptor::new(),
                notifier: Notifier::new(),
            }),
        }
    }

    pub fn os(&self) -> SimulatedOs {
        self.shared.os()
    }

    pub fn rules(&self) -> &PathRules {
        &self.shared.rules
    }

    /// Registration point for pre-mutation callbacks.
    pub fn intercept(&self) -> &Interceptor {
        self.shared.interceptor()
    }

    /// Registration point for post-mutation callbacks.
    pub fn notify(&self) -> &Notifier {
        self.shared.notifier()
    }

    pub fn access_strategy(&self) -> Arc<dyn AccessStrategy> {
        self.shared.access_strategy()
    }

    /// Replaces the permission strategy for all subsequent checks.
    pub fn set_access_strategy(&self, strategy: Arc<dyn AccessStrategy>) {
        *self.shared.access.write() = strategy;
    }

    pub fn drives(&self) -> Vec<Drive> {
        self.shared.lock().drives.values().cloned().collect()
    }

    /// Removes a drive and every container stored on it.
    ///
    /// Returns `Ok(false)` when no such drive is registered.
    ///
    /// # Errors
    /// * `PathInvalid` - `name` does not designate a drive root.
    /// * `NotSupported` - the current directory lies on the drive.
    pub fn remove_drive(&self, name: &str) -> Result<bool> {
        let root = normalize_drive_name(name, &self.shared.rules)?;
        let location = Location::new(root.as_str(), name, Some(root.clone()), self.os());
        {
            let tree = self.shared.lock();
            if !tree.drives.contains_key(location.key()) {
                return Ok(false);
            }
            if tree.cwd.root_key() == location.key() {
                return Err(VfsError::not_supported(format!(
                    "cannot remove drive '{root}': it holds the current directory"
                ))
                .into());
            }
        }

        let change =
            ChangeDescription::new(ChangeKind::Deleted, ContainerKind::Directory, location.clone());
        self.shared.interceptor().intercept(&change)?;

        let changes = {
            let mut tree = self.shared.lock();
            let changes = tree.remove_subtree(&location);
            tree.drives.remove(location.key());
            changes
        };
        tracing::debug!(drive = %root, removed = changes.len(), "drive removed");
        self.shared.notifier().notify_all(&changes);
        Ok(true)
    }

    pub fn exists(&self, location: &Location) -> bool {
        self.shared.lock().contains(location)
    }

    /// Creates a directory, or returns the one already at `location`.
    ///
    /// # Errors
    /// * `AlreadyExists` - a file occupies `location`.
    pub fn create_directory(&self, location: &Location) -> Result<ContainerRef> {
        let (_, container) = self.try_add_container(location, |_, now| Container::directory(now))?;
        if container.is_file()? {
            return Err(VfsError::already_exists(location).into());
        }
        Ok(container)
    }

    /// Creates `location` and every missing ancestor directory.
    pub fn create_directory_all(&self, location: &Location) -> Result<ContainerRef> {
        let mut missing = Vec::new();
        let mut current = Some(location.clone());
        while let Some(location) = current {
            if self.exists(&location) {
                break;
            }
            current = location.parent();
            missing.push(location);
        }
        for ancestor in missing.iter().rev() {
            self.create_directory(ancestor)?;
        }
        self.create_directory(location)
    }

    /// Creates a file holding `bytes`.
    ///
    /// # Errors
    /// * `AlreadyExists` - `location` is occupied.
    /// * `NotFound` - the parent directory does not exist.
    /// * `CapacityExceeded` - the drive has no room for `bytes`.
    pub fn create_file(&self, location: &Location, bytes: impl Into<Vec<u8>>) -> Result<ContainerRef> {
        let bytes = bytes.into();
        let (created, container) =
            self.try_add_container(location, |_, now| Container::file_with_bytes(now, bytes))?;
        if !created {
            return Err(VfsError::already_exists(location).into());
        }
        Ok(container)
    }

    fn handle(&self, location: Location) -> ContainerRef {
        ContainerRef::new(Arc::clone(&self.shared), location)
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tree = self.shared.lock();
        f.debug_struct("MemoryStorage")
            .field("os", &self.shared.os())
            .field("cwd", &tree.cwd)
            .field("entries", &tree.entries.len())
            .field("drives", &tree.drives.values().collect::<Vec<_>>())
            .finish()
    }
}

impl StorageBackend for MemoryStorage {
    /// Canonicalizes `path` against the current directory and attaches its drive.
    ///
    /// A drive that is referenced for the first time is registered with the default capacity.
    fn resolve(&self, path: &str) -> Result<Location> {
        let os = self.os();
        let now = self.shared.now();
        let mut tree = self.shared.lock();
        let full = normalize(path, tree.cwd.full_path(), &self.shared.rules)?;
        let root = root_of(&full, os).ok_or_else(|| VfsError::invalid(path, "the path has no root"))?;
        let drive = tree.ensure_drive(&root, self.shared.default_capacity, now);
        Ok(Location::new(full, path, Some(drive), os))
    }

    fn try_add_container<F>(&self, location: &Location, factory: F) -> Result<(bool, ContainerRef)>
    where
        F: FnOnce(&Location, SystemTime) -> Container,
    {
        if let Some(node) = self.shared.lock().get(location) {
            return Ok((false, self.handle(node.location.clone())));
        }

        let container = factory(location, self.shared.now());
        let kind = container.kind();
        let change = ChangeDescription::new(ChangeKind::Created, kind, location.clone());
        self.shared.interceptor().intercept(&change)?;

        let stored = {
            let mut tree = self.shared.lock();
            if let Some(node) = tree.get(location) {
                return Ok((false, self.handle(node.location.clone())));
            }
            tree.ensure_parent(location)?;
            if container.is_file() && !container.is_empty() {
                if let Some(drive) = tree.drive_mut(location) {
                    drive.charge(container.len())?;
                }
            }
            tree.insert(location.clone(), container)
        };

        tracing::debug!(path = %stored, ?kind, "container created");
        self.shared
            .notifier()
            .notify(&ChangeDescription::new(ChangeKind::Created, kind, stored.clone()));
        Ok((true, self.handle(stored)))
    }

    fn get_container(&self, location: &Location) -> Option<ContainerRef> {
        let location = self.shared.lock().get(location)?.location.clone();
        Some(self.handle(location))
    }

    /// Removes `location` with its whole subtree.
    ///
    /// # Errors
    /// * `NotSupported` - `location` is a drive root; use
    ///   [`remove_drive`](MemoryStorage::remove_drive).
    fn remove_container(&self, location: &Location) -> Result<bool> {
        if location.is_root() {
            return Err(VfsError::not_supported(format!(
                "cannot remove the drive root '{location}'"
            ))
            .into());
        }
        let Some(kind) = self.shared.lock().get(location).map(|n| n.container.kind()) else {
            return Ok(false);
        };

        let change = ChangeDescription::new(ChangeKind::Deleted, kind, location.clone());
        self.shared.interceptor().intercept(&change)?;

        let changes = self.shared.lock().remove_subtree(location);
        if changes.is_empty() {
            return Ok(false);
        }
        tracing::debug!(path = %location, removed = changes.len(), "container removed");
        self.shared.notifier().notify_all(&changes);
        Ok(true)
    }

    /// Relocates the subtree at `source`, including across drives.
    ///
    /// Renaming to a spelling that differs only in case (on a case-insensitive platform)
    /// updates the stored paths in place.
    ///
    /// # Errors
    /// * `NotSupported` - `destination` lies inside `source`, or `source` is a drive root.
    /// * `NotFound` - `source` or the parent of `destination` is missing.
    /// * `AlreadyExists` - `destination` is occupied.
    /// * `CapacityExceeded` - a cross-drive move does not fit on the destination drive.
    fn move_container(&self, source: &Location, destination: &Location) -> Result<()> {
        if destination.is_within(source) {
            return Err(VfsError::not_supported(format!(
                "cannot move '{source}' into its own subtree '{destination}'"
            ))
            .into());
        }
        if source.is_root() {
            return Err(
                VfsError::not_supported(format!("cannot move the drive root '{source}'")).into(),
            );
        }
        let Some(kind) = self.shared.lock().get(source).map(|n| n.container.kind()) else {
            return Err(VfsError::not_found(source).into());
        };
        if source == destination && source.full_path() == destination.full_path() {
            return Ok(());
        }

        let change = ChangeDescription::renamed(kind, destination.clone(), source.clone());
        self.shared.interceptor().intercept(&change)?;

        let changes = {
            let mut tree = self.shared.lock();
            if source == destination {
                if !tree.contains(source) {
                    return Err(VfsError::not_found(source).into());
                }
                tree.relabel(source, destination)
            } else {
                tree.relocate(source, destination, false, self.shared.now())?
            }
        };
        tracing::debug!(from = %source, to = %destination, moved = changes.len(), "container moved");
        self.shared.notifier().notify_all(&changes);
        Ok(())
    }

    /// Duplicates the subtree at `source`. Copies get fresh creation and access times.
    ///
    /// # Errors
    /// * `NotSupported` - `destination` lies inside `source`.
    /// * `NotFound` - `source` or the parent of `destination` is missing.
    /// * `AlreadyExists` - `destination` is occupied.
    /// * `CapacityExceeded` - the copy does not fit on the destination drive.
    fn copy_container(&self, source: &Location, destination: &Location) -> Result<()> {
        if destination.is_within(source) {
            return Err(VfsError::not_supported(format!(
                "cannot copy '{source}' into its own subtree '{destination}'"
            ))
            .into());
        }
        let Some(kind) = self.shared.lock().get(source).map(|n| n.container.kind()) else {
            return Err(VfsError::not_found(source).into());
        };

        let change = ChangeDescription::new(ChangeKind::Created, kind, destination.clone());
        self.shared.interceptor().intercept(&change)?;

        let changes = {
            let mut tree = self.shared.lock();
            tree.relocate(source, destination, true, self.shared.now())?
        };
        tracing::debug!(from = %source, to = %destination, copied = changes.len(), "container copied");
        self.shared.notifier().notify_all(&changes);
        Ok(())
    }

    fn current_directory(&self) -> Location {
        self.shared.lock().cwd.clone()
    }

    /// # Errors
    /// * `NotFound` - nothing exists at `location`.
    /// * `NotSupported` - `location` is a file.
    fn set_current_directory(&self, location: &Location) -> Result<()> {
        let mut tree = self.shared.lock();
        let node = tree.get(location).ok_or_else(|| VfsError::not_found(location))?;
        if node.container.is_file() {
            return Err(VfsError::not_supported(format!("'{location}' is not a directory")).into());
        }
        let cwd = node.location.clone();
        tree.cwd = cwd;
        Ok(())
    }

    /// Lists the entries below `location` whose name matches `pattern`, parents first.
    ///
    /// Windows uses the DOS wildcard rules (`*.*` matches everything); other platforms use
    /// plain `*`/`?` matching.
    ///
    /// # Errors
    /// * `NotFound` - nothing exists at `location`.
    /// * `NotSupported` - `location` is a file.
    /// * `AccessDenied` - the active identity may not enumerate `location`.
    fn enumerate(&self, location: &Location, pattern: &str, recursive: bool) -> Result<Vec<Location>> {
        let (container, entries) = {
            let tree = self.shared.lock();
            let node = tree.get(location).ok_or_else(|| VfsError::not_found(location))?;
            if node.container.is_file() {
                return Err(
                    VfsError::not_supported(format!("'{location}' is not a directory")).into(),
                );
            }
            let depth = node.location.components().len();
            let entries: Vec<Location> = tree
                .subtree_keys(location)
                .iter()
                .filter_map(|key| tree.entries.get(key))
                .filter(|entry| entry.location != *location)
                .filter(|entry| recursive || entry.location.components().len() == depth + 1)
                .map(|entry| entry.location.clone())
                .collect();
            (node.container.clone(), entries)
        };

        self.shared
            .check_access(location, &container, AccessOperation::Enumerate)?;

        let os = self.os();
        let match_type = match os {
            SimulatedOs::Windows => MatchType::Win32,
            _ => MatchType::Simple,
        };
        Ok(entries
            .into_iter()
            .filter(|entry| is_match(pattern, entry.name(), match_type, os.is_case_sensitive()))
            .collect())
    }

    /// # Errors
    /// * `PathInvalid` - `name` does not designate a drive root.
    /// * `CapacityExceeded` - the drive already stores more than `total_bytes`.
    fn add_drive(&self, name: &str, total_bytes: u64) -> Result<Drive> {
        let root = normalize_drive_name(name, &self.shared.rules)?;
        let now = self.shared.now();
        self.shared.lock().register_drive(&root, total_bytes, now)
    }

    fn get_drive(&self, name: &str) -> Option<Drive> {
        let root = normalize_drive_name(name, &self.shared.rules).ok()?;
        let key = comparison_key(&root, self.os());
        self.shared.lock().drives.get(&key).cloned()
    }
}
