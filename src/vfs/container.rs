use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;
use std::time::SystemTime;

use crate::core::Result;
use crate::error::VfsError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    File,
    Directory,
}

/// Windows-style file attribute bitmask.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileAttributes(u32);

impl FileAttributes {
    pub const READ_ONLY: FileAttributes = FileAttributes(0x0001);
    pub const HIDDEN: FileAttributes = FileAttributes(0x0002);
    pub const SYSTEM: FileAttributes = FileAttributes(0x0004);
    pub const DIRECTORY: FileAttributes = FileAttributes(0x0010);
    pub const ARCHIVE: FileAttributes = FileAttributes(0x0020);
    pub const NORMAL: FileAttributes = FileAttributes(0x0080);
    pub const TEMPORARY: FileAttributes = FileAttributes(0x0100);
    pub const ENCRYPTED: FileAttributes = FileAttributes(0x4000);

    pub const fn empty() -> Self {
        FileAttributes(0)
    }

    pub const fn from_bits(bits: u32) -> Self {
        FileAttributes(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: FileAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: FileAttributes) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FileAttributes) {
        self.0 &= !other.0;
    }
}

impl BitOr for FileAttributes {
    type Output = FileAttributes;

    fn bitor(self, rhs: FileAttributes) -> FileAttributes {
        FileAttributes(self.0 | rhs.0)
    }
}

impl BitOrAssign for FileAttributes {
    fn bitor_assign(&mut self, rhs: FileAttributes) {
        self.0 |= rhs.0;
    }
}

/// Unix permission bits (`rwxrwxrwx`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UnixMode(u32);

impl UnixMode {
    pub const USER_READ: UnixMode = UnixMode(0o400);
    pub const USER_WRITE: UnixMode = UnixMode(0o200);
    pub const USER_EXECUTE: UnixMode = UnixMode(0o100);
    pub const GROUP_READ: UnixMode = UnixMode(0o040);
    pub const GROUP_WRITE: UnixMode = UnixMode(0o020);
    pub const GROUP_EXECUTE: UnixMode = UnixMode(0o010);
    pub const OTHER_READ: UnixMode = UnixMode(0o004);
    pub const OTHER_WRITE: UnixMode = UnixMode(0o002);
    pub const OTHER_EXECUTE: UnixMode = UnixMode(0o001);

    pub const FILE_DEFAULT: UnixMode = UnixMode(0o644);
    pub const DIRECTORY_DEFAULT: UnixMode = UnixMode(0o755);

    pub const fn from_bits(bits: u32) -> Self {
        UnixMode(bits & 0o777)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: UnixMode) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for UnixMode {
    type Output = UnixMode;

    fn bitor(self, rhs: UnixMode) -> UnixMode {
        UnixMode(self.0 | rhs.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeStamps {
    pub created: SystemTime,
    pub last_access: SystemTime,
    pub last_write: SystemTime,
}

impl TimeStamps {
    pub fn all(time: SystemTime) -> Self {
        Self {
            created: time,
            last_access: time,
            last_write: time,
        }
    }
}

type MetadataValue = Arc<dyn Any + Send + Sync>;

/// The data and metadata of one file or directory.
///
/// A `Container` is plain data. Inside the storage it is mutated in place through
/// [`ContainerRef`](crate::ContainerRef); values returned by
/// [`ContainerRef::snapshot`](crate::ContainerRef::snapshot) are detached copies.
///
/// Directories never hold a byte payload: [`set_bytes`](Self::set_bytes) on a directory
/// fails with `NotSupported`.
#[derive(Clone)]
pub struct Container {
    kind: ContainerKind,
    bytes: Vec<u8>,
    attributes: FileAttributes,
    times: TimeStamps,
    encrypted: bool,
    owner: Option<String>,
    group: Option<String>,
    mode: UnixMode,
    metadata: BTreeMap<String, MetadataValue>,
}

impl Container {
    fn new(kind: ContainerKind, now: SystemTime) -> Self {
        Self {
            kind,
            bytes: Vec::new(),
            attributes: FileAttributes::empty(),
            times: TimeStamps::all(now),
            encrypted: false,
            owner: None,
            group: None,
            mode: match kind {
                ContainerKind::File => UnixMode::FILE_DEFAULT,
                ContainerKind::Directory => UnixMode::DIRECTORY_DEFAULT,
            },
            metadata: BTreeMap::new(),
        }
    }

    pub fn file(now: SystemTime) -> Self {
        Self::new(ContainerKind::File, now)
    }

    pub fn file_with_bytes(now: SystemTime, bytes: impl Into<Vec<u8>>) -> Self {
        let mut file = Self::file(now);
        file.bytes = bytes.into();
        file
    }

    pub fn directory(now: SystemTime) -> Self {
        Self::new(ContainerKind::Directory, now)
    }

    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn with_owner(mut self, user: impl Into<String>, group: impl Into<String>) -> Self {
        self.owner = Some(user.into());
        self.group = Some(group.into());
        self
    }

    pub fn with_mode(mut self, mode: UnixMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn kind(&self) -> ContainerKind {
        self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind == ContainerKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ContainerKind::Directory
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload size; always zero for directories.
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn set_bytes(&mut self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        if self.is_dir() {
            return Err(VfsError::not_supported("a directory cannot hold a byte payload").into());
        }
        self.bytes = bytes.into();
        Ok(())
    }

    /// Attributes as observed from outside: the stored flags plus `DIRECTORY` and `ENCRYPTED`
    /// where they apply, and `NORMAL` for a file with no other flag.
    pub fn attributes(&self) -> FileAttributes {
        let mut attributes = self.attributes;
        if self.is_dir() {
            attributes.insert(FileAttributes::DIRECTORY);
        }
        if self.encrypted {
            attributes.insert(FileAttributes::ENCRYPTED);
        }
        if attributes.is_empty() {
            attributes = FileAttributes::NORMAL;
        }
        attributes
    }

    pub fn set_attributes(&mut self, attributes: FileAttributes) {
        let mut stored = attributes;
        stored.remove(FileAttributes::DIRECTORY);
        stored.remove(FileAttributes::ENCRYPTED);
        stored.remove(FileAttributes::NORMAL);
        self.attributes = stored;
    }

    pub fn times(&self) -> TimeStamps {
        self.times
    }

    pub fn set_creation_time(&mut self, time: SystemTime) {
        self.times.created = time;
    }

    pub fn set_last_access_time(&mut self, time: SystemTime) {
        self.times.last_access = time;
    }

    pub fn set_last_write_time(&mut self, time: SystemTime) {
        self.times.last_write = time;
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn set_encrypted(&mut self, encrypted: bool) {
        self.encrypted = encrypted;
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn set_owner(&mut self, user: impl Into<String>, group: impl Into<String>) {
        self.owner = Some(user.into());
        self.group = Some(group.into());
    }

    pub fn mode(&self) -> UnixMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: UnixMode) {
        self.mode = mode;
    }

    pub fn metadata<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.metadata
            .get(key)
            .and_then(|value| Arc::clone(value).downcast::<T>().ok())
    }

    pub fn set_metadata<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.metadata.insert(key.into(), Arc::new(value));
    }

    pub fn remove_metadata(&mut self, key: &str) -> bool {
        self.metadata.remove(key).is_some()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .field("attributes", &self.attributes())
            .field("encrypted", &self.encrypted)
            .field("owner", &self.owner)
            .field("group", &self.group)
            .field("mode", &format_args!("{:o}", self.mode.bits()))
            .field("metadata", &self.metadata.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, error_kind};

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    #[test]
    fn test_directory_rejects_bytes() {
        let mut dir = Container::directory(now());
        let err = dir.set_bytes(b"x".to_vec()).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::NotSupported));
        assert!(dir.is_empty());
    }

    #[test]
    fn test_file_bytes() -> Result<()> {
        let mut file = Container::file_with_bytes(now(), b"abc".to_vec());
        assert_eq!(file.len(), 3);
        file.set_bytes(b"hello".to_vec())?;
        assert_eq!(file.bytes(), b"hello");
        Ok(())
    }

    #[test]
    fn test_observed_attributes() {
        let file = Container::file(now());
        assert_eq!(file.attributes(), FileAttributes::NORMAL);

        let dir = Container::directory(now()).with_attributes(FileAttributes::HIDDEN);
        assert!(dir.attributes().contains(FileAttributes::DIRECTORY));
        assert!(dir.attributes().contains(FileAttributes::HIDDEN));

        let mut secret = Container::file(now());
        secret.set_encrypted(true);
        assert!(secret.attributes().contains(FileAttributes::ENCRYPTED));
        assert!(!secret.attributes().contains(FileAttributes::NORMAL));
    }

    #[test]
    fn test_set_attributes_drops_derived_flags() {
        let mut file = Container::file(now());
        file.set_attributes(FileAttributes::DIRECTORY | FileAttributes::READ_ONLY);
        assert!(!file.attributes().contains(FileAttributes::DIRECTORY));
        assert!(file.attributes().contains(FileAttributes::READ_ONLY));
    }

    #[test]
    fn test_metadata() {
        let mut file = Container::file(now());
        file.set_metadata("answer", 42u32);
        assert_eq!(file.metadata::<u32>("answer").as_deref(), Some(&42));
        assert!(file.metadata::<String>("answer").is_none());

        let copy = file.clone();
        assert_eq!(copy.metadata::<u32>("answer").as_deref(), Some(&42));

        assert!(file.remove_metadata("answer"));
        assert!(file.metadata::<u32>("answer").is_none());
    }

    #[test]
    fn test_default_modes() {
        assert_eq!(Container::file(now()).mode(), UnixMode::FILE_DEFAULT);
        assert_eq!(Container::directory(now()).mode(), UnixMode::DIRECTORY_DEFAULT);
        assert!(Container::file(now()).owner().is_none());
    }
}
