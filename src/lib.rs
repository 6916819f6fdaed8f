//! An in-memory virtual file system engine for deterministic file-system test doubles.
//! Reproduces the observable behavior of a hierarchical file system without touching the disk,
//! and lets tests veto operations before they happen and wait for them after they happened.
//!
//! ### Overview
//!
//! `vfs-double` keeps files and directories in a [`MemoryStorage`] tree spread over
//! capacity-bounded drives. Paths are resolved for a simulated platform ([`path::SimulatedOs`]):
//! Linux, macOS or Windows separators, case rules, drive letters and UNC shares.
//! The storage implements the [`StorageBackend`] trait that a file-system facade builds on.
//!
//! **Key ideas**:
//! - **Determinism**: Timestamps come from an injected [`time::Clock`]; nothing depends on the host.
//! - **Capacity**: Every byte is charged to its drive; a write that does not fit fails and keeps the old content.
//! - **Permissions**: A pluggable [`AccessStrategy`] checks reads, writes and enumeration against owner/group/other bits.
//! - **Interception**: [`Interceptor`] callbacks run before a change and can veto it with any error, which reaches the caller unchanged.
//! - **Notification**: [`Notifier`] callbacks run after a change; [`AwaitableNotification`] blocks until matching events arrived.
//!
//! ### Example
//!
//! ```
//! use std::time::Duration;
//! use vfs_double::{ChangeKind, EventFilter, MemoryStorage, NodeFilter, StorageBackend};
//!
//! let storage = MemoryStorage::new();
//! let created = storage
//!     .notify()
//!     .watch(EventFilter::new(ChangeKind::Created, NodeFilter::File));
//!
//! let report = storage.resolve("/report.txt").unwrap();
//! storage.create_file(&report, b"done".to_vec()).unwrap();
//!
//! let events = created.wait(Some(Duration::from_secs(1))).unwrap();
//! assert_eq!(events[0].location(), &report);
//! ```

mod access;
mod core;
pub mod error;
mod hub;
pub mod matching;
pub mod path;
pub mod time;
mod vfs;

pub use access::{AccessOperation, AccessStrategy, DefaultAccessStrategy, Identity};
pub use crate::core::{Result, StorageBackend};
pub use error::{ErrorKind, MissingPart, VfsError, error_kind};
pub use hub::{
    AwaitableNotification, ChangeDescription, ChangeKind, EventFilter, InterceptCallback,
    Interceptor, NodeFilter, NotifyCallback, Notifier, Registration,
};
pub use vfs::{
    Container, ContainerKind, ContainerRef, DEFAULT_DRIVE_CAPACITY, Drive, FileAttributes,
    Location, MemoryStorage, StorageOptions, TimeStamps, UnixMode,
};
