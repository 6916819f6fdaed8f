mod container;
mod drive;
mod handle;
mod location;
mod options;
mod storage;

pub use container::{Container, ContainerKind, FileAttributes, TimeStamps, UnixMode};
pub use drive::{DEFAULT_DRIVE_CAPACITY, Drive};
pub use handle::ContainerRef;
pub use location::Location;
pub use options::StorageOptions;
pub use storage::MemoryStorage;
