use std::fmt;
use std::sync::Arc;

use crate::access::{AccessStrategy, DefaultAccessStrategy};
use crate::path::{PathRules, SimulatedOs};
use crate::time::{Clock, SystemClock};

use super::drive::DEFAULT_DRIVE_CAPACITY;

/// Construction-time settings of a [`MemoryStorage`](crate::MemoryStorage).
///
/// ### Defaults
/// * simulated OS: the host platform ([`SimulatedOs::current`]);
/// * default drive capacity: one gigabyte;
/// * invalid path characters: the platform defaults;
/// * access strategy: [`DefaultAccessStrategy`] with the identity `user:user`;
/// * clock: [`SystemClock`].
///
/// ### Example
/// ```
/// use std::sync::Arc;
/// use vfs_double::{MemoryStorage, StorageBackend, StorageOptions};
/// use vfs_double::path::SimulatedOs;
/// use vfs_double::time::ManualClock;
///
/// let options = StorageOptions::new()
///     .simulating(SimulatedOs::Windows)
///     .default_drive_capacity(4096)
///     .clock(Arc::new(ManualClock::default()));
/// let storage = MemoryStorage::with_options(options);
/// assert_eq!(storage.get_drive("C").unwrap().total_bytes(), 4096);
/// ```
#[derive(Clone)]
pub struct StorageOptions {
    pub(crate) os: SimulatedOs,
    pub(crate) default_drive_capacity: u64,
    pub(crate) invalid_chars: Option<Vec<char>>,
    pub(crate) access: Arc<dyn AccessStrategy>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl StorageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulating(mut self, os: SimulatedOs) -> Self {
        self.os = os;
        self
    }

    pub fn default_drive_capacity(mut self, bytes: u64) -> Self {
        self.default_drive_capacity = bytes;
        self
    }

    /// Replaces the platform's default set of characters rejected in paths.
    pub fn invalid_chars<I: IntoIterator<Item = char>>(mut self, chars: I) -> Self {
        self.invalid_chars = Some(chars.into_iter().collect());
        self
    }

    pub fn access_strategy(mut self, strategy: Arc<dyn AccessStrategy>) -> Self {
        self.access = strategy;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn rules(&self) -> PathRules {
        let rules = PathRules::new(self.os);
        match &self.invalid_chars {
            Some(chars) => rules.with_invalid_chars(chars.iter().copied()),
            None => rules,
        }
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            os: SimulatedOs::current(),
            default_drive_capacity: DEFAULT_DRIVE_CAPACITY,
            invalid_chars: None,
            access: Arc::new(DefaultAccessStrategy::default()),
            clock: Arc::new(SystemClock),
        }
    }
}

impl fmt::Debug for StorageOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageOptions")
            .field("os", &self.os)
            .field("default_drive_capacity", &self.default_drive_capacity)
            .field("invalid_chars", &self.invalid_chars)
            .finish_non_exhaustive()
    }
}
