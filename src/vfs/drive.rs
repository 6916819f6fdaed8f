use crate::core::Result;
use crate::error::VfsError;

/// Capacity of a drive that was never configured explicitly: one gigabyte.
pub const DEFAULT_DRIVE_CAPACITY: u64 = 1024 * 1024 * 1024;

/// A capacity-bounded root of the tree.
///
/// Every byte stored in a file on the drive is charged against `total_bytes`. The invariant
/// `used_bytes <= total_bytes` holds at all times: a charge that would break it fails with
/// `CapacityExceeded` and leaves the drive untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drive {
    name: String,
    total_bytes: u64,
    used_bytes: u64,
}

impl Drive {
    pub(crate) fn new(name: impl Into<String>, total_bytes: u64) -> Self {
        Self {
            name: name.into(),
            total_bytes,
            used_bytes: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn available_free_space(&self) -> u64 {
        self.total_bytes - self.used_bytes
    }

    pub(crate) fn set_total_bytes(&mut self, total_bytes: u64) -> Result<()> {
        if total_bytes < self.used_bytes {
            return Err(VfsError::CapacityExceeded {
                drive: self.name.clone(),
                requested: self.used_bytes,
                available: total_bytes,
            }
            .into());
        }
        self.total_bytes = total_bytes;
        Ok(())
    }

    /// Fails without side effects when `bytes` exceeds the free space.
    pub(crate) fn charge(&mut self, bytes: u64) -> Result<()> {
        let available = self.available_free_space();
        if bytes > available {
            return Err(VfsError::CapacityExceeded {
                drive: self.name.clone(),
                requested: bytes,
                available,
            }
            .into());
        }
        self.used_bytes += bytes;
        Ok(())
    }

    pub(crate) fn release(&mut self, bytes: u64) {
        self.used_bytes = self.used_bytes.saturating_sub(bytes);
    }

    /// Accounts for a file payload changing from `old_len` to `new_len` bytes.
    pub(crate) fn resize(&mut self, old_len: u64, new_len: u64) -> Result<()> {
        if new_len > old_len {
            self.charge(new_len - old_len)
        } else {
            self.release(old_len - new_len);
            Ok(())
        }
    }
}
