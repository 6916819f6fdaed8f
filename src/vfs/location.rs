use std::fmt;
use std::hash::{Hash, Hasher};

use crate::path::{SimulatedOs, comparison_key, root_of};

/// Canonical identifier of a node in the storage tree.
///
/// A `Location` is an immutable value: a canonical full path, the name of the drive owning it
/// (if that drive is registered) and the friendly name the caller originally typed. Two
/// locations are equal when their canonical paths match after stripping one trailing
/// separator, with case folded on case-insensitive platforms.
#[derive(Clone)]
pub struct Location {
    full_path: String,
    friendly_name: String,
    drive: Option<String>,
    key: String,
    root_len: usize,
    os: SimulatedOs,
}

impl Location {
    /// `full_path` must already be canonical for `os`.
    pub(crate) fn new(
        full_path: impl Into<String>,
        friendly_name: impl Into<String>,
        drive: Option<String>,
        os: SimulatedOs,
    ) -> Self {
        let full_path = full_path.into();
        let root_len = root_of(&full_path, os).map_or(0, |root| root.len());
        Self {
            key: comparison_key(&full_path, os),
            friendly_name: friendly_name.into(),
            full_path,
            drive,
            root_len,
            os,
        }
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The path as the caller spelled it before canonicalization.
    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Name of the owning drive, `None` when the path lies on an unregistered drive.
    pub fn drive(&self) -> Option<&str> {
        self.drive.as_deref()
    }

    pub fn os(&self) -> SimulatedOs {
        self.os
    }

    pub fn root(&self) -> &str {
        &self.full_path[..self.root_len]
    }

    pub fn is_root(&self) -> bool {
        self.full_path.len() == self.root_len
    }

    /// Last segment of the path; the root itself for a bare root.
    pub fn name(&self) -> &str {
        if self.is_root() {
            return self.root();
        }
        match self.full_path.rfind(self.os.separator()) {
            Some(idx) if idx >= self.root_len => &self.full_path[idx + 1..],
            _ => &self.full_path[self.root_len..],
        }
    }

    /// Segments below the root, in order.
    pub fn components(&self) -> Vec<&str> {
        self.full_path[self.root_len..]
            .split(self.os.separator())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn parent(&self) -> Option<Location> {
        if self.is_root() {
            return None;
        }
        let parent = match self.full_path.rfind(self.os.separator()) {
            Some(idx) if idx >= self.root_len => &self.full_path[..idx],
            _ => self.root(),
        };
        Some(Location::new(parent, parent, self.drive.clone(), self.os))
    }

    /// Location of the child `name` below `self`.
    pub fn join(&self, name: &str) -> Location {
        let full = if self.is_root() {
            format!("{}{}", self.full_path, name)
        } else {
            format!("{}{}{}", self.full_path, self.os.separator(), name)
        };
        Location::new(full.clone(), full, self.drive.clone(), self.os)
    }

    /// `true` when `self` lies strictly below `ancestor`.
    pub fn is_within(&self, ancestor: &Location) -> bool {
        let mut prefix = ancestor.key.clone();
        prefix.push(self.os.separator());
        self.key.starts_with(&prefix)
    }

    /// Re-anchors `self`, which must be `from` or lie below it, under `to`.
    pub fn rebase(&self, from: &Location, to: &Location) -> Option<Location> {
        if self != from && !self.is_within(from) {
            return None;
        }
        let skip = from.components().len();
        let mut rebased = to.clone();
        for component in self.components().into_iter().skip(skip) {
            rebased = rebased.join(component);
        }
        Some(Location::new(
            rebased.full_path.clone(),
            rebased.full_path,
            to.drive.clone(),
            self.os,
        ))
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    /// Comparison key of the owning drive root.
    pub(crate) fn root_key(&self) -> String {
        comparison_key(self.root(), self.os)
    }

    pub(crate) fn with_drive(mut self, drive: Option<String>) -> Self {
        self.drive = drive;
        self
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Location {}

impl Hash for Location {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("full_path", &self.full_path)
            .field("drive", &self.drive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unix(path: &str) -> Location {
        Location::new(path, path, Some("/".to_string()), SimulatedOs::Linux)
    }

    fn windows(path: &str) -> Location {
        Location::new(path, path, Some("C:\\".to_string()), SimulatedOs::Windows)
    }

    mod equality {
        use super::*;

        #[test]
        fn test_trailing_separator_is_ignored() {
            assert_eq!(unix("/a/b"), unix("/a/b/"));
        }

        #[test]
        fn test_case_rules() {
            assert_ne!(unix("/A"), unix("/a"));
            assert_eq!(windows("C:\\Foo"), windows("C:\\FOO"));
            // display keeps the spelling it was created with
            assert_eq!(windows("C:\\Foo").full_path(), "C:\\Foo");
        }
    }

    mod navigation {
        use super::*;

        #[test]
        fn test_root() {
            let root = unix("/");
            assert!(root.is_root());
            assert_eq!(root.name(), "/");
            assert!(root.parent().is_none());

            let drive = windows("C:\\");
            assert!(drive.is_root());
            assert_eq!(drive.root(), "C:\\");
        }

        #[test]
        fn test_parent_and_name() {
            let file = unix("/a/b/c.txt");
            assert_eq!(file.name(), "c.txt");
            assert_eq!(file.parent(), Some(unix("/a/b")));
            assert_eq!(unix("/a").parent(), Some(unix("/")));
            assert_eq!(windows("C:\\a").parent(), Some(windows("C:\\")));
        }

        #[test]
        fn test_join() {
            assert_eq!(unix("/").join("a").full_path(), "/a");
            assert_eq!(unix("/a").join("b").full_path(), "/a/b");
            assert_eq!(windows("C:\\").join("x").full_path(), "C:\\x");
        }

        #[test]
        fn test_is_within() {
            let dir = unix("/a");
            assert!(unix("/a/b").is_within(&dir));
            assert!(unix("/a/b/c").is_within(&dir));
            assert!(!unix("/a").is_within(&dir));
            assert!(!unix("/ab").is_within(&dir));
            assert!(unix("/a").is_within(&unix("/")));
            assert!(windows("C:\\DIR\\x").is_within(&windows("c:\\dir")));
        }

        #[test]
        fn test_rebase() {
            let moved = unix("/a/b/c").rebase(&unix("/a"), &unix("/x/y"));
            assert_eq!(moved.map(|l| l.full_path().to_string()).as_deref(), Some("/x/y/b/c"));

            assert!(unix("/other").rebase(&unix("/a"), &unix("/x")).is_none());
        }

        #[test]
        fn test_unc_components() {
            let loc = Location::new(
                "\\\\srv\\share\\dir\\f",
                "f",
                None,
                SimulatedOs::Windows,
            );
            assert_eq!(loc.root(), "\\\\srv\\share\\");
            assert_eq!(loc.components(), vec!["dir", "f"]);
            assert_eq!(loc.name(), "f");
        }
    }
}
