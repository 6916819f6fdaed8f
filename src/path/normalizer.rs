//! Canonicalization of raw path input.
//!
//! A canonical path is absolute, uses only the primary separator of the simulated platform,
//! contains no `.`/`..` segments and no empty segments, and carries a trailing separator only
//! when it is a bare root (`/`, `C:\`, `\\host\share\`).

use crate::core::Result;
use crate::error::VfsError;

use super::os::{PathRules, SimulatedOs, comparison_key};

/// Where a raw path is anchored.
enum Anchor<'a> {
    /// Fully qualified: a root and the remainder below it.
    Absolute(String, &'a str),
    /// `C:foo` on Windows.
    DriveRelative(String, &'a str),
    /// `\foo` on Windows: the root of the current directory's drive.
    RootOfCurrent(&'a str),
    Relative(&'a str),
}

fn anchor(path: &str, os: SimulatedOs) -> Result<Anchor<'_>> {
    let sep = os.separator();

    let mut doubled = String::with_capacity(2);
    doubled.push(sep);
    doubled.push(sep);

    if let Some(after) = path.strip_prefix(doubled.as_str()) {
        let (host, remainder) = after.split_once(sep).unwrap_or((after, ""));
        if host.is_empty() {
            return Err(VfsError::invalid(path, "UNC path without a host name").into());
        }
        let remainder = remainder.trim_start_matches(sep);
        let (share, rest) = remainder.split_once(sep).unwrap_or((remainder, ""));
        let root = match share {
            "" | "." | ".." => {
                return Ok(Anchor::Absolute(format!("{sep}{sep}{host}{sep}"), remainder));
            }
            share => format!("{sep}{sep}{host}{sep}{share}{sep}"),
        };
        return Ok(Anchor::Absolute(root, rest));
    }

    if os == SimulatedOs::Windows {
        let bytes = path.as_bytes();
        if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
            let letter = char::from(bytes[0]).to_ascii_uppercase();
            let root = format!("{letter}:{sep}");
            let rest = &path[2..];
            return Ok(match rest.strip_prefix(sep) {
                Some(rest) => Anchor::Absolute(root, rest),
                None => Anchor::DriveRelative(root, rest),
            });
        }
        if let Some(rest) = path.strip_prefix(sep) {
            return Ok(Anchor::RootOfCurrent(rest));
        }
        return Ok(Anchor::Relative(path));
    }

    Ok(match path.strip_prefix(sep) {
        Some(rest) => Anchor::Absolute(sep.to_string(), rest),
        None => Anchor::Relative(path),
    })
}

/// Splits an already canonical path into its root and its segments.
fn split_canonical(path: &str, os: SimulatedOs) -> Result<(String, Vec<&str>)> {
    match anchor(path, os)? {
        Anchor::Absolute(root, rest) => Ok((
            root,
            rest.split(os.separator()).filter(|s| !s.is_empty()).collect(),
        )),
        _ => Err(VfsError::invalid(path, "the current directory is not absolute").into()),
    }
}

/// Returns the root prefix of a canonical path, if it has one.
pub(crate) fn root_of(canonical: &str, os: SimulatedOs) -> Option<String> {
    match anchor(canonical, os) {
        Ok(Anchor::Absolute(root, _)) => Some(root),
        _ => None,
    }
}

/// Canonicalizes `raw` against `current_directory` (itself canonical) under `rules`.
///
/// # Errors
/// * `PathInvalid` - `raw` is empty, contains NUL or a character from the invalid set, or is a
///   UNC path without a host.
/// * `PathNotFullyResolvable` - a `..` segment would climb above the root.
///
/// # Example
/// ```
/// use vfs_double::path::{PathRules, SimulatedOs, normalize};
///
/// let rules = PathRules::new(SimulatedOs::Windows);
/// let path = normalize("docs/../Notes//a.txt", "C:\\Users", &rules).unwrap();
/// assert_eq!(path, "C:\\Users\\Notes\\a.txt");
/// ```
pub fn normalize(raw: &str, current_directory: &str, rules: &PathRules) -> Result<String> {
    if raw.is_empty() {
        return Err(VfsError::invalid(raw, "the path is empty").into());
    }
    if let Some(c) = raw.chars().find(|&c| rules.is_invalid_char(c)) {
        return Err(VfsError::invalid(raw, format!("illegal character {c:?}")).into());
    }

    let os = rules.os();
    let sep = os.separator();
    let alt = os.alt_separator();
    let unified: String = raw.chars().map(|c| if c == alt { sep } else { c }).collect();

    let (root, mut parts, rest) = match anchor(&unified, os)? {
        Anchor::Absolute(root, rest) => (root, Vec::new(), rest),
        Anchor::DriveRelative(root, rest) => {
            let (cwd_root, cwd_parts) = split_canonical(current_directory, os)?;
            if comparison_key(&cwd_root, os) == comparison_key(&root, os) {
                (root, cwd_parts, rest)
            } else {
                (root, Vec::new(), rest)
            }
        }
        Anchor::RootOfCurrent(rest) => {
            let (cwd_root, _) = split_canonical(current_directory, os)?;
            (cwd_root, Vec::new(), rest)
        }
        Anchor::Relative(rest) => {
            let (cwd_root, cwd_parts) = split_canonical(current_directory, os)?;
            (cwd_root, cwd_parts, rest)
        }
    };

    for segment in rest.split(sep) {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(VfsError::PathNotFullyResolvable {
                        path: raw.to_string(),
                    }
                    .into());
                }
            }
            name => parts.push(name),
        }
    }

    let mut canonical = root;
    canonical.push_str(&parts.join(&sep.to_string()));
    Ok(canonical)
}

/// Turns a user supplied drive name (`"C"`, `"d:"`, `"E:\"`, `"\\server\share"`, `"/"`) into
/// the canonical root it designates.
pub fn normalize_drive_name(name: &str, rules: &PathRules) -> Result<String> {
    let os = rules.os();
    let bytes = name.as_bytes();
    let candidate = if os == SimulatedOs::Windows
        && !bytes.is_empty()
        && bytes[0].is_ascii_alphabetic()
        && (bytes.len() == 1 || (bytes.len() == 2 && bytes[1] == b':'))
    {
        format!("{}:{}", char::from(bytes[0]), os.separator())
    } else {
        name.to_string()
    };

    let full = normalize(&candidate, os.default_drive(), rules)?;
    match root_of(&full, os) {
        Some(root) if root.len() == full.len() => Ok(full),
        _ => Err(VfsError::invalid(name, "not a drive root").into()),
    }
}
