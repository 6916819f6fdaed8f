//! Per-platform path rules.

/// The operating system whose path semantics the storage imitates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SimulatedOs {
    Linux,
    MacOs,
    Windows,
}

impl SimulatedOs {
    /// The platform this crate was built for.
    pub fn current() -> Self {
        if cfg!(windows) {
            SimulatedOs::Windows
        } else if cfg!(target_os = "macos") {
            SimulatedOs::MacOs
        } else {
            SimulatedOs::Linux
        }
    }

    pub fn separator(self) -> char {
        match self {
            SimulatedOs::Windows => '\\',
            SimulatedOs::Linux | SimulatedOs::MacOs => '/',
        }
    }

    /// The second separator character that is rewritten to [`separator`](Self::separator).
    pub fn alt_separator(self) -> char {
        match self {
            SimulatedOs::Windows => '/',
            SimulatedOs::Linux | SimulatedOs::MacOs => '\\',
        }
    }

    pub fn is_case_sensitive(self) -> bool {
        self == SimulatedOs::Linux
    }

    /// Whether owner/group/other mode bits are enforced on this platform.
    pub fn has_permission_model(self) -> bool {
        self != SimulatedOs::Windows
    }

    /// The root of the drive that exists from the start.
    pub fn default_drive(self) -> &'static str {
        match self {
            SimulatedOs::Windows => "C:\\",
            SimulatedOs::Linux | SimulatedOs::MacOs => "/",
        }
    }

    pub fn default_invalid_chars(self) -> Vec<char> {
        match self {
            SimulatedOs::Windows => {
                let mut chars = vec!['"', '<', '>', '|'];
                chars.extend((1u8..32).map(char::from));
                chars
            }
            SimulatedOs::Linux | SimulatedOs::MacOs => Vec::new(),
        }
    }
}

impl Default for SimulatedOs {
    fn default() -> Self {
        Self::current()
    }
}

/// Path rules in effect for one storage instance: the simulated platform plus the set of
/// characters rejected in path input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRules {
    os: SimulatedOs,
    invalid_chars: Vec<char>,
}

impl PathRules {
    pub fn new(os: SimulatedOs) -> Self {
        Self {
            os,
            invalid_chars: os.default_invalid_chars(),
        }
    }

    /// Replaces the set of rejected characters. NUL stays rejected regardless.
    pub fn with_invalid_chars<I: IntoIterator<Item = char>>(mut self, chars: I) -> Self {
        self.invalid_chars = chars.into_iter().collect();
        self
    }

    pub fn os(&self) -> SimulatedOs {
        self.os
    }

    pub fn separator(&self) -> char {
        self.os.separator()
    }

    pub fn alt_separator(&self) -> char {
        self.os.alt_separator()
    }

    pub fn is_invalid_char(&self, c: char) -> bool {
        c == '\0' || self.invalid_chars.contains(&c)
    }

    /// Key used to compare canonical paths: one trailing separator stripped, case folded when
    /// the platform is case-insensitive.
    pub fn comparison_key(&self, path: &str) -> String {
        comparison_key(path, self.os)
    }
}

impl Default for PathRules {
    fn default() -> Self {
        Self::new(SimulatedOs::default())
    }
}

pub(crate) fn comparison_key(path: &str, os: SimulatedOs) -> String {
    let trimmed = path.strip_suffix(os.separator()).unwrap_or(path);
    if os.is_case_sensitive() {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}
