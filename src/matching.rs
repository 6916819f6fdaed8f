//! Wildcard matching of entry names.
//!
//! Two flavours are supported. [`MatchType::Simple`] understands `*` (any run of characters)
//! and `?` (exactly one character). [`MatchType::Win32`] additionally reproduces the legacy DOS
//! rules used by Windows enumeration: `*.*` matches everything, and the pattern is rewritten
//! with the DOS wildcards `<` (DOS_STAR), `>` (DOS_QM) and `"` (DOS_DOT) before matching.

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MatchType {
    #[default]
    Simple,
    Win32,
}

const DOS_STAR: char = '<';
const DOS_QM: char = '>';
const DOS_DOT: char = '"';

/// Returns `true` when `name` matches `pattern`.
///
/// # Example
/// ```
/// use vfs_double::matching::{MatchType, is_match};
///
/// assert!(is_match("*.txt", "notes.txt", MatchType::Simple, true));
/// assert!(is_match("*.*", "README", MatchType::Win32, false));
/// assert!(!is_match("*.*", "README", MatchType::Simple, false));
/// ```
pub fn is_match(pattern: &str, name: &str, match_type: MatchType, case_sensitive: bool) -> bool {
    let pattern: Vec<char> = match match_type {
        MatchType::Simple => pattern.chars().filter(|&c| !is_dos_wildcard(c)).collect(),
        MatchType::Win32 => {
            if pattern == "*" || pattern == "*.*" {
                return true;
            }
            translate_win32(pattern)
        }
    };
    let name: Vec<char> = name.chars().collect();
    Matcher::new(&pattern, &name, case_sensitive).matches(0, 0)
}

fn is_dos_wildcard(c: char) -> bool {
    c == DOS_STAR || c == DOS_QM || c == DOS_DOT
}

/// Rewrites a Win32 pattern into DOS wildcards: `?` becomes DOS_QM, a `*` followed by `.`
/// becomes DOS_STAR and a `.` followed by a wildcard or at the end becomes DOS_DOT.
fn translate_win32(pattern: &str) -> Vec<char> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut translated = Vec::with_capacity(chars.len());
    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied();
        translated.push(match c {
            '?' => DOS_QM,
            '*' if next == Some('.') => DOS_STAR,
            '.' if matches!(next, None | Some('?') | Some('*')) => DOS_DOT,
            other => other,
        });
    }
    translated
}

struct Matcher<'a> {
    pattern: &'a [char],
    name: &'a [char],
    case_sensitive: bool,
    memo: Vec<Option<bool>>,
}

impl<'a> Matcher<'a> {
    fn new(pattern: &'a [char], name: &'a [char], case_sensitive: bool) -> Self {
        Self {
            pattern,
            name,
            case_sensitive,
            memo: vec![None; (pattern.len() + 1) * (name.len() + 1)],
        }
    }

    fn matches(&mut self, p: usize, n: usize) -> bool {
        let slot = p * (self.name.len() + 1) + n;
        if let Some(known) = self.memo[slot] {
            return known;
        }
        let result = self.step(p, n);
        self.memo[slot] = Some(result);
        result
    }

    fn step(&mut self, p: usize, n: usize) -> bool {
        let Some(&token) = self.pattern.get(p) else {
            return n == self.name.len();
        };
        let current = self.name.get(n).copied();
        match token {
            '*' => self.matches(p + 1, n) || (current.is_some() && self.matches(p, n + 1)),
            '?' => current.is_some() && self.matches(p + 1, n + 1),
            DOS_STAR => {
                // any run of characters up to, but not past, the final period
                if self.matches(p + 1, n) {
                    return true;
                }
                match current {
                    Some('.') if !self.name[n + 1..].contains(&'.') => false,
                    Some(_) => self.matches(p, n + 1),
                    None => false,
                }
            }
            DOS_QM => match current {
                None | Some('.') => self.matches(p + 1, n),
                Some(_) => self.matches(p + 1, n + 1),
            },
            DOS_DOT => match current {
                None => self.matches(p + 1, n),
                Some('.') => self.matches(p + 1, n + 1),
                Some(_) => false,
            },
            literal => current.is_some_and(|c| self.same(literal, c)) && self.matches(p + 1, n + 1),
        }
    }

    fn same(&self, a: char, b: char) -> bool {
        if self.case_sensitive {
            a == b
        } else {
            a == b || a.to_lowercase().eq(b.to_lowercase())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod simple {
        use super::*;

        #[test]
        fn test_star_and_question_mark() {
            assert!(is_match("*", "anything", MatchType::Simple, true));
            assert!(is_match("*", "", MatchType::Simple, true));
            assert!(is_match("a?c", "abc", MatchType::Simple, true));
            assert!(!is_match("a?c", "ac", MatchType::Simple, true));
            assert!(is_match("*.txt", "a.b.txt", MatchType::Simple, true));
            assert!(!is_match("*.txt", "a.txt.bak", MatchType::Simple, true));
        }

        #[test]
        fn test_case_sensitivity() {
            assert!(!is_match("*.TXT", "a.txt", MatchType::Simple, true));
            assert!(is_match("*.TXT", "a.txt", MatchType::Simple, false));
        }

        #[test]
        fn test_dos_wildcards_are_ignored() {
            assert!(is_match("a<b", "ab", MatchType::Simple, true));
        }
    }

    mod win32 {
        use super::*;

        #[test]
        fn test_star_dot_star_matches_everything() {
            assert!(is_match("*.*", "noext", MatchType::Win32, false));
            assert!(is_match("*.*", "a.b", MatchType::Win32, false));
        }

        #[test]
        fn test_star_dot_matches_names_without_extension() {
            assert!(is_match("*.", "noext", MatchType::Win32, false));
            assert!(!is_match("*.", "file.txt", MatchType::Win32, false));
        }

        #[test]
        fn test_question_marks_match_short_names() {
            // DOS_QM also matches zero characters before a period or the end
            assert!(is_match("a??.txt", "a.txt", MatchType::Win32, false));
            assert!(is_match("a??.txt", "abc.txt", MatchType::Win32, false));
            assert!(!is_match("a??.txt", "abcd.txt", MatchType::Win32, false));
        }

        #[test]
        fn test_star_before_period_stops_at_last_period() {
            assert!(is_match("*.txt", "archive.tar.txt", MatchType::Win32, false));
            assert!(!is_match("*.txt", "notes.txt.bak", MatchType::Win32, false));
        }

        #[test]
        fn test_trailing_dot_star() {
            assert!(is_match("data.*", "data", MatchType::Win32, false));
            assert!(is_match("data.*", "data.csv", MatchType::Win32, false));
        }
    }
}
