//! The structured name fields and the separator character set.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The five structured fields of one filename.
///
/// [`compose`](Self::compose) is a plain concatenation in fixed field order,
/// making it the exact left inverse of [`decompose`](crate::decompose) for
/// any value decompose can produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    /// Everything before the counter digit run.
    pub prefix: String,
    /// The counter digit run itself, padding preserved (`"007"` stays `"007"`).
    pub counter: String,
    /// A single separator character split off the front of the description,
    /// or empty.
    pub separator: String,
    /// Everything after the counter (and separator).
    pub description: String,
    /// The extension including its leading dot, or empty.
    pub extension: String,
}

impl NameParts {
    /// Reassembles the filename: `prefix + counter + separator + description + extension`.
    pub fn compose(&self) -> String {
        let mut name = String::with_capacity(
            self.prefix.len()
                + self.counter.len()
                + self.separator.len()
                + self.description.len()
                + self.extension.len(),
        );
        name.push_str(&self.prefix);
        name.push_str(&self.counter);
        name.push_str(&self.separator);
        name.push_str(&self.description);
        name.push_str(&self.extension);
        name
    }

    /// The counter field parsed as a number, if present and numeric.
    pub fn counter_value(&self) -> Option<u64> {
        if self.counter.is_empty() { None } else { self.counter.parse().ok() }
    }

    /// The name without its extension. Unique-suffix generation inserts
    /// `-1`, `-2`, … between this and [`extension`](Self::extension).
    pub fn stem(&self) -> String {
        let mut stem = self.compose();
        stem.truncate(stem.len() - self.extension.len());
        stem
    }
}

impl Display for NameParts {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.compose())
    }
}

/// The set of characters accepted as a one-character separator between the
/// counter and the description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeparatorSet(Vec<char>);

impl SeparatorSet {
    pub fn new(chars: impl IntoIterator<Item = char>) -> Self {
        Self(chars.into_iter().collect())
    }

    pub fn contains(&self, c: char) -> bool {
        self.0.contains(&c)
    }
}

impl Default for SeparatorSet {
    /// The characters people actually put between a counter and a
    /// description: underscore, hyphen, dot, space.
    fn default() -> Self {
        Self(vec!['_', '-', '.', ' '])
    }
}

impl FromStr for SeparatorSet {
    type Err = std::convert::Infallible;

    /// Every character of the string becomes a member; there is no syntax to
    /// get wrong.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.chars().collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(prefix: &str, counter: &str, separator: &str, description: &str, extension: &str) -> NameParts {
        NameParts {
            prefix: prefix.into(),
            counter: counter.into(),
            separator: separator.into(),
            description: description.into(),
            extension: extension.into(),
        }
    }

    #[test]
    fn test_compose_order() {
        let p = parts("IMG", "0001", "_", "holiday", ".jpg");
        assert_eq!(p.compose(), "IMG0001_holiday.jpg");
        assert_eq!(p.to_string(), "IMG0001_holiday.jpg");
    }

    #[test]
    fn test_compose_empty_fields() {
        assert_eq!(parts("", "", "", "notes", ".txt").compose(), "notes.txt");
        assert_eq!(parts("", "", "", "", "").compose(), "");
    }

    #[test]
    fn test_counter_value() {
        assert_eq!(parts("", "007", "", "", ".jpg").counter_value(), Some(7));
        assert_eq!(parts("", "", "", "x", ".jpg").counter_value(), None);
    }

    #[test]
    fn test_stem() {
        assert_eq!(parts("IMG", "1", "_", "x", ".jpg").stem(), "IMG1_x");
        assert_eq!(parts("", "", "", "name", "").stem(), "name");
    }

    #[test]
    fn test_separator_set() {
        let set = SeparatorSet::default();
        assert!(set.contains('_'));
        assert!(set.contains('-'));
        assert!(!set.contains('x'));
        let custom: SeparatorSet = "~+".parse().unwrap();
        assert!(custom.contains('~'));
        assert!(!custom.contains('_'));
    }
}
