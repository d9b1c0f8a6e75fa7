//! Case-insensitive search and replace across record fields.
//!
//! Fields are scanned in a fixed order per record (prefix, counter,
//! separator, description, extension, date), rows top to bottom within the
//! requested scope, without wrapping. The cursor re-anchors to the end of
//! each inserted replacement, so replace-all is a single bounded pass even
//! when the replacement text contains the needle.

use super::{CollectionEvent, MediaCollection};
use crate::error::{ErrorKind, Result};
use crate::record::MediaRecord;
use std::ops::Range;

/// Which rows a search or replace pass covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchScope {
    /// Every record in the collection.
    All,
    /// A contiguous run of rows, typically the current selection.
    Rows(Range<usize>),
}

impl SearchScope {
    /// The concrete row range for a collection of `len` records.
    /// Out-of-range bounds are clamped rather than rejected; an empty scope
    /// simply never matches.
    fn rows(&self, len: usize) -> Range<usize> {
        match self {
            Self::All => 0..len,
            Self::Rows(range) => range.start.min(len)..range.end.min(len),
        }
    }
}

/// Position of the current match: record row, field column, and the byte
/// span of the match within that field's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    pub row: usize,
    pub column: usize,
    pub start: usize,
    pub end: usize,
    pub(crate) needle: String,
    pub(crate) scope: SearchScope,
}

impl MediaCollection {
    /// Starts a fresh scan from the first field of the first record in
    /// `scope`. Returns `None` (and clears the cursor) when nothing matches.
    pub fn search(&mut self, needle: &str, scope: SearchScope) -> Option<SearchCursor> {
        self.cursor = None;
        if needle.is_empty() {
            return None;
        }
        let first = scope.rows(self.files.len()).start;
        self.advance(first, 0, 0, needle.to_string(), scope)
    }

    /// Continues past the current match, within the scope the search was
    /// started with. `None` once the scan reaches the end of the scope; the
    /// next [`search`](Self::search) starts over.
    pub fn search_next(&mut self) -> Option<SearchCursor> {
        let cursor = self.cursor.take()?;
        self.advance(cursor.row, cursor.column, cursor.end, cursor.needle, cursor.scope)
    }

    /// Replaces the current match with `replacement`, then advances to the
    /// next one. Failing without an active match keeps the caller honest
    /// about search state.
    pub fn replace(&mut self, replacement: &str) -> Result<Option<SearchCursor>> {
        let Some(cursor) = self.cursor.take() else {
            exn::bail!(ErrorKind::Invalid("replace without an active search match".to_string()));
        };
        let record = &mut self.files[cursor.row];
        let mut text = record.column(cursor.column).to_string();
        text.replace_range(cursor.start..cursor.end, replacement);
        record.set_column(cursor.column, text);
        self.emit(CollectionEvent::Changed);
        // Re-anchor past the inserted text so the replacement itself is
        // never rescanned.
        let resume = cursor.start + replacement.len();
        Ok(self.advance(cursor.row, cursor.column, resume, cursor.needle, cursor.scope))
    }

    /// One bounded pass over `scope`; returns the number of occurrences
    /// replaced. Records outside the scope are never touched.
    pub fn replace_all(
        &mut self,
        needle: &str,
        replacement: &str,
        scope: SearchScope,
    ) -> Result<usize> {
        if needle.is_empty() {
            exn::bail!(ErrorKind::Invalid("cannot search for an empty string".to_string()));
        }
        let mut replaced = 0;
        let mut current = self.search(needle, scope);
        while current.is_some() {
            current = self.replace(replacement)?;
            replaced += 1;
        }
        Ok(replaced)
    }

    /// Scans forward from (`row`, `column`, byte `from`) to the end of
    /// `scope`, stores and returns the first match.
    fn advance(
        &mut self,
        row: usize,
        mut column: usize,
        mut from: usize,
        needle: String,
        scope: SearchScope,
    ) -> Option<SearchCursor> {
        let rows = scope.rows(self.files.len());
        for row in row.max(rows.start)..rows.end {
            while column < MediaRecord::COLUMNS {
                let text = self.files[row].column(column);
                if let Some((start, end)) = find_ci(text, &needle, from) {
                    let cursor = SearchCursor { row, column, start, end, needle, scope };
                    self.cursor = Some(cursor.clone());
                    return Some(cursor);
                }
                column += 1;
                from = 0;
            }
            column = 0;
        }
        self.cursor = None;
        None
    }
}

/// Case-insensitive substring search starting at byte offset `from`,
/// returning the byte span of the first match in the original string.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<(usize, usize)> {
    if from > haystack.len() {
        return None;
    }
    let tail = &haystack[from..];
    for (offset, _) in tail.char_indices() {
        if let Some(len) = match_at(&tail[offset..], needle) {
            return Some((from + offset, from + offset + len));
        }
    }
    None
}

/// Byte length of a case-insensitive match of `needle` at the start of
/// `hay`, if any. Compares full Unicode lowercase expansions, so spans stay
/// correct for characters whose lowercase form differs in length.
fn match_at(hay: &str, needle: &str) -> Option<usize> {
    let mut end = 0;
    let mut hay_chars = hay.char_indices();
    for wanted in needle.chars() {
        let (index, found) = hay_chars.next()?;
        if !found.to_lowercase().eq(wanted.to_lowercase()) {
            return None;
        }
        end = index + found.len_utf8();
    }
    Some(end)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::collection;
    use super::*;

    #[test]
    fn test_find_ci_spans() {
        assert_eq!(find_ci("Holiday", "holi", 0), Some((0, 4)));
        assert_eq!(find_ci("aXbXc", "x", 2), Some((3, 4)));
        assert_eq!(find_ci("abc", "z", 0), None);
        assert_eq!(find_ci("abc", "c", 9), None);
    }

    #[test]
    fn test_search_scans_fields_in_order() {
        let mut coll = collection(&["IMG1_beach.jpg", "IMG2_img.jpg"]);
        let first = coll.search("img", SearchScope::All).unwrap();
        // Row 0 prefix before anything else.
        assert_eq!((first.row, first.column, first.start, first.end), (0, 0, 0, 3));
        let second = coll.search_next().unwrap();
        assert_eq!((second.row, second.column), (1, 0));
        let third = coll.search_next().unwrap();
        // Row 1 description ("img").
        assert_eq!((third.row, third.column), (1, 3));
        assert!(coll.search_next().is_none());
    }

    #[test]
    fn test_search_date_column() {
        let mut coll = collection(&["a1.jpg"]);
        let hit = coll.search("2017-06", SearchScope::All).unwrap();
        assert_eq!((hit.row, hit.column, hit.start), (0, 5, 0));
    }

    #[test]
    fn test_search_next_stays_inside_scope() {
        let mut coll = collection(&["IMG1_cat.jpg", "IMG2_cat.jpg", "IMG3_cat.jpg"]);
        assert_eq!(coll.search("cat", SearchScope::Rows(0..2)).map(|c| c.row), Some(0));
        assert_eq!(coll.search_next().map(|c| c.row), Some(1));
        // Row 2 matches too, but it is outside the scope.
        assert!(coll.search_next().is_none());
    }

    #[test]
    fn test_search_scope_clamped_to_collection() {
        let mut coll = collection(&["IMG1_cat.jpg"]);
        assert!(coll.search("cat", SearchScope::Rows(5..9)).is_none());
        assert!(coll.search("cat", SearchScope::Rows(1..1)).is_none());
    }

    #[test]
    fn test_replace_advances() {
        let mut coll = collection(&["IMG1_cat.jpg", "IMG2_cat.jpg"]);
        coll.search("cat", SearchScope::All).unwrap();
        let next = coll.replace("dog").unwrap();
        assert_eq!(coll.records()[0].resulting_filename(), "IMG1_dog.jpg");
        assert_eq!(next.map(|c| c.row), Some(1));
    }

    #[test]
    fn test_replace_without_match_fails() {
        let mut coll = collection(&["a1.jpg"]);
        let err = coll.replace("x").unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[test]
    fn test_replace_all_is_bounded_with_growing_replacement() {
        let mut coll = collection(&["IMG1_aa.jpg", "IMG2_a.jpg"]);
        // "a" -> "aa" would loop forever without re-anchoring.
        let replaced = coll.replace_all("a", "aa", SearchScope::All).unwrap();
        assert_eq!(replaced, 3);
        assert_eq!(coll.records()[0].resulting_filename(), "IMG1_aaaa.jpg");
        assert_eq!(coll.records()[1].resulting_filename(), "IMG2_aa.jpg");
    }

    #[test]
    fn test_replace_all_confined_to_scope() {
        let mut coll = collection(&["IMG1_cat.jpg", "IMG2_cat.jpg", "IMG3_cat.jpg"]);
        let replaced = coll.replace_all("cat", "dog", SearchScope::Rows(1..2)).unwrap();
        assert_eq!(replaced, 1);
        assert_eq!(coll.records()[0].resulting_filename(), "IMG1_cat.jpg");
        assert_eq!(coll.records()[1].resulting_filename(), "IMG2_dog.jpg");
        assert_eq!(coll.records()[2].resulting_filename(), "IMG3_cat.jpg");
    }

    #[test]
    fn test_replace_all_empty_needle_rejected() {
        let mut coll = collection(&["a1.jpg"]);
        assert!(coll.replace_all("", "x", SearchScope::All).is_err());
    }
}
