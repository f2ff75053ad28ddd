use std::path::Path;

use crate::error::{DecodeError, Result};

/// The compiled format-string table referenced by extended packets.
///
/// The firmware build strips format strings out of the image and ships them
/// as a NUL-separated blob; packets then carry a table index instead of
/// text. The table is loaded once and shared read-only by every decoder
/// that needs it.
#[derive(Debug, Clone, Default)]
pub struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    /// Build a table from already-split entries. Mostly useful in tests.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a NUL-separated string blob.
    ///
    /// Index positions must match what the firmware build assigned, so
    /// empty entries between consecutive NULs are preserved.
    pub fn from_blob(blob: &[u8]) -> Self {
        let entries = blob
            .split(|&b| b == 0)
            .map(|s| String::from_utf8_lossy(s).into_owned())
            .collect();
        Self { entries }
    }

    /// Read and parse a string blob from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let blob = std::fs::read(path).map_err(DecodeError::StringTableLoad)?;
        Ok(Self::from_blob(&blob))
    }

    /// Look up an entry by table index.
    pub fn get(&self, index: u32) -> Option<&str> {
        self.entries.get(index as usize).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_splits_on_nul() {
        let table = StringTable::from_blob(b"first\0second\0third %d");
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0), Some("first"));
        assert_eq!(table.get(2), Some("third %d"));
        assert_eq!(table.get(3), None);
    }

    #[test]
    fn empty_entries_keep_their_index() {
        let table = StringTable::from_blob(b"a\0\0c");
        assert_eq!(table.get(1), Some(""));
        assert_eq!(table.get(2), Some("c"));
    }

    #[test]
    fn from_entries_round_trips() {
        let table = StringTable::from_entries(["x", "y"]);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec!["x", "y"]);
        assert!(!table.is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(StringTable::from_file("/nonexistent/str_blob").is_err());
    }
}
