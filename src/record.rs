// 🏷️ Name Record - one annotated symbol (or a category header)
// Identity is structural: (address, name) for entries, category for headers

use serde::{Deserialize, Serialize};

// ============================================================================
// RECORD KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Address and name both set
    Entry,

    /// Address and name both empty, category set - a comment line for the category
    CategoryHeader,
}

// ============================================================================
// RECORD
// ============================================================================

/// A single row of the name database.
///
/// Field names are PascalCase on disk (`Category`, `Address`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Record {
    /// Free-text grouping (e.g. "UI", "Networking")
    #[serde(default)]
    pub category: String,

    /// Offset from the reference base, `0x` + uppercase hex
    #[serde(default)]
    pub address: String,

    /// Symbol name
    #[serde(default)]
    pub name: String,

    /// Status code from the configured status catalog
    #[serde(default)]
    pub status: i32,

    #[serde(default)]
    pub comment: String,
}

impl Record {
    pub fn new(
        category: impl Into<String>,
        address: impl Into<String>,
        name: impl Into<String>,
        status: i32,
        comment: impl Into<String>,
    ) -> Self {
        Record {
            category: category.into(),
            address: address.into(),
            name: name.into(),
            status,
            comment: comment.into(),
        }
    }

    /// Create a category header entry
    pub fn header(category: impl Into<String>, comment: impl Into<String>) -> Self {
        Record {
            category: category.into(),
            comment: comment.into(),
            ..Record::default()
        }
    }

    /// Classify the record, or `None` if it is malformed
    pub fn kind(&self) -> Option<RecordKind> {
        match (self.address.is_empty(), self.name.is_empty()) {
            (false, false) => Some(RecordKind::Entry),
            (true, true) if !self.category.is_empty() => Some(RecordKind::CategoryHeader),
            _ => None,
        }
    }

    pub fn is_header(&self) -> bool {
        self.address.is_empty() && self.name.is_empty()
    }

    /// Explain why a record is malformed
    pub fn validate(&self) -> Result<RecordKind, String> {
        self.kind().ok_or_else(|| {
            if self.is_header() {
                "category header needs a category".to_string()
            } else if self.address.is_empty() {
                format!("entry {:?} has no address", self.name)
            } else {
                format!("entry at {} has no name", self.address)
            }
        })
    }

    /// Overwrite the mutable metadata from another record
    pub fn apply_metadata(&mut self, other: &Record) {
        self.category = other.category.clone();
        self.status = other.status;
        self.comment = other.comment.clone();
    }

    /// Plain-text rendering used for copying a row to the clipboard
    pub fn copy_text(&self) -> String {
        let text = format!(
            "Category: {}\nAddress: {}\nName: {}\nStatus: {}\nComment: {}\n",
            self.category, self.address, self.name, self.status, self.comment
        );
        text.trim().to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(Record::new("UI", "0x10", "Foo", 0, "").kind(), Some(RecordKind::Entry));
        assert_eq!(Record::new("", "0x10", "Foo", 0, "").kind(), Some(RecordKind::Entry));
        assert_eq!(Record::header("UI", "widgets").kind(), Some(RecordKind::CategoryHeader));
        assert_eq!(Record::header("", "orphan").kind(), None);
        assert_eq!(Record::new("UI", "0x10", "", 0, "").kind(), None);
        assert_eq!(Record::new("UI", "", "Foo", 0, "").kind(), None);
    }

    #[test]
    fn test_validate_reason() {
        let err = Record::new("UI", "0x10", "", 0, "").validate().unwrap_err();
        assert!(err.contains("0x10"));
    }

    #[test]
    fn test_apply_metadata_keeps_identity() {
        let mut existing = Record::new("UI", "0x10", "Foo", 0, "");
        existing.apply_metadata(&Record::new("UI2", "0x99", "Other", 1, "x"));

        assert_eq!(existing, Record::new("UI2", "0x10", "Foo", 1, "x"));
    }

    #[test]
    fn test_copy_text() {
        let record = Record::new("UI", "0x10", "Foo", 1, "");
        assert_eq!(
            record.copy_text(),
            "Category: UI\nAddress: 0x10\nName: Foo\nStatus: 1\nComment:"
        );
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(Record::new("UI", "0x10", "Foo", 2, "c")).unwrap();
        assert_eq!(json["Category"], "UI");
        assert_eq!(json["Address"], "0x10");
        assert_eq!(json["Status"], 2);

        let back: Record = serde_json::from_str(r#"{ "Name": "Bar", "Address": "0x4" }"#).unwrap();
        assert_eq!(back, Record::new("", "0x4", "Bar", 0, ""));
    }
}
