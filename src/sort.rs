// 🔢 Sorter - canonical record order
// Ascending address, then ascending category. Stable, so equal keys keep
// their relative order and sorting twice changes nothing.

use crate::address::address_value;
use crate::record::Record;
use std::cmp::Ordering;

/// Numeric sort key of a record's address (headers and malformed addresses sort as zero)
pub fn address_key(record: &Record) -> u32 {
    address_value(&record.address).unwrap_or(0)
}

pub fn compare(a: &Record, b: &Record) -> Ordering {
    address_key(a)
        .cmp(&address_key(b))
        .then_with(|| a.category.cmp(&b.category))
}

/// Sort records in place into canonical order
pub fn sort_records(records: &mut [Record]) {
    records.sort_by(compare);
}

pub fn is_sorted(records: &[Record]) -> bool {
    records.windows(2).all(|w| compare(&w[0], &w[1]) != Ordering::Greater)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(category: &str, address: &str, name: &str) -> Record {
        Record::new(category, address, name, 0, "")
    }

    #[test]
    fn test_numeric_not_lexicographic() {
        let mut records = vec![entry("A", "0x100", "c"), entry("A", "0x20", "b"), entry("A", "0x3", "a")];
        sort_records(&mut records);

        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_category_breaks_ties() {
        let mut records = vec![entry("UI", "0x10", "b"), entry("Net", "0x10", "a")];
        sort_records(&mut records);
        assert_eq!(records[0].category, "Net");
    }

    #[test]
    fn test_headers_sort_at_zero() {
        let mut records = vec![
            entry("UI", "0x10", "Foo"),
            Record::header("UI", "user interface"),
            Record::header("Net", "networking"),
        ];
        sort_records(&mut records);

        assert_eq!(records[0], Record::header("Net", "networking"));
        assert_eq!(records[1], Record::header("UI", "user interface"));
        assert_eq!(records[2].name, "Foo");
    }

    #[test]
    fn test_stable_and_idempotent() {
        // Same key, different names: input order must survive
        let mut records = vec![
            entry("UI", "0x10", "second"),
            entry("UI", "0x8", "first"),
            entry("UI", "0x10", "third"),
        ];
        sort_records(&mut records);
        let once = records.clone();
        sort_records(&mut records);

        assert_eq!(records, once);
        assert_eq!(records[1].name, "second");
        assert_eq!(records[2].name, "third");
        assert!(is_sorted(&records));
    }
}
