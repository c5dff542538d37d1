//! Duplicate detection
//!
//! Read-only scan over the active collection keyed by tax id. Only
//! non-empty, all-digit tax ids participate; anything else is excluded
//! from grouping entirely rather than normalized. Duplicates are
//! detected, never rejected; the caller decides what to do with them.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::models::Record;

/// Records sharing one tax id
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    /// The shared tax id
    pub tax_id: String,
    /// The records carrying it, in input order
    pub records: Vec<Record>,
}

/// Group records by tax id and return the groups with more than one member
///
/// Deterministic: groups come back sorted by tax id, members in input
/// order. Does not mutate anything.
pub fn find_duplicates(records: &[Record]) -> Vec<DuplicateGroup> {
    let mut by_tax_id: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();

    for record in records {
        if record.has_dedup_key() {
            by_tax_id.entry(&record.tax_id).or_default().push(record);
        }
    }

    by_tax_id
        .into_iter()
        .filter(|(_, group)| group.len() > 1)
        .map(|(tax_id, group)| DuplicateGroup {
            tax_id: tax_id.to_string(),
            records: group.into_iter().cloned().collect(),
        })
        .collect()
}

/// Find an existing record with the given tax id, excluding one id
///
/// Backs the advisory gate at record creation/edit time: before inserting
/// a record with a non-empty tax id, the caller checks for a holder of
/// the same id (excluding the record being edited) and asks for explicit
/// confirmation if one exists.
pub fn conflicting_tax_id<'a>(
    records: &'a [Record],
    tax_id: &str,
    exclude: Option<Uuid>,
) -> Option<&'a Record> {
    if tax_id.is_empty() || !tax_id.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    records
        .iter()
        .find(|r| r.tax_id == tax_id && Some(r.id) != exclude)
}
