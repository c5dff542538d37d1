//! Data models for orgreg
//!
//! Defines the core data structures: Record and AuditEntry.
//! Every record carries a stable `Uuid` assigned at creation; all store
//! operations key by it, never by field equality.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Validation failures rejected before anything is persisted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Name is required and must be non-empty
    #[error("Record name must not be empty")]
    EmptyName,

    /// Tax id must be empty or consist of digits only
    #[error("Tax id '{0}' must contain digits only")]
    InvalidTaxId(String),
}

/// One organization entry (neighborhood unit, school, preschool)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Record {
    /// Unique identifier
    pub id: Uuid,
    /// Record type; one of the category registry's values
    pub kind: String,
    /// Organization name (required, non-empty)
    pub name: String,
    /// Director's full name
    #[serde(default)]
    pub director: String,
    /// Contact phone, loosely normalized
    #[serde(default)]
    pub phone: String,
    /// Tax id, digits only when present; the natural dedup key
    #[serde(default)]
    pub tax_id: String,
    /// Free-form comment
    #[serde(default)]
    pub comment: String,
    /// Set if and only if the record resides in the trash store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
    /// When this record was created
    pub created_at: DateTime<Utc>,
    /// When this record was last updated
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// Create a new record with the given kind and name
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            name: name.into(),
            director: String::new(),
            phone: String::new(),
            tax_id: String::new(),
            comment: String::new(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a record with a specific ID (for loading from storage or the mirror)
    pub fn with_id(id: Uuid, kind: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind: kind.into(),
            name: name.into(),
            director: String::new(),
            phone: String::new(),
            tax_id: String::new(),
            comment: String::new(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the director
    pub fn set_director(&mut self, director: impl Into<String>) {
        self.director = director.into();
        self.updated_at = Utc::now();
    }

    /// Set the phone, applying loose normalization
    pub fn set_phone(&mut self, phone: &str) {
        self.phone = normalize_phone(phone);
        self.updated_at = Utc::now();
    }

    /// Set the tax id
    pub fn set_tax_id(&mut self, tax_id: impl Into<String>) {
        self.tax_id = tax_id.into();
        self.updated_at = Utc::now();
    }

    /// Set the comment
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
        self.updated_at = Utc::now();
    }

    /// Check the field-level invariants
    ///
    /// `name` must be non-empty after trimming and `tax_id` must be empty
    /// or digits only. Kind membership is checked against the category
    /// registry by the caller, not here.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if !self.tax_id.is_empty() && !self.tax_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::InvalidTaxId(self.tax_id.clone()));
        }
        Ok(())
    }

    /// True when the tax id participates in duplicate detection
    pub fn has_dedup_key(&self) -> bool {
        !self.tax_id.is_empty() && self.tax_id.chars().all(|c| c.is_ascii_digit())
    }
}

/// Loosely normalize a phone number
///
/// Keeps digits and a single leading `+`; drops spaces, dashes and
/// parentheses. Anything else is left out rather than rejected.
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.chars().enumerate() {
        if c == '+' && i == 0 {
            out.push(c);
        } else if c.is_ascii_digit() {
            out.push(c);
        }
    }
    out
}

/// One entry in the append-only audit trail
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// When the operation happened
    pub timestamp: DateTime<Utc>,
    /// Who performed it (supplied by the caller)
    pub actor: String,
    /// Short operation name, e.g. "add", "restore"
    pub action: String,
    /// Free-form details
    pub details: String,
}

impl AuditEntry {
    /// Create an entry stamped with the current time
    pub fn now(actor: impl Into<String>, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            actor: actor.into(),
            action: action.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_new() {
        let record = Record::new("School", "School 5");
        assert_eq!(record.kind, "School");
        assert_eq!(record.name, "School 5");
        assert!(record.director.is_empty());
        assert!(record.tax_id.is_empty());
        assert!(record.deleted_at.is_none());
    }

    #[test]
    fn test_record_with_id() {
        let id = Uuid::new_v4();
        let record = Record::with_id(id, "School", "School 5");
        assert_eq!(record.id, id);
    }

    #[test]
    fn test_validate_empty_name() {
        let mut record = Record::new("School", "  ");
        assert_eq!(record.validate(), Err(ValidationError::EmptyName));

        record.name = "School 5".to_string();
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_validate_tax_id() {
        let mut record = Record::new("School", "School 5");
        record.set_tax_id("12345");
        assert!(record.validate().is_ok());

        record.set_tax_id("12a45");
        assert!(matches!(
            record.validate(),
            Err(ValidationError::InvalidTaxId(_))
        ));

        // Empty tax id is allowed
        record.set_tax_id("");
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_has_dedup_key() {
        let mut record = Record::new("School", "School 5");
        assert!(!record.has_dedup_key());

        record.set_tax_id("12345");
        assert!(record.has_dedup_key());

        record.set_tax_id("12a45");
        assert!(!record.has_dedup_key());
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone(" +998 (69) 543-21-00 "), "+998695432100");
        assert_eq!(normalize_phone("69 543 21 00"), "695432100");
        assert_eq!(normalize_phone("tel: 543+2100"), "5432100");
        assert_eq!(normalize_phone(""), "");
    }

    #[test]
    fn test_set_phone_normalizes() {
        let mut record = Record::new("School", "School 5");
        record.set_phone("543-21-00");
        assert_eq!(record.phone, "5432100");
    }

    #[test]
    fn test_updated_at_advances() {
        let mut record = Record::new("School", "School 5");
        let original = record.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));
        record.set_director("A. Karimov");
        assert!(record.updated_at > original);
    }

    #[test]
    fn test_record_serialization() {
        let mut record = Record::new("School", "School 5");
        record.set_tax_id("12345");
        let json = serde_json::to_string(&record).unwrap();
        // deleted_at is omitted while active
        assert!(!json.contains("deleted_at"));
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(record, parsed);
    }

    #[test]
    fn test_audit_entry_now() {
        let entry = AuditEntry::now("admin", "add", "School 5");
        assert_eq!(entry.actor, "admin");
        assert_eq!(entry.action, "add");
        assert_eq!(entry.details, "School 5");
    }
}
