//! Record command handlers

use anyhow::{bail, Context, Result};
use clap::Args;
use uuid::Uuid;

use orgreg_core::{conflicting_tax_id, AuditLog, CategoryRegistry, Record, Registry};

use crate::output::Output;
use crate::prompt::{confirm, prompt_with_default};

/// Record field flags shared by `add` and `edit`
#[derive(Args, Debug, Default)]
pub struct RecordFields {
    /// Category (type) of the organization
    #[arg(short, long)]
    pub kind: Option<String>,

    /// Director's full name
    #[arg(short, long)]
    pub director: Option<String>,

    /// Contact phone
    #[arg(short, long)]
    pub phone: Option<String>,

    /// Tax id (digits only)
    #[arg(short, long)]
    pub tax_id: Option<String>,

    /// Free-form comment
    #[arg(short, long)]
    pub comment: Option<String>,
}

/// Add a new record
#[allow(clippy::too_many_arguments)]
pub fn add(
    registry: &mut Registry,
    categories: &CategoryRegistry,
    audit: &mut AuditLog,
    actor: &str,
    name: String,
    fields: RecordFields,
    force: bool,
    output: &Output,
) -> Result<()> {
    let kind = fields.kind.as_deref().unwrap_or("Neighborhood");
    let kind = resolve_kind(categories, kind)?;

    let mut record = Record::new(kind, name);
    if let Some(director) = fields.director {
        record.set_director(director);
    }
    if let Some(phone) = fields.phone {
        record.set_phone(&phone);
    }
    if let Some(tax_id) = fields.tax_id {
        record.set_tax_id(tax_id);
    }
    if let Some(comment) = fields.comment {
        record.set_comment(comment);
    }

    check_duplicate(registry, &record.tax_id, None, force, output)?;

    let summary = format!("{} '{}'", record.kind, record.name);
    let id = registry.add(record).context("Failed to add record")?;
    audit.record(actor, "add", &summary);

    output.success(&format!("Added record: {}", id));
    if let Some(record) = registry.get(id) {
        output.print_record(record);
    }

    Ok(())
}

/// List records, optionally filtered by category or search query
pub fn list(
    registry: &Registry,
    categories: &CategoryRegistry,
    kind: Option<String>,
    search: Option<String>,
    output: &Output,
) -> Result<()> {
    let kind = kind.map(|k| categories.canonical(&k).to_string());
    let query = search.map(|q| q.to_lowercase());

    let records: Vec<Record> = registry
        .records()
        .iter()
        .filter(|r| kind.as_deref().map_or(true, |k| r.kind == k))
        .filter(|r| query.as_deref().map_or(true, |q| matches_query(r, q)))
        .cloned()
        .collect();

    output.print_records(&records);
    Ok(())
}

/// Show a single record
pub fn show(registry: &Registry, id: String, output: &Output) -> Result<()> {
    let uuid = parse_id(&id, registry.records())?;
    let record = registry
        .get(uuid)
        .ok_or_else(|| anyhow::anyhow!("Record not found: {}", id))?;

    output.print_record(record);
    Ok(())
}

/// Edit a record
///
/// With field flags the edit is non-interactive; without any, each field
/// is prompted with its current value as the default.
#[allow(clippy::too_many_arguments)]
pub fn edit(
    registry: &mut Registry,
    categories: &CategoryRegistry,
    audit: &mut AuditLog,
    actor: &str,
    id: String,
    name: Option<String>,
    fields: RecordFields,
    force: bool,
    output: &Output,
) -> Result<()> {
    let uuid = parse_id(&id, registry.records())?;
    let mut record = registry
        .get(uuid)
        .ok_or_else(|| anyhow::anyhow!("Record not found: {}", id))?
        .clone();

    let has_flags = name.is_some()
        || fields.kind.is_some()
        || fields.director.is_some()
        || fields.phone.is_some()
        || fields.tax_id.is_some()
        || fields.comment.is_some();

    if has_flags {
        if let Some(name) = name {
            record.name = name;
        }
        if let Some(kind) = fields.kind {
            record.kind = resolve_kind(categories, &kind)?;
        }
        if let Some(director) = fields.director {
            record.set_director(director);
        }
        if let Some(phone) = fields.phone {
            record.set_phone(&phone);
        }
        if let Some(tax_id) = fields.tax_id {
            record.set_tax_id(tax_id);
        }
        if let Some(comment) = fields.comment {
            record.set_comment(comment);
        }
    } else if output.should_prompt() {
        println!("Editing record: {}", record.id);
        println!("Press Enter to keep current value, or type new value.\n");

        if let Some(new_name) = prompt_with_default("Name", &record.name)? {
            record.name = new_name;
        }
        if let Some(new_kind) = prompt_with_default("Type", &record.kind)? {
            record.kind = resolve_kind(categories, &new_kind)?;
        }
        if let Some(new_director) = prompt_with_default("Director", &record.director)? {
            record.set_director(new_director);
        }
        if let Some(new_phone) = prompt_with_default("Phone", &record.phone)? {
            record.set_phone(&new_phone);
        }
        if let Some(new_tax_id) = prompt_with_default("Tax ID", &record.tax_id)? {
            record.set_tax_id(new_tax_id);
        }
        if let Some(new_comment) = prompt_with_default("Comment", &record.comment)? {
            record.set_comment(new_comment);
        }
    } else {
        bail!("No fields given. Pass field flags or run interactively.");
    }

    check_duplicate(registry, &record.tax_id, Some(uuid), force, output)?;

    let summary = format!("{} '{}'", record.kind, record.name);
    registry
        .update(uuid, record)
        .context("Failed to update record")?;
    audit.record(actor, "edit", &summary);

    output.success("Record updated");
    if let Some(record) = registry.get(uuid) {
        output.print_record(record);
    }

    Ok(())
}

/// Move a record to the trash
pub fn delete(
    registry: &mut Registry,
    audit: &mut AuditLog,
    actor: &str,
    id: String,
    output: &Output,
) -> Result<()> {
    let uuid = parse_id(&id, registry.records())?;
    let record = registry
        .get(uuid)
        .ok_or_else(|| anyhow::anyhow!("Record not found: {}", id))?;

    if output.should_prompt() {
        println!(
            "Move to trash: {} - {}",
            &record.id.to_string()[..8],
            record.name
        );
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let summary = format!("{} '{}'", record.kind, record.name);
    registry
        .move_to_trash(uuid)
        .context("Failed to move record to trash")?;
    audit.record(actor, "delete", &summary);

    output.success(&format!("Moved to trash: {}", uuid));
    Ok(())
}

/// Duplicate gate: an existing holder of the same tax id needs explicit
/// confirmation (or --force) before the write goes through
fn check_duplicate(
    registry: &Registry,
    tax_id: &str,
    exclude: Option<Uuid>,
    force: bool,
    output: &Output,
) -> Result<()> {
    if force {
        return Ok(());
    }
    let Some(existing) = conflicting_tax_id(registry.records(), tax_id, exclude) else {
        return Ok(());
    };

    if output.should_prompt() {
        println!(
            "Tax ID {} already belongs to: {} - {}",
            tax_id,
            &existing.id.to_string()[..8],
            existing.name
        );
        if confirm("Save anyway?")? {
            return Ok(());
        }
        bail!("Cancelled.");
    }

    bail!(
        "Tax ID {} already belongs to record {} ('{}'). Pass --force to save anyway.",
        tax_id,
        existing.id,
        existing.name
    );
}

fn resolve_kind(categories: &CategoryRegistry, kind: &str) -> Result<String> {
    if !categories.is_known(kind) {
        bail!(
            "Unknown category: '{}'. Valid categories: {}",
            kind,
            categories.list().join(", ")
        );
    }
    Ok(categories.canonical(kind).to_string())
}

fn matches_query(record: &Record, query: &str) -> bool {
    record.name.to_lowercase().contains(query)
        || record.director.to_lowercase().contains(query)
        || record.comment.to_lowercase().contains(query)
        || record.tax_id.contains(query)
        || record.phone.contains(query)
}

/// Parse a record ID (supports full UUID or prefix)
pub fn parse_id(id: &str, records: &[Record]) -> Result<Uuid> {
    // Try full UUID first
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    // Try prefix match
    let matches: Vec<_> = records
        .iter()
        .filter(|r| r.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No record found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple records match '{}':", id);
            for record in &matches {
                eprintln!("  {} - {}", record.id, record.name);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id_prefix() {
        let a = Record::new("School", "A");
        let b = Record::new("School", "B");
        let records = vec![a.clone(), b];

        let full = a.id.to_string();
        assert_eq!(parse_id(&full, &records).unwrap(), a.id);
        assert_eq!(parse_id(&full[..8], &records).unwrap(), a.id);
        assert!(parse_id("zzzzzzzz", &records).is_err());
    }

    #[test]
    fn test_matches_query() {
        let mut record = Record::new("School", "School 5");
        record.set_director("A. Karimov");
        record.set_tax_id("301234567");

        assert!(matches_query(&record, "school"));
        assert!(matches_query(&record, "karimov"));
        assert!(matches_query(&record, "3012"));
        assert!(!matches_query(&record, "clinic"));
    }
}
