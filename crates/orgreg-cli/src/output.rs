//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use orgreg_core::{AuditEntry, DuplicateGroup, Record};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a single record in full
    pub fn print_record(&self, record: &Record) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", record.id);
                println!("Type:     {}", record.kind);
                println!("Name:     {}", record.name);
                if !record.director.is_empty() {
                    println!("Director: {}", record.director);
                }
                if !record.phone.is_empty() {
                    println!("Phone:    {}", record.phone);
                }
                if !record.tax_id.is_empty() {
                    println!("Tax ID:   {}", record.tax_id);
                }
                if !record.comment.is_empty() {
                    println!("Comment:  {}", record.comment);
                }
                if let Some(deleted_at) = record.deleted_at {
                    println!("Deleted:  {}", deleted_at.format("%Y-%m-%d %H:%M"));
                }
                println!("Created:  {}", record.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:  {}", record.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(record).unwrap());
            }
            OutputFormat::Quiet => {
                println!("{}", record.id);
            }
        }
    }

    /// Print a list of records, one line each
    pub fn print_records(&self, records: &[Record]) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No records found.");
                    return;
                }
                for record in records {
                    println!(
                        "{} | {} | {} | {}",
                        &record.id.to_string()[..8],
                        truncate(&record.kind, 12),
                        truncate(&record.name, 35),
                        truncate(&record.director, 25)
                    );
                }
                println!("\n{} record(s)", records.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(records).unwrap());
            }
            OutputFormat::Quiet => {
                for record in records {
                    println!("{}", record.id);
                }
            }
        }
    }

    /// Print duplicate groups
    pub fn print_duplicates(&self, groups: &[DuplicateGroup]) {
        match self.format {
            OutputFormat::Human => {
                if groups.is_empty() {
                    println!("No duplicates found.");
                    return;
                }
                for group in groups {
                    println!("Tax ID {} ({} records):", group.tax_id, group.records.len());
                    for record in &group.records {
                        println!(
                            "  {} | {} | {}",
                            &record.id.to_string()[..8],
                            truncate(&record.name, 35),
                            truncate(&record.director, 25)
                        );
                    }
                }
                println!("\n{} duplicate group(s)", groups.len());
            }
            OutputFormat::Json => {
                let json_groups: Vec<_> = groups
                    .iter()
                    .map(|g| {
                        serde_json::json!({
                            "tax_id": g.tax_id,
                            "records": g.records
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json_groups).unwrap());
            }
            OutputFormat::Quiet => {
                for group in groups {
                    println!("{}", group.tax_id);
                }
            }
        }
    }

    /// Print audit entries, newest first
    pub fn print_audit(&self, entries: &[&AuditEntry]) {
        match self.format {
            OutputFormat::Human => {
                if entries.is_empty() {
                    println!("Audit log is empty.");
                    return;
                }
                for entry in entries {
                    println!(
                        "[{}] {} {}: {}",
                        entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
                        entry.actor,
                        entry.action,
                        entry.details
                    );
                }
                println!("\n{} entr(ies)", entries.len());
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(entries).unwrap());
            }
            OutputFormat::Quiet => {
                for entry in entries {
                    println!("{} {}", entry.action, entry.details);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Truncate a string to max length, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
