//! Duplicate report handler

use anyhow::Result;

use orgreg_core::{find_duplicates, Registry};

use crate::output::Output;

/// Report groups of records sharing a tax id
pub fn report(registry: &Registry, output: &Output) -> Result<()> {
    let groups = find_duplicates(registry.records());
    output.print_duplicates(&groups);
    Ok(())
}
