use anyhow::Result;
use std::path::Path;

use crate::parse::qualified_name_for_entry;
use crate::probe::SourceArchive;

/// `(qualified name, entry name)` for every compilation unit in a source archive.
pub fn catalog(archive_path: &Path) -> Result<Vec<(String, String)>> {
    let archive = SourceArchive::open(archive_path)?;
    let types = archive
        .java_entries()?
        .into_iter()
        .filter_map(|entry| qualified_name_for_entry(&entry).map(|name| (name, entry)))
        .collect();
    Ok(types)
}
