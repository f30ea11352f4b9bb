//! Memory-mapped access to `.jar`/`.zip` source archives.

use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

pub struct SourceArchive {
    path: PathBuf,
    mmap: Mmap,
}

impl SourceArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open archive: {}", path.display()))?;
        // SAFETY: read-only mapping; archives are not rewritten while indexed.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to mmap archive: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            mmap,
        })
    }

    fn zip(&self) -> Result<ZipArchive<Cursor<&[u8]>>> {
        ZipArchive::new(Cursor::new(&self.mmap[..]))
            .with_context(|| format!("Failed to read zip structure: {}", self.path.display()))
    }

    /// Names of all `.java` entries, in archive order.
    pub fn java_entries(&self) -> Result<Vec<String>> {
        let mut zip = self.zip()?;
        let mut names = Vec::new();
        for i in 0..zip.len() {
            let entry = zip.by_index(i)?;
            if !entry.is_dir() && entry.name().ends_with(".java") {
                names.push(entry.name().to_string());
            }
        }
        Ok(names)
    }

    pub fn read_entry(&self, entry_name: &str) -> Result<String> {
        let mut zip = self.zip()?;
        let mut entry = zip.by_name(entry_name).with_context(|| {
            format!("Entry {entry_name} not found in {}", self.path.display())
        })?;
        let mut source = String::new();
        entry
            .read_to_string(&mut source)
            .with_context(|| format!("Entry {entry_name} is not valid UTF-8"))?;
        Ok(source)
    }
}

pub fn read_source_entry(archive_path: &Path, entry_name: &str) -> Result<String> {
    SourceArchive::open(archive_path)?.read_entry(entry_name)
}
