use anyhow::Result;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Files found under a source root.
#[derive(Debug, Default)]
pub struct SourceFiles {
    pub java_files: Vec<PathBuf>,
    /// `.jar` or `.zip` archives, usually `*-sources.jar`.
    pub archives: Vec<PathBuf>,
}

enum Found {
    Java(PathBuf),
    Archive(PathBuf),
}

pub fn scan_sources(base_path: &Path) -> Result<SourceFiles> {
    if !base_path.exists() {
        anyhow::bail!("Source root does not exist: {}", base_path.display());
    }
    if base_path.is_file() {
        let mut files = SourceFiles::default();
        match classify(base_path) {
            Some(Found::Java(p)) => files.java_files.push(p),
            Some(Found::Archive(p)) => files.archives.push(p),
            None => {}
        }
        return Ok(files);
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry
                && let Some(found) = classify(entry.path())
            {
                let _ = tx.send(found);
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files = SourceFiles::default();
    for found in rx.iter() {
        match found {
            Found::Java(p) => files.java_files.push(p),
            Found::Archive(p) => files.archives.push(p),
        }
    }
    files.java_files.sort();
    files.archives.sort();
    Ok(files)
}

fn classify(path: &Path) -> Option<Found> {
    let ext = path.extension()?.to_str()?;
    match ext {
        "java" => Some(Found::Java(path.to_path_buf())),
        "jar" | "zip" => Some(Found::Archive(path.to_path_buf())),
        _ => None,
    }
}
