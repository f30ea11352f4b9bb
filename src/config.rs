use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use crate::cache::DEFAULT_CACHE_SIZE;
use crate::cli::Cli;

pub const CACHE_SIZE_ENV: &str = "CLASS_META_CACHE_SIZE";

pub fn resolve_db_path(cli: &Cli) -> Result<PathBuf> {
    if let Some(p) = cli.db.clone() {
        return Ok(p);
    }

    Ok(class_meta_home()?.join("metadata.lmdb"))
}

pub fn resolve_cache_size(cli: &Cli) -> Result<usize> {
    if let Some(size) = cli.cache_size {
        return Ok(size);
    }

    match env::var(CACHE_SIZE_ENV) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<usize>()
            .with_context(|| format!("{CACHE_SIZE_ENV} is not a valid cache size: {raw}")),
        _ => Ok(DEFAULT_CACHE_SIZE),
    }
}

pub fn resolve_source_roots(cli: &Cli) -> Result<Vec<PathBuf>> {
    if !cli.source.is_empty() {
        return Ok(cli.source.clone());
    }

    env::current_dir()
        .map(|dir| vec![dir])
        .context("Failed to resolve current directory")
}

pub fn clear_db(db_path: &Path) -> Result<()> {
    remove_file_if_exists(db_path, "db")?;
    remove_file_if_exists(&lmdb_lock_path(db_path), "db lock")?;
    Ok(())
}

fn class_meta_home() -> Result<PathBuf> {
    let base = dirs::data_local_dir()
        .or_else(dirs::cache_dir)
        .or_else(dirs::home_dir)
        .ok_or_else(|| anyhow::anyhow!("Failed to resolve data directory"))?;
    Ok(base.join("class-meta"))
}

fn lmdb_lock_path(db_path: &Path) -> PathBuf {
    let mut os = db_path.as_os_str().to_os_string();
    os.push("-lock");
    PathBuf::from(os)
}

fn remove_file_if_exists(path: &Path, kind: &str) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove {kind} file: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("class-meta").chain(args.iter().copied()))
    }

    #[test]
    fn explicit_flags_win() {
        let cli = cli(&[
            "--db",
            "/tmp/meta.lmdb",
            "--cache-size",
            "7",
            "--source",
            "/src/a",
            "--source",
            "/src/b",
            "stats",
        ]);
        assert_eq!(resolve_db_path(&cli).unwrap(), PathBuf::from("/tmp/meta.lmdb"));
        assert_eq!(resolve_cache_size(&cli).unwrap(), 7);
        assert_eq!(
            resolve_source_roots(&cli).unwrap(),
            vec![PathBuf::from("/src/a"), PathBuf::from("/src/b")]
        );
    }

    #[test]
    fn default_db_lives_under_class_meta_home() {
        let path = resolve_db_path(&cli(&["stats"])).unwrap();
        assert!(path.ends_with("class-meta/metadata.lmdb"));
    }

    #[test]
    fn clear_db_removes_db_and_lock() {
        let dir = std::env::temp_dir().join(format!("class_meta_config_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let db = dir.join("metadata.lmdb");
        std::fs::write(&db, b"").unwrap();
        std::fs::write(lmdb_lock_path(&db), b"").unwrap();

        clear_db(&db).unwrap();
        assert!(!db.exists());
        assert!(!lmdb_lock_path(&db).exists());
        clear_db(&db).unwrap();

        let _ = std::fs::remove_dir_all(dir);
    }
}
