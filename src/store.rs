//! Persistent store for built class metadata.
//!
//! Uses LMDB (via heed). Each row maps a qualified type name to the JSON form
//! of its [`ClassMetadata`] together with the marker types that were
//! interpreted when it was built, so a later process registering the same
//! markers can merge previously built metadata instead of re-reading sources.

use anyhow::{Context, Result};
use heed::types::Str;
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::ClassMetadata;

pub const METADATA_DB: &str = "class_metadata";

const DEFAULT_MAP_SIZE: usize = 1024 * 1024 * 1024;
const DEFAULT_MAX_DBS: u32 = 4;

type StrDb = Database<Str, Str>;

#[derive(Serialize)]
struct RowRef<'a> {
    markers: &'a [String],
    metadata: &'a ClassMetadata,
}

#[derive(Deserialize)]
struct Row {
    markers: Vec<String>,
    metadata: ClassMetadata,
}

/// Trimmed, sorted and deduplicated; blank names dropped.
fn marker_set(markers: &[String]) -> Vec<String> {
    let mut set: Vec<String> = markers
        .iter()
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect();
    set.sort_unstable();
    set.dedup();
    set
}

#[derive(Debug)]
pub struct MetadataStore {
    env: Env,
    db_path: PathBuf,
    metadata: StrDb,
}

impl MetadataStore {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create store directory: {}", parent.display())
            })?;
        }

        let env = open_env(&db_path)?;
        let mut wtxn = env.write_txn()?;
        let metadata = env.create_database::<Str, Str>(&mut wtxn, Some(METADATA_DB))?;
        wtxn.commit()?;

        Ok(Self {
            env,
            db_path,
            metadata,
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Stored metadata for `type_name` with the marker types it was built
    /// with.
    pub fn get(&self, type_name: &str) -> Result<Option<(Vec<String>, ClassMetadata)>> {
        let rtxn = self.env.read_txn()?;
        match self.metadata.get(&rtxn, type_name)? {
            Some(json) => {
                let row: Row = serde_json::from_str(json).with_context(|| {
                    format!("Stored metadata for {type_name} is not valid JSON")
                })?;
                Ok(Some((row.markers, row.metadata)))
            }
            None => Ok(None),
        }
    }

    /// Stored rows built with exactly the marker types in `markers`.
    ///
    /// Rows built with a different marker set, and rows that no longer
    /// decode, are skipped.
    pub fn load_matching(&self, markers: &[String]) -> Result<Vec<(String, ClassMetadata)>> {
        let wanted = marker_set(markers);
        let rtxn = self.env.read_txn()?;
        let mut rows = Vec::new();
        let mut mismatched = 0usize;
        for item in self.metadata.iter(&rtxn)? {
            let (key, json) = item?;
            match serde_json::from_str::<Row>(json) {
                Ok(row) if row.markers == wanted => rows.push((key.to_string(), row.metadata)),
                Ok(_) => mismatched += 1,
                Err(err) => {
                    tracing::warn!(type_name = key, error = %err, "skipping undecodable stored metadata");
                }
            }
        }
        tracing::debug!(matched = rows.len(), mismatched, "loaded stored metadata");
        Ok(rows)
    }

    /// Writes `entries`, recording `markers` as the marker set they were
    /// built with. Existing rows for the same types are replaced.
    pub fn put_all<'a, I>(&self, entries: I, markers: &[String]) -> Result<usize>
    where
        I: IntoIterator<Item = (&'a str, &'a ClassMetadata)>,
    {
        let markers = marker_set(markers);
        let mut encoded = Vec::new();
        for (key, metadata) in entries {
            let row = RowRef {
                markers: &markers,
                metadata,
            };
            let json = serde_json::to_string(&row)
                .with_context(|| format!("Failed to encode metadata for {key}"))?;
            encoded.push((key, json));
        }
        if encoded.is_empty() {
            return Ok(0);
        }

        let mut wtxn = self.env.write_txn()?;
        for (key, json) in &encoded {
            self.metadata.put(&mut wtxn, *key, json.as_str())?;
        }
        wtxn.commit()?;
        Ok(encoded.len())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let rtxn = self.env.read_txn()?;
        let mut stats = StoreStats {
            db_path: self.db_path.to_string_lossy().to_string(),
            ..StoreStats::default()
        };
        for item in self.metadata.iter(&rtxn)? {
            let (_, json) = item?;
            stats.entries += 1;
            let Ok(Row { metadata, .. }) = serde_json::from_str::<Row>(json) else {
                stats.undecodable += 1;
                continue;
            };
            stats.fields += metadata.fields().len() as u64;
            stats.markers += metadata.markers().len() as u64
                + metadata
                    .fields()
                    .iter()
                    .map(|f| f.markers().len() as u64)
                    .sum::<u64>();
        }
        Ok(stats)
    }
}

fn open_env(db_path: &Path) -> Result<Env> {
    let mut options = EnvOpenOptions::new();
    options.map_size(DEFAULT_MAP_SIZE);
    options.max_dbs(DEFAULT_MAX_DBS);
    // SAFETY: default LMDB locking stays on; NO_SUB_DIR keeps the store a single file at --db.
    unsafe {
        options.flags(EnvFlags::NO_SUB_DIR);
        options
            .open(db_path)
            .with_context(|| format!("Failed to create/open db env: {}", db_path.display()))
    }
}

#[derive(Debug, Default, serde::Serialize)]
pub struct StoreStats {
    pub db_path: String,
    pub entries: u64,
    pub fields: u64,
    pub markers: u64,
    pub undecodable: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContainerShape, FieldMetadata};
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_db(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("class_meta_store_{}_{}", std::process::id(), nanos))
            .join(format!("{name}.lmdb"))
    }

    fn person() -> ClassMetadata {
        let mut class = ClassMetadata::new("org.example.Person");
        class.add_field(FieldMetadata::new("org.example.Person", "name", "java.lang.String"));
        class.add_field(
            FieldMetadata::new("org.example.Person", "tags", "java.util.List")
                .with_shape(ContainerShape::List, Some("java.lang.String".into())),
        );
        class
    }

    fn markers(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn put_all_then_load_matching() -> Result<()> {
        let path = temp_db("roundtrip");
        let store = MetadataStore::open(path.clone())?;
        assert!(store.load_matching(&[])?.is_empty());

        let person = person();
        assert_eq!(store.put_all([("org.example.Person", &person)], &[])?, 1);
        assert_eq!(store.put_all(std::iter::empty(), &[])?, 0);

        let rows = store.load_matching(&[])?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "org.example.Person");
        let loaded = &rows[0].1;
        assert_eq!(loaded, &person);
        assert!(loaded.field("tags").unwrap().is_list());
        assert_eq!(store.get("org.example.Missing")?, None);

        let stats = store.stats()?;
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.fields, 2);
        assert_eq!(stats.undecodable, 0);

        drop(store);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        Ok(())
    }

    #[test]
    fn rows_only_match_the_marker_set_they_were_built_with() -> Result<()> {
        let path = temp_db("marker_sets");
        let store = MetadataStore::open(path.clone())?;
        let person = person();
        let address = ClassMetadata::new("org.example.Address");

        store.put_all(
            [("org.example.Person", &person)],
            &markers(&[
                "javax.persistence.Entity",
                " javax.persistence.Column",
                "javax.persistence.Entity",
            ]),
        )?;
        store.put_all([("org.example.Address", &address)], &[])?;

        let (recorded, _) = store.get("org.example.Person")?.unwrap();
        assert_eq!(
            recorded,
            markers(&["javax.persistence.Column", "javax.persistence.Entity"])
        );

        let plain = store.load_matching(&[])?;
        assert_eq!(plain.len(), 1);
        assert_eq!(plain[0].0, "org.example.Address");

        let marked = store.load_matching(&markers(&[
            "javax.persistence.Entity",
            "javax.persistence.Column",
        ]))?;
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].0, "org.example.Person");

        assert!(store.load_matching(&markers(&["javax.persistence.Entity"]))?.is_empty());

        store.put_all([("org.example.Person", &person)], &[])?;
        assert_eq!(store.load_matching(&[])?.len(), 2);
        assert_eq!(store.stats()?.entries, 2);

        drop(store);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        Ok(())
    }
}
