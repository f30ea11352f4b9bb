//! Type introspection backed by Java source trees and source archives.
//!
//! Opening a [`SourceIntrospector`] indexes every root once: `.java` files are
//! keyed by their package plus file name, archive entries by their path.
//! Compilation units are parsed on demand when a type is described; the
//! metadata cache above this provider keeps repeated lookups cheap.
//!
//! Only the type a file is named after (and its nested types) can be located.
//! Secondary top-level types sharing a file with another public type are not
//! indexed.

use anyhow::{Context, Result as AnyResult};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};

use crate::catalog::catalog;
use crate::error::{MetadataError, Result};
use crate::introspect::{
    CollectionKind, TypeDescription, TypeIntrospector, TypeRef, known_collection_kind,
};
use crate::parse::qualified_name_for_file;
use crate::probe::read_source_entry;
use crate::scan::scan_sources;
use crate::structure::parse_compilation_unit;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Archive { archive: PathBuf, entry: String },
}

#[derive(Debug, Default)]
pub struct SourceIntrospector {
    roots: Vec<PathBuf>,
    index: HashMap<String, SourceLocation>,
}

impl SourceIntrospector {
    /// Indexes `roots` in order; the first root declaring a type wins.
    pub fn open<P: AsRef<Path>>(roots: &[P]) -> AnyResult<Self> {
        let mut introspector = Self::default();
        for root in roots {
            introspector.index_root(root.as_ref())?;
        }
        tracing::debug!(
            roots = introspector.roots.len(),
            types = introspector.index.len(),
            "indexed source roots"
        );
        Ok(introspector)
    }

    fn index_root(&mut self, root: &Path) -> AnyResult<()> {
        let files = scan_sources(root)
            .with_context(|| format!("Failed to scan source root: {}", root.display()))?;

        let from_files: Vec<(String, SourceLocation)> = files
            .java_files
            .par_iter()
            .filter_map(|path| match std::fs::read_to_string(path) {
                Ok(content) => qualified_name_for_file(path, &content)
                    .map(|name| (name, SourceLocation::File(path.clone()))),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable source file");
                    None
                }
            })
            .collect();

        let from_archives: Vec<(String, SourceLocation)> = files
            .archives
            .par_iter()
            .flat_map_iter(|archive| {
                let entries = catalog(archive).unwrap_or_else(|err| {
                    tracing::warn!(archive = %archive.display(), error = %err, "skipping unreadable archive");
                    Vec::new()
                });
                entries.into_iter().map(move |(name, entry)| {
                    let location = SourceLocation::Archive {
                        archive: archive.clone(),
                        entry,
                    };
                    (name, location)
                })
            })
            .collect();

        for (name, location) in from_files.into_iter().chain(from_archives) {
            self.index.entry(name).or_insert(location);
        }
        self.roots.push(root.to_path_buf());
        Ok(())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Indexed top-level type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Location of the compilation unit declaring `type_name`.
    ///
    /// Nested types (`a.Outer.Inner`) resolve to the unit of their outermost
    /// indexed enclosing type.
    pub fn locate(&self, type_name: &str) -> Option<&SourceLocation> {
        let mut candidate = type_name;
        loop {
            if let Some(location) = self.index.get(candidate) {
                return Some(location);
            }
            let (outer, _) = candidate.rsplit_once('.')?;
            candidate = outer;
        }
    }
}

impl TypeIntrospector for SourceIntrospector {
    fn describe(&self, type_name: &str) -> Result<TypeDescription> {
        let location = self
            .locate(type_name)
            .ok_or_else(|| MetadataError::TypeNotFound(type_name.to_string()))?;
        let source = match location {
            SourceLocation::File(path) => std::fs::read_to_string(path)?,
            SourceLocation::Archive { archive, entry } => read_source_entry(archive, entry)
                .map_err(|err| MetadataError::introspection(type_name, format!("{err:#}")))?,
        };
        let types = parse_compilation_unit(&source)
            .ok_or_else(|| MetadataError::introspection(type_name, "source could not be parsed"))?;
        types
            .into_iter()
            .find(|t| t.qualified_name == type_name)
            .ok_or_else(|| MetadataError::TypeNotFound(type_name.to_string()))
    }

    /// Falls back to the indexed supertypes of `type_name`. A set anywhere
    /// in the hierarchy wins over a list.
    fn collection_kind(&self, type_name: &str) -> Option<CollectionKind> {
        if let Some(kind) = known_collection_kind(type_name) {
            return Some(kind);
        }
        let mut pending = VecDeque::from([type_name.to_string()]);
        let mut seen = HashSet::new();
        let mut found = None;
        while let Some(name) = pending.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            match known_collection_kind(&name) {
                Some(CollectionKind::Set) => return Some(CollectionKind::Set),
                Some(CollectionKind::List) => {
                    found = Some(CollectionKind::List);
                    continue;
                }
                None => {}
            }
            if self.locate(&name).is_none() {
                continue;
            }
            match self.describe(&name) {
                Ok(description) => {
                    pending.extend(description.supertypes.iter().map(TypeRef::erasure))
                }
                Err(err) => {
                    tracing::debug!(type_name = %name, error = %err, "supertype not described")
                }
            }
        }
        found
    }
}
