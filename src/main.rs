use anyhow::{Context, Result};
use clap::Parser;
use class_meta::cli::{Cli, Commands};
use class_meta::config::{clear_db, resolve_cache_size, resolve_db_path, resolve_source_roots};
use class_meta::introspector::{ClassIntrospector, IntrospectorConfig};
use class_meta::registry::{DeclaredAttributes, MarkerRegistry};
use class_meta::source::SourceIntrospector;
use class_meta::store::MetadataStore;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "CLASS_META_LOG";

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command.clone() {
        Commands::Clear => {
            let db_path = resolve_db_path(&cli)?;
            clear_db(&db_path)?;
        }
        Commands::Stats => {
            let store = MetadataStore::open(resolve_db_path(&cli)?)?;
            let stats = store.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Commands::Describe {
            type_name,
            marker,
            refresh,
        } => {
            let type_name = normalize_class_name(&type_name);
            let (_, introspector) = open_introspector(&cli, &marker)?;
            let store = MetadataStore::open(resolve_db_path(&cli)?)?;
            merge_stored(&store, &introspector)?;

            let metadata = if refresh {
                introspector.refresh(&type_name)?
            } else {
                introspector
                    .get_metadata(&type_name)?
                    .context("Type name must not be blank")?
            };
            persist(&store, &introspector)?;
            println!("{}", serde_json::to_string_pretty(metadata.as_ref())?);
        }
        Commands::Warmup { types, all, marker } => {
            let start = Instant::now();
            let (sources, introspector) = open_introspector(&cli, &marker)?;
            let store = MetadataStore::open(resolve_db_path(&cli)?)?;
            merge_stored(&store, &introspector)?;

            let mut requested: Vec<String> = types.iter().map(|t| normalize_class_name(t)).collect();
            if all {
                requested.extend(sources.type_names().into_iter().map(str::to_string));
            }
            let mut seen = HashSet::new();
            requested.retain(|t| !t.is_empty() && seen.insert(t.clone()));

            let mut failed = Vec::new();
            for type_name in &requested {
                if let Err(err) = introspector.load_metadata([type_name]) {
                    tracing::warn!(type_name = %type_name, error = %err, "warmup skipped type");
                    failed.push(type_name.clone());
                }
            }
            let cached = persist(&store, &introspector)?;

            let output = WarmupResult {
                requested: requested.len(),
                cached,
                failed,
                duration_ms: start.elapsed().as_millis() as u64,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_introspector(
    cli: &Cli,
    markers: &[String],
) -> Result<(Arc<SourceIntrospector>, ClassIntrospector)> {
    let roots = resolve_source_roots(cli)?;
    let sources = Arc::new(SourceIntrospector::open(&roots)?);
    let registry = MarkerRegistry::new();
    let introspector = ClassIntrospector::new(
        sources.clone(),
        registry,
        IntrospectorConfig {
            cache_size: resolve_cache_size(cli)?,
        },
    )?;
    for marker in markers {
        introspector.register_listener(marker, Arc::new(DeclaredAttributes))?;
    }
    Ok((sources, introspector))
}

/// Only rows built with exactly this run's registered markers are reused.
fn merge_stored(store: &MetadataStore, introspector: &ClassIntrospector) -> Result<()> {
    let rows = store.load_matching(&introspector.registry().marker_types())?;
    tracing::debug!(rows = rows.len(), "merging stored metadata");
    introspector.merge_external_metadata(rows);
    Ok(())
}

fn persist(store: &MetadataStore, introspector: &ClassIntrospector) -> Result<usize> {
    let markers = introspector.registry().marker_types();
    let view = introspector.cache_view();
    store.put_all(view.iter().map(|(k, v)| (k, v.as_ref())), &markers)?;
    Ok(view.len())
}

fn normalize_class_name(raw: &str) -> String {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("import") {
        s = rest.trim();
    }
    if s.ends_with(';') {
        s = s.trim_end_matches(';').trim();
    }
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, Serialize)]
struct WarmupResult {
    requested: usize,
    cached: usize,
    failed: Vec<String>,
    duration_ms: u64,
}
