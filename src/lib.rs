//! # class-meta
//!
//! Bounded, cached structural metadata for Java classes: ordered fields,
//! accessor names, container shapes and the annotations a caller registered
//! interest in.
//!
//! ## Architecture
//!
//! - **introspector**: `ClassIntrospector` facade; LRU-cached lookups, bulk loads, merges
//! - **builder**: Builds `ClassMetadata` from a provider's type description
//! - **cache**: Bounded LRU map with eviction reporting
//! - **model**: Class, field and marker metadata records
//! - **registry**: Marker type to listener table
//! - **introspect**: Provider trait, type references, in-memory provider
//! - **beans**: JavaBeans accessor naming rules
//! - **source**: Provider backed by Java source roots and source archives
//! - **structure**: Java declaration extraction using tree-sitter AST parsing
//! - **scan**: Source file and archive discovery
//! - **parse**: Package and qualified name extraction from source text
//! - **catalog**: Source archive indexing
//! - **probe**: Source archive entry reads
//! - **store**: Persistent metadata storage using LMDB (heed)
//! - **config** / **cli**: Command line resolution for the `class-meta` binary

pub mod beans;
pub mod builder;
pub mod cache;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod introspect;
pub mod introspector;
pub mod model;
pub mod parse;
pub mod probe;
pub mod registry;
pub mod scan;
pub mod source;
pub mod store;
pub mod structure;

pub use error::{MetadataError, Result};
pub use introspect::{InMemoryIntrospector, MarkerInstance, TypeDescription, TypeIntrospector, TypeRef};
pub use introspector::{CacheView, ClassIntrospector, IntrospectorConfig, IntrospectorStats};
pub use model::{Attributes, ClassMetadata, ContainerShape, FieldMetadata, MarkerMetadata, Modifiers};
pub use registry::{MarkerListener, MarkerRegistry};
