//! Marker interpretation registry.
//!
//! Markers expose no uniform way to read their attributes, so each marker
//! type that should show up in metadata gets a [`MarkerListener`]. A marker is
//! interpretable only when its exact type name is registered; supertypes and
//! interfaces are never consulted.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{MetadataError, Result};
use crate::introspect::MarkerInstance;
use crate::model::Attributes;
use crate::structure::DeclaredArguments;

/// Extracts the attributes of one marker type.
pub trait MarkerListener: Send + Sync {
    fn attributes(&self, marker: &MarkerInstance) -> Result<Attributes>;
}

impl<F> MarkerListener for F
where
    F: Fn(&MarkerInstance) -> Result<Attributes> + Send + Sync,
{
    fn attributes(&self, marker: &MarkerInstance) -> Result<Attributes> {
        self(marker)
    }
}

/// Reads the arguments captured from annotation source text.
///
/// Markers without a [`DeclaredArguments`] payload yield no attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredAttributes;

impl MarkerListener for DeclaredAttributes {
    fn attributes(&self, marker: &MarkerInstance) -> Result<Attributes> {
        Ok(marker
            .payload::<DeclaredArguments>()
            .map(|args| args.values().clone())
            .unwrap_or_default())
    }
}

/// Shared marker type → listener table. Clones share the same table.
#[derive(Clone, Default)]
pub struct MarkerRegistry {
    listeners: Arc<RwLock<HashMap<String, Arc<dyn MarkerListener>>>>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `marker_type`, replacing any previous one.
    pub fn register(&self, marker_type: &str, listener: Arc<dyn MarkerListener>) -> Result<()> {
        let marker_type = marker_type.trim();
        if marker_type.is_empty() {
            return Err(MetadataError::invalid("marker type must be specified"));
        }
        let replaced = self
            .listeners
            .write()
            .insert(marker_type.to_string(), listener)
            .is_some();
        tracing::debug!(marker_type, replaced, "registered marker listener");
        Ok(())
    }

    /// True once any listener is registered.
    pub fn is_aware(&self) -> bool {
        !self.listeners.read().is_empty()
    }

    pub fn is_managed(&self, marker_type: &str) -> bool {
        self.listeners.read().contains_key(marker_type)
    }

    /// Registered marker types, sorted.
    pub fn marker_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.listeners.read().keys().cloned().collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    /// `Ok(None)` when the marker's type has no listener.
    pub fn attributes_of(&self, marker: &MarkerInstance) -> Result<Option<Attributes>> {
        let listener = self.listeners.read().get(marker.type_name()).cloned();
        match listener {
            Some(listener) => listener.attributes(marker).map(Some),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for MarkerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        let mut keys: Vec<_> = listeners.keys().collect();
        keys.sort();
        f.debug_struct("MarkerRegistry")
            .field("marker_types", &keys)
            .finish()
    }
}
