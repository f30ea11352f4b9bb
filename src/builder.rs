//! Builds [`ClassMetadata`] from provider facts.
//!
//! The builder never caches. Accessor resolution and marker extraction are
//! best-effort: their failures leave the affected parts absent instead of
//! failing the build. Only an unresolvable type fails.

use std::collections::HashMap;
use std::sync::Arc;

use crate::beans::{Accessors, PropertyResolver};
use crate::error::Result;
use crate::introspect::{CollectionKind, FieldDescription, MarkerInstance, TypeIntrospector, TypeRef};
use crate::model::{ClassMetadata, ContainerShape, FieldMetadata, MarkerMetadata, MarkerParent};
use crate::registry::MarkerRegistry;

#[derive(Clone)]
pub struct MetadataBuilder {
    introspector: Arc<dyn TypeIntrospector>,
    resolver: Arc<dyn PropertyResolver>,
    registry: MarkerRegistry,
}

impl MetadataBuilder {
    pub fn new(
        introspector: Arc<dyn TypeIntrospector>,
        resolver: Arc<dyn PropertyResolver>,
        registry: MarkerRegistry,
    ) -> Self {
        Self {
            introspector,
            resolver,
            registry,
        }
    }

    pub fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    pub fn build(&self, type_name: &str) -> Result<ClassMetadata> {
        let description = self.introspector.describe(type_name)?;

        let accessors = self.resolver.resolve(&description).unwrap_or_else(|err| {
            tracing::debug!(type_name, error = %err, "accessor resolution failed");
            HashMap::new()
        });

        let mut class = ClassMetadata::with_names(
            description.qualified_name.clone(),
            description.package.clone(),
            description.simple_name.clone(),
        );

        let scan_markers = self.registry.is_aware();
        for field in &description.fields {
            let mut metadata = self.field(&class, field, accessors.get(&field.name));
            if scan_markers {
                let parent = metadata.marker_parent();
                for marker in self.interpret(&field.markers, &parent) {
                    metadata.push_marker(marker);
                }
            }
            if !class.add_field(metadata) {
                tracing::debug!(type_name, field = %field.name, "duplicate field name ignored");
            }
        }

        if scan_markers {
            let parent = class.marker_parent();
            for marker in self.interpret(&description.markers, &parent) {
                class.push_marker(marker);
            }
        }

        tracing::debug!(
            type_name,
            fields = class.fields().len(),
            markers = class.markers().len(),
            "built class metadata"
        );
        Ok(class)
    }

    fn field(
        &self,
        class: &ClassMetadata,
        field: &FieldDescription,
        accessors: Option<&Accessors>,
    ) -> FieldMetadata {
        let (shape, element_type) = self.classify(&field.ty);
        let (getter, setter) = accessors
            .map(|a| (a.getter.clone(), a.setter.clone()))
            .unwrap_or_default();
        FieldMetadata::new(class.qualified_name(), &field.name, field.ty.erasure())
            .with_modifiers(field.modifiers)
            .with_shape(shape, element_type)
            .with_accessors(getter, setter)
    }

    /// Array first, then list, then set.
    pub fn classify(&self, ty: &TypeRef) -> (ContainerShape, Option<String>) {
        let shape = match ty {
            TypeRef::Array(_) => ContainerShape::Array,
            TypeRef::Named { name, .. } => match self.introspector.collection_kind(name) {
                Some(CollectionKind::List) => ContainerShape::List,
                Some(CollectionKind::Set) => ContainerShape::Set,
                None => ContainerShape::Scalar,
            },
            TypeRef::Variable(_) | TypeRef::Wildcard(_) => ContainerShape::Scalar,
        };
        if shape == ContainerShape::Scalar {
            return (shape, None);
        }
        (shape, element_type(ty))
    }

    fn interpret(&self, markers: &[MarkerInstance], parent: &MarkerParent) -> Vec<MarkerMetadata> {
        let mut interpreted = Vec::new();
        for marker in markers {
            let attributes = match self.registry.attributes_of(marker) {
                Ok(Some(attributes)) => attributes,
                Ok(None) => continue,
                Err(err) => {
                    tracing::debug!(marker = marker.type_name(), error = %err, "marker listener failed");
                    continue;
                }
            };
            let mut metadata = MarkerMetadata::new(parent.clone(), marker.type_name());
            metadata.set_attributes(Some(attributes));
            interpreted.push(metadata);
        }
        interpreted
    }
}

/// Arrays always know their component; collections only a concrete first argument.
fn element_type(ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Array(component) => Some(component.erasure()),
        TypeRef::Named { arguments, .. } => match arguments.first()? {
            TypeRef::Variable(_) | TypeRef::Wildcard(None) => None,
            other => Some(other.erasure()),
        },
        _ => None,
    }
}
