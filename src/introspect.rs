//! Type facts reported by an introspection provider.
//!
//! The metadata builder never looks at real types itself. It asks a
//! [`TypeIntrospector`] for a [`TypeDescription`]: the declared fields in
//! declaration order, the declared methods and the markers attached to the
//! type and to each field. Providers can be backed by parsed sources
//! ([`crate::source::SourceIntrospector`]) or by fabricated descriptions
//! ([`InMemoryIntrospector`]).

use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{MetadataError, Result};
use crate::model::{Modifiers, split_qualified_name};

const OBJECT_TYPE: &str = "java.lang.Object";

const LIST_TYPES: &[&str] = &[
    "java.util.Collection",
    "java.util.List",
    "java.util.ArrayList",
    "java.util.LinkedList",
    "java.util.Vector",
    "java.util.Stack",
    "java.util.Queue",
    "java.util.Deque",
    "java.util.ArrayDeque",
    "java.util.PriorityQueue",
    "java.util.AbstractList",
    "java.util.AbstractCollection",
    "java.util.concurrent.CopyOnWriteArrayList",
    "java.util.concurrent.ConcurrentLinkedQueue",
    "java.util.concurrent.ConcurrentLinkedDeque",
    "java.util.concurrent.BlockingQueue",
    "java.util.concurrent.LinkedBlockingQueue",
    "java.util.concurrent.ArrayBlockingQueue",
];

const SET_TYPES: &[&str] = &[
    "java.util.Set",
    "java.util.HashSet",
    "java.util.LinkedHashSet",
    "java.util.TreeSet",
    "java.util.SortedSet",
    "java.util.NavigableSet",
    "java.util.EnumSet",
    "java.util.AbstractSet",
    "java.util.concurrent.CopyOnWriteArraySet",
    "java.util.concurrent.ConcurrentSkipListSet",
];

/// Collection family of a named type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Set,
}

/// Collection family of well-known `java.util` types.
pub fn known_collection_kind(type_name: &str) -> Option<CollectionKind> {
    if LIST_TYPES.contains(&type_name) {
        Some(CollectionKind::List)
    } else if SET_TYPES.contains(&type_name) {
        Some(CollectionKind::Set)
    } else {
        None
    }
}

/// Static type of a field, parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Named { name: String, arguments: Vec<TypeRef> },
    Array(Box<TypeRef>),
    /// A type parameter such as `T`.
    Variable(String),
    /// `?`, `? extends X` or `? super X`; only upper bounds are kept.
    Wildcard(Option<Box<TypeRef>>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<String>, arguments: Vec<TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            arguments,
        }
    }

    pub fn array_of(component: TypeRef) -> Self {
        Self::Array(Box::new(component))
    }

    /// Erased type name, e.g. `java.util.List` for `List<String>`.
    pub fn erasure(&self) -> String {
        match self {
            Self::Named { name, .. } => name.clone(),
            Self::Array(component) => format!("{}[]", component.erasure()),
            Self::Variable(_) | Self::Wildcard(None) => OBJECT_TYPE.to_string(),
            Self::Wildcard(Some(bound)) => bound.erasure(),
        }
    }

    pub fn arguments(&self) -> &[TypeRef] {
        match self {
            Self::Named { arguments, .. } => arguments,
            _ => &[],
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, arguments } if arguments.is_empty() => f.write_str(name),
            Self::Named { name, arguments } => {
                write!(f, "{name}<")?;
                for (idx, arg) in arguments.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Variable(name) => f.write_str(name),
            Self::Wildcard(None) => f.write_str("?"),
            Self::Wildcard(Some(bound)) => write!(f, "? extends {bound}"),
        }
    }
}

/// A marker attached to a type or field.
///
/// The payload is opaque to the pipeline; only the listener registered for
/// `type_name` knows how to read it.
#[derive(Clone)]
pub struct MarkerInstance {
    type_name: String,
    payload: Arc<dyn Any + Send + Sync>,
}

impl MarkerInstance {
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<String>, payload: T) -> Self {
        Self {
            type_name: type_name.into(),
            payload: Arc::new(payload),
        }
    }

    /// A marker that carries nothing beyond its type.
    pub fn bare(type_name: impl Into<String>) -> Self {
        Self::new(type_name, ())
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for MarkerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkerInstance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescription {
    pub name: String,
    pub ty: TypeRef,
    pub modifiers: Modifiers,
    pub markers: Vec<MarkerInstance>,
}

impl FieldDescription {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::PRIVATE,
            markers: Vec::new(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    pub fn with_marker(mut self, marker: MarkerInstance) -> Self {
        self.markers.push(marker);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MethodDescription {
    pub name: String,
    /// `None` for `void`.
    pub return_type: Option<TypeRef>,
    pub parameters: Vec<TypeRef>,
    pub modifiers: Modifiers,
}

impl MethodDescription {
    pub fn new(name: impl Into<String>, return_type: Option<TypeRef>, parameters: Vec<TypeRef>) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameters,
            modifiers: Modifiers::PUBLIC,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Everything a provider knows about one declared type.
#[derive(Debug, Clone)]
pub struct TypeDescription {
    pub qualified_name: String,
    pub package: Option<String>,
    pub simple_name: String,
    /// Declaration order.
    pub fields: Vec<FieldDescription>,
    pub methods: Vec<MethodDescription>,
    pub markers: Vec<MarkerInstance>,
    /// Declared superclass first, then implemented or extended interfaces.
    pub supertypes: Vec<TypeRef>,
}

impl TypeDescription {
    /// Package and simple name are split at the last `.` of `qualified_name`.
    pub fn new(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let (package, simple_name) = split_qualified_name(&qualified_name);
        Self {
            qualified_name,
            package,
            simple_name,
            fields: Vec::new(),
            methods: Vec::new(),
            markers: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDescription) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_method(mut self, method: MethodDescription) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_marker(mut self, marker: MarkerInstance) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn with_supertype(mut self, supertype: TypeRef) -> Self {
        self.supertypes.push(supertype);
        self
    }
}

/// Source of type facts consumed by [`crate::builder::MetadataBuilder`].
pub trait TypeIntrospector: Send + Sync {
    /// Describe `type_name`, failing with [`MetadataError::TypeNotFound`]
    /// when the type cannot be located.
    fn describe(&self, type_name: &str) -> Result<TypeDescription>;

    fn collection_kind(&self, type_name: &str) -> Option<CollectionKind> {
        known_collection_kind(type_name)
    }
}

/// Provider over fabricated type descriptions.
#[derive(Debug, Default)]
pub struct InMemoryIntrospector {
    types: RwLock<HashMap<String, TypeDescription>>,
    collections: RwLock<HashMap<String, CollectionKind>>,
}

impl InMemoryIntrospector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, description: TypeDescription) {
        self.types
            .write()
            .insert(description.qualified_name.clone(), description);
    }

    pub fn with_type(self, description: TypeDescription) -> Self {
        self.insert(description);
        self
    }

    /// Teach the provider about a collection type outside the built-in table.
    pub fn declare_collection(&self, type_name: impl Into<String>, kind: CollectionKind) {
        self.collections.write().insert(type_name.into(), kind);
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }
}

impl TypeIntrospector for InMemoryIntrospector {
    fn describe(&self, type_name: &str) -> Result<TypeDescription> {
        self.types
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| MetadataError::TypeNotFound(type_name.to_string()))
    }

    fn collection_kind(&self, type_name: &str) -> Option<CollectionKind> {
        self.collections
            .read()
            .get(type_name)
            .copied()
            .or_else(|| known_collection_kind(type_name))
    }
}
