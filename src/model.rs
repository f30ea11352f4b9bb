//! Class, field and marker metadata.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::error::{MetadataError, Result};

/// Attribute name to value, as returned by a marker listener.
pub type Attributes = BTreeMap<String, Value>;

/// Splits `a.b.C` into (`Some("a.b")`, `"C"`).
pub fn split_qualified_name(qualified_name: &str) -> (Option<String>, String) {
    match qualified_name.rsplit_once('.') {
        Some((package, name)) if !package.is_empty() => {
            (Some(package.to_string()), name.to_string())
        }
        _ => (None, qualified_name.to_string()),
    }
}

/// Field and method modifier bits, using the JVM access flag values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(0x0001);
    pub const PRIVATE: Modifiers = Modifiers(0x0002);
    pub const PROTECTED: Modifiers = Modifiers(0x0004);
    pub const STATIC: Modifiers = Modifiers(0x0008);
    pub const FINAL: Modifiers = Modifiers(0x0010);
    pub const SYNCHRONIZED: Modifiers = Modifiers(0x0020);
    pub const VOLATILE: Modifiers = Modifiers(0x0040);
    pub const TRANSIENT: Modifiers = Modifiers(0x0080);
    pub const NATIVE: Modifiers = Modifiers(0x0100);
    pub const ABSTRACT: Modifiers = Modifiers(0x0400);
    pub const STRICT: Modifiers = Modifiers(0x0800);
    pub const ENUM: Modifiers = Modifiers(0x4000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Modifiers) -> Self {
        Self(self.0 | other.0)
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let m = match keyword {
            "public" => Self::PUBLIC,
            "private" => Self::PRIVATE,
            "protected" => Self::PROTECTED,
            "static" => Self::STATIC,
            "final" => Self::FINAL,
            "synchronized" => Self::SYNCHRONIZED,
            "volatile" => Self::VOLATILE,
            "transient" => Self::TRANSIENT,
            "native" => Self::NATIVE,
            "abstract" => Self::ABSTRACT,
            "strictfp" => Self::STRICT,
            _ => return None,
        };
        Some(m)
    }

    pub fn is_static(self) -> bool {
        self.contains(Self::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(Self::FINAL)
    }
}

impl std::ops::BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// Container shape of a field's static type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerShape {
    #[default]
    Scalar,
    Array,
    List,
    Set,
}

/// The entity a marker is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerParent {
    Class { qualified_name: String },
    Field { owner: String, field: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerMetadata {
    qualified_name: String,
    package_name: Option<String>,
    name: String,
    parent: MarkerParent,
    attributes: Attributes,
}

impl MarkerMetadata {
    pub fn new(parent: MarkerParent, qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let (package_name, name) = split_qualified_name(&qualified_name);
        Self {
            qualified_name,
            package_name,
            name,
            parent,
            attributes: Attributes::new(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> &MarkerParent {
        &self.parent
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Result<Option<&Value>> {
        if name.trim().is_empty() {
            return Err(MetadataError::invalid("unspecified attribute name"));
        }
        Ok(self.attributes.get(name))
    }

    pub fn add_attribute(&mut self, name: &str, value: Value) -> Result<()> {
        if name.trim().is_empty() {
            return Err(MetadataError::invalid("unspecified attribute name"));
        }
        self.attributes.insert(name.to_string(), value);
        Ok(())
    }

    /// Replaces all attributes; `None` clears them.
    pub fn set_attributes(&mut self, attributes: Option<Attributes>) {
        self.attributes = attributes.unwrap_or_default();
    }
}

impl PartialEq for MarkerMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.qualified_name == other.qualified_name
    }
}

impl Eq for MarkerMetadata {}

impl Hash for MarkerMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parent.hash(state);
        self.qualified_name.hash(state);
    }
}

fn find_marker<'a>(markers: &'a [MarkerMetadata], qualified_name: &str) -> Option<&'a MarkerMetadata> {
    markers.iter().find(|m| m.qualified_name == qualified_name)
}

fn push_marker(markers: &mut Vec<MarkerMetadata>, marker: MarkerMetadata) {
    if !markers.contains(&marker) {
        markers.push(marker);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMetadata {
    owner: String,
    name: String,
    type_name: String,
    element_type: Option<String>,
    getter: Option<String>,
    setter: Option<String>,
    modifiers: Modifiers,
    shape: ContainerShape,
    markers: Vec<MarkerMetadata>,
}

impl FieldMetadata {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            type_name: type_name.into(),
            element_type: None,
            getter: None,
            setter: None,
            modifiers: Modifiers::NONE,
            shape: ContainerShape::Scalar,
            markers: Vec::new(),
        }
    }

    /// Qualified name of the declaring class.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Set only for container fields whose element type is known.
    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    pub fn getter(&self) -> Option<&str> {
        self.getter.as_deref()
    }

    pub fn setter(&self) -> Option<&str> {
        self.setter.as_deref()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn shape(&self) -> ContainerShape {
        self.shape
    }

    pub fn is_array(&self) -> bool {
        self.shape == ContainerShape::Array
    }

    pub fn is_list(&self) -> bool {
        self.shape == ContainerShape::List
    }

    pub fn is_set(&self) -> bool {
        self.shape == ContainerShape::Set
    }

    pub fn is_multiple(&self) -> bool {
        self.shape != ContainerShape::Scalar
    }

    pub fn markers(&self) -> &[MarkerMetadata] {
        &self.markers
    }

    pub fn marker(&self, qualified_name: &str) -> Option<&MarkerMetadata> {
        find_marker(&self.markers, qualified_name)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Element type is ignored for scalar shapes.
    pub fn with_shape(mut self, shape: ContainerShape, element_type: Option<String>) -> Self {
        self.shape = shape;
        self.element_type = match shape {
            ContainerShape::Scalar => None,
            _ => element_type,
        };
        self
    }

    pub fn with_accessors(mut self, getter: Option<String>, setter: Option<String>) -> Self {
        self.getter = getter;
        self.setter = setter;
        self
    }

    pub(crate) fn push_marker(&mut self, marker: MarkerMetadata) {
        push_marker(&mut self.markers, marker);
    }

    pub(crate) fn marker_parent(&self) -> MarkerParent {
        MarkerParent::Field {
            owner: self.owner.clone(),
            field: self.name.clone(),
        }
    }
}

impl PartialEq for FieldMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

impl Eq for FieldMetadata {}

impl Hash for FieldMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.name.hash(state);
    }
}

/// Structural metadata of one type, keyed by its qualified name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassMetadata {
    qualified_name: String,
    package_name: Option<String>,
    name: String,
    fields: Vec<FieldMetadata>,
    markers: Vec<MarkerMetadata>,
}

impl ClassMetadata {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        let qualified_name = qualified_name.into();
        let (package_name, name) = split_qualified_name(&qualified_name);
        Self::with_names(qualified_name, package_name, name)
    }

    pub fn with_names(qualified_name: String, package_name: Option<String>, name: String) -> Self {
        Self {
            qualified_name,
            package_name,
            name,
            fields: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn package_name(&self) -> Option<&str> {
        self.package_name.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[FieldMetadata] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldMetadata> {
        if name.trim().is_empty() {
            return None;
        }
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn markers(&self) -> &[MarkerMetadata] {
        &self.markers
    }

    pub fn marker(&self, qualified_name: &str) -> Option<&MarkerMetadata> {
        find_marker(&self.markers, qualified_name)
    }

    /// Appends `field` unless a field with the same name is already present.
    pub fn add_field(&mut self, field: FieldMetadata) -> bool {
        if self.fields.iter().any(|f| f.name == field.name) {
            return false;
        }
        self.fields.push(field);
        true
    }

    /// Replaces the field list; `None` clears it. Later duplicates by name are dropped.
    pub fn set_fields(&mut self, fields: Option<Vec<FieldMetadata>>) {
        self.fields.clear();
        for field in fields.unwrap_or_default() {
            self.add_field(field);
        }
    }

    pub(crate) fn push_marker(&mut self, marker: MarkerMetadata) {
        push_marker(&mut self.markers, marker);
    }

    pub(crate) fn marker_parent(&self) -> MarkerParent {
        MarkerParent::Class {
            qualified_name: self.qualified_name.clone(),
        }
    }
}

impl PartialEq for ClassMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name == other.qualified_name
    }
}

impl Eq for ClassMetadata {}

impl Hash for ClassMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn split_qualified_name_handles_default_package() {
        assert_eq!(
            split_qualified_name("org.example.Person"),
            (Some("org.example".to_string()), "Person".to_string())
        );
        assert_eq!(split_qualified_name("Person"), (None, "Person".to_string()));
    }

    #[test]
    fn add_field_keeps_first_declaration() {
        let mut class = ClassMetadata::new("a.A");
        assert!(class.add_field(FieldMetadata::new("a.A", "x", "int")));
        assert!(class.add_field(FieldMetadata::new("a.A", "y", "int")));
        assert!(!class.add_field(FieldMetadata::new("a.A", "x", "long")));

        let names: Vec<_> = class.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(class.field("x").map(|f| f.type_name()), Some("int"));
        assert!(class.field(" ").is_none());
    }

    #[test]
    fn set_fields_none_clears() {
        let mut class = ClassMetadata::new("a.A");
        class.set_fields(Some(vec![
            FieldMetadata::new("a.A", "b", "int"),
            FieldMetadata::new("a.A", "a", "int"),
            FieldMetadata::new("a.A", "b", "long"),
        ]));
        let names: Vec<_> = class.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["b", "a"]);

        class.set_fields(None);
        assert!(class.fields().is_empty());
    }

    #[test]
    fn equality_follows_identity() {
        let mut a = ClassMetadata::new("a.A");
        a.add_field(FieldMetadata::new("a.A", "x", "int"));
        assert_eq!(a, ClassMetadata::new("a.A"));
        assert_ne!(
            FieldMetadata::new("a.A", "x", "int"),
            FieldMetadata::new("a.B", "x", "int")
        );
    }

    #[test]
    fn marker_attribute_names_must_not_be_blank() {
        let parent = MarkerParent::Class {
            qualified_name: "a.A".into(),
        };
        let mut marker = MarkerMetadata::new(parent, "a.Entity");
        assert_eq!(marker.name(), "Entity");
        assert_eq!(marker.package_name(), Some("a"));

        marker.add_attribute("table", json!("people")).unwrap();
        assert_eq!(marker.attribute("table").unwrap(), Some(&json!("people")));
        assert!(matches!(
            marker.add_attribute("", json!(1)),
            Err(MetadataError::InvalidArgument(_))
        ));
        assert!(marker.attribute("  ").is_err());

        marker.set_attributes(None);
        assert!(marker.attributes().is_empty());
    }

    #[test]
    fn scalar_shape_drops_element_type() {
        let field = FieldMetadata::new("a.A", "x", "int")
            .with_shape(ContainerShape::Scalar, Some("int".into()));
        assert!(field.element_type().is_none());
        assert!(!field.is_multiple());

        let tags = FieldMetadata::new("a.A", "tags", "java.util.Set")
            .with_shape(ContainerShape::Set, None);
        assert!(tags.is_set() && tags.is_multiple());
        assert!(tags.element_type().is_none());
    }

    #[test]
    fn modifiers_compose() {
        let m = Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
        assert!(m.is_static() && m.is_final());
        assert!(!m.contains(Modifiers::PRIVATE));
        assert_eq!(m.bits(), 0x19);
        assert_eq!(Modifiers::from_keyword("transient"), Some(Modifiers::TRANSIENT));
        assert_eq!(Modifiers::from_keyword("default"), None);
    }
}
