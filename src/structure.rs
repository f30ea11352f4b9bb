//! Java source parsing into [`TypeDescription`]s using tree-sitter.
//!
//! Simple type names are resolved against, in order: type variables in scope,
//! primitives, single-type imports, types declared in the same compilation
//! unit, `java.lang`, wildcard imports of known library types, and finally the
//! unit's own package.

use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use tree_sitter::{Node, Parser};

use crate::introspect::{
    FieldDescription, MarkerInstance, MethodDescription, TypeDescription, TypeRef,
    known_collection_kind,
};
use crate::model::{Attributes, Modifiers};

/// Annotation arguments as written in source, attached to every parsed marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeclaredArguments(Attributes);

impl DeclaredArguments {
    pub fn new(values: Attributes) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &Attributes {
        &self.0
    }
}

const PRIMITIVES: &[&str] = &[
    "byte", "short", "int", "long", "float", "double", "boolean", "char", "void",
];

const JAVA_LANG: &[&str] = &[
    "Object", "String", "Integer", "Long", "Short", "Byte", "Character", "Boolean", "Double",
    "Float", "Number", "Class", "Enum", "Record", "Void", "Iterable", "CharSequence",
    "StringBuilder", "StringBuffer", "Comparable", "Runnable", "Thread", "Throwable",
    "Exception", "RuntimeException", "Error", "Override", "Deprecated", "FunctionalInterface",
    "SuppressWarnings", "SafeVarargs", "Cloneable", "AutoCloseable",
];

const JAVA_UTIL_MAPS: &[&str] = &[
    "java.util.Map",
    "java.util.HashMap",
    "java.util.LinkedHashMap",
    "java.util.TreeMap",
    "java.util.Optional",
];

const TYPE_KINDS: &[&str] = &[
    "integral_type",
    "floating_point_type",
    "boolean_type",
    "void_type",
    "type_identifier",
    "scoped_type_identifier",
    "generic_type",
    "array_type",
    "annotated_type",
];

/// Parses every type declared in `source`, nested types included.
///
/// Returns `None` for blank input or when the parser cannot be set up.
pub fn parse_compilation_unit(source: &str) -> Option<Vec<TypeDescription>> {
    if source.trim().is_empty() {
        return None;
    }

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_java::LANGUAGE.into())
        .ok()?;
    let tree = parser.parse(source, None)?;
    let root = tree.root_node();

    let mut unit = Unit {
        source: source.as_bytes(),
        package: None,
        imports: HashMap::new(),
        wildcard_imports: Vec::new(),
        local_types: HashMap::new(),
    };

    let top_level: Vec<Node> = children(&root)
        .into_iter()
        .filter(|n| is_type_declaration(n.kind()))
        .collect();

    for child in children(&root) {
        match child.kind() {
            "package_declaration" => unit.package = extract_package(&child, unit.source),
            "import_declaration" => unit.add_import(&child),
            _ => {}
        }
    }

    for decl in &top_level {
        let qualified = unit.qualify_top_level(declared_name(decl, unit.source));
        unit.collect_local_types(decl, &qualified);
    }

    let mut types = Vec::new();
    for decl in &top_level {
        let qualified = unit.qualify_top_level(declared_name(decl, unit.source));
        unit.describe_declaration(decl, qualified, &[], &mut types);
    }
    Some(types)
}

struct Unit<'a> {
    source: &'a [u8],
    package: Option<String>,
    imports: HashMap<String, String>,
    wildcard_imports: Vec<String>,
    local_types: HashMap<String, String>,
}

impl Unit<'_> {
    fn text(&self, node: &Node) -> &str {
        node_text(node, self.source)
    }

    fn add_import(&mut self, node: &Node) {
        let mut is_static = false;
        let mut path = None;
        let mut wildcard = false;
        for child in children(node) {
            match child.kind() {
                "static" => is_static = true,
                "scoped_identifier" | "identifier" => path = Some(self.text(&child).to_string()),
                "asterisk" => wildcard = true,
                _ => {}
            }
        }
        let Some(path) = path else {
            return;
        };
        if is_static {
            return;
        }
        if wildcard {
            self.wildcard_imports.push(path);
        } else if let Some((_, simple)) = path.rsplit_once('.') {
            self.imports.insert(simple.to_string(), path);
        }
    }

    fn qualify_top_level(&self, name: &str) -> String {
        match &self.package {
            Some(pkg) => format!("{pkg}.{name}"),
            None => name.to_string(),
        }
    }

    fn collect_local_types(&mut self, decl: &Node, qualified: &str) {
        let name = declared_name(decl, self.source).to_string();
        self.local_types
            .entry(name)
            .or_insert_with(|| qualified.to_string());
        for nested in nested_declarations(decl) {
            let nested_name = declared_name(&nested, self.source);
            let nested_qualified = format!("{qualified}.{nested_name}");
            self.collect_local_types(&nested, &nested_qualified);
        }
    }

    fn resolve_name(&self, raw: &str) -> String {
        let name: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if PRIMITIVES.contains(&name.as_str()) {
            return name;
        }
        if let Some((head, rest)) = name.split_once('.') {
            if head.starts_with(char::is_lowercase) {
                return name;
            }
            return format!("{}.{rest}", self.resolve_name(head));
        }
        if let Some(imported) = self.imports.get(&name) {
            return imported.clone();
        }
        if let Some(local) = self.local_types.get(&name) {
            return local.clone();
        }
        if JAVA_LANG.contains(&name.as_str()) {
            return format!("java.lang.{name}");
        }
        for pkg in &self.wildcard_imports {
            let candidate = format!("{pkg}.{name}");
            if known_collection_kind(&candidate).is_some()
                || JAVA_UTIL_MAPS.contains(&candidate.as_str())
            {
                return candidate;
            }
        }
        self.qualify_top_level(&name)
    }

    fn type_ref(&self, node: &Node, vars: &[String]) -> TypeRef {
        match node.kind() {
            "integral_type" | "floating_point_type" | "boolean_type" | "void_type" => {
                TypeRef::named(self.text(node))
            }
            "type_identifier" => {
                let name = self.text(node);
                if vars.iter().any(|v| v == name) {
                    TypeRef::Variable(name.to_string())
                } else {
                    TypeRef::named(self.resolve_name(name))
                }
            }
            "scoped_type_identifier" => TypeRef::named(self.resolve_name(self.text(node))),
            "generic_type" => {
                let mut name = String::new();
                let mut arguments = Vec::new();
                for child in children(node) {
                    match child.kind() {
                        "type_identifier" | "scoped_type_identifier" => {
                            name = self.resolve_name(self.text(&child));
                        }
                        "type_arguments" => {
                            arguments = named_children(&child)
                                .iter()
                                .map(|arg| self.type_ref(arg, vars))
                                .collect();
                        }
                        _ => {}
                    }
                }
                TypeRef::generic(name, arguments)
            }
            "array_type" => {
                let element = node
                    .child_by_field_name("element")
                    .map(|e| self.type_ref(&e, vars))
                    .unwrap_or_else(|| TypeRef::named(self.text(node)));
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(|d| dimension_count(self.text(&d)))
                    .unwrap_or(1);
                wrap_array(element, dims)
            }
            "annotated_type" => named_children(node)
                .iter()
                .rev()
                .find(|c| TYPE_KINDS.contains(&c.kind()))
                .map(|c| self.type_ref(c, vars))
                .unwrap_or_else(|| TypeRef::named(self.text(node))),
            "wildcard" => {
                let kids = children(node);
                if kids.iter().any(|c| c.kind() == "super") {
                    return TypeRef::Wildcard(None);
                }
                let bound = kids
                    .iter()
                    .find(|c| TYPE_KINDS.contains(&c.kind()))
                    .map(|c| Box::new(self.type_ref(c, vars)));
                TypeRef::Wildcard(bound)
            }
            _ => TypeRef::named(self.resolve_name(self.text(node))),
        }
    }

    fn modifiers_and_markers(&self, decl: &Node) -> (Modifiers, Vec<MarkerInstance>) {
        let mut modifiers = Modifiers::NONE;
        let mut markers = Vec::new();
        let Some(node) = children(decl).into_iter().find(|c| c.kind() == "modifiers") else {
            return (modifiers, markers);
        };
        for child in children(&node) {
            match child.kind() {
                "marker_annotation" | "annotation" => markers.push(self.marker(&child)),
                keyword => {
                    if let Some(m) = Modifiers::from_keyword(keyword) {
                        modifiers |= m;
                    }
                }
            }
        }
        (modifiers, markers)
    }

    fn marker(&self, node: &Node) -> MarkerInstance {
        let (type_name, arguments) = self.annotation(node);
        MarkerInstance::new(type_name, DeclaredArguments::new(arguments))
    }

    fn annotation(&self, node: &Node) -> (String, Attributes) {
        let type_name = node
            .child_by_field_name("name")
            .map(|n| self.resolve_name(self.text(&n)))
            .unwrap_or_default();
        let mut arguments = Attributes::new();
        if let Some(list) = node.child_by_field_name("arguments") {
            for arg in named_children(&list) {
                if arg.kind() == "element_value_pair" {
                    let key = arg.child_by_field_name("key").map(|k| self.text(&k).to_string());
                    let value = arg.child_by_field_name("value").map(|v| self.element_value(&v));
                    if let (Some(key), Some(value)) = (key, value) {
                        arguments.insert(key, value);
                    }
                } else if !matches!(arg.kind(), "line_comment" | "block_comment") {
                    arguments.insert("value".to_string(), self.element_value(&arg));
                }
            }
        }
        (type_name, arguments)
    }

    fn element_value(&self, node: &Node) -> Value {
        let text = self.text(node);
        match node.kind() {
            "string_literal" => Value::String(unquote_string(text)),
            "character_literal" => Value::String(unquote_string(
                text.trim_start_matches('\'').trim_end_matches('\''),
            )),
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null_literal" => Value::Null,
            "decimal_integer_literal"
            | "hex_integer_literal"
            | "octal_integer_literal"
            | "binary_integer_literal" => parse_integer(text)
                .map(Value::from)
                .unwrap_or_else(|| Value::String(text.to_string())),
            "decimal_floating_point_literal" => parse_float(text)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(text.to_string())),
            "unary_expression" => {
                let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
                parse_integer(&compact)
                    .map(Value::from)
                    .or_else(|| parse_float(&compact).map(Value::Number))
                    .unwrap_or(Value::String(compact))
            }
            "element_value_array_initializer" => Value::Array(
                named_children(node)
                    .iter()
                    .filter(|c| !matches!(c.kind(), "line_comment" | "block_comment"))
                    .map(|c| self.element_value(c))
                    .collect(),
            ),
            "annotation" | "marker_annotation" => {
                let (type_name, arguments) = self.annotation(node);
                let mut object: Map<String, Value> = arguments.into_iter().collect();
                object.insert("annotationType".to_string(), Value::String(type_name));
                Value::Object(object)
            }
            "class_literal" => {
                let ty = named_children(node)
                    .first()
                    .map(|t| self.type_ref(t, &[]).erasure())
                    .unwrap_or_else(|| text.trim_end_matches(".class").to_string());
                Value::String(ty)
            }
            _ => Value::String(normalize_whitespace(text)),
        }
    }

    fn describe_declaration(
        &self,
        decl: &Node,
        qualified: String,
        outer_vars: &[String],
        out: &mut Vec<TypeDescription>,
    ) {
        let kind = decl.kind();
        let simple = declared_name(decl, self.source).to_string();
        let mut vars = outer_vars.to_vec();
        vars.extend(type_parameters(decl, self.source));

        let (_, markers) = self.modifiers_and_markers(decl);
        let mut description = TypeDescription {
            qualified_name: qualified.clone(),
            package: self.package.clone(),
            simple_name: simple,
            fields: Vec::new(),
            methods: Vec::new(),
            markers,
            supertypes: self.supertypes(decl, &vars),
        };

        if kind == "record_declaration"
            && let Some(params) = decl.child_by_field_name("parameters")
        {
            for param in named_children(&params) {
                if let Some((name, ty, markers)) = self.parameter(&param, &vars) {
                    let mut field = FieldDescription::new(name, ty)
                        .with_modifiers(Modifiers::PRIVATE | Modifiers::FINAL);
                    field.markers = markers;
                    description.fields.push(field);
                }
            }
        }

        let interface_like = matches!(kind, "interface_declaration" | "annotation_type_declaration");
        let mut nested = Vec::new();
        if let Some(body) = decl.child_by_field_name("body") {
            for member in children(&body) {
                match member.kind() {
                    "enum_constant" => {
                        let name = member
                            .child_by_field_name("name")
                            .map(|n| self.text(&n).to_string())
                            .unwrap_or_default();
                        let (_, markers) = self.modifiers_and_markers(&member);
                        let mut field = FieldDescription::new(name, TypeRef::named(&qualified))
                            .with_modifiers(
                                Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL | Modifiers::ENUM,
                            );
                        field.markers = markers;
                        description.fields.push(field);
                    }
                    "enum_body_declarations" => {
                        for inner in children(&member) {
                            self.member(&inner, &vars, false, &mut description, &mut nested);
                        }
                    }
                    _ => self.member(&member, &vars, interface_like, &mut description, &mut nested),
                }
            }
        }

        out.push(description);
        for inner in nested {
            let name = declared_name(&inner, self.source);
            self.describe_declaration(&inner, format!("{qualified}.{name}"), &vars, out);
        }
    }

    fn supertypes(&self, decl: &Node, vars: &[String]) -> Vec<TypeRef> {
        let mut supertypes = Vec::new();
        for child in children(decl) {
            let declared: Vec<Node> = match child.kind() {
                "superclass" => named_children(&child),
                "super_interfaces" | "extends_interfaces" => named_children(&child)
                    .into_iter()
                    .filter(|c| c.kind() == "type_list")
                    .flat_map(|list| named_children(&list))
                    .collect(),
                _ => continue,
            };
            supertypes.extend(
                declared
                    .iter()
                    .filter(|t| TYPE_KINDS.contains(&t.kind()))
                    .map(|t| self.type_ref(t, vars)),
            );
        }
        supertypes
    }

    fn member<'t>(
        &self,
        member: &Node<'t>,
        vars: &[String],
        interface_like: bool,
        description: &mut TypeDescription,
        nested: &mut Vec<Node<'t>>,
    ) {
        match member.kind() {
            "field_declaration" | "constant_declaration" => {
                let (mut modifiers, markers) = self.modifiers_and_markers(member);
                if interface_like || member.kind() == "constant_declaration" {
                    modifiers |= Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL;
                }
                let Some(type_node) = member.child_by_field_name("type") else {
                    return;
                };
                let base = self.type_ref(&type_node, vars);
                let mut cursor = member.walk();
                let declarators: Vec<Node> = member
                    .children_by_field_name("declarator", &mut cursor)
                    .collect();
                for declarator in declarators {
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    let dims = declarator
                        .child_by_field_name("dimensions")
                        .map(|d| dimension_count(self.text(&d)))
                        .unwrap_or(0);
                    let mut field =
                        FieldDescription::new(self.text(&name), wrap_array(base.clone(), dims))
                            .with_modifiers(modifiers);
                    field.markers = markers.clone();
                    description.fields.push(field);
                }
            }
            "method_declaration" | "annotation_type_element_declaration" => {
                if let Some(method) = self.method(member, vars, interface_like) {
                    description.methods.push(method);
                }
            }
            kind if is_type_declaration(kind) => nested.push(*member),
            _ => {}
        }
    }

    fn method(&self, node: &Node, outer_vars: &[String], interface_like: bool) -> Option<MethodDescription> {
        let name = self.text(&node.child_by_field_name("name")?).to_string();
        let mut vars = outer_vars.to_vec();
        vars.extend(type_parameters(node, self.source));

        let (mut modifiers, _) = self.modifiers_and_markers(node);
        if interface_like {
            modifiers |= Modifiers::PUBLIC;
            let has_body = node.child_by_field_name("body").is_some();
            if !has_body && !modifiers.is_static() {
                modifiers |= Modifiers::ABSTRACT;
            }
        }

        let return_type = node
            .child_by_field_name("type")
            .filter(|t| t.kind() != "void_type")
            .map(|t| self.type_ref(&t, &vars));

        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| {
                named_children(&params)
                    .iter()
                    .filter_map(|p| self.parameter(p, &vars).map(|(_, ty, _)| ty))
                    .collect()
            })
            .unwrap_or_default();

        Some(MethodDescription {
            name,
            return_type,
            parameters,
            modifiers,
        })
    }

    fn parameter(&self, node: &Node, vars: &[String]) -> Option<(String, TypeRef, Vec<MarkerInstance>)> {
        let (_, markers) = self.modifiers_and_markers(node);
        match node.kind() {
            "formal_parameter" => {
                let ty = self.type_ref(&node.child_by_field_name("type")?, vars);
                let name = self.text(&node.child_by_field_name("name")?).to_string();
                let dims = node
                    .child_by_field_name("dimensions")
                    .map(|d| dimension_count(self.text(&d)))
                    .unwrap_or(0);
                Some((name, wrap_array(ty, dims), markers))
            }
            "spread_parameter" => {
                let kids = named_children(node);
                let ty = kids.iter().find(|c| TYPE_KINDS.contains(&c.kind()))?;
                let name = kids
                    .iter()
                    .find(|c| c.kind() == "variable_declarator")
                    .and_then(|d| d.child_by_field_name("name"))
                    .map(|n| self.text(&n).to_string())
                    .unwrap_or_default();
                Some((name, TypeRef::array_of(self.type_ref(ty, vars)), markers))
            }
            _ => None,
        }
    }
}

fn is_type_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

fn declared_name<'s>(decl: &Node, source: &'s [u8]) -> &'s str {
    decl.child_by_field_name("name")
        .map(|n| node_text(&n, source))
        .unwrap_or("")
}

fn nested_declarations<'t>(decl: &Node<'t>) -> Vec<Node<'t>> {
    let Some(body) = decl.child_by_field_name("body") else {
        return Vec::new();
    };
    let mut nested = Vec::new();
    for member in children(&body) {
        if is_type_declaration(member.kind()) {
            nested.push(member);
        } else if member.kind() == "enum_body_declarations" {
            nested.extend(
                children(&member)
                    .into_iter()
                    .filter(|n| is_type_declaration(n.kind())),
            );
        }
    }
    nested
}

fn type_parameters(decl: &Node, source: &[u8]) -> Vec<String> {
    let Some(params) = children(decl)
        .into_iter()
        .find(|c| c.kind() == "type_parameters")
    else {
        return Vec::new();
    };
    named_children(&params)
        .iter()
        .filter(|p| p.kind() == "type_parameter")
        .filter_map(|p| {
            named_children(p)
                .into_iter()
                .find(|c| matches!(c.kind(), "type_identifier" | "identifier"))
                .map(|c| node_text(&c, source).to_string())
        })
        .collect()
}

fn extract_package(node: &Node, source: &[u8]) -> Option<String> {
    children(node)
        .into_iter()
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .map(|c| node_text(&c, source).to_string())
}

fn children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dimension_count(text: &str) -> usize {
    text.matches('[').count()
}

fn wrap_array(mut ty: TypeRef, dims: usize) -> TypeRef {
    for _ in 0..dims {
        ty = TypeRef::array_of(ty);
    }
    ty
}

fn unquote_string(text: &str) -> String {
    let inner = if let Some(block) = text.strip_prefix("\"\"\"") {
        block.strip_suffix("\"\"\"").unwrap_or(block).trim_start_matches('\n')
    } else {
        text.strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(text)
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('s') => out.push(' '),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn parse_integer(text: &str) -> Option<i64> {
    let cleaned: String = text
        .trim_end_matches(['l', 'L'])
        .chars()
        .filter(|c| *c != '_')
        .collect();
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()?
    } else {
        digits.parse::<i64>().ok()?
    };
    Some(if negative { -value } else { value })
}

fn parse_float(text: &str) -> Option<Number> {
    let cleaned: String = text
        .trim_end_matches(['f', 'F', 'd', 'D'])
        .chars()
        .filter(|c| *c != '_')
        .collect();
    cleaned.parse::<f64>().ok().and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_one(source: &str) -> TypeDescription {
        let mut types = parse_compilation_unit(source).unwrap();
        assert!(!types.is_empty());
        types.remove(0)
    }

    fn arguments(marker: &MarkerInstance) -> &Attributes {
        marker.payload::<DeclaredArguments>().unwrap().values()
    }

    #[test]
    fn fields_keep_declaration_order_and_resolve_imports() {
        let source = r#"
package org.example;

import java.util.List;
import java.util.Set;

public class Person {
    private String name;
    private List<String> tags;
    protected int[] scores, matrix[];
    public static final long SERIAL = 1L;
    private transient Set<Address> addresses;

    public String getName() { return name; }
    public void setName(String name) { this.name = name; }
}
"#;
        let person = parse_one(source);
        assert_eq!(person.qualified_name, "org.example.Person");
        assert_eq!(person.package.as_deref(), Some("org.example"));
        assert_eq!(person.simple_name, "Person");

        let names: Vec<_> = person.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["name", "tags", "scores", "matrix", "SERIAL", "addresses"]
        );

        assert_eq!(person.fields[0].ty, TypeRef::named("java.lang.String"));
        assert_eq!(
            person.fields[1].ty,
            TypeRef::generic("java.util.List", vec![TypeRef::named("java.lang.String")])
        );
        assert_eq!(person.fields[2].ty.erasure(), "int[]");
        assert_eq!(person.fields[3].ty.erasure(), "int[][]");
        assert_eq!(person.fields[2].modifiers, Modifiers::PROTECTED);
        assert!(person.fields[4].modifiers.is_static());
        assert!(person.fields[5].modifiers.contains(Modifiers::TRANSIENT));
        assert_eq!(
            person.fields[5].ty.arguments()[0],
            TypeRef::named("org.example.Address")
        );

        assert_eq!(person.methods.len(), 2);
        assert_eq!(person.methods[0].name, "getName");
        assert_eq!(person.methods[1].return_type, None);
        assert_eq!(person.methods[1].parameters, vec![TypeRef::named("java.lang.String")]);
    }

    #[test]
    fn annotations_carry_their_arguments() {
        let source = r#"
package org.example;

import javax.persistence.Entity;
import javax.persistence.Column;

@Entity(table = "people", cacheable = true, version = 3, tags = {"a", "b"})
@Deprecated
public class Person {
    @Column("full_name")
    private String name;

    @Column(length = -1, scale = 0x10, ratio = 1.5f, mode = Mode.STRICT, type = String.class)
    private String other;
}
"#;
        let person = parse_one(source);
        assert_eq!(person.markers.len(), 2);
        assert_eq!(person.markers[0].type_name(), "javax.persistence.Entity");
        assert_eq!(person.markers[1].type_name(), "java.lang.Deprecated");

        let entity = arguments(&person.markers[0]);
        assert_eq!(entity["table"], json!("people"));
        assert_eq!(entity["cacheable"], json!(true));
        assert_eq!(entity["version"], json!(3));
        assert_eq!(entity["tags"], json!(["a", "b"]));
        assert!(arguments(&person.markers[1]).is_empty());

        let column = arguments(&person.fields[0].markers[0]);
        assert_eq!(column["value"], json!("full_name"));

        let other = arguments(&person.fields[1].markers[0]);
        assert_eq!(other["length"], json!(-1));
        assert_eq!(other["scale"], json!(16));
        assert_eq!(other["ratio"], json!(1.5));
        assert_eq!(other["mode"], json!("Mode.STRICT"));
        assert_eq!(other["type"], json!("java.lang.String"));
    }

    #[test]
    fn generics_wildcards_and_type_variables() {
        let source = r#"
package a;

import java.util.*;

public class Holder<T> {
    private List<T> items;
    private Set<? extends Number> numbers;
    private Collection<?> anything;
    private T single;
    private Map<String, T> index;
}
"#;
        let holder = parse_one(source);
        let items = &holder.fields[0].ty;
        assert_eq!(items.erasure(), "java.util.List");
        assert_eq!(items.arguments()[0], TypeRef::Variable("T".into()));

        let numbers = &holder.fields[1].ty;
        assert_eq!(numbers.erasure(), "java.util.Set");
        assert_eq!(numbers.arguments()[0].erasure(), "java.lang.Number");

        assert_eq!(holder.fields[2].ty.arguments()[0], TypeRef::Wildcard(None));
        assert_eq!(holder.fields[3].ty.erasure(), "java.lang.Object");
        assert_eq!(holder.fields[4].ty.erasure(), "java.util.Map");
    }

    #[test]
    fn supertypes_are_resolved() {
        let source = r#"
package a;

import java.util.ArrayList;
import java.io.Serializable;

public class Tags<T> extends ArrayList<T> implements Serializable, Named {
}

interface Named extends Comparable<Named> {}
"#;
        let types = parse_compilation_unit(source).unwrap();
        let erased: Vec<_> = types[0].supertypes.iter().map(|t| t.erasure()).collect();
        assert_eq!(erased, vec!["java.util.ArrayList", "java.io.Serializable", "a.Named"]);
        assert_eq!(types[0].supertypes[0].arguments()[0], TypeRef::Variable("T".into()));

        let named: Vec<_> = types[1].supertypes.iter().map(|t| t.erasure()).collect();
        assert_eq!(named, vec!["java.lang.Comparable"]);
    }

    #[test]
    fn enums_records_interfaces_and_nested_types() {
        let source = r#"
package a;

public enum Color {
    RED, GREEN;

    private int value;

    public static class Palette {
        private Color primary;
    }
}

record Point(int x, @Positive int y) {}

interface Limits {
    int MAX = 10;
    int max();
}
"#;
        let types = parse_compilation_unit(source).unwrap();
        let names: Vec<_> = types.iter().map(|t| t.qualified_name.as_str()).collect();
        assert_eq!(names, vec!["a.Color", "a.Color.Palette", "a.Point", "a.Limits"]);

        let color = &types[0];
        let fields: Vec<_> = color.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["RED", "GREEN", "value"]);
        assert!(color.fields[0].modifiers.contains(Modifiers::ENUM));
        assert_eq!(color.fields[0].ty.erasure(), "a.Color");

        let palette = &types[1];
        assert_eq!(palette.simple_name, "Palette");
        assert_eq!(palette.package.as_deref(), Some("a"));
        assert_eq!(palette.fields[0].ty.erasure(), "a.Color");

        let point = &types[2];
        let fields: Vec<_> = point.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(fields, vec!["x", "y"]);
        assert!(point.fields[0].modifiers.is_final());
        assert_eq!(point.fields[1].markers[0].type_name(), "a.Positive");

        let limits = &types[3];
        let max = &limits.fields[0];
        assert!(max.modifiers.contains(Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL));
        assert!(limits.methods[0].modifiers.contains(Modifiers::ABSTRACT));
    }

    #[test]
    fn blank_source_returns_none() {
        assert!(parse_compilation_unit("   ").is_none());
    }

    #[test]
    fn unquote_handles_escapes() {
        assert_eq!(unquote_string(r#""a\"b\n""#), "a\"b\n");
        assert_eq!(parse_integer("1_000L"), Some(1000));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("017"), Some(15));
    }
}
