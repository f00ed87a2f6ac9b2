//! Decoding of Tree-sitter `node-types.json` schemas.
//!
//! `tree-sitter generate` writes a `node-types.json` file next to the parser
//! that enumerates every node kind the parser can produce. This module decodes
//! that file with [`facet_json`] into raw entries mirroring the JSON shape, then
//! lowers them into the read-only [`NodeSpec`] model the rest of the crate
//! works on.
//!
//! Lowering does not judge whether the schema is sensible; that is the job of
//! [`validate`](crate::validate).

use facet::Facet;
use indexmap::IndexMap;
use std::collections::HashMap;

/// A single entry of `node-types.json`, exactly as serialized.
///
/// See <https://tree-sitter.github.io/tree-sitter/using-parsers/6-static-node-types.html>
#[derive(Debug, Clone, Facet)]
pub struct NodeTypeEntry {
    /// The node kind, e.g. `"binary_expression"` or `"+"`.
    #[facet(rename = "type")]
    pub kind: String,

    /// Whether the kind is named (a rule) or anonymous (a literal token).
    pub named: bool,

    /// Named fields of the node, keyed by field name.
    #[facet(default)]
    pub fields: Option<HashMap<String, ChildrenEntry>>,

    /// Named children that are not attached to any field.
    #[facet(default)]
    pub children: Option<ChildrenEntry>,

    /// Present only on supertypes: the kinds this abstract kind stands for.
    #[facet(default)]
    pub subtypes: Option<Vec<KindEntry>>,

    /// Set on the grammar's root node kind by newer Tree-sitter versions.
    #[facet(default)]
    pub root: Option<bool>,

    /// Set on kinds that may appear anywhere (comments, etc.).
    #[facet(default)]
    pub extra: Option<bool>,
}

/// The serialized shape of a field or of the children of a node.
#[derive(Debug, Clone, Facet)]
pub struct ChildrenEntry {
    /// Whether more than one node may occupy this slot.
    pub multiple: bool,

    /// Whether at least one node always occupies this slot.
    pub required: bool,

    /// The kinds allowed in this slot.
    #[facet(default)]
    pub types: Vec<KindEntry>,
}

/// A serialized `{ "type": ..., "named": ... }` reference.
#[derive(Debug, Clone, Facet)]
pub struct KindEntry {
    /// The referenced node kind.
    #[facet(rename = "type")]
    pub kind: String,

    /// Whether the referenced kind is named.
    pub named: bool,
}

/// A reference to a schema kind, as it appears inside a field or child slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KindRef {
    /// The referenced kind name.
    pub name: String,
    /// Whether the reference targets a named kind.
    pub named: bool,
}

impl KindRef {
    /// Builds a reference to a named kind.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            named: true,
        }
    }

    /// Builds a reference to an anonymous kind.
    #[must_use]
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            named: false,
        }
    }
}

impl std::fmt::Display for KindRef {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        if self.named {
            write!(f, "{}", self.name)
        } else {
            write!(f, "\"{}\"", self.name)
        }
    }
}

impl From<KindEntry> for KindRef {
    fn from(entry: KindEntry) -> Self {
        Self {
            name: entry.kind,
            named: entry.named,
        }
    }
}

/// One named field, or the anonymous children slot, of a node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Whether the slot may hold more than one node.
    pub multiple: bool,
    /// Whether the slot always holds at least one node.
    pub required: bool,
    /// The kinds allowed in the slot, in declaration order, without duplicates.
    pub alternatives: Vec<KindRef>,
}

/// Lowers kind entries, keeping the first occurrence of each reference.
fn dedup_kinds(entries: Vec<KindEntry>) -> Vec<KindRef> {
    let mut kinds: Vec<KindRef> = Vec::with_capacity(entries.len());
    for kind in entries.into_iter().map(KindRef::from) {
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    kinds
}

impl From<ChildrenEntry> for FieldSpec {
    fn from(entry: ChildrenEntry) -> Self {
        Self {
            multiple: entry.multiple,
            required: entry.required,
            alternatives: dedup_kinds(entry.types),
        }
    }
}

/// A declared node kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// The node kind.
    pub kind: String,
    /// Whether the kind is named.
    pub named: bool,
    /// Named fields, ordered by field name.
    pub fields: IndexMap<String, FieldSpec>,
    /// The children slot, if the kind declares one.
    pub children: Option<FieldSpec>,
    /// The subtypes, without duplicates, if and only if this kind is a supertype.
    pub subtypes: Option<Vec<KindRef>>,
    /// Whether the kind may appear anywhere in the tree.
    pub extra: bool,
}

impl NodeSpec {
    /// Returns `true` if this kind is an abstract supertype.
    #[must_use]
    pub fn is_supertype(&self) -> bool {
        self.subtypes.is_some()
    }

    /// Iterates over every slot of this kind: named fields first, then children.
    pub fn slots(&self) -> impl Iterator<Item = (Slot<'_>, &FieldSpec)> {
        self.fields
            .iter()
            .map(|(name, spec)| (Slot::Field(name), spec))
            .chain(self.children.iter().map(|spec| (Slot::Children, spec)))
    }
}

impl From<NodeTypeEntry> for NodeSpec {
    fn from(entry: NodeTypeEntry) -> Self {
        // JSON object order is lost in the map, so fix an order that does not
        // depend on hashing. node-types.json itself lists fields this way.
        let mut fields: Vec<(String, FieldSpec)> = entry
            .fields
            .unwrap_or_default()
            .into_iter()
            .map(|(name, spec)| (name, FieldSpec::from(spec)))
            .collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        Self {
            kind: entry.kind,
            named: entry.named,
            fields: fields.into_iter().collect(),
            children: entry.children.map(FieldSpec::from),
            subtypes: entry.subtypes.map(dedup_kinds),
            extra: entry.extra.unwrap_or(false),
        }
    }
}

/// Identifies a slot of a node kind in diagnostics and accessor provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot<'a> {
    /// A named field.
    Field(&'a str),
    /// The anonymous children slot.
    Children,
}

impl std::fmt::Display for Slot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Slot::Field(name) => write!(f, "field '{name}'"),
            Slot::Children => write!(f, "children"),
        }
    }
}

/// Errors raised while decoding a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The input JSON was syntactically invalid or structurally mismatched.
    #[error("JSON parse error: {0}")]
    JsonParse(String),
}

/// Decode a `node-types.json` document into [`NodeSpec`]s, in declaration order.
///
/// # Errors
///
/// Returns [`SchemaError::JsonParse`] if the provided string is not valid JSON
/// or does not have the shape of a node types document.
pub fn parse_node_types(json: &str) -> Result<Vec<NodeSpec>, SchemaError> {
    let entries: Vec<NodeTypeEntry> =
        facet_json::from_str(json).map_err(|e| SchemaError::JsonParse(e.to_string()))?;
    Ok(entries.into_iter().map(NodeSpec::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_node_types() {
        let json = r#"[
            {
                "type": "assignment",
                "named": true,
                "fields": {
                    "right": {
                        "multiple": false,
                        "required": false,
                        "types": [
                            {"type": "yield", "named": true},
                            {"type": "expression", "named": true}
                        ]
                    },
                    "left": {
                        "multiple": false,
                        "required": true,
                        "types": [{"type": "identifier", "named": true}]
                    }
                }
            },
            {
                "type": "expression",
                "named": true,
                "subtypes": [
                    {"type": "identifier", "named": true},
                    {"type": "call", "named": true}
                ]
            },
            {"type": "identifier", "named": true, "extra": false},
            {"type": "+", "named": false}
        ]"#;

        let nodes = parse_node_types(json).unwrap();
        assert_eq!(nodes.len(), 4);

        let assignment = &nodes[0];
        assert_eq!(assignment.kind, "assignment");
        assert!(!assignment.is_supertype());
        let names: Vec<&str> = assignment.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["left", "right"]);
        assert!(assignment.children.is_none());

        let right = &assignment.fields["right"];
        assert!(!right.required);
        assert_eq!(
            right.alternatives,
            [KindRef::named("yield"), KindRef::named("expression")]
        );

        assert!(nodes[1].is_supertype());
        assert_eq!(nodes[1].subtypes.as_ref().map(Vec::len), Some(2));
        assert!(!nodes[3].named);
    }

    #[test]
    fn test_duplicate_alternatives_collapse() {
        let json = r#"[{
            "type": "list",
            "named": true,
            "children": {
                "multiple": true,
                "required": false,
                "types": [
                    {"type": "item", "named": true},
                    {"type": "item", "named": true},
                    {"type": "item", "named": false}
                ]
            }
        }]"#;

        let nodes = parse_node_types(json).unwrap();
        let children = nodes[0].children.as_ref().unwrap();
        assert_eq!(
            children.alternatives,
            [KindRef::named("item"), KindRef::anonymous("item")]
        );
    }

    #[test]
    fn test_duplicate_subtypes_collapse() {
        let json = r#"[{
            "type": "expression",
            "named": true,
            "subtypes": [
                {"type": "a", "named": true},
                {"type": "b", "named": true},
                {"type": "a", "named": true}
            ]
        }]"#;

        let nodes = parse_node_types(json).unwrap();
        assert_eq!(
            nodes[0].subtypes.as_deref(),
            Some(&[KindRef::named("a"), KindRef::named("b")][..])
        );
    }

    #[test]
    fn test_extra_flag() {
        let json = r#"[
            {"type": "comment", "named": true, "extra": true},
            {"type": "identifier", "named": true}
        ]"#;
        let nodes = parse_node_types(json).unwrap();
        assert!(nodes[0].extra);
        assert!(!nodes[1].extra);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        let err = parse_node_types(r#"[{"type": "x"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::JsonParse(_)));
    }

    #[test]
    fn test_slots_order_fields_before_children() {
        let json = r#"[{
            "type": "call",
            "named": true,
            "fields": {
                "function": {"multiple": false, "required": true, "types": [{"type": "identifier", "named": true}]}
            },
            "children": {"multiple": false, "required": true, "types": [{"type": "arguments", "named": true}]}
        }]"#;

        let nodes = parse_node_types(json).unwrap();
        let slots: Vec<String> = nodes[0].slots().map(|(slot, _)| slot.to_string()).collect();
        assert_eq!(slots, ["field 'function'", "children"]);
    }
}
