//! Structural validation of decoded node type schemas.
//!
//! The schema is external input, so before resolution begins this module
//! rejects records that cannot be turned into definitions at all: nameless
//! kinds, duplicate declarations, supertypes without subtypes, and slots that
//! allow no kinds. References to undeclared kinds are *not* errors here; the
//! [`registry`](crate::registry) substitutes placeholders for them.

use crate::schema::{KindRef, NodeSpec, Slot};
use std::collections::HashSet;

/// A structural defect in a node type schema, naming the offending record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A node type entry has an empty `type`.
    #[error("node type #{index} has an empty kind name")]
    EmptyKind {
        /// Position of the entry in the schema.
        index: usize,
    },

    /// The same `(type, named)` pair is declared twice.
    #[error("kind '{kind}' (named: {named}) is declared more than once")]
    DuplicateKind {
        /// The duplicated kind.
        kind: String,
        /// Whether the duplicated declaration is named.
        named: bool,
    },

    /// A supertype lists no subtypes.
    #[error("supertype '{kind}' has no subtypes")]
    EmptySupertype {
        /// The supertype kind.
        kind: String,
    },

    /// A supertype is declared as an anonymous kind.
    #[error("supertype '{kind}' must be a named kind")]
    AnonymousSupertype {
        /// The supertype kind.
        kind: String,
    },

    /// A supertype also declares fields or children.
    #[error("supertype '{kind}' declares its own fields or children")]
    SupertypeWithFields {
        /// The supertype kind.
        kind: String,
    },

    /// A field has an empty name.
    #[error("kind '{kind}' declares a field with an empty name")]
    EmptyFieldName {
        /// The kind declaring the field.
        kind: String,
    },

    /// A field or children slot allows no kinds at all.
    #[error("{slot} of kind '{kind}' allows no kinds")]
    EmptyAlternatives {
        /// The kind declaring the slot.
        kind: String,
        /// The offending slot, rendered for display.
        slot: String,
    },

    /// A field, children slot or subtype list references a kind with no name.
    #[error("{slot} of kind '{kind}' references a kind with an empty name")]
    EmptyReference {
        /// The kind holding the reference.
        kind: String,
        /// The slot holding the reference, rendered for display.
        slot: String,
    },
}

/// Checks the structural invariants of a decoded schema.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, in declaration order.
pub fn validate(nodes: &[NodeSpec]) -> Result<(), ValidationError> {
    check_declarations(nodes)?;

    for node in nodes {
        match &node.subtypes {
            Some(subtypes) => check_supertype(node, subtypes)?,
            None => check_slots(node)?,
        }
    }

    Ok(())
}

fn check_declarations(nodes: &[NodeSpec]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();

    for (index, node) in nodes.iter().enumerate() {
        if node.kind.is_empty() {
            return Err(ValidationError::EmptyKind { index });
        }
        if !seen.insert((node.kind.as_str(), node.named)) {
            return Err(ValidationError::DuplicateKind {
                kind: node.kind.clone(),
                named: node.named,
            });
        }
    }

    Ok(())
}

fn check_supertype(node: &NodeSpec, subtypes: &[KindRef]) -> Result<(), ValidationError> {
    if subtypes.is_empty() {
        return Err(ValidationError::EmptySupertype {
            kind: node.kind.clone(),
        });
    }
    if !node.named {
        return Err(ValidationError::AnonymousSupertype {
            kind: node.kind.clone(),
        });
    }
    if !node.fields.is_empty() || node.children.is_some() {
        return Err(ValidationError::SupertypeWithFields {
            kind: node.kind.clone(),
        });
    }

    if subtypes.iter().any(|subtype| subtype.name.is_empty()) {
        return Err(ValidationError::EmptyReference {
            kind: node.kind.clone(),
            slot: "subtypes".to_string(),
        });
    }

    Ok(())
}

fn check_slots(node: &NodeSpec) -> Result<(), ValidationError> {
    for (slot, spec) in node.slots() {
        if slot == Slot::Field("") {
            return Err(ValidationError::EmptyFieldName {
                kind: node.kind.clone(),
            });
        }
        if spec.alternatives.is_empty() {
            return Err(ValidationError::EmptyAlternatives {
                kind: node.kind.clone(),
                slot: slot.to_string(),
            });
        }
        if spec.alternatives.iter().any(|alt| alt.name.is_empty()) {
            return Err(ValidationError::EmptyReference {
                kind: node.kind.clone(),
                slot: slot.to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parse_node_types;

    fn check(json: &str) -> Result<(), ValidationError> {
        validate(&parse_node_types(json).unwrap())
    }

    #[test]
    fn test_accepts_well_formed_schema() {
        let json = r#"[
            {"type": "expression", "named": true, "subtypes": [{"type": "identifier", "named": true}]},
            {"type": "identifier", "named": true},
            {"type": "identifier", "named": false},
            {
                "type": "call",
                "named": true,
                "fields": {
                    "function": {"multiple": false, "required": true, "types": [{"type": "expression", "named": true}]}
                }
            }
        ]"#;
        assert_eq!(check(json), Ok(()));
    }

    #[test]
    fn test_rejects_duplicate_kind() {
        let json = r#"[
            {"type": "identifier", "named": true},
            {"type": "identifier", "named": true}
        ]"#;
        assert_eq!(
            check(json),
            Err(ValidationError::DuplicateKind {
                kind: "identifier".to_string(),
                named: true,
            })
        );
    }

    #[test]
    fn test_rejects_empty_supertype() {
        let json = r#"[{"type": "expression", "named": true, "subtypes": []}]"#;
        let err = check(json).unwrap_err();
        assert_eq!(err.to_string(), "supertype 'expression' has no subtypes");
    }

    #[test]
    fn test_rejects_supertype_with_fields() {
        let json = r#"[{
            "type": "expression",
            "named": true,
            "subtypes": [{"type": "identifier", "named": true}],
            "children": {"multiple": false, "required": true, "types": [{"type": "identifier", "named": true}]}
        }]"#;
        assert!(matches!(
            check(json),
            Err(ValidationError::SupertypeWithFields { .. })
        ));
    }

    #[test]
    fn test_rejects_anonymous_supertype() {
        let json = r#"[{"type": "op", "named": false, "subtypes": [{"type": "+", "named": false}]}]"#;
        assert_eq!(
            check(json),
            Err(ValidationError::AnonymousSupertype {
                kind: "op".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_required_field_without_alternatives() {
        let json = r#"[{
            "type": "assignment",
            "named": true,
            "fields": {
                "left": {"multiple": false, "required": true, "types": []}
            }
        }]"#;
        let err = check(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'left' of kind 'assignment' allows no kinds"
        );
    }

    #[test]
    fn test_rejects_empty_field_name() {
        let json = r#"[{
            "type": "call",
            "named": true,
            "fields": {
                "": {"multiple": false, "required": true, "types": [{"type": "identifier", "named": true}]}
            }
        }]"#;
        assert_eq!(
            check(json),
            Err(ValidationError::EmptyFieldName {
                kind: "call".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_empty_reference() {
        let json = r#"[{
            "type": "call",
            "named": true,
            "fields": {
                "function": {"multiple": false, "required": true, "types": [{"type": "", "named": true}]}
            }
        }]"#;
        let err = check(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "field 'function' of kind 'call' references a kind with an empty name"
        );

        let json = r#"[{"type": "expression", "named": true, "subtypes": [{"type": "", "named": true}]}]"#;
        assert_eq!(
            check(json),
            Err(ValidationError::EmptyReference {
                kind: "expression".to_string(),
                slot: "subtypes".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_children_without_alternatives() {
        let json = r#"[{
            "type": "block",
            "named": true,
            "children": {"multiple": true, "required": false, "types": []}
        }]"#;
        assert_eq!(
            check(json),
            Err(ValidationError::EmptyAlternatives {
                kind: "block".to_string(),
                slot: "children".to_string(),
            })
        );
    }

    #[test]
    fn test_rejects_empty_kind_name() {
        let json = r#"[{"type": "ok", "named": true}, {"type": "", "named": false}]"#;
        assert_eq!(check(json), Err(ValidationError::EmptyKind { index: 1 }));
    }

    #[test]
    fn test_undeclared_references_are_not_errors() {
        let json = r#"[{
            "type": "as_pattern",
            "named": true,
            "fields": {
                "alias": {"multiple": false, "required": true, "types": [{"type": "as_pattern_target", "named": true}]}
            }
        }]"#;
        assert_eq!(check(json), Ok(()));
    }
}
