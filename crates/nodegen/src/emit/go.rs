//! Go backend.
//!
//! Every generated type is a struct embedding `tree_sitter.Node` from
//! [go-tree-sitter](https://github.com/tree-sitter/go-tree-sitter), so the
//! full untyped node API stays available on each typed wrapper. Output is
//! already `gofmt`-clean.

use super::{check_references, Backend, EmitError};
use crate::accessor::{AccessorDef, AccessorSource, Arity, Definitions, TypeDef, TypeDefKind};
use crate::ident::is_keyword;
use std::fmt::Write;

/// Package name used when none is configured.
pub const DEFAULT_PACKAGE: &str = "node_types";

/// First line of every generated file.
pub const HEADER: &str = "// Code generated by nodegen. DO NOT EDIT.";

/// Import path of the go-tree-sitter bindings.
pub const TREE_SITTER_IMPORT: &str = "github.com/tree-sitter/go-tree-sitter";

/// Names already defined on every generated struct: the embedded `Node`
/// field and the methods it promotes.
pub const GO_NODE_METHODS: &[&str] = &[
    "Node",
    "ByteRange",
    "Child",
    "ChildByFieldId",
    "ChildByFieldName",
    "ChildCount",
    "ChildWithDescendant",
    "Children",
    "ChildrenByFieldName",
    "DescendantCount",
    "DescendantForByteRange",
    "DescendantForPointRange",
    "Edit",
    "EndByte",
    "EndPosition",
    "Equals",
    "FieldNameForChild",
    "FieldNameForNamedChild",
    "FirstChildForByte",
    "FirstNamedChildForByte",
    "GrammarId",
    "GrammarName",
    "HasChanges",
    "HasError",
    "Id",
    "IsError",
    "IsExtra",
    "IsMissing",
    "IsNamed",
    "Kind",
    "KindId",
    "Language",
    "NamedChild",
    "NamedChildCount",
    "NamedChildren",
    "NamedDescendantForByteRange",
    "NamedDescendantForPointRange",
    "NextNamedSibling",
    "NextParseState",
    "NextSibling",
    "Parent",
    "ParseState",
    "PrevNamedSibling",
    "PrevSibling",
    "Range",
    "StartByte",
    "StartPosition",
    "ToSexp",
    "Utf16Text",
    "Utf8Text",
    "Walk",
];

/// The reserved accessor names of the Go backend, owned.
#[must_use]
pub fn reserved_names() -> Vec<String> {
    GO_NODE_METHODS.iter().map(ToString::to_string).collect()
}

/// Renders definitions as a Go package.
#[derive(Debug, Clone)]
pub struct GoBackend {
    package: String,
    debug: bool,
}

impl Default for GoBackend {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGE)
    }
}

impl GoBackend {
    /// Creates a backend emitting into `package`.
    #[must_use]
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            debug: false,
        }
    }

    /// Interleaves explanatory comments with the generated code.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    fn check_package(&self) -> Result<(), EmitError> {
        let mut chars = self.package.chars();
        let valid = chars
            .next()
            .is_some_and(|c| c.is_alphabetic() || c == '_')
            && chars.all(|c| c.is_alphanumeric() || c == '_')
            && !is_keyword(&self.package);
        if valid {
            Ok(())
        } else {
            Err(EmitError::InvalidPackageName(self.package.clone()))
        }
    }
}

impl Backend for GoBackend {
    fn render(&self, defs: &Definitions) -> Result<String, EmitError> {
        self.check_package()?;
        check_references(defs)?;

        let mut w = GoWriter::default();
        w.line(HEADER)?;
        w.blank();
        w.line(&format!("package {}", self.package))?;
        write_imports(&mut w, defs)?;
        w.blank();
        write_kinds(&mut w, defs)?;

        let mut section = None;
        for ty in &defs.types {
            let title = section_title(&ty.kind);
            if self.debug && section != Some(title) {
                w.blank();
                w.line(&format!("// {title}"))?;
                section = Some(title);
            }
            w.blank();
            self.write_type(&mut w, ty)?;
        }
        Ok(w.finish())
    }
}

impl GoBackend {
    fn write_type(&self, w: &mut GoWriter, ty: &TypeDef) -> Result<(), EmitError> {
        if self.debug {
            match &ty.kind {
                TypeDefKind::Concrete { kind, extra, .. } => {
                    w.line(&format!("// Kind: {}", go_quote(kind)))?;
                    if *extra {
                        w.line("// Extra: may appear anywhere in the tree")?;
                    }
                }
                TypeDefKind::Sum { label, .. } => w.line(&format!("// Sum of: {label}"))?,
                TypeDefKind::Placeholder { kind } => {
                    w.line(&format!("// Undeclared kind: {}", go_quote(kind)))?;
                }
            }
        }
        w.open(&format!("type {} struct {{", ty.name))?;
        w.line("tree_sitter.Node")?;
        w.close("}")?;

        if ty.accessors.is_empty() && !matches!(ty.kind, TypeDefKind::Concrete { .. }) {
            return Ok(());
        }
        w.blank();

        let receiver = receiver_name(&ty.name);
        for accessor in &ty.accessors {
            if self.debug && !accessor.narrowing_kinds.is_empty() {
                w.line(&format!(
                    "// Possible kinds: {}",
                    accessor.narrowing_kinds.join(", ")
                ))?;
            }
            match (&accessor.source, accessor.arity) {
                (AccessorSource::Field(field), Arity::Single) => {
                    write_field_single(w, &receiver, ty, accessor, field)?;
                }
                (AccessorSource::Field(field), Arity::OptionalSingle) => {
                    write_field_optional(w, &receiver, ty, accessor, field)?;
                }
                (AccessorSource::Field(field), Arity::Multiple) => {
                    write_field_multiple(w, &receiver, ty, accessor, field)?;
                }
                (AccessorSource::Children, Arity::Multiple) => {
                    write_typed_children(w, &receiver, ty, accessor)?;
                }
                (AccessorSource::Children, _) => {
                    write_typed_child(w, &receiver, ty, accessor, concrete_kind(ty))?;
                }
                (AccessorSource::Member(_), _) => write_narrowing(w, &receiver, ty, accessor)?,
            }
        }

        if let TypeDefKind::Concrete { kind, constructor, .. } = &ty.kind {
            write_constructor(w, &ty.name, kind, constructor)?;
        }
        Ok(())
    }
}

fn section_title(kind: &TypeDefKind) -> &'static str {
    match kind {
        TypeDefKind::Concrete { .. } => "Node types",
        TypeDefKind::Sum { exported: true, .. } => "Supertypes",
        TypeDefKind::Sum { exported: false, .. } => "Field sum types",
        TypeDefKind::Placeholder { .. } => "Undeclared node types",
    }
}

fn write_imports(w: &mut GoWriter, defs: &Definitions) -> Result<(), EmitError> {
    if defs.types.is_empty() {
        return Ok(());
    }
    let has_sum_accessors = defs
        .types
        .iter()
        .any(|ty| matches!(ty.kind, TypeDefKind::Sum { .. }) && !ty.accessors.is_empty());
    let needs_fmt = has_sum_accessors
        || defs
            .types
            .iter()
            .any(|ty| matches!(ty.kind, TypeDefKind::Concrete { .. }));

    w.blank();
    w.open("import (")?;
    if needs_fmt {
        w.line("\"fmt\"")?;
    }
    if has_sum_accessors {
        w.line("\"slices\"")?;
    }
    if needs_fmt || has_sum_accessors {
        w.blank();
    }
    w.line(&format!("tree_sitter \"{TREE_SITTER_IMPORT}\""))?;
    w.close(")")
}

fn write_kinds(w: &mut GoWriter, defs: &Definitions) -> Result<(), EmitError> {
    w.line("type SyntaxKind = string")?;
    if defs.kinds.is_empty() {
        return Ok(());
    }

    let names: Vec<String> = defs
        .kinds
        .iter()
        .map(|constant| format!("SyntaxKind_{}", constant.type_name))
        .collect();
    let width = names.iter().map(|name| name.chars().count()).max().unwrap_or(0);

    w.blank();
    w.open("var (")?;
    for (name, constant) in names.iter().zip(&defs.kinds) {
        w.line(&format!(
            "{name:<width$} SyntaxKind = {}",
            go_quote(&constant.kind)
        ))?;
    }
    w.close(")")
}

fn write_field_single(
    w: &mut GoWriter,
    receiver: &str,
    ty: &TypeDef,
    accessor: &AccessorDef,
    field: &str,
) -> Result<(), EmitError> {
    let target = &accessor.target_type_name;
    w.open(&format!(
        "func ({receiver} *{}) {}() (*{target}, error) {{",
        ty.name, accessor.name
    ))?;
    w.line(&format!(
        "child := {receiver}.Node.ChildByFieldName({})",
        go_quote(field)
    ))?;
    w.open("if child == nil {")?;
    w.line(&format!(
        "return nil, fmt.Errorf(\"node of kind %s has no child of name %s\", {}, {})",
        go_quote(concrete_kind(ty)),
        go_quote(field)
    ))?;
    w.close("}")?;
    w.line(&format!("return &{target}{{Node: *child}}, nil"))?;
    w.close("}")
}

fn write_field_optional(
    w: &mut GoWriter,
    receiver: &str,
    ty: &TypeDef,
    accessor: &AccessorDef,
    field: &str,
) -> Result<(), EmitError> {
    let target = &accessor.target_type_name;
    w.open(&format!(
        "func ({receiver} *{}) {}() *{target} {{",
        ty.name, accessor.name
    ))?;
    w.line(&format!(
        "child := {receiver}.Node.ChildByFieldName({})",
        go_quote(field)
    ))?;
    w.open("if child == nil {")?;
    w.line("return nil")?;
    w.close("}")?;
    w.line(&format!("return &{target}{{Node: *child}}"))?;
    w.close("}")
}

fn write_field_multiple(
    w: &mut GoWriter,
    receiver: &str,
    ty: &TypeDef,
    accessor: &AccessorDef,
    field: &str,
) -> Result<(), EmitError> {
    let target = &accessor.target_type_name;
    w.open(&format!(
        "func ({receiver} *{}) {}(cursor *tree_sitter.TreeCursor) []*{target} {{",
        ty.name, accessor.name
    ))?;
    w.line(&format!(
        "children := {receiver}.Node.ChildrenByFieldName({}, cursor)",
        go_quote(field)
    ))?;
    w.line(&format!("output := make([]*{target}, 0, len(children))"))?;
    w.open("for _, child := range children {")?;
    w.line(&format!("output = append(output, &{target}{{Node: child}})"))?;
    w.close("}")?;
    w.line("return output")?;
    w.close("}")
}

fn write_named_children(
    w: &mut GoWriter,
    receiver: &str,
    target: &str,
) -> Result<(), EmitError> {
    w.line(&format!("children := {receiver}.Node.Children(cursor)"))?;
    w.line(&format!("output := []{target}{{}}"))?;
    w.open("for _, child := range children {")?;
    w.open("if child.IsNamed() {")?;
    w.line(&format!("output = append(output, {target}{{Node: child}})"))?;
    w.close("}")?;
    w.close("}")
}

fn write_typed_children(
    w: &mut GoWriter,
    receiver: &str,
    ty: &TypeDef,
    accessor: &AccessorDef,
) -> Result<(), EmitError> {
    let target = &accessor.target_type_name;
    w.open(&format!(
        "func ({receiver} *{}) {}(cursor *tree_sitter.TreeCursor) []{target} {{",
        ty.name, accessor.name
    ))?;
    write_named_children(w, receiver, target)?;
    w.line("return output")?;
    w.close("}")
}

fn write_typed_child(
    w: &mut GoWriter,
    receiver: &str,
    ty: &TypeDef,
    accessor: &AccessorDef,
    kind: &str,
) -> Result<(), EmitError> {
    let target = &accessor.target_type_name;
    w.open(&format!(
        "func ({receiver} *{}) {}(cursor *tree_sitter.TreeCursor) ({target}, error) {{",
        ty.name, accessor.name
    ))?;
    write_named_children(w, receiver, target)?;
    w.open("if len(output) == 0 {")?;
    w.line(&format!(
        "return {target}{{}}, fmt.Errorf(\"no named children found on node of kind %s\", {})",
        go_quote(kind)
    ))?;
    w.close("}")?;
    w.line("return output[0], nil")?;
    w.close("}")
}

fn write_narrowing(
    w: &mut GoWriter,
    receiver: &str,
    ty: &TypeDef,
    accessor: &AccessorDef,
) -> Result<(), EmitError> {
    let target = &accessor.target_type_name;
    let kinds: Vec<String> = accessor
        .narrowing_kinds
        .iter()
        .map(String::as_str)
        .map(go_quote)
        .collect();

    w.open(&format!(
        "func ({receiver} *{}) {}() (*{target}, error) {{",
        ty.name, accessor.name
    ))?;
    w.line(&format!("kinds := []string{{{}}}", kinds.join(", ")))?;
    w.open(&format!(
        "if !slices.Contains(kinds, {receiver}.Node.Kind()) {{"
    ))?;
    w.line(&format!(
        "return nil, fmt.Errorf(\"kind %s not in %v\", {receiver}.Node.Kind(), kinds)"
    ))?;
    w.close("}")?;
    w.line(&format!("return &{target}{{Node: {receiver}.Node}}, nil"))?;
    w.close("}")
}

fn write_constructor(
    w: &mut GoWriter,
    name: &str,
    kind: &str,
    constructor: &str,
) -> Result<(), EmitError> {
    let kind = go_quote(kind);
    w.open(&format!(
        "func {constructor}(node *tree_sitter.Node) (*{name}, error) {{"
    ))?;
    w.open(&format!("if node.Kind() != {kind} {{"))?;
    w.line(&format!(
        "return nil, fmt.Errorf(\"expected kind %s, got %s\", {kind}, node.Kind())"
    ))?;
    w.close("}")?;
    w.line(&format!("return &{name}{{Node: *node}}, nil"))?;
    w.close("}")
}

fn concrete_kind(ty: &TypeDef) -> &str {
    match &ty.kind {
        TypeDefKind::Concrete { kind, .. } | TypeDefKind::Placeholder { kind } => kind,
        TypeDefKind::Sum { label, .. } => label,
    }
}

/// The method receiver for a type: its first letter, lowercased.
fn receiver_name(type_name: &str) -> String {
    type_name
        .chars()
        .next()
        .map_or_else(|| "n".to_string(), |c| c.to_lowercase().collect())
}

/// Quotes `s` as an interpreted Go string literal.
#[must_use]
pub fn go_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Line-oriented output buffer with tab indentation.
#[derive(Debug, Default)]
struct GoWriter {
    buffer: String,
    indent: usize,
}

impl GoWriter {
    fn line(&mut self, text: &str) -> Result<(), EmitError> {
        for _ in 0..self.indent {
            self.buffer.push('\t');
        }
        writeln!(self.buffer, "{text}")?;
        Ok(())
    }

    fn blank(&mut self) {
        if !self.buffer.ends_with("\n\n") {
            self.buffer.push('\n');
        }
    }

    fn open(&mut self, text: &str) -> Result<(), EmitError> {
        self.line(text)?;
        self.indent += 1;
        Ok(())
    }

    fn close(&mut self, text: &str) -> Result<(), EmitError> {
        self.indent = self.indent.saturating_sub(1);
        self.line(text)
    }

    fn finish(self) -> String {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::DefinitionBuilder;
    use crate::registry::TypeRegistry;
    use crate::schema::parse_node_types;

    fn render(json: &str, backend: &GoBackend) -> String {
        let nodes = parse_node_types(json).unwrap();
        let registry = TypeRegistry::build(&nodes).unwrap();
        let reserved = reserved_names();
        let defs = DefinitionBuilder::new(&registry, &reserved)
            .build(&nodes)
            .unwrap();
        backend.render(&defs).unwrap()
    }

    const SCHEMA: &str = r#"[
        {
            "type": "expression",
            "named": true,
            "subtypes": [{"type": "call", "named": true}, {"type": "identifier", "named": true}]
        },
        {
            "type": "call",
            "named": true,
            "fields": {
                "function": {"multiple": false, "required": true, "types": [{"type": "identifier", "named": true}]},
                "arguments": {"multiple": true, "required": false, "types": [{"type": "expression", "named": true}]},
                "kind": {"multiple": false, "required": false, "types": [{"type": "identifier", "named": true}]}
            }
        },
        {"type": "identifier", "named": true}
    ]"#;

    #[test]
    fn test_header_package_and_imports() {
        let out = render(SCHEMA, &GoBackend::new("python"));
        assert!(out.starts_with(&format!("{HEADER}\n\npackage python\n\nimport (\n")));
        assert!(out.contains("\t\"fmt\"\n\t\"slices\"\n\n\ttree_sitter \"github.com/tree-sitter/go-tree-sitter\"\n)"));
    }

    #[test]
    fn test_syntax_kinds_are_aligned() {
        let out = render(SCHEMA, &GoBackend::default());
        assert!(out.contains("type SyntaxKind = string\n"));
        assert!(out.contains("\tSyntaxKind_Call       SyntaxKind = \"call\"\n"));
        assert!(out.contains("\tSyntaxKind_Identifier SyntaxKind = \"identifier\"\n"));
        assert!(out.contains("\tSyntaxKind_Expression SyntaxKind = \"expression\"\n"));
    }

    #[test]
    fn test_field_accessor_shapes() {
        let out = render(SCHEMA, &GoBackend::default());
        assert!(out.contains("func (c *Call) Function() (*Identifier, error) {\n"));
        assert!(out.contains("func (c *Call) Arguments(cursor *tree_sitter.TreeCursor) []*Expression {\n"));
        assert!(out.contains("\tchildren := c.Node.ChildrenByFieldName(\"arguments\", cursor)\n"));
        assert!(out.contains("func (c *Call) GetKind() *Identifier {\n"));
    }

    #[test]
    fn test_constructor() {
        let out = render(SCHEMA, &GoBackend::default());
        let expected = "func NewCall(node *tree_sitter.Node) (*Call, error) {
\tif node.Kind() != \"call\" {
\t\treturn nil, fmt.Errorf(\"expected kind %s, got %s\", \"call\", node.Kind())
\t}
\treturn &Call{Node: *node}, nil
}
";
        assert!(out.contains(expected));
    }

    #[test]
    fn test_narrowing_accessor() {
        let out = render(SCHEMA, &GoBackend::default());
        let expected = "func (e *Expression) Call() (*Call, error) {
\tkinds := []string{\"call\"}
\tif !slices.Contains(kinds, e.Node.Kind()) {
\t\treturn nil, fmt.Errorf(\"kind %s not in %v\", e.Node.Kind(), kinds)
\t}
\treturn &Call{Node: e.Node}, nil
}
";
        assert!(out.contains(expected));
    }

    #[test]
    fn test_typed_child_reports_missing_children() {
        let out = render(
            r#"[
                {
                    "type": "await",
                    "named": true,
                    "children": {"multiple": false, "required": true, "types": [{"type": "identifier", "named": true}]}
                },
                {"type": "identifier", "named": true}
            ]"#,
            &GoBackend::default(),
        );
        assert!(out.contains("func (a *Await) TypedChild(cursor *tree_sitter.TreeCursor) (Identifier, error) {\n"));
        assert!(out.contains("return Identifier{}, fmt.Errorf(\"no named children found on node of kind %s\", \"await\")"));
        assert!(!out.contains("\"slices\""));
    }

    #[test]
    fn test_placeholder_is_empty_struct() {
        let out = render(
            r#"[{
                "type": "as_pattern",
                "named": true,
                "fields": {
                    "alias": {"multiple": false, "required": true, "types": [{"type": "as_pattern_target", "named": true}]}
                }
            }]"#,
            &GoBackend::default(),
        );
        assert!(out.ends_with("type Unknown__asPatternTarget struct {\n\ttree_sitter.Node\n}\n"));
    }

    #[test]
    fn test_debug_comments() {
        let plain = render(SCHEMA, &GoBackend::default());
        let debug = render(SCHEMA, &GoBackend::default().with_debug(true));
        assert!(!plain.contains("// Supertypes"));
        assert!(debug.contains("// Supertypes\n"));
        assert!(debug.contains("// Kind: \"call\"\n"));
        assert!(debug.contains("// Possible kinds: call\n"));
    }

    #[test]
    fn test_debug_marks_extra_kinds() {
        let json = r#"[
            {"type": "comment", "named": true, "extra": true},
            {"type": "identifier", "named": true}
        ]"#;
        let debug = render(json, &GoBackend::default().with_debug(true));
        assert!(debug.contains("// Kind: \"comment\"\n// Extra: may appear anywhere in the tree\n"));
        assert_eq!(debug.matches("// Extra:").count(), 1);

        let plain = render(json, &GoBackend::default());
        assert!(!plain.contains("// Extra:"));
    }

    #[test]
    fn test_quoting() {
        assert_eq!(go_quote("\\"), "\"\\\\\"");
        assert_eq!(go_quote("\""), "\"\\\"\"");
        assert_eq!(go_quote("\n"), "\"\\n\"");
        assert_eq!(go_quote("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_invalid_package_name() {
        let defs = Definitions::default();
        for package in ["", "1abc", "my-pkg", "func"] {
            let err = GoBackend::new(package).render(&defs).unwrap_err();
            assert!(matches!(err, EmitError::InvalidPackageName(_)), "{package}");
        }
    }

    #[test]
    fn test_empty_definitions() {
        let out = GoBackend::default().render(&Definitions::default()).unwrap();
        assert_eq!(
            out,
            format!("{HEADER}\n\npackage node_types\n\ntype SyntaxKind = string\n")
        );
    }
}
