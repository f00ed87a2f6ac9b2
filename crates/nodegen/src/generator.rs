//! The end-to-end pipeline from `node-types.json` to generated source.

use crate::accessor::{DefinitionBuilder, Definitions};
use crate::emit::go::{reserved_names, DEFAULT_PACKAGE};
use crate::emit::{Backend, EmitError, GoBackend};
use crate::registry::{ResolveError, TypeRegistry};
use crate::schema::{parse_node_types, NodeSpec, SchemaError};
use crate::validate::{validate, ValidationError};

/// Options controlling a generator run.
#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    /// Package of the generated file. Defaults to `node_types`.
    pub package_name: Option<String>,
    /// Interleave explanatory comments with the generated code.
    pub debug: bool,
    /// Accessor names that would shadow operations of the wrapped node type.
    pub reserved_names: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            package_name: None,
            debug: false,
            reserved_names: reserved_names(),
        }
    }
}

/// Any failure of a generator run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The schema could not be decoded.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The schema was decoded but is structurally invalid.
    #[error("invalid schema: {0}")]
    Validation(#[from] ValidationError),

    /// Types could not be resolved.
    #[error("resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// Definitions could not be rendered.
    #[error("emission failed: {0}")]
    Emit(#[from] EmitError),
}

/// Generates typed Go accessors from a `node-types.json` document.
///
/// ```
/// use nodegen::{Generator, GeneratorOptions};
///
/// let json = r#"[{"type": "identifier", "named": true}]"#;
/// let source = Generator::new(GeneratorOptions::default()).generate(json).unwrap();
/// assert!(source.contains("type Identifier struct {"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    /// Creates a generator.
    #[must_use]
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Decodes, resolves, and renders a schema.
    ///
    /// # Errors
    ///
    /// Returns the first failure of any stage. Nothing is rendered unless every
    /// stage succeeds.
    pub fn generate(&self, json: &str) -> Result<String, GenerateError> {
        let nodes = parse_node_types(json)?;
        tracing::debug!(kinds = nodes.len(), "decoded schema");
        let defs = self.resolve(&nodes)?;

        let package = self
            .options
            .package_name
            .as_deref()
            .unwrap_or(DEFAULT_PACKAGE);
        let backend = GoBackend::new(package).with_debug(self.options.debug);
        backend.render(&defs).map_err(GenerateError::from)
    }

    /// Validates and resolves decoded nodes into definitions.
    ///
    /// # Errors
    ///
    /// Fails on invalid schemas and on resolution errors.
    pub fn resolve(&self, nodes: &[NodeSpec]) -> Result<Definitions, GenerateError> {
        validate(nodes)?;
        let registry = TypeRegistry::build(nodes)?;
        let defs = DefinitionBuilder::new(&registry, &self.options.reserved_names).build(nodes)?;
        Ok(defs)
    }
}
