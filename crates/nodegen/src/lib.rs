//! Typed node accessors for Tree-sitter grammars.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::multiple_crate_versions)]

/// Decoding of `node-types.json` into the node specification model.
///
/// This is the only module that knows the on-disk JSON shape. Everything
/// downstream works on [`NodeSpec`] and never sees raw entries.
pub mod schema;

/// Structural checks run on a decoded schema before resolution.
pub mod validate;

/// Conversion of kind names into target-language identifiers.
pub mod ident;

/// The type registry: which generated type every kind resolves to.
///
/// Resolution is where the design decisions live: canonical sum types,
/// placeholders for undeclared kinds, re-exported supertypes, and unique
/// generated names.
pub mod registry;

/// Accessor and definition derivation over a frozen registry.
pub mod accessor;

/// Rendering backends.
pub mod emit;

/// The end-to-end generator and its options.
pub mod generator;

pub use accessor::{AccessorDef, Arity, DefinitionBuilder, Definitions, TypeDef};
pub use emit::{Backend, EmitError, GoBackend};
pub use generator::{GenerateError, Generator, GeneratorOptions};
pub use registry::{ResolveError, ResolvedType, TypeRegistry};
pub use schema::{parse_node_types, FieldSpec, KindRef, NodeSpec, SchemaError};
pub use validate::{validate, ValidationError};
