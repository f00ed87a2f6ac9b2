//! Rendering of resolved [`Definitions`] into source text.
//!
//! A [`Backend`] owns everything target-specific: syntax, imports, and the
//! operations its runtime node type already defines. The definitions it
//! receives are final, so rendering never changes what gets generated, only
//! how it is spelled.

use crate::accessor::Definitions;
use std::collections::HashSet;

/// Go source generation against go-tree-sitter.
pub mod go;

pub use go::GoBackend;

/// Errors raised while rendering definitions.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// Writing into the output buffer failed.
    #[error("formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// The configured package name is not a valid identifier.
    #[error("invalid package name '{0}'")]
    InvalidPackageName(String),

    /// An accessor returns a type that is not among the definitions.
    #[error("type '{owner}' refers to undefined type '{target}'")]
    DanglingReference {
        /// The type owning the accessor.
        owner: String,
        /// The missing type.
        target: String,
    },
}

/// Renders definitions into the source of one target language.
pub trait Backend {
    /// Renders a complete source file.
    ///
    /// # Errors
    ///
    /// Returns an [`EmitError`] if the definitions cannot be rendered. No
    /// partial output is returned.
    fn render(&self, defs: &Definitions) -> Result<String, EmitError>;
}

/// Checks that every accessor returns a defined type.
///
/// # Errors
///
/// Returns [`EmitError::DanglingReference`] for the first accessor whose
/// target is missing.
pub fn check_references(defs: &Definitions) -> Result<(), EmitError> {
    let defined: HashSet<&str> = defs.types.iter().map(|ty| ty.name.as_str()).collect();
    for ty in &defs.types {
        for accessor in &ty.accessors {
            if !defined.contains(accessor.target_type_name.as_str()) {
                return Err(EmitError::DanglingReference {
                    owner: ty.name.clone(),
                    target: accessor.target_type_name.clone(),
                });
            }
        }
    }
    Ok(())
}
