//! Resolution of schema kinds into generated type identities.
//!
//! The [`TypeRegistry`] maps every kind the schema mentions to exactly one
//! generated type. It is built in two passes over the schema and frozen
//! afterwards:
//!
//! 1. **Declaration scan.** Supertypes become exported sum types named after
//!    their kind; every other kind becomes a concrete type. Fields that allow
//!    several kinds register a private sum type under the set's canonical key,
//!    so identical sets collapse onto one type no matter where they appear.
//! 2. **Reference closure.** Every referenced kind that was never declared is
//!    registered as a placeholder. Schemas are not always self-describing, and
//!    a missing declaration should not stop generation.
//!
//! Freezing then re-exports private sum types that duplicate a supertype,
//! rejects cyclic supertypes, and checks that every reference resolves.
//!
//! All maps preserve insertion order, which is declaration order, so two runs
//! over the same schema produce the same definitions in the same order.

use crate::ident::{private_name, public_name};
use crate::schema::{FieldSpec, KindRef, NodeSpec};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Canonical keys for sets of alternative kinds.
pub mod canonical;

/// Flattening of sum types into concrete leaf kinds, and cycle detection.
pub mod flatten;

mod names;

pub use canonical::CanonicalSet;
pub use flatten::{check_acyclic, flatten};
pub use names::constructor_name;

use names::NameTable;

/// Prefix of generated names for anonymous kinds.
pub const UNNAMED_PREFIX: &str = "Unnamed_";

/// Prefix of generated names for placeholder types.
pub const PLACEHOLDER_PREFIX: &str = "Unknown__";

/// A type generated for a declared, non-supertype kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteType {
    /// The node kind the type wraps.
    pub kind: String,
    /// The generated type name.
    pub generated_name: String,
    /// Whether the kind is named.
    pub named: bool,
}

/// Where a sum type came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SumOrigin {
    /// A supertype declared in the schema. Always exported.
    Supertype(String),
    /// The alternative set of one or more fields. Private.
    Field,
}

/// A type standing for "one of several kinds".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SumType {
    /// The supertype's kind, or the canonical key of a field set.
    pub canonical_key: String,
    /// The generated type name.
    pub generated_name: String,
    /// Member kinds: declaration order for supertypes, canonical order for
    /// field sets.
    pub members: Vec<KindRef>,
    /// Where the sum type came from.
    pub origin: SumOrigin,
}

impl SumType {
    /// Returns `true` for supertypes, which are part of the public API.
    #[must_use]
    pub fn is_exported(&self) -> bool {
        matches!(self.origin, SumOrigin::Supertype(_))
    }

    /// A human-readable label: the supertype kind or the canonical key.
    #[must_use]
    pub fn label(&self) -> &str {
        match &self.origin {
            SumOrigin::Supertype(kind) => kind,
            SumOrigin::Field => &self.canonical_key,
        }
    }
}

/// A stand-in for a kind that is referenced but never declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderType {
    /// The referenced kind.
    pub kind: String,
    /// The generated type name.
    pub generated_name: String,
}

/// What a kind reference resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedType<'r> {
    /// A declared concrete kind.
    Concrete(&'r ConcreteType),
    /// A supertype or field sum type.
    Sum(&'r SumType),
    /// An undeclared kind.
    Placeholder(&'r PlaceholderType),
}

impl<'r> ResolvedType<'r> {
    /// The generated type name.
    #[must_use]
    pub fn generated_name(&self) -> &'r str {
        match *self {
            ResolvedType::Concrete(concrete) => &concrete.generated_name,
            ResolvedType::Sum(sum) => &sum.generated_name,
            ResolvedType::Placeholder(placeholder) => &placeholder.generated_name,
        }
    }
}

/// Errors raised while resolving a schema into types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A sum type was requested for fewer than two distinct kinds.
    #[error("a sum type needs at least 2 distinct alternatives, got {count}")]
    SumArity {
        /// Number of distinct alternatives supplied.
        count: usize,
    },

    /// A supertype (indirectly) lists itself as a subtype.
    #[error("cyclic type reference: {}", .path.join(" -> "))]
    CyclicReference {
        /// The supertypes along the cycle, first and last equal.
        path: Vec<String>,
    },

    /// Disambiguation could not find a free identifier.
    #[error("could not find a free name for '{candidate}' in {owner}")]
    NameExhausted {
        /// The scope the name was allocated in.
        owner: String,
        /// The name that kept colliding.
        candidate: String,
    },

    /// A kind reference resolved to nothing after the closure pass.
    #[error("reference to {kind} did not resolve to any type")]
    Unresolved {
        /// The dangling reference.
        kind: KindRef,
    },

    /// No sum type exists for a set of alternatives.
    #[error("no sum type registered for alternatives '{key}'")]
    MissingSumType {
        /// Canonical key of the set.
        key: String,
    },

    /// A declared kind has no concrete type.
    #[error("kind '{kind}' has no registered concrete type")]
    MissingConcrete {
        /// The declared kind.
        kind: String,
    },
}

/// Maps schema kinds to generated types.
///
/// Built once by [`TypeRegistry::build`] and read-only afterwards.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    named: IndexMap<String, ConcreteType>,
    unnamed: IndexMap<String, ConcreteType>,
    supertypes: IndexMap<String, SumType>,
    sum_types: IndexMap<String, SumType>,
    placeholders: IndexMap<String, PlaceholderType>,

    /// Canonical member list of each field sum type, to its key.
    sum_index: HashMap<Vec<KindRef>, String>,
    /// Canonical member list of a supertype, to the supertype's kind.
    reexports: HashMap<Vec<KindRef>, String>,
    names: NameTable,
}

impl TypeRegistry {
    /// Resolves a validated schema.
    ///
    /// # Errors
    ///
    /// Fails on cyclic supertypes, on sum type requests with fewer than two
    /// kinds, and if disambiguating generated names runs out of candidates.
    pub fn build(nodes: &[NodeSpec]) -> Result<Self, ResolveError> {
        let mut registry = Self::default();

        for node in nodes {
            registry.declare(node)?;
        }
        for node in nodes {
            registry.close_references(node)?;
        }

        registry.freeze(nodes)?;
        tracing::debug!(
            named = registry.named.len(),
            unnamed = registry.unnamed.len(),
            supertypes = registry.supertypes.len(),
            sum_types = registry.sum_types.len(),
            placeholders = registry.placeholders.len(),
            "type registry frozen"
        );
        Ok(registry)
    }

    fn declare(&mut self, node: &NodeSpec) -> Result<(), ResolveError> {
        if let Some(subtypes) = &node.subtypes {
            let name = self.names.allocate(&public_name(&node.kind))?;
            tracing::debug!(kind = %node.kind, %name, "registered supertype");
            self.supertypes.insert(
                node.kind.clone(),
                SumType {
                    canonical_key: node.kind.clone(),
                    generated_name: name,
                    members: subtypes.clone(),
                    origin: SumOrigin::Supertype(node.kind.clone()),
                },
            );
            return Ok(());
        }

        let base = if node.named {
            public_name(&node.kind)
        } else {
            format!("{UNNAMED_PREFIX}{}", public_name(&node.kind))
        };
        let concrete = ConcreteType {
            kind: node.kind.clone(),
            generated_name: self.names.allocate(&base)?,
            named: node.named,
        };
        let map = if node.named {
            &mut self.named
        } else {
            &mut self.unnamed
        };
        map.insert(node.kind.clone(), concrete);

        for (_, spec) in node.slots() {
            if spec.alternatives.len() > 1 {
                self.register_field_sum(&spec.alternatives)?;
            }
        }
        Ok(())
    }

    fn register_field_sum(&mut self, alternatives: &[KindRef]) -> Result<(), ResolveError> {
        let set = CanonicalSet::new(alternatives)?;
        if self.sum_index.contains_key(set.members()) {
            return Ok(());
        }

        let name = self.names.allocate(set.key())?;
        tracing::debug!(%name, members = set.members().len(), "registered field sum type");
        self.sum_index.insert(set.members().to_vec(), name.clone());
        self.sum_types.insert(
            name.clone(),
            SumType {
                canonical_key: name.clone(),
                generated_name: name,
                members: set.into_members(),
                origin: SumOrigin::Field,
            },
        );
        Ok(())
    }

    fn close_references(&mut self, node: &NodeSpec) -> Result<(), ResolveError> {
        let references = node
            .slots()
            .flat_map(|(_, spec)| spec.alternatives.iter())
            .chain(node.subtypes.iter().flatten());

        for kind in references {
            if self.resolve(kind).is_none() {
                self.register_placeholder(&kind.name)?;
            }
        }
        Ok(())
    }

    fn register_placeholder(&mut self, kind: &str) -> Result<(), ResolveError> {
        if self.placeholders.contains_key(kind) {
            return Ok(());
        }
        let name = self
            .names
            .allocate(&format!("{PLACEHOLDER_PREFIX}{}", private_name(kind)))?;
        tracing::debug!(kind, %name, "kind is referenced but never declared, using a placeholder");
        self.placeholders.insert(
            kind.to_string(),
            PlaceholderType {
                kind: kind.to_string(),
                generated_name: name,
            },
        );
        Ok(())
    }

    fn freeze(&mut self, nodes: &[NodeSpec]) -> Result<(), ResolveError> {
        for supertype in self.supertypes.values() {
            let Ok(set) = CanonicalSet::new(&supertype.members) else {
                continue;
            };
            self.reexports
                .entry(set.into_members())
                .or_insert_with(|| supertype.canonical_key.clone());
        }

        let reexports = &self.reexports;
        self.sum_types.retain(|_, sum| {
            let duplicate = reexports.contains_key(&sum.members);
            if duplicate {
                tracing::debug!(name = %sum.generated_name, "field sum type re-exported as a supertype");
            }
            !duplicate
        });
        self.sum_index
            .retain(|members, _| !reexports.contains_key(members));

        check_acyclic(self)?;

        for node in nodes {
            for (_, spec) in node.slots() {
                self.slot_target(spec)?;
            }
            for subtype in node.subtypes.iter().flatten() {
                self.resolve(subtype)
                    .ok_or_else(|| ResolveError::Unresolved {
                        kind: subtype.clone(),
                    })?;
            }
        }
        Ok(())
    }

    /// Resolves a kind reference.
    ///
    /// Named references match named concrete kinds and supertypes; anonymous
    /// references match anonymous concrete kinds. Either falls back to a
    /// placeholder.
    #[must_use]
    pub fn resolve(&self, kind: &KindRef) -> Option<ResolvedType<'_>> {
        if kind.named {
            if let Some(concrete) = self.named.get(&kind.name) {
                return Some(ResolvedType::Concrete(concrete));
            }
            if let Some(supertype) = self.supertypes.get(&kind.name) {
                return Some(ResolvedType::Sum(supertype));
            }
        } else if let Some(concrete) = self.unnamed.get(&kind.name) {
            return Some(ResolvedType::Concrete(concrete));
        }
        self.placeholders
            .get(&kind.name)
            .map(ResolvedType::Placeholder)
    }

    /// Resolves the type a field or children slot holds.
    ///
    /// A single alternative resolves directly. Several alternatives resolve to
    /// the supertype with the same member set if there is one, and to the
    /// canonical field sum type otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is empty or anything fails to resolve.
    pub fn slot_target(&self, spec: &FieldSpec) -> Result<ResolvedType<'_>, ResolveError> {
        match spec.alternatives.as_slice() {
            [] => Err(ResolveError::SumArity { count: 0 }),
            [single] => self.resolve(single).ok_or_else(|| ResolveError::Unresolved {
                kind: single.clone(),
            }),
            alternatives => {
                let set = CanonicalSet::new(alternatives)?;
                if let Some(supertype) = self
                    .reexports
                    .get(set.members())
                    .and_then(|kind| self.supertypes.get(kind))
                {
                    return Ok(ResolvedType::Sum(supertype));
                }
                self.sum_index
                    .get(set.members())
                    .and_then(|name| self.sum_types.get(name))
                    .map(ResolvedType::Sum)
                    .ok_or_else(|| ResolveError::MissingSumType {
                        key: set.key().to_string(),
                    })
            }
        }
    }

    /// Looks up the concrete type of a declared kind.
    #[must_use]
    pub fn concrete(&self, kind: &str, named: bool) -> Option<&ConcreteType> {
        if named {
            self.named.get(kind)
        } else {
            self.unnamed.get(kind)
        }
    }

    /// Named concrete types, in declaration order.
    pub fn named_concretes(&self) -> impl Iterator<Item = &ConcreteType> {
        self.named.values()
    }

    /// Anonymous concrete types, in declaration order.
    pub fn unnamed_concretes(&self) -> impl Iterator<Item = &ConcreteType> {
        self.unnamed.values()
    }

    /// Supertypes, in declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &SumType> {
        self.supertypes.values()
    }

    /// Private field sum types, in first-use order.
    pub fn sum_types(&self) -> impl Iterator<Item = &SumType> {
        self.sum_types.values()
    }

    /// Placeholder types, in first-reference order.
    pub fn placeholders(&self) -> impl Iterator<Item = &PlaceholderType> {
        self.placeholders.values()
    }

    /// Total number of generated types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.named.len()
            + self.unnamed.len()
            + self.supertypes.len()
            + self.sum_types.len()
            + self.placeholders.len()
    }

    /// Returns `true` if the registry holds no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
