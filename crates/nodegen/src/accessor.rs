//! Derivation of typed accessors from a frozen [`TypeRegistry`].
//!
//! The output is a flat, ordered [`Definitions`] value that a
//! [`Backend`](crate::emit::Backend) renders without consulting the registry
//! again.

use crate::ident::public_name;
use crate::registry::{constructor_name, flatten, ResolveError, SumType, TypeRegistry};
use crate::schema::{FieldSpec, KindRef, NodeSpec, Slot};
use std::collections::HashSet;

/// Prepended to an accessor name that collides with a reserved or taken name.
pub const COLLISION_PREFIX: &str = "Get";

/// How many times [`COLLISION_PREFIX`] may be prepended before giving up.
pub const MAX_PREFIX_ATTEMPTS: usize = 64;

/// Accessor name of a singular children slot.
pub const TYPED_CHILD: &str = "TypedChild";

/// Accessor name of a repeatable children slot.
pub const TYPED_CHILDREN: &str = "TypedChildren";

/// How many nodes an accessor returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly one node; absence is an error.
    Single,
    /// Zero or one node.
    OptionalSingle,
    /// Any number of nodes.
    Multiple,
}

impl Arity {
    /// The arity of a field or children slot.
    #[must_use]
    pub fn of(spec: &FieldSpec) -> Self {
        if spec.multiple {
            Arity::Multiple
        } else if spec.required {
            Arity::Single
        } else {
            Arity::OptionalSingle
        }
    }
}

/// What an accessor reads from the wrapped node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessorSource {
    /// The child (or children) under a named field.
    Field(String),
    /// All named children of the node.
    Children,
    /// The node itself, narrowed to one member of a sum type.
    Member(KindRef),
}

/// One generated accessor method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessorDef {
    /// Method name, unique within the owning type and free of reserved names.
    pub name: String,
    /// Generated name of the returned type.
    pub target_type_name: String,
    /// How many nodes the accessor returns.
    pub arity: Arity,
    /// Concrete kinds the returned node may have.
    ///
    /// Set for narrowing accessors and for slots with several alternatives;
    /// empty when the slot has a single alternative.
    pub narrowing_kinds: Vec<String>,
    /// What the accessor reads.
    pub source: AccessorSource,
}

/// The category of a generated type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefKind {
    /// Wraps one declared kind and has a validating constructor.
    Concrete {
        /// The wrapped kind.
        kind: String,
        /// Name of the constructor.
        constructor: String,
        /// Whether the kind may appear anywhere in the tree.
        extra: bool,
    },
    /// Stands for one of several kinds and carries narrowing accessors.
    Sum {
        /// Whether the type is a supertype, as opposed to a private field set.
        exported: bool,
        /// The supertype's kind, or the canonical key.
        label: String,
    },
    /// Stands for a referenced but undeclared kind.
    Placeholder {
        /// The referenced kind.
        kind: String,
    },
}

/// One generated type and its accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    /// The generated type name.
    pub name: String,
    /// The category of the type.
    pub kind: TypeDefKind,
    /// Accessors, in slot or member order.
    pub accessors: Vec<AccessorDef>,
}

/// A named constant holding the kind string of a declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindConstant {
    /// The generated type name the constant is derived from.
    pub type_name: String,
    /// The kind string.
    pub kind: String,
}

/// Everything a backend needs to render a package.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Definitions {
    /// Kind constants: concrete kinds in declaration order, then supertypes.
    pub kinds: Vec<KindConstant>,
    /// Types: concrete types in declaration order, then supertypes, private sum
    /// types and placeholders.
    pub types: Vec<TypeDef>,
}

impl Definitions {
    /// Looks up a type by generated name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.iter().find(|ty| ty.name == name)
    }
}

/// Derives [`Definitions`] from a frozen registry.
#[derive(Debug)]
pub struct DefinitionBuilder<'r> {
    registry: &'r TypeRegistry,
    reserved: HashSet<&'r str>,
}

impl<'r> DefinitionBuilder<'r> {
    /// Creates a builder that keeps accessor names clear of `reserved`.
    #[must_use]
    pub fn new(registry: &'r TypeRegistry, reserved: &'r [String]) -> Self {
        Self {
            registry,
            reserved: reserved.iter().map(String::as_str).collect(),
        }
    }

    /// Builds the definitions for the schema `registry` was built from.
    ///
    /// # Errors
    ///
    /// Fails if a reference does not resolve, if flattening finds a cycle, or
    /// if no collision-free accessor name can be found.
    pub fn build(&self, nodes: &[NodeSpec]) -> Result<Definitions, ResolveError> {
        let mut defs = Definitions::default();

        for node in nodes.iter().filter(|node| !node.is_supertype()) {
            let concrete = self
                .registry
                .concrete(&node.kind, node.named)
                .ok_or_else(|| ResolveError::MissingConcrete {
                    kind: node.kind.clone(),
                })?;
            defs.kinds.push(KindConstant {
                type_name: concrete.generated_name.clone(),
                kind: concrete.kind.clone(),
            });
            defs.types.push(TypeDef {
                name: concrete.generated_name.clone(),
                kind: TypeDefKind::Concrete {
                    kind: concrete.kind.clone(),
                    constructor: constructor_name(&concrete.generated_name),
                    extra: node.extra,
                },
                accessors: self.slot_accessors(&concrete.generated_name, node)?,
            });
        }

        for supertype in self.registry.supertypes() {
            defs.kinds.push(KindConstant {
                type_name: supertype.generated_name.clone(),
                kind: supertype.canonical_key.clone(),
            });
            defs.types.push(self.sum_def(supertype)?);
        }
        for sum in self.registry.sum_types() {
            defs.types.push(self.sum_def(sum)?);
        }
        for placeholder in self.registry.placeholders() {
            defs.types.push(TypeDef {
                name: placeholder.generated_name.clone(),
                kind: TypeDefKind::Placeholder {
                    kind: placeholder.kind.clone(),
                },
                accessors: Vec::new(),
            });
        }

        tracing::debug!(
            types = defs.types.len(),
            accessors = defs.types.iter().map(|ty| ty.accessors.len()).sum::<usize>(),
            "derived definitions"
        );
        Ok(defs)
    }

    fn slot_accessors(
        &self,
        owner: &str,
        node: &NodeSpec,
    ) -> Result<Vec<AccessorDef>, ResolveError> {
        let mut taken = HashSet::new();
        let mut accessors = Vec::new();

        for (slot, spec) in node.slots() {
            let target = self.registry.slot_target(spec)?;
            let narrowing_kinds = if spec.alternatives.len() > 1 {
                flatten(self.registry, target)?.into_iter().collect()
            } else {
                Vec::new()
            };
            let (base, source) = match slot {
                Slot::Field(name) => (public_name(name), AccessorSource::Field(name.to_string())),
                Slot::Children => {
                    let name = if spec.multiple { TYPED_CHILDREN } else { TYPED_CHILD };
                    (name.to_string(), AccessorSource::Children)
                }
            };

            accessors.push(AccessorDef {
                name: self.claim(owner, &base, &mut taken)?,
                target_type_name: target.generated_name().to_string(),
                arity: Arity::of(spec),
                narrowing_kinds,
                source,
            });
        }
        Ok(accessors)
    }

    fn sum_def(&self, sum: &SumType) -> Result<TypeDef, ResolveError> {
        let mut taken = HashSet::new();
        let mut accessors = Vec::with_capacity(sum.members.len());

        for member in &sum.members {
            let target = self
                .registry
                .resolve(member)
                .ok_or_else(|| ResolveError::Unresolved {
                    kind: member.clone(),
                })?;
            accessors.push(AccessorDef {
                name: self.claim(&sum.generated_name, &public_name(&member.name), &mut taken)?,
                target_type_name: target.generated_name().to_string(),
                arity: Arity::Single,
                narrowing_kinds: flatten(self.registry, target)?.into_iter().collect(),
                source: AccessorSource::Member(member.clone()),
            });
        }

        Ok(TypeDef {
            name: sum.generated_name.clone(),
            kind: TypeDefKind::Sum {
                exported: sum.is_exported(),
                label: sum.label().to_string(),
            },
            accessors,
        })
    }

    /// Picks a free accessor name on `owner`, prefixing [`COLLISION_PREFIX`]
    /// while the candidate is reserved or already taken.
    fn claim(
        &self,
        owner: &str,
        base: &str,
        taken: &mut HashSet<String>,
    ) -> Result<String, ResolveError> {
        let mut candidate = base.to_string();
        for _ in 0..MAX_PREFIX_ATTEMPTS {
            if !self.reserved.contains(candidate.as_str()) && !taken.contains(&candidate) {
                if candidate != base {
                    tracing::debug!(owner, base, name = %candidate, "accessor renamed to avoid a collision");
                }
                taken.insert(candidate.clone());
                return Ok(candidate);
            }
            candidate.insert_str(0, COLLISION_PREFIX);
        }
        Err(ResolveError::NameExhausted {
            owner: owner.to_string(),
            candidate: base.to_string(),
        })
    }
}
