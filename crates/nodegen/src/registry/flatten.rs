//! Flattening of sum types into the concrete kinds they can hold at runtime.
//!
//! A parsed node only ever carries a concrete kind tag, so narrowing a sum
//! type down to one of its members means checking the tag against every leaf
//! kind that member stands for. Supertypes nest (`expression` contains
//! `primary_expression`), so the leaf set is computed transitively.

use super::{ResolveError, ResolvedType, SumType, TypeRegistry};
use indexmap::IndexSet;
use std::collections::{HashSet, VecDeque};

/// Computes the concrete leaf kinds reachable from `root`.
///
/// Leaves are collected breadth-first, in member order, without duplicates. A
/// concrete type or placeholder is its own single leaf. Nested sum types are
/// expanded, never reported.
///
/// # Errors
///
/// Returns [`ResolveError::CyclicReference`] if a supertype reachable from
/// `root` (indirectly) lists itself, and [`ResolveError::Unresolved`] if a
/// member is missing from the registry.
pub fn flatten(
    registry: &TypeRegistry,
    root: ResolvedType<'_>,
) -> Result<IndexSet<String>, ResolveError> {
    if let ResolvedType::Sum(sum) = root {
        visit(registry, sum, &mut Vec::new(), &mut HashSet::new())?;
    }

    let mut leaves = IndexSet::new();
    let mut expanded = HashSet::new();
    let mut queue = VecDeque::from([root]);

    while let Some(ty) = queue.pop_front() {
        match ty {
            ResolvedType::Sum(sum) => {
                if !expanded.insert(sum.generated_name.as_str()) {
                    continue;
                }
                for member in &sum.members {
                    let resolved = registry
                        .resolve(member)
                        .ok_or_else(|| ResolveError::Unresolved {
                            kind: member.clone(),
                        })?;
                    queue.push_back(resolved);
                }
            }
            ResolvedType::Concrete(concrete) => {
                leaves.insert(concrete.kind.clone());
            }
            ResolvedType::Placeholder(placeholder) => {
                leaves.insert(placeholder.kind.clone());
            }
        }
    }

    Ok(leaves)
}

/// Verifies that no supertype in the registry (indirectly) contains itself.
///
/// # Errors
///
/// Returns [`ResolveError::CyclicReference`] with the offending path.
pub fn check_acyclic(registry: &TypeRegistry) -> Result<(), ResolveError> {
    let mut done = HashSet::new();
    for supertype in registry.supertypes() {
        visit(registry, supertype, &mut Vec::new(), &mut done)?;
    }
    Ok(())
}

fn visit<'r>(
    registry: &'r TypeRegistry,
    sum: &'r SumType,
    path: &mut Vec<&'r str>,
    done: &mut HashSet<&'r str>,
) -> Result<(), ResolveError> {
    let label = sum.label();
    if let Some(start) = path.iter().position(|entry| *entry == label) {
        let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
        cycle.push(label.to_string());
        return Err(ResolveError::CyclicReference { path: cycle });
    }
    if done.contains(label) {
        return Ok(());
    }

    path.push(label);
    for member in &sum.members {
        if let Some(ResolvedType::Sum(inner)) = registry.resolve(member) {
            visit(registry, inner, path, done)?;
        }
    }
    path.pop();

    done.insert(label);
    Ok(())
}
