//! Allocation of package-level identifiers for generated types.

use super::ResolveError;
use std::collections::HashSet;

/// Package-level identifiers that exist in every generated file, including
/// the names its imports bind at file scope.
const PACKAGE_IDENTIFIERS: &[&str] = &["SyntaxKind", "fmt", "slices", "tree_sitter"];

/// Returns the name of the constructor generated for a type.
#[must_use]
pub fn constructor_name(type_name: &str) -> String {
    format!("New{type_name}")
}

/// Hands out globally unique type names in allocation order.
///
/// Each allocated type also claims its constructor name, so a kind called
/// `new_foo` cannot shadow the constructor of `foo`.
#[derive(Debug)]
pub(crate) struct NameTable {
    taken: HashSet<String>,
}

impl Default for NameTable {
    fn default() -> Self {
        Self {
            taken: PACKAGE_IDENTIFIERS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl NameTable {
    fn is_free(&self, name: &str) -> bool {
        !self.taken.contains(name) && !self.taken.contains(&constructor_name(name))
    }

    /// Claims `base`, or `base2`, `base3`, ... if it is already in use.
    pub(crate) fn allocate(&mut self, base: &str) -> Result<String, ResolveError> {
        // Every taken name blocks at most two candidates.
        let limit = 2 * self.taken.len() + 2;

        let mut candidate = base.to_string();
        let mut suffix = 1;
        while !self.is_free(&candidate) {
            suffix += 1;
            if suffix > limit {
                return Err(ResolveError::NameExhausted {
                    owner: "package".to_string(),
                    candidate: base.to_string(),
                });
            }
            candidate = format!("{base}{suffix}");
        }

        if candidate != base {
            tracing::warn!(base, name = %candidate, "generated type name already in use, disambiguated");
        }
        self.taken.insert(constructor_name(&candidate));
        self.taken.insert(candidate.clone());
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_base_when_free() {
        let mut names = NameTable::default();
        assert_eq!(names.allocate("Identifier").unwrap(), "Identifier");
    }

    #[test]
    fn test_suffixes_on_collision() {
        let mut names = NameTable::default();
        assert_eq!(names.allocate("AB").unwrap(), "AB");
        assert_eq!(names.allocate("AB").unwrap(), "AB2");
        assert_eq!(names.allocate("AB").unwrap(), "AB3");
    }

    #[test]
    fn test_constructor_names_are_reserved() {
        let mut names = NameTable::default();
        assert_eq!(names.allocate("Foo").unwrap(), "Foo");
        assert_eq!(names.allocate("NewFoo").unwrap(), "NewFoo2");

        let mut names = NameTable::default();
        assert_eq!(names.allocate("NewBar").unwrap(), "NewBar");
        assert_eq!(names.allocate("Bar").unwrap(), "Bar2");
    }

    #[test]
    fn test_package_identifiers_are_reserved() {
        let mut names = NameTable::default();
        assert_eq!(names.allocate("SyntaxKind").unwrap(), "SyntaxKind2");
    }

    #[test]
    fn test_import_names_are_reserved() {
        let mut names = NameTable::default();
        assert_eq!(names.allocate("tree_sitter").unwrap(), "tree_sitter2");
        assert_eq!(names.allocate("fmt").unwrap(), "fmt2");
        assert_eq!(names.allocate("slices").unwrap(), "slices2");
    }
}
