//! Order-independent identities for sets of alternative kinds.
//!
//! Many fields across a grammar accept the same handful of kinds, often listed
//! in different orders. Canonicalizing the set before registration means each
//! distinct set produces exactly one generated sum type.

use super::ResolveError;
use crate::ident::private_name;
use crate::schema::KindRef;

/// Placed between member names when building a canonical key.
pub const KEY_SEPARATOR: &str = "_";

/// A sorted, duplicate-free set of at least two kinds and its canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSet {
    members: Vec<KindRef>,
    key: String,
}

impl CanonicalSet {
    /// Canonicalizes a set of alternatives.
    ///
    /// Members are sorted by kind name; a name that appears both named and
    /// anonymous sorts the anonymous reference first. The key joins the private
    /// identifier of each member with [`KEY_SEPARATOR`], and doubles as the
    /// generated type name.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::SumArity`] when fewer than two distinct kinds
    /// remain. A single alternative never needs a sum type, so reaching this
    /// with one is a bug in the caller.
    pub fn new(alternatives: &[KindRef]) -> Result<Self, ResolveError> {
        let mut members = alternatives.to_vec();
        // (name, named) ordering, derived on KindRef.
        members.sort();
        members.dedup();

        if members.len() < 2 {
            return Err(ResolveError::SumArity {
                count: members.len(),
            });
        }

        let key = members
            .iter()
            .map(|member| private_name(&member.name))
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);

        Ok(Self { members, key })
    }

    /// The canonical key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The members in canonical order.
    #[must_use]
    pub fn members(&self) -> &[KindRef] {
        &self.members
    }

    /// Consumes the set, returning its members in canonical order.
    #[must_use]
    pub fn into_members(self) -> Vec<KindRef> {
        self.members
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_sorted_private_names() {
        let set = CanonicalSet::new(&[
            KindRef::named("pattern_list"),
            KindRef::named("pattern"),
        ])
        .unwrap();
        assert_eq!(set.key(), "pattern_patternList");
    }

    #[test]
    fn test_order_independent() {
        let a = CanonicalSet::new(&[KindRef::named("string"), KindRef::named("integer")]).unwrap();
        let b = CanonicalSet::new(&[KindRef::named("integer"), KindRef::named("string")]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), "integer_string");
    }

    #[test]
    fn test_symbols_sort_by_kind_not_by_identifier() {
        let set = CanonicalSet::new(&[
            KindRef::named("class_pattern"),
            KindRef::anonymous("_"),
            KindRef::anonymous("-"),
        ])
        .unwrap();
        assert_eq!(set.key(), "sub_underscore_classPattern");
    }

    #[test]
    fn test_same_name_both_namings_is_stable() {
        let a = CanonicalSet::new(&[KindRef::named("type"), KindRef::anonymous("type")]).unwrap();
        let b = CanonicalSet::new(&[KindRef::anonymous("type"), KindRef::named("type")]).unwrap();
        assert_eq!(a.members(), b.members());
        assert_eq!(a.members()[0], KindRef::anonymous("type"));
        assert_eq!(a.key(), "type__type_");
    }

    #[test]
    fn test_rejects_empty_and_singleton_sets() {
        assert_eq!(
            CanonicalSet::new(&[]),
            Err(ResolveError::SumArity { count: 0 })
        );
        assert_eq!(
            CanonicalSet::new(&[KindRef::named("a")]),
            Err(ResolveError::SumArity { count: 1 })
        );
        assert_eq!(
            CanonicalSet::new(&[KindRef::named("a"), KindRef::named("a")]),
            Err(ResolveError::SumArity { count: 1 })
        );
    }
}
