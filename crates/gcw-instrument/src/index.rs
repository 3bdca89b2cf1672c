//! Registry of class definitions seen during a walk, with name lookup.

use std::collections::BTreeMap;

use gcw_core::{ClassDeclaration, ClassKey, ScopePath, TypeName};
use tracing::debug;

/// Every eligible class definition of a unit, keyed by identity.
#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    classes: BTreeMap<ClassKey, ClassDeclaration>,
    by_name: BTreeMap<String, Vec<ClassKey>>,
}

impl ClassIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition. A later visit of the same key replaces the
    /// earlier declaration (last write wins).
    pub fn insert(&mut self, decl: ClassDeclaration) {
        let key = decl.key.clone();
        if self.classes.insert(key.clone(), decl).is_none() {
            self.by_name.entry(key.name.clone()).or_default().push(key);
        }
    }

    #[must_use]
    pub fn get(&self, key: &ClassKey) -> Option<&ClassDeclaration> {
        self.classes.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassDeclaration> {
        self.classes.values()
    }

    /// Resolve a type spelling as written inside `from`.
    ///
    /// Candidates share the simple name and have scopes ending in the
    /// spelled qualifiers. Among those, the one whose remaining scope is the
    /// longest prefix of `from` wins, mirroring unqualified lookup walking
    /// outwards. A single candidate outside that rule (reached through a
    /// using-directive, say) is still accepted; several are ambiguous.
    #[must_use]
    pub fn resolve(&self, spelling: &str, from: &ScopePath) -> Option<&ClassKey> {
        let type_name = TypeName::parse(spelling)?;
        let candidates: Vec<&ClassKey> = self
            .by_name
            .get(&type_name.name)?
            .iter()
            .filter(|key| key.scope.ends_with_names(&type_name.qualifiers))
            .collect();

        let visible = candidates
            .iter()
            .filter_map(|key| {
                let enclosing = key.scope.len() - type_name.qualifiers.len();
                let base = &key.scope.scopes()[..enclosing];
                from.scopes().starts_with(base).then_some((enclosing, *key))
            })
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, key)| key);

        match (visible, candidates.as_slice()) {
            (Some(key), _) => Some(key),
            (None, [only]) => Some(*only),
            (None, []) => None,
            (None, _) => {
                debug!(spelling, scope = %from, "ambiguous type spelling left unresolved");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gcw_core::{Extent, Location, Scope, SyntaxNode};

    use super::*;

    fn declare(index: &mut ClassIndex, name: &str, scope: &ScopePath, end_line: u32) {
        let extent = Extent::new("a.hpp", Location::new(1, 1), Location::new(end_line, 2))
            .expect("valid extent");
        let node = SyntaxNode::class(name, extent);
        index.insert(ClassDeclaration::from_node(&node, scope).expect("eligible class"));
    }

    fn ns(names: &[&str]) -> ScopePath {
        names
            .iter()
            .fold(ScopePath::root(), |path, n| path.child(Scope::namespace(*n)))
    }

    #[test]
    fn last_definition_wins() {
        let mut index = ClassIndex::new();
        declare(&mut index, "Leaf", &ScopePath::root(), 3);
        declare(&mut index, "Leaf", &ScopePath::root(), 9);
        assert_eq!(index.len(), 1);
        let key = ClassKey::new("Leaf", ScopePath::root());
        assert_eq!(index.get(&key).map(|d| d.extent.end.line), Some(9));
    }

    #[test]
    fn resolves_innermost_visible_candidate() {
        let mut index = ClassIndex::new();
        declare(&mut index, "Leaf", &ScopePath::root(), 3);
        declare(&mut index, "Leaf", &ns(&["a"]), 6);
        let from_a = ns(&["a"]).child(Scope::class("User"));
        assert_eq!(
            index.resolve("Leaf", &from_a),
            Some(&ClassKey::new("Leaf", ns(&["a"])))
        );
        assert_eq!(
            index.resolve("Leaf", &ScopePath::root()),
            Some(&ClassKey::new("Leaf", ScopePath::root()))
        );
    }

    #[test]
    fn qualified_spelling_selects_namespace() {
        let mut index = ClassIndex::new();
        declare(&mut index, "Leaf", &ns(&["a"]), 3);
        declare(&mut index, "Leaf", &ns(&["b"]), 6);
        assert_eq!(
            index.resolve("const b::Leaf", &ScopePath::root()),
            Some(&ClassKey::new("Leaf", ns(&["b"])))
        );
    }

    #[test]
    fn unrelated_duplicates_are_unresolved() {
        let mut index = ClassIndex::new();
        declare(&mut index, "Leaf", &ns(&["a"]), 3);
        declare(&mut index, "Leaf", &ns(&["b"]), 6);
        assert_eq!(index.resolve("Leaf", &ns(&["c"])), None);
        assert_eq!(index.resolve("Missing", &ScopePath::root()), None);
    }

    #[test]
    fn single_candidate_is_accepted_from_anywhere() {
        let mut index = ClassIndex::new();
        declare(&mut index, "Leaf", &ns(&["lib"]), 3);
        assert_eq!(
            index.resolve("Leaf", &ns(&["app"])),
            Some(&ClassKey::new("Leaf", ns(&["lib"])))
        );
    }
}
