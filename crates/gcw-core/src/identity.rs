//! Declaration identity.
//!
//! A class is identified by its simple name plus the ordered chain of
//! lexically enclosing scopes (namespaces and classes). Extents are never
//! part of identity: a forward declaration and the definition of a class
//! share one key, and a template visited through several cursors collapses
//! into one entry.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a lexically enclosing scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Namespace,
    Class,
}

/// One enclosing scope, identified by its spelling.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub kind: ScopeKind,
    pub name: String,
}

impl Scope {
    #[must_use]
    pub fn namespace(name: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::Namespace,
            name: name.into(),
        }
    }

    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            kind: ScopeKind::Class,
            name: name.into(),
        }
    }
}

/// Ordered chain of enclosing scopes, outermost first.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ScopePath(Vec<Scope>);

impl ScopePath {
    /// The global scope.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// A new path with `scope` appended as the innermost scope.
    #[must_use]
    pub fn child(&self, scope: Scope) -> Self {
        let mut scopes = self.0.clone();
        scopes.push(scope);
        Self(scopes)
    }

    #[must_use]
    pub fn scopes(&self) -> &[Scope] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the trailing scope names equal `qualifiers` (e.g. `["ns", "Outer"]`).
    #[must_use]
    pub fn ends_with_names(&self, qualifiers: &[String]) -> bool {
        if qualifiers.len() > self.0.len() {
            return false;
        }
        let tail = &self.0[self.0.len() - qualifiers.len()..];
        tail.iter().zip(qualifiers).all(|(scope, q)| scope.name == *q)
    }

    /// Number of leading scopes shared with `other`.
    #[must_use]
    pub fn common_prefix_len(&self, other: &Self) -> usize {
        self.0
            .iter()
            .zip(&other.0)
            .take_while(|(a, b)| a == b)
            .count()
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|s| s.name.as_str()).collect();
        write!(f, "{}", names.join("::"))
    }
}

/// Identity of a class or struct.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassKey {
    pub name: String,
    pub scope: ScopePath,
}

impl ClassKey {
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ScopePath) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }

    /// Fully qualified spelling, e.g. `ns::Outer::Inner`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.scope.is_empty() {
            self.name.clone()
        } else {
            format!("{}::{}", self.scope, self.name)
        }
    }

    /// The scope path seen by members declared inside this class.
    #[must_use]
    pub fn member_scope(&self) -> ScopePath {
        self.scope.child(Scope::class(self.name.clone()))
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

/// Identity of a data member: its name plus the enclosing scope chain,
/// whose innermost element is the owning class.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MemberKey {
    pub name: String,
    pub scope: ScopePath,
}

impl MemberKey {
    #[must_use]
    pub fn new(name: impl Into<String>, scope: ScopePath) -> Self {
        Self {
            name: name.into(),
            scope,
        }
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scope.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}::{}", self.scope, self.name)
        }
    }
}

/// Keywords dropped from a type spelling before the name is extracted.
const SPELLING_NOISE: &[&str] = &[
    "const",
    "volatile",
    "mutable",
    "class",
    "struct",
    "union",
    "enum",
    "typename",
    "virtual",
    "public",
    "protected",
    "private",
];

/// A type spelling reduced to its qualifier chain and simple name.
///
/// `const ns::Leaf` becomes `(["ns"], "Leaf")`, `class Base` becomes
/// `([], "Base")`, and `Df<A, A>` becomes `([], "Df")`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub qualifiers: Vec<String>,
    pub name: String,
}

impl TypeName {
    /// Parse a textual spelling. Returns `None` when no identifier remains.
    #[must_use]
    pub fn parse(spelling: &str) -> Option<Self> {
        let head = spelling.split('<').next().unwrap_or(spelling);
        let head = head.replace(['*', '&'], " ");
        let path = head
            .split_whitespace()
            .filter(|token| !SPELLING_NOISE.contains(token))
            .last()?;

        let mut segments: Vec<String> = path
            .split("::")
            .filter(|segment| !segment.is_empty())
            .map(str::to_string)
            .collect();
        let name = segments.pop()?;
        if !is_identifier(&name) || !segments.iter().all(|s| is_identifier(s)) {
            return None;
        }
        Some(Self {
            qualifiers: segments,
            name,
        })
    }
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Leaf", &[], "Leaf")]
    #[case("const Leaf", &[], "Leaf")]
    #[case("class Base", &[], "Base")]
    #[case("struct ns::Base", &["ns"], "Base")]
    #[case("::ns::Outer::Inner", &["ns", "Outer"], "Inner")]
    #[case("Df<A, A>", &[], "Df")]
    #[case("const memory::gc_ptr<Node>", &["memory"], "gc_ptr")]
    fn type_name_parses_spellings(
        #[case] spelling: &str,
        #[case] qualifiers: &[&str],
        #[case] name: &str,
    ) {
        let parsed = TypeName::parse(spelling).expect("spelling should parse");
        assert_eq!(parsed.name, name);
        assert_eq!(parsed.qualifiers, qualifiers);
    }

    #[test]
    fn type_name_rejects_empty_spelling() {
        assert_eq!(TypeName::parse("const"), None);
        assert_eq!(TypeName::parse(""), None);
    }

    #[test]
    fn keys_compare_by_name_and_scope() {
        let ns = ScopePath::root().child(Scope::namespace("ns"));
        let a = ClassKey::new("Leaf", ns.clone());
        let b = ClassKey::new("Leaf", ns);
        let c = ClassKey::new("Leaf", ScopePath::root());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn qualified_name_joins_scopes() {
        let scope = ScopePath::root()
            .child(Scope::namespace("ns"))
            .child(Scope::class("Outer"));
        let key = ClassKey::new("Inner", scope);
        assert_eq!(key.qualified_name(), "ns::Outer::Inner");
        assert_eq!(key.member_scope().len(), 3);
    }

    #[test]
    fn ends_with_names_matches_trailing_scopes() {
        let scope = ScopePath::root()
            .child(Scope::namespace("a"))
            .child(Scope::namespace("b"));
        assert!(scope.ends_with_names(&["b".to_string()]));
        assert!(scope.ends_with_names(&["a".to_string(), "b".to_string()]));
        assert!(!scope.ends_with_names(&["a".to_string()]));
        assert!(scope.ends_with_names(&[]));
    }
}
