//! Instrumentation options shared by configuration and the pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access qualifier the generated traversal methods are emitted under.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessPolicy {
    /// `public:`, reachable by anyone.
    #[default]
    Public,
    /// `protected:` plus friend declarations for the managed-pointer template,
    /// its trait helper and the dispatch helpers.
    Restricted,
}

impl AccessPolicy {
    /// The C++ access keyword this policy emits.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Restricted => "protected",
        }
    }

    /// Map an access keyword found in source back to a policy.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.trim().trim_end_matches(':').trim() {
            "public" => Some(Self::Public),
            "protected" | "private" => Some(Self::Restricted),
            _ => None,
        }
    }
}

impl fmt::Display for AccessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Restricted => "restricted",
        };
        write!(f, "{s}")
    }
}

/// Shape of the calls emitted inside the traversal methods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStyle {
    /// `Base::connectToRoot(rootPtr);` and `field.connectToRoot(rootPtr);`
    #[default]
    Direct,
    /// `memory::call_ConnectBaseToRoot<Base>(this, rootPtr);` and friends.
    Dispatch,
}

impl fmt::Display for CallStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Direct => "direct",
            Self::Dispatch => "dispatch",
        };
        write!(f, "{s}")
    }
}

/// How the carrying-class closure is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClosureStrategy {
    /// Repeat the walk until no set grows.
    #[default]
    FixedPoint,
    /// Exactly two walks: the second sees every class the first one found.
    TwoPass,
}

impl fmt::Display for ClosureStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::FixedPoint => "fixed-point",
            Self::TwoPass => "two-pass",
        };
        write!(f, "{s}")
    }
}

/// The managed-pointer template and its trait-detection helper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointerTemplate {
    /// Fully qualified template name, e.g. `memory::gc_ptr`.
    pub template: String,
    /// Unqualified name of the trait helper living next to the template.
    pub trait_helper: String,
}

impl Default for PointerTemplate {
    fn default() -> Self {
        Self {
            template: "memory::gc_ptr".to_string(),
            trait_helper: "has_use_gc_ptr".to_string(),
        }
    }
}

impl PointerTemplate {
    /// Namespace qualifier of the template (`memory` for `memory::gc_ptr`).
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.template.rsplit_once("::").map(|(ns, _)| ns)
    }

    /// Qualify a helper name with the template's namespace.
    #[must_use]
    pub fn qualify(&self, helper: &str) -> String {
        match self.namespace() {
            Some(ns) => format!("{ns}::{helper}"),
            None => helper.to_string(),
        }
    }

    /// Textual check: is `spelling` an instantiation of the template?
    ///
    /// Leading cv-qualifiers and a global `::` are ignored; the template name
    /// must then open the spelling and be followed by `<`. This trusts the
    /// spelling alone, so an alias of the template is not recognised and an
    /// unrelated type with the same qualified name is.
    #[must_use]
    pub fn matches(&self, spelling: &str) -> bool {
        let needle = self.template.trim_start_matches("::");
        if needle.is_empty() {
            return false;
        }
        let mut rest = spelling.trim_start();
        loop {
            let stripped = ["const ", "volatile ", "::"]
                .iter()
                .find_map(|prefix| rest.strip_prefix(prefix));
            match stripped {
                Some(next) => rest = next.trim_start(),
                None => break,
            }
        }
        rest.strip_prefix(needle)
            .is_some_and(|tail| tail.trim_start().starts_with('<'))
    }
}

/// Everything the pipeline needs to know about one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentOptions {
    pub pointer: PointerTemplate,
    pub access: AccessPolicy,
    pub call_style: CallStyle,
    pub closure: ClosureStrategy,
    /// Annotation that seeds a class into the carrying set (e.g. `gc::Trace`).
    pub trace_annotation: Option<String>,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("memory::gc_ptr<Node>", true)]
    #[case("const memory::gc_ptr<Node>", true)]
    #[case("::memory::gc_ptr <Node>", true)]
    #[case("std::vector<memory::gc_ptr<Node>>", false)]
    #[case("my_memory::gc_ptr<Node>", false)]
    #[case("memory::gc_ptr_base", false)]
    #[case("Node", false)]
    fn pointer_template_matches_textually(#[case] spelling: &str, #[case] expected: bool) {
        assert_eq!(PointerTemplate::default().matches(spelling), expected);
    }

    #[test]
    fn qualify_uses_template_namespace() {
        let pointer = PointerTemplate::default();
        assert_eq!(pointer.namespace(), Some("memory"));
        assert_eq!(
            pointer.qualify("call_ConnectBaseToRoot"),
            "memory::call_ConnectBaseToRoot"
        );
    }

    #[test]
    fn access_keywords_round_trip() {
        for policy in [AccessPolicy::Public, AccessPolicy::Restricted] {
            assert_eq!(AccessPolicy::from_keyword(policy.keyword()), Some(policy));
        }
        assert_eq!(AccessPolicy::from_keyword(" public:"), Some(AccessPolicy::Public));
        assert_eq!(AccessPolicy::from_keyword("friend"), None);
    }

    #[test]
    fn options_deserialize_kebab_case() {
        let options: InstrumentOptions = serde_json::from_str(
            r#"{
                "pointer": {"template": "gc::ptr", "trait_helper": "traced"},
                "access": "restricted",
                "call_style": "dispatch",
                "closure": "two-pass",
                "trace_annotation": "gc::Trace"
            }"#,
        )
        .expect("options should deserialize");
        assert_eq!(options.access, AccessPolicy::Restricted);
        assert_eq!(options.call_style, CallStyle::Dispatch);
        assert_eq!(options.closure, ClosureStrategy::TwoPass);
        assert_eq!(options.pointer.namespace(), Some("gc"));
    }
}
