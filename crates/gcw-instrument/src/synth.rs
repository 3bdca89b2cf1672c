//! Rendering of the generated traversal methods.
//!
//! A block is inserted immediately before the closing brace of a class body:
//!
//! ```text
//!
//!  public:
//!   // GENERATED CODE FOR GC_PTR
//!   // BEGIN GC_PTR
//!   void connectToRoot(const void* rootPtr) const {
//!     Base::connectToRoot(rootPtr);
//!     ptr_.connectToRoot(rootPtr);
//!   }
//!
//!   void disconnectFromRoot(const bool isRoot, const void* rootPtr) const {
//!     Base::disconnectFromRoot(isRoot, rootPtr);
//!     ptr_.disconnectFromRoot(isRoot, rootPtr);
//!   }
//!   // END GC_PTR
//! };
//! ```
//!
//! The access line directly precedes the generated-code marker; the splicer
//! relies on that to detect which policy an existing block was written with.

use std::fmt::Write as _;

use gcw_core::{AccessPolicy, CallStyle, ClassKey, InstrumentOptions};
use serde::Serialize;

use crate::grouping::{InsertionPoint, QualifyingBase, QualifyingField};

pub const GENERATED_MARKER: &str = "// GENERATED CODE FOR GC_PTR";
pub const BEGIN_MARKER: &str = "// BEGIN GC_PTR";
pub const END_MARKER: &str = "// END GC_PTR";

const CONNECT_SIGNATURE: &str = "void connectToRoot(const void* rootPtr) const";
const DISCONNECT_SIGNATURE: &str =
    "void disconnectFromRoot(const bool isRoot, const void* rootPtr) const";

/// Rendered code for one insertion point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedBlock {
    pub class: ClassKey,
    pub connect_calls: Vec<String>,
    pub disconnect_calls: Vec<String>,
    /// Full text spliced before the closing brace, starting with a newline.
    pub text: String,
}

/// Renders [`GeneratedBlock`]s according to the configured call style and
/// access policy.
#[derive(Debug, Clone, Copy)]
pub struct Synthesizer<'a> {
    options: &'a InstrumentOptions,
}

impl<'a> Synthesizer<'a> {
    #[must_use]
    pub const fn new(options: &'a InstrumentOptions) -> Self {
        Self { options }
    }

    /// Render the block for `point`, or `None` when it has nothing to call.
    ///
    /// Annotated classes always get a block, possibly with empty bodies, so
    /// their containers and subclasses can call into them.
    #[must_use]
    pub fn synthesize(&self, point: &InsertionPoint) -> Option<GeneratedBlock> {
        if point.is_empty() && !point.annotated {
            return None;
        }

        let mut connect_calls = Vec::with_capacity(point.bases.len() + point.fields.len());
        let mut disconnect_calls = Vec::with_capacity(connect_calls.capacity());
        for base in &point.bases {
            let (connect, disconnect) = self.base_calls(base);
            connect_calls.push(connect);
            disconnect_calls.push(disconnect);
        }
        for field in &point.fields {
            let (connect, disconnect) = self.field_calls(field);
            connect_calls.push(connect);
            disconnect_calls.push(disconnect);
        }

        let text = self.render(&connect_calls, &disconnect_calls);
        Some(GeneratedBlock {
            class: point.class.clone(),
            connect_calls,
            disconnect_calls,
            text,
        })
    }

    fn base_calls(&self, base: &QualifyingBase) -> (String, String) {
        let name = base_call_spelling(&base.spelling);
        match self.options.call_style {
            CallStyle::Direct => (
                format!("{name}::connectToRoot(rootPtr);"),
                format!("{name}::disconnectFromRoot(isRoot, rootPtr);"),
            ),
            CallStyle::Dispatch => {
                let pointer = &self.options.pointer;
                (
                    format!(
                        "{}<{name}>(this, rootPtr);",
                        pointer.qualify("call_ConnectBaseToRoot")
                    ),
                    format!(
                        "{}<{name}>(this, isRoot, rootPtr);",
                        pointer.qualify("call_DisconnectBaseFromRoot")
                    ),
                )
            }
        }
    }

    fn field_calls(&self, field: &QualifyingField) -> (String, String) {
        let name = &field.name;
        match self.options.call_style {
            CallStyle::Direct => (
                format!("{name}.connectToRoot(rootPtr);"),
                format!("{name}.disconnectFromRoot(isRoot, rootPtr);"),
            ),
            CallStyle::Dispatch => {
                let pointer = &self.options.pointer;
                (
                    format!(
                        "{}<decltype({name})>({name}, rootPtr);",
                        pointer.qualify("call_ConnectFieldToRoot")
                    ),
                    format!(
                        "{}<decltype({name})>({name}, isRoot, rootPtr);",
                        pointer.qualify("call_DisconnectFieldFromRoot")
                    ),
                )
            }
        }
    }

    fn render(&self, connect_calls: &[String], disconnect_calls: &[String]) -> String {
        let mut text = String::from("\n");
        let _ = writeln!(text, " {}:", self.options.access.keyword());
        let _ = writeln!(text, "  {GENERATED_MARKER}");
        let _ = writeln!(text, "  {BEGIN_MARKER}");
        if self.options.access == AccessPolicy::Restricted {
            for friend in self.friend_declarations() {
                let _ = writeln!(text, "  {friend}");
            }
            text.push('\n');
        }

        let _ = writeln!(text, "  {CONNECT_SIGNATURE} {{");
        for call in connect_calls {
            let _ = writeln!(text, "    {call}");
        }
        text.push_str("  }\n\n");

        let _ = writeln!(text, "  {DISCONNECT_SIGNATURE} {{");
        for call in disconnect_calls {
            let _ = writeln!(text, "    {call}");
        }
        text.push_str("  }\n");
        let _ = writeln!(text, "  {END_MARKER}");
        text
    }

    /// Friends that keep restricted traversal methods reachable from the
    /// managed-pointer machinery.
    fn friend_declarations(&self) -> Vec<String> {
        let pointer = &self.options.pointer;
        vec![
            format!("template <typename> friend class {};", pointer.template),
            format!(
                "template <typename> friend class {};",
                pointer.qualify(&pointer.trait_helper)
            ),
            format!(
                "template <typename TBase, typename TDerived> friend void {}(TDerived* derivedPtr, const void* rootPtr);",
                pointer.qualify("call_ConnectBaseToRoot")
            ),
            format!(
                "template <typename TExact, typename TDeduced> friend void {}(TDeduced& t, const void* rootPtr);",
                pointer.qualify("call_ConnectFieldToRoot")
            ),
            format!(
                "template <typename TBase, typename TDerived> friend void {}(TDerived* derivedPtr, const bool isRoot, const void* rootPtr);",
                pointer.qualify("call_DisconnectBaseFromRoot")
            ),
            format!(
                "template <typename TExact, typename TDeduced> friend void {}(TDeduced& t, const bool isRoot, const void* rootPtr);",
                pointer.qualify("call_DisconnectFieldFromRoot")
            ),
        ]
    }
}

/// Strip access and `virtual` keywords from a base specifier, keeping the
/// qualified name and any template arguments.
fn base_call_spelling(spelling: &str) -> String {
    const HEAD_KEYWORDS: &[&str] = &["public", "protected", "private", "virtual", "class", "struct"];
    let mut rest = spelling.trim();
    while let Some((word, tail)) = rest.split_once(char::is_whitespace) {
        if !HEAD_KEYWORDS.contains(&word) {
            break;
        }
        rest = tail.trim_start();
    }
    rest.to_string()
}

#[cfg(test)]
mod tests {
    use gcw_core::{Extent, FieldUseKind, Location, ScopePath};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn point(bases: &[&str], pointer_fields: &[&str], class_fields: &[&str]) -> InsertionPoint {
        let extent = Extent::new("a.hpp", Location::new(1, 1), Location::new(5, 2))
            .expect("valid extent");
        let key = |name: &str| gcw_core::ClassKey::new(name, ScopePath::root());
        InsertionPoint {
            extent,
            class: key("Derived"),
            bases: bases
                .iter()
                .enumerate()
                .map(|(position, spelling)| QualifyingBase {
                    class: key(spelling),
                    spelling: (*spelling).to_string(),
                    position,
                })
                .collect(),
            fields: pointer_fields
                .iter()
                .map(|name| (name, FieldUseKind::ManagedPointer))
                .chain(class_fields.iter().map(|name| {
                    (
                        name,
                        FieldUseKind::UsingClass {
                            class: key("Leaf"),
                        },
                    )
                }))
                .enumerate()
                .map(|(position, (name, kind))| QualifyingField {
                    name: (*name).to_string(),
                    kind,
                    position,
                })
                .collect(),
            annotated: false,
        }
    }

    #[test]
    fn direct_public_block_matches_layout() {
        let options = InstrumentOptions::default();
        let block = Synthesizer::new(&options)
            .synthesize(&point(&["public Base"], &["ptr_"], &["leaf"]))
            .expect("block");
        let expected = "\n public:\n  // GENERATED CODE FOR GC_PTR\n  // BEGIN GC_PTR\n  void connectToRoot(const void* rootPtr) const {\n    Base::connectToRoot(rootPtr);\n    ptr_.connectToRoot(rootPtr);\n    leaf.connectToRoot(rootPtr);\n  }\n\n  void disconnectFromRoot(const bool isRoot, const void* rootPtr) const {\n    Base::disconnectFromRoot(isRoot, rootPtr);\n    ptr_.disconnectFromRoot(isRoot, rootPtr);\n    leaf.disconnectFromRoot(isRoot, rootPtr);\n  }\n  // END GC_PTR\n";
        assert_eq!(block.text, expected);
    }

    #[test]
    fn dispatch_calls_use_helper_templates() {
        let options = InstrumentOptions {
            call_style: CallStyle::Dispatch,
            ..InstrumentOptions::default()
        };
        let block = Synthesizer::new(&options)
            .synthesize(&point(&["ns::Base<int>"], &["ptr_"], &[]))
            .expect("block");
        assert_eq!(
            block.connect_calls,
            vec![
                "memory::call_ConnectBaseToRoot<ns::Base<int>>(this, rootPtr);",
                "memory::call_ConnectFieldToRoot<decltype(ptr_)>(ptr_, rootPtr);",
            ]
        );
        assert_eq!(
            block.disconnect_calls[1],
            "memory::call_DisconnectFieldFromRoot<decltype(ptr_)>(ptr_, isRoot, rootPtr);"
        );
    }

    #[test]
    fn restricted_block_is_protected_with_friends() {
        let options = InstrumentOptions {
            access: AccessPolicy::Restricted,
            call_style: CallStyle::Dispatch,
            ..InstrumentOptions::default()
        };
        let block = Synthesizer::new(&options)
            .synthesize(&point(&[], &["ptr_"], &[]))
            .expect("block");
        assert!(block.text.starts_with("\n protected:\n  // GENERATED CODE FOR GC_PTR\n"));
        assert!(
            block
                .text
                .contains("template <typename> friend class memory::gc_ptr;")
        );
        assert!(
            block
                .text
                .contains("template <typename> friend class memory::has_use_gc_ptr;")
        );
        assert!(block.text.contains("memory::call_DisconnectBaseFromRoot"));
    }

    #[test]
    fn nothing_to_call_renders_nothing() {
        let options = InstrumentOptions::default();
        assert!(Synthesizer::new(&options).synthesize(&point(&[], &[], &[])).is_none());
    }

    #[test]
    fn annotated_class_gets_empty_bodies() {
        let options = InstrumentOptions::default();
        let mut annotated = point(&[], &[], &[]);
        annotated.annotated = true;
        let block = Synthesizer::new(&options)
            .synthesize(&annotated)
            .expect("annotated classes always get a block");
        assert!(block.connect_calls.is_empty());
        assert!(
            block
                .text
                .contains("  void connectToRoot(const void* rootPtr) const {\n  }\n")
        );
    }

    #[rstest]
    #[case("public Base", "Base")]
    #[case("virtual public ns::Base", "ns::Base")]
    #[case("protected Df<A, B>", "Df<A, B>")]
    #[case("Base", "Base")]
    fn base_spelling_drops_head_keywords(#[case] spelling: &str, #[case] expected: &str) {
        assert_eq!(base_call_spelling(spelling), expected);
    }
}
