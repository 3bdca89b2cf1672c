//! Recursive classification of a syntax tree.
//!
//! One walk visits every node depth-first in pre-order, threading the scope
//! path down. Each class definition is registered in the [`ClassIndex`] and
//! its fields and bases are classified against the carrying set as it stands
//! at that moment. A class referenced before it is known simply does not
//! qualify yet; the closure resolver repeats the walk to catch it.

use std::collections::{BTreeMap, BTreeSet};

use gcw_core::{
    ClassDeclaration, ClassKey, FieldDeclaration, FieldUse, FieldUseKind, InheritanceUse,
    InstrumentOptions, MemberKey, NodeKind, Scope, ScopePath, SyntaxNode, TypeKind, TypeName,
};
use tracing::{debug, trace};

use crate::index::ClassIndex;

/// The three finding sets plus the carrying set they induce.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub classes: ClassIndex,
    /// Classes that hold a managed pointer directly, through a field or
    /// through a base, or that were seeded by annotation.
    pub carriers: BTreeSet<ClassKey>,
    /// Fields typed as the managed-pointer template.
    pub uses_pointer: BTreeMap<MemberKey, FieldUse>,
    /// Fields holding a carrying class by value.
    pub uses_class_that_uses_pointer: BTreeMap<MemberKey, FieldUse>,
    /// `(derived, base)` pairs where the base is a carrying class.
    pub inherits_from_user: BTreeMap<(ClassKey, ClassKey), InheritanceUse>,
    /// Classes carrying the trace annotation. Each one gets traversal
    /// methods even when it has nothing to forward to, since its users call
    /// them.
    pub annotated: BTreeSet<ClassKey>,
    /// Number of walks performed to build this classification.
    pub passes: usize,
}

impl Classification {
    #[must_use]
    pub fn is_carrier(&self, key: &ClassKey) -> bool {
        self.carriers.contains(key)
    }

    fn add_carrier(&mut self, key: &ClassKey) -> bool {
        if self.carriers.contains(key) {
            return false;
        }
        debug!(class = %key, "class carries a managed pointer");
        self.carriers.insert(key.clone())
    }
}

/// Walks a tree once, growing a [`Classification`].
#[derive(Debug, Clone, Copy)]
pub struct GraphWalker<'a> {
    options: &'a InstrumentOptions,
}

impl<'a> GraphWalker<'a> {
    #[must_use]
    pub const fn new(options: &'a InstrumentOptions) -> Self {
        Self { options }
    }

    /// Walk `root` once. Returns whether any set grew.
    pub fn walk(&self, root: &SyntaxNode, state: &mut Classification) -> bool {
        let mut grew = false;
        self.visit(root, &ScopePath::root(), &[], state, &mut grew);
        grew
    }

    fn visit(
        &self,
        node: &SyntaxNode,
        scope: &ScopePath,
        template_params: &[String],
        state: &mut Classification,
        grew: &mut bool,
    ) {
        match node.kind {
            NodeKind::Namespace => {
                let inner = scope.child(Scope::namespace(node.spelling.clone()));
                for child in &node.children {
                    self.visit(child, &inner, template_params, state, grew);
                }
            }
            NodeKind::ClassDefinition => {
                let Some(decl) = ClassDeclaration::from_node(node, scope) else {
                    // Anonymous or extent-less: members still belong to the
                    // enclosing scope for lookup purposes.
                    for child in &node.children {
                        self.visit(child, scope, template_params, state, grew);
                    }
                    return;
                };
                let mut params = template_params.to_vec();
                params.extend(decl.template_params.iter().cloned());

                *grew |= self.classify(&decl, &params, state);

                let inner = decl.key.member_scope();
                for child in &node.children {
                    self.visit(child, &inner, &params, state, grew);
                }
            }
            _ => {
                for child in &node.children {
                    self.visit(child, scope, template_params, state, grew);
                }
            }
        }
    }

    /// Classify one class's fields and bases. Returns whether anything grew.
    fn classify(
        &self,
        decl: &ClassDeclaration,
        template_params: &[String],
        state: &mut Classification,
    ) -> bool {
        // Registered first so self-referential spellings resolve to this
        // definition rather than a stale one.
        state.classes.insert(decl.clone());
        let mut grew = false;

        if let Some(annotation) = &self.options.trace_annotation
            && decl.has_annotation(annotation)
        {
            state.annotated.insert(decl.key.clone());
            grew |= state.add_carrier(&decl.key);
        }

        let member_scope = decl.key.member_scope();
        for field in &decl.fields {
            let Some(kind) = self.field_use_kind(decl, field, &member_scope, template_params, state)
            else {
                continue;
            };
            let key = MemberKey::new(field.name.clone(), member_scope.clone());
            let finding = FieldUse {
                key: key.clone(),
                owner: decl.key.clone(),
                type_spelling: field.ty.spelling.clone(),
                kind,
                position: field.position,
            };
            let set = if finding.is_managed_pointer() {
                &mut state.uses_pointer
            } else {
                &mut state.uses_class_that_uses_pointer
            };
            if set.insert(key, finding).is_none() {
                trace!(class = %decl.key, field = %field.name, "field qualifies");
                grew = true;
            }
            grew |= state.add_carrier(&decl.key);
        }

        for base in &decl.bases {
            if is_template_param(&base.spelling, template_params) {
                continue;
            }
            let Some(base_key) = state.classes.resolve(&base.spelling, &decl.key.scope).cloned()
            else {
                debug!(class = %decl.key, base = %base.spelling, "base not resolved");
                continue;
            };
            if base_key == decl.key || !state.is_carrier(&base_key) {
                continue;
            }
            let pair = (decl.key.clone(), base_key.clone());
            let finding = InheritanceUse {
                derived: decl.key.clone(),
                base: base_key,
                base_spelling: base.spelling.clone(),
                position: base.position,
            };
            if state.inherits_from_user.insert(pair, finding).is_none() {
                trace!(class = %decl.key, base = %base.spelling, "base qualifies");
                grew = true;
            }
            grew |= state.add_carrier(&decl.key);
        }

        grew
    }

    fn field_use_kind(
        &self,
        decl: &ClassDeclaration,
        field: &FieldDeclaration,
        member_scope: &ScopePath,
        template_params: &[String],
        state: &Classification,
    ) -> Option<FieldUseKind> {
        if !field.ty.is_by_value() {
            return None;
        }
        if self.options.pointer.matches(&field.ty.spelling) {
            return Some(FieldUseKind::ManagedPointer);
        }
        if field.ty.kind != TypeKind::Record
            || is_template_param(&field.ty.spelling, template_params)
        {
            return None;
        }
        let Some(class) = state.classes.resolve(&field.ty.spelling, member_scope) else {
            debug!(class = %decl.key, field = %field.name, ty = %field.ty.spelling, "field type not resolved");
            return None;
        };
        (*class != decl.key && state.is_carrier(class)).then(|| FieldUseKind::UsingClass {
            class: class.clone(),
        })
    }
}

fn is_template_param(spelling: &str, template_params: &[String]) -> bool {
    TypeName::parse(spelling)
        .is_some_and(|name| name.qualifiers.is_empty() && template_params.contains(&name.name))
}
