//! Discovered declarations and the findings derived from them.
//!
//! All three record types compare and hash by identity only, so a set or map
//! keyed by them dedupes repeated visits of the same logical declaration.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::extent::Extent;
use crate::identity::{ClassKey, MemberKey, ScopePath};
use crate::syntax::{NodeKind, SyntaxNode, TypeDescriptor};

/// A base-class reference as spelled in the class head.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSpecifier {
    pub spelling: String,
    pub position: usize,
}

/// A data member as declared in a class body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub ty: TypeDescriptor,
    pub position: usize,
}

/// A class or struct definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDeclaration {
    pub key: ClassKey,
    pub extent: Extent,
    pub bases: Vec<BaseSpecifier>,
    pub fields: Vec<FieldDeclaration>,
    pub annotations: Vec<String>,
    pub template_params: Vec<String>,
}

impl ClassDeclaration {
    /// Build a declaration from a class-definition node visited inside `scope`.
    ///
    /// Returns `None` for anything that is not an eligible definition: forward
    /// declarations, other node kinds, anonymous classes and nodes without an
    /// extent.
    #[must_use]
    pub fn from_node(node: &SyntaxNode, scope: &ScopePath) -> Option<Self> {
        if node.kind != NodeKind::ClassDefinition || node.spelling.is_empty() {
            return None;
        }
        let extent = node.extent.clone()?;

        let bases = node
            .children_of_kind(NodeKind::BaseSpecifier)
            .enumerate()
            .map(|(position, base)| BaseSpecifier {
                spelling: base.spelling.clone(),
                position,
            })
            .collect();

        let fields = node
            .children_of_kind(NodeKind::Field)
            .filter_map(|field| field.ty.clone().map(|ty| (field.spelling.clone(), ty)))
            .enumerate()
            .map(|(position, (name, ty))| FieldDeclaration { name, ty, position })
            .collect();

        Some(Self {
            key: ClassKey::new(node.spelling.clone(), scope.clone()),
            extent,
            bases,
            fields,
            annotations: node.annotations.clone(),
            template_params: node.template_params.clone(),
        })
    }

    /// Whether any annotation on the class mentions `annotation`.
    #[must_use]
    pub fn has_annotation(&self, annotation: &str) -> bool {
        self.annotations.iter().any(|a| a.contains(annotation))
    }

    #[must_use]
    pub fn is_template(&self) -> bool {
        !self.template_params.is_empty()
    }
}

impl PartialEq for ClassDeclaration {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for ClassDeclaration {}

impl Hash for ClassDeclaration {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// Why a field participates in root propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum FieldUseKind {
    /// The field's type is the managed-pointer template itself.
    ManagedPointer,
    /// The field holds, by value, a class that carries a managed pointer.
    UsingClass { class: ClassKey },
}

/// A field that must be connected to / disconnected from roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldUse {
    pub key: MemberKey,
    pub owner: ClassKey,
    pub type_spelling: String,
    pub kind: FieldUseKind,
    /// Declaration order inside the owner.
    pub position: usize,
}

impl FieldUse {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.key.name
    }

    #[must_use]
    pub const fn is_managed_pointer(&self) -> bool {
        matches!(self.kind, FieldUseKind::ManagedPointer)
    }
}

impl PartialEq for FieldUse {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FieldUse {}

impl Hash for FieldUse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

/// A derived class paired with one of its bases that carries a managed pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InheritanceUse {
    pub derived: ClassKey,
    pub base: ClassKey,
    /// The base as spelled in the derived class head, used in generated calls.
    pub base_spelling: String,
    /// Position of the base specifier in the class head.
    pub position: usize,
}

impl PartialEq for InheritanceUse {
    fn eq(&self, other: &Self) -> bool {
        self.derived == other.derived && self.base == other.base
    }
}

impl Eq for InheritanceUse {}

impl Hash for InheritanceUse {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.derived.hash(state);
        self.base.hash(state);
    }
}
