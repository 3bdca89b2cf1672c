//! The syntax-tree contract between a C++ front end and the instrumentation
//! pipeline.
//!
//! A front end lowers whatever parser it uses into this small tree: every
//! node has a kind tag, an optional type descriptor, an optional extent and
//! ordered children. Scopes are not stored as parent links; the walker
//! threads the scope path down while it recurses.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::extent::Extent;

/// Declaration kind of a syntax node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    TranslationUnit,
    Namespace,
    /// A class or struct with a body.
    ClassDefinition,
    /// A class or struct without a body.
    ClassForwardDecl,
    Field,
    BaseSpecifier,
    Other,
}

/// Structural kind of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A named class type held by value.
    Record,
    Pointer,
    Reference,
    Array,
    Builtin,
    /// Spelled through a template parameter of an enclosing template.
    Dependent,
    Other,
}

/// Textual spelling plus structural kind of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub spelling: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    #[must_use]
    pub fn new(spelling: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            spelling: spelling.into(),
            kind,
        }
    }

    #[must_use]
    pub fn record(spelling: impl Into<String>) -> Self {
        Self::new(spelling, TypeKind::Record)
    }

    /// Whether the type is held by value (not through a pointer, reference or array).
    #[must_use]
    pub const fn is_by_value(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Record | TypeKind::Builtin | TypeKind::Dependent | TypeKind::Other
        )
    }
}

/// One node of the lowered syntax tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// Declared name for namespaces, classes and fields; the base spelling
    /// for base specifiers.
    pub spelling: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extent: Option<Extent>,
    /// Source annotations attached to the declaration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<String>,
    /// Template parameter names when the class is a template.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub template_params: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    #[must_use]
    pub fn new(kind: NodeKind, spelling: impl Into<String>) -> Self {
        Self {
            kind,
            spelling: spelling.into(),
            ty: None,
            extent: None,
            annotations: Vec::new(),
            template_params: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn translation_unit() -> Self {
        Self::new(NodeKind::TranslationUnit, "")
    }

    #[must_use]
    pub fn namespace(name: impl Into<String>) -> Self {
        Self::new(NodeKind::Namespace, name)
    }

    #[must_use]
    pub fn class(name: impl Into<String>, extent: Extent) -> Self {
        Self::new(NodeKind::ClassDefinition, name).with_extent(extent)
    }

    #[must_use]
    pub fn forward_class(name: impl Into<String>) -> Self {
        Self::new(NodeKind::ClassForwardDecl, name)
    }

    #[must_use]
    pub fn field(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        let mut node = Self::new(NodeKind::Field, name);
        node.ty = Some(ty);
        node
    }

    #[must_use]
    pub fn base(spelling: impl Into<String>) -> Self {
        Self::new(NodeKind::BaseSpecifier, spelling)
    }

    #[must_use]
    pub fn with_extent(mut self, extent: Extent) -> Self {
        self.extent = Some(extent);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    #[must_use]
    pub fn with_template_params(mut self, params: Vec<String>) -> Self {
        self.template_params = params;
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Self>) -> Self {
        self.children.extend(children);
        self
    }

    /// Class or struct definition (not a forward declaration).
    #[must_use]
    pub fn is_class_definition(&self) -> bool {
        self.kind == NodeKind::ClassDefinition
    }

    /// Children of the given kind, in order.
    pub fn children_of_kind(&self, kind: NodeKind) -> impl Iterator<Item = &Self> {
        self.children.iter().filter(move |c| c.kind == kind)
    }
}

/// A lowered compilation unit: the tree plus the exact text of every file
/// its extents point into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationUnit {
    pub main_file: PathBuf,
    pub root: SyntaxNode,
    pub sources: BTreeMap<PathBuf, String>,
}

impl TranslationUnit {
    #[must_use]
    pub fn new(main_file: impl Into<PathBuf>, root: SyntaxNode) -> Self {
        Self {
            main_file: main_file.into(),
            root,
            sources: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        self.sources.insert(path.into(), text.into());
        self
    }

    #[must_use]
    pub fn source(&self, path: &Path) -> Option<&str> {
        self.sources.get(path).map(String::as_str)
    }
}
