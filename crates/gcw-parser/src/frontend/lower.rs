//! Lowering of tree-sitter C++ nodes into the gcwire syntax tree.

use std::path::Path;

use ast_grep_core::Node;
use ast_grep_language::SupportLang;
use gcw_core::{Extent, Location, NodeKind, SyntaxNode, TypeDescriptor, TypeKind};
use tracing::{debug, warn};

use super::UnitBuilder;
use super::lines::LineIndex;
use crate::parser::parse_source;

struct FileCtx<'p> {
    path: &'p Path,
    lines: LineIndex,
}

/// Parse and lower one file. Included headers are lowered in place.
pub(super) fn lower_file(builder: &mut UnitBuilder<'_>, path: &Path, text: &str) -> Vec<SyntaxNode> {
    let tree = parse_source(text, SupportLang::Cpp);
    let root = tree.root();
    let ctx = FileCtx {
        path,
        lines: LineIndex::new(text),
    };
    report_syntax_errors(&root, &ctx);

    let mut out = Vec::new();
    for child in root.children() {
        lower_declaration(builder, &child, &ctx, &[], &mut out);
    }
    out
}

// ── Declarations ───────────────────────────────────────────────────

fn lower_declaration<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
    templates: &[String],
    out: &mut Vec<SyntaxNode>,
) {
    match node.kind().as_ref() {
        "namespace_definition" => out.push(lower_namespace(builder, node, ctx, templates)),
        "class_specifier" | "struct_specifier" => {
            out.extend(lower_class(builder, node, ctx, templates, Vec::new()));
        }
        "template_declaration" => lower_template(builder, node, ctx, templates, out),
        "declaration" | "type_definition" => {
            if let Some(ty) = node.field("type")
                && is_class_kind(&ty)
            {
                out.extend(lower_class(builder, &ty, ctx, templates, Vec::new()));
            }
        }
        "preproc_include" => out.extend(lower_include(builder, node, ctx)),
        kind if is_transparent(kind) => {
            for child in node.children() {
                lower_declaration(builder, &child, ctx, templates, out);
            }
        }
        _ => {}
    }
}

fn lower_namespace<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
    templates: &[String],
) -> SyntaxNode {
    let mut children = Vec::new();
    if let Some(body) = node.field("body") {
        for child in body.children() {
            lower_declaration(builder, &child, ctx, templates, &mut children);
        }
    }

    // `namespace a::b { }` nests; an anonymous namespace gets an empty name.
    let names: Vec<String> = node
        .field("name")
        .map(|n| {
            n.text()
                .split("::")
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    let mut names = names.into_iter().rev();
    let innermost = SyntaxNode::namespace(names.next().unwrap_or_default()).with_children(children);
    names.fold(innermost, |inner, name| SyntaxNode::namespace(name).with_child(inner))
}

fn lower_template<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
    templates: &[String],
    out: &mut Vec<SyntaxNode>,
) {
    let own: Vec<String> = node
        .field("parameters")
        .map(|list| {
            list.children()
                .filter_map(|param| template_param_name(&param))
                .collect()
        })
        .unwrap_or_default();

    for child in node.children() {
        match child.kind().as_ref() {
            "class_specifier" | "struct_specifier" => {
                out.extend(lower_class(builder, &child, ctx, templates, own.clone()));
            }
            "template_declaration" | "declaration" => {
                let mut scope = templates.to_vec();
                scope.extend(own.iter().cloned());
                lower_declaration(builder, &child, ctx, &scope, out);
            }
            _ => {}
        }
    }
}

fn template_param_name<D: ast_grep_core::Doc>(param: &Node<D>) -> Option<String> {
    match param.kind().as_ref() {
        "type_parameter_declaration" | "variadic_type_parameter_declaration" => param
            .children()
            .find(|c| c.kind().as_ref() == "type_identifier")
            .map(|n| n.text().to_string()),
        "optional_type_parameter_declaration" => {
            param.field("name").map(|n| n.text().to_string())
        }
        "template_template_parameter_declaration" => param
            .children()
            .filter(|c| c.kind().as_ref().ends_with("parameter_declaration"))
            .last()
            .and_then(|inner| template_param_name(&inner)),
        "parameter_declaration"
        | "optional_parameter_declaration"
        | "variadic_parameter_declaration" => param
            .field("declarator")
            .and_then(|d| declarator_shape(&d))
            .map(|(name, _)| name),
        _ => None,
    }
}

fn lower_include<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
) -> Vec<SyntaxNode> {
    let Some(path) = node.field("path") else {
        return Vec::new();
    };
    let text = path.text();
    let (target, quoted) = match path.kind().as_ref() {
        "string_literal" => (text.trim_matches('"').to_string(), true),
        "system_lib_string" => (
            text.trim_start_matches('<').trim_end_matches('>').to_string(),
            false,
        ),
        _ => {
            debug!(include = %text, "computed include not followed");
            return Vec::new();
        }
    };
    builder.include(&target, quoted, ctx.path)
}

// ── Classes ────────────────────────────────────────────────────────

fn lower_class<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
    enclosing_templates: &[String],
    own_templates: Vec<String>,
) -> Option<SyntaxNode> {
    let raw_name = node.field("name").map(|n| n.text().to_string());
    let Some(body) = node.field("body") else {
        let (_, name) = split_class_name(raw_name.as_deref()?);
        return Some(SyntaxNode::forward_class(name));
    };
    let (qualifiers, name) = split_class_name(raw_name.as_deref().unwrap_or_default());

    let start = ctx.lines.location(node.range().start);
    let brace = ctx.lines.location(body.range().end.saturating_sub(1));
    let end = Location::new(brace.line, brace.column + 1);

    let mut templates = enclosing_templates.to_vec();
    templates.extend(own_templates.iter().cloned());

    let mut class = SyntaxNode::new(NodeKind::ClassDefinition, name).with_template_params(own_templates);
    match Extent::new(ctx.path, start, end) {
        Ok(extent) => class = class.with_extent(extent),
        Err(error) => debug!(%error, "class extent rejected"),
    }

    for child in node.children() {
        match child.kind().as_ref() {
            "attribute_specifier" | "attribute_declaration" => {
                class = class.with_annotation(annotation_text(&child.text()));
            }
            "base_class_clause" => {
                class = class.with_children(base_specifiers(&child).into_iter().map(SyntaxNode::base));
            }
            _ => {}
        }
    }

    let mut members = Vec::new();
    for member in body.children() {
        lower_member(builder, &member, ctx, &templates, &mut members);
    }
    class = class.with_children(members);

    // Out-of-line `class ns::Name { }` definitions keep their qualifiers as scopes.
    Some(
        qualifiers
            .into_iter()
            .rev()
            .fold(class, |inner, q| SyntaxNode::namespace(q).with_child(inner)),
    )
}

fn lower_member<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
    templates: &[String],
    out: &mut Vec<SyntaxNode>,
) {
    match node.kind().as_ref() {
        "field_declaration" => lower_field_declaration(builder, node, ctx, templates, out),
        "class_specifier" | "struct_specifier" => {
            out.extend(lower_class(builder, node, ctx, templates, Vec::new()));
        }
        "template_declaration" => lower_template(builder, node, ctx, templates, out),
        kind if is_preproc_conditional(kind) => {
            for child in node.children() {
                lower_member(builder, &child, ctx, templates, out);
            }
        }
        _ => {}
    }
}

fn lower_field_declaration<D: ast_grep_core::Doc>(
    builder: &mut UnitBuilder<'_>,
    node: &Node<D>,
    ctx: &FileCtx<'_>,
    templates: &[String],
    out: &mut Vec<SyntaxNode>,
) {
    let Some(ty) = node.field("type") else {
        return;
    };
    if is_class_kind(&ty) && ty.field("body").is_some() {
        out.extend(lower_class(builder, &ty, ctx, templates, Vec::new()));
    }
    let is_static = node.children().any(|c| {
        c.kind().as_ref() == "storage_class_specifier" && c.text().as_ref() == "static"
    });
    if is_static {
        return;
    }

    let is_const = node
        .children()
        .any(|c| c.kind().as_ref() == "type_qualifier" && c.text().as_ref() == "const");
    let spelling = if is_const {
        format!("const {}", ty.text())
    } else {
        ty.text().to_string()
    };
    let base_kind = type_kind(&ty, templates);

    for child in node.children() {
        if !is_declarator(child.kind().as_ref()) {
            continue;
        }
        if let Some((name, shape)) = declarator_shape(&child) {
            out.push(SyntaxNode::field(
                name,
                TypeDescriptor::new(spelling.clone(), shape.unwrap_or(base_kind)),
            ));
        }
    }
}

// ── Types and declarators ──────────────────────────────────────────

fn type_kind<D: ast_grep_core::Doc>(ty: &Node<D>, templates: &[String]) -> TypeKind {
    let text = ty.text();
    let head = text.split(['<', ':']).next().unwrap_or_default().trim();
    match ty.kind().as_ref() {
        "primitive_type" | "sized_type_specifier" => TypeKind::Builtin,
        "type_identifier" | "qualified_identifier" | "template_type" => {
            if templates.iter().any(|t| t == head) {
                TypeKind::Dependent
            } else {
                TypeKind::Record
            }
        }
        "dependent_type" => TypeKind::Dependent,
        "class_specifier" | "struct_specifier" if ty.field("body").is_none() => TypeKind::Record,
        _ => TypeKind::Other,
    }
}

/// Name and, when wrapped, the structural kind a declarator imposes.
fn declarator_shape<D: ast_grep_core::Doc>(node: &Node<D>) -> Option<(String, Option<TypeKind>)> {
    let wrapped = |kind: TypeKind| {
        inner_declarator(node)
            .and_then(|inner| declarator_shape(&inner))
            .map(|(name, _)| (name, Some(kind)))
    };
    match node.kind().as_ref() {
        "field_identifier" | "identifier" => Some((node.text().to_string(), None)),
        "pointer_declarator" => wrapped(TypeKind::Pointer),
        "reference_declarator" => wrapped(TypeKind::Reference),
        "array_declarator" => wrapped(TypeKind::Array),
        "parenthesized_declarator" | "attributed_declarator" | "init_declarator" => {
            inner_declarator(node).and_then(|inner| declarator_shape(&inner))
        }
        // function_declarator: a method, not a data member
        _ => None,
    }
}

fn inner_declarator<'r, D: ast_grep_core::Doc>(node: &Node<'r, D>) -> Option<Node<'r, D>> {
    node.field("declarator").or_else(|| {
        node.children()
            .filter(|c| is_declarator(c.kind().as_ref()))
            .last()
    })
}

fn is_declarator(kind: &str) -> bool {
    matches!(
        kind,
        "field_identifier"
            | "identifier"
            | "pointer_declarator"
            | "reference_declarator"
            | "array_declarator"
            | "function_declarator"
            | "parenthesized_declarator"
            | "attributed_declarator"
            | "init_declarator"
    )
}

fn is_class_kind<D: ast_grep_core::Doc>(node: &Node<D>) -> bool {
    matches!(node.kind().as_ref(), "class_specifier" | "struct_specifier")
}

fn is_preproc_conditional(kind: &str) -> bool {
    matches!(
        kind,
        "preproc_if" | "preproc_ifdef" | "preproc_else" | "preproc_elif" | "preproc_elifdef"
    )
}

fn is_transparent(kind: &str) -> bool {
    is_preproc_conditional(kind) || matches!(kind, "linkage_specification" | "declaration_list")
}

// ── Helpers ────────────────────────────────────────────────────────

/// Split `ns::Outer::Inner` into qualifiers and the simple name, ignoring
/// `::` inside template arguments.
fn split_class_name(raw: &str) -> (Vec<String>, String) {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    let mut chars = raw.trim().chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ':' if depth == 0 && chars.peek() == Some(&':') => {
                chars.next();
                if !current.trim().is_empty() {
                    segments.push(current.trim().to_string());
                }
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    let name = current.trim().to_string();
    (segments, name)
}

fn base_specifiers<D: ast_grep_core::Doc>(clause: &Node<D>) -> Vec<String> {
    let mut bases = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut flush = |current: &mut Vec<String>| {
        if !current.is_empty() {
            bases.push(current.join(" "));
            current.clear();
        }
    };
    for child in clause.children() {
        match child.kind().as_ref() {
            ":" | "comment" => {}
            "," => flush(&mut current),
            _ => current.push(child.text().trim().to_string()),
        }
    }
    flush(&mut current);
    bases
}

/// `__attribute__((annotate("gc::Trace")))` yields `gc::Trace`; `[[gc::trace]]`
/// yields `gc::trace`.
fn annotation_text(raw: &str) -> String {
    if let Some(start) = raw.find("annotate(") {
        let rest = &raw[start + "annotate(".len()..];
        if let Some((_, quoted)) = rest.split_once('"')
            && let Some((value, _)) = quoted.split_once('"')
        {
            return value.to_string();
        }
    }
    raw.trim()
        .trim_start_matches("[[")
        .trim_end_matches("]]")
        .trim()
        .to_string()
}

fn report_syntax_errors<D: ast_grep_core::Doc>(root: &Node<D>, ctx: &FileCtx<'_>) {
    fn collect<D: ast_grep_core::Doc>(node: &Node<D>, found: &mut Vec<usize>) {
        if node.kind().as_ref() == "ERROR" {
            found.push(node.range().start);
            return;
        }
        for child in node.children() {
            collect(&child, found);
        }
    }
    let mut found = Vec::new();
    collect(root, &mut found);
    if let Some(first) = found.first() {
        let at = ctx.lines.location(*first);
        warn!(
            file = %ctx.path.display(),
            errors = found.len(),
            first = %at,
            "syntax errors; classes inside them may be missed"
        );
    }
}
