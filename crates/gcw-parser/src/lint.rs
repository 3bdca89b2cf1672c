//! Lint: managed pointers captured by lambdas outside an allowed context.
//!
//! A lambda that captures a managed pointer keeps it alive on another
//! thread's stack without it being connected as a root. Such lambdas are only
//! accepted when they are handed straight to a construction of the allowed
//! context type (by default `std::thread`).

use std::path::{Path, PathBuf};

use ast_grep_core::Node;
use ast_grep_language::SupportLang;
use gcw_core::{PointerTemplate, TranslationUnit};
use serde::Serialize;
use tracing::debug;

use crate::frontend::LineIndex;
use crate::parser::parse_source;

/// One captured managed pointer outside the allowed context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error(
    "{}:{line}:{column}: managed pointer '{variable}' captured by a lambda outside a {context} construction",
    file.display()
)]
pub struct LintViolation {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub variable: String,
    pub context: String,
}

/// Checks lambda captures against the managed-pointer template.
#[derive(Debug, Clone)]
pub struct LambdaCaptureLint {
    pointer: PointerTemplate,
    allowed_context: String,
}

impl LambdaCaptureLint {
    #[must_use]
    pub fn new(pointer: &PointerTemplate, allowed_context: impl Into<String>) -> Self {
        Self {
            pointer: pointer.clone(),
            allowed_context: allowed_context.into(),
        }
    }

    /// Lint every file of a lowered unit, in path order.
    #[must_use]
    pub fn check_unit(&self, unit: &TranslationUnit) -> Vec<LintViolation> {
        unit.sources
            .iter()
            .flat_map(|(path, text)| self.check_source(path, text))
            .collect()
    }

    /// Lint one file's text.
    #[must_use]
    pub fn check_source(&self, file: &Path, source: &str) -> Vec<LintViolation> {
        let tree = parse_source(source, SupportLang::Cpp);
        let lines = LineIndex::new(source);
        let mut lambdas = Vec::new();
        collect_kind(&tree.root(), "lambda_expression", &mut lambdas);

        let mut violations = Vec::new();
        for lambda in &lambdas {
            let captured = self.captured_pointers(lambda);
            if captured.is_empty() {
                continue;
            }
            if self.in_allowed_context(lambda) {
                debug!(file = %file.display(), variables = ?captured, "lambda capture allowed");
                continue;
            }
            let at = lines.location(lambda.range().start);
            violations.extend(captured.into_iter().map(|variable| LintViolation {
                file: file.to_path_buf(),
                line: at.line,
                column: at.column,
                variable,
                context: self.allowed_context.clone(),
            }));
        }
        violations
    }

    /// Managed-pointer variables of the enclosing function the lambda captures,
    /// in capture order.
    fn captured_pointers<D: ast_grep_core::Doc>(&self, lambda: &Node<D>) -> Vec<String> {
        let Some(function) = lambda
            .ancestors()
            .find(|a| a.kind().as_ref() == "function_definition")
        else {
            return Vec::new();
        };

        let mut managed = self.managed_declarations(&function);
        let shadowed = declared_names(lambda, |_| true);
        managed.retain(|name| !shadowed.contains(name));
        if managed.is_empty() {
            return Vec::new();
        }

        let mut referenced = Vec::new();
        if let Some(captures) = lambda.field("captures") {
            collect_identifiers(&captures, &mut referenced);
            let has_default = captures
                .children()
                .any(|c| c.kind().as_ref() == "lambda_default_capture");
            if has_default && let Some(body) = lambda.field("body") {
                collect_identifiers(&body, &mut referenced);
            }
        }

        let mut captured: Vec<String> = Vec::new();
        for name in referenced {
            if managed.contains(&name) && !captured.contains(&name) {
                captured.push(name);
            }
        }
        captured
    }

    fn managed_declarations<D: ast_grep_core::Doc>(&self, function: &Node<D>) -> Vec<String> {
        declared_names(function, |ty| self.pointer.matches(ty))
    }

    fn in_allowed_context<D: ast_grep_core::Doc>(&self, lambda: &Node<D>) -> bool {
        for ancestor in lambda.ancestors() {
            let allowed = match ancestor.kind().as_ref() {
                "compound_statement" | "function_definition" | "translation_unit" => return false,
                "call_expression" => ancestor.field("function"),
                "declaration" | "new_expression" => ancestor.field("type"),
                _ => None,
            }
            .is_some_and(|n| n.text().contains(self.allowed_context.as_str()));
            if allowed {
                return true;
            }
        }
        false
    }
}

/// Names declared under `scope` (parameters and local declarations) whose
/// type text satisfies `accept`.
fn declared_names<D: ast_grep_core::Doc>(scope: &Node<D>, accept: impl Fn(&str) -> bool) -> Vec<String> {
    let mut declarations = Vec::new();
    for kind in [
        "parameter_declaration",
        "optional_parameter_declaration",
        "declaration",
    ] {
        collect_kind(scope, kind, &mut declarations);
    }

    let mut names = Vec::new();
    for declaration in &declarations {
        let Some(ty) = declaration.field("type") else {
            continue;
        };
        if !accept(ty.text().as_ref()) {
            continue;
        }
        for child in declaration.children() {
            if child.range() == ty.range() {
                continue;
            }
            if let Some(name) = declared_name(&child) {
                names.push(name);
            }
        }
    }
    names
}

fn collect_kind<'r, D: ast_grep_core::Doc>(node: &Node<'r, D>, kind: &str, out: &mut Vec<Node<'r, D>>) {
    for child in node.children() {
        if child.kind().as_ref() == kind {
            out.push(child.clone());
        }
        collect_kind(&child, kind, out);
    }
}

fn collect_identifiers<D: ast_grep_core::Doc>(node: &Node<D>, out: &mut Vec<String>) {
    if node.kind().as_ref() == "identifier" {
        out.push(node.text().to_string());
        return;
    }
    for child in node.children() {
        collect_identifiers(&child, out);
    }
}

fn declared_name<D: ast_grep_core::Doc>(declarator: &Node<D>) -> Option<String> {
    match declarator.kind().as_ref() {
        "identifier" => Some(declarator.text().to_string()),
        "init_declarator"
        | "pointer_declarator"
        | "reference_declarator"
        | "array_declarator"
        | "parenthesized_declarator" => declarator
            .field("declarator")
            .or_else(|| {
                declarator.children().find(|c| {
                    let kind = c.kind();
                    kind.as_ref() == "identifier" || kind.as_ref().ends_with("declarator")
                })
            })
            .and_then(|inner| declared_name(&inner)),
        _ => None,
    }
}
