//! Column-exact splicing of generated blocks into source text.
//!
//! Every edit is addressed against the unmodified input: a 1-based line and
//! the 0-based byte index of the closing brace on that line. Edits are applied
//! in one forward pass, so an insertion never shifts the coordinates of a
//! later one, including several insertions on the same line.

use std::path::Path;

use gcw_core::{AccessPolicy, ClassKey, Location, Span};
use tracing::{debug, warn};

use crate::error::{Diagnostic, DiagnosticKind, InstrumentError};
use crate::grouping::InsertionPoint;
use crate::synth::{BEGIN_MARKER, END_MARKER, GENERATED_MARKER, Synthesizer};

/// One text insertion before a closing brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub line: u32,
    pub column: usize,
    pub text: String,
    pub class: ClassKey,
}

/// Edits for one file plus what was skipped along the way.
#[derive(Debug, Clone, Default)]
pub struct SplicePlan {
    pub edits: Vec<Edit>,
    pub already_instrumented: Vec<ClassKey>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A generated block already present in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExistingBlock {
    /// Line of the access specifier preceding the generated marker.
    pub access_line: u32,
    pub access: Option<AccessPolicy>,
}

/// Locate generated blocks already present in `source`.
///
/// # Errors
///
/// Returns [`InstrumentError::UnbalancedMarkers`] if begin and end markers do
/// not pair up.
pub fn scan_existing_blocks(
    file: &Path,
    source: &str,
) -> Result<Vec<ExistingBlock>, InstrumentError> {
    let lines: Vec<&str> = source.lines().collect();
    let mut blocks = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed == GENERATED_MARKER {
            let access_idx = previous_non_blank(&lines, idx);
            blocks.push(ExistingBlock {
                access_line: line_number(access_idx.unwrap_or(idx)),
                access: access_idx.and_then(|i| AccessPolicy::from_keyword(lines[i])),
            });
        } else if trimmed == BEGIN_MARKER {
            if open.is_some() {
                return Err(unbalanced(file, idx));
            }
            open = Some(idx);
        } else if trimmed == END_MARKER {
            if open.take().is_none() {
                return Err(unbalanced(file, idx));
            }
        }
    }
    if let Some(idx) = open {
        return Err(unbalanced(file, idx));
    }
    Ok(blocks)
}

/// Positions of every begin marker in `source`, pointing at the `//`.
#[must_use]
pub fn begin_markers(source: &str) -> Vec<Location> {
    source
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let offset = line.find(BEGIN_MARKER)?;
            (line.trim() == BEGIN_MARKER).then(|| {
                Location::new(line_number(idx), u32::try_from(offset + 1).unwrap_or(u32::MAX))
            })
        })
        .collect()
}

/// Fail when a block already in the file was written under another policy.
///
/// # Errors
///
/// Returns [`InstrumentError::ConflictingAccessPolicy`] for the first such block.
pub fn check_access_policy(
    file: &Path,
    blocks: &[ExistingBlock],
    expected: AccessPolicy,
) -> Result<(), InstrumentError> {
    for block in blocks {
        if let Some(found) = block.access
            && found != expected
        {
            return Err(InstrumentError::ConflictingAccessPolicy {
                file: file.display().to_string(),
                line: block.access_line,
                found,
                expected,
            });
        }
    }
    Ok(())
}

/// Turn insertion points into edits, applying the brace guard and skipping
/// classes whose body already holds a generated block.
///
/// `class_spans` lists every class body in the file. A block inside a nested
/// class belongs to that class, not to the enclosing one.
#[must_use]
pub fn plan_edits(
    file: &Path,
    source: &str,
    points: &[InsertionPoint],
    class_spans: &[Span],
    synthesizer: &Synthesizer<'_>,
) -> SplicePlan {
    let lines: Vec<&str> = source.split_inclusive('\n').collect();
    let markers = begin_markers(source);
    let mut plan = SplicePlan::default();

    for point in points {
        let end = point.extent.end;
        let line_idx = (end.line as usize).saturating_sub(1);
        let column = point.extent.closing_brace_index();
        let brace_line = lines.get(line_idx);

        let guarded = match (brace_line, column) {
            (Some(text), Some(col)) => (text.as_bytes().get(col) == Some(&b'}')).then_some(col),
            _ => None,
        };
        let Some(column) = guarded else {
            let found = match (brace_line, column) {
                (Some(text), Some(col)) => text
                    .get(col..)
                    .and_then(|rest| rest.chars().next())
                    .map_or_else(|| "end of line".to_string(), |c| format!("'{c}'")),
                _ => "no such position".to_string(),
            };
            warn!(class = %point.class, extent = %point.extent, %found, "closing brace not where expected");
            plan.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::AmbiguousInsertion,
                file: file.to_path_buf(),
                line: end.line,
                column: end.column,
                class: point.class.clone(),
                message: format!("expected '}}' before column {}, found {found}", end.column),
            });
            continue;
        };

        if owns_generated_block(point.extent.span(), &markers, class_spans) {
            debug!(class = %point.class, "class already instrumented");
            plan.already_instrumented.push(point.class.clone());
            continue;
        }

        if let Some(block) = synthesizer.synthesize(point) {
            plan.edits.push(Edit {
                line: end.line,
                column,
                text: block.text,
                class: point.class.clone(),
            });
        }
    }
    plan
}

/// Apply `edits` to `source` in one forward pass.
///
/// Edits may arrive in any order; they are sorted by position first. Text
/// outside the edit points is copied through byte for byte.
#[must_use]
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by_key(|e| (e.line, e.column));
    let mut pending = ordered.into_iter().peekable();

    let extra: usize = edits.iter().map(|e| e.text.len()).sum();
    let mut out = String::with_capacity(source.len() + extra);

    for (idx, line) in source.split_inclusive('\n').enumerate() {
        let number = line_number(idx);
        let mut cursor = 0;
        while let Some(edit) = pending.next_if(|e| e.line == number) {
            let column = edit.column.min(line.len());
            out.push_str(&line[cursor..column]);
            out.push_str(&edit.text);
            cursor = column;
        }
        out.push_str(&line[cursor..]);
    }
    out
}

/// Whether a begin marker sits directly in `span`, outside every nested
/// class body.
fn owns_generated_block(span: Span, markers: &[Location], class_spans: &[Span]) -> bool {
    markers.iter().any(|&marker| {
        span.contains(marker)
            && !class_spans
                .iter()
                .any(|inner| span.strictly_encloses(inner) && inner.contains(marker))
    })
}

fn previous_non_blank(lines: &[&str], idx: usize) -> Option<usize> {
    (0..idx).rev().find(|&i| !lines[i].trim().is_empty())
}

fn line_number(idx: usize) -> u32 {
    u32::try_from(idx + 1).unwrap_or(u32::MAX)
}

fn unbalanced(file: &Path, idx: usize) -> InstrumentError {
    InstrumentError::UnbalancedMarkers {
        file: file.display().to_string(),
        line: line_number(idx),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use gcw_core::{Extent, FieldUseKind, InstrumentOptions, Location, ScopePath};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::grouping::QualifyingField;

    fn edit(line: u32, column: usize, text: &str) -> Edit {
        Edit {
            line,
            column,
            text: text.to_string(),
            class: ClassKey::new("X", ScopePath::root()),
        }
    }

    fn point(name: &str, end_line: u32, end_column: u32) -> InsertionPoint {
        InsertionPoint {
            extent: Extent::new("a.hpp", Location::new(1, 1), Location::new(end_line, end_column))
                .expect("valid extent"),
            class: ClassKey::new(name, ScopePath::root()),
            bases: Vec::new(),
            fields: vec![QualifyingField {
                name: "ptr_".to_string(),
                kind: FieldUseKind::ManagedPointer,
                position: 0,
            }],
            annotated: false,
        }
    }

    fn point_at(name: &str, start: Location, end: Location) -> InsertionPoint {
        InsertionPoint {
            extent: Extent::new("a.hpp", start, end).expect("valid extent"),
            ..point(name, 1, 1)
        }
    }

    #[test]
    fn multiple_edits_on_one_line_use_original_columns() {
        let source = "struct A { struct B {}; };\n";
        let out = apply_edits(source, &[edit(1, 24, "<a>"), edit(1, 21, "<b>")]);
        assert_eq!(out, "struct A { struct B {<b>}; <a>};\n");
    }

    #[test]
    fn text_outside_edits_is_preserved() {
        let source = "// héllo\nstruct A {\n  int x;\n};\nint tail;";
        let out = apply_edits(source, &[edit(4, 0, "X")]);
        assert_eq!(out, "// héllo\nstruct A {\n  int x;\nX};\nint tail;");
        assert_eq!(apply_edits(source, &[]), source);
    }

    #[test]
    fn guard_rejects_misaligned_brace() {
        let options = InstrumentOptions::default();
        let source = "struct A {\n  int x;\n};\n";
        let plan = plan_edits(
            &PathBuf::from("a.hpp"),
            source,
            &[point("A", 3, 3), point("B", 2, 2)],
            &[],
            &Synthesizer::new(&options),
        );
        assert_eq!(plan.edits.len(), 0);
        assert_eq!(plan.diagnostics.len(), 2);
        assert!(
            plan.diagnostics
                .iter()
                .all(|d| d.kind == DiagnosticKind::AmbiguousInsertion)
        );
    }

    #[test]
    fn instrumented_class_is_skipped_on_rerun() {
        let options = InstrumentOptions::default();
        let synthesizer = Synthesizer::new(&options);
        let file = PathBuf::from("a.hpp");
        let source = "struct A {\n  memory::gc_ptr<int> ptr_;\n};\n";

        let first = plan_edits(&file, source, &[point("A", 3, 2)], &[], &synthesizer);
        assert_eq!(first.edits.len(), 1);
        let once = apply_edits(source, &first.edits);

        let end_line = u32::try_from(once.lines().count()).expect("small file");
        let second = plan_edits(&file, &once, &[point("A", end_line, 2)], &[], &synthesizer);
        assert!(second.edits.is_empty());
        assert_eq!(second.already_instrumented.len(), 1);
    }

    #[test]
    fn block_followed_by_members_still_counts() {
        let options = InstrumentOptions::default();
        let source = "struct A {\n  memory::gc_ptr<int> ptr_;\n public:\n  // GENERATED CODE FOR GC_PTR\n  // BEGIN GC_PTR\n  // END GC_PTR\n  int added_later;\n};\n";
        let plan = plan_edits(
            &PathBuf::from("a.hpp"),
            source,
            &[point("A", 8, 2)],
            &[],
            &Synthesizer::new(&options),
        );
        assert!(plan.edits.is_empty());
        assert_eq!(plan.already_instrumented.len(), 1);
    }

    #[test]
    fn block_of_nested_class_does_not_cover_enclosing_class() {
        let options = InstrumentOptions::default();
        let source = "struct Outer {\n  struct Inner {\n    memory::gc_ptr<int> ptr_;\n    // BEGIN GC_PTR\n    // END GC_PTR\n  };\n  memory::gc_ptr<int> ptr_;\n};\n";
        let outer = point_at("Outer", Location::new(1, 1), Location::new(8, 2));
        let inner = point_at("Inner", Location::new(2, 3), Location::new(6, 4));
        let spans = [outer.extent.span(), inner.extent.span()];
        let plan = plan_edits(
            &PathBuf::from("a.hpp"),
            source,
            &[inner, outer],
            &spans,
            &Synthesizer::new(&options),
        );
        assert_eq!(plan.already_instrumented, vec![ClassKey::new("Inner", ScopePath::root())]);
        assert_eq!(plan.edits.len(), 1);
        assert_eq!(plan.edits[0].class.name, "Outer");
        assert_eq!((plan.edits[0].line, plan.edits[0].column), (8, 0));
    }

    #[test]
    fn begin_markers_point_at_the_comment() {
        let source = "struct A {\n  // BEGIN GC_PTR\n  // END GC_PTR\n  int x; // BEGIN GC_PTR\n};\n";
        assert_eq!(begin_markers(source), vec![Location::new(2, 3)]);
    }

    #[test]
    fn scan_reports_access_of_existing_blocks() {
        let source = "struct A {\n protected:\n  // GENERATED CODE FOR GC_PTR\n  // BEGIN GC_PTR\n  // END GC_PTR\n};\n";
        let file = PathBuf::from("a.hpp");
        let blocks = scan_existing_blocks(&file, source).expect("balanced");
        assert_eq!(
            blocks,
            vec![ExistingBlock {
                access_line: 2,
                access: Some(AccessPolicy::Restricted),
            }]
        );
        let err = check_access_policy(&file, &blocks, AccessPolicy::Public).unwrap_err();
        assert!(matches!(
            err,
            InstrumentError::ConflictingAccessPolicy { line: 2, .. }
        ));
        assert!(check_access_policy(&file, &blocks, AccessPolicy::Restricted).is_ok());
    }

    #[test]
    fn scan_rejects_unbalanced_markers() {
        let source = "struct A {\n  // BEGIN GC_PTR\n};\n";
        let err = scan_existing_blocks(&PathBuf::from("a.hpp"), source).unwrap_err();
        assert!(matches!(err, InstrumentError::UnbalancedMarkers { line: 2, .. }));
    }
}
