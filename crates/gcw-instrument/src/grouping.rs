//! Merge findings into one insertion point per class body.
//!
//! Findings are keyed by file, then by the exact span of the owning class.
//! Within a file, insertion points are ordered by the end position of the
//! class body so the splicer can apply them in a single forward scan.

use std::collections::BTreeMap;
use std::path::PathBuf;

use gcw_core::{ClassKey, Extent, FieldUse, FieldUseKind, Span};
use serde::Serialize;
use tracing::warn;

use crate::walker::Classification;

/// A base whose traversal methods must be called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifyingBase {
    pub class: ClassKey,
    /// Spelling from the class head, e.g. `public ns::Base<int>`.
    pub spelling: String,
    pub position: usize,
}

/// A field whose traversal methods must be called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualifyingField {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldUseKind,
    pub position: usize,
}

impl From<&FieldUse> for QualifyingField {
    fn from(finding: &FieldUse) -> Self {
        Self {
            name: finding.name().to_string(),
            kind: finding.kind.clone(),
            position: finding.position,
        }
    }
}

/// Everything generated for one class body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertionPoint {
    pub extent: Extent,
    pub class: ClassKey,
    /// Qualifying bases in class-head order.
    pub bases: Vec<QualifyingBase>,
    /// Managed-pointer fields first, then fields holding carrying classes,
    /// each group in declaration order.
    pub fields: Vec<QualifyingField>,
    /// The class carries the trace annotation and gets traversal methods
    /// even with no bases or fields to forward to.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub annotated: bool,
}

impl InsertionPoint {
    fn new(class: ClassKey, extent: Extent) -> Self {
        Self {
            extent,
            class,
            bases: Vec::new(),
            fields: Vec::new(),
            annotated: false,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bases.is_empty() && self.fields.is_empty()
    }

    fn add_base(&mut self, base: QualifyingBase) {
        if !self.bases.iter().any(|b| b.class == base.class) {
            self.bases.push(base);
        }
    }

    fn add_field(&mut self, field: QualifyingField) {
        if !self.fields.iter().any(|f| f.name == field.name) {
            self.fields.push(field);
        }
    }

    fn sort(&mut self) {
        self.bases.sort_by_key(|b| b.position);
        self.fields.sort_by_key(|f| {
            (
                !matches!(f.kind, FieldUseKind::ManagedPointer),
                f.position,
            )
        });
    }
}

/// Group every finding of `classification` by file and class body.
///
/// Returns files in path order, each with its insertion points ordered by
/// ascending end line (then end column).
#[must_use]
pub fn group_insertion_points(
    classification: &Classification,
) -> BTreeMap<PathBuf, Vec<InsertionPoint>> {
    let mut grouped: BTreeMap<PathBuf, BTreeMap<Span, InsertionPoint>> = BTreeMap::new();

    for key in &classification.annotated {
        if let Some(point) = point_for(&mut grouped, classification, key) {
            point.annotated = true;
        }
    }

    for finding in classification.inherits_from_user.values() {
        if let Some(point) = point_for(&mut grouped, classification, &finding.derived) {
            point.add_base(QualifyingBase {
                class: finding.base.clone(),
                spelling: finding.base_spelling.clone(),
                position: finding.position,
            });
        }
    }
    for finding in classification
        .uses_pointer
        .values()
        .chain(classification.uses_class_that_uses_pointer.values())
    {
        if let Some(point) = point_for(&mut grouped, classification, &finding.owner) {
            point.add_field(QualifyingField::from(finding));
        }
    }

    grouped
        .into_iter()
        .map(|(file, by_span)| {
            let mut points: Vec<InsertionPoint> = by_span.into_values().collect();
            for point in &mut points {
                point.sort();
            }
            points.sort_by_key(|p| (p.extent.end, p.extent.start));
            (file, points)
        })
        .collect()
}

fn point_for<'g>(
    grouped: &'g mut BTreeMap<PathBuf, BTreeMap<Span, InsertionPoint>>,
    classification: &Classification,
    owner: &ClassKey,
) -> Option<&'g mut InsertionPoint> {
    let Some(decl) = classification.classes.get(owner) else {
        warn!(class = %owner, "finding refers to an unregistered class");
        return None;
    };
    let extent = decl.extent.clone();
    let point = grouped
        .entry(extent.file.clone())
        .or_default()
        .entry(extent.span())
        .or_insert_with(|| InsertionPoint::new(owner.clone(), extent));
    Some(point)
}
