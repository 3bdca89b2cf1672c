//! # gcw-instrument
//!
//! Discovers which classes of a compilation unit transitively hold a managed
//! pointer and splices `connectToRoot` / `disconnectFromRoot` traversal
//! methods into their bodies.
//!
//! The pipeline, leaves first:
//! 1. [`walker`]: one recursive walk classifying fields and bases against
//!    the carrying set known so far
//! 2. [`closure`]: repeats the walk until the sets stop growing
//! 3. [`grouping`]: merges findings into one insertion point per class body,
//!    ordered by end line
//! 4. [`synth`]: renders the generated block for an insertion point
//! 5. [`splice`]: applies the blocks to the original text in one forward pass
//!
//! [`Pipeline`] ties the stages together for one translation unit.

pub mod closure;
pub mod error;
pub mod grouping;
pub mod index;
pub mod pipeline;
pub mod splice;
pub mod synth;
pub mod walker;

pub use closure::ClosureResolver;
pub use error::{Diagnostic, DiagnosticKind, InstrumentError};
pub use grouping::{InsertionPoint, QualifyingBase, QualifyingField, group_insertion_points};
pub use index::ClassIndex;
pub use pipeline::{Analysis, FileRewrite, Pipeline, RunReport};
pub use synth::{BEGIN_MARKER, END_MARKER, GENERATED_MARKER, GeneratedBlock, Synthesizer};
pub use walker::{Classification, GraphWalker};
