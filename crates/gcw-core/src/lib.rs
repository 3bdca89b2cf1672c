//! # gcw-core
//!
//! Core types shared across all gcwire crates.
//!
//! This crate provides the foundational types the instrumentation pipeline is
//! built on:
//! - Source extents and locations (1-based lines, 1-based byte columns)
//! - Declaration identity: scope paths, class keys, member keys
//! - The syntax-tree contract a C++ front end must produce
//! - Discovered declarations and findings (managed-pointer fields,
//!   using-class fields, inheritance uses)
//! - Instrumentation options shared by configuration and the pipeline
//! - Cross-cutting error types

pub mod declarations;
pub mod errors;
pub mod extent;
pub mod identity;
pub mod options;
pub mod syntax;

pub use declarations::{
    BaseSpecifier, ClassDeclaration, FieldDeclaration, FieldUse, FieldUseKind, InheritanceUse,
};
pub use errors::ModelError;
pub use extent::{Extent, Location, Span};
pub use identity::{ClassKey, MemberKey, Scope, ScopeKind, ScopePath, TypeName};
pub use options::{AccessPolicy, CallStyle, ClosureStrategy, InstrumentOptions, PointerTemplate};
pub use syntax::{NodeKind, SyntaxNode, TranslationUnit, TypeDescriptor, TypeKind};
