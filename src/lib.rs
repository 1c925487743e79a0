//! # classlift core: semantic analysis and code generation
//!
//! Translates an already-parsed, already-type-checked tree of a
//! class-based source language into an equivalent tree of a
//! prototype-based output language.
//!
//! ## Ground rules
//!
//! 1. **Scope trees are built once.** One pass per unit constructs the
//!    arena top-down; the tree is immutable afterwards and owned by the
//!    unit.
//!
//! 2. **Resolution never throws.** A miss everywhere yields the
//!    explicit unresolved marker; consuming rules decide whether that
//!    is worth a diagnostic.
//!
//! 3. **Origin is threaded through resolution.** A member hit on a
//!    type scope knows whether the request crossed into a different
//!    `this` context, which is how outer-instance captures are caught
//!    before they reach generated code.
//!
//! 4. **Checks accumulate, writers gate.** The check pass never stops
//!    on a finding; all of a unit's diagnostics are reported together,
//!    and a unit with any error produces no output tree.
//!
//! 5. **Writer dispatch is a fold, not a chain of early returns.**
//!    Every registered writer runs; later registrations receive, and
//!    may replace, the accumulated result. `Defer` is an explicit
//!    sentinel, distinct from an empty translation.
//!
//! 6. **Instantiations classify into exactly one of four shapes**, in
//!    precedence order: object literal, inline function value,
//!    immediately-constructed anonymous type, regular constructor
//!    call.

pub mod checks;
pub mod compile;
pub mod context;
pub mod dispatch;
pub mod ir;
pub mod js;
pub mod naming;
pub mod scope;
pub mod writer;

pub use compile::{compile_unit, compile_unit_json, compile_units, CompileOptions, CompileResult};
pub use context::{Diagnostic, FatalError, GenerationContext, Severity};
pub use dispatch::{
    CheckContributor, ContributorRegistry, TreeDispatcher, WriteOutcome, WriterContributor,
};
pub use ir::{CompilationUnit, NodeKind, SyntaxNode, TypeInfo, TypeRegistry};
pub use js::{JsNode, JsProgram};
pub use naming::{FlatNamingStrategy, NamingStrategy};
pub use scope::{
    NameKind, QualifiedName, Resolution, ScopeArena, ScopeBuilder, ScopeId, ScopeKind, ScopeTree,
    TypeMembers,
};

/// The standard rule set: every default check and writer, registered
/// in their fixed order.
pub fn default_registry() -> ContributorRegistry {
    let mut registry = ContributorRegistry::new();
    checks::register_default_checks(&mut registry);
    writer::register_default_writers(&mut registry);
    registry
}

#[cfg(test)]
mod scope_tests;

#[cfg(test)]
mod compile_tests;
