//! Diagnostics and the per-unit generation context.

use crate::ir::{SourcePosition, TypeRegistry};
use crate::naming::{FlatNamingStrategy, NamingStrategy};
use crate::scope::{QualifiedName, ScopeId, ScopeTree};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_OUTER_FIELD_ACCESS: &str = "CL-ERR-SCOPE-001";
pub const ERR_OUTER_METHOD_ACCESS: &str = "CL-ERR-SCOPE-002";
pub const ERR_DUPLICATE_MEMBER: &str = "CL-ERR-MEMBER-001";
pub const ERR_INIT_BLOCK_SHAPE: &str = "CL-ERR-INIT-001";
pub const ERR_INLINE_FUNCTION_SHAPE: &str = "CL-ERR-FUNC-001";
pub const ERR_UNDECLARED_NAME: &str = "CL-ERR-NAME-001";

/// The guarantee each invariant code protects; reported alongside the
/// message so users see what the rule is for, not just what it caught.
fn guarantee_for(code: &str) -> &'static str {
    match code {
        ERR_OUTER_FIELD_ACCESS => {
            "Generated code never captures an enclosing instance implicitly."
        }
        ERR_OUTER_METHOD_ACCESS => {
            "Generated calls always have an explicit receiver in scope."
        }
        ERR_DUPLICATE_MEMBER => {
            "A type's members map one-to-one onto prototype properties."
        }
        ERR_INIT_BLOCK_SHAPE => {
            "Initializer blocks translate to object literals without behavior."
        }
        ERR_INLINE_FUNCTION_SHAPE => {
            "A functional contract instantiation is exactly one function value."
        }
        ERR_UNDECLARED_NAME => "Every emitted name has a known binding.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTICS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub code: String,
    pub severity: Severity,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub hints: Vec<String>,
}

impl Diagnostic {
    pub fn error(code: &str, message: &str, file: &str, pos: SourcePosition) -> Self {
        Self::with_hints(code, Severity::Error, message, file, pos, vec![])
    }

    pub fn warning(code: &str, message: &str, file: &str, pos: SourcePosition) -> Self {
        Self::with_hints(code, Severity::Warning, message, file, pos, vec![])
    }

    pub fn with_hints(
        code: &str,
        severity: Severity,
        message: &str,
        file: &str,
        pos: SourcePosition,
        hints: Vec<String>,
    ) -> Self {
        Diagnostic {
            code: code.to_string(),
            severity,
            message: message.to_string(),
            guarantee: guarantee_for(code).to_string(),
            file: file.to_string(),
            line: pos.line,
            column: pos.column,
            hints,
        }
    }
}

/// Internal invariants the core assumes always hold. One of these
/// firing aborts generation for the unit; continuing would emit an
/// unsound output tree.
#[derive(Debug, Clone, Error)]
pub enum FatalError {
    #[error("missing type information for `{qualified}` in {file}")]
    MissingTypeInfo { qualified: String, file: String },
    #[error("internal invariant violated in {file}: {message}")]
    Invariant { file: String, message: String },
}

// ═══════════════════════════════════════════════════════════════════════════════
// GENERATION CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Mutable state of one unit's translation: the current-scope cursor,
/// the append-only diagnostic sink and the naming strategy. Owned by a
/// single traversal; never shared across units.
pub struct GenerationContext<'a> {
    pub file_path: String,
    pub scopes: &'a ScopeTree,
    /// The frontend's binding/type facts, read-only.
    pub types: Arc<TypeRegistry>,
    current: ScopeId,
    diagnostics: Vec<Diagnostic>,
    naming: Box<dyn NamingStrategy>,
}

impl<'a> GenerationContext<'a> {
    pub fn new(file_path: &str, scopes: &'a ScopeTree, types: Arc<TypeRegistry>) -> Self {
        Self::with_naming(file_path, scopes, types, Box::new(FlatNamingStrategy::new()))
    }

    pub fn with_naming(
        file_path: &str,
        scopes: &'a ScopeTree,
        types: Arc<TypeRegistry>,
        naming: Box<dyn NamingStrategy>,
    ) -> Self {
        GenerationContext {
            file_path: file_path.to_string(),
            scopes,
            types,
            current: scopes.unit_scope,
            diagnostics: Vec::new(),
            naming,
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    /// Moves the cursor and returns the previous position for the
    /// caller to restore on the way back up.
    pub fn enter_scope(&mut self, scope: ScopeId) -> ScopeId {
        std::mem::replace(&mut self.current, scope)
    }

    pub fn restore_scope(&mut self, previous: ScopeId) {
        self.current = previous;
    }

    /// Cursor entry keyed by the input node's identity; `None` when the
    /// node has no attached scope.
    pub fn enter_node_scope(&mut self, id: crate::ir::NodeId) -> Option<ScopeId> {
        self.scopes.scope_for(id).map(|s| self.enter_scope(s))
    }

    pub fn names(&mut self) -> &mut dyn NamingStrategy {
        self.naming.as_mut()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    // Convenience resolution entry points from the cursor.

    pub fn resolve_method(&self, pos: SourcePosition, name: &str) -> QualifiedName {
        self.scopes.arena.resolve_method(self.current, pos, name)
    }

    pub fn resolve_identifier(&self, pos: SourcePosition, name: &str) -> QualifiedName {
        self.scopes.arena.resolve_identifier(self.current, pos, name)
    }

    pub fn resolve_type(&self, pos: SourcePosition, name: &str) -> QualifiedName {
        self.scopes.arena.resolve_type(self.current, pos, name)
    }
}
