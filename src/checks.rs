//! Check contributors: rules that recognize constructs the output
//! language cannot express and report them as diagnostics.
//!
//! Checks are side-effect only. They never halt the traversal, so one
//! pass collects every violation in the unit.

use crate::context::{
    Diagnostic, GenerationContext, Severity, ERR_DUPLICATE_MEMBER, ERR_INIT_BLOCK_SHAPE,
    ERR_INLINE_FUNCTION_SHAPE, ERR_OUTER_FIELD_ACCESS, ERR_OUTER_METHOD_ACCESS,
};
use crate::dispatch::{CheckContributor, ContributorRegistry, TreeDispatcher};
use crate::ir::{NodeKind, SyntaxNode};
use std::collections::HashMap;

/// Wires the default rule set into a registry. Order is fixed here and
/// nowhere else; it is the only priority contributors have.
pub fn register_default_checks(registry: &mut ContributorRegistry) {
    registry.contribute_check(Box::new(IdentifierOuterScopeCheck));
    registry.contribute_check(Box::new(MethodInvocationOuterScopeCheck));
    registry.contribute_check(Box::new(DuplicateMemberCheck));
    registry.contribute_check(Box::new(InitBlockAssignmentsCheck));
    registry.contribute_check(Box::new(InlineFunctionShapeCheck));
}

// ═══════════════════════════════════════════════════════════════════════════════
// OUTER-SCOPE ACCESS
// ═══════════════════════════════════════════════════════════════════════════════

/// A bare identifier resolving to a member of an enclosing type would
/// need the enclosing instance at runtime; the output language has no
/// implicit capture for that.
pub struct IdentifierOuterScopeCheck;

impl CheckContributor for IdentifierOuterScopeCheck {
    fn kind(&self) -> NodeKind {
        NodeKind::Identifier
    }

    fn check(&self, _dispatcher: &TreeDispatcher, node: &SyntaxNode, ctx: &mut GenerationContext) {
        let SyntaxNode::Identifier(ident) = node else {
            return;
        };
        let resolved = ctx.resolve_identifier(ident.pos, &ident.name);
        if resolved.is_outer_access() {
            let qualified = resolved.qualified().unwrap_or(&ident.name).to_string();
            let file = ctx.file_path.clone();
            ctx.report(Diagnostic::with_hints(
                ERR_OUTER_FIELD_ACCESS,
                Severity::Error,
                &format!(
                    "Identifier `{}` resolves to `{}` on an enclosing type.",
                    ident.name, qualified
                ),
                &file,
                ident.pos,
                vec!["Pass the value in explicitly or make the member static.".to_string()],
            ));
        }
    }
}

/// Same classification for bare method calls.
pub struct MethodInvocationOuterScopeCheck;

impl CheckContributor for MethodInvocationOuterScopeCheck {
    fn kind(&self) -> NodeKind {
        NodeKind::MethodInvocation
    }

    fn check(&self, _dispatcher: &TreeDispatcher, node: &SyntaxNode, ctx: &mut GenerationContext) {
        let SyntaxNode::MethodInvocation(call) = node else {
            return;
        };
        if call.target.is_some() {
            return;
        }
        let resolved = ctx.resolve_method(call.pos, &call.name);
        if resolved.is_outer_access() {
            let qualified = resolved.qualified().unwrap_or(&call.name).to_string();
            let file = ctx.file_path.clone();
            ctx.report(Diagnostic::error(
                ERR_OUTER_METHOD_ACCESS,
                &format!(
                    "Call to `{}` resolves to `{}` on an enclosing type.",
                    call.name, qualified
                ),
                &file,
                call.pos,
            ));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATION SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Fields and methods land in one flat prototype namespace, so a type
/// may not declare two members with the same name.
pub struct DuplicateMemberCheck;

impl CheckContributor for DuplicateMemberCheck {
    fn kind(&self) -> NodeKind {
        NodeKind::ClassDecl
    }

    fn check(&self, _dispatcher: &TreeDispatcher, node: &SyntaxNode, ctx: &mut GenerationContext) {
        let SyntaxNode::ClassDecl(class) = node else {
            return;
        };
        let mut seen: HashMap<&str, ()> = HashMap::new();
        for member in &class.members {
            let (name, pos) = match member {
                SyntaxNode::FieldDecl(f) => (f.name.as_str(), f.pos),
                SyntaxNode::MethodDecl(m) => (m.name.as_str(), m.pos),
                _ => continue,
            };
            if seen.insert(name, ()).is_some() {
                let file = ctx.file_path.clone();
                ctx.report(Diagnostic::error(
                    ERR_DUPLICATE_MEMBER,
                    &format!("Type `{}` declares member `{}` more than once.", class.name, name),
                    &file,
                    pos,
                ));
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTANTIATION SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

/// A synthetic (marker) type must translate to an object literal, so
/// its initializer block may contain only plain assignments. Plain
/// types are left alone here: an unrecognized statement simply makes
/// the writer fall through to the anonymous-type form.
pub struct InitBlockAssignmentsCheck;

impl CheckContributor for InitBlockAssignmentsCheck {
    fn kind(&self) -> NodeKind {
        NodeKind::NewInstance
    }

    fn check(&self, _dispatcher: &TreeDispatcher, node: &SyntaxNode, ctx: &mut GenerationContext) {
        let SyntaxNode::NewInstance(new) = node else {
            return;
        };
        if !ctx.types.is_synthetic(&new.type_name) {
            return;
        }
        let Some(body) = &new.body else {
            return;
        };
        for member in body {
            let SyntaxNode::InitBlock(block) = member else {
                continue;
            };
            if block.is_static {
                continue;
            }
            for stmt in &block.statements {
                if !is_plain_assignment(stmt) {
                    let file = ctx.file_path.clone();
                    ctx.report(Diagnostic::error(
                        ERR_INIT_BLOCK_SHAPE,
                        &format!(
                            "Initializer of synthetic type `{}` may contain only `name = value` assignments.",
                            new.type_name
                        ),
                        &file,
                        stmt.pos(),
                    ));
                }
            }
        }
    }
}

pub(crate) fn is_plain_assignment(stmt: &SyntaxNode) -> bool {
    let SyntaxNode::ExpressionStmt(expr_stmt) = stmt else {
        return false;
    };
    let SyntaxNode::Assignment(assign) = expr_stmt.expr.as_ref() else {
        return false;
    };
    matches!(
        assign.target.as_ref(),
        SyntaxNode::Identifier(_) | SyntaxNode::MemberSelect(_)
    )
}

/// Instantiating a single-method functional contract with a body only
/// makes sense when the body is exactly that one method.
pub struct InlineFunctionShapeCheck;

impl CheckContributor for InlineFunctionShapeCheck {
    fn kind(&self) -> NodeKind {
        NodeKind::NewInstance
    }

    fn check(&self, _dispatcher: &TreeDispatcher, node: &SyntaxNode, ctx: &mut GenerationContext) {
        let SyntaxNode::NewInstance(new) = node else {
            return;
        };
        if ctx.types.function_method(&new.type_name).is_none() {
            return;
        }
        let Some(body) = &new.body else {
            return;
        };
        let methods = body
            .iter()
            .filter(|m| matches!(m, SyntaxNode::MethodDecl(_)))
            .count();
        let others = body.len() - methods;
        if methods != 1 || others != 0 {
            let file = ctx.file_path.clone();
            ctx.report(Diagnostic::error(
                ERR_INLINE_FUNCTION_SHAPE,
                &format!(
                    "Instantiation of functional contract `{}` must declare exactly one method.",
                    new.type_name
                ),
                &file,
                new.pos,
            ));
        }
    }
}
