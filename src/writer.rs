//! Writer contributors: translation of input constructs into output
//! trees.
//!
//! The instantiation writer is the interesting one. A single input
//! construct ("construct an instance of T, optionally with a body")
//! has four legal output shapes, tried in fixed precedence: object
//! literal, inline function, immediately-constructed anonymous type,
//! regular constructor call. First applicable wins.

use crate::context::{Diagnostic, FatalError, GenerationContext, ERR_UNDECLARED_NAME};
use crate::dispatch::{ContributorRegistry, TreeDispatcher, WriteOutcome, WriterContributor};
use crate::ir::{
    ClassDeclNode, InitBlockNode, LiteralValue, NewInstanceNode, NodeKind, SyntaxNode,
};
use crate::js::{self, JsNode};
use indexmap::IndexMap;

/// Wires the default writer library into a registry. Registered first
/// on purpose: later registrations receive these results as fallback
/// and may override them.
pub fn register_default_writers(registry: &mut ContributorRegistry) {
    registry.contribute_writer(Box::new(LiteralWriter));
    registry.contribute_writer(Box::new(IdentifierWriter));
    registry.contribute_writer(Box::new(MemberSelectWriter));
    registry.contribute_writer(Box::new(IndexAccessWriter));
    registry.contribute_writer(Box::new(AssignmentWriter));
    registry.contribute_writer(Box::new(VariableDeclWriter));
    registry.contribute_writer(Box::new(ExpressionStmtWriter));
    registry.contribute_writer(Box::new(ReturnWriter));
    registry.contribute_writer(Box::new(WhileWriter));
    registry.contribute_writer(Box::new(BlockWriter));
    registry.contribute_writer(Box::new(MethodDeclWriter));
    registry.contribute_writer(Box::new(MethodInvocationWriter));
    registry.contribute_writer(Box::new(ClassDeclWriter));
    registry.contribute_writer(Box::new(InstantiationWriter));
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHARED HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Collapses a fragment list that must hold exactly one node. Anything
/// else is an internal invariant violation: the writers upstream are
/// specified to emit one fragment per expression.
fn single(
    fragments: Vec<JsNode>,
    ctx: &GenerationContext,
    what: &str,
) -> Result<JsNode, FatalError> {
    let count = fragments.len();
    let mut iter = fragments.into_iter();
    match (iter.next(), iter.next()) {
        (Some(node), None) => Ok(node),
        _ => Err(FatalError::Invariant {
            file: ctx.file_path.clone(),
            message: format!("{} translated to {} fragments, expected one", what, count),
        }),
    }
}

fn write_single(
    dispatcher: &TreeDispatcher,
    node: &SyntaxNode,
    ctx: &mut GenerationContext,
    what: &str,
) -> Result<JsNode, FatalError> {
    let fragments = dispatcher.write_node(node, ctx)?;
    single(fragments, ctx, what)
}

/// Translates an argument list: each argument recursively, results
/// flattened left-to-right, source order preserved. Shared by all four
/// instantiation forms and by call translation.
fn arguments(
    dispatcher: &TreeDispatcher,
    args: &[SyntaxNode],
    ctx: &mut GenerationContext,
) -> Result<Vec<JsNode>, FatalError> {
    let mut out = Vec::new();
    for arg in args {
        out.extend(dispatcher.write_node(arg, ctx)?);
    }
    Ok(out)
}

/// Statement list of a translated body: a lone block is unwrapped so
/// function bodies do not nest a redundant block.
fn body_statements(
    dispatcher: &TreeDispatcher,
    body: &SyntaxNode,
    ctx: &mut GenerationContext,
) -> Result<Vec<JsNode>, FatalError> {
    let mut fragments = dispatcher.write_node(body, ctx)?;
    if let [JsNode::Block { .. }] = fragments.as_slice() {
        if let Some(JsNode::Block { statements }) = fragments.pop() {
            return Ok(statements);
        }
    }
    Ok(fragments)
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSION WRITERS
// ═══════════════════════════════════════════════════════════════════════════════

pub struct LiteralWriter;

impl WriterContributor for LiteralWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::Literal
    }

    fn write(
        &self,
        _dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        _ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::Literal(lit) = node else {
            return Ok(fallback);
        };
        let out = match &lit.value {
            LiteralValue::Null => js::null(),
            LiteralValue::Bool(b) => js::bool(*b),
            LiteralValue::Number(n) => js::number(*n),
            LiteralValue::String(s) => js::string(s.clone()),
        };
        Ok(WriteOutcome::Emit(vec![out]))
    }
}

/// Bare identifiers are qualified at compile time: a hit on the
/// current type's members becomes an explicit `this` access, anything
/// else keeps its (possibly renamed) simple name.
pub struct IdentifierWriter;

impl WriterContributor for IdentifierWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::Identifier
    }

    fn write(
        &self,
        _dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::Identifier(ident) = node else {
            return Ok(fallback);
        };
        let resolved = ctx.resolve_identifier(ident.pos, &ident.name);
        let out = match resolved.defining_scope() {
            Some(scope) if ctx.scopes.arena.scope(scope).kind.is_this_scope() => {
                js::member(js::this(), ctx.names().identifier(&ident.name))
            }
            Some(_) => js::name(ctx.names().identifier(&ident.name)),
            None => {
                let file = ctx.file_path.clone();
                ctx.report(Diagnostic::error(
                    ERR_UNDECLARED_NAME,
                    &format!("Identifier `{}` has no binding in scope.", ident.name),
                    &file,
                    ident.pos,
                ));
                js::name(ident.name.clone())
            }
        };
        Ok(WriteOutcome::Emit(vec![out]))
    }
}

pub struct MemberSelectWriter;

impl WriterContributor for MemberSelectWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::MemberSelect
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::MemberSelect(select) = node else {
            return Ok(fallback);
        };
        let target = write_single(dispatcher, &select.target, ctx, "member-select target")?;
        let property = ctx.names().identifier(&select.member);
        Ok(WriteOutcome::Emit(vec![js::member(target, property)]))
    }
}

pub struct IndexAccessWriter;

impl WriterContributor for IndexAccessWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::IndexAccess
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::IndexAccess(access) = node else {
            return Ok(fallback);
        };
        let target = write_single(dispatcher, &access.target, ctx, "index target")?;
        let idx = write_single(dispatcher, &access.index, ctx, "index expression")?;
        Ok(WriteOutcome::Emit(vec![js::index(target, idx)]))
    }
}

pub struct AssignmentWriter;

impl WriterContributor for AssignmentWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::Assignment
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::Assignment(assign) = node else {
            return Ok(fallback);
        };
        let target = write_single(dispatcher, &assign.target, ctx, "assignment target")?;
        let value = write_single(dispatcher, &assign.value, ctx, "assignment value")?;
        Ok(WriteOutcome::Emit(vec![js::assign(target, value)]))
    }
}

pub struct MethodInvocationWriter;

impl WriterContributor for MethodInvocationWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::MethodInvocation
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::MethodInvocation(call) = node else {
            return Ok(fallback);
        };
        let args = arguments(dispatcher, &call.args, ctx)?;
        let callee = match &call.target {
            Some(target) => {
                let receiver = write_single(dispatcher, target, ctx, "call receiver")?;
                js::member(receiver, ctx.names().identifier(&call.name))
            }
            None => {
                let resolved = ctx.resolve_method(call.pos, &call.name);
                match resolved.qualified() {
                    Some(qualified) => match resolved.defining_scope() {
                        Some(scope) if ctx.scopes.arena.scope(scope).kind.is_this_scope() => {
                            js::member(js::this(), ctx.names().identifier(&call.name))
                        }
                        _ => qualified_callee(ctx, qualified, &call.name),
                    },
                    None => {
                        let file = ctx.file_path.clone();
                        ctx.report(Diagnostic::error(
                            ERR_UNDECLARED_NAME,
                            &format!("Call to `{}` has no binding in scope.", call.name),
                            &file,
                            call.pos,
                        ));
                        js::name(call.name.clone())
                    }
                }
            }
        };
        Ok(WriteOutcome::Emit(vec![js::call(callee, args)]))
    }
}

/// `a.b.C.member` → `<type name for a.b.C>.member`; a bare qualified
/// name without a dot keeps its simple form.
fn qualified_callee(ctx: &mut GenerationContext, qualified: &str, simple: &str) -> JsNode {
    match qualified.rsplit_once('.') {
        Some((type_part, member)) => {
            let owner = ctx.names().type_name(type_part);
            js::member(js::name(owner), ctx.names().identifier(member))
        }
        None => js::name(ctx.names().identifier(simple)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENT WRITERS
// ═══════════════════════════════════════════════════════════════════════════════

pub struct VariableDeclWriter;

impl WriterContributor for VariableDeclWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::VariableDecl
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::VariableDecl(decl) = node else {
            return Ok(fallback);
        };
        let init = match &decl.init {
            Some(expr) => Some(write_single(dispatcher, expr, ctx, "initializer")?),
            None => None,
        };
        let name = ctx.names().identifier(&decl.name);
        Ok(WriteOutcome::Emit(vec![js::var_decl(name, init)]))
    }
}

pub struct ExpressionStmtWriter;

impl WriterContributor for ExpressionStmtWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::ExpressionStmt
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::ExpressionStmt(stmt) = node else {
            return Ok(fallback);
        };
        let expr = write_single(dispatcher, &stmt.expr, ctx, "statement expression")?;
        Ok(WriteOutcome::Emit(vec![js::expr_stmt(expr)]))
    }
}

pub struct ReturnWriter;

impl WriterContributor for ReturnWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::Return
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::Return(ret) = node else {
            return Ok(fallback);
        };
        let expr = match &ret.expr {
            Some(expr) => Some(write_single(dispatcher, expr, ctx, "return value")?),
            None => None,
        };
        Ok(WriteOutcome::Emit(vec![js::return_stmt(expr)]))
    }
}

pub struct WhileWriter;

impl WriterContributor for WhileWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::While
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::While(stmt) = node else {
            return Ok(fallback);
        };
        let condition = write_single(dispatcher, &stmt.condition, ctx, "loop condition")?;
        let body = dispatcher.write_node(&stmt.body, ctx)?;
        Ok(WriteOutcome::Emit(vec![JsNode::While {
            condition: Box::new(condition),
            body,
        }]))
    }
}

pub struct BlockWriter;

impl WriterContributor for BlockWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::Block
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::Block(block) = node else {
            return Ok(fallback);
        };
        let mut statements = Vec::new();
        for stmt in &block.statements {
            statements.extend(dispatcher.write_node(stmt, ctx)?);
        }
        Ok(WriteOutcome::Emit(vec![js::block(statements)]))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATION WRITERS
// ═══════════════════════════════════════════════════════════════════════════════

/// A method becomes a bare function expression; attachment to a type
/// is the class writer's business.
pub struct MethodDeclWriter;

impl WriterContributor for MethodDeclWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::MethodDecl
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::MethodDecl(method) = node else {
            return Ok(fallback);
        };
        let params = method
            .params
            .iter()
            .map(|p| ctx.names().identifier(&p.name))
            .collect();
        let body = match &method.body {
            Some(body) => body_statements(dispatcher, body, ctx)?,
            None => vec![],
        };
        Ok(WriteOutcome::Emit(vec![js::function(params, body)]))
    }
}

/// Top-level type declaration: a constructor function holding the
/// instance initialization, methods on the prototype, statics on the
/// constructor itself, nested types as properties.
pub struct ClassDeclWriter;

impl WriterContributor for ClassDeclWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::ClassDecl
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::ClassDecl(class) = node else {
            return Ok(fallback);
        };
        let type_name = ctx.names().type_name(&class.name);
        let ctor = constructor_function(dispatcher, ctx, &class.members)?;
        let mut out = vec![js::var_decl(type_name.clone(), Some(ctor))];
        out.extend(member_attachments(
            dispatcher,
            ctx,
            js::name(type_name),
            class,
        )?);
        Ok(WriteOutcome::Emit(out))
    }
}

/// Instance side of a class body: field initializations and instance
/// initializer blocks, in declaration order, inside one constructor
/// function.
fn constructor_function(
    dispatcher: &TreeDispatcher,
    ctx: &mut GenerationContext,
    members: &[SyntaxNode],
) -> Result<JsNode, FatalError> {
    let mut body = Vec::new();
    for member in members {
        match member {
            SyntaxNode::FieldDecl(field) if !field.is_static => {
                let init = match &field.init {
                    Some(expr) => write_single(dispatcher, expr, ctx, "field initializer")?,
                    None => js::null(),
                };
                let slot = js::member(js::this(), ctx.names().identifier(&field.name));
                body.push(js::expr_stmt(js::assign(slot, init)));
            }
            SyntaxNode::InitBlock(block) if !block.is_static => {
                body.extend(init_block_statements(dispatcher, ctx, block)?);
            }
            _ => {}
        }
    }
    Ok(js::function(vec![], body))
}

fn init_block_statements(
    dispatcher: &TreeDispatcher,
    ctx: &mut GenerationContext,
    block: &InitBlockNode,
) -> Result<Vec<JsNode>, FatalError> {
    let prev = ctx.enter_node_scope(block.id);
    let mut out = Vec::new();
    let mut result = Ok(());
    for stmt in &block.statements {
        match dispatcher.write_node(stmt, ctx) {
            Ok(fragments) => out.extend(fragments),
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }
    if let Some(p) = prev {
        ctx.restore_scope(p);
    }
    result.map(|_| out)
}

/// Everything hanging off the constructor: prototype methods, statics,
/// static initializer blocks as immediate invocations, nested types.
fn member_attachments(
    dispatcher: &TreeDispatcher,
    ctx: &mut GenerationContext,
    target: JsNode,
    class: &ClassDeclNode,
) -> Result<Vec<JsNode>, FatalError> {
    let mut out = Vec::new();
    for member in &class.members {
        match member {
            SyntaxNode::MethodDecl(method) => {
                let function = write_single(dispatcher, member, ctx, "method")?;
                let slot = if method.is_static {
                    js::member(target.clone(), ctx.names().identifier(&method.name))
                } else {
                    js::member(
                        js::member(target.clone(), "prototype"),
                        ctx.names().identifier(&method.name),
                    )
                };
                out.push(js::expr_stmt(js::assign(slot, function)));
            }
            SyntaxNode::FieldDecl(field) if field.is_static => {
                let init = match &field.init {
                    Some(expr) => write_single(dispatcher, expr, ctx, "static field initializer")?,
                    None => js::null(),
                };
                let slot = js::member(target.clone(), ctx.names().identifier(&field.name));
                out.push(js::expr_stmt(js::assign(slot, init)));
            }
            SyntaxNode::InitBlock(block) if block.is_static => {
                let statements = init_block_statements(dispatcher, ctx, block)?;
                out.push(js::expr_stmt(js::call(
                    js::paren(js::function(vec![], statements)),
                    vec![],
                )));
            }
            SyntaxNode::ClassDecl(nested) => {
                out.extend(nested_class(dispatcher, ctx, target.clone(), nested)?);
            }
            _ => {}
        }
    }
    Ok(out)
}

/// `Outer.Inner = function(){...};` plus Inner's own attachments, all
/// translated under Inner's scope.
fn nested_class(
    dispatcher: &TreeDispatcher,
    ctx: &mut GenerationContext,
    parent_target: JsNode,
    nested: &ClassDeclNode,
) -> Result<Vec<JsNode>, FatalError> {
    let prev = ctx.enter_node_scope(nested.id);
    let result = (|| -> Result<Vec<JsNode>, FatalError> {
        let simple = crate::ir::simple_name(&nested.name).to_string();
        let target = js::member(parent_target, ctx.names().identifier(&simple));
        let ctor = constructor_function(dispatcher, ctx, &nested.members)?;
        let mut out = vec![js::expr_stmt(js::assign(target.clone(), ctor))];
        out.extend(member_attachments(dispatcher, ctx, target, nested)?);
        Ok(out)
    })();
    if let Some(p) = prev {
        ctx.restore_scope(p);
    }
    result
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTANTIATION: FOUR-FORM TRANSLATION
// ═══════════════════════════════════════════════════════════════════════════════

pub struct InstantiationWriter;

impl WriterContributor for InstantiationWriter {
    fn kind(&self) -> NodeKind {
        NodeKind::NewInstance
    }

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError> {
        let SyntaxNode::NewInstance(new) = node else {
            return Ok(fallback);
        };

        if let Some(out) = object_initializer(dispatcher, new, ctx)? {
            return Ok(WriteOutcome::Emit(out));
        }
        if let Some(out) = inline_function(dispatcher, new, ctx)? {
            return Ok(WriteOutcome::Emit(out));
        }
        if let Some(out) = anonymous_type(dispatcher, new, ctx)? {
            return Ok(WriteOutcome::Emit(out));
        }
        Ok(WriteOutcome::Emit(regular_new(dispatcher, new, ctx)?))
    }
}

/// Form 1: `new T() {{ x = 1; y = 2; }}` becomes an object literal.
/// Applicable when the body's first non-static initializer block holds
/// only plain assignments, or when the type is synthetic and there is
/// no block at all. Keys keep source order; a duplicate key overwrites
/// in place, so the last write wins.
fn object_initializer(
    dispatcher: &TreeDispatcher,
    new: &NewInstanceNode,
    ctx: &mut GenerationContext,
) -> Result<Option<Vec<JsNode>>, FatalError> {
    let block = first_instance_init_block(new);
    if block.is_none() && !ctx.types.is_synthetic(&new.type_name) {
        return Ok(None);
    }

    let mut properties = IndexMap::new();
    if let Some(block) = block {
        let outer = ctx.enter_node_scope(new.id);
        let inner = ctx.enter_node_scope(block.id);
        let mut recognized = true;
        for stmt in &block.statements {
            let Some((key, value_expr)) = assignment_parts(stmt) else {
                recognized = false;
                break;
            };
            let value = write_single(dispatcher, value_expr, ctx, "initializer value")?;
            properties.insert(key.to_string(), value);
        }
        if let Some(p) = inner {
            ctx.restore_scope(p);
        }
        if let Some(p) = outer {
            ctx.restore_scope(p);
        }
        if !recognized {
            return Ok(None);
        }
    }
    Ok(Some(vec![js::object(properties)]))
}

/// Form 2: instantiating a single-method functional contract becomes
/// that method translated to a bare function value; the wrapping type
/// disappears.
fn inline_function(
    dispatcher: &TreeDispatcher,
    new: &NewInstanceNode,
    ctx: &mut GenerationContext,
) -> Result<Option<Vec<JsNode>>, FatalError> {
    if ctx.types.function_method(&new.type_name).is_none() {
        return Ok(None);
    }
    let Some(body) = &new.body else {
        return Ok(None);
    };
    let Some(method) = body
        .iter()
        .find(|m| matches!(m, SyntaxNode::MethodDecl(_)))
    else {
        return Ok(None);
    };

    let prev = ctx.enter_node_scope(new.id);
    let result = write_single(dispatcher, method, ctx, "contract method");
    if let Some(p) = prev {
        ctx.restore_scope(p);
    }
    Ok(Some(vec![result?]))
}

/// Form 3: for any other body, the anonymous type is translated to a
/// constructor function, parenthesized and constructed immediately
/// with the (shared) translated argument list.
fn anonymous_type(
    dispatcher: &TreeDispatcher,
    new: &NewInstanceNode,
    ctx: &mut GenerationContext,
) -> Result<Option<Vec<JsNode>>, FatalError> {
    let Some(body) = &new.body else {
        return Ok(None);
    };

    let args = arguments(dispatcher, &new.args, ctx)?;
    let prev = ctx.enter_node_scope(new.id);
    let declaration = (|| -> Result<JsNode, FatalError> {
        let mut ctor_body = Vec::new();
        for member in body {
            match member {
                SyntaxNode::FieldDecl(field) if !field.is_static => {
                    let init = match &field.init {
                        Some(expr) => write_single(dispatcher, expr, ctx, "field initializer")?,
                        None => js::null(),
                    };
                    let slot = js::member(js::this(), ctx.names().identifier(&field.name));
                    ctor_body.push(js::expr_stmt(js::assign(slot, init)));
                }
                SyntaxNode::InitBlock(block) if !block.is_static => {
                    ctor_body.extend(init_block_statements(dispatcher, ctx, block)?);
                }
                SyntaxNode::MethodDecl(method) => {
                    // No name to hang a prototype on; methods attach to
                    // the instance.
                    let function = write_single(dispatcher, member, ctx, "method")?;
                    let slot = js::member(js::this(), ctx.names().identifier(&method.name));
                    ctor_body.push(js::expr_stmt(js::assign(slot, function)));
                }
                _ => {}
            }
        }
        Ok(js::function(vec![], ctor_body))
    })();
    if let Some(p) = prev {
        ctx.restore_scope(p);
    }

    Ok(Some(vec![js::new_expr(js::paren(declaration?), args)]))
}

/// Form 4, the default: `new <output name for T>(<args>)`.
fn regular_new(
    dispatcher: &TreeDispatcher,
    new: &NewInstanceNode,
    ctx: &mut GenerationContext,
) -> Result<Vec<JsNode>, FatalError> {
    let args = arguments(dispatcher, &new.args, ctx)?;
    let type_name = ctx.names().type_name(&new.type_name);
    Ok(vec![js::new_expr(js::name(type_name), args)])
}

/// First non-static initializer block of the instantiation body, if
/// any. Static blocks never qualify.
fn first_instance_init_block(new: &NewInstanceNode) -> Option<&InitBlockNode> {
    new.body.as_ref()?.iter().find_map(|member| match member {
        SyntaxNode::InitBlock(block) if !block.is_static => Some(block),
        _ => None,
    })
}

/// `x = …` keys by `x`; `a.b = …` keys by `b`. Anything else (an
/// indexed target, a compound statement) is not a recognizable
/// initializer entry.
fn assignment_parts(stmt: &SyntaxNode) -> Option<(&str, &SyntaxNode)> {
    let SyntaxNode::ExpressionStmt(expr_stmt) = stmt else {
        return None;
    };
    let SyntaxNode::Assignment(assign) = expr_stmt.expr.as_ref() else {
        return None;
    };
    let key = match assign.target.as_ref() {
        SyntaxNode::Identifier(ident) => ident.name.as_str(),
        SyntaxNode::MemberSelect(select) => select.member.as_str(),
        _ => return None,
    };
    Some((key, assign.value.as_ref()))
}
