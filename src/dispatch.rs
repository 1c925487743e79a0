//! Contributor registry and the tree dispatch engine.
//!
//! Rules attach behavior to syntactic node kinds without the traversal
//! knowing any rule by name. The registry is assembled once at process
//! start from an explicit list, then shared read-only across every
//! unit translation.
//!
//! Writer dispatch is a left-to-right fold over the registered chain:
//! every contributor runs and receives the accumulated result so far
//! as its fallback. Returning a result replaces the accumulator (a
//! later registration wins); returning the fallback (or `Defer`)
//! leaves it. There is no early return; `Defer` is an explicit
//! "no opinion" sentinel, distinct from a legitimately empty result.

use crate::context::{FatalError, GenerationContext};
use crate::ir::{NodeKind, SyntaxNode};
use crate::js::JsNode;
use indexmap::IndexMap;
use log::trace;

// ═══════════════════════════════════════════════════════════════════════════════
// CONTRIBUTOR CONTRACTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// No opinion; the accumulated result stands.
    Defer,
    /// This is the node's translation. May legitimately be empty.
    Emit(Vec<JsNode>),
}

impl WriteOutcome {
    pub fn is_defer(&self) -> bool {
        matches!(self, WriteOutcome::Defer)
    }
}

/// Validating rule: inspects the tree and the context, appends
/// diagnostics, never halts the traversal.
pub trait CheckContributor: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn check(&self, dispatcher: &TreeDispatcher, node: &SyntaxNode, ctx: &mut GenerationContext);
}

/// Transforming rule: produces zero-or-one output fragment list for
/// its node, or defers to the accumulated fallback.
pub trait WriterContributor: Send + Sync {
    fn kind(&self) -> NodeKind;

    fn write(
        &self,
        dispatcher: &TreeDispatcher,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
        fallback: WriteOutcome,
    ) -> Result<WriteOutcome, FatalError>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Node kind → ordered contributor lists. Registration order is the
/// only priority; nothing is sorted or deduplicated, so registering a
/// rule twice runs it twice.
#[derive(Default)]
pub struct ContributorRegistry {
    checks: IndexMap<NodeKind, Vec<Box<dyn CheckContributor>>>,
    writers: IndexMap<NodeKind, Vec<Box<dyn WriterContributor>>>,
}

impl ContributorRegistry {
    pub fn new() -> Self {
        ContributorRegistry::default()
    }

    pub fn contribute_check(&mut self, rule: Box<dyn CheckContributor>) {
        self.checks.entry(rule.kind()).or_default().push(rule);
    }

    pub fn contribute_writer(&mut self, rule: Box<dyn WriterContributor>) {
        self.writers.entry(rule.kind()).or_default().push(rule);
    }

    fn checks_for(&self, kind: NodeKind) -> &[Box<dyn CheckContributor>] {
        self.checks.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn writers_for(&self, kind: NodeKind) -> &[Box<dyn WriterContributor>] {
        self.writers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DISPATCH ENGINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Drives one traversal of the input tree, invoking registered
/// contributors per node and keeping the context's scope cursor in
/// step with the lexical structure.
pub struct TreeDispatcher<'r> {
    registry: &'r ContributorRegistry,
}

impl<'r> TreeDispatcher<'r> {
    pub fn new(registry: &'r ContributorRegistry) -> Self {
        TreeDispatcher { registry }
    }

    /// Validation pass. All contributors for a node run regardless of
    /// earlier findings; diagnostics accumulate across the whole unit.
    pub fn run_checks(&self, node: &SyntaxNode, ctx: &mut GenerationContext) {
        for rule in self.registry.checks_for(node.kind()) {
            rule.check(self, node, ctx);
        }

        // A bodied instantiation's scope covers the body only; its
        // arguments resolve in the surrounding scope.
        if let SyntaxNode::NewInstance(new) = node {
            for arg in &new.args {
                self.run_checks(arg, ctx);
            }
            if let Some(body) = &new.body {
                let prev = ctx.enter_node_scope(new.id);
                for member in body {
                    self.run_checks(member, ctx);
                }
                if let Some(p) = prev {
                    ctx.restore_scope(p);
                }
            }
            return;
        }

        let prev = node
            .scope_node_id()
            .and_then(|id| ctx.enter_node_scope(id));
        for child in node.children() {
            self.run_checks(child, ctx);
        }
        if let Some(p) = prev {
            ctx.restore_scope(p);
        }
    }

    /// Translation of one node: fold the writer chain, then fall back
    /// to the generic default translation if every writer deferred.
    pub fn write_node(
        &self,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<JsNode>, FatalError> {
        let prev = node
            .scope_node_id()
            .and_then(|id| ctx.enter_node_scope(id));
        let result = self.write_inner(node, ctx);
        if let Some(p) = prev {
            ctx.restore_scope(p);
        }
        result
    }

    fn write_inner(
        &self,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<JsNode>, FatalError> {
        let writers = self.registry.writers_for(node.kind());
        let mut acc = WriteOutcome::Defer;
        for writer in writers {
            acc = writer.write(self, node, ctx, acc)?;
        }
        match acc {
            WriteOutcome::Emit(fragments) => Ok(fragments),
            WriteOutcome::Defer => {
                trace!("default translation for {:?}", node.kind());
                self.default_translation(node, ctx)
            }
        }
    }

    /// Generic structural translation: every child translated in
    /// source order, fragments flattened.
    pub fn default_translation(
        &self,
        node: &SyntaxNode,
        ctx: &mut GenerationContext,
    ) -> Result<Vec<JsNode>, FatalError> {
        let mut fragments = Vec::new();
        if let SyntaxNode::NewInstance(new) = node {
            for arg in &new.args {
                fragments.extend(self.write_node(arg, ctx)?);
            }
            if let Some(body) = &new.body {
                let prev = ctx.enter_node_scope(new.id);
                for member in body {
                    fragments.extend(self.write_node(member, ctx)?);
                }
                if let Some(p) = prev {
                    ctx.restore_scope(p);
                }
            }
            return Ok(fragments);
        }
        for child in node.children() {
            fragments.extend(self.write_node(child, ctx)?);
        }
        Ok(fragments)
    }
}
