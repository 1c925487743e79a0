//! Lexical scope model and name resolution.
//!
//! A scope tree is built exactly once per compilation unit and is
//! immutable afterwards. Scopes live in an arena owned by the unit;
//! parent links are plain indices, so the whole tree is freed with the
//! unit and cannot form ownership cycles.
//!
//! Resolution walks the parent chain from the requesting scope. The
//! scope where the request originated (the *origin*) is threaded
//! through the walk unchanged, because a hit in a type-bearing scope
//! must know whether the request crossed into a different `this`
//! context on the way up; that distinction is what downstream rules
//! use to reject enclosing-instance captures the output language
//! cannot express.

use crate::ir::{
    self, BlockNode, ClassDeclNode, CompilationUnit, InitBlockNode, MethodDeclNode,
    NewInstanceNode, NodeId, SourcePosition, SyntaxNode, TypeInfo, TypeRegistry,
};
use log::{debug, trace};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(pub usize);

// ═══════════════════════════════════════════════════════════════════════════════
// SCOPE VARIANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Direct member sets of a type, as seen by its scope. Copied out of
/// the frontend facts (or scanned from the declaration when the
/// registry has no entry) at build time, so resolution stays local to
/// the arena.
#[derive(Debug, Clone, Default)]
pub struct TypeMembers {
    pub type_name: String,
    pub fields: HashSet<String>,
    pub methods: HashSet<String>,
    pub inner_types: HashSet<String>,
}

impl From<&TypeInfo> for TypeMembers {
    fn from(info: &TypeInfo) -> Self {
        TypeMembers {
            type_name: info.qualified.clone(),
            fields: info.fields.clone(),
            methods: info.methods.clone(),
            inner_types: info.inner_types.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScopeKind {
    /// Root of every chain; the only variant that can answer
    /// "not found" instead of delegating.
    FullyQualified { facts: Arc<TypeRegistry> },
    /// Names bound by the unit's explicit imports.
    Import {
        /// simple type name → qualified type name
        types: HashMap<String, String>,
        /// simple member name → qualified member path; answers both the
        /// method and the identifier namespace, since one static import
        /// exposes both a field and a method of that name.
        static_members: HashMap<String, String>,
    },
    /// Members declared directly on a type; access from inside the
    /// type's own methods is local `this` access.
    Type(TypeMembers),
    /// Members of an enclosing type, visible from a nested type.
    /// A hit here is always an outer-instance access.
    ParentType(TypeMembers),
    /// Variables declared directly in a block.
    Variable { variables: HashSet<String> },
    /// A callable's formal parameters.
    Parameter { params: HashSet<String> },
}

impl ScopeKind {
    /// True exactly for the variants that carry an instance context.
    pub fn is_this_scope(&self) -> bool {
        matches!(self, ScopeKind::Type(_) | ScopeKind::ParentType(_))
    }
}

#[derive(Debug)]
pub struct Scope {
    /// Identifies the scope among its siblings; debugging only.
    pub name: String,
    pub kind: ScopeKind,
    parent: Option<ScopeId>,
    children: Vec<ScopeId>,
}

impl Scope {
    pub fn parent(&self) -> Option<ScopeId> {
        self.parent
    }

    pub fn children(&self) -> &[ScopeId] {
        &self.children
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION RESULTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameKind {
    Method,
    Identifier,
    Type,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "kebab-case")]
pub enum Resolution {
    Bound {
        defining_scope: ScopeId,
        qualified: String,
        outer_access: bool,
    },
    Unresolved,
}

/// Outcome of one resolution query: a full binding or the explicit
/// unresolved marker, never anything in between.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QualifiedName {
    pub kind: NameKind,
    pub resolution: Resolution,
}

impl QualifiedName {
    fn bound(kind: NameKind, defining_scope: ScopeId, qualified: String, outer: bool) -> Self {
        QualifiedName {
            kind,
            resolution: Resolution::Bound {
                defining_scope,
                qualified,
                outer_access: outer,
            },
        }
    }

    fn unresolved(kind: NameKind) -> Self {
        QualifiedName {
            kind,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Bound { .. })
    }

    pub fn is_outer_access(&self) -> bool {
        matches!(
            self.resolution,
            Resolution::Bound {
                outer_access: true,
                ..
            }
        )
    }

    pub fn defining_scope(&self) -> Option<ScopeId> {
        match &self.resolution {
            Resolution::Bound { defining_scope, .. } => Some(*defining_scope),
            Resolution::Unresolved => None,
        }
    }

    pub fn qualified(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Bound { qualified, .. } => Some(qualified),
            Resolution::Unresolved => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ARENA + RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        ScopeArena::default()
    }

    pub fn push(
        &mut self,
        name: impl Into<String>,
        parent: Option<ScopeId>,
        kind: ScopeKind,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        self.scopes.push(Scope {
            name: name.into(),
            kind,
            parent,
            children: Vec::new(),
        });
        if let Some(p) = parent {
            self.scopes[p.0].children.push(id);
        }
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// Full dot-notation name from the root; debugging only.
    pub fn path(&self, id: ScopeId) -> String {
        let scope = self.scope(id);
        match scope.parent {
            Some(parent) => format!("{}.{}", self.path(parent), scope.name),
            None => scope.name.clone(),
        }
    }

    pub fn resolve_method(&self, scope: ScopeId, _pos: SourcePosition, name: &str) -> QualifiedName {
        self.resolve(NameKind::Method, scope, scope, name)
    }

    pub fn resolve_identifier(
        &self,
        scope: ScopeId,
        _pos: SourcePosition,
        name: &str,
    ) -> QualifiedName {
        self.resolve(NameKind::Identifier, scope, scope, name)
    }

    pub fn resolve_type(&self, scope: ScopeId, _pos: SourcePosition, name: &str) -> QualifiedName {
        self.resolve(NameKind::Type, scope, scope, name)
    }

    /// The per-variant search. Only the logic of the current scope's
    /// variant runs; a miss recurses to the parent with the origin
    /// unchanged.
    fn resolve(
        &self,
        kind: NameKind,
        current: ScopeId,
        origin: ScopeId,
        name: &str,
    ) -> QualifiedName {
        let scope = self.scope(current);
        let hit = match &scope.kind {
            ScopeKind::Variable { variables } => match kind {
                NameKind::Identifier if variables.contains(name) => {
                    Some(QualifiedName::bound(kind, current, name.to_string(), false))
                }
                _ => None,
            },
            ScopeKind::Parameter { params } => match kind {
                NameKind::Identifier if params.contains(name) => {
                    Some(QualifiedName::bound(kind, current, name.to_string(), false))
                }
                _ => None,
            },
            ScopeKind::Type(members) => self.member_hit(members, kind, name).map(|qualified| {
                let outer = self.crosses_this_boundary(origin, current);
                QualifiedName::bound(kind, current, qualified, outer)
            }),
            ScopeKind::ParentType(members) => self
                .member_hit(members, kind, name)
                .map(|qualified| QualifiedName::bound(kind, current, qualified, true)),
            ScopeKind::Import {
                types,
                static_members,
            } => match kind {
                NameKind::Type => types
                    .get(name)
                    .map(|q| QualifiedName::bound(kind, current, q.clone(), false)),
                NameKind::Method | NameKind::Identifier => static_members
                    .get(name)
                    .map(|q| QualifiedName::bound(kind, current, q.clone(), false)),
            },
            ScopeKind::FullyQualified { facts } => {
                // Terminal: either the name reads as a complete global
                // binding, or the chain ends in the unresolved marker.
                let known = match kind {
                    NameKind::Type => facts.contains(name),
                    NameKind::Method | NameKind::Identifier => facts.resolve_qualified_member(name),
                };
                return if known {
                    QualifiedName::bound(kind, current, name.to_string(), false)
                } else {
                    trace!("unresolved {:?} `{}`", kind, name);
                    QualifiedName::unresolved(kind)
                };
            }
        };

        match hit {
            Some(result) => result,
            None => match scope.parent {
                Some(parent) => self.resolve(kind, parent, origin, name),
                None => QualifiedName::unresolved(kind),
            },
        }
    }

    fn member_hit(&self, members: &TypeMembers, kind: NameKind, name: &str) -> Option<String> {
        let found = match kind {
            NameKind::Identifier => members.fields.contains(name),
            NameKind::Method => members.methods.contains(name),
            NameKind::Type => members.inner_types.contains(name),
        };
        found.then(|| format!("{}.{}", members.type_name, name))
    }

    /// Whether the walk from `origin` up to `target` passes another
    /// instance-bearing scope. If it does, the request originated under
    /// a different `this` than the defining type's.
    fn crosses_this_boundary(&self, origin: ScopeId, target: ScopeId) -> bool {
        let mut cursor = Some(origin);
        while let Some(id) = cursor {
            if id == target {
                return false;
            }
            if self.scope(id).kind.is_this_scope() {
                return true;
            }
            cursor = self.scope(id).parent;
        }
        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCOPE TREE CONSTRUCTION
// ═══════════════════════════════════════════════════════════════════════════════

/// One unit's finished scope tree: the arena plus the attachment table
/// from scope-introducing input nodes to their scopes.
#[derive(Debug)]
pub struct ScopeTree {
    pub arena: ScopeArena,
    pub root: ScopeId,
    /// The import scope; the cursor starts here at unit top level.
    pub unit_scope: ScopeId,
    by_node: HashMap<NodeId, ScopeId>,
}

impl ScopeTree {
    pub fn scope_for(&self, id: NodeId) -> Option<ScopeId> {
        self.by_node.get(&id).copied()
    }
}

pub struct ScopeBuilder {
    arena: ScopeArena,
    facts: Arc<TypeRegistry>,
    by_node: HashMap<NodeId, ScopeId>,
    anon_counter: u32,
}

impl ScopeBuilder {
    /// Walks the unit once, top-down, creating a scope per lexical
    /// construct and recording the attachment table.
    pub fn build(unit: &CompilationUnit, facts: Arc<TypeRegistry>) -> ScopeTree {
        let mut builder = ScopeBuilder {
            arena: ScopeArena::new(),
            facts,
            by_node: HashMap::new(),
            anon_counter: 0,
        };

        let root = builder.arena.push(
            "root",
            None,
            ScopeKind::FullyQualified {
                facts: builder.facts.clone(),
            },
        );

        let mut types = HashMap::new();
        let mut static_members = HashMap::new();
        for import in &unit.imports {
            let simple = import.simple_name().to_string();
            if import.is_static {
                static_members.insert(simple, import.qualified.clone());
            } else {
                types.insert(simple, import.qualified.clone());
            }
        }
        let unit_scope = builder.arena.push(
            "import",
            Some(root),
            ScopeKind::Import {
                types,
                static_members,
            },
        );

        for decl in &unit.types {
            builder.visit(decl, unit_scope, None);
        }

        debug!("built {} scopes for {}", builder.arena.len(), unit.file_path);

        ScopeTree {
            arena: builder.arena,
            root,
            unit_scope,
            by_node: builder.by_node,
        }
    }

    fn visit(&mut self, node: &SyntaxNode, current: ScopeId, enclosing: Option<&TypeMembers>) {
        match node {
            SyntaxNode::ClassDecl(class) => self.visit_class(class, current, enclosing),
            SyntaxNode::MethodDecl(method) => self.visit_method(method, current, enclosing),
            SyntaxNode::Block(b) => self.visit_block(b, current, enclosing),
            SyntaxNode::InitBlock(b) => self.visit_init_block(b, current, enclosing),
            SyntaxNode::NewInstance(new) if new.body.is_some() => {
                self.visit_anonymous(new, current, enclosing)
            }
            _ => {
                for child in node.children() {
                    self.visit(child, current, enclosing);
                }
            }
        }
    }

    fn visit_class(
        &mut self,
        class: &ClassDeclNode,
        current: ScopeId,
        enclosing: Option<&TypeMembers>,
    ) {
        let mut attach = current;
        if let Some(outer) = enclosing {
            attach = self.arena.push(
                format!("parent-type {}", outer.type_name),
                Some(attach),
                ScopeKind::ParentType(outer.clone()),
            );
        }
        let members = self.members_of(&class.name, &class.members);
        let type_scope = self.arena.push(
            format!("type {}", ir::simple_name(&class.name)),
            Some(attach),
            ScopeKind::Type(members.clone()),
        );
        self.by_node.insert(class.id, type_scope);
        for member in &class.members {
            self.visit(member, type_scope, Some(&members));
        }
    }

    fn visit_method(
        &mut self,
        method: &MethodDeclNode,
        current: ScopeId,
        enclosing: Option<&TypeMembers>,
    ) {
        let params = method.params.iter().map(|p| p.name.clone()).collect();
        let scope = self.arena.push(
            format!("param {}", method.name),
            Some(current),
            ScopeKind::Parameter { params },
        );
        self.by_node.insert(method.id, scope);
        if let Some(body) = &method.body {
            self.visit(body, scope, enclosing);
        }
    }

    fn visit_block(&mut self, block: &BlockNode, current: ScopeId, enclosing: Option<&TypeMembers>) {
        let scope = self.arena.push(
            "block",
            Some(current),
            ScopeKind::Variable {
                variables: declared_variables(&block.statements),
            },
        );
        self.by_node.insert(block.id, scope);
        for stmt in &block.statements {
            self.visit(stmt, scope, enclosing);
        }
    }

    fn visit_init_block(
        &mut self,
        block: &InitBlockNode,
        current: ScopeId,
        enclosing: Option<&TypeMembers>,
    ) {
        let scope = self.arena.push(
            if block.is_static { "static-init" } else { "init" },
            Some(current),
            ScopeKind::Variable {
                variables: declared_variables(&block.statements),
            },
        );
        self.by_node.insert(block.id, scope);
        for stmt in &block.statements {
            self.visit(stmt, scope, enclosing);
        }
    }

    /// A bodied instantiation declares an anonymous type extending the
    /// named one: its scope sees the body's own members plus the named
    /// type's. Arguments stay in the surrounding scope.
    fn visit_anonymous(
        &mut self,
        new: &NewInstanceNode,
        current: ScopeId,
        enclosing: Option<&TypeMembers>,
    ) {
        for arg in &new.args {
            self.visit(arg, current, enclosing);
        }

        let Some(body) = &new.body else {
            return;
        };
        self.anon_counter += 1;
        let mut members = scan_members(format!("{}${}", new.type_name, self.anon_counter), body);
        if let Some(base) = self.facts.get(&new.type_name) {
            members.fields.extend(base.fields.iter().cloned());
            members.methods.extend(base.methods.iter().cloned());
            members.inner_types.extend(base.inner_types.iter().cloned());
        }

        let mut attach = current;
        if let Some(outer) = enclosing {
            attach = self.arena.push(
                format!("parent-type {}", outer.type_name),
                Some(attach),
                ScopeKind::ParentType(outer.clone()),
            );
        }
        let type_scope = self.arena.push(
            format!("anonymous {}", ir::simple_name(&new.type_name)),
            Some(attach),
            ScopeKind::Type(members.clone()),
        );
        self.by_node.insert(new.id, type_scope);
        for member in body {
            self.visit(member, type_scope, Some(&members));
        }
    }

    /// Frontend facts win; a declaration-level scan covers types the
    /// registry does not know.
    fn members_of(&self, qualified: &str, declared: &[SyntaxNode]) -> TypeMembers {
        match self.facts.get(qualified) {
            Some(info) => TypeMembers::from(info),
            None => scan_members(qualified.to_string(), declared),
        }
    }
}

fn declared_variables(statements: &[SyntaxNode]) -> HashSet<String> {
    statements
        .iter()
        .filter_map(|s| match s {
            SyntaxNode::VariableDecl(v) => Some(v.name.clone()),
            _ => None,
        })
        .collect()
}

fn scan_members(type_name: String, members: &[SyntaxNode]) -> TypeMembers {
    let mut out = TypeMembers {
        type_name,
        ..TypeMembers::default()
    };
    for member in members {
        match member {
            SyntaxNode::FieldDecl(f) => {
                out.fields.insert(f.name.clone());
            }
            SyntaxNode::MethodDecl(m) => {
                out.methods.insert(m.name.clone());
            }
            SyntaxNode::ClassDecl(c) => {
                out.inner_types.insert(ir::simple_name(&c.name).to_string());
            }
            _ => {}
        }
    }
    out
}
