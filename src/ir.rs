//! Input-side IR: the source-language syntax tree and the frontend's
//! binding/type facts.
//!
//! Both arrive fully materialized from the frontend and are read-only
//! here. The tree is never mutated; scope attachment happens through a
//! side table keyed by `NodeId` (see `scope.rs`).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Frontend-assigned identity for scope-introducing nodes.
pub type NodeId = u32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    pub line: u32,
    pub column: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE KINDS
// ═══════════════════════════════════════════════════════════════════════════════

/// One tag per syntactic shape; contributors attach to these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    ClassDecl,
    FieldDecl,
    MethodDecl,
    InitBlock,
    Block,
    VariableDecl,
    ExpressionStmt,
    Assignment,
    Identifier,
    MemberSelect,
    IndexAccess,
    MethodInvocation,
    NewInstance,
    Literal,
    Return,
    While,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYNTAX TREE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SyntaxNode {
    ClassDecl(ClassDeclNode),
    FieldDecl(FieldDeclNode),
    MethodDecl(MethodDeclNode),
    InitBlock(InitBlockNode),
    Block(BlockNode),
    VariableDecl(VariableDeclNode),
    ExpressionStmt(ExpressionStmtNode),
    Assignment(AssignmentNode),
    Identifier(IdentifierNode),
    MemberSelect(MemberSelectNode),
    IndexAccess(IndexAccessNode),
    MethodInvocation(MethodInvocationNode),
    NewInstance(NewInstanceNode),
    Literal(LiteralNode),
    Return(ReturnNode),
    While(WhileNode),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDeclNode {
    pub id: NodeId,
    /// Fully qualified name, as bound by the frontend.
    pub name: String,
    pub members: Vec<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDeclNode {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    pub init: Option<Box<SyntaxNode>>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDeclNode {
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    pub params: Vec<ParamDecl>,
    pub body: Option<Box<SyntaxNode>>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamDecl {
    pub name: String,
    #[serde(default)]
    pub pos: SourcePosition,
}

/// Initializer block declared directly in a class body. Distinct from
/// `Block` because only the non-static flavor participates in the
/// field-initializer instantiation form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitBlockNode {
    pub id: NodeId,
    #[serde(default)]
    pub is_static: bool,
    pub statements: Vec<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockNode {
    pub id: NodeId,
    pub statements: Vec<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDeclNode {
    pub name: String,
    pub init: Option<Box<SyntaxNode>>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpressionStmtNode {
    pub expr: Box<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentNode {
    pub target: Box<SyntaxNode>,
    pub value: Box<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierNode {
    pub name: String,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSelectNode {
    pub target: Box<SyntaxNode>,
    pub member: String,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexAccessNode {
    pub target: Box<SyntaxNode>,
    pub index: Box<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInvocationNode {
    /// None for a bare call resolved through the scope chain.
    pub target: Option<Box<SyntaxNode>>,
    pub name: String,
    pub args: Vec<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInstanceNode {
    pub id: NodeId,
    /// Fully qualified name of the constructed type, as bound by the
    /// frontend.
    pub type_name: String,
    pub args: Vec<SyntaxNode>,
    /// Class-body members when the instantiation carries a body.
    pub body: Option<Vec<SyntaxNode>>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiteralNode {
    pub value: LiteralValue,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnNode {
    pub expr: Option<Box<SyntaxNode>>,
    #[serde(default)]
    pub pos: SourcePosition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhileNode {
    pub condition: Box<SyntaxNode>,
    pub body: Box<SyntaxNode>,
    #[serde(default)]
    pub pos: SourcePosition,
}

impl SyntaxNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            SyntaxNode::ClassDecl(_) => NodeKind::ClassDecl,
            SyntaxNode::FieldDecl(_) => NodeKind::FieldDecl,
            SyntaxNode::MethodDecl(_) => NodeKind::MethodDecl,
            SyntaxNode::InitBlock(_) => NodeKind::InitBlock,
            SyntaxNode::Block(_) => NodeKind::Block,
            SyntaxNode::VariableDecl(_) => NodeKind::VariableDecl,
            SyntaxNode::ExpressionStmt(_) => NodeKind::ExpressionStmt,
            SyntaxNode::Assignment(_) => NodeKind::Assignment,
            SyntaxNode::Identifier(_) => NodeKind::Identifier,
            SyntaxNode::MemberSelect(_) => NodeKind::MemberSelect,
            SyntaxNode::IndexAccess(_) => NodeKind::IndexAccess,
            SyntaxNode::MethodInvocation(_) => NodeKind::MethodInvocation,
            SyntaxNode::NewInstance(_) => NodeKind::NewInstance,
            SyntaxNode::Literal(_) => NodeKind::Literal,
            SyntaxNode::Return(_) => NodeKind::Return,
            SyntaxNode::While(_) => NodeKind::While,
        }
    }

    pub fn pos(&self) -> SourcePosition {
        match self {
            SyntaxNode::ClassDecl(n) => n.pos,
            SyntaxNode::FieldDecl(n) => n.pos,
            SyntaxNode::MethodDecl(n) => n.pos,
            SyntaxNode::InitBlock(n) => n.pos,
            SyntaxNode::Block(n) => n.pos,
            SyntaxNode::VariableDecl(n) => n.pos,
            SyntaxNode::ExpressionStmt(n) => n.pos,
            SyntaxNode::Assignment(n) => n.pos,
            SyntaxNode::Identifier(n) => n.pos,
            SyntaxNode::MemberSelect(n) => n.pos,
            SyntaxNode::IndexAccess(n) => n.pos,
            SyntaxNode::MethodInvocation(n) => n.pos,
            SyntaxNode::NewInstance(n) => n.pos,
            SyntaxNode::Literal(n) => n.pos,
            SyntaxNode::Return(n) => n.pos,
            SyntaxNode::While(n) => n.pos,
        }
    }

    /// Identity of the scope this node introduces over *all* of its
    /// children, if any. Bodied instantiations are absent on purpose:
    /// their scope covers only the body, not the argument list, so the
    /// traversal enters it explicitly around the body.
    pub fn scope_node_id(&self) -> Option<NodeId> {
        match self {
            SyntaxNode::ClassDecl(n) => Some(n.id),
            SyntaxNode::MethodDecl(n) => Some(n.id),
            SyntaxNode::InitBlock(n) => Some(n.id),
            SyntaxNode::Block(n) => Some(n.id),
            _ => None,
        }
    }

    /// Children in source order. Drives both traversal passes and the
    /// generic default translation.
    pub fn children(&self) -> Vec<&SyntaxNode> {
        match self {
            SyntaxNode::ClassDecl(n) => n.members.iter().collect(),
            SyntaxNode::FieldDecl(n) => n.init.iter().map(|b| b.as_ref()).collect(),
            SyntaxNode::MethodDecl(n) => n.body.iter().map(|b| b.as_ref()).collect(),
            SyntaxNode::InitBlock(n) => n.statements.iter().collect(),
            SyntaxNode::Block(n) => n.statements.iter().collect(),
            SyntaxNode::VariableDecl(n) => n.init.iter().map(|b| b.as_ref()).collect(),
            SyntaxNode::ExpressionStmt(n) => vec![n.expr.as_ref()],
            SyntaxNode::Assignment(n) => vec![n.target.as_ref(), n.value.as_ref()],
            SyntaxNode::Identifier(_) => vec![],
            SyntaxNode::MemberSelect(n) => vec![n.target.as_ref()],
            SyntaxNode::IndexAccess(n) => vec![n.target.as_ref(), n.index.as_ref()],
            SyntaxNode::MethodInvocation(n) => {
                let mut children: Vec<&SyntaxNode> =
                    n.target.iter().map(|b| b.as_ref()).collect();
                children.extend(n.args.iter());
                children
            }
            SyntaxNode::NewInstance(n) => {
                let mut children: Vec<&SyntaxNode> = n.args.iter().collect();
                if let Some(body) = &n.body {
                    children.extend(body.iter());
                }
                children
            }
            SyntaxNode::Literal(_) => vec![],
            SyntaxNode::Return(n) => n.expr.iter().map(|b| b.as_ref()).collect(),
            SyntaxNode::While(n) => vec![n.condition.as_ref(), n.body.as_ref()],
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILATION UNIT
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDecl {
    /// `a.b.C` for a type import, `a.b.C.member` for a static import.
    pub qualified: String,
    #[serde(default)]
    pub is_static: bool,
}

impl ImportDecl {
    /// Last segment of the qualified name; the simple name the import
    /// binds in the unit.
    pub fn simple_name(&self) -> &str {
        self.qualified
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualified)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationUnit {
    pub file_path: String,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
    /// Top-level class declarations.
    pub types: Vec<SyntaxNode>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// FRONTEND TYPE FACTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Per-type facts computed by the frontend. The core consumes them
/// read-only and never re-derives binding information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInfo {
    pub qualified: String,
    #[serde(default)]
    pub fields: HashSet<String>,
    #[serde(default)]
    pub methods: HashSet<String>,
    #[serde(default)]
    pub inner_types: HashSet<String>,
    /// Marker types carry no real body; instantiating one is an
    /// object-literal construction even without an initializer block.
    #[serde(default)]
    pub is_synthetic: bool,
    /// Some(name) iff the type is a single-method functional contract;
    /// the name is that method's.
    #[serde(default)]
    pub function_method: Option<String>,
}

impl TypeInfo {
    pub fn named(qualified: &str) -> Self {
        TypeInfo {
            qualified: qualified.to_string(),
            ..TypeInfo::default()
        }
    }

    pub fn is_function_contract(&self) -> bool {
        self.function_method.is_some()
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.fields.contains(name)
            || self.methods.contains(name)
            || self.inner_types.contains(name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRegistry {
    types: HashMap<String, TypeInfo>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        TypeRegistry::default()
    }

    pub fn with_types(types: Vec<TypeInfo>) -> Self {
        let mut registry = TypeRegistry::new();
        for info in types {
            registry.insert(info);
        }
        registry
    }

    pub fn insert(&mut self, info: TypeInfo) {
        self.types.insert(info.qualified.clone(), info);
    }

    pub fn get(&self, qualified: &str) -> Option<&TypeInfo> {
        self.types.get(qualified)
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.types.contains_key(qualified)
    }

    pub fn is_synthetic(&self, qualified: &str) -> bool {
        self.get(qualified).map(|t| t.is_synthetic).unwrap_or(false)
    }

    pub fn function_method(&self, qualified: &str) -> Option<&str> {
        self.get(qualified)
            .and_then(|t| t.function_method.as_deref())
    }

    /// Splits `a.b.C.member` and answers whether the registry knows the
    /// type and the type declares the member.
    pub fn resolve_qualified_member(&self, qualified: &str) -> bool {
        match qualified.rsplit_once('.') {
            Some((type_name, member)) => self
                .get(type_name)
                .map(|t| t.has_member(member))
                .unwrap_or(false),
            None => false,
        }
    }
}

/// Last segment of a dotted qualified name.
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}
