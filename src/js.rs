//! Output-side AST: the prototype-based target language.
//!
//! Writer contributors assemble these trees; serialization to text is
//! the external printer's job. Nodes hold no references back into the
//! input tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum JsNode {
    Name {
        name: String,
    },
    This,
    Null,
    Bool {
        value: bool,
    },
    Number {
        value: f64,
    },
    String {
        value: String,
    },
    /// Keys keep source order; inserting an existing key overwrites the
    /// value in place.
    ObjectLiteral {
        properties: IndexMap<String, JsNode>,
    },
    FunctionExpr {
        params: Vec<String>,
        body: Vec<JsNode>,
    },
    NewExpr {
        callee: Box<JsNode>,
        args: Vec<JsNode>,
    },
    Call {
        callee: Box<JsNode>,
        args: Vec<JsNode>,
    },
    Member {
        target: Box<JsNode>,
        property: String,
    },
    Index {
        target: Box<JsNode>,
        index: Box<JsNode>,
    },
    Assign {
        target: Box<JsNode>,
        value: Box<JsNode>,
    },
    Paren {
        expr: Box<JsNode>,
    },
    VarDecl {
        name: String,
        init: Option<Box<JsNode>>,
    },
    ExpressionStmt {
        expr: Box<JsNode>,
    },
    Return {
        expr: Option<Box<JsNode>>,
    },
    While {
        condition: Box<JsNode>,
        body: Vec<JsNode>,
    },
    Block {
        statements: Vec<JsNode>,
    },
}

/// Output tree for one compilation unit, handed to the external
/// printer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsProgram {
    pub file_path: String,
    pub statements: Vec<JsNode>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTOR HELPERS
// ═══════════════════════════════════════════════════════════════════════════════

pub fn name(name: impl Into<String>) -> JsNode {
    JsNode::Name { name: name.into() }
}

pub fn this() -> JsNode {
    JsNode::This
}

pub fn null() -> JsNode {
    JsNode::Null
}

pub fn bool(value: bool) -> JsNode {
    JsNode::Bool { value }
}

pub fn number(value: f64) -> JsNode {
    JsNode::Number { value }
}

pub fn string(value: impl Into<String>) -> JsNode {
    JsNode::String {
        value: value.into(),
    }
}

pub fn object(properties: IndexMap<String, JsNode>) -> JsNode {
    JsNode::ObjectLiteral { properties }
}

pub fn function(params: Vec<String>, body: Vec<JsNode>) -> JsNode {
    JsNode::FunctionExpr { params, body }
}

pub fn new_expr(callee: JsNode, args: Vec<JsNode>) -> JsNode {
    JsNode::NewExpr {
        callee: Box::new(callee),
        args,
    }
}

pub fn call(callee: JsNode, args: Vec<JsNode>) -> JsNode {
    JsNode::Call {
        callee: Box::new(callee),
        args,
    }
}

pub fn member(target: JsNode, property: impl Into<String>) -> JsNode {
    JsNode::Member {
        target: Box::new(target),
        property: property.into(),
    }
}

pub fn index(target: JsNode, idx: JsNode) -> JsNode {
    JsNode::Index {
        target: Box::new(target),
        index: Box::new(idx),
    }
}

pub fn assign(target: JsNode, value: JsNode) -> JsNode {
    JsNode::Assign {
        target: Box::new(target),
        value: Box::new(value),
    }
}

pub fn paren(expr: JsNode) -> JsNode {
    JsNode::Paren {
        expr: Box::new(expr),
    }
}

pub fn var_decl(name: impl Into<String>, init: Option<JsNode>) -> JsNode {
    JsNode::VarDecl {
        name: name.into(),
        init: init.map(Box::new),
    }
}

pub fn expr_stmt(expr: JsNode) -> JsNode {
    JsNode::ExpressionStmt {
        expr: Box::new(expr),
    }
}

pub fn return_stmt(expr: Option<JsNode>) -> JsNode {
    JsNode::Return {
        expr: expr.map(Box::new),
    }
}

pub fn block(statements: Vec<JsNode>) -> JsNode {
    JsNode::Block { statements }
}
