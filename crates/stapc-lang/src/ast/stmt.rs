//! Statement nodes.

use stapc_base::{SourceLoc, Symbol};

use super::decl::DeclRef;
use super::{ExprId, StmtId};

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<StmtId>),
    Null,
    Expr(ExprId),
    If {
        cond: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    For {
        init: Option<ExprId>,
        cond: Option<ExprId>,
        incr: Option<ExprId>,
        body: StmtId,
    },
    Foreach {
        loop_var: Symbol,
        loop_var_decl: Option<DeclRef>,
        array_name: Symbol,
        array_decl: Option<DeclRef>,
        body: StmtId,
    },
    Return(Option<ExprId>),
    Delete {
        target: ExprId,
    },
    Next,
    Break,
    Continue,
    /// Verbatim target-language text passed through untouched to code
    /// generation. Only legal under `-g` (guru mode); the parser checks
    /// `Parser::guru_mode` the moment it parses this statement and reports a
    /// `ParseError` right there if it's unset.
    Embedded(String),
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub loc: SourceLoc,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(loc: SourceLoc, kind: StmtKind) -> Self {
        Self { loc, kind }
    }
}
