//! Variable and function declarations.

use stapc_base::{SourceLoc, Symbol};

use super::ty::Ty;
use super::{ExprId, StmtId, VarDeclId};

/// Where a [`VarDecl`] lives, which governs its visibility. Globals are
/// visible everywhere; a probe's locals only within that probe's body; a
/// function's locals (params included) only within that function's body.
/// There is no block-level scoping beneath these three frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarDeclKind {
    Global,
    Param,
    FunctionLocal,
    ProbeLocal,
}

/// A scalar or array declaration. Arity 0 is a scalar; arity N ≥ 1 is an
/// N-key array, one [`Ty`] per key position in `key_types`.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: Symbol,
    pub loc: SourceLoc,
    pub kind: VarDeclKind,
    pub ty: Ty,
    pub init: Option<ExprId>,
    pub arity: usize,
    pub key_types: Vec<Ty>,
    /// Set by the resolver the first time some expression binds to this
    /// declaration. Declarations left unreferenced after resolution move to
    /// the session's "unused" partition and are never type-inferred.
    pub referenced: bool,
}

impl VarDecl {
    pub fn new_scalar(name: Symbol, loc: SourceLoc, kind: VarDeclKind) -> Self {
        Self {
            name,
            loc,
            kind,
            ty: Ty::Unknown,
            init: None,
            arity: 0,
            key_types: Vec::new(),
            referenced: false,
        }
    }

    pub fn is_array(&self) -> bool {
        self.arity > 0
    }
}

/// A reference from a `symbol`/`arrayindex`/`foreach` node to the
/// declaration it resolved to. After resolution every reachable reference
/// has one of these; `Global` and `Local` are distinguished because the
/// resolver searches locals before globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclRef {
    Global(VarDeclId),
    Local(VarDeclId),
}

impl DeclRef {
    pub fn id(self) -> VarDeclId {
        match self {
            DeclRef::Global(id) | DeclRef::Local(id) => id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub loc: SourceLoc,
    pub return_ty: Ty,
    pub params: Vec<VarDeclId>,
    pub locals: Vec<VarDeclId>,
    pub body: StmtId,
    pub referenced: bool,
}

impl FunctionDecl {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
