//! Algebraic AST definition: expressions, statements, declarations, probes,
//! and probe-point specifications.
//!
//! Every node lives in a [`stapc_base::Arena`] owned by the [`crate::Session`]
//! and is referred to elsewhere by [`stapc_base::Id`] rather than a pointer —
//! see that module's docs for why. This file just names the per-kind `Id`
//! aliases; the node definitions live in the sibling submodules.

pub mod decl;
pub mod expr;
pub mod probe;
pub mod stmt;
pub mod ty;

use stapc_base::Id;

pub type ExprId = Id<expr::Expr>;
pub type StmtId = Id<stmt::Stmt>;
pub type VarDeclId = Id<decl::VarDecl>;
pub type FunctionId = Id<decl::FunctionDecl>;
pub type SourceProbeId = Id<probe::SourceProbe>;
pub type DerivedProbeId = Id<probe::DerivedProbe>;

pub use decl::{DeclRef, FunctionDecl, VarDecl, VarDeclKind};
pub use expr::{AssignOp, BinOp, CmpOp, CrementOp, Expr, ExprKind, StatsOpKind, UnOp};
pub use probe::{Component, ComponentArg, DerivedProbe, MatchModifier, ProbeCapabilities, ProbePointSpec, SourceProbe};
pub use stmt::{Stmt, StmtKind};
pub use ty::{unify, Ty, Unified};

/// One parsed file: the user's script, or a tapset library file.
#[derive(Debug, Clone)]
pub struct StapFile {
    pub name: String,
    pub file: stapc_base::FileId,
    pub probes: Vec<SourceProbeId>,
    pub functions: Vec<FunctionId>,
    pub globals: Vec<VarDeclId>,
    /// A user's primary script is `false`; tapset files discovered via the
    /// library search path are `true`. Functions/globals/probes in a library
    /// file only survive dead-code elimination if something in the user's
    /// script reaches them.
    pub is_library: bool,
}
