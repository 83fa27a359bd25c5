//! The process-wide container: file table, arenas, and interner.
//!
//! One [`Session`] exists per translator invocation. It owns every AST node
//! ever allocated — user script, every tapset library file, and later every
//! node synthesized while deriving probes — for the lifetime of the process.
//! There is no finer-grained deallocation: the arenas are freed en masse when
//! the session drops.

use stapc_base::{Arena, DiagnosticSink, FileId, Interner};

use crate::ast::{decl::FunctionDecl, decl::VarDecl, expr::Expr, probe::DerivedProbe, probe::SourceProbe, stmt::Stmt, StapFile};

/// One source file's name and raw text, addressed by [`FileId`].
pub struct SourceFile {
    pub name: String,
    pub text: String,
}

/// The session: sole mutable container for a translator run.
///
/// Every pass takes `&mut Session` (or a narrower borrow of its fields) and
/// mutates the AST-typed fields directly. Passes are totally ordered by the
/// driver, so no interior mutability or locking is needed — see the crate's
/// concurrency notes in `stapc_compile::driver`.
pub struct Session {
    pub interner: Interner,
    pub files: Vec<SourceFile>,

    pub exprs: Arena<Expr>,
    pub stmts: Arena<Stmt>,
    pub vardecls: Arena<VarDecl>,
    pub functions: Arena<FunctionDecl>,
    pub probes: Arena<SourceProbe>,
    pub derived_probes: Arena<DerivedProbe>,

    /// The user's primary script, parsed in pass 1a.
    pub user_file: Option<StapFile>,
    /// Tapset library files discovered and parsed in pass 1b.
    pub library_files: Vec<StapFile>,

    pub diagnostics: DiagnosticSink,

    /// Set by a builder that fails internally; the driver reads this to
    /// decide whether to suggest falling back to a compile server. The core
    /// does not act on it itself.
    pub try_server: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            files: Vec::new(),
            exprs: Arena::new(),
            stmts: Arena::new(),
            vardecls: Arena::new(),
            functions: Arena::new(),
            probes: Arena::new(),
            derived_probes: Arena::new(),
            user_file: None,
            library_files: Vec::new(),
            diagnostics: DiagnosticSink::new(),
            try_server: false,
        }
    }

    /// Registers a source file's text and returns the handle future tokens
    /// and AST nodes will carry.
    pub fn add_file(&mut self, name: impl Into<String>, text: impl Into<String>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile { name: name.into(), text: text.into() });
        id
    }

    pub fn file_name(&self, id: FileId) -> &str {
        self.files.get(id.0 as usize).map(|f| f.name.as_str()).unwrap_or("<unknown>")
    }

    /// All stapfiles known to the session: the user's script first (if any),
    /// followed by every library file, in discovery order.
    pub fn all_files(&self) -> impl Iterator<Item = &StapFile> {
        self.user_file.iter().chain(self.library_files.iter())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
