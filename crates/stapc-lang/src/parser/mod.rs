//! Recursive-descent parser.
//!
//! `Parser::parse_file` is the entry point: it produces a [`StapFile`]
//! holding vectors of probes, functions, and globals. The parser keeps one
//! token of lookahead (`peek`/`bump` over a pre-scanned token vector — the
//! lexer itself only ever looks one character ahead, so pre-tokenizing a
//! whole file doesn't change the grammar's lookahead, just where the loop
//! lives).
//!
//! Error recovery: on a parse error, [`Parser::recover`] discards tokens
//! until the next `}` or `;` at brace depth zero, then resumes. Every
//! recovery increments the file's error counter; a non-zero counter at
//! end-of-file is a fatal file-level error the driver must check for.

mod expr;
mod probe_point;
mod stmt;

use stapc_base::{DiagnosticKind, FileId, Interner, SourceLoc, Symbol};

use crate::ast::{decl::VarDeclKind, FunctionDecl, StapFile, VarDecl};
use crate::lexer::Lexer;
use crate::session::Session;
use crate::token::{Op, Token, TokenKind};

/// Interned symbols for the language's reserved words, cached once so the
/// parser's keyword checks are `Symbol` comparisons rather than string
/// comparisons. Reserved words are otherwise ordinary identifiers to the
/// lexer (see `lexer` module docs).
pub(crate) struct Keywords {
    pub probe: Symbol,
    pub global: Symbol,
    pub function: Symbol,
    pub kw_if: Symbol,
    pub kw_else: Symbol,
    pub kw_for: Symbol,
    pub foreach: Symbol,
    pub kw_in: Symbol,
    pub kw_return: Symbol,
    pub delete: Symbol,
    pub next: Symbol,
    pub kw_break: Symbol,
    pub kw_continue: Symbol,
}

impl Keywords {
    fn new(interner: &mut Interner) -> Self {
        Self {
            probe: interner.intern("probe"),
            global: interner.intern("global"),
            function: interner.intern("function"),
            kw_if: interner.intern("if"),
            kw_else: interner.intern("else"),
            kw_for: interner.intern("for"),
            foreach: interner.intern("foreach"),
            kw_in: interner.intern("in"),
            kw_return: interner.intern("return"),
            delete: interner.intern("delete"),
            next: interner.intern("next"),
            kw_break: interner.intern("break"),
            kw_continue: interner.intern("continue"),
        }
    }
}

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    pub(crate) session: &'a mut Session,
    pub(crate) file: FileId,
    error_count: usize,
    kw: Keywords,
    /// Set by `-g`; governs whether `Stmt::Embedded` is accepted without a
    /// parse error. The grammar always recognizes the syntax; this flag is
    /// checked right where it's parsed (`parse_statement`, in `stmt.rs`), so
    /// the diagnostic is reported immediately, at the embedded-code token.
    pub guru_mode: bool,
}

impl<'a> Parser<'a> {
    pub fn new(session: &'a mut Session, file: FileId, text: &str, guru_mode: bool) -> Self {
        let mut tokens = Vec::new();
        {
            let mut lexer = Lexer::new(text, file, &mut session.interner);
            loop {
                let tok = lexer.scan();
                let done = tok.is_eof();
                tokens.push(tok);
                if done {
                    break;
                }
            }
        }
        let kw = Keywords::new(&mut session.interner);
        Self { tokens, pos: 0, session, file, error_count: 0, kw, guru_mode }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn loc(&self) -> SourceLoc {
        self.cur().loc
    }

    fn bump(&mut self) -> Token {
        let tok = self.cur().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        self.cur().is_eof()
    }

    fn at_op(&self, op: Op) -> bool {
        matches!(&self.cur().kind, TokenKind::Op(o) if *o == op)
    }

    fn eat_op(&mut self, op: Op) -> bool {
        if self.at_op(op) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: Op, what: &str) -> bool {
        if self.eat_op(op) {
            true
        } else {
            self.error(format!("expected {what}"));
            false
        }
    }

    fn at_ident(&self, sym: Symbol) -> bool {
        matches!(&self.cur().kind, TokenKind::Ident(s) if *s == sym)
    }

    fn eat_ident(&mut self, sym: Symbol) -> bool {
        if self.at_ident(sym) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Consumes an identifier that is *not* a reserved word, for use as a
    /// variable/function/parameter name.
    fn expect_name(&mut self) -> Option<Symbol> {
        if let TokenKind::Ident(sym) = self.cur().kind {
            self.bump();
            Some(sym)
        } else {
            self.error("expected an identifier".to_string());
            None
        }
    }

    fn error(&mut self, message: String) {
        self.error_count += 1;
        let loc = self.loc();
        self.session.diagnostics.report(DiagnosticKind::ParseError, loc, message);
    }

    /// Discards tokens until the next `}` or `;` at brace depth zero, then
    /// resumes (consuming the recovery token itself, so the caller's loop
    /// sees a clean token next).
    fn recover(&mut self) {
        let mut depth: i32 = 0;
        loop {
            match &self.cur().kind {
                TokenKind::Eof => return,
                TokenKind::Op(Op::LBrace) => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::Op(Op::RBrace) => {
                    if depth == 0 {
                        self.bump();
                        return;
                    }
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Op(Op::Semi) if depth == 0 => {
                    self.bump();
                    return;
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    /// Top-level entry point: parses one whole file into a [`StapFile`].
    pub fn parse_file(mut self, name: &str) -> StapFile {
        let mut probes = Vec::new();
        let mut functions = Vec::new();
        let mut globals = Vec::new();

        while !self.at_eof() {
            if self.at_ident(self.kw.probe) {
                if let Some(p) = self.parse_probe() {
                    probes.push(p);
                }
            } else if self.at_ident(self.kw.global) {
                self.parse_global(&mut globals);
            } else if self.at_ident(self.kw.function) {
                if let Some(f) = self.parse_function() {
                    functions.push(f);
                }
            } else {
                self.error("expected 'probe', 'global', or 'function'".to_string());
                self.recover();
            }
        }

        StapFile { name: name.to_string(), file: self.file, probes, functions, globals, is_library: false }
    }

    fn parse_global(&mut self, out: &mut Vec<crate::ast::VarDeclId>) {
        self.bump(); // 'global'
        loop {
            let loc = self.loc();
            let Some(name) = self.expect_name() else {
                self.recover();
                return;
            };
            let mut decl = VarDecl::new_scalar(name, loc, VarDeclKind::Global);
            if self.eat_op(Op::Assign) {
                let lit_loc = self.loc();
                match self.parse_literal_value() {
                    Some(crate::ast::ComponentArg::Number(n)) => {
                        let id = self.session.exprs.alloc(crate::ast::Expr::new(lit_loc, crate::ast::ExprKind::LiteralNumber(n)));
                        decl.init = Some(id);
                    }
                    Some(crate::ast::ComponentArg::Str(s)) => {
                        let id = self.session.exprs.alloc(crate::ast::Expr::new(lit_loc, crate::ast::ExprKind::LiteralString(s)));
                        decl.init = Some(id);
                    }
                    None => self.error("expected a literal initializer".to_string()),
                }
            }
            let id = self.session.vardecls.alloc(decl);
            out.push(id);
            if !self.eat_op(Op::Comma) {
                break;
            }
        }
        self.eat_op(Op::Semi);
    }

    fn parse_function(&mut self) -> Option<FunctionDecl> {
        self.bump(); // 'function'
        let loc = self.loc();
        let name = self.expect_name()?;

        let mut return_ty = crate::ast::Ty::Unknown;
        if self.eat_op(Op::Colon) {
            return_ty = self.parse_type_name();
        }

        self.expect_op(Op::LParen, "'(' after function name");
        let mut params = Vec::new();
        if !self.at_op(Op::RParen) {
            loop {
                let ploc = self.loc();
                let Some(pname) = self.expect_name() else { break };
                let id = self.session.vardecls.alloc(VarDecl::new_scalar(pname, ploc, VarDeclKind::Param));
                params.push(id);
                if !self.eat_op(Op::Comma) {
                    break;
                }
            }
        }
        self.expect_op(Op::RParen, "')' to close parameter list");

        let body = self.parse_block();
        let locals = self.take_collected_locals();

        Some(FunctionDecl { name, loc, return_ty, params, locals, body, referenced: false })
    }

    fn parse_type_name(&mut self) -> crate::ast::Ty {
        if let TokenKind::Ident(sym) = self.cur().kind {
            let text = self.session.interner.resolve(sym).to_string();
            self.bump();
            match text.as_str() {
                "long" => crate::ast::Ty::Long,
                "string" => crate::ast::Ty::String,
                other => {
                    self.error(format!("unknown type '{other}'"));
                    crate::ast::Ty::Unknown
                }
            }
        } else {
            self.error("expected a type name".to_string());
            crate::ast::Ty::Unknown
        }
    }

    /// Locals created while parsing a function/probe body are tracked here
    /// by the resolver, not the parser (the parser has no scope notion yet —
    /// a bare `x = 1` is just a symbol expression until resolution decides
    /// whether it's a fresh local or an existing binding). This returns an
    /// empty vector; kept as a named hook so resolution's local-creation
    /// contract is visible at the call site.
    fn take_collected_locals(&mut self) -> Vec<crate::ast::VarDeclId> {
        Vec::new()
    }

    fn parse_literal_value(&mut self) -> Option<crate::ast::ComponentArg> {
        match self.cur().kind.clone() {
            TokenKind::Number(n) => {
                self.bump();
                Some(crate::ast::ComponentArg::Number(n))
            }
            TokenKind::Str(s) => {
                self.bump();
                Some(crate::ast::ComponentArg::Str(s))
            }
            TokenKind::Op(Op::Minus) => {
                self.bump();
                if let TokenKind::Number(n) = self.cur().kind {
                    self.bump();
                    Some(crate::ast::ComponentArg::Number(-n))
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}
