//! Statement grammar.
//!
//! A block is `{ stmt (';' stmt)* ';'? }`. A bare expression is a valid
//! statement (evaluated for side effects). Control constructs are standard.

use stapc_base::DiagnosticKind;

use crate::ast::{StmtId, StmtKind};
use crate::token::{Op, TokenKind};

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_block(&mut self) -> StmtId {
        let loc = self.loc();
        self.expect_op(Op::LBrace, "'{' to start a block");

        let mut stmts = Vec::new();
        while !self.at_op(Op::RBrace) && !self.at_eof() {
            stmts.push(self.parse_statement());
            self.eat_op(Op::Semi);
        }
        self.expect_op(Op::RBrace, "'}' to close a block");

        self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Block(stmts)))
    }

    fn parse_statement(&mut self) -> StmtId {
        let loc = self.loc();

        if self.at_op(Op::Semi) {
            return self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Null));
        }
        if self.at_op(Op::LBrace) {
            return self.parse_block();
        }
        if let TokenKind::Embedded(text) = self.cur().kind.clone() {
            self.bump();
            if !self.guru_mode {
                self.session.diagnostics.report(
                    DiagnosticKind::ParseError,
                    loc,
                    "embedded code requires guru mode (-g)".to_string(),
                );
            }
            return self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Embedded(text)));
        }
        if self.at_ident(self.kw.kw_if) {
            return self.parse_if();
        }
        if self.at_ident(self.kw.kw_for) {
            return self.parse_for();
        }
        if self.at_ident(self.kw.foreach) {
            return self.parse_foreach();
        }
        if self.at_ident(self.kw.kw_return) {
            return self.parse_return();
        }
        if self.at_ident(self.kw.delete) {
            return self.parse_delete();
        }
        if self.at_ident(self.kw.next) {
            self.bump();
            return self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Next));
        }
        if self.at_ident(self.kw.kw_break) {
            self.bump();
            return self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Break));
        }
        if self.at_ident(self.kw.kw_continue) {
            self.bump();
            return self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Continue));
        }

        let expr = self.parse_expr();
        self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Expr(expr)))
    }

    fn parse_if(&mut self) -> StmtId {
        let loc = self.loc();
        self.bump(); // 'if'
        self.expect_op(Op::LParen, "'(' after 'if'");
        let cond = self.parse_expr();
        self.expect_op(Op::RParen, "')' after if-condition");
        let then_branch = self.parse_statement_or_block();
        let else_branch = if self.eat_ident(self.kw.kw_else) { Some(self.parse_statement_or_block()) } else { None };
        self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::If { cond, then_branch, else_branch }))
    }

    /// `if`/`for`/`foreach` bodies may be a single statement or a `{ }`
    /// block; both parse to a `Stmt` so callers don't need to special-case.
    fn parse_statement_or_block(&mut self) -> StmtId {
        if self.at_op(Op::LBrace) {
            self.parse_block()
        } else {
            self.parse_statement()
        }
    }

    fn parse_for(&mut self) -> StmtId {
        let loc = self.loc();
        self.bump(); // 'for'
        self.expect_op(Op::LParen, "'(' after 'for'");
        let init = if self.at_op(Op::Semi) { None } else { Some(self.parse_expr()) };
        self.expect_op(Op::Semi, "';' after for-init");
        let cond = if self.at_op(Op::Semi) { None } else { Some(self.parse_expr()) };
        self.expect_op(Op::Semi, "';' after for-condition");
        let incr = if self.at_op(Op::RParen) { None } else { Some(self.parse_expr()) };
        self.expect_op(Op::RParen, "')' after for-clauses");
        let body = self.parse_statement_or_block();
        self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::For { init, cond, incr, body }))
    }

    fn parse_foreach(&mut self) -> StmtId {
        let loc = self.loc();
        self.bump(); // 'foreach'
        self.expect_op(Op::LParen, "'(' after 'foreach'");
        let placeholder = self.session.interner.intern("?");
        let loop_var = self.expect_name().unwrap_or(placeholder);
        self.eat_ident(self.kw.kw_in);
        let array_name = self.expect_name().unwrap_or(placeholder);
        self.expect_op(Op::RParen, "')' after foreach-clause");
        let body = self.parse_statement_or_block();
        self.session.stmts.alloc(crate::ast::Stmt::new(
            loc,
            StmtKind::Foreach { loop_var, loop_var_decl: None, array_name, array_decl: None, body },
        ))
    }

    fn parse_return(&mut self) -> StmtId {
        let loc = self.loc();
        self.bump(); // 'return'
        let value = if self.at_op(Op::Semi) || self.at_op(Op::RBrace) { None } else { Some(self.parse_expr()) };
        self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Return(value)))
    }

    fn parse_delete(&mut self) -> StmtId {
        let loc = self.loc();
        self.bump(); // 'delete'
        let target = self.parse_expr();
        self.session.stmts.alloc(crate::ast::Stmt::new(loc, StmtKind::Delete { target }))
    }
}

#[cfg(test)]
mod tests {
    use crate::session::Session;
    use crate::Parser;

    #[test]
    fn embedded_code_without_guru_mode_is_a_parse_error() {
        let mut session = Session::new();
        let file = session.add_file("t.stp", "probe begin { %{ int x; %} }");
        Parser::new(&mut session, file, "probe begin { %{ int x; %} }", false).parse_file("t.stp");
        assert!(session.diagnostics.iter().any(|d| d.kind == stapc_base::DiagnosticKind::ParseError));
    }

    #[test]
    fn embedded_code_with_guru_mode_is_accepted() {
        let mut session = Session::new();
        let file = session.add_file("t.stp", "probe begin { %{ int x; %} }");
        Parser::new(&mut session, file, "probe begin { %{ int x; %} }", true).parse_file("t.stp");
        assert!(session.diagnostics.is_empty());
    }
}
