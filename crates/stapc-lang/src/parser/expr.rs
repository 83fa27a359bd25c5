//! Expression grammar, precedence climbing from loosest to tightest:
//!
//! ```text
//! assignment > ternary > logical-or > logical-and > array-in > comparison
//!   > concatenation > additive > multiplicative > unary prefix
//!   > exponentiation > pre/post-crement > primary
//! ```
//!
//! Each level is a function that calls the next-tightest level for its
//! operands; `decl`/`array_decl`/`indexes` fields are left `None`/empty here
//! and filled in by the resolver.

use crate::ast::{AssignOp, BinOp, CmpOp, CrementOp, Expr, ExprId, ExprKind, StatsOpKind, UnOp};
use crate::token::{Op, TokenKind};

use super::Parser;

impl<'a> Parser<'a> {
    pub(super) fn parse_expr(&mut self) -> ExprId {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> ExprId {
        let lvalue = self.parse_ternary();
        let loc = self.loc();
        let op = match self.cur().kind {
            TokenKind::Op(Op::Assign) => Some(AssignOp::Assign),
            TokenKind::Op(Op::PlusEq) => Some(AssignOp::AddAssign),
            TokenKind::Op(Op::MinusEq) => Some(AssignOp::SubAssign),
            TokenKind::Op(Op::StarEq) => Some(AssignOp::MulAssign),
            TokenKind::Op(Op::SlashEq) => Some(AssignOp::DivAssign),
            TokenKind::Op(Op::PercentEq) => Some(AssignOp::ModAssign),
            _ => None,
        };
        let Some(op) = op else { return lvalue };
        self.bump();
        let rvalue = self.parse_assignment(); // right-associative
        self.alloc(loc, ExprKind::Assignment { op, lvalue, rvalue })
    }

    fn parse_ternary(&mut self) -> ExprId {
        let cond = self.parse_logical_or();
        if !self.eat_op(Op::Question) {
            return cond;
        }
        let loc = self.loc();
        let then_expr = self.parse_expr();
        self.expect_op(Op::Colon, "':' in ternary expression");
        let else_expr = self.parse_ternary(); // right-associative
        self.alloc(loc, ExprKind::Ternary { cond, then_expr, else_expr })
    }

    fn parse_logical_or(&mut self) -> ExprId {
        let mut lhs = self.parse_logical_and();
        while self.at_op(Op::OrOr) {
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_logical_and();
            lhs = self.alloc(loc, ExprKind::LogicalOr(lhs, rhs));
        }
        lhs
    }

    fn parse_logical_and(&mut self) -> ExprId {
        let mut lhs = self.parse_array_in();
        while self.at_op(Op::AndAnd) {
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_array_in();
            lhs = self.alloc(loc, ExprKind::LogicalAnd(lhs, rhs));
        }
        lhs
    }

    fn parse_array_in(&mut self) -> ExprId {
        let expr = self.parse_comparison();
        if !self.eat_ident(self.kw.kw_in) {
            return expr;
        }
        let loc = self.loc();
        let Some(array_name) = self.expect_name() else { return expr };
        self.alloc(loc, ExprKind::ArrayIn { expr, array_name, array_decl: None })
    }

    fn parse_comparison(&mut self) -> ExprId {
        let mut lhs = self.parse_concat();
        loop {
            let op = match self.cur().kind {
                TokenKind::Op(Op::Eq) => CmpOp::Eq,
                TokenKind::Op(Op::Ne) => CmpOp::Ne,
                TokenKind::Op(Op::Lt) => CmpOp::Lt,
                TokenKind::Op(Op::Le) => CmpOp::Le,
                TokenKind::Op(Op::Gt) => CmpOp::Gt,
                TokenKind::Op(Op::Ge) => CmpOp::Ge,
                _ => break,
            };
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_concat();
            lhs = self.alloc(loc, ExprKind::Comparison { op, lhs, rhs });
        }
        lhs
    }

    fn parse_concat(&mut self) -> ExprId {
        let mut lhs = self.parse_additive();
        while self.eat_op(Op::Dot) {
            let loc = self.loc();
            let rhs = self.parse_additive();
            lhs = self.alloc(loc, ExprKind::Concat(lhs, rhs));
        }
        lhs
    }

    fn parse_additive(&mut self) -> ExprId {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.cur().kind {
                TokenKind::Op(Op::Plus) => BinOp::Add,
                TokenKind::Op(Op::Minus) => BinOp::Sub,
                _ => break,
            };
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_multiplicative();
            lhs = self.alloc(loc, ExprKind::Binary { op, lhs, rhs });
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> ExprId {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.cur().kind {
                TokenKind::Op(Op::Star) => BinOp::Mul,
                TokenKind::Op(Op::Slash) => BinOp::Div,
                TokenKind::Op(Op::Percent) => BinOp::Mod,
                TokenKind::Op(Op::Amp) => BinOp::BitAnd,
                TokenKind::Op(Op::Pipe) => BinOp::BitOr,
                TokenKind::Op(Op::Caret) => BinOp::BitXor,
                TokenKind::Op(Op::ShiftLeft) => BinOp::ShiftLeft,
                TokenKind::Op(Op::ShiftRight) => BinOp::ShiftRight,
                _ => break,
            };
            let loc = self.loc();
            self.bump();
            let rhs = self.parse_unary();
            lhs = self.alloc(loc, ExprKind::Binary { op, lhs, rhs });
        }
        lhs
    }

    fn parse_unary(&mut self) -> ExprId {
        let loc = self.loc();
        let op = match self.cur().kind {
            TokenKind::Op(Op::Minus) => Some(UnOp::Neg),
            TokenKind::Op(Op::Bang) => Some(UnOp::Not),
            TokenKind::Op(Op::Tilde) => Some(UnOp::BitNot),
            _ => None,
        };
        let Some(op) = op else { return self.parse_exponentiation() };
        self.bump();
        let operand = self.parse_unary();
        self.alloc(loc, ExprKind::Unary { op, operand })
    }

    fn parse_exponentiation(&mut self) -> ExprId {
        let lhs = self.parse_crement();
        if !self.eat_op(Op::StarStar) {
            return lhs;
        }
        let loc = self.loc();
        let rhs = self.parse_unary(); // right-associative
        self.alloc(loc, ExprKind::Binary { op: BinOp::Pow, lhs, rhs })
    }

    fn parse_crement(&mut self) -> ExprId {
        let loc = self.loc();
        let prefix_op = match self.cur().kind {
            TokenKind::Op(Op::PlusPlus) => Some(CrementOp::Inc),
            TokenKind::Op(Op::MinusMinus) => Some(CrementOp::Dec),
            _ => None,
        };
        if let Some(op) = prefix_op {
            self.bump();
            let operand = self.parse_crement();
            return self.alloc(loc, ExprKind::Crement { op, operand, is_post: false });
        }

        let mut e = self.parse_primary();
        loop {
            let post_op = match self.cur().kind {
                TokenKind::Op(Op::PlusPlus) => Some(CrementOp::Inc),
                TokenKind::Op(Op::MinusMinus) => Some(CrementOp::Dec),
                _ => None,
            };
            let Some(op) = post_op else { break };
            let loc = self.loc();
            self.bump();
            e = self.alloc(loc, ExprKind::Crement { op, operand: e, is_post: true });
        }
        e
    }

    fn parse_primary(&mut self) -> ExprId {
        let loc = self.loc();
        match self.cur().kind.clone() {
            TokenKind::Number(n) => {
                self.bump();
                self.alloc(loc, ExprKind::LiteralNumber(n))
            }
            TokenKind::Str(s) => {
                self.bump();
                self.alloc(loc, ExprKind::LiteralString(s))
            }
            TokenKind::Op(Op::LParen) => {
                self.bump();
                let inner = self.parse_expr();
                self.expect_op(Op::RParen, "')' to close parenthesized expression");
                inner
            }
            TokenKind::Op(Op::Dollar) => {
                self.bump();
                let name = self.expect_name().unwrap_or_else(|| self.session.interner.intern("?"));
                self.alloc(loc, ExprKind::TargetSymbol { name })
            }
            TokenKind::Op(Op::At) => self.parse_stats_or_histogram(loc),
            TokenKind::Ident(sym) => self.parse_ident_primary(loc, sym),
            _ => {
                self.error("expected an expression".to_string());
                self.alloc(loc, ExprKind::LiteralNumber(0))
            }
        }
    }

    /// `@count(e)`, `@sum(e)`, `@min(e)`, `@max(e)`, `@avg(e)` — scalar
    /// statistics extractors over an aggregate-typed operand. `@hist_linear`/
    /// `@hist_log` instead take the operand plus a bucket-boundary list.
    fn parse_stats_or_histogram(&mut self, loc: stapc_base::SourceLoc) -> ExprId {
        self.bump(); // '@'
        let Some(name) = self.expect_name() else {
            return self.alloc(loc, ExprKind::LiteralNumber(0));
        };
        let name_text = self.session.interner.resolve(name).to_string();

        self.expect_op(Op::LParen, "'(' after statistics operator");
        let operand = self.parse_expr();

        let kind = match name_text.as_str() {
            "count" => Some(StatsOpKind::Count),
            "sum" => Some(StatsOpKind::Sum),
            "min" => Some(StatsOpKind::Min),
            "max" => Some(StatsOpKind::Max),
            "avg" => Some(StatsOpKind::Avg),
            _ => None,
        };

        let expr = if let Some(op) = kind {
            self.alloc(loc, ExprKind::StatsOp { op, operand })
        } else {
            let mut buckets = Vec::new();
            while self.eat_op(Op::Comma) {
                buckets.push(self.parse_expr());
            }
            if name_text != "hist_linear" && name_text != "hist_log" {
                self.error(format!("unknown statistics operator '@{name_text}'"));
            }
            self.alloc(loc, ExprKind::HistogramOp { operand, buckets })
        };
        self.expect_op(Op::RParen, "')' to close statistics operator");
        expr
    }

    fn parse_ident_primary(&mut self, loc: stapc_base::SourceLoc, sym: stapc_base::Symbol) -> ExprId {
        self.bump();
        if self.at_op(Op::LParen) {
            return self.parse_call(loc, sym);
        }
        if self.eat_op(Op::LBracket) {
            let mut indexes = vec![self.parse_expr()];
            while self.eat_op(Op::Comma) {
                indexes.push(self.parse_expr());
            }
            self.expect_op(Op::RBracket, "']' after array index");
            return self.alloc(loc, ExprKind::Symbol { name: sym, indexes, decl: None });
        }
        self.alloc(loc, ExprKind::Symbol { name: sym, indexes: Vec::new(), decl: None })
    }

    fn parse_call(&mut self, loc: stapc_base::SourceLoc, sym: stapc_base::Symbol) -> ExprId {
        self.bump(); // '('
        let mut args = Vec::new();
        if !self.at_op(Op::RParen) {
            loop {
                args.push(self.parse_expr());
                if !self.eat_op(Op::Comma) {
                    break;
                }
            }
        }
        self.expect_op(Op::RParen, "')' to close argument list");

        let name_text = self.session.interner.resolve(sym).to_string();
        if name_text == "printf" || name_text == "sprintf" {
            if let Some(&first) = args.first() {
                if let ExprKind::LiteralString(format) = self.session.exprs[first].kind.clone() {
                    let rest = args.into_iter().skip(1).collect();
                    return self.alloc(loc, ExprKind::PrintFormat { format, args: rest });
                }
            }
        }
        self.alloc(loc, ExprKind::FunctionCall { name: sym, args, decl: None })
    }

    fn alloc(&mut self, loc: stapc_base::SourceLoc, kind: ExprKind) -> ExprId {
        self.session.exprs.alloc(Expr::new(loc, kind))
    }
}
