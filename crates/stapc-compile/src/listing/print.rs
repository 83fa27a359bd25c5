//! Pretty-printer: renders statements and expressions back to source text.
//!
//! Used by the dump formatter's `verbose` bodies, and exercised directly by
//! the parse → print → parse round-trip tests in `stapc-lang`'s own parser
//! tests (rather than here, since only the lexer/parser crate can assert AST
//! equality without this crate's elaboration in the way).

use stapc_lang::ast::{AssignOp, BinOp, CmpOp, CrementOp, ExprId, ExprKind, StmtId, StmtKind, UnOp};
use stapc_lang::session::Session;

pub fn print_expr(session: &Session, id: ExprId) -> String {
    match &session.exprs[id].kind {
        ExprKind::LiteralNumber(n) => n.to_string(),
        ExprKind::LiteralString(s) => format!("{:?}", s),
        ExprKind::TargetSymbol { name } => format!("${}", session.interner.resolve(*name)),
        ExprKind::Symbol { name, indexes, .. } => {
            let base = session.interner.resolve(*name).to_string();
            if indexes.is_empty() {
                base
            } else {
                let parts: Vec<String> = indexes.iter().map(|&e| print_expr(session, e)).collect();
                format!("{base}[{}]", parts.join(", "))
            }
        }
        ExprKind::FunctionCall { name, args, .. } => {
            let parts: Vec<String> = args.iter().map(|&e| print_expr(session, e)).collect();
            format!("{}({})", session.interner.resolve(*name), parts.join(", "))
        }
        ExprKind::Binary { op, lhs, rhs } => {
            format!("({} {} {})", print_expr(session, *lhs), binop_str(*op), print_expr(session, *rhs))
        }
        ExprKind::Unary { op, operand } => format!("{}{}", unop_str(*op), print_expr(session, *operand)),
        ExprKind::Crement { op, operand, is_post } => {
            let sym = if *op == CrementOp::Inc { "++" } else { "--" };
            if *is_post {
                format!("{}{sym}", print_expr(session, *operand))
            } else {
                format!("{sym}{}", print_expr(session, *operand))
            }
        }
        ExprKind::Ternary { cond, then_expr, else_expr } => {
            format!("({} ? {} : {})", print_expr(session, *cond), print_expr(session, *then_expr), print_expr(session, *else_expr))
        }
        ExprKind::LogicalOr(l, r) => format!("({} || {})", print_expr(session, *l), print_expr(session, *r)),
        ExprKind::LogicalAnd(l, r) => format!("({} && {})", print_expr(session, *l), print_expr(session, *r)),
        ExprKind::ArrayIn { expr, array_name, .. } => {
            format!("({} in {})", print_expr(session, *expr), session.interner.resolve(*array_name))
        }
        ExprKind::Comparison { op, lhs, rhs } => {
            format!("({} {} {})", print_expr(session, *lhs), cmpop_str(*op), print_expr(session, *rhs))
        }
        ExprKind::Concat(l, r) => format!("({} . {})", print_expr(session, *l), print_expr(session, *r)),
        ExprKind::Assignment { op, lvalue, rvalue } => {
            format!("{} {} {}", print_expr(session, *lvalue), assignop_str(*op), print_expr(session, *rvalue))
        }
        ExprKind::PrintFormat { format, args } => {
            let mut parts = vec![format!("{:?}", format)];
            parts.extend(args.iter().map(|&e| print_expr(session, e)));
            format!("printf({})", parts.join(", "))
        }
        ExprKind::StatsOp { op, operand } => format!("@{}({})", statsop_str(*op), print_expr(session, *operand)),
        ExprKind::HistogramOp { operand, buckets } => {
            let mut parts = vec![print_expr(session, *operand)];
            parts.extend(buckets.iter().map(|&e| print_expr(session, e)));
            format!("@hist({})", parts.join(", "))
        }
    }
}

pub fn print_stmt(session: &Session, id: StmtId, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match &session.stmts[id].kind {
        StmtKind::Block(stmts) => stmts.iter().map(|&s| print_stmt(session, s, indent)).collect(),
        StmtKind::Null => format!("{pad};\n"),
        StmtKind::Expr(e) => format!("{pad}{}\n", print_expr(session, *e)),
        StmtKind::If { cond, then_branch, else_branch } => {
            let mut out = format!("{pad}if ({}) {{\n{}{pad}}}", print_expr(session, *cond), print_stmt(session, *then_branch, indent + 1));
            if let Some(e) = else_branch {
                out.push_str(&format!(" else {{\n{}{pad}}}", print_stmt(session, *e, indent + 1)));
            }
            out.push('\n');
            out
        }
        StmtKind::For { init, cond, incr, body } => {
            let i = init.map(|e| print_expr(session, e)).unwrap_or_default();
            let c = cond.map(|e| print_expr(session, e)).unwrap_or_default();
            let n = incr.map(|e| print_expr(session, e)).unwrap_or_default();
            format!("{pad}for ({i}; {c}; {n}) {{\n{}{pad}}}\n", print_stmt(session, *body, indent + 1))
        }
        StmtKind::Foreach { loop_var, array_name, .. } => {
            format!(
                "{pad}foreach ({} in {}) {{\n{pad}}}\n",
                session.interner.resolve(*loop_var),
                session.interner.resolve(*array_name)
            )
        }
        StmtKind::Return(e) => match e {
            Some(e) => format!("{pad}return {}\n", print_expr(session, *e)),
            None => format!("{pad}return\n"),
        },
        StmtKind::Delete { target } => format!("{pad}delete {}\n", print_expr(session, *target)),
        StmtKind::Next => format!("{pad}next\n"),
        StmtKind::Break => format!("{pad}break\n"),
        StmtKind::Continue => format!("{pad}continue\n"),
        StmtKind::Embedded(text) => format!("{pad}%{{{text}%}}\n"),
    }
}

fn binop_str(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::BitAnd => "&",
        BinOp::BitOr => "|",
        BinOp::BitXor => "^",
        BinOp::ShiftLeft => "<<",
        BinOp::ShiftRight => ">>",
        BinOp::Pow => "**",
    }
}

fn unop_str(op: UnOp) -> &'static str {
    match op {
        UnOp::Neg => "-",
        UnOp::Not => "!",
        UnOp::BitNot => "~",
    }
}

fn cmpop_str(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "==",
        CmpOp::Ne => "!=",
        CmpOp::Lt => "<",
        CmpOp::Le => "<=",
        CmpOp::Gt => ">",
        CmpOp::Ge => ">=",
    }
}

fn assignop_str(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
    }
}

fn statsop_str(op: stapc_lang::ast::StatsOpKind) -> &'static str {
    use stapc_lang::ast::StatsOpKind::*;
    match op {
        Count => "count",
        Sum => "sum",
        Min => "min",
        Max => "max",
        Avg => "avg",
    }
}
