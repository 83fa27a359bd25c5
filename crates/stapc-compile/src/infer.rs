//! Type inference.
//!
//! Walks every resolved probe and function body to a fixed point, unifying
//! each expression's type slot against its neighbors', mirroring the
//! translator's own `typeresolution_info` visitor: two counters,
//! `num_newly_resolved` and `num_still_unresolved`, drive a `while
//! newly_resolved > 0` loop rather than a single bottom-up pass, because a
//! use far from a declaration can resolve it before a use nearer the
//! declaration gets visited. Once the loop stabilizes, a final pass with
//! `assert_resolvability` set reports [`DiagnosticKind::UnresolvedType`] for
//! every referenced declaration whose type is still [`Ty::Unknown`].
//!
//! `$target` variables and histogram values are deliberately exempt: binding
//! them needs the DWARF/kernel-symbol data this translator doesn't have, so
//! they stay `Unknown` without being treated as an inference failure.

use stapc_base::{DiagnosticKind, SourceLoc};
use stapc_lang::ast::{AssignOp, DeclRef, ExprId, ExprKind, StmtId, StmtKind, Ty, Unified};
use stapc_lang::session::Session;

#[derive(Default)]
struct Counts {
    newly_resolved: usize,
    still_unresolved: usize,
    /// Set only on the final pass, once the fixed-point loop has stabilized.
    /// While set, a slot that `unify_slot` leaves `Unknown` is reported as
    /// [`DiagnosticKind::UnresolvedType`] instead of silently counted.
    assert_resolvability: bool,
}

pub struct Inferrer<'a> {
    session: &'a mut Session,
}

impl<'a> Inferrer<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        Self { session }
    }

    /// Runs inference to a fixed point (`newly_resolved == 0`), then one
    /// final `assert_resolvability` pass that reports anything still
    /// `Unknown` at its use site, plus a declaration-level sweep for
    /// anything an expression walk wouldn't otherwise revisit.
    pub fn run(&mut self) {
        loop {
            let mut counts = Counts::default();
            self.pass(&mut counts);
            if counts.newly_resolved == 0 {
                break;
            }
        }
        let mut counts = Counts { assert_resolvability: true, ..Counts::default() };
        self.pass(&mut counts);
        self.report_unresolved();
    }

    fn pass(&mut self, counts: &mut Counts) {
        let probe_ids: Vec<_> = self.session.all_files().flat_map(|f| f.probes.iter().copied()).collect();
        for pid in probe_ids {
            let body = self.session.probes[pid].body;
            infer_stmt(self.session, counts, body);
        }
        let function_ids: Vec<_> = self.session.all_files().flat_map(|f| f.functions.iter().copied()).collect();
        for fid in function_ids {
            let body = self.session.functions[fid].body;
            infer_stmt(self.session, counts, body);
        }
    }

    /// Declaration-level sweep, catching anything still `Unknown` that the
    /// expression-level `assert_resolvability` pass wouldn't reach on its
    /// own — a scalar with no further use, or an array whose key/element
    /// types were never constrained past their auto-declared `Unknown`.
    fn report_unresolved(&mut self) {
        let ids: Vec<_> = self.session.vardecls.iter().map(|(id, _)| id).collect();
        for id in ids {
            let decl = &self.session.vardecls[id];
            if !decl.referenced {
                continue;
            }
            let (name, loc, arity) = (decl.name, decl.loc, decl.arity);
            let text = self.session.interner.resolve(name).to_string();
            if arity == 0 {
                if self.session.vardecls[id].ty == Ty::Unknown {
                    self.session.diagnostics.report(
                        DiagnosticKind::UnresolvedType,
                        loc,
                        format!("type of '{text}' could not be inferred"),
                    );
                }
                continue;
            }
            if self.session.vardecls[id].ty == Ty::Unknown {
                self.session.diagnostics.report(
                    DiagnosticKind::UnresolvedType,
                    loc,
                    format!("element type of array '{text}' could not be inferred"),
                );
            }
            for (key_idx, key_ty) in self.session.vardecls[id].key_types.clone().iter().enumerate() {
                if *key_ty == Ty::Unknown {
                    self.session.diagnostics.report(
                        DiagnosticKind::UnresolvedType,
                        loc,
                        format!("key {key_idx} of array '{text}' could not be inferred"),
                    );
                }
            }
        }
    }
}

fn unify_slot(session: &mut Session, counts: &mut Counts, a: &mut Ty, b: &mut Ty, loc: SourceLoc, what: &str, reportable: bool) {
    match stapc_lang::ast::unify(*a, *b) {
        Unified::Unchanged(t) => {
            if t == Ty::Unknown {
                counts.still_unresolved += 1;
                if reportable && counts.assert_resolvability {
                    session.diagnostics.report(DiagnosticKind::UnresolvedType, loc, format!("type of {what} could not be inferred"));
                }
            }
        }
        Unified::Resolved(t) => {
            *a = t;
            *b = t;
            counts.newly_resolved += 1;
        }
        Unified::Mismatch(x, y) => {
            session.diagnostics.report(DiagnosticKind::TypeMismatch, loc, format!("{what}: '{x}' vs '{y}'"));
        }
    }
}

/// Unifies the expression's own type slot against `want`, returning the
/// resulting (possibly still-unknown) type.
fn constrain(session: &mut Session, counts: &mut Counts, id: ExprId, want: Ty) -> Ty {
    constrain_reportable(session, counts, id, want, true)
}

fn constrain_reportable(session: &mut Session, counts: &mut Counts, id: ExprId, want: Ty, reportable: bool) -> Ty {
    let loc = session.exprs[id].loc;
    let mut want = want;
    let mut cur = session.exprs[id].ty;
    unify_slot(session, counts, &mut cur, &mut want, loc, "expression type", reportable);
    session.exprs[id].ty = cur;
    cur
}

/// `%s` ⇒ `string`, the other conversions ⇒ `long`; flags/width/precision
/// and `%%` are skipped without producing a slot. Unknown conversions are
/// silently skipped too rather than treated as an error — this translator
/// does not implement every `printf`-family conversion.
fn format_specifier_types(format: &str) -> Vec<Ty> {
    let mut tys = Vec::new();
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            continue;
        }
        while let Some(&c2) = chars.peek() {
            if c2.is_ascii_digit() || matches!(c2, '.' | '-' | '+' | ' ' | '#' | 'l') {
                chars.next();
            } else {
                break;
            }
        }
        match chars.next() {
            Some('s') => tys.push(Ty::String),
            Some('d' | 'i' | 'u' | 'x' | 'X' | 'o' | 'p' | 'b' | 'c') => tys.push(Ty::Long),
            _ => {}
        }
    }
    tys
}

fn infer_stmt(session: &mut Session, counts: &mut Counts, id: StmtId) {
    let kind = session.stmts[id].kind.clone();
    match kind {
        StmtKind::Block(stmts) => {
            for s in stmts {
                infer_stmt(session, counts, s);
            }
        }
        StmtKind::Null | StmtKind::Next | StmtKind::Break | StmtKind::Continue | StmtKind::Embedded(_) => {}
        StmtKind::Expr(e) => {
            infer_expr(session, counts, e);
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            constrain(session, counts, cond, Ty::Long);
            infer_expr(session, counts, cond);
            infer_stmt(session, counts, then_branch);
            if let Some(e) = else_branch {
                infer_stmt(session, counts, e);
            }
        }
        StmtKind::For { init, cond, incr, body } => {
            if let Some(e) = init {
                infer_expr(session, counts, e);
            }
            if let Some(e) = cond {
                infer_expr(session, counts, e);
                constrain(session, counts, e, Ty::Long);
            }
            if let Some(e) = incr {
                infer_expr(session, counts, e);
            }
            infer_stmt(session, counts, body);
        }
        StmtKind::Foreach { loop_var_decl, array_decl, body, .. } => {
            if let (Some(lv), Some(arr)) = (loop_var_decl, array_decl) {
                let loc = session.stmts[id].loc;
                if let Some(&key_ty) = session.vardecls[arr.id()].key_types.first() {
                    let mut kt = key_ty;
                    let mut lvt = session.vardecls[lv.id()].ty;
                    unify_slot(session, counts, &mut lvt, &mut kt, loc, "foreach loop variable", true);
                    session.vardecls[lv.id()].ty = lvt;
                    session.vardecls[arr.id()].key_types[0] = kt;
                }
            }
            infer_stmt(session, counts, body);
        }
        StmtKind::Return(e) => {
            if let Some(e) = e {
                infer_expr(session, counts, e);
            }
        }
        StmtKind::Delete { target } => {
            infer_expr(session, counts, target);
        }
    }
}

fn decl_ty(session: &Session, decl: DeclRef) -> Ty {
    session.vardecls[decl.id()].ty
}

fn set_decl_ty(session: &mut Session, decl: DeclRef, ty: Ty) {
    session.vardecls[decl.id()].ty = ty;
}

fn infer_expr(session: &mut Session, counts: &mut Counts, id: ExprId) -> Ty {
    let kind = session.exprs[id].kind.clone();
    let loc = session.exprs[id].loc;
    let reportable = !matches!(&kind, ExprKind::TargetSymbol { .. } | ExprKind::HistogramOp { .. });
    let ty = match kind {
        ExprKind::LiteralNumber(_) => Ty::Long,
        ExprKind::LiteralString(_) => Ty::String,
        ExprKind::TargetSymbol { .. } => Ty::Unknown,

        ExprKind::Symbol { indexes, decl, .. } => {
            for (i, &ix) in indexes.iter().enumerate() {
                let ix_ty = infer_expr(session, counts, ix);
                if let Some(d) = decl {
                    if let Some(slot) = session.vardecls[d.id()].key_types.get_mut(i) {
                        let mut a = ix_ty;
                        let mut b = *slot;
                        unify_slot(session, counts, &mut a, &mut b, loc, "array key type", true);
                        session.exprs[ix].ty = a;
                        session.vardecls[d.id()].key_types[i] = b;
                    }
                }
            }
            match decl {
                Some(d) if indexes.is_empty() => {
                    let mut dt = decl_ty(session, d);
                    let mut et = session.exprs[id].ty;
                    unify_slot(session, counts, &mut et, &mut dt, loc, "variable type", true);
                    set_decl_ty(session, d, dt);
                    et
                }
                Some(d) => {
                    // Array element reads carry the array's declared element
                    // type, stored in the decl's own `ty` field.
                    decl_ty(session, d)
                }
                None => Ty::Unknown,
            }
        }

        ExprKind::FunctionCall { args, decl, .. } => {
            let arg_tys: Vec<Ty> = args.iter().map(|&a| infer_expr(session, counts, a)).collect();
            if let Some(fid) = decl {
                let params = session.functions[fid].params.clone();
                for (&arg_ty, &param_id) in arg_tys.iter().zip(params.iter()) {
                    let mut a = arg_ty;
                    let mut p = session.vardecls[param_id].ty;
                    unify_slot(session, counts, &mut a, &mut p, loc, "argument type", true);
                    session.vardecls[param_id].ty = p;
                }
                for (&param_id, &arg_expr) in params.iter().zip(args.iter()) {
                    session.exprs[arg_expr].ty = session.vardecls[param_id].ty;
                }
                session.functions[fid].return_ty
            } else {
                Ty::Unknown
            }
        }

        ExprKind::Binary { lhs, rhs, .. } => {
            infer_expr(session, counts, lhs);
            infer_expr(session, counts, rhs);
            constrain(session, counts, lhs, Ty::Long);
            constrain(session, counts, rhs, Ty::Long);
            Ty::Long
        }
        ExprKind::Unary { operand, .. } => {
            infer_expr(session, counts, operand);
            constrain(session, counts, operand, Ty::Long);
            Ty::Long
        }
        ExprKind::Crement { operand, .. } => {
            infer_expr(session, counts, operand);
            constrain(session, counts, operand, Ty::Long);
            Ty::Long
        }
        ExprKind::Ternary { cond, then_expr, else_expr } => {
            infer_expr(session, counts, cond);
            constrain(session, counts, cond, Ty::Long);
            let t1 = infer_expr(session, counts, then_expr);
            let t2 = infer_expr(session, counts, else_expr);
            let mut a = t1;
            let mut b = t2;
            unify_slot(session, counts, &mut a, &mut b, loc, "ternary branches", true);
            session.exprs[then_expr].ty = a;
            session.exprs[else_expr].ty = b;
            a
        }
        ExprKind::LogicalOr(l, r) | ExprKind::LogicalAnd(l, r) => {
            infer_expr(session, counts, l);
            infer_expr(session, counts, r);
            constrain(session, counts, l, Ty::Long);
            constrain(session, counts, r, Ty::Long);
            Ty::Long
        }
        ExprKind::ArrayIn { expr, array_decl, .. } => {
            let expr_ty = infer_expr(session, counts, expr);
            if let Some(d) = array_decl {
                if let Some(slot) = session.vardecls[d.id()].key_types.first_mut() {
                    let mut a = expr_ty;
                    let mut b = *slot;
                    unify_slot(session, counts, &mut a, &mut b, loc, "array-in key type", true);
                    session.exprs[expr].ty = a;
                    session.vardecls[d.id()].key_types[0] = b;
                }
            }
            Ty::Long
        }
        ExprKind::Comparison { lhs, rhs, .. } => {
            let t1 = infer_expr(session, counts, lhs);
            let t2 = infer_expr(session, counts, rhs);
            let mut a = t1;
            let mut b = t2;
            unify_slot(session, counts, &mut a, &mut b, loc, "comparison operands", true);
            session.exprs[lhs].ty = a;
            session.exprs[rhs].ty = b;
            Ty::Long
        }
        ExprKind::Concat(l, r) => {
            infer_expr(session, counts, l);
            infer_expr(session, counts, r);
            constrain(session, counts, l, Ty::String);
            constrain(session, counts, r, Ty::String);
            Ty::String
        }
        ExprKind::Assignment { op, lvalue, rvalue } => {
            let rt = infer_expr(session, counts, rvalue);
            let lt = infer_expr(session, counts, lvalue);
            if op == AssignOp::Assign || op == AssignOp::AddAssign {
                let mut a = lt;
                let mut b = rt;
                unify_slot(session, counts, &mut a, &mut b, loc, "assignment", true);
                propagate_to_decl(session, lvalue, a);
                session.exprs[lvalue].ty = a;
                session.exprs[rvalue].ty = b;
                a
            } else {
                constrain(session, counts, lvalue, Ty::Long);
                constrain(session, counts, rvalue, Ty::Long);
                propagate_to_decl(session, lvalue, Ty::Long);
                Ty::Long
            }
        }
        ExprKind::PrintFormat { ref format, ref args } => {
            let wants = format_specifier_types(format);
            for (i, &a) in args.iter().enumerate() {
                infer_expr(session, counts, a);
                if let Some(&want) = wants.get(i) {
                    constrain(session, counts, a, want);
                }
            }
            Ty::Long
        }
        ExprKind::StatsOp { operand, .. } => {
            infer_expr(session, counts, operand);
            Ty::Long
        }
        ExprKind::HistogramOp { operand, buckets } => {
            infer_expr(session, counts, operand);
            for b in buckets {
                infer_expr(session, counts, b);
                constrain(session, counts, b, Ty::Long);
            }
            Ty::Unknown
        }
    };
    constrain_reportable(session, counts, id, ty, reportable)
}

fn propagate_to_decl(session: &mut Session, expr: ExprId, ty: Ty) {
    if let ExprKind::Symbol { decl: Some(d), indexes, .. } = &session.exprs[expr].kind {
        if indexes.is_empty() {
            let d = *d;
            session.vardecls[d.id()].ty = ty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use stapc_lang::Parser;

    fn elaborate(src: &str) -> Session {
        let mut session = Session::new();
        let file = session.add_file("t.stp", src);
        let stapfile = Parser::new(&mut session, file, src, false).parse_file("t.stp");
        session.user_file = Some(stapfile);
        Resolver::new(&mut session).run();
        Inferrer::new(&mut session).run();
        session
    }

    #[test]
    fn numeric_literal_assignment_infers_long() {
        let session = elaborate("global count\nprobe begin { count = 1 }");
        let id = session.user_file.as_ref().unwrap().globals[0];
        assert_eq!(session.vardecls[id].ty, Ty::Long);
        assert!(session.diagnostics.is_empty());
    }

    #[test]
    fn string_literal_assignment_infers_string() {
        let session = elaborate("global name\nprobe begin { name = \"hi\" }");
        let id = session.user_file.as_ref().unwrap().globals[0];
        assert_eq!(session.vardecls[id].ty, Ty::String);
    }

    #[test]
    fn mismatched_assignment_reports_type_error() {
        let session = elaborate("global x\nprobe begin { x = 1; x = \"s\" }");
        assert!(session.diagnostics.iter().any(|d| d.kind == DiagnosticKind::TypeMismatch));
    }

    #[test]
    fn cross_use_resolves_through_function_call() {
        let session = elaborate("function id(x) { return x }\nprobe begin { id(1) }");
        let fid = session.user_file.as_ref().unwrap().functions[0];
        let param = session.functions[fid].params[0];
        assert_eq!(session.vardecls[param].ty, Ty::Long);
    }

    #[test]
    fn print_format_specifier_constrains_argument_type() {
        let session = elaborate("global name\nprobe begin { printf(\"%s\", name) }");
        let id = session.user_file.as_ref().unwrap().globals[0];
        assert_eq!(session.vardecls[id].ty, Ty::String);
    }

    #[test]
    fn print_format_mismatch_against_specifier_is_type_error() {
        let session = elaborate("global count\nprobe begin { count = 1; printf(\"%s\", count) }");
        assert!(session.diagnostics.iter().any(|d| d.kind == DiagnosticKind::TypeMismatch));
    }

    #[test]
    fn foreach_over_array_with_unresolved_key_reports_unresolved_type() {
        let session = elaborate("global a\nprobe begin { foreach (k in a) { } }");
        assert!(session.diagnostics.iter().any(|d| d.kind == DiagnosticKind::UnresolvedType));
    }
}
