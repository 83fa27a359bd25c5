//! Multi-file symbol resolution.
//!
//! Binds every [`ExprKind::Symbol`], `ArrayIn`, `FunctionCall`, and
//! `Foreach` loop/array reference to the [`VarDecl`]/[`FunctionDecl`] it
//! names. Scoping has exactly three frames — globals (visible everywhere),
//! a probe's locals (visible only in that probe), a function's locals and
//! parameters (visible only in that function) — with no block-level scoping
//! beneath them, so a single flat map per probe/function body is enough.
//!
//! An identifier that binds to nothing existing is not an error: assigning
//! to an unknown name auto-declares a fresh local of the enclosing probe or
//! function, mirroring the original translator's `find_var` behavior. Only
//! a read of, or `delete` on, an undeclared array name reuses the same
//! auto-declare path; only an unresolved function call is reported.

use std::collections::HashMap;

use stapc_base::{DiagnosticKind, SourceLoc, Symbol};
use stapc_lang::ast::{
    DeclRef, ExprId, ExprKind, FunctionId, SourceProbeId, StmtId, StmtKind, Ty, VarDecl, VarDeclId, VarDeclKind,
};
use stapc_lang::session::Session;

/// Per-body symbol table: the local frame (probe-locals or
/// function-locals/params) searched before the global table.
struct Scope<'g> {
    locals: HashMap<Symbol, VarDeclId>,
    globals: &'g HashMap<Symbol, VarDeclId>,
    local_kind: VarDeclKind,
    new_locals: Vec<VarDeclId>,
}

impl<'g> Scope<'g> {
    fn new(seed: &[VarDeclId], session: &Session, globals: &'g HashMap<Symbol, VarDeclId>, local_kind: VarDeclKind) -> Self {
        let mut locals = HashMap::new();
        for &id in seed {
            locals.insert(session.vardecls[id].name, id);
        }
        Self { locals, globals, local_kind, new_locals: Vec::new() }
    }

    fn lookup(&self, name: Symbol) -> Option<DeclRef> {
        self.locals
            .get(&name)
            .map(|&id| DeclRef::Local(id))
            .or_else(|| self.globals.get(&name).map(|&id| DeclRef::Global(id)))
    }

    /// Finds a binding, auto-declaring a fresh scalar local if none exists.
    fn lookup_or_declare_scalar(&mut self, session: &mut Session, name: Symbol, loc: SourceLoc) -> DeclRef {
        if let Some(found) = self.lookup(name) {
            return found;
        }
        let id = session.vardecls.alloc(VarDecl::new_scalar(name, loc, self.local_kind));
        self.locals.insert(name, id);
        self.new_locals.push(id);
        DeclRef::Local(id)
    }

    /// Finds a binding, auto-declaring a fresh `index_count`-key array if
    /// none exists. If the array is already declared, checks `index_count`
    /// against its established arity and reports a [`DiagnosticKind::ResolveError`]
    /// on mismatch rather than silently reusing the wrong shape.
    fn lookup_or_declare_array(&mut self, session: &mut Session, name: Symbol, index_count: usize, loc: SourceLoc) -> DeclRef {
        if let Some(found) = self.lookup(name) {
            let decl = &session.vardecls[found.id()];
            if decl.arity != index_count {
                let text = session.interner.resolve(name).to_string();
                session.diagnostics.report(
                    DiagnosticKind::ResolveError,
                    loc,
                    format!("array '{text}' used with {index_count} index(es), but declared with arity {}", decl.arity),
                );
            }
            return found;
        }
        let mut decl = VarDecl::new_scalar(name, loc, self.local_kind);
        decl.arity = index_count;
        decl.key_types = vec![Ty::Unknown; index_count];
        let id = session.vardecls.alloc(decl);
        self.locals.insert(name, id);
        self.new_locals.push(id);
        DeclRef::Local(id)
    }
}

pub struct Resolver<'a> {
    session: &'a mut Session,
    globals: HashMap<Symbol, VarDeclId>,
    functions: HashMap<Symbol, FunctionId>,
}

impl<'a> Resolver<'a> {
    pub fn new(session: &'a mut Session) -> Self {
        let mut globals = HashMap::new();
        let mut functions = HashMap::new();
        for file in session.all_files() {
            for &id in &file.globals {
                globals.insert(session.vardecls[id].name, id);
            }
            for &id in &file.functions {
                functions.insert(session.functions[id].name, id);
            }
        }
        Self { session, globals, functions }
    }

    /// Resolves every probe and function body across every parsed file.
    pub fn run(&mut self) {
        let probe_ids: Vec<SourceProbeId> = self.session.all_files().flat_map(|f| f.probes.iter().copied()).collect();
        for pid in probe_ids {
            let seed = self.session.probes[pid].locals.clone();
            let body = self.session.probes[pid].body;
            let mut scope = Scope::new(&seed, self.session, &self.globals, VarDeclKind::ProbeLocal);
            resolve_stmt(self.session, &self.functions, &mut scope, body);
            self.session.probes[pid].locals.extend(scope.new_locals);
        }

        let function_ids: Vec<FunctionId> = self.session.all_files().flat_map(|f| f.functions.iter().copied()).collect();
        for fid in function_ids {
            let mut seed = self.session.functions[fid].params.clone();
            seed.extend(self.session.functions[fid].locals.clone());
            let body = self.session.functions[fid].body;
            let mut scope = Scope::new(&seed, self.session, &self.globals, VarDeclKind::FunctionLocal);
            resolve_stmt(self.session, &self.functions, &mut scope, body);
            self.session.functions[fid].locals.extend(scope.new_locals);
        }
    }
}

fn resolve_stmt(session: &mut Session, functions: &HashMap<Symbol, FunctionId>, scope: &mut Scope, id: StmtId) {
    let kind = session.stmts[id].kind.clone();
    match kind {
        StmtKind::Block(stmts) => {
            for s in stmts {
                resolve_stmt(session, functions, scope, s);
            }
        }
        StmtKind::Null | StmtKind::Next | StmtKind::Break | StmtKind::Continue | StmtKind::Embedded(_) => {}
        StmtKind::Expr(e) => resolve_expr(session, functions, scope, e),
        StmtKind::If { cond, then_branch, else_branch } => {
            resolve_expr(session, functions, scope, cond);
            resolve_stmt(session, functions, scope, then_branch);
            if let Some(e) = else_branch {
                resolve_stmt(session, functions, scope, e);
            }
        }
        StmtKind::For { init, cond, incr, body } => {
            if let Some(e) = init {
                resolve_expr(session, functions, scope, e);
            }
            if let Some(e) = cond {
                resolve_expr(session, functions, scope, e);
            }
            if let Some(e) = incr {
                resolve_expr(session, functions, scope, e);
            }
            resolve_stmt(session, functions, scope, body);
        }
        StmtKind::Foreach { loop_var, array_name, body, .. } => {
            let loc = session.stmts[id].loc;
            let loop_var_decl = scope.lookup_or_declare_scalar(session, loop_var, loc);
            let array_decl = scope.lookup_or_declare_array(session, array_name, 1, loc);
            if let StmtKind::Foreach { loop_var_decl: lvd, array_decl: ad, .. } = &mut session.stmts[id].kind {
                *lvd = Some(loop_var_decl);
                *ad = Some(array_decl);
            }
            mark_referenced(session, loop_var_decl);
            mark_referenced(session, array_decl);
            resolve_stmt(session, functions, scope, body);
        }
        StmtKind::Return(e) => {
            if let Some(e) = e {
                resolve_expr(session, functions, scope, e);
            }
        }
        StmtKind::Delete { target } => resolve_expr(session, functions, scope, target),
    }
}

fn resolve_expr(session: &mut Session, functions: &HashMap<Symbol, FunctionId>, scope: &mut Scope, id: ExprId) {
    let kind = session.exprs[id].kind.clone();
    match kind {
        ExprKind::LiteralNumber(_) | ExprKind::LiteralString(_) | ExprKind::TargetSymbol { .. } => {}
        ExprKind::Symbol { name, indexes, .. } => {
            for &ix in &indexes {
                resolve_expr(session, functions, scope, ix);
            }
            let loc = session.exprs[id].loc;
            let decl = if indexes.is_empty() {
                scope.lookup_or_declare_scalar(session, name, loc)
            } else {
                scope.lookup_or_declare_array(session, name, indexes.len(), loc)
            };
            mark_referenced(session, decl);
            if let ExprKind::Symbol { decl: slot, .. } = &mut session.exprs[id].kind {
                *slot = Some(decl);
            }
        }
        ExprKind::FunctionCall { name, args, .. } => {
            for &a in &args {
                resolve_expr(session, functions, scope, a);
            }
            let loc = session.exprs[id].loc;
            match functions.get(&name).copied() {
                Some(fid) => {
                    session.functions[fid].referenced = true;
                    if let ExprKind::FunctionCall { decl: slot, .. } = &mut session.exprs[id].kind {
                        *slot = Some(fid);
                    }
                }
                None => {
                    let text = session.interner.resolve(name).to_string();
                    session.diagnostics.report(DiagnosticKind::ResolveError, loc, format!("unresolved function '{text}'"));
                }
            }
        }
        ExprKind::Binary { lhs, rhs, .. } | ExprKind::Comparison { lhs, rhs, .. } => {
            resolve_expr(session, functions, scope, lhs);
            resolve_expr(session, functions, scope, rhs);
        }
        ExprKind::LogicalOr(l, r) | ExprKind::LogicalAnd(l, r) | ExprKind::Concat(l, r) => {
            resolve_expr(session, functions, scope, l);
            resolve_expr(session, functions, scope, r);
        }
        ExprKind::Unary { operand, .. } | ExprKind::Crement { operand, .. } | ExprKind::StatsOp { operand, .. } => {
            resolve_expr(session, functions, scope, operand);
        }
        ExprKind::HistogramOp { operand, buckets } => {
            resolve_expr(session, functions, scope, operand);
            for b in buckets {
                resolve_expr(session, functions, scope, b);
            }
        }
        ExprKind::Ternary { cond, then_expr, else_expr } => {
            resolve_expr(session, functions, scope, cond);
            resolve_expr(session, functions, scope, then_expr);
            resolve_expr(session, functions, scope, else_expr);
        }
        ExprKind::ArrayIn { expr, array_name, .. } => {
            resolve_expr(session, functions, scope, expr);
            let loc = session.exprs[id].loc;
            let decl = scope.lookup_or_declare_array(session, array_name, 1, loc);
            mark_referenced(session, decl);
            if let ExprKind::ArrayIn { array_decl: slot, .. } = &mut session.exprs[id].kind {
                *slot = Some(decl);
            }
        }
        ExprKind::Assignment { lvalue, rvalue, .. } => {
            resolve_expr(session, functions, scope, lvalue);
            resolve_expr(session, functions, scope, rvalue);
        }
        ExprKind::PrintFormat { args, .. } => {
            for a in args {
                resolve_expr(session, functions, scope, a);
            }
        }
    }
}

fn mark_referenced(session: &mut Session, decl: DeclRef) {
    session.vardecls[decl.id()].referenced = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use stapc_lang::Parser;

    fn parse(src: &str) -> Session {
        let mut session = Session::new();
        let file = session.add_file("t.stp", src);
        let stapfile = Parser::new(&mut session, file, src, false).parse_file("t.stp");
        session.user_file = Some(stapfile);
        session
    }

    #[test]
    fn global_read_resolves_to_global_decl() {
        let mut session = parse("global count\nprobe begin { count = count + 1 }");
        Resolver::new(&mut session).run();
        assert!(session.diagnostics.is_empty());
        let global_id = session.user_file.as_ref().unwrap().globals[0];
        assert!(session.vardecls[global_id].referenced);
    }

    #[test]
    fn unknown_identifier_auto_declares_probe_local() {
        let mut session = parse("probe begin { x = 1 }");
        Resolver::new(&mut session).run();
        assert!(session.diagnostics.is_empty());
        let probe_id = session.user_file.as_ref().unwrap().probes[0];
        assert_eq!(session.probes[probe_id].locals.len(), 1);
    }

    #[test]
    fn unresolved_function_call_is_an_error() {
        let mut session = parse("probe begin { nosuchfunc() }");
        Resolver::new(&mut session).run();
        assert_eq!(session.diagnostics.error_count(), 1);
    }

    #[test]
    fn inconsistent_array_arity_is_a_resolve_error() {
        let mut session = parse(r#"probe begin { a[1] = "x"; a[2,3] = "y" }"#);
        Resolver::new(&mut session).run();
        assert_eq!(session.diagnostics.error_count(), 1);
    }

    #[test]
    fn function_call_resolves_and_marks_referenced() {
        let mut session = parse("function helper() { return 1 }\nprobe begin { helper() }");
        Resolver::new(&mut session).run();
        assert!(session.diagnostics.is_empty());
        let fid = session.user_file.as_ref().unwrap().functions[0];
        assert!(session.functions[fid].referenced);
    }
}
