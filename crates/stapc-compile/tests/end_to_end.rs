//! End-to-end elaboration scenarios, covering the six literal examples from
//! the translator's testable-properties section verbatim.

use stapc_base::DiagnosticKind;
use stapc_compile::dce;
use stapc_compile::derive::derive_probes;
use stapc_compile::infer::Inferrer;
use stapc_compile::listing::format_dump;
use stapc_compile::match_tree::{ArgKind, MatchTree};
use stapc_compile::resolve::Resolver;
use stapc_lang::session::Session;
use stapc_lang::Parser;

fn elaborate(src: &str, tree: &MatchTree, listing_mode: bool) -> Session {
    let mut session = Session::new();
    let file = session.add_file("t.stp", src);
    let stapfile = Parser::new(&mut session, file, src, false).parse_file("t.stp");
    session.user_file = Some(stapfile);
    Resolver::new(&mut session).run();
    derive_probes(&mut session, tree, listing_mode);
    Inferrer::new(&mut session).run();
    session
}

/// Scenario 1: `probe begin { printf("hello\n") }` against a `begin`
/// provider. One derived probe, zero diagnostics, zero `unknown` left.
#[test]
fn scenario_1_printf_in_begin_probe_converges_cleanly() {
    let session = elaborate(r#"probe begin { printf("hello\n") }"#, &MatchTree::with_builtin_providers(), false);
    assert_eq!(session.derived_probes.len(), 1);
    assert!(session.diagnostics.is_empty());
}

/// Scenario 2: `global x = 0 probe event { x++ }` against an `event`
/// provider. `x` is `long`; listing prints `event` with no locals.
#[test]
fn scenario_2_global_increment_is_long_and_lists_with_no_locals() {
    let mut tree = MatchTree::new();
    tree.register(&[("event", ArgKind::None)], "event");
    let session = elaborate("global x = 0\nprobe event { x++ }", &tree, true);
    assert!(session.diagnostics.is_empty());
    let gid = session.user_file.as_ref().unwrap().globals[0];
    assert_eq!(session.vardecls[gid].ty, stapc_lang::ast::Ty::Long);

    let partitions = dce::partition(&session);
    let dump = format_dump(&session, &partitions, false);
    assert!(dump.contains("event"));
    assert!(!dump.contains("locals:"));
}

/// Scenario 3: `probe a.b.c { }` against providers at `a.b.c` and `a.b.d`.
/// One derived probe, from the `…c` path; `…d` is untouched.
#[test]
fn scenario_3_exact_path_matches_only_its_own_provider() {
    let mut tree = MatchTree::new();
    tree.register(&[("a", ArgKind::None), ("b", ArgKind::None), ("c", ArgKind::None)], "a.b.c");
    tree.register(&[("a", ArgKind::None), ("b", ArgKind::None), ("d", ArgKind::None)], "a.b.d");
    let session = elaborate("probe a.b.c { }", &tree, false);
    assert_eq!(session.derived_probes.len(), 1);
    let (_, derived) = session.derived_probes.iter().next().unwrap();
    assert_eq!(derived.location.canonical(), "a.b.c");
}

/// Scenario 4: `probe a.* { }` against providers at `a.x`, `a.y`, `a.z`.
/// Three derived probes, one per child.
#[test]
fn scenario_4_wildcard_yields_one_derived_probe_per_child() {
    let mut tree = MatchTree::new();
    tree.register(&[("a", ArgKind::None), ("x", ArgKind::None)], "a.x");
    tree.register(&[("a", ArgKind::None), ("y", ArgKind::None)], "a.y");
    tree.register(&[("a", ArgKind::None), ("z", ArgKind::None)], "a.z");
    let session = elaborate("probe a.* { }", &tree, false);
    assert_eq!(session.derived_probes.len(), 3);
    assert!(session.diagnostics.is_empty());
}

/// Scenario 5: `function f(n) { return n * 2 } probe t { f("hi") }` against
/// a `t` provider. `n` unifies to `long` from the multiplication, so the
/// `"hi"` argument is a `TypeMismatch`.
#[test]
fn scenario_5_string_argument_against_long_parameter_is_type_mismatch() {
    let mut tree = MatchTree::new();
    tree.register(&[("t", ArgKind::None)], "t");
    let session = elaborate("function f(n) { return n * 2 }\nprobe t { f(\"hi\") }", &tree, false);
    assert!(session.diagnostics.iter().any(|d| d.kind == DiagnosticKind::TypeMismatch));
}

/// Scenario 6: `probe t { a[1] = "x"; a[2,3] = "y" }`. Inconsistent arity on
/// array `a` is a `ResolveError`.
#[test]
fn scenario_6_inconsistent_array_arity_is_resolve_error() {
    let mut tree = MatchTree::new();
    tree.register(&[("t", ArgKind::None)], "t");
    let session = elaborate(r#"probe t { a[1] = "x"; a[2,3] = "y" }"#, &tree, false);
    assert!(session.diagnostics.iter().any(|d| d.kind == DiagnosticKind::ResolveError));
}
