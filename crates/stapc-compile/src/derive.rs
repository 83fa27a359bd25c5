//! Derive-probes: binds each source probe's location set against the match
//! tree, producing zero or more [`DerivedProbe`]s per location.
//!
//! A source probe with at least one matching location has its `referenced`
//! flag set (reused from [`SourceProbe`] rather than a parallel bit — a
//! probe that matched nothing is simply never marked, and [`crate::dce`]
//! partitions on exactly that flag). A location that matches nothing is a
//! [`DiagnosticKind::MatchError`] unless its [`MatchModifier`] says
//! otherwise: `Optional` (`?`) suppresses the error unconditionally;
//! `Required` (`!`) always reports it, even in listing mode; `Plain` reports
//! it too, except in listing mode, where it's suppressed (a "show me
//! everything available" listing shouldn't flag the user's own unmatched
//! patterns — but a `!`-marked pattern is the user insisting they want to
//! know, so listing mode doesn't get to overrule it).

use stapc_base::DiagnosticKind;
use stapc_lang::ast::{DerivedProbe, MatchModifier, SourceProbeId};
use stapc_lang::session::Session;

use crate::match_tree::MatchTree;

pub fn derive_probes(session: &mut Session, tree: &MatchTree, listing_mode: bool) {
    let probe_ids: Vec<SourceProbeId> = session.all_files().flat_map(|f| f.probes.iter().copied()).collect();
    for pid in probe_ids {
        let locations = session.probes[pid].locations.clone();
        let mut matched_any = false;
        for spec in &locations {
            let outcomes = tree.resolve(spec);
            if outcomes.is_empty() {
                let suppressed = match spec.modifier {
                    MatchModifier::Optional => true,
                    MatchModifier::Plain => listing_mode,
                    MatchModifier::Required => false,
                };
                if !suppressed {
                    let loc = session.probes[pid].loc;
                    session.diagnostics.report(
                        DiagnosticKind::MatchError,
                        loc,
                        format!("probe point '{}' does not match any known provider", spec.canonical()),
                    );
                }
                continue;
            }
            matched_any = true;
            for outcome in outcomes {
                session.derived_probes.alloc(DerivedProbe::new(pid, spec.clone(), outcome.provider_name));
            }
        }
        if matched_any {
            session.probes[pid].referenced = true;
        }
    }
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
    fn matching_probe_point_marks_probe_referenced_and_derives_one() {
        let mut session = parse("probe begin { }");
        let tree = MatchTree::with_builtin_providers();
        derive_probes(&mut session, &tree, false);
        let pid = session.user_file.as_ref().unwrap().probes[0];
        assert!(session.probes[pid].referenced);
        assert_eq!(session.derived_probes.len(), 1);
        assert!(session.diagnostics.is_empty());
    }

    #[test]
    fn unmatched_probe_point_reports_match_error() {
        let mut session = parse("probe nonexistent { }");
        let tree = MatchTree::with_builtin_providers();
        derive_probes(&mut session, &tree, false);
        let pid = session.user_file.as_ref().unwrap().probes[0];
        assert!(!session.probes[pid].referenced);
        assert_eq!(session.diagnostics.error_count(), 1);
    }

    #[test]
    fn optional_modifier_suppresses_match_error() {
        let mut session = parse("probe nonexistent ? { }");
        let tree = MatchTree::with_builtin_providers();
        derive_probes(&mut session, &tree, false);
        assert!(session.diagnostics.is_empty());
    }

    #[test]
    fn plain_modifier_match_error_is_suppressed_in_listing_mode() {
        let mut session = parse("probe nonexistent { }");
        let tree = MatchTree::with_builtin_providers();
        derive_probes(&mut session, &tree, true);
        assert!(session.diagnostics.is_empty());
    }

    #[test]
    fn required_modifier_match_error_survives_listing_mode() {
        let mut session = parse("probe nonexistent ! { }");
        let tree = MatchTree::with_builtin_providers();
        derive_probes(&mut session, &tree, true);
        assert_eq!(session.diagnostics.error_count(), 1);
    }

    #[test]
    fn wildcard_probe_point_derives_one_probe_per_match() {
        let mut session = parse("probe a.* { }");
        let mut tree = MatchTree::new();
        tree.register(&[("a", crate::match_tree::ArgKind::None), ("x", crate::match_tree::ArgKind::None)], "a.x");
        tree.register(&[("a", crate::match_tree::ArgKind::None), ("y", crate::match_tree::ArgKind::None)], "a.y");
        tree.register(&[("a", crate::match_tree::ArgKind::None), ("z", crate::match_tree::ArgKind::None)], "a.z");
        derive_probes(&mut session, &tree, false);
        let pid = session.user_file.as_ref().unwrap().probes[0];
        assert!(session.probes[pid].referenced);
        assert_eq!(session.derived_probes.len(), 3);
        assert!(session.diagnostics.is_empty());
    }
}
