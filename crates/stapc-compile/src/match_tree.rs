//! Probe-point match tree: an ordered trie of pattern components, and the
//! provider registry that binds a [`ProbePointSpec`] against it.
//!
//! Providers register a dotted path of literal component names plus the
//! argument kind each position expects (`begin`, `timer.ms(<number>)`,
//! `kernel.function(<string>)`, …). Matching a user's probe point walks the
//! trie one component at a time; a component containing `*` is matched
//! against every sibling key with a simple glob rather than an exact lookup,
//! so `kernel.function("sys_*")` can reach `kernel.function` without the
//! trie itself knowing about kernels or symbol tables (DWARF/symbol-table
//! lookup is explicitly out of scope here — see module docs on
//! [`MatchOutcome`]).
//!
//! Children are stored in a `BTreeMap` so traversal order — and therefore
//! the order candidate providers are tried in — is always lexicographic by
//! component name, regardless of registration order.

use std::collections::BTreeMap;

use stapc_lang::ast::{Component, ComponentArg, ProbePointSpec};

/// What argument, if any, a registered path segment requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    None,
    Number,
    String,
}

impl ArgKind {
    fn accepts(self, arg: &Option<ComponentArg>) -> bool {
        match (self, arg) {
            (ArgKind::None, None) => true,
            (ArgKind::Number, Some(ComponentArg::Number(_))) => true,
            (ArgKind::String, Some(ComponentArg::Str(_))) => true,
            _ => false,
        }
    }
}

struct MatchNode {
    children: BTreeMap<String, MatchNode>,
    /// Set when a provider's path ends exactly here.
    provider: Option<String>,
}

impl MatchNode {
    fn new() -> Self {
        Self { children: BTreeMap::new(), provider: None }
    }

    fn insert(&mut self, path: &[(&str, ArgKind)], provider_name: &str) {
        let Some(((name, kind), rest)) = path.split_first() else {
            self.provider = Some(provider_name.to_string());
            return;
        };
        let key = format!("{name}\0{:?}", kind);
        self.children.entry(key).or_insert_with(MatchNode::new).insert(rest, provider_name);
    }
}

/// The registry of known providers, keyed by their match-tree entry point.
///
/// One tree is built once per session (see [`MatchTree::with_builtin_providers`])
/// and reused across every probe's elaboration.
pub struct MatchTree {
    root: MatchNode,
}

/// Why a probe point failed to resolve, distinguishing "no provider
/// recognizes this shape at all" from "a provider matched but this specific
/// wildcard would need kernel symbol-table data we don't have" — the latter
/// is reported as a successful, unexpanded match rather than an error, since
/// enumerating concrete kernel symbols is DWARF work this translator does
/// not perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub provider_name: String,
}

impl MatchTree {
    pub fn new() -> Self {
        Self { root: MatchNode::new() }
    }

    /// Registers one provider's pattern, e.g.
    /// `register(&[("begin", ArgKind::None)], "begin")`.
    pub fn register(&mut self, path: &[(&str, ArgKind)], provider_name: &str) {
        self.root.insert(path, provider_name);
    }

    pub fn with_builtin_providers() -> Self {
        let mut tree = Self::new();
        tree.register(&[("begin", ArgKind::None)], "begin");
        tree.register(&[("end", ArgKind::None)], "end");
        tree.register(&[("never", ArgKind::None)], "never");
        tree.register(&[("timer", ArgKind::None), ("ms", ArgKind::Number)], "timer");
        tree.register(&[("timer", ArgKind::None), ("s", ArgKind::Number)], "timer");
        tree.register(&[("timer", ArgKind::None), ("us", ArgKind::Number)], "timer");
        tree.register(&[("kernel", ArgKind::None), ("function", ArgKind::String)], "kernel.function");
        tree.register(
            &[("kernel", ArgKind::None), ("function", ArgKind::String), ("return", ArgKind::None)],
            "kernel.function.return",
        );
        tree.register(
            &[("kernel", ArgKind::None), ("function", ArgKind::String), ("call", ArgKind::None)],
            "kernel.function.call",
        );
        tree.register(&[("process", ArgKind::String), ("function", ArgKind::String)], "process.function");
        tree.register(
            &[("process", ArgKind::String), ("function", ArgKind::String), ("return", ArgKind::None)],
            "process.function.return",
        );
        tree.register(&[("syscall", ArgKind::String)], "syscall");
        tree.register(&[("syscall", ArgKind::String), ("return", ArgKind::None)], "syscall.return");
        tree
    }

    /// Attempts to bind `spec` against the tree. A wildcard component
    /// enumerates every sibling key it matches (spec.md §4.3 step 2), so
    /// this returns one [`MatchOutcome`] per reached provider — empty if
    /// none of them bottom out at a node with a provider attached (wrong
    /// number of components, an argument kind mismatch, or an unknown
    /// literal name with no wildcard to bridge it).
    pub fn resolve(&self, spec: &ProbePointSpec) -> Vec<MatchOutcome> {
        let mut out = Vec::new();
        resolve_at(&self.root, &spec.components, &mut out);
        out
    }
}

impl Default for MatchTree {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve_at(node: &MatchNode, remaining: &[Component], out: &mut Vec<MatchOutcome>) {
    let Some((head, rest)) = remaining.split_first() else {
        if let Some(p) = &node.provider {
            out.push(MatchOutcome { provider_name: p.clone() });
        }
        return;
    };

    for (key, child) in &node.children {
        let (name, kind_tag) = key.split_once('\0').expect("keys are always name\\0kind");
        if !glob_matches(&head.name, name) {
            continue;
        }
        if !arg_kind_from_tag(kind_tag).accepts(&head.arg) {
            continue;
        }
        resolve_at(child, rest, out);
    }
}

fn arg_kind_from_tag(tag: &str) -> ArgKind {
    match tag {
        "None" => ArgKind::None,
        "Number" => ArgKind::Number,
        "String" => ArgKind::String,
        _ => ArgKind::None,
    }
}

/// A minimal glob: `*` matches any run of characters, everything else must
/// match literally. Sufficient for component names like `sys_*` or `*_enter`
/// without pulling in a regex dependency for a single metacharacter.
fn glob_matches(pattern: &str, literal: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == literal;
    }
    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = literal;

    if let Some(first) = parts.first() {
        if !first.is_empty() {
            let Some(r) = rest.strip_prefix(first) else { return false };
            rest = r;
        }
    }
    if let Some(last) = parts.last() {
        if !last.is_empty() {
            let Some(r) = rest.strip_suffix(last) else { return false };
            rest = r;
        }
    }
    for mid in &parts[1..parts.len().saturating_sub(1)] {
        if mid.is_empty() {
            continue;
        }
        match rest.find(mid) {
            Some(idx) => rest = &rest[idx + mid.len()..],
            None => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use stapc_base::SourceLoc;
    use stapc_lang::ast::MatchModifier;

    fn comp(name: &str, arg: Option<ComponentArg>) -> Component {
        Component { name: name.to_string(), arg, loc: SourceLoc::synthetic() }
    }

    fn spec(components: Vec<Component>) -> ProbePointSpec {
        ProbePointSpec { components, modifier: MatchModifier::Plain }
    }

    #[test]
    fn matches_exact_literal_path() {
        let tree = MatchTree::with_builtin_providers();
        let outcome = tree.resolve(&spec(vec![comp("begin", None)]));
        assert_eq!(outcome, vec![MatchOutcome { provider_name: "begin".to_string() }]);
    }

    #[test]
    fn matches_timer_with_numeric_argument() {
        let tree = MatchTree::with_builtin_providers();
        let outcome = tree.resolve(&spec(vec![comp("timer", None), comp("ms", Some(ComponentArg::Number(100)))]));
        assert_eq!(outcome, vec![MatchOutcome { provider_name: "timer".to_string() }]);
    }

    #[test]
    fn rejects_argument_kind_mismatch() {
        let tree = MatchTree::with_builtin_providers();
        let outcome = tree.resolve(&spec(vec![comp("timer", None), comp("ms", Some(ComponentArg::Str("x".into())))]));
        assert!(outcome.is_empty());
    }

    #[test]
    fn wildcard_component_matches_registered_name() {
        let tree = MatchTree::with_builtin_providers();
        let outcome = tree.resolve(&spec(vec![comp("kern*", None), comp("function", Some(ComponentArg::Str("sys_*".into())))]));
        assert_eq!(outcome, vec![MatchOutcome { provider_name: "kernel.function".to_string() }]);
    }

    #[test]
    fn unknown_path_does_not_match() {
        let tree = MatchTree::with_builtin_providers();
        let outcome = tree.resolve(&spec(vec![comp("nonsense", None)]));
        assert!(outcome.is_empty());
    }

    #[test]
    fn kernel_function_return_requires_suffix() {
        let tree = MatchTree::with_builtin_providers();
        let outcome = tree.resolve(&spec(vec![
            comp("kernel", None),
            comp("function", Some(ComponentArg::Str("sys_open".into()))),
            comp("return", None),
        ]));
        assert_eq!(outcome, vec![MatchOutcome { provider_name: "kernel.function.return".to_string() }]);
    }

    #[test]
    fn wildcard_at_top_level_matches_every_sibling() {
        let mut tree = MatchTree::new();
        tree.register(&[("a", ArgKind::None), ("x", ArgKind::None)], "a.x");
        tree.register(&[("a", ArgKind::None), ("y", ArgKind::None)], "a.y");
        tree.register(&[("a", ArgKind::None), ("z", ArgKind::None)], "a.z");

        let outcome = tree.resolve(&spec(vec![comp("a", None), comp("*", None)]));
        assert_eq!(
            outcome,
            vec![
                MatchOutcome { provider_name: "a.x".to_string() },
                MatchOutcome { provider_name: "a.y".to_string() },
                MatchOutcome { provider_name: "a.z".to_string() },
            ]
        );
    }
}
