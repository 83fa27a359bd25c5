//! Probes and probe-point specifications.

use stapc_base::{SourceLoc, Symbol};

use super::{SourceProbeId, StmtId, VarDeclId};

/// The literal argument carried by one component of a probe-point
/// specification, if any: `kernel.function("sys_*")` carries a string,
/// `timer.ms(100)` a number, `begin` none (a "null parameter").
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentArg {
    Number(i64),
    Str(String),
}

/// One dotted component of a probe-point specification, e.g. the `function`
/// in `kernel.function("sys_*")`. `name` may contain `*` wildcards.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub name: String,
    pub arg: Option<ComponentArg>,
    pub loc: SourceLoc,
}

impl Component {
    pub fn has_wildcard(&self) -> bool {
        self.name.contains('*')
    }
}

/// Whether a probe-point specification's absence of a provider match is an
/// error (`Plain`), silently ignored (`Optional`, the `?` suffix), or
/// explicitly demanded even in contexts that would otherwise suppress the
/// error (`Required`, the `!` suffix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchModifier {
    Plain,
    Optional,
    Required,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbePointSpec {
    pub components: Vec<Component>,
    pub modifier: MatchModifier,
}

impl ProbePointSpec {
    /// Canonical dotted rendering, e.g. `kernel.function("sys_*")`, used by
    /// the listing formatter to group derived probes by the alias the user
    /// actually wrote.
    pub fn canonical(&self) -> String {
        self.components
            .iter()
            .map(|c| match &c.arg {
                None => c.name.clone(),
                Some(ComponentArg::Number(n)) => format!("{}({})", c.name, n),
                Some(ComponentArg::Str(s)) => format!("{}(\"{}\")", c.name, s),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// A probe as the user wrote it: a location set plus a handler body. May
/// derive into zero or more [`DerivedProbe`]s once elaborated.
#[derive(Debug, Clone)]
pub struct SourceProbe {
    pub locations: Vec<ProbePointSpec>,
    pub body: StmtId,
    pub locals: Vec<VarDeclId>,
    pub loc: SourceLoc,
    pub referenced: bool,
}

/// What a provider's emitted code requires from the runtime: whether it
/// touches globals under lock, and which extra context-local variables (the
/// `$foo` targets) it contributes beyond the common set.
#[derive(Debug, Clone, Default)]
pub struct ProbeCapabilities {
    pub needs_global_lock: bool,
    pub extra_context_vars: Vec<Symbol>,
}

/// The result of a provider binding one [`ProbePointSpec`] against the match
/// tree: a concrete instrumentation target. Carries a back-pointer to its
/// source probe so capability and listing passes can still find the user's
/// original body and locals.
#[derive(Debug, Clone)]
pub struct DerivedProbe {
    pub source: SourceProbeId,
    pub location: ProbePointSpec,
    pub provider_name: String,
    pub capabilities: ProbeCapabilities,
}

impl DerivedProbe {
    pub fn new(source: SourceProbeId, location: ProbePointSpec, provider_name: impl Into<String>) -> Self {
        Self {
            source,
            location,
            provider_name: provider_name.into(),
            capabilities: ProbeCapabilities::default(),
        }
    }
}

