//! Dead-code elimination: partitions probes, functions, and globals into
//! used and unused sets, purely by reading the `referenced` flags
//! [`crate::resolve`] and [`crate::derive`] already left behind — this pass
//! does no graph walking of its own, just the partitioning spec describes:
//! "declarations without the flag are moved to the session's unused
//! partitions."
//!
//! Functions in the unused partition are skipped by [`crate::infer`]'s
//! caller in the driver; their bodies are never code-generated (code
//! generation itself is out of scope here).

use stapc_lang::ast::{FunctionId, SourceProbeId, VarDeclId};
use stapc_lang::session::Session;

#[derive(Debug, Default)]
pub struct Partitions {
    pub used_probes: Vec<SourceProbeId>,
    pub unused_probes: Vec<SourceProbeId>,
    pub used_functions: Vec<FunctionId>,
    pub unused_functions: Vec<FunctionId>,
    pub used_globals: Vec<VarDeclId>,
    pub unused_globals: Vec<VarDeclId>,
}

pub fn partition(session: &Session) -> Partitions {
    let mut p = Partitions::default();

    for file in session.all_files() {
        for &pid in &file.probes {
            if session.probes[pid].referenced {
                p.used_probes.push(pid);
            } else {
                p.unused_probes.push(pid);
            }
        }
        for &fid in &file.functions {
            if session.functions[fid].referenced {
                p.used_functions.push(fid);
            } else {
                p.unused_functions.push(fid);
            }
        }
        for &gid in &file.globals {
            if session.vardecls[gid].referenced {
                p.used_globals.push(gid);
            } else {
                p.unused_globals.push(gid);
            }
        }
    }

    p
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::derive_probes;
    use crate::match_tree::MatchTree;
    use crate::resolve::Resolver;
    use stapc_lang::Parser;

    fn elaborate(src: &str) -> Session {
        let mut session = Session::new();
        let file = session.add_file("t.stp", src);
        let stapfile = Parser::new(&mut session, file, src, false).parse_file("t.stp");
        session.user_file = Some(stapfile);
        Resolver::new(&mut session).run();
        derive_probes(&mut session, &MatchTree::with_builtin_providers(), false);
        session
    }

    #[test]
    fn unreferenced_global_is_partitioned_unused() {
        let session = elaborate("global dead\nglobal live\nprobe begin { live = 1 }");
        let partitions = partition(&session);
        assert_eq!(partitions.used_globals.len(), 1);
        assert_eq!(partitions.unused_globals.len(), 1);
    }

    #[test]
    fn unreferenced_function_is_partitioned_unused() {
        let session = elaborate("function dead() { return 1 }\nprobe begin { }");
        let partitions = partition(&session);
        assert_eq!(partitions.unused_functions.len(), 1);
        assert!(partitions.used_functions.is_empty());
    }

    #[test]
    fn matched_probe_is_partitioned_used() {
        let session = elaborate("probe begin { }");
        let partitions = partition(&session);
        assert_eq!(partitions.used_probes.len(), 1);
        assert!(partitions.unused_probes.is_empty());
    }
}
