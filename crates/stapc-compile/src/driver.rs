//! Pass driver.
//!
//! Orchestrates the pipeline end to end:
//!
//! ```text
//! pass 1a  parse the user's script (file / inline / stdin)
//! pass 1b  discover and parse tapset library files on the search path
//! pass 2   resolve -> derive-probes -> infer
//! ```
//!
//! Every pass runs to completion even after errors, so diagnostics from one
//! pass are all reported together; the driver only stops *between* passes,
//! either because a pass left a nonzero error count or because
//! `DriverOptions::last_pass` names an earlier stop point. Passes past
//! elaboration (translate, compile, run) are out of scope for this crate and
//! are not modeled here.

use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use log::{info, warn};
use stapc_lang::ast::StapFile;
use stapc_lang::session::Session;
use stapc_lang::Parser;

use crate::dce::{self, Partitions};
use crate::derive::derive_probes;
use crate::infer::Inferrer;
use crate::listing::format_dump;
use crate::match_tree::MatchTree;
use crate::resolve::Resolver;

/// Where the user's script text comes from.
pub enum ScriptSource {
    File(PathBuf),
    Inline(String),
    Stdin,
}

/// Listing mode, if any: `-l` lists probes only, `-L` additionally includes
/// variable information. Both suppress `MatchError` diagnostics (section 7:
/// "a user listing 'everything available' should not see errors about their
/// patterns") and both format the session and exit successfully regardless
/// of the elaboration error count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingMode {
    Off,
    Probes,
    ProbesAndVariables,
}

/// Mirrors `-p<N>`: stop the driver immediately after the named pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LastPass {
    Parse = 1,
    Elaborate = 2,
    Translate = 3,
    Compile = 4,
    Run = 5,
}

pub struct DriverOptions {
    pub script: ScriptSource,
    pub library_search_roots: Vec<PathBuf>,
    pub kernel_version: String,
    pub arch: String,
    pub guru_mode: bool,
    pub listing: ListingMode,
    pub verbose: bool,
    pub last_pass: Option<LastPass>,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            script: ScriptSource::Stdin,
            library_search_roots: Vec::new(),
            kernel_version: String::new(),
            arch: String::new(),
            guru_mode: false,
            listing: ListingMode::Off,
            verbose: false,
            last_pass: None,
        }
    }
}

pub struct DriverResult {
    pub session: Session,
    pub error_count: usize,
    /// Set once listing mode or `-p<N>` caused an early return; `None` means
    /// every pass ran.
    pub stopped_after: Option<LastPass>,
    pub partitions: Option<Partitions>,
    pub listing_text: Option<String>,
}

pub struct Driver {
    options: DriverOptions,
}

impl Driver {
    pub fn new(options: DriverOptions) -> Self {
        Self { options }
    }

    pub fn run(self) -> DriverResult {
        let mut session = Session::new();

        // Pass 1a.
        let user_text = self.read_script_text();
        let user_file_id = session.add_file(self.script_display_name(), user_text.clone());
        let stapfile = Parser::new(&mut session, user_file_id, &user_text, self.options.guru_mode).parse_file(&self.script_display_name());
        session.user_file = Some(stapfile);
        if self.options.verbose {
            info!("pass 1a: parsed user script ({} bytes)", user_text.len());
        }

        if self.options.last_pass == Some(LastPass::Parse) {
            let error_count = session.diagnostics.error_count();
            return DriverResult { session, error_count, stopped_after: Some(LastPass::Parse), partitions: None, listing_text: None };
        }
        if session.diagnostics.error_count() > 0 {
            let error_count = session.diagnostics.error_count();
            return DriverResult { session, error_count, stopped_after: Some(LastPass::Parse), partitions: None, listing_text: None };
        }

        // Pass 1b.
        let user_inode = self.script_inode();
        for (name, text) in self.discover_library_files(user_inode) {
            let file_id = session.add_file(name.clone(), text.clone());
            let stapfile = Parser::new(&mut session, file_id, &text, false).parse_file(&name);
            session.library_files.push(StapFile { is_library: true, ..stapfile });
        }
        if self.options.verbose {
            info!("pass 1b: discovered {} library file(s)", session.library_files.len());
        }
        if session.diagnostics.error_count() > 0 {
            let error_count = session.diagnostics.error_count();
            return DriverResult { session, error_count, stopped_after: Some(LastPass::Parse), partitions: None, listing_text: None };
        }

        // Pass 2.
        Resolver::new(&mut session).run();
        let tree = MatchTree::with_builtin_providers();
        derive_probes(&mut session, &tree, self.options.listing != ListingMode::Off);
        Inferrer::new(&mut session).run();
        let partitions = dce::partition(&session);
        if self.options.verbose {
            info!(
                "pass 2: {} probe(s), {} function(s), {} global(s) used",
                partitions.used_probes.len(),
                partitions.used_functions.len(),
                partitions.used_globals.len(),
            );
        }

        if self.options.listing != ListingMode::Off {
            let text = format_dump(&session, &partitions, self.options.listing == ListingMode::ProbesAndVariables);
            let error_count = session.diagnostics.error_count();
            return DriverResult {
                session,
                error_count,
                stopped_after: Some(LastPass::Elaborate),
                partitions: Some(partitions),
                listing_text: Some(text),
            };
        }

        let error_count = session.diagnostics.error_count();
        let stopped_after = if self.options.last_pass.is_some() { Some(LastPass::Elaborate) } else { None };
        DriverResult { session, error_count, stopped_after, partitions: Some(partitions), listing_text: None }
    }

    fn script_display_name(&self) -> String {
        match &self.options.script {
            ScriptSource::File(path) => path.display().to_string(),
            ScriptSource::Inline(_) => "<command line>".to_string(),
            ScriptSource::Stdin => "<stdin>".to_string(),
        }
    }

    fn read_script_text(&self) -> String {
        match &self.options.script {
            ScriptSource::File(path) => fs::read_to_string(path).unwrap_or_else(|e| {
                warn!("failed to read {}: {e}", path.display());
                String::new()
            }),
            ScriptSource::Inline(text) => text.clone(),
            ScriptSource::Stdin => {
                let mut buf = String::new();
                let _ = std::io::stdin().read_to_string(&mut buf);
                buf
            }
        }
    }

    fn script_inode(&self) -> Option<(u64, u64)> {
        match &self.options.script {
            ScriptSource::File(path) => fs::metadata(path).ok().map(|m| (m.dev(), m.ino())),
            _ => None,
        }
    }

    /// Library-search roots are probed at four versioned subpaths, most
    /// specific first: `<root>/<kernel_version>/<arch>`, `<root>/<kernel_version>`,
    /// `<root>/<arch>`, `<root>` itself. `*.stp` files found are deduplicated
    /// by `(device, inode)` so a symlink farm doesn't parse the same file
    /// twice, and a file matching the user script's own inode is rejected.
    fn discover_library_files(&self, user_inode: Option<(u64, u64)>) -> Vec<(String, String)> {
        let mut seen: HashSet<(u64, u64)> = HashSet::new();
        let mut out = Vec::new();

        for root in &self.options.library_search_roots {
            for suffix in self.versioned_suffixes() {
                let dir = suffix.iter().fold(root.clone(), |acc, part| acc.join(part));
                let Ok(entries) = fs::read_dir(&dir) else { continue };
                for entry in entries.flatten() {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("stp") {
                        continue;
                    }
                    let Ok(meta) = fs::metadata(&path) else { continue };
                    let key = (meta.dev(), meta.ino());
                    if Some(key) == user_inode || !seen.insert(key) {
                        continue;
                    }
                    if let Ok(text) = fs::read_to_string(&path) {
                        out.push((path.display().to_string(), text));
                    }
                }
            }
        }
        out
    }

    fn versioned_suffixes(&self) -> Vec<Vec<&str>> {
        vec![
            vec![self.options.kernel_version.as_str(), self.options.arch.as_str()],
            vec![self.options.kernel_version.as_str()],
            vec![self.options.arch.as_str()],
            vec![],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_only_stops_before_elaboration() {
        let options = DriverOptions {
            script: ScriptSource::Inline("probe begin { }".to_string()),
            last_pass: Some(LastPass::Parse),
            ..Default::default()
        };
        let result = Driver::new(options).run();
        assert_eq!(result.stopped_after, Some(LastPass::Parse));
        assert!(result.partitions.is_none());
    }

    #[test]
    fn full_run_elaborates_and_partitions() {
        let options = DriverOptions { script: ScriptSource::Inline("probe begin { }".to_string()), ..Default::default() };
        let result = Driver::new(options).run();
        assert_eq!(result.error_count, 0);
        assert_eq!(result.partitions.unwrap().used_probes.len(), 1);
    }

    #[test]
    fn listing_mode_suppresses_match_errors_and_returns_text() {
        let options = DriverOptions {
            script: ScriptSource::Inline("probe nonexistent { }".to_string()),
            listing: ListingMode::Probes,
            ..Default::default()
        };
        let result = Driver::new(options).run();
        assert_eq!(result.error_count, 0);
        assert!(result.listing_text.is_some());
    }

    #[test]
    fn parse_error_aborts_before_elaboration() {
        let options = DriverOptions { script: ScriptSource::Inline("probe begin {".to_string()), ..Default::default() };
        let result = Driver::new(options).run();
        assert_eq!(result.stopped_after, Some(LastPass::Parse));
        assert!(result.partitions.is_none());
        assert!(result.error_count > 0);
    }

    #[test]
    fn required_modifier_match_error_survives_listing_mode_in_driver() {
        let options = DriverOptions {
            script: ScriptSource::Inline("probe nonexistent ! { }".to_string()),
            listing: ListingMode::Probes,
            ..Default::default()
        };
        let result = Driver::new(options).run();
        assert_eq!(result.error_count, 1);
    }
}
