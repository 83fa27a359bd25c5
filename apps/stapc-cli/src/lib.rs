//! Command-line front end for `stapc`.
//!
//! The binary (`src/main.rs`) is a thin wrapper around [`run_cli`], handling
//! error display and exit codes; all argument parsing and dispatch live here
//! so they're testable without spawning a process.

use std::env;
use std::path::PathBuf;

use clap::Parser as ClapParser;
use stapc_compile::driver::{Driver, DriverOptions, ListingMode, ScriptSource};

/// Name of the environment variable naming a directory that holds an
/// optional startup options file (one line of flags, shell-word-expanded,
/// prepended to argv before parsing).
const OPTIONS_FILE_ENV: &str = "STAPC_OPTIONS_DIR";
const OPTIONS_FILE_NAME: &str = "options";

/// `stapc` — translator front end for the kernel-instrumentation scripting
/// language: lexing, parsing, symbol resolution, probe-point matching, and
/// type inference. Code generation and the runtime loader are out of scope.
#[derive(ClapParser, Debug)]
#[command(name = "stapc", version, about)]
pub struct Cli {
    /// Script file to translate; `-` reads from stdin. Omit when `-e` is given.
    pub script: Option<String>,

    /// Run the given script text instead of reading a file.
    #[arg(short = 'e', long = "command")]
    pub inline_script: Option<String>,

    /// Stop after pass N (1: parse, 2: elaborate, 3: translate, 4: compile, 5: run).
    #[arg(short = 'p', value_name = "N")]
    pub last_pass: Option<u8>,

    /// Verbose output; repeatable for higher verbosity.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Per-pass verbosity mask (overrides `-v`'s simple count when given).
    #[arg(long = "vp", value_name = "MASK")]
    pub verbosity_mask: Option<String>,

    /// Listing mode: print resolved probes and exit.
    #[arg(short = 'l')]
    pub listing: bool,

    /// Listing mode with variable information.
    #[arg(short = 'L')]
    pub listing_with_vars: bool,

    /// Prepend a directory to the tapset library search path. Repeatable.
    #[arg(short = 'I', value_name = "DIR")]
    pub library_dirs: Vec<PathBuf>,

    /// Guru mode: permit embedded verbatim target-language code.
    #[arg(short = 'g')]
    pub guru_mode: bool,

    /// Add a macro definition, `NAME` or `NAME=VALUE`, passed through to code
    /// generation. Repeatable. Code generation itself is out of scope here;
    /// definitions are recorded on the session but otherwise inert.
    #[arg(short = 'D', value_name = "NAME[=VALUE]")]
    pub macros: Vec<String>,

    /// Kernel version string used to select versioned library subpaths.
    #[arg(long, default_value = "")]
    pub kernel_version: String,

    /// Target architecture used to select versioned library subpaths.
    #[arg(long, default_value = "")]
    pub arch: String,
}

impl Cli {
    fn listing_mode(&self) -> ListingMode {
        if self.listing_with_vars {
            ListingMode::ProbesAndVariables
        } else if self.listing {
            ListingMode::Probes
        } else {
            ListingMode::Off
        }
    }

    fn script_source(&self) -> ScriptSource {
        if let Some(text) = &self.inline_script {
            return ScriptSource::Inline(text.clone());
        }
        match self.script.as_deref() {
            Some("-") | None => ScriptSource::Stdin,
            Some(path) => ScriptSource::File(PathBuf::from(path)),
        }
    }

    fn to_driver_options(&self) -> DriverOptions {
        DriverOptions {
            script: self.script_source(),
            library_search_roots: self.library_dirs.clone(),
            kernel_version: self.kernel_version.clone(),
            arch: self.arch.clone(),
            guru_mode: self.guru_mode,
            listing: self.listing_mode(),
            verbose: self.verbose > 0,
            last_pass: self.last_pass.and_then(last_pass_from_u8),
        }
    }
}

fn last_pass_from_u8(n: u8) -> Option<stapc_compile::driver::LastPass> {
    use stapc_compile::driver::LastPass::*;
    match n {
        1 => Some(Parse),
        2 => Some(Elaborate),
        3 => Some(Translate),
        4 => Some(Compile),
        5 => Some(Run),
        _ => None,
    }
}

/// Reads the argv-prefix options file named by [`OPTIONS_FILE_ENV`], if set
/// and present, and shell-word-expands its contents ahead of the process's
/// real arguments.
fn prepend_options_file_args(mut argv: Vec<String>) -> Vec<String> {
    let Ok(dir) = env::var(OPTIONS_FILE_ENV) else { return argv };
    let path = PathBuf::from(dir).join(OPTIONS_FILE_NAME);
    let Ok(contents) = std::fs::read_to_string(&path) else { return argv };

    let mut prefix = Vec::new();
    for line in contents.lines() {
        match shlex::split(line) {
            Some(words) => prefix.extend(words),
            None => log::warn!("could not parse options file line: {line}"),
        }
    }
    prefix.append(&mut argv);
    prefix
}

pub fn run_cli() -> Result<(), String> {
    let mut argv: Vec<String> = env::args().collect();
    let program = argv.remove(0);
    let mut full_argv = prepend_options_file_args(argv);
    full_argv.insert(0, program);

    let cli = Cli::parse_from(full_argv);
    let options = cli.to_driver_options();
    let result = Driver::new(options).run();

    for diagnostic in result.session.diagnostics.iter() {
        let file = result.session.file_name(diagnostic.loc.file);
        eprintln!("{}", diagnostic.display(file));
    }
    if let Some(text) = &result.listing_text {
        print!("{text}");
    }

    if result.error_count > 0 {
        return Err(format!("{} error(s)", result.error_count));
    }
    Ok(())
}
