//! Elaboration: multi-file symbol resolution, probe-point match tree, dead
//! code elimination, type inference, and the listing/dump formatter.
//!
//! See `stapc_lang` for everything upstream of this (lexing, parsing, AST)
//! and `driver` for how these passes are sequenced.

pub mod dce;
pub mod derive;
pub mod driver;
pub mod infer;
pub mod listing;
pub mod match_tree;
pub mod resolve;

pub use driver::{Driver, DriverOptions, LastPass};
