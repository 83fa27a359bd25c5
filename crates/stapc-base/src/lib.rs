//! Shared primitives for the stapc translator: interning, arena storage, source
//! locations, and diagnostics.
//!
//! Kept as its own crate (mirroring the split between [`stapc_lang`] and
//! [`stapc_compile`]) so that both the front-end and the elaboration passes
//! depend on one small, stable vocabulary instead of each other.

mod arena;
mod error;
mod intern;
mod span;

pub use arena::{Arena, Id};
pub use error::{Diagnostic, DiagnosticKind, DiagnosticSink};
pub use intern::{Interner, Symbol};
pub use span::{FileId, SourceLoc};
