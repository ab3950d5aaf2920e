//! Symbol recognition engine
//!
//! Heuristic structural matching over source text, no parser involved:
//!
//! - **patterns**: per-language tables of definition matchers
//! - **params**: depth-aware parameter list splitting
//! - **function**: staged recognition of function and method definitions
//! - **symbol**: kind classification for everything else
//! - **record**: the [`SymbolRecord`] result and signature reconstruction
//!
//! All of it is pure and synchronous; a miss is `None`, never an error.

pub mod function;
pub mod params;
pub mod patterns;
pub mod record;
pub mod symbol;

pub use function::analyze_function;
pub use params::split_parameters;
pub use record::{SymbolKind, SymbolRecord, build_signature};
pub use symbol::{classify_symbol, detect_symbol_kind};
