//! funcpeek - symbol lookup for source files
//!
//! Given a selection in a TypeScript, JavaScript, Python or Java document,
//! funcpeek recognizes the symbol it names, synthesizes a call example, finds
//! real usages in the surrounding workspace and can ask a generative text
//! service to explain it. Recognition is heuristic: regular expressions and
//! bracket counting, no parser.

pub mod ai;
pub mod analysis;
pub mod config;
pub mod finder;
pub mod history;
pub mod io;
pub mod language;
pub mod logging;
pub mod lookup;
pub mod symbol;
pub mod synthesis;

#[cfg(test)]
mod test_utils;

pub use analysis::{SymbolKind, SymbolRecord};
pub use config::PeekConfig;
pub use finder::UsageExample;
pub use language::Language;
pub use lookup::{
    PeekError, PeekReport, PeekSession, display_example, find_usages, recognize_symbol,
    synthesize_example,
};
