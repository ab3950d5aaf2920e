//! Source locations
//!
//! Plain position types used across the crate, with conversions from the
//! `lsp_types` shapes reference providers return.

pub mod location;

pub use location::{FileLocation, Position, Range};
