//! zinc_core: Core utilities shared by every zinc compiler stage.
//!
//! Provides the syntax arena, the process-wide identifier table, source
//! positions, typed index handles and hashing collections.

pub mod arena;
pub mod collections;
pub mod ids;
pub mod intern;
pub mod text;

// Re-export commonly used types
pub use arena::SyntaxArena;
pub use intern::{Ident, IdentTable};
pub use text::{FileId, LineCol, SourcePos};
