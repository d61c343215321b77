//! zinc_syntax: The syntax tree handed to the binder.
//!
//! The parser collaborator produces these nodes; the binder only reads them.
//! Nodes live in a `SyntaxArena` and reference their children by shared
//! reference. `SyntaxBuilder` constructs trees programmatically and `json`
//! loads them from a syntax dump.

pub mod builder;
pub mod json;
pub mod node;
pub mod types;

pub use builder::SyntaxBuilder;
pub use node::*;
pub use types::*;
