//! CLI command handlers module
//!
//! - serve: API server
//! - ask: streamed question answering
//! - documents: retrieval without generation
//! - info: configuration check

pub mod ask;
pub mod documents;
pub mod info;
pub mod serve;

pub use ask::*;
pub use documents::*;
pub use info::*;
pub use serve::*;
