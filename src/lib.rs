//! Wooverzicht: cited, streaming question answering over Woo documents
//!
//! Questions are embedded, matched against a vector store of document
//! passages, and answered by a chat model that cites its sources. Answers
//! stream as ordered events (text chunks, sources, completion) over SSE.

pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod errors;
pub mod llm;
pub mod logging;
pub mod models;
pub mod rag;
pub mod vector_store;


pub use config::AppConfig;
pub use errors::*;
