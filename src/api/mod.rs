//! HTTP surface: streamed answers over SSE, document retrieval and health

pub mod handlers;
pub mod routes;
pub mod server;
pub mod sse;
pub mod types;

pub use handlers::AppState;
pub use server::build_router;
pub use server::serve_api;
