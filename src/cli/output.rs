//! CLI output formatting utilities

use crate::config::AppConfig;
use crate::models::ChunkView;
use crate::models::DocumentView;
use crate::models::Source;

/// Safely truncate a string at a character boundary
#[must_use]
pub fn truncate_str(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        s.to_string()
    }
}

/// Show only that a secret is set
#[must_use]
pub fn mask_secret(secret: Option<&str>) -> String {
    match secret {
        Some(s) if s.len() > 8 => format!("{}...{}", &s[..4], &s[s.len() - 4..]),
        Some(_) => "***".to_string(),
        None => "(not set)".to_string(),
    }
}

pub fn print_info(message: &str) {
    println!("ℹ️  {message}");
}

pub fn print_success(message: &str) {
    println!("✅ {message}");
}

pub fn print_error(message: &str) {
    eprintln!("❌ {message}");
}

/// Print the citation list that follows an answer
pub fn print_sources(sources: &[Source]) {
    if sources.is_empty() {
        println!("\nGeen bronnen.");
        return;
    }
    println!("\nBronnen:");
    for (idx, source) in sources.iter().enumerate() {
        println!(
            "  {}. {} ({}) - {} {} [score {:.2}]",
            idx + 1,
            source.identity_key(),
            source.url,
            source.region,
            source.date,
            source.relevance_score
        );
    }
}

pub fn print_documents(documents: &[DocumentView]) {
    println!("Found {} documents:", documents.len());
    for (idx, doc) in documents.iter().enumerate() {
        println!(
            "  {}. {} | {} | {} | score {:.2}",
            idx + 1,
            doc.id,
            doc.metadata.region,
            doc.metadata.date,
            doc.relevance_score
        );
        if let Some(summary) = doc.metadata.summary.as_deref().filter(|s| !s.is_empty()) {
            println!("     {}", truncate_str(summary, 160));
        }
    }
}

pub fn print_chunks(chunks: &[ChunkView]) {
    println!("Found {} passages:", chunks.len());
    for chunk in chunks {
        println!(
            "  - {} [{:.2}] {}",
            chunk.id,
            chunk.relevance_score,
            truncate_str(&chunk.content.replace('\n', " "), 100)
        );
    }
}

/// Print configuration
pub fn print_config(config: &AppConfig) {
    println!("📋 Wooverzicht Configuration:");
    println!("  Server:");
    println!("    Address: {}", config.bind_address());
    println!("    CORS: {}", config.server.enable_cors);
    println!("  Logging:");
    println!("    Level: {}", config.logging.level);
    println!(
        "    File output: {} ({})",
        config.logging.file_output,
        config.logging.directory.display()
    );
    println!("  Embeddings:");
    println!("    Provider: {:?}", config.embeddings.provider);
    println!("    Endpoint: {}", config.embeddings.endpoint);
    println!("    Model: {}", config.embeddings.model);
    println!(
        "    API key: {}",
        mask_secret(config.embeddings_api_key().as_deref())
    );
    println!("  Vector store:");
    println!("    Provider: {:?}", config.vector_store.provider);
    println!("    Endpoint: {}", config.vector_store.endpoint);
    println!("    Collection: {}", config.vector_store.collection);
    if let Some(path) = &config.vector_store.snapshot_path {
        println!("    Snapshot: {}", path.display());
    }
    println!("  LLM:");
    println!("    Provider: {:?}", config.llm.provider);
    println!("    Endpoint: {}", config.llm.endpoint);
    println!("    Model: {}", config.llm.model);
    println!("    Temperature: {}", config.llm.temperature);
    println!("    Max tokens: {}", config.llm.max_tokens);
    println!("    API key: {}", mask_secret(config.llm_api_key().as_deref()));
    println!("  Retrieval:");
    println!("    Conversation limit: {}", config.retrieval.conversation_limit);
    println!("    Documents limit: {}", config.retrieval.documents_limit);
    println!("    Min score: {}", config.retrieval.min_score);
    println!("    Max context chars: {}", config.retrieval.max_context_chars);
    println!("  Conversation:");
    println!("    Max turns: {}", config.conversation.max_turns);
    println!(
        "    Session timeout: {}s",
        config.conversation.session_timeout_secs
    );
}
