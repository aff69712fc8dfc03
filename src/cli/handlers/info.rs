//! Configuration check

use crate::cli::output::*;
use crate::vector_store;
use crate::AppConfig;
use crate::Result;

pub async fn handle_check_config(config: &AppConfig, offline: bool) -> Result<()> {
    config.validate()?;
    print_config(config);
    println!();

    if config.embeddings_api_key().is_none() {
        print_info("No embeddings API key set (required for the OpenAI provider)");
    }
    if config.llm_api_key().is_none() {
        print_info("No LLM API key set (required for the OpenAI provider)");
    }

    if offline {
        print_success("Configuration is valid");
        return Ok(());
    }

    let store = vector_store::from_config(config)?;
    match store.count().await {
        Ok(count) => {
            print_success(&format!(
                "Vector store reachable: {} passages in '{}'",
                count, config.vector_store.collection
            ));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Vector store check failed: {e}"));
            Err(e)
        }
    }
}
