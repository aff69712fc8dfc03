//! Retrieval without generation

use crate::api::types::DocumentsResponse;
use crate::cli::commands::FilterArgs;
use crate::cli::output::*;
use crate::rag::filter::default_end_date;
use crate::rag::filter::default_start_date;
use crate::rag::FilterParams;
use crate::rag::RagService;
use crate::AppConfig;
use crate::Result;

/// The documents operation needs both dates; the CLI fills in the open bounds
pub fn documents_params(filters: &FilterArgs) -> FilterParams {
    let mut params = filters.to_params();
    params
        .start_date
        .get_or_insert_with(|| default_start_date().to_string());
    params
        .end_date
        .get_or_insert_with(|| default_end_date().to_string());
    params
}

pub async fn handle_documents(
    config: &AppConfig,
    query: String,
    filters: FilterArgs,
    json: bool,
) -> Result<()> {
    let rag = RagService::new(config)?;
    let params = documents_params(&filters);
    let result = rag.retrieve_documents(&query, &params).await?;

    if json {
        let response = DocumentsResponse::success(query, result);
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    print_chunks(&result.chunks);
    println!();
    print_documents(&result.documents);
    Ok(())
}
