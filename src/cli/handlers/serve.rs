//! API server handler

use crate::cli::output::*;
use crate::AppConfig;
use crate::Result;

pub async fn handle_serve_api(
    config: &AppConfig,
    host: Option<String>,
    port: Option<u16>,
    no_cors: bool,
) -> Result<()> {
    let mut config = config.clone();
    // CLI arguments take priority over config
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if no_cors {
        config.server.enable_cors = false;
    }
    config.validate()?;

    println!("🚀 Starting Wooverzicht API Server");
    println!("==================================\n");
    println!("📍 Address: {}", config.bind_address());
    println!(
        "🌐 CORS: {}",
        if config.server.enable_cors {
            "Enabled"
        } else {
            "Disabled"
        }
    );
    println!("🧠 LLM: {:?} / {}", config.llm.provider, config.llm.model);
    println!();

    print_info("Press Ctrl+C to stop");
    crate::api::serve_api(&config).await
}
