//! NutriEyeQ Formulation Calculator
//!
//! An MCP server for building nutritional formulations from COA data.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};
use tracing_subscriber::EnvFilter;

use nutrieyeq::build_info;
use nutrieyeq::config::Config;
use nutrieyeq::mcp::NutrieyeqService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (output to stderr to not interfere with MCP stdio)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nutrieyeq=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Print startup banner to stderr
    build_info::print_startup_banner();
    eprintln!("Starting MCP server on stdio...");

    let config = Config::from_env();
    eprintln!("API URL: {}", config.api_url);
    eprintln!("Export directory: {}", config.export_dir.display());
    if config.access_token.is_none() {
        eprintln!("No access token configured; requests are sent unauthenticated");
    }

    // Create the NutriEyeQ service
    let service = NutrieyeqService::new(config);

    // Create stdio transport
    let transport = (stdin(), stdout());

    // Start the MCP server
    let server = service.serve(transport).await?;

    // Wait for the server to complete
    server.waiting().await?;

    Ok(())
}
