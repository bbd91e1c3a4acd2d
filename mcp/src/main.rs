use clap::Parser;

use tassel_mcp_runtime::{McpCommands, run};

#[derive(Parser)]
#[command(
    name = "tassel-mcp",
    version,
    about = "Tassel MCP server — Canvas aggregations over stdio"
)]
struct Cli {
    /// Canvas base URL, e.g. school.instructure.com
    #[arg(long, env = "TASSEL_CANVAS_URL")]
    canvas_url: Option<String>,

    #[command(subcommand)]
    command: McpCommands,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = run(cli.canvas_url, cli.command).await;
    std::process::exit(code);
}
