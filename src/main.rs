mod cli;

use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    notistore::logging::init_tracing();
    let cli = Cli::parse();
    cli::execute(cli).await
}
