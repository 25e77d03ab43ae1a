use clap::Parser;
use knowledge_rag::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Migrate => cli::migrate::run().await,
        Command::Ingest(args) => cli::documents::ingest(args).await,
        Command::Query(args) => cli::documents::query(args).await,
    }
}
