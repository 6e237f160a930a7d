use anyhow::Result;
use staffhq::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
