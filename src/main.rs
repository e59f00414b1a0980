use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    linecrab::cli::run().await
}
