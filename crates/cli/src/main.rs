use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    thaifood_cli::main_entry().await
}
