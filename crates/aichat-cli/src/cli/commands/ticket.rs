//! Ticket command handler.

use aichat_core::client::ApiClient;
use aichat_core::providers::Provider;
use aichat_core::ticket;
use anyhow::Result;

pub async fn run(client: &ApiClient, provider: Provider, text: &str) -> Result<()> {
    let analysis = ticket::analyze_ticket(client, provider, text).await?;
    print!("{}", analysis.to_text());
    Ok(())
}
