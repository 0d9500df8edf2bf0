//! Review command handler.

use std::path::Path;

use aichat_core::client::ApiClient;
use aichat_core::providers::Provider;
use aichat_core::review::{self, ReviewForm};
use anyhow::{Context, Result};

pub struct ReviewRunOptions<'a> {
    pub code: Option<String>,
    pub file: Option<&'a Path>,
    pub language: String,
    pub provider: Provider,
    pub requirements: Option<String>,
    pub html: Option<&'a Path>,
    pub use_placeholder: bool,
}

pub async fn run(client: &ApiClient, options: ReviewRunOptions<'_>) -> Result<()> {
    let mut code = super::read_input(options.code, options.file)?;
    if code.trim().is_empty() && options.use_placeholder {
        if let Some(placeholder) = client.load_placeholder().await {
            code = placeholder;
        }
    }

    let form = ReviewForm {
        code,
        language: options.language,
        provider: options.provider,
        business_requirements: options.requirements,
    };
    // Reject before printing progress so a blank submission shows only the warning.
    form.validate()?;
    eprintln!("Reviewing with {}... {}", form.provider.label(), form.loading_message());

    let report = review::submit_review(client, &form).await?;

    if let Some(path) = options.html {
        std::fs::write(path, report.to_html_document())
            .with_context(|| format!("write review to {}", path.display()))?;
        eprintln!("Wrote HTML review to {}", path.display());
    }

    print!("{}", report.to_text());
    Ok(())
}
