//! Code review submission.

pub mod sections;

use std::fmt::Write as _;

use serde::Serialize;

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::providers::Provider;

pub use sections::{
    ReviewBlock, SectionKind, escape_html, format_review_sections, format_review_text,
    split_sections,
};

const ANALYZE_CODE_PATH: &str = "prompts/analyze-code";

const EMPTY_CODE_WARNING: &str = "Please enter some code to review!";

/// User input for one review.
#[derive(Debug, Clone, Default)]
pub struct ReviewForm {
    pub code: String,
    pub language: String,
    pub provider: Provider,
    /// Optional business constraints the code must satisfy
    pub business_requirements: Option<String>,
}

/// JSON body of `POST /prompts/analyze-code`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub code: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_requirements: Option<String>,
}

impl ReviewForm {
    /// Builds the request body, rejecting empty code.
    ///
    /// # Errors
    /// Returns a validation error when the trimmed code is empty.
    pub fn validate(&self) -> ClientResult<ReviewRequest> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err(ClientError::validation(EMPTY_CODE_WARNING));
        }

        let business_requirements = self
            .business_requirements
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        Ok(ReviewRequest {
            code: code.to_string(),
            language: self.language.clone(),
            business_requirements,
        })
    }

    /// Progress hint shown while the review runs.
    pub fn loading_message(&self) -> &'static str {
        let has_requirements = self
            .business_requirements
            .as_deref()
            .is_some_and(|text| !text.trim().is_empty());
        if has_requirements {
            "Validating business requirements..."
        } else {
            "This may take a few seconds"
        }
    }
}

/// Completed review with the metadata shown next to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewReport {
    pub review_text: String,
    pub language: String,
    pub provider: Provider,
    /// Characters in the submitted (trimmed) code
    pub code_chars: usize,
    pub has_business_requirements: bool,
}

impl ReviewReport {
    /// Sectioned review plus stats badges, as an HTML fragment.
    pub fn to_html(&self) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            "<div class=\"review-content\">{}</div>",
            format_review_sections(&self.review_text)
        );
        html.push_str("<div class=\"stats\">");
        let _ = write!(
            html,
            "<span class=\"stat-badge\">{}</span>",
            escape_html(&self.language)
        );
        let _ = write!(
            html,
            "<span class=\"stat-badge\">{}</span>",
            self.provider.id()
        );
        let _ = write!(
            html,
            "<span class=\"stat-badge\">{} characters</span>",
            self.code_chars
        );
        if self.has_business_requirements {
            html.push_str(
                "<span class=\"stat-badge\" style=\"background: #e7f5ff; color: #1971c2;\">Business requirements checked</span>",
            );
        }
        html.push_str("</div>");
        html
    }

    /// Standalone HTML page around `to_html()`.
    pub fn to_html_document(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Code review</title>\n<style>\n{REVIEW_CSS}</style>\n</head>\n<body>\n<div id=\"results\">{}</div>\n</body>\n</html>\n",
            self.to_html()
        )
    }

    /// Sectioned review plus a stats line, for a terminal.
    pub fn to_text(&self) -> String {
        let mut out = format_review_text(&self.review_text);
        let _ = write!(
            out,
            "\n[{}] [{}] [{} characters]",
            self.language,
            self.provider.id(),
            self.code_chars
        );
        if self.has_business_requirements {
            out.push_str(" [Business requirements checked]");
        }
        out.push('\n');
        out
    }
}

const REVIEW_CSS: &str = "\
.review-section { border-left: 4px solid #868e96; background: #f8f9fa; padding: 12px 16px; margin: 12px 0; }
.review-section.bugs { border-left-color: #fa5252; background: #fff5f5; }
.review-section.performance { border-left-color: #fd7e14; background: #fff4e6; }
.review-section.security { border-left-color: #e64980; background: #fff0f6; }
.review-section.best-practices { border-left-color: #228be6; background: #e7f5ff; }
.review-section.suggestions { border-left-color: #40c057; background: #ebfbee; }
.review-section.rating { border-left-color: #fab005; background: #fff9db; }
.stat-badge { display: inline-block; padding: 4px 10px; margin-right: 6px; border-radius: 12px; background: #f1f3f5; }
";

/// Sends the review request and waits for the full review text.
///
/// # Errors
/// Returns a validation error for empty code (no request is sent), or the
/// generic connectivity error for transport failures and non-2xx status.
pub async fn submit_review(client: &ApiClient, form: &ReviewForm) -> ClientResult<ReviewReport> {
    let request = form.validate()?;
    let url = client.endpoint(ANALYZE_CODE_PATH)?;

    let response = client.post_json(url, form.provider, &request).await?;
    let review_text = response.text().await?;
    tracing::debug!(chars = review_text.len(), "review received");

    Ok(ReviewReport {
        review_text,
        language: request.language,
        provider: form.provider,
        code_chars: request.code.chars().count(),
        has_business_requirements: request.business_requirements.is_some(),
    })
}
