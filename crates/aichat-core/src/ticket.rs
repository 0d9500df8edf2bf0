//! Support ticket analysis.
//!
//! The backend classifies a free-text ticket and, for high-priority
//! tickets, attaches drafted customer responses.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

use crate::client::ApiClient;
use crate::error::{ClientError, ClientResult};
use crate::providers::Provider;

const ANALYZE_TICKET_PATH: &str = "prompts/analyze-ticket";

const EMPTY_TICKET_WARNING: &str = "Please enter a ticket to analyze!";

/// Ticket priority as classified by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn label(&self) -> &'static str {
        match self {
            TicketPriority::Low => "LOW",
            TicketPriority::Medium => "MEDIUM",
            TicketPriority::High => "HIGH",
            TicketPriority::Urgent => "URGENT",
        }
    }

    /// High and urgent tickets get drafted responses from the backend.
    pub fn is_escalated(&self) -> bool {
        matches!(self, TicketPriority::High | TicketPriority::Urgent)
    }
}

impl fmt::Display for TicketPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TicketPriority {
    type Err = String;

    /// Accepts the canonical names plus the aliases models tend to emit
    /// (`P1`, `critical`, `sev-1`, ...).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "LOW" | "P3" => Ok(TicketPriority::Low),
            "MEDIUM" | "NORMAL" | "P2" => Ok(TicketPriority::Medium),
            "HIGH" | "P1" => Ok(TicketPriority::High),
            "URGENT" | "CRITICAL" | "BLOCKER" | "SEV1" | "SEV_1" => Ok(TicketPriority::Urgent),
            _ => Err(format!("Unsupported ticket priority: {value}")),
        }
    }
}

fn deserialize_priority<'de, D>(deserializer: D) -> Result<Option<TicketPriority>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Model classification of a ticket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketAnalysis {
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_priority")]
    pub priority: Option<TicketPriority>,
    pub sentiment: Option<String>,
    pub summary: Option<String>,
    pub suggested_resolution: Option<String>,
    /// Estimated resolution time in hours
    pub estimated_resolution_time: i64,
    pub key_issues: Option<String>,
}

/// Response of `POST /prompts/analyze-ticket`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketAnalysisResponse {
    pub ticket_analysis: TicketAnalysis,
    /// Drafted responses; shape is owned by the backend
    #[serde(default)]
    pub bespoke_responses: Option<Vec<serde_json::Value>>,
}

impl TicketAnalysisResponse {
    /// Renders the analysis for a terminal.
    pub fn to_text(&self) -> String {
        let analysis = &self.ticket_analysis;
        let mut out = String::new();

        let fields = [
            ("Category", analysis.category.as_deref()),
            ("Sentiment", analysis.sentiment.as_deref()),
            ("Summary", analysis.summary.as_deref()),
            ("Key issues", analysis.key_issues.as_deref()),
            ("Suggested resolution", analysis.suggested_resolution.as_deref()),
        ];

        let priority = analysis.priority.map_or("-", |p| p.label());
        let _ = writeln!(out, "Priority: {priority}");
        for (label, value) in fields {
            let _ = writeln!(out, "{label}: {}", value.unwrap_or("-"));
        }
        let _ = writeln!(
            out,
            "Estimated resolution time: {}h",
            analysis.estimated_resolution_time
        );

        if let Some(responses) = self.bespoke_responses.as_ref().filter(|r| !r.is_empty()) {
            let _ = writeln!(out, "\nDrafted responses ({}):", responses.len());
            for (i, response) in responses.iter().enumerate() {
                let rendered = serde_json::to_string_pretty(response)
                    .unwrap_or_else(|_| response.to_string());
                let _ = writeln!(out, "{}. {rendered}", i + 1);
            }
        }

        out
    }
}

/// Sends a ticket for analysis.
///
/// # Errors
/// Returns a validation error for empty text (no request is sent), the
/// generic connectivity error for transport failures and non-2xx status,
/// or a decode error when the response is not the expected JSON.
pub async fn analyze_ticket(
    client: &ApiClient,
    provider: Provider,
    text: &str,
) -> ClientResult<TicketAnalysisResponse> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ClientError::validation(EMPTY_TICKET_WARNING));
    }

    let url = client.endpoint(ANALYZE_TICKET_PATH)?;
    let response = client.post_text(url, provider, text.to_string()).await?;
    let body = response.text().await?;

    serde_json::from_str(&body)
        .map_err(|e| ClientError::decode(format!("invalid ticket analysis JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use url::Url;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ClientErrorKind;

    #[test]
    fn test_priority_aliases() {
        let cases = [
            ("low", TicketPriority::Low),
            ("P3", TicketPriority::Low),
            ("normal", TicketPriority::Medium),
            ("p2", TicketPriority::Medium),
            ("High", TicketPriority::High),
            ("P1", TicketPriority::High),
            ("critical", TicketPriority::Urgent),
            ("sev-1", TicketPriority::Urgent),
            ("SEV 1", TicketPriority::Urgent),
            (" blocker ", TicketPriority::Urgent),
        ];
        for (raw, expected) in cases {
            assert_eq!(raw.parse::<TicketPriority>(), Ok(expected), "{raw}");
        }
        assert!("whenever".parse::<TicketPriority>().is_err());
    }

    #[test]
    fn test_blank_priority_is_none() {
        let analysis: TicketAnalysis =
            serde_json::from_str(r#"{"priority": "  ", "category": "billing"}"#).unwrap();
        assert_eq!(analysis.priority, None);
        assert_eq!(analysis.category.as_deref(), Some("billing"));
        assert_eq!(analysis.estimated_resolution_time, 0);
    }

    #[test]
    fn test_unknown_priority_fails_decode() {
        let result = serde_json::from_str::<TicketAnalysis>(r#"{"priority": "someday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_escalation() {
        assert!(TicketPriority::Urgent.is_escalated());
        assert!(TicketPriority::High.is_escalated());
        assert!(!TicketPriority::Medium.is_escalated());
    }

    #[tokio::test]
    async fn test_analyze_ticket_decodes_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/prompts/analyze-ticket"))
            .and(header("ai-provider", "groq"))
            .and(body_string("Checkout is down"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ticketAnalysis": {
                    "category": "outage",
                    "priority": "URGENT",
                    "sentiment": "angry",
                    "summary": "checkout broken",
                    "suggestedResolution": "roll back",
                    "estimatedResolutionTime": 2,
                    "keyIssues": "payments"
                },
                "bespokeResponses": [{"tone": "apologetic", "response": "Sorry!"}]
            })))
            .mount(&server)
            .await;

        let client = ApiClient::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let response = analyze_ticket(&client, Provider::Groq, "  Checkout is down\n")
            .await
            .unwrap();

        assert_eq!(
            response.ticket_analysis.priority,
            Some(TicketPriority::Urgent)
        );
        assert_eq!(response.ticket_analysis.estimated_resolution_time, 2);
        let text = response.to_text();
        assert!(text.contains("Priority: URGENT"));
        assert!(text.contains("Suggested resolution: roll back"));
        assert!(text.contains("Drafted responses (1):"));
    }

    #[tokio::test]
    async fn test_analyze_ticket_bad_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = ApiClient::new(Url::parse(&server.uri()).unwrap()).unwrap();
        let err = analyze_ticket(&client, Provider::Ollama, "help")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ClientErrorKind::Decode);
    }

    #[tokio::test]
    async fn test_blank_ticket_is_rejected() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
        let err = analyze_ticket(&client, Provider::Ollama, " ").await.unwrap_err();
        assert!(err.is_validation());
    }
}
