//! LRS query client
//!
//! Issues the single authenticated statements query a report needs. All
//! calls are single-attempt with a fixed timeout; a non-200 response is a
//! transport error (the report cannot render without statements), while an
//! unparseable payload degrades to zero statements.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Args;
use crate::lrs::statement::Statement;
use crate::types::{GradewayError, Result};

pub struct LrsClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
    api_secret: String,
    limit: u32,
}

impl LrsClient {
    pub fn new(args: &Args) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(args.request_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            endpoint: args.lrs_endpoint.clone(),
            api_key: args.lrs_api_key.clone(),
            api_secret: args.lrs_api_secret.clone(),
            limit: args.lrs_statement_limit,
        }
    }

    /// Fetch statements for the actor identified by `email` (mbox scheme).
    pub async fn fetch_statements(&self, email: &str) -> Result<Vec<Statement>> {
        let agent = serde_json::json!({ "mbox": format!("mailto:{}", email) }).to_string();
        let url = format!("{}/statements", self.endpoint.trim_end_matches('/'));

        let response = self
            .http_client
            .get(&url)
            .query(&[("agent", agent.as_str()), ("limit", &self.limit.to_string())])
            .header(
                "Authorization",
                format!(
                    "Basic {}",
                    BASE64.encode(format!("{}:{}", self.api_key, self.api_secret))
                ),
            )
            .header("X-Experience-API-Version", "1.0.3")
            .header("Content-Type", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(GradewayError::Transport(format!(
                "LRS returned HTTP {}",
                status.as_u16()
            )));
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                // Unparseable payload is treated as zero statements
                warn!("LRS payload could not be parsed: {}", e);
                return Ok(Vec::new());
            }
        };

        let statements: Vec<Statement> = body
            .get("statements")
            .and_then(Value::as_array)
            .map(|raw| raw.iter().map(Statement::from_json).collect())
            .unwrap_or_default();

        debug!("fetched {} statements for {}", statements.len(), email);
        Ok(statements)
    }
}
