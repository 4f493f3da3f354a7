//! Query dispatch — keyword rules first, literal pass-through last.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use tf_ops::{Operation, TerraformHandler};

use crate::intent;

/// Fixed response when neither a rule nor the pass-through applies.
pub const UNRECOGNIZED: &str =
    "I'm not sure what Terraform operation you want to perform. Please try rephrasing your request.";

/// Envelope around one handled query, used for logging/audit. The
/// caller-facing value is `text`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Unique query ID (UUIDv7 for time-sortability).
    pub id: Uuid,
    /// Operation selected by the rule table; `None` for pass-through
    /// and unrecognized queries.
    pub operation: Option<Operation>,
    /// Rendered response text.
    pub text: String,
    /// Processing latency in milliseconds.
    pub latency_ms: u64,
    /// When the response was generated.
    pub responded_at: DateTime<Utc>,
}

/// Stateless per-query dispatcher over one `TerraformHandler`.
pub struct QueryDispatcher {
    handler: TerraformHandler,
}

impl QueryDispatcher {
    pub fn new(handler: TerraformHandler) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &TerraformHandler {
        &self.handler
    }

    /// Process one free-text query to completion.
    pub async fn dispatch(&self, query: &str) -> QueryResponse {
        let start = Instant::now();
        let id = Uuid::now_v7();

        let (operation, text) = match intent::parse_query(query) {
            Some(op) => {
                tracing::info!(query_id = %id, operation = %op, "keyword rule matched");
                (Some(op), self.execute(op).await)
            }
            None => {
                tracing::info!(query_id = %id, "no keyword rule matched, trying pass-through");
                (None, self.passthrough(query).await)
            }
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::info!(query_id = %id, latency_ms, "query handled");
        QueryResponse {
            id,
            operation,
            text,
            latency_ms,
            responded_at: Utc::now(),
        }
    }

    /// Execute a matched operation. Apply and destroy always run with
    /// auto-approval — there is no interactive channel to confirm on.
    async fn execute(&self, operation: Operation) -> String {
        match operation {
            Operation::Init => self.handler.init().await,
            Operation::Plan => self.handler.plan().await,
            Operation::Apply => self.handler.apply(true).await,
            Operation::Destroy => self.handler.destroy(true).await,
            Operation::StateList => self.handler.state_list().await,
            Operation::Show => self.handler.show().await,
            Operation::DriftCheck => self.handler.drift_check().await,
            Operation::CostEstimate => self.handler.cost_estimate().await,
            Operation::SecurityScan => self.handler.security_scan().await,
            Operation::ListModules => self.handler.list_modules().await,
            Operation::ListVariables => self.handler.list_variables().await,
            Operation::ListOutputs => self.handler.list_outputs().await,
            Operation::ListProviders => self.handler.list_providers().await,
            Operation::Status => self.handler.status().await,
            Operation::Help => help_text().to_string(),
        }
    }

    /// Last resort: treat the query as a literal command line. A
    /// leading `terraform` token is stripped, the rest is tokenized
    /// and executed verbatim.
    async fn passthrough(&self, query: &str) -> String {
        let trimmed = query.trim();
        let stripped = match trimmed.split_whitespace().next() {
            Some(first) if first.eq_ignore_ascii_case("terraform") => {
                trimmed[first.len()..].trim()
            }
            _ => trimmed,
        };

        let args = match shell_words::split(stripped) {
            Ok(args) => args,
            Err(e) => {
                tracing::debug!(error = %e, "pass-through tokenization failed");
                return UNRECOGNIZED.to_string();
            }
        };
        if args.is_empty() {
            return UNRECOGNIZED.to_string();
        }

        tracing::info!(?args, "executing pass-through command");
        self.handler.raw(&args).await
    }
}

/// Capability summary returned for help queries.
pub fn help_text() -> &'static str {
    "\
Terraform Assistant

Manage Terraform infrastructure with natural language queries:

- Plan: \"What will change if I apply?\", \"Show me the execution plan\"
- State: \"What resources currently exist?\", \"Show me the current state\"
- Cost: \"How much will this cost?\" (requires infracost)
- Security: \"Are there any security issues?\" (requires tfsec)
- Drift: \"Has anything changed since last apply?\", \"Check for drift\"
- Documentation: \"Explain this module\", \"What does this configuration do?\"
- Init: \"Initialize my Terraform project\"
- Apply: \"Apply the configuration\", \"Deploy the infrastructure\"
- Destroy: \"Destroy the infrastructure\", \"Tear down my resources\"
- Listings: \"list modules\", \"list variables\", \"list outputs\", \"list providers\"

Unmatched queries are run as literal terraform commands, e.g.
\"terraform fmt -check\"."
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_text_names_the_lifecycle_operations() {
        let text = help_text();
        for needle in ["Plan", "Apply", "Destroy", "Drift", "list providers"] {
            assert!(text.contains(needle), "help text missing {needle}");
        }
    }
}
